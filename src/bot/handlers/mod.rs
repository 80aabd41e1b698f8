use crate::bot::interactions::gp_buttons;
use crate::bot::{Data, Error};
use poise::serenity_prelude as serenity;

pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            tracing::info!("Bot logged in as {}", data_about_bot.user.name);
        }
        serenity::FullEvent::InteractionCreate { interaction } => {
            if let serenity::Interaction::Component(component_interaction) = interaction {
                if let Err(e) =
                    gp_buttons::handle_gp_interaction(ctx, component_interaction, data).await
                {
                    tracing::error!("Error handling component interaction: {:?}", e);
                }
            }
        }
        // Thread message totals only change for threads the counter already tracks
        serenity::FullEvent::Message { new_message } => {
            data.thread_counts.record_created(new_message.channel_id);
        }
        serenity::FullEvent::MessageDelete { channel_id, .. } => {
            data.thread_counts.record_deleted(*channel_id);
        }
        serenity::FullEvent::MessageDeleteBulk {
            channel_id,
            multiple_deleted_messages_ids,
            ..
        } => {
            for _ in multiple_deleted_messages_ids {
                data.thread_counts.record_deleted(*channel_id);
            }
        }
        serenity::FullEvent::ThreadCreate { thread } => {
            if data.config.support_channel_id.is_some()
                && thread.parent_id == data.config.support_channel_id
            {
                let count = data
                    .thread_counts
                    .seed(thread.id, thread.message_count.unwrap_or(0));
                tracing::debug!("Tracking support thread \"{}\" ({} messages)", thread.name, count);
            }
        }
        serenity::FullEvent::ThreadDelete { thread, .. } => {
            data.thread_counts.forget(thread.id);
        }
        _ => {}
    }
    Ok(())
}
