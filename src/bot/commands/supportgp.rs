use crate::bot::commands::{current_support_thread, reply_error, send_ledger};
use crate::bot::interactions::gp_buttons::{
    SUPPORT_GP_CONFIRM, SUPPORT_GP_DISABLE, SUPPORT_GP_ENABLE,
};
use crate::bot::message_source::DiscordMessageSource;
use crate::bot::{Context, Error, SupportGpAction};
use crate::database::queries;
use crate::gp::AwardCalculator;
use crate::gp::source::TimeRange;
use crate::utils::format::{create_error_embed, format_info_message, format_success_message};
use crate::utils::time::parse_date_time;
use chrono::{DateTime, Utc};
use poise::serenity_prelude as serenity;

/// Commands to give GP for support contributions
#[poise::command(
    slash_command,
    guild_only,
    default_member_permissions = "MANAGE_GUILD",
    subcommands("check", "calc", "toggle")
)]
pub async fn supportgp(_: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Check how many points would be awarded for contributions to a given thread
#[poise::command(slash_command)]
async fn check(
    ctx: Context<'_>,
    #[description = "Thread to check"]
    #[channel_types("PublicThread")]
    thread: serenity::Channel,
) -> Result<(), Error> {
    let data = ctx.data();
    let thread = thread.id();

    if !queries::is_support_gp_enabled(&data.pool, thread).await? {
        ctx.send(
            poise::CreateReply::default()
                .content(format_info_message("Support GP is disabled for this thread."))
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    ctx.defer_ephemeral().await?;
    let http = &ctx.serenity_context().http;
    let source = DiscordMessageSource::new(http, data.config.guild_id, &data.thread_counts);
    let range = TimeRange::new(DateTime::UNIX_EPOCH, Utc::now());

    match AwardCalculator::collect(&source, &data.pool, &[thread], range).await {
        Ok(windows) => {
            let ledger = AwardCalculator::calculate(&windows);
            send_ledger(
                ctx,
                poise::CreateReply::default(),
                &ledger,
                false,
                "Nobody would earn support GP in this thread.",
            )
            .await?;
        }
        Err(e) => {
            tracing::error!("Support GP check failed for thread {}: {:?}", thread, e);
            ctx.send(
                poise::CreateReply::default()
                    .embed(create_error_embed("Support GP check failed", &e.to_string()))
                    .ephemeral(true),
            )
            .await?;
        }
    }
    Ok(())
}

/// Calculate points for a date range
#[poise::command(slash_command)]
async fn calc(
    ctx: Context<'_>,
    #[description = "Start date (ISO-8601 Date + Time + Offset format, \
                     e.g. \"2011-12-03T10:15:30+01:00\")"]
    start_date: String,
    #[description = "End date (ISO-8601 Date + Time + Offset format). \
                     Omit to use current date."]
    end_date: Option<String>,
) -> Result<(), Error> {
    let data = ctx.data();
    let Some(channel) = data.config.support_channel_id else {
        reply_error(ctx, "No support channel is configured.").await?;
        return Ok(());
    };

    let start = match parse_date_time(&start_date) {
        Ok(start) => start,
        Err(e) => {
            reply_error(ctx, &e.to_string()).await?;
            return Ok(());
        }
    };
    let end = match end_date.as_deref().map(parse_date_time).transpose() {
        Ok(end) => end.unwrap_or_else(Utc::now),
        Err(e) => {
            reply_error(ctx, &e.to_string()).await?;
            return Ok(());
        }
    };
    if start >= end {
        reply_error(ctx, "The start date must be before the end date.").await?;
        return Ok(());
    }
    let range = TimeRange::new(start, end);

    ctx.defer_ephemeral().await?;
    let key = ctx.author().id;
    let _session = data.support_gp.lock_session(key).await;

    let http = &ctx.serenity_context().http;
    let source = DiscordMessageSource::new(http, data.config.guild_id, &data.thread_counts);
    let calculated = AwardCalculator::calculate_channel(&source, &data.pool, channel, range).await;
    let ledger = match calculated {
        Ok(ledger) => ledger,
        Err(e) => {
            tracing::error!("Support GP calculation failed: {:?}", e);
            let embed = create_error_embed("Support GP calculation failed", &e.to_string());
            ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
                .await?;
            return Ok(());
        }
    };

    let first = poise::CreateReply::default()
        .content(
            "These are the points that will be awarded for support contributions on the \
             specified time period. Please confirm if you're okay with them.",
        )
        .components(vec![serenity::CreateActionRow::Buttons(vec![
            serenity::CreateButton::new(SUPPORT_GP_CONFIRM)
                .label("Confirm")
                .style(serenity::ButtonStyle::Success),
        ])]);
    let shown = send_ledger(
        ctx,
        first,
        &ledger,
        true,
        "Nobody earned support GP in that period.",
    )
    .await?;

    if shown {
        data.support_gp.stage(key, ledger);
        data.support_ranges.insert(key, range);
    } else {
        data.support_gp.clear(key);
        data.support_ranges.remove(&key);
    }
    Ok(())
}

/// Enable or disable support GP for the whole thread this is run in
#[poise::command(slash_command)]
async fn toggle(ctx: Context<'_>) -> Result<(), Error> {
    let Some(thread) = current_support_thread(ctx).await else {
        reply_error(ctx, "This command can only be used in support threads.").await?;
        return Ok(());
    };

    let pool = &ctx.data().pool;
    let enabled = !queries::is_support_gp_enabled(pool, thread.id).await?;
    queries::set_support_gp_enabled(pool, thread.id, enabled).await?;
    tracing::info!(
        "{} turned support GP {} in thread {}",
        ctx.author().name,
        if enabled { "on" } else { "off" },
        thread.id
    );

    let state = if enabled { "enabled" } else { "disabled" };
    ctx.send(
        poise::CreateReply::default()
            .content(format_success_message(&format!(
                "Support GP is now {} for this thread.",
                state
            )))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Shows whether a message's author earns support GP in this thread, with a button to change it
#[poise::command(
    context_menu_command = "Support GP switch",
    guild_only,
    default_member_permissions = "MANAGE_GUILD"
)]
pub async fn support_gp_switch(
    ctx: Context<'_>,
    message: serenity::Message,
) -> Result<(), Error> {
    let Some(thread) = current_support_thread(ctx).await else {
        reply_error(ctx, "This action can only be used in support threads.").await?;
        return Ok(());
    };

    let data = ctx.data();
    let author = &message.author;
    let is_owner = thread.owner_id == Some(author.id);
    let earns_gp = queries::should_user_get_gp(&data.pool, author.id, thread.id, is_owner).await?;

    let (status, button) = if earns_gp {
        (
            "**does receive**",
            serenity::CreateButton::new(SUPPORT_GP_DISABLE)
                .label("Disable support GP for this thread")
                .style(serenity::ButtonStyle::Danger),
        )
    } else {
        (
            "**does not receive**",
            serenity::CreateButton::new(SUPPORT_GP_ENABLE)
                .label("Enable support GP for this thread")
                .style(serenity::ButtonStyle::Success),
        )
    };

    data.gp_switches.insert(
        ctx.author().id,
        SupportGpAction {
            user_id: author.id,
            username: author.name.clone(),
            is_owner,
            thread_id: thread.id,
            enable_gp: !earns_gp,
        },
    );

    ctx.send(
        poise::CreateReply::default()
            .content(format!(
                "{} currently {} GP for their contributions to this thread. \
                 Click the button below to change it.",
                author.name, status
            ))
            .components(vec![serenity::CreateActionRow::Buttons(vec![button])])
            .ephemeral(true),
    )
    .await?;
    Ok(())
}
