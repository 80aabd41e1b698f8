use crate::bot::{Data, Error};
use crate::database::queries;
use crate::error::StoreError;
use crate::gp::source::TimeRange;
use crate::gp::{Ledger, StagingArea};
use crate::utils::format::{
    create_ledger_embeds, format_error_message, format_info_message, format_success_message,
};
use crate::utils::time::format_discord_timestamp;
use poise::serenity_prelude as serenity;

pub const LIST_GP_CONFIRM: &str = "listGpConfirm";
pub const LIST_GP_CLEAR: &str = "listGpClear";
pub const SUPPORT_GP_CONFIRM: &str = "supportGpConfirm";
pub const SUPPORT_GP_ENABLE: &str = "supportGpEnable";
pub const SUPPORT_GP_DISABLE: &str = "supportGpDisable";

pub async fn handle_gp_interaction(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &Data,
) -> Result<(), Error> {
    match interaction.data.custom_id.as_str() {
        LIST_GP_CONFIRM => handle_multi_gp_confirm(ctx, interaction, data).await,
        LIST_GP_CLEAR => handle_multi_gp_clear(ctx, interaction, data).await,
        SUPPORT_GP_CONFIRM => handle_support_gp_confirm(ctx, interaction, data).await,
        SUPPORT_GP_ENABLE => handle_support_gp_switch(ctx, interaction, data, true).await,
        SUPPORT_GP_DISABLE => handle_support_gp_switch(ctx, interaction, data, false).await,
        other => {
            tracing::debug!("Ignoring component interaction \"{}\"", other);
            Ok(())
        }
    }
}

async fn respond(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    message: serenity::CreateInteractionResponseMessage,
) -> Result<(), Error> {
    interaction
        .create_response(&ctx.http, serenity::CreateInteractionResponse::Message(message))
        .await?;
    Ok(())
}

fn ephemeral(content: String) -> serenity::CreateInteractionResponseMessage {
    serenity::CreateInteractionResponseMessage::new()
        .content(content)
        .ephemeral(true)
}

/// Publicly posts a committed ledger under `heading`, one page per message.
async fn announce_ledger(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    heading: String,
    ledger: &Ledger,
) -> Result<(), Error> {
    let mut pages = create_ledger_embeds(ledger, true).into_iter();
    let Some(first) = pages.next() else {
        return respond(
            ctx,
            interaction,
            ephemeral(format_info_message("None of the entries were worth a whole point.")),
        )
        .await;
    };

    let message = serenity::CreateInteractionResponseMessage::new()
        .content(heading)
        .embed(first);
    respond(ctx, interaction, message).await?;
    for page in pages {
        interaction
            .create_followup(
                &ctx.http,
                serenity::CreateInteractionResponseFollowup::new().embed(page),
            )
            .await?;
    }
    Ok(())
}

/// Commits the ledger staged under `key`.
///
/// Returns the committed ledger as it was before committing, or `None` if nothing was staged.
/// On failure the entries that were not processed are staged again so the user can retry.
async fn commit_staged(
    data: &Data,
    staging: &StagingArea,
    key: serenity::UserId,
) -> Result<Option<Ledger>, StoreError> {
    let Some(mut ledger) = staging.take(key).filter(|ledger| !ledger.is_empty()) else {
        return Ok(None);
    };
    let committed = ledger.clone();
    tracing::debug!("Committing \"{}\":\n{}", ledger.name(), ledger.render(true));

    let result = ledger.apply_to_store(&data.pool).await;
    data.invalidate_leaderboard();
    match result {
        Ok(_) => Ok(Some(committed)),
        Err(e) => {
            if !ledger.is_empty() {
                tracing::warn!("{} GP entries left pending after a failed commit", ledger.len());
                staging.stage(key, ledger);
            }
            Err(e)
        }
    }
}

/// Commits the support GP staged under `key` along with the period it was calculated for.
///
/// Returns `Ok(None)` when no calculation is pending. The period stays pending when the
/// commit fails so the retry reports it.
async fn commit_support_gp(
    data: &Data,
    key: serenity::UserId,
) -> Result<Option<(Ledger, TimeRange)>, StoreError> {
    let Some((_, range)) = data.support_ranges.remove(&key) else {
        return Ok(None);
    };

    match commit_staged(data, &data.support_gp, key).await {
        Ok(ledger) => Ok(ledger.map(|ledger| (ledger, range))),
        Err(e) => {
            if data.support_gp.snapshot(key).is_some() {
                data.support_ranges.insert(key, range);
            }
            Err(e)
        }
    }
}

fn commit_failure_message(error: &StoreError) -> String {
    match error.failed_recipient() {
        Some(recipient) => format_error_message(&format!(
            "Failed to award GP to <@{}>. Users processed before them kept their points, \
             the remaining entries are still pending. Confirm again to retry.",
            recipient
        )),
        None => format_error_message(&format!("Failed to award GP: {}", error)),
    }
}

async fn handle_multi_gp_confirm(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &Data,
) -> Result<(), Error> {
    let key = interaction.user.id;
    let _session = data.multi_gp.lock_session(key).await;

    match commit_staged(data, &data.multi_gp, key).await {
        Ok(Some(ledger)) => {
            tracing::info!("{} confirmed a multi-GP list", interaction.user.name);
            // Not ephemeral so the awarded list stays visible in the channel
            let heading = format!(
                "The following Guild Points have been awarded by **{}**:",
                interaction.user.name
            );
            announce_ledger(ctx, interaction, heading, &ledger).await
        }
        Ok(None) => {
            respond(
                ctx,
                interaction,
                ephemeral(format_info_message("The multi-GP list is empty!")),
            )
            .await
        }
        Err(e) => {
            tracing::error!("Failed to commit multi-GP list: {:?}", e);
            respond(ctx, interaction, ephemeral(commit_failure_message(&e))).await
        }
    }
}

async fn handle_multi_gp_clear(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &Data,
) -> Result<(), Error> {
    let key = interaction.user.id;
    {
        let _session = data.multi_gp.lock_session(key).await;
        data.multi_gp.clear(key);
    }
    respond(
        ctx,
        interaction,
        ephemeral(format_success_message("Cleared multi-GP list")),
    )
    .await
}

async fn handle_support_gp_confirm(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &Data,
) -> Result<(), Error> {
    let key = interaction.user.id;
    let _session = data.support_gp.lock_session(key).await;

    match commit_support_gp(data, key).await {
        Ok(Some((ledger, range))) => {
            tracing::info!("{} confirmed support GP", interaction.user.name);
            let heading = format!(
                "The following Guild Points have been awarded by **{}** \
                 for support contributions from {} to {}:",
                interaction.user.name,
                format_discord_timestamp(range.start),
                format_discord_timestamp(range.end)
            );
            announce_ledger(ctx, interaction, heading, &ledger).await
        }
        Ok(None) => {
            respond(
                ctx,
                interaction,
                ephemeral(format_error_message(
                    "No action to confirm. Run /supportgp calc first.",
                )),
            )
            .await
        }
        Err(e) => {
            tracing::error!("Failed to commit support GP: {:?}", e);
            respond(ctx, interaction, ephemeral(commit_failure_message(&e))).await
        }
    }
}

async fn handle_support_gp_switch(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &Data,
    enable_button: bool,
) -> Result<(), Error> {
    let key = interaction.user.id;
    let Some(action) = data.gp_switches.get(&key).map(|action| action.value().clone()) else {
        return respond(
            ctx,
            interaction,
            ephemeral(format_error_message(
                "No action to confirm. Run the context menu action first.",
            )),
        )
        .await;
    };

    // An old button from an earlier switch menu
    if action.enable_gp != enable_button {
        interaction.defer(&ctx.http).await?;
        return Ok(());
    }

    match queries::set_user_support_gp(
        &data.pool,
        action.user_id,
        action.thread_id,
        action.enable_gp,
        action.is_owner,
    )
    .await
    {
        Ok(()) => {
            data.gp_switches.remove(&key);
            tracing::info!(
                "{} switched support GP {} for {} in thread {}",
                interaction.user.name,
                if action.enable_gp { "on" } else { "off" },
                action.username,
                action.thread_id
            );
            let change = if action.enable_gp { "now" } else { "no longer" };
            respond(
                ctx,
                interaction,
                ephemeral(format_success_message(&format!(
                    "{} will {} receive GP for their messages on this thread.",
                    action.username, change
                ))),
            )
            .await
        }
        Err(e) => {
            tracing::error!("Failed to switch support GP: {:?}", e);
            respond(
                ctx,
                interaction,
                ephemeral(format_error_message(&format!(
                    "Failed to update support GP: {}",
                    e
                ))),
            )
            .await
        }
    }
}
