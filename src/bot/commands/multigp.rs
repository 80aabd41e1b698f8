use crate::bot::commands::{parse_amount_arg, send_ledger};
use crate::bot::interactions::gp_buttons::{LIST_GP_CLEAR, LIST_GP_CONFIRM};
use crate::bot::{Context, Error};
use crate::utils::format::{format_gp_amount, format_info_message, format_success_message};
use poise::serenity_prelude as serenity;

/// Commands to give GP to multiple users at once. Run /multigp list to confirm or discard changes.
#[poise::command(
    slash_command,
    guild_only,
    default_member_permissions = "MANAGE_GUILD",
    subcommands("add", "clear", "list")
)]
pub async fn multigp(_: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Add/Remove GP. The operation is added to the multi-GP list so it can be batch-executed later.
#[poise::command(slash_command)]
async fn add(
    ctx: Context<'_>,
    #[description = "User that will receive/lose the GP"] user: serenity::User,
    #[description = "Amount of GP to give/take"] amount: String,
) -> Result<(), Error> {
    let Some(amount) = parse_amount_arg(ctx, &amount).await? else {
        return Ok(());
    };

    let key = ctx.author().id;
    let staging = &ctx.data().multi_gp;
    let pending = {
        let _session = staging.lock_session(key).await;
        staging.with(|ledgers| {
            let ledger = ledgers.get_or_new(key);
            ledger.add(user.id, amount);
            ledger.get(user.id).unwrap_or(amount)
        })
    };

    ctx.send(
        poise::CreateReply::default()
            .content(format_success_message(&format!(
                "Added {} GP for **{}** to the multi-GP list ({} pending). \
                 Use /multigp list to confirm or cancel the operation.",
                format_gp_amount(amount, 4),
                user.name,
                format_gp_amount(pending, 4)
            )))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Remove a user from the multi-GP list
#[poise::command(slash_command)]
async fn clear(
    ctx: Context<'_>,
    #[description = "User to remove"] user: serenity::User,
) -> Result<(), Error> {
    let key = ctx.author().id;
    let staging = &ctx.data().multi_gp;
    let had_list = {
        let _session = staging.lock_session(key).await;
        staging.with(|ledgers| {
            let Some(ledger) = ledgers.get_mut(key) else {
                return false;
            };
            ledger.remove(user.id);
            if ledger.is_empty() {
                ledgers.clear(key);
            }
            true
        })
    };

    let message = if had_list {
        format_success_message(&format!("**{}** removed from the multi-GP list.", user.name))
    } else {
        format_info_message("The multi-GP list is empty!")
    };
    ctx.send(poise::CreateReply::default().content(message).ephemeral(true))
        .await?;
    Ok(())
}

/// Shows the multi-GP list, with options to confirm the commands or clear the list
#[poise::command(slash_command)]
async fn list(ctx: Context<'_>) -> Result<(), Error> {
    let ledger = ctx
        .data()
        .multi_gp
        .snapshot(ctx.author().id)
        .filter(|ledger| !ledger.is_empty());

    let Some(ledger) = ledger else {
        ctx.send(
            poise::CreateReply::default()
                .content(format_info_message("The multi-GP list is empty!"))
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    };

    let buttons = poise::CreateReply::default().components(vec![
        serenity::CreateActionRow::Buttons(vec![
            serenity::CreateButton::new(LIST_GP_CONFIRM)
                .label("Confirm")
                .style(serenity::ButtonStyle::Success),
            serenity::CreateButton::new(LIST_GP_CLEAR)
                .label("Clear all")
                .style(serenity::ButtonStyle::Danger),
        ]),
    ]);
    send_ledger(ctx, buttons, &ledger, false, "The multi-GP list is empty!").await?;
    Ok(())
}
