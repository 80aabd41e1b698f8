pub mod multigp;
pub mod reputation;
pub mod supportgp;

use crate::bot::{Context, Error};
use crate::gp::{Ledger, parse_gp_amount};
use crate::utils::format::{create_ledger_embeds, format_error_message, format_info_message};
use poise::serenity_prelude as serenity;

/// Ephemeral error reply.
pub async fn reply_error(ctx: Context<'_>, message: &str) -> Result<(), Error> {
    ctx.send(
        poise::CreateReply::default()
            .content(format_error_message(message))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Parses a GP amount argument, replying with the reason when it is invalid.
pub async fn parse_amount_arg(ctx: Context<'_>, text: &str) -> Result<Option<f64>, Error> {
    match parse_gp_amount(text) {
        Ok(amount) => Ok(Some(amount)),
        Err(e) => {
            reply_error(ctx, &format!("Invalid GP amount \"{}\": {}", text, e)).await?;
            Ok(None)
        }
    }
}

/// The thread the command was run in, if it is a thread under the support channel.
pub async fn current_support_thread(ctx: Context<'_>) -> Option<serenity::GuildChannel> {
    let support_channel = ctx.data().config.support_channel_id?;
    let channel = ctx.guild_channel().await?;

    (channel.thread_metadata.is_some() && channel.parent_id == Some(support_channel))
        .then_some(channel)
}

/// Sends a ledger ephemerally, one page per message, the first page attached to `first`.
/// Replies with `empty_message` instead, and returns false, when no entry would be shown.
pub async fn send_ledger(
    ctx: Context<'_>,
    first: poise::CreateReply,
    ledger: &Ledger,
    use_integers: bool,
    empty_message: &str,
) -> Result<bool, Error> {
    let mut embeds = create_ledger_embeds(ledger, use_integers).into_iter();
    let Some(first_page) = embeds.next() else {
        ctx.send(
            poise::CreateReply::default()
                .content(format_info_message(empty_message))
                .ephemeral(true),
        )
        .await?;
        return Ok(false);
    };

    ctx.send(first.embed(first_page).ephemeral(true)).await?;
    for page in embeds {
        ctx.send(poise::CreateReply::default().embed(page).ephemeral(true))
            .await?;
    }
    Ok(true)
}
