use crate::bot::commands::{parse_amount_arg, reply_error};
use crate::bot::{Context, Data, Error};
use crate::database::queries;
use crate::error::StoreError;
use crate::gp::gp_to_int;
use crate::gp::leaderboard::Leaderboard;
use crate::utils::format::{
    create_leaderboard_embed, format_gp_amount, format_info_message, format_success_message,
};
use poise::serenity_prelude as serenity;

const RESULT_DECIMALS: usize = 4;
const LEADERBOARD_TITLE: &str = "Guild Points leaderboard";

/// Guild point management commands
#[poise::command(
    slash_command,
    guild_only,
    default_member_permissions = "MANAGE_GUILD",
    subcommands("add", "take")
)]
pub async fn gp(_: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Add points to a user
#[poise::command(slash_command)]
async fn add(
    ctx: Context<'_>,
    #[description = "User that will receive the GP"] user: serenity::User,
    #[description = "Amount of GP to give (> 0)"] amount: String,
) -> Result<(), Error> {
    change_points(ctx, user, &amount, false).await
}

/// Take points from a user
#[poise::command(slash_command)]
async fn take(
    ctx: Context<'_>,
    #[description = "User that will lose the GP"] user: serenity::User,
    #[description = "Amount of GP to take (> 0)"] amount: String,
) -> Result<(), Error> {
    change_points(ctx, user, &amount, true).await
}

async fn change_points(
    ctx: Context<'_>,
    user: serenity::User,
    amount: &str,
    take: bool,
) -> Result<(), Error> {
    let Some(amount) = parse_amount_arg(ctx, amount).await? else {
        return Ok(());
    };
    if amount <= 0.0 {
        reply_error(ctx, "The amount of points must be > 0.").await?;
        return Ok(());
    }

    let data = ctx.data();
    let delta = if take { -amount } else { amount };
    match queries::add_points(&data.pool, user.id, delta).await {
        Ok(total) => {
            data.invalidate_leaderboard();
            tracing::info!(
                "{} changed GP of {} by {} (now {})",
                ctx.author().name,
                user.name,
                delta,
                total
            );

            let amount = format_gp_amount(amount, RESULT_DECIMALS);
            let message = if take {
                format!("Took {} Guild Point(s) from **{}**", amount, user.name)
            } else {
                format!("Gave {} Guild Point(s) to **{}**", amount, user.name)
            };
            ctx.say(format_success_message(&format!(
                "{} (current: {}).",
                message,
                gp_to_int(total)
            )))
            .await?;
        }
        Err(e) => {
            tracing::error!("Failed to change GP of {}: {:?}", user.id, e);
            reply_error(ctx, &format!("Failed to update Guild Points: {}", e)).await?;
        }
    }

    Ok(())
}

/// Guild point user commands
#[poise::command(slash_command, guild_only, subcommands("check", "list"))]
pub async fn getgp(_: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Check the amount of points a user has
#[poise::command(slash_command)]
async fn check(
    ctx: Context<'_>,
    #[description = "User whose GP will be checked"] user: serenity::User,
) -> Result<(), Error> {
    match queries::get_points(&ctx.data().pool, user.id).await {
        Ok(points) => {
            ctx.say(format!(
                "**{}** has {} Guild Point(s).",
                user.name,
                gp_to_int(points)
            ))
            .await?;
        }
        Err(e) => {
            tracing::error!("Failed to read GP of {}: {:?}", user.id, e);
            reply_error(ctx, &format!("Failed to read Guild Points: {}", e)).await?;
        }
    }
    Ok(())
}

/// View the full points leaderboard, in descending order
#[poise::command(slash_command)]
async fn list(
    ctx: Context<'_>,
    #[description = "Page to retrieve. Negative numbers count from the end."] page: i64,
) -> Result<(), Error> {
    if page == 0 {
        reply_error(ctx, "Page numbers start at 1.").await?;
        return Ok(());
    }
    // Positive pages are 1-indexed for users
    let page = if page < 0 { page } else { page - 1 };

    let leaderboard = match load_leaderboard(ctx.data()).await {
        Ok(leaderboard) => leaderboard,
        Err(e) => {
            tracing::error!("Failed to load leaderboard: {:?}", e);
            reply_error(ctx, &format!("Failed to load the leaderboard: {}", e)).await?;
            return Ok(());
        }
    };
    if leaderboard.is_empty() {
        ctx.say(format_info_message("Nobody has any Guild Points yet."))
            .await?;
        return Ok(());
    }

    match create_leaderboard_embed(LEADERBOARD_TITLE, &leaderboard, page) {
        Ok(embed) => {
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(e) => {
            reply_error(
                ctx,
                &format!("Page number out of bounds. Maximum page: {}.", e.num_pages),
            )
            .await?;
        }
    }
    Ok(())
}

/// Cached leaderboard, rebuilt from the database after any GP change.
async fn load_leaderboard(data: &Data) -> Result<Leaderboard, StoreError> {
    let generation = data.leaderboard_generation();
    if let Some(leaderboard) = data.cached_leaderboard() {
        return Ok(leaderboard);
    }

    let rows = queries::get_all_points(&data.pool)
        .await?
        .into_iter()
        .map(|entry| (entry.user_id(), gp_to_int(entry.points)))
        .filter(|(_, points)| *points != 0)
        .collect();
    let leaderboard = Leaderboard::new(rows);
    if !data.cache_leaderboard(leaderboard.clone(), generation) {
        tracing::debug!("GP changed while the leaderboard was loading, not caching it");
    }
    Ok(leaderboard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::test_data;

    #[tokio::test]
    async fn leaderboard_reloads_after_a_gp_change() {
        let data = test_data().await;
        let user = serenity::UserId::new(7);

        assert!(load_leaderboard(&data).await.unwrap().is_empty());
        assert!(data.cached_leaderboard().is_some());

        queries::add_points(&data.pool, user, 3.0).await.unwrap();
        data.invalidate_leaderboard();

        let leaderboard = load_leaderboard(&data).await.unwrap();
        assert_eq!(leaderboard.page(0).unwrap(), "<@7>: 3");
    }
}
