use crate::error::PageOutOfBounds;
use crate::gp::Ledger;
use crate::gp::leaderboard::{Leaderboard, resolve_page};
use poise::serenity_prelude as serenity;

const GP_COLOR: u32 = 0xf1c40f; // Yellow

pub fn format_error_message(error: &str) -> String {
    format!("❌ **Error**: {}", error)
}

pub fn format_success_message(message: &str) -> String {
    format!("✅ {}", message)
}

pub fn format_info_message(message: &str) -> String {
    format!("ℹ️ {}", message)
}

/// Rounds to at most `decimals` places and drops trailing zeros (`2.50` -> `2.5`, `3.0` -> `3`).
pub fn format_gp_amount(amount: f64, decimals: usize) -> String {
    let text = format!("{:.*}", decimals, amount);
    let text = if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        &text
    };
    if text == "-0" { "0".to_string() } else { text.to_string() }
}

pub fn create_error_embed(title: &str, description: &str) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(title)
        .description(description)
        .color(0xff0000) // Red
        .timestamp(chrono::Utc::now())
}

/// One page of a ledger. The footer is only shown when there is more than one page.
pub fn create_ledger_embed(
    ledger: &Ledger,
    use_integers: bool,
    page: i64,
) -> Result<serenity::CreateEmbed, PageOutOfBounds> {
    let description = ledger.page(page, use_integers)?;
    let num_pages = ledger.num_pages(use_integers);

    let embed = serenity::CreateEmbed::new()
        .title(ledger.name())
        .description(description)
        .color(GP_COLOR);
    if num_pages > 1 {
        let display_page = resolve_page(num_pages, page)? + 1;
        Ok(embed.footer(serenity::CreateEmbedFooter::new(format!(
            "Page {}/{}",
            display_page, num_pages
        ))))
    } else {
        Ok(embed)
    }
}

/// Every page of a ledger, one embed each. Empty when no entry would be shown.
pub fn create_ledger_embeds(ledger: &Ledger, use_integers: bool) -> Vec<serenity::CreateEmbed> {
    (0..ledger.num_pages(use_integers))
        .filter_map(|page| create_ledger_embed(ledger, use_integers, page as i64).ok())
        .collect()
}

/// One page of a leaderboard. `page` follows [`Leaderboard::resolve_page`].
pub fn create_leaderboard_embed(
    title: &str,
    leaderboard: &Leaderboard,
    page: i64,
) -> Result<serenity::CreateEmbed, PageOutOfBounds> {
    let description = leaderboard.page(page)?;
    let display_page = leaderboard.resolve_page(page)? + 1;

    Ok(serenity::CreateEmbed::new()
        .title(title)
        .description(description)
        .color(GP_COLOR)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Page {}/{}",
            display_page,
            leaderboard.num_pages()
        ))))
}
