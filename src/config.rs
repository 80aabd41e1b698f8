use anyhow::{Context, Result};
use poise::serenity_prelude::{ChannelId, GuildId};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub database_url: String,
    pub guild_id: GuildId,
    /// Channel whose threads earn support GP. Support GP commands are disabled without it.
    pub support_channel_id: Option<ChannelId>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let discord_token = env::var("DISCORD_TOKEN")
            .map_err(|_| anyhow::anyhow!("DISCORD_TOKEN environment variable is required"))?;

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:guild_points.db".to_string());

        let guild_id = env::var("GUILD_ID")
            .map_err(|_| anyhow::anyhow!("GUILD_ID environment variable is required"))?;
        let guild_id = GuildId::new(parse_id("GUILD_ID", &guild_id)?);

        let support_channel_id = env::var("SUPPORT_CHANNEL_ID")
            .ok()
            .map(|value| parse_id("SUPPORT_CHANNEL_ID", &value).map(ChannelId::new))
            .transpose()?;

        Ok(Config {
            discord_token,
            database_url,
            guild_id,
            support_channel_id,
        })
    }
}

fn parse_id(name: &str, value: &str) -> Result<u64> {
    let id: u64 = value
        .trim()
        .parse()
        .with_context(|| format!("{} must be a Discord ID, got \"{}\"", name, value))?;
    if id == 0 {
        anyhow::bail!("{} cannot be 0", name);
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_discord_ids() {
        assert_eq!(parse_id("GUILD_ID", " 123456789012345678 ").unwrap(), 123456789012345678);
    }

    #[test]
    fn rejects_invalid_ids() {
        assert!(parse_id("GUILD_ID", "abc").is_err());
        assert!(parse_id("GUILD_ID", "0").is_err());
        assert!(parse_id("GUILD_ID", "-5").is_err());
    }
}
