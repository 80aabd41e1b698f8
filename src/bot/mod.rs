pub mod commands;
pub mod handlers;
pub mod interactions;
pub mod message_source;
pub mod thread_counts;

use crate::config::Config;
use crate::database;
use crate::gp::StagingArea;
use crate::gp::leaderboard::Leaderboard;
use crate::gp::source::TimeRange;
use anyhow::Result;
use dashmap::DashMap;
use poise::serenity_prelude as serenity;
use sqlx::SqlitePool;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thread_counts::ThreadMessageCounts;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Pending "Support GP switch" action, confirmed with a button.
#[derive(Debug, Clone)]
pub struct SupportGpAction {
    pub user_id: serenity::UserId,
    pub username: String,
    pub is_owner: bool,
    pub thread_id: serenity::ChannelId,
    pub enable_gp: bool,
}

pub struct Data {
    pub pool: SqlitePool,
    pub config: Config,
    /// `/multigp` lists, keyed by the moderator building them
    pub multi_gp: StagingArea,
    /// `/supportgp calc` results awaiting confirmation
    pub support_gp: StagingArea,
    /// Time range of each staged support GP calculation
    pub support_ranges: DashMap<serenity::UserId, TimeRange>,
    pub gp_switches: DashMap<serenity::UserId, SupportGpAction>,
    pub thread_counts: ThreadMessageCounts,
    /// Invalidated whenever someone's GP changes
    leaderboard_cache: Mutex<LeaderboardCache>,
}

/// Cached leaderboard plus a counter bumped on every invalidation, so a
/// leaderboard read before a GP change is never stored after it.
#[derive(Debug, Default)]
struct LeaderboardCache {
    generation: u64,
    leaderboard: Option<Leaderboard>,
}

impl Data {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        Self {
            pool,
            config,
            multi_gp: StagingArea::new(),
            support_gp: StagingArea::new(),
            support_ranges: DashMap::new(),
            gp_switches: DashMap::new(),
            thread_counts: ThreadMessageCounts::default(),
            leaderboard_cache: Mutex::new(LeaderboardCache::default()),
        }
    }

    fn lock_leaderboard_cache(&self) -> MutexGuard<'_, LeaderboardCache> {
        self.leaderboard_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn cached_leaderboard(&self) -> Option<Leaderboard> {
        self.lock_leaderboard_cache().leaderboard.clone()
    }

    /// Take this before reading the rows a leaderboard is built from.
    pub fn leaderboard_generation(&self) -> u64 {
        self.lock_leaderboard_cache().generation
    }

    /// Stores `leaderboard` unless the cache was invalidated since `generation` was taken.
    pub fn cache_leaderboard(&self, leaderboard: Leaderboard, generation: u64) -> bool {
        let mut cache = self.lock_leaderboard_cache();
        if cache.generation != generation {
            return false;
        }
        cache.leaderboard = Some(leaderboard);
        true
    }

    pub fn invalidate_leaderboard(&self) {
        let mut cache = self.lock_leaderboard_cache();
        cache.generation = cache.generation.wrapping_add(1);
        cache.leaderboard = None;
    }
}

pub async fn create_bot(config: Config) -> Result<serenity::Client> {
    let pool = database::create_connection(&config.database_url).await?;
    let guild_id = config.guild_id;

    let data = Data::new(pool, config.clone());

    let intents = serenity::GatewayIntents::non_privileged();

    let mut commands = vec![
        commands::reputation::gp(),
        commands::reputation::getgp(),
        commands::multigp::multigp(),
    ];
    if config.support_channel_id.is_some() {
        commands.push(commands::supportgp::supportgp());
        commands.push(commands::supportgp::support_gp_switch());
    } else {
        tracing::warn!("SUPPORT_CHANNEL_ID is not set. Support GP commands will be disabled.");
    }

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands,
            event_handler: |ctx, event, framework, data| {
                Box::pin(handlers::event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_in_guild(ctx, &framework.options().commands, guild_id)
                    .await?;
                Ok(data)
            })
        })
        .build();

    let client = serenity::ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .await?;

    Ok(client)
}

#[cfg(test)]
pub async fn test_data() -> Data {
    let pool = database::create_test_pool()
        .await
        .expect("in-memory database");
    let config = Config {
        discord_token: String::new(),
        database_url: "sqlite::memory:".to_string(),
        guild_id: serenity::GuildId::new(1),
        support_channel_id: None,
    };
    Data::new(pool, config)
}
