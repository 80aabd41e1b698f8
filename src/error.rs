//! Error types returned by the Guild Point core.
//!
//! None of these errors produce user-facing messages by themselves; the bot
//! layer turns them into replies.

use poise::serenity_prelude::{ChannelId, UserId};
use thiserror::Error;

/// A GP amount expression that matches neither the simple nor the compound syntax.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("the GP amount is empty")]
    Empty,

    #[error("the GP amount cannot end with '+'")]
    TrailingPlus,

    #[error("invalid term for compound GP amount: \"{0}\"")]
    InvalidTerm(String),

    #[error("term amount out of range: {0}")]
    OutOfRange(String),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("page number out of bounds, maximum page: {num_pages}")]
pub struct PageOutOfBounds {
    pub num_pages: usize,
}

/// Failure while reading threads or messages from Discord.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Boxed due to the size of `serenity::Error`.
    #[error(transparent)]
    Discord(#[from] Box<poise::serenity_prelude::Error>),

    #[error("channel {0} is not a thread")]
    NotAThread(ChannelId),
}

impl From<poise::serenity_prelude::Error> for FetchError {
    fn from(err: poise::serenity_prelude::Error) -> Self {
        FetchError::Discord(Box::new(err))
    }
}

/// Failure while reading or writing persisted points or overrides.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("invalid should_get_gp value: {0}")]
    InvalidOverride(i64),

    /// A ledger commit stopped at `recipient`. Entries processed before it stay committed.
    #[error("failed to award {amount} GP to user {recipient}: {source}")]
    Commit {
        recipient: UserId,
        amount: i64,
        #[source]
        source: Box<StoreError>,
    },
}

/// Failure while gathering thread activity for a support GP calculation.
#[derive(Error, Debug)]
pub enum CalculationError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl StoreError {
    /// The user whose write failed, when the error comes from a ledger commit.
    pub fn failed_recipient(&self) -> Option<UserId> {
        match self {
            StoreError::Commit { recipient, .. } => Some(*recipient),
            _ => None,
        }
    }
}
