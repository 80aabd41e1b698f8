//! Guild Point calculations: amount parsing, the support GP formula, staged
//! ledgers and the thread activity calculator.

pub mod amount;
pub mod calculator;
pub mod collection;
pub mod formula;
pub mod leaderboard;
pub mod ledger;
pub mod source;
pub mod store;

pub use amount::parse_gp_amount;
pub use calculator::AwardCalculator;
pub use collection::StagingArea;
pub use ledger::Ledger;

/// Drops the decimal part of a GP amount, unless the value is within 1e-10 of
/// the next integer, in which case it is rounded so float error never costs a point.
pub fn gp_to_int(value: f64) -> i64 {
    let truncated = value.trunc();
    if (value - truncated).abs() > 0.9999999999 {
        value.round() as i64
    } else {
        truncated as i64
    }
}
