//! Activity collection for a single GitHub account
//!
//! - `collector`: events feed, concurrent search gathers and bounded
//!   per-repository commit histories, merged into one `ActivityData`
//! - `contributions`: contribution calendar and totals over GraphQL
//! - `calendar`: streak and busiest-day analytics over the calendar
//! - `summary`: counts and most active repositories for an aggregate

pub mod calendar;
pub mod collector;
pub mod contributions;
pub mod error;
pub mod models;
pub mod summary;

#[cfg(test)]
mod testutil;

pub use calendar::{
    Calendar, ContributionDay, ContributionLevel, ContributionStats, ContributionSummary, Week,
};
pub use collector::{ActivityData, Collector, CollectorSettings, Depth, Window};
pub use contributions::{fetch_contributions, fetch_yearly};
pub use error::{Error, Result};
pub use models::{Commit, Event, Issue, PullRequest};
pub use summary::{ActivitySummary, RepoActivity};
