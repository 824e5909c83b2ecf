//! Process-local state shared between jobs

mod activity;
mod roster;

pub use activity::{ActivityCounter, ActivitySnapshot};
pub use roster::{RosterCache, RosterSnapshot};
