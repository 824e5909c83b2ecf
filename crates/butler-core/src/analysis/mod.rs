//! Pure scoring and fingerprinting utilities

mod account_age;
mod engagement;
mod fingerprint;

pub use account_age::humanize_age;
pub use engagement::{MAX_ENGAGEMENT_SCORE, engagement_score};
pub use fingerprint::{contains_ignore_case, tokenize};
