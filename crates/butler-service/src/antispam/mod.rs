//! Spam detection over live message events

mod detector;

pub use detector::{
    remaining_retention, repeat_count, SpamDetector, SpamPolicy, SpamVerdict, MUTED_TEXT,
    WARNING_TEXT,
};
