//! Engagement score bucketing

/// Highest engagement score
pub const MAX_ENGAGEMENT_SCORE: i16 = 5;

/// Bucket a member's message count into a 0-5 score
///
/// `0 -> 0`, `1..=10 -> 1`, `11..=20 -> 2`, `21..=30 -> 3`, `31..=50 -> 4`, `51.. -> 5`.
pub const fn engagement_score(messages_count: u64) -> i16 {
    match messages_count {
        0 => 0,
        1..=10 => 1,
        11..=20 => 2,
        21..=30 => 3,
        31..=50 => 4,
        _ => MAX_ENGAGEMENT_SCORE,
    }
}
