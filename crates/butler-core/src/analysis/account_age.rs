//! Human-readable account age

use chrono::{DateTime, Months, Utc};

/// Calendar difference between `then` and `now` as "Y years M months D days H hours"
///
/// Zero components are omitted and a component of exactly one is singular.
/// Returns an empty string when `then` is not before `now` by at least an hour.
pub fn humanize_age(now: DateTime<Utc>, then: DateTime<Utc>) -> String {
    if then >= now {
        return String::new();
    }

    let mut total_months = calendar_months_between(then, now);
    let anchor = loop {
        match then.checked_add_months(Months::new(total_months)) {
            Some(anchor) if anchor <= now => break anchor,
            _ if total_months == 0 => break then,
            _ => total_months -= 1,
        }
    };

    let rest = now - anchor;
    let days = rest.num_days();
    let hours = (rest - chrono::Duration::days(days)).num_hours();

    let parts = [
        (i64::from(total_months / 12), "year"),
        (i64::from(total_months % 12), "month"),
        (days, "day"),
        (hours, "hour"),
    ];

    parts
        .iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| {
            if *value == 1 {
                format!("{value} {unit}")
            } else {
                format!("{value} {unit}s")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn calendar_months_between(from: DateTime<Utc>, to: DateTime<Utc>) -> u32 {
    use chrono::Datelike;

    let months = (i64::from(to.year()) - i64::from(from.year())) * 12
        + i64::from(to.month())
        - i64::from(from.month());
    u32::try_from(months.max(0)).unwrap_or(0)
}
