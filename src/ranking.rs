//! Strategic relevance scoring for the weekly threat digest.
//!
//! score = threat level x 10 + region weight + recency bonus, where the
//! recency bonus is `max(0, 5 - days_old)`.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::types::NewsItem;

pub const DEFAULT_WINDOW_DAYS: i64 = 7;
pub const DEFAULT_TOP_LIMIT: usize = 3;

const UNKNOWN_REGION_WEIGHT: i64 = 1;

/// Weight of a stored region label, keyed by the ingester's upper-snake
/// spelling
pub fn region_weight(region: Option<&str>) -> i64 {
    let key = region
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or("GLOBAL")
        .to_uppercase()
        .replace([' ', '-'], "_");

    match key.as_str() {
        "SOUTH_AMERICA" | "BRAZIL" => 10,
        "ARGENTINA" => 9,
        "LATAM" => 8,
        "EUROPE" => 6,
        "NORTH_AMERICA" => 4,
        "GLOBAL" => 3,
        "APAC" => 2,
        _ => UNKNOWN_REGION_WEIGHT,
    }
}

/// Relevance score of an item at time `now`
pub fn score(item: &NewsItem, now: DateTime<Utc>) -> i64 {
    let threat = i64::from(item.threat_level) * 10;
    let days_old = (now - item.date).num_days();
    let recency = (5 - days_old).clamp(0, 5);
    threat + region_weight(item.region.as_deref()) + recency
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedItem {
    pub score: i64,
    #[serde(flatten)]
    pub item: NewsItem,
}

/// Start of a window of `days` days ending at `now`. `None` when the window
/// reaches past the earliest representable date.
pub fn window_start(now: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    TimeDelta::try_days(days.max(0)).and_then(|span| now.checked_sub_signed(span))
}

/// Highest scoring items dated within the last `window_days` before `now`.
/// A window too long to represent has no lower bound.
pub fn top_threats<'a, I>(
    items: I,
    now: DateTime<Utc>,
    window_days: i64,
    limit: usize,
) -> Vec<RankedItem>
where
    I: IntoIterator<Item = &'a NewsItem>,
{
    let start = window_start(now, window_days).unwrap_or(DateTime::<Utc>::MIN_UTC);

    let mut ranked: Vec<RankedItem> = items
        .into_iter()
        .filter(|item| item.date >= start && item.date <= now)
        .map(|item| RankedItem {
            score: score(item, now),
            item: item.clone(),
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.item.date.cmp(&a.item.date))
    });
    ranked.truncate(limit);
    ranked
}
