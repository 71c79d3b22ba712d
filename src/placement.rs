//! Aggregation of news items into map buckets.
//!
//! Each item is placed by, in order: an exact city match on its details
//! `location`, a country substring match on that location, the centroid of
//! its broad region label. Items that match none of these are counted as
//! unresolved and never appear in a bucket.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::geo;
use crate::types::{Coordinates, NewsItem};

/// Smallest and largest marker radius, in pixels
pub const MARKER_RADIUS_RANGE: (f64, f64) = (8.0, 24.0);

const GLOBAL_LABEL: &str = "Global";

/// One map bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacementBucket {
    pub name: String,
    pub coordinates: Coordinates,
    pub count: usize,
    pub max_severity: i32,
}

/// Result of one aggregation pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Placement {
    pub buckets: BTreeMap<String, PlacementBucket>,
    pub unresolved: usize,
}

impl Placement {
    /// Items accounted for, placed or not
    pub fn total(&self) -> usize {
        self.placed() + self.unresolved
    }

    pub fn placed(&self) -> usize {
        self.buckets.values().map(|b| b.count).sum()
    }

    /// Largest bucket count, never below 1
    pub fn max_count(&self) -> usize {
        self.buckets
            .values()
            .map(|b| b.count)
            .max()
            .unwrap_or(0)
            .max(1)
    }

    fn add(&mut self, name: String, coordinates: Coordinates, severity: i32) {
        let bucket = self
            .buckets
            .entry(name)
            .or_insert_with_key(|name| PlacementBucket {
                name: name.clone(),
                coordinates,
                count: 0,
                max_severity: severity,
            });
        bucket.count += 1;
        bucket.max_severity = bucket.max_severity.max(severity);
        bucket.coordinates = coordinates;
    }
}

/// Where a single item lands
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Placed { name: String, coordinates: Coordinates },
    Unresolved,
}

/// Resolve the map position of a single item
pub fn locate(item: &NewsItem) -> Resolution {
    let candidate = item.region_label().unwrap_or(GLOBAL_LABEL);

    if let Some(location) = item.details().location {
        let normalized = geo::normalize(&location);

        if let Some(coordinates) = geo::city(&normalized) {
            return Resolution::Placed {
                name: location.trim().to_string(),
                coordinates,
            };
        }

        if let Some((label, coordinates)) = geo::country(&normalized) {
            return Resolution::Placed {
                name: label.to_string(),
                coordinates,
            };
        }
    }

    match geo::region_centroid(candidate) {
        Some(coordinates) => Resolution::Placed {
            name: candidate.to_string(),
            coordinates,
        },
        None => Resolution::Unresolved,
    }
}

/// Aggregate items into buckets.
///
/// Every item lands in exactly one bucket or in `unresolved`.
pub fn resolve<'a, I>(items: I) -> Placement
where
    I: IntoIterator<Item = &'a NewsItem>,
{
    let mut placement = Placement::default();

    for item in items {
        match locate(item) {
            Resolution::Placed { name, coordinates } => {
                placement.add(name, coordinates, item.threat_level)
            }
            Resolution::Unresolved => {
                tracing::trace!(id = %item.id, "item has no map position");
                placement.unresolved += 1;
            }
        }
    }

    placement
}

/// Linear marker radius for a bucket of `count` items
pub fn marker_radius(count: usize, max_count: usize) -> f64 {
    let (min, max) = MARKER_RADIUS_RANGE;
    let max_count = max_count.max(1) as f64;
    let ratio = (count as f64 / max_count).clamp(0.0, 1.0);
    min + ratio * (max - min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn item(id: &str, region: Option<&str>, details: Option<&str>, threat: i32) -> NewsItem {
        NewsItem {
            id: id.to_string(),
            competitor_id: "k1".to_string(),
            event_type: "Product Launch".to_string(),
            date: Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap(),
            title: format!("Item {}", id),
            summary: String::new(),
            threat_level: threat,
            details: details.map(str::to_string),
            source_url: format!("https://news.test/{}", id),
            is_read: false,
            is_starred: false,
            extracted_at: None,
            region: region.map(str::to_string),
        }
    }

    #[test]
    fn test_region_only_goes_to_centroid() {
        let items = vec![item("1", Some("Europe"), None, 3)];
        let p = resolve(&items);
        let b = &p.buckets["Europe"];
        assert_eq!(b.coordinates, Coordinates::new(15.0, 50.0));
        assert_eq!(b.count, 1);
        assert_eq!(p.unresolved, 0);
    }

    #[test]
    fn test_city_keeps_original_casing() {
        let items = vec![item("1", None, Some(r#"{"location":"Tokyo, Japan"}"#), 2)];
        let p = resolve(&items);
        let b = &p.buckets["Tokyo, Japan"];
        assert_eq!(b.coordinates, Coordinates::new(139.6917, 35.6895));
    }

    #[test]
    fn test_country_substring_match() {
        let items = vec![item(
            "1",
            Some("Europe"),
            Some(r#"{"location":"somewhere in Germany"}"#),
            2,
        )];
        let p = resolve(&items);
        assert_eq!(p.buckets.len(), 1);
        assert_eq!(
            p.buckets["Germany"].coordinates,
            Coordinates::new(10.4515, 51.1657)
        );
    }

    #[test]
    fn test_nested_details_location() {
        let items = vec![item(
            "1",
            None,
            Some(r#"{"details":{"location":"Dubai","products":["X"]}}"#),
            5,
        )];
        let p = resolve(&items);
        assert_eq!(p.buckets["Dubai"].max_severity, 5);
    }

    #[test]
    fn test_unparsable_details_without_region_is_unresolved() {
        let items = vec![item("1", None, Some("{{{"), 4)];
        let p = resolve(&items);
        assert!(p.buckets.is_empty());
        assert_eq!(p.unresolved, 1);
    }

    #[test]
    fn test_unknown_location_falls_back_to_region() {
        let items = vec![
            item("1", Some("APAC"), Some(r#"{"location":"Atlantis"}"#), 1),
            item("2", Some("Mars"), Some(r#"{"location":"Atlantis"}"#), 1),
            item("3", Some("Global"), None, 1),
        ];
        let p = resolve(&items);
        assert_eq!(p.buckets["APAC"].count, 1);
        assert_eq!(p.unresolved, 2);
    }

    #[test]
    fn test_empty_input() {
        let p = resolve(&Vec::<NewsItem>::new());
        assert!(p.buckets.is_empty());
        assert_eq!(p.unresolved, 0);
        assert_eq!(p.max_count(), 1);
    }

    #[test]
    fn test_counts_and_severity() {
        let items = vec![
            item("1", Some("Europe"), None, 2),
            item("2", Some("Europe"), None, 5),
            item("3", Some("Europe"), None, 3),
            item("4", None, Some(r#"{"location":"berlin"}"#), 1),
            item("5", None, Some(r#"{"location":"Berlin"}"#), 4),
            item("6", None, None, 5),
        ];
        let p = resolve(&items);

        assert_eq!(p.buckets["Europe"].count, 3);
        assert_eq!(p.buckets["Europe"].max_severity, 5);
        // Distinct casings are distinct buckets
        assert_eq!(p.buckets["berlin"].count, 1);
        assert_eq!(p.buckets["Berlin"].max_severity, 4);
        assert_eq!(p.unresolved, 1);

        assert_eq!(p.total(), items.len());
        assert!(p.buckets.values().all(|b| b.count >= 1));
        assert_eq!(p.max_count(), 3);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let items = vec![
            item("1", Some("MENA"), None, 3),
            item("2", None, Some(r#"{"location":"Made in China and the USA"}"#), 2),
            item("3", None, Some("not json"), 1),
        ];
        assert_eq!(resolve(&items), resolve(&items));
        assert!(resolve(&items).buckets.contains_key("USA"));
    }

    #[test]
    fn test_invariants_over_mixed_inputs() {
        let regions = [
            None,
            Some("Europe"),
            Some("MENA"),
            Some("SOUTH_AMERICA"),
            Some("Mars"),
            Some("  "),
        ];
        let details = [
            None,
            Some(r#"{"location":"Tokyo, Japan"}"#),
            Some(r#"{"location":"near berlin, germany"}"#),
            Some(r#"{"details":{"location":"Sao Paulo"}}"#),
            Some(r#"{"location":"Atlantis"}"#),
            Some(r#"{"location":42}"#),
            Some("[1,2]"),
            Some("broken"),
        ];

        let mut pool = Vec::new();
        for (r, region) in regions.iter().enumerate() {
            for (d, detail) in details.iter().enumerate() {
                let threat = ((r * 7 + d * 3) % 5) as i32 + 1;
                pool.push(item(&format!("{}-{}", r, d), *region, *detail, threat));
            }
        }

        // windows over the pool, walked with a stride so neighbours differ
        let stride = 5;
        let shuffled: Vec<NewsItem> = (0..pool.len())
            .map(|i| pool[(i * stride) % pool.len()].clone())
            .collect();

        for start in 0..shuffled.len() {
            for len in [0, 1, 2, 7, 19, shuffled.len()] {
                let items = &shuffled[start..(start + len).min(shuffled.len())];
                let p = resolve(items);

                assert_eq!(p.total(), items.len());
                assert!(p.buckets.values().all(|b| b.count >= 1));

                for (name, bucket) in &p.buckets {
                    let threats: Vec<i32> = items
                        .iter()
                        .filter(|i| {
                            matches!(locate(i), Resolution::Placed { name: n, .. } if n == *name)
                        })
                        .map(|i| i.threat_level)
                        .collect();
                    assert_eq!(bucket.count, threats.len());
                    assert_eq!(Some(bucket.max_severity), threats.into_iter().max());
                }
            }
        }
    }

    #[test]
    fn test_marker_radius() {
        assert_eq!(marker_radius(0, 10), 8.0);
        assert_eq!(marker_radius(10, 10), 24.0);
        assert_eq!(marker_radius(5, 10), 16.0);
        assert_eq!(marker_radius(1, 0), 24.0);
    }
}
