use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lowest and highest threat level the ingester assigns.
pub const MIN_THREAT: i32 = 1;
pub const MAX_THREAT: i32 = 5;

/// A tracked competitor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competitor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub headquarters: Option<String>,
}

/// A single news row as written by the ingester.
///
/// Field names follow the ingester's column names (`competitorId`,
/// `threatLevel`, `isRead`, ...). `details` is kept as the raw JSON text the
/// ingester stored; use [`NewsItem::details`] to read it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: String,
    pub competitor_id: String,
    #[serde(default = "default_event_type")]
    pub event_type: String,
    pub date: DateTime<Utc>,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default = "default_threat")]
    pub threat_level: i32,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub is_starred: bool,
    #[serde(default)]
    pub extracted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub region: Option<String>,
}

fn default_event_type() -> String {
    "Unknown".to_string()
}

fn default_threat() -> i32 {
    2
}

impl NewsItem {
    /// Parsed view of the details blob. Never fails: a missing or malformed
    /// blob yields an empty [`NewsDetails`].
    pub fn details(&self) -> NewsDetails {
        self.details
            .as_deref()
            .map(NewsDetails::parse)
            .unwrap_or_default()
    }

    /// Region label if one is set and non-blank
    pub fn region_label(&self) -> Option<&str> {
        self.region
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }
}

/// Structured content of a news item's details blob
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewsDetails {
    pub location: Option<String>,
    pub financial_value: Option<String>,
    pub partners: Vec<String>,
    pub products: Vec<String>,
    pub category: Option<String>,
    pub primary_region: Option<String>,
}

impl NewsDetails {
    /// Parse a details blob.
    ///
    /// Some rows wrap the payload one level deeper under a `details` key;
    /// that inner object is used when present. Fields with an unexpected
    /// type are ignored individually rather than failing the whole blob.
    pub fn parse(raw: &str) -> Self {
        Self::try_parse(raw).unwrap_or_default()
    }

    /// Like [`NewsDetails::parse`], but `None` when the blob is not a JSON
    /// object at all
    pub fn try_parse(raw: &str) -> Option<Self> {
        let Ok(value) = serde_json::from_str::<Value>(raw) else {
            tracing::trace!("details blob is not valid JSON");
            return None;
        };
        if !value.is_object() {
            return None;
        }

        let value = match value.get("details") {
            Some(inner) if inner.is_object() => inner,
            _ => &value,
        };

        Some(Self {
            location: string_field(value, "location"),
            financial_value: string_field(value, "financial_value"),
            partners: string_list(value, "partners"),
            products: string_list(value, "products"),
            category: string_field(value, "category"),
            primary_region: string_field(value, "primary_region"),
        })
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// A `[longitude, latitude]` pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates(pub f64, pub f64);

impl Coordinates {
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self(longitude, latitude)
    }

    pub fn longitude(&self) -> f64 {
        self.0
    }

    pub fn latitude(&self) -> f64 {
        self.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flat_details() {
        let d = NewsDetails::parse(
            r#"{"location":"Tokyo, Japan","partners":["Acme"],"products":["Laser X"]}"#,
        );
        assert_eq!(d.location.as_deref(), Some("Tokyo, Japan"));
        assert_eq!(d.partners, vec!["Acme".to_string()]);
        assert_eq!(d.products, vec!["Laser X".to_string()]);
    }

    #[test]
    fn test_parse_nested_details() {
        let d = NewsDetails::parse(r#"{"details":{"location":"Berlin","products":["A","B"]}}"#);
        assert_eq!(d.location.as_deref(), Some("Berlin"));
        assert_eq!(d.products.len(), 2);
    }

    #[test]
    fn test_parse_malformed_is_empty() {
        assert_eq!(NewsDetails::parse("{not json"), NewsDetails::default());
        assert_eq!(NewsDetails::parse(""), NewsDetails::default());
        assert_eq!(NewsDetails::parse("[1,2,3]"), NewsDetails::default());
    }

    #[test]
    fn test_try_parse_needs_an_object() {
        assert_eq!(NewsDetails::try_parse("{not json"), None);
        assert_eq!(NewsDetails::try_parse("[1,2,3]"), None);
        assert_eq!(NewsDetails::try_parse("{}"), Some(NewsDetails::default()));
    }

    #[test]
    fn test_wrong_field_types_are_skipped() {
        let d = NewsDetails::parse(r#"{"location":42,"products":"oops","category":"Tender"}"#);
        assert_eq!(d.location, None);
        assert!(d.products.is_empty());
        assert_eq!(d.category.as_deref(), Some("Tender"));
    }

    #[test]
    fn test_news_item_camel_case() {
        let item: NewsItem = serde_json::from_str(
            r#"{
                "id": "c1",
                "competitorId": "k1",
                "date": "2025-03-01T00:00:00.000Z",
                "title": "Plant opening",
                "threatLevel": 4,
                "details": "{\"location\":\"Sao Paulo\"}",
                "isStarred": true,
                "region": "SOUTH_AMERICA"
            }"#,
        )
        .unwrap();
        assert_eq!(item.threat_level, 4);
        assert!(item.is_starred);
        assert!(!item.is_read);
        assert_eq!(item.event_type, "Unknown");
        assert_eq!(item.details().location.as_deref(), Some("Sao Paulo"));
        assert_eq!(item.region_label(), Some("SOUTH_AMERICA"));
    }

    #[test]
    fn test_coordinates_serialize_as_pair() {
        let json = serde_json::to_string(&Coordinates::new(15.0, 50.0)).unwrap();
        assert_eq!(json, "[15.0,50.0]");
    }
}
