use anyhow::{Result, bail};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::region::region_matches;
use crate::types::{MAX_THREAT, MIN_THREAT, NewsItem};

/// Listing filter, deserialized straight from a query string.
///
/// All present criteria must hold for an item to match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsFilter {
    #[serde(default)]
    pub competitor_id: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub read: Option<bool>,
    #[serde(default)]
    pub starred: Option<bool>,
    #[serde(default)]
    pub min_threat: Option<i32>,
    /// Case-insensitive text searched in title and summary
    #[serde(default)]
    pub q: Option<String>,
}

/// A validated filter ready to test items
pub struct NewsMatcher<'a> {
    filter: &'a NewsFilter,
    query: Option<Regex>,
}

impl NewsFilter {
    pub fn for_region(region: impl Into<String>) -> Self {
        Self {
            region: Some(region.into()),
            ..Default::default()
        }
    }

    /// Validate the filter and compile its text query
    pub fn matcher(&self) -> Result<NewsMatcher<'_>> {
        if let Some(min) = self.min_threat
            && !(MIN_THREAT..=MAX_THREAT).contains(&min)
        {
            bail!(
                "min_threat must be between {} and {}, got {}",
                MIN_THREAT,
                MAX_THREAT,
                min
            );
        }

        let query = match self.q.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => Some(
                RegexBuilder::new(&regex::escape(q))
                    .case_insensitive(true)
                    .build()?,
            ),
            _ => None,
        };

        Ok(NewsMatcher {
            filter: self,
            query,
        })
    }

    /// Matching items, newest first, then highest threat first
    pub fn apply<'i, I>(&self, items: I) -> Result<Vec<NewsItem>>
    where
        I: IntoIterator<Item = &'i NewsItem>,
    {
        let matcher = self.matcher()?;
        let mut matched: Vec<NewsItem> = items
            .into_iter()
            .filter(|item| matcher.matches(item))
            .cloned()
            .collect();
        matched.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.threat_level.cmp(&a.threat_level))
        });
        Ok(matched)
    }
}

impl NewsMatcher<'_> {
    pub fn matches(&self, item: &NewsItem) -> bool {
        let f = self.filter;

        if let Some(ref id) = f.competitor_id
            && item.competitor_id != *id
        {
            return false;
        }
        if f.read.is_some_and(|read| item.is_read != read) {
            return false;
        }
        if f.starred.is_some_and(|starred| item.is_starred != starred) {
            return false;
        }
        if f.min_threat.is_some_and(|min| item.threat_level < min) {
            return false;
        }
        if let Some(region) = f.region.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            match item.region_label() {
                Some(stored) if region_matches(region, stored) => {}
                _ => return false,
            }
        }
        if let Some(ref query) = self.query
            && !(query.is_match(&item.title) || query.is_match(&item.summary))
        {
            return false;
        }
        true
    }
}
