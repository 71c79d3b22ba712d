//! Broad sales regions and the keyword heuristics that map free text onto
//! them.

use std::fmt;

/// Broad region used for filtering and map centroids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BroadRegion {
    Mena,
    Europe,
    NorthAmerica,
    Apac,
    SouthAmerica,
    Global,
}

impl BroadRegion {
    pub const ALL: [BroadRegion; 6] = [
        Self::Mena,
        Self::Europe,
        Self::NorthAmerica,
        Self::Apac,
        Self::SouthAmerica,
        Self::Global,
    ];

    /// Parse a region label, accepting the spellings the ingester and the UI
    /// use (`SOUTH_AMERICA`, `north america`, `Middle East`, `LATAM`, ...)
    pub fn parse(label: &str) -> Option<Self> {
        let key = label.trim().to_lowercase().replace(['_', '-'], " ");
        match key.as_str() {
            "mena" | "middle east" => Some(Self::Mena),
            "europe" | "eu" | "emea" => Some(Self::Europe),
            "north america" | "na" => Some(Self::NorthAmerica),
            "apac" | "asia" | "asia pacific" => Some(Self::Apac),
            "south america" | "latam" | "latin america" => Some(Self::SouthAmerica),
            "global" | "worldwide" => Some(Self::Global),
            _ => None,
        }
    }

    /// Region whose display label equals `label`, ignoring case
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|region| region.label().eq_ignore_ascii_case(label.trim()))
    }

    /// Display label, also the key of the map centroid table
    pub fn label(&self) -> &'static str {
        match self {
            Self::Mena => "MENA",
            Self::Europe => "Europe",
            Self::NorthAmerica => "North America",
            Self::Apac => "APAC",
            Self::SouthAmerica => "South America",
            Self::Global => "Global",
        }
    }

    /// Lowercase keywords that mark a stored region string as belonging to
    /// this region. `Global` has none.
    pub fn synonyms(&self) -> &'static [&'static str] {
        match self {
            Self::Mena => &[
                "mena", "middle east", "middle_east", "uae", "saudi", "qatar", "dubai",
                "egypt",
            ],
            Self::Europe => &[
                "europe", "uk", "germany", "france", "spain", "italy", "netherlands",
            ],
            Self::NorthAmerica => &["usa", "canada", "america"],
            Self::Apac => &[
                "apac", "asia", "pacific", "china", "japan", "india", "australia",
            ],
            Self::SouthAmerica => &[
                "south america", "south_america", "latam", "brazil", "argentina",
                "chile", "colombia",
            ],
            Self::Global => &[],
        }
    }

    /// Keywords for classifying a free-text location
    fn location_keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Mena => &[
                "uae", "dubai", "abu dhabi", "saudi", "riyadh", "qatar", "doha", "kuwait",
                "bahrain", "oman", "egypt", "cairo", "morocco", "jordan", "middle east",
                "mena",
            ],
            Self::Europe => &[
                "uk", "united kingdom", "germany", "france", "spain", "italy",
                "netherlands", "sweden", "norway", "denmark", "finland", "berlin",
                "london", "paris", "amsterdam", "switzerland", "poland", "europe",
                "austria", "brussels",
            ],
            Self::NorthAmerica => &[
                "usa", "united states", "canada", "mexico", "san diego", "new york",
                "toronto", "los angeles", "chicago", "atlanta", "austin", "boston",
                "vancouver",
            ],
            Self::Apac => &[
                "china", "japan", "korea", "singapore", "hong kong", "india", "australia",
                "sydney", "melbourne", "tokyo", "shanghai", "mumbai", "asia", "pacific",
            ],
            Self::SouthAmerica => &[
                "brazil", "argentina", "chile", "peru", "colombia", "sao paulo",
            ],
            Self::Global => &[],
        }
    }
}

impl fmt::Display for BroadRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Decide whether a stored region string belongs to the requested region.
///
/// `Middle East` is treated as `MENA`. A request naming one of the five
/// broad regions by its label matches on any of that region's synonyms.
/// Anything else, including abbreviations such as `na` or `eu`, is a plain
/// case-insensitive substring test.
pub fn region_matches(requested: &str, stored: &str) -> bool {
    let requested = requested.trim();
    let requested = if requested.eq_ignore_ascii_case("middle east") {
        "MENA"
    } else {
        requested
    };
    let stored = stored.to_lowercase();

    match BroadRegion::from_label(requested).map(|r| r.synonyms()) {
        Some(synonyms) if !synonyms.is_empty() => {
            synonyms.iter().any(|keyword| stored.contains(keyword))
        }
        _ => stored.contains(&requested.to_lowercase()),
    }
}

/// Classify a free-text location into a broad region.
///
/// Regions are tried in the order MENA, Europe, North America, APAC,
/// South America; no keyword hit gives `Global`.
pub fn region_from_location(location: &str) -> BroadRegion {
    let loc = location.to_lowercase();
    if loc.trim().is_empty() {
        return BroadRegion::Global;
    }

    BroadRegion::ALL
        .into_iter()
        .find(|region| region.location_keywords().iter().any(|k| loc.contains(k)))
        .unwrap_or(BroadRegion::Global)
}
