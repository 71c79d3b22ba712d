//! Static place tables used to put news items on the map.
//!
//! All keys are lowercase. City keys are matched exactly against a
//! normalized location string, country keys by substring, region keys by
//! their exact display label.

use crate::types::Coordinates;

const fn at(longitude: f64, latitude: f64) -> Coordinates {
    Coordinates::new(longitude, latitude)
}

/// City name -> coordinates
pub const CITIES: &[(&str, Coordinates)] = &[
    // North America
    ("new york", at(-74.0060, 40.7128)),
    ("new york, usa", at(-74.0060, 40.7128)),
    ("san francisco", at(-122.4194, 37.7749)),
    ("los angeles", at(-118.2437, 34.0522)),
    ("chicago", at(-87.6298, 41.8781)),
    ("houston", at(-95.3698, 29.7604)),
    ("boston", at(-71.0589, 42.3601)),
    ("austin", at(-97.7431, 30.2672)),
    ("toronto", at(-79.3832, 43.6532)),
    ("vancouver", at(-123.1207, 49.2827)),
    ("mexico city", at(-99.1332, 19.4326)),
    // Europe
    ("london", at(-0.1276, 51.5072)),
    ("london, uk", at(-0.1276, 51.5072)),
    ("paris", at(2.3522, 48.8566)),
    ("berlin", at(13.4050, 52.5200)),
    ("munich", at(11.5820, 48.1351)),
    ("stuttgart", at(9.1829, 48.7758)),
    ("madrid", at(-3.7038, 40.4168)),
    ("barcelona", at(2.1734, 41.3851)),
    ("milan", at(9.1900, 45.4642)),
    ("amsterdam", at(4.9041, 52.3676)),
    ("zurich", at(8.5417, 47.3769)),
    ("stockholm", at(18.0686, 59.3293)),
    // APAC
    ("tokyo", at(139.6917, 35.6895)),
    ("tokyo, japan", at(139.6917, 35.6895)),
    ("shanghai", at(121.4737, 31.2304)),
    ("beijing", at(116.4074, 39.9042)),
    ("hong kong", at(114.1694, 22.3193)),
    ("singapore", at(103.8198, 1.3521)),
    ("seoul", at(126.9780, 37.5665)),
    ("mumbai", at(72.8777, 19.0760)),
    ("bangalore", at(77.5946, 12.9716)),
    ("sydney", at(151.2093, -33.8688)),
    // MENA
    ("dubai", at(55.2708, 25.2048)),
    ("dubai, uae", at(55.2708, 25.2048)),
    ("abu dhabi", at(54.3773, 24.4539)),
    ("riyadh", at(46.6753, 24.7136)),
    ("doha", at(51.5310, 25.2854)),
    ("cairo", at(31.2357, 30.0444)),
    ("istanbul", at(28.9784, 41.0082)),
    ("tel aviv", at(34.7818, 32.0853)),
    // South America
    ("sao paulo", at(-46.6333, -23.5505)),
    ("são paulo", at(-46.6333, -23.5505)),
    ("rio de janeiro", at(-43.1729, -22.9068)),
    ("buenos aires", at(-58.3816, -34.6037)),
    ("santiago", at(-70.6693, -33.4489)),
    ("bogota", at(-74.0721, 4.7110)),
    ("lima", at(-77.0428, -12.0464)),
    // Africa
    ("johannesburg", at(28.0473, -26.2041)),
    ("cape town", at(18.4241, -33.9249)),
    ("lagos", at(3.3792, 6.5244)),
    ("nairobi", at(36.8219, -1.2921)),
];

/// Country key -> (display name, coordinates).
///
/// Scanned in declaration order; the first key contained in the location
/// wins.
pub const COUNTRIES: &[(&str, &str, Coordinates)] = &[
    ("usa", "USA", at(-95.7129, 37.0902)),
    ("china", "China", at(104.1954, 35.8617)),
    ("germany", "Germany", at(10.4515, 51.1657)),
    ("uk", "UK", at(-3.4360, 55.3781)),
    ("france", "France", at(2.2137, 46.2276)),
    ("japan", "Japan", at(138.2529, 36.2048)),
    ("india", "India", at(78.9629, 20.5937)),
    ("brazil", "Brazil", at(-51.9253, -14.2350)),
    ("uae", "UAE", at(53.8478, 23.4241)),
    ("canada", "Canada", at(-106.3468, 56.1304)),
    ("australia", "Australia", at(133.7751, -25.2744)),
];

/// Broad region label -> centroid
pub const REGION_CENTROIDS: &[(&str, Coordinates)] = &[
    ("MENA", at(45.0, 25.0)),
    ("Europe", at(15.0, 50.0)),
    ("North America", at(-100.0, 40.0)),
    ("APAC", at(120.0, 15.0)),
    ("South America", at(-60.0, -15.0)),
];

/// Exact lookup of an already-normalized location in the city table
pub fn city(normalized: &str) -> Option<Coordinates> {
    CITIES
        .iter()
        .find(|(name, _)| *name == normalized)
        .map(|(_, coords)| *coords)
}

/// First country whose key occurs in the normalized location
pub fn country(normalized: &str) -> Option<(&'static str, Coordinates)> {
    COUNTRIES
        .iter()
        .find(|(key, _, _)| normalized.contains(key))
        .map(|(_, label, coords)| (*label, *coords))
}

/// Centroid for one of the fixed region labels (case-sensitive)
pub fn region_centroid(label: &str) -> Option<Coordinates> {
    REGION_CENTROIDS
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, coords)| *coords)
}

/// Lowercase and trim a location for table lookups
pub fn normalize(location: &str) -> String {
    location.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_exact_only() {
        assert_eq!(city("tokyo, japan"), Some(at(139.6917, 35.6895)));
        assert_eq!(city("tokyo"), Some(at(139.6917, 35.6895)));
        assert_eq!(city("greater tokyo"), None);
    }

    #[test]
    fn test_country_substring() {
        assert_eq!(
            country("somewhere in germany"),
            Some(("Germany", at(10.4515, 51.1657)))
        );
        assert_eq!(country("atlantis"), None);
    }

    #[test]
    fn test_country_first_declared_wins() {
        // "usa" is declared before "germany"
        let (label, _) = country("germany and usa").unwrap();
        assert_eq!(label, "USA");
    }

    #[test]
    fn test_region_centroid_is_case_sensitive() {
        assert_eq!(region_centroid("Europe"), Some(at(15.0, 50.0)));
        assert_eq!(region_centroid("EUROPE"), None);
        assert_eq!(region_centroid("Global"), None);
    }

    #[test]
    fn test_tables_are_normalized() {
        for (name, _) in CITIES {
            assert_eq!(*name, normalize(name));
        }
        for (key, _, _) in COUNTRIES {
            assert_eq!(*key, normalize(key));
        }
    }

    #[test]
    fn test_city_keys_unique() {
        let mut names: Vec<&str> = CITIES.iter().map(|(n, _)| *n).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), CITIES.len());
    }
}
