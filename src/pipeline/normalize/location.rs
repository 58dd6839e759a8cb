//! Location parsing into city / region / country / remote.

use regex::Regex;

use crate::error::Result;
use crate::models::Location;

const US_STATES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA", "KS",
    "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ", "NM", "NY",
    "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT", "VA", "WA", "WV",
    "WI", "WY", "DC", "PR",
];

const UNITED_STATES: &str = "United States";

/// Lowercase alias to canonical country name.
const COUNTRIES: &[(&str, &str)] = &[
    ("united states", UNITED_STATES),
    ("united states of america", UNITED_STATES),
    ("usa", UNITED_STATES),
    ("us", UNITED_STATES),
    ("u.s.", UNITED_STATES),
    ("u.s.a.", UNITED_STATES),
    ("united kingdom", "United Kingdom"),
    ("uk", "United Kingdom"),
    ("great britain", "United Kingdom"),
    ("england", "United Kingdom"),
    ("canada", "Canada"),
    ("mexico", "Mexico"),
    ("brazil", "Brazil"),
    ("argentina", "Argentina"),
    ("germany", "Germany"),
    ("deutschland", "Germany"),
    ("france", "France"),
    ("spain", "Spain"),
    ("portugal", "Portugal"),
    ("italy", "Italy"),
    ("netherlands", "Netherlands"),
    ("the netherlands", "Netherlands"),
    ("belgium", "Belgium"),
    ("ireland", "Ireland"),
    ("switzerland", "Switzerland"),
    ("austria", "Austria"),
    ("poland", "Poland"),
    ("czech republic", "Czech Republic"),
    ("czechia", "Czech Republic"),
    ("romania", "Romania"),
    ("ukraine", "Ukraine"),
    ("sweden", "Sweden"),
    ("norway", "Norway"),
    ("denmark", "Denmark"),
    ("finland", "Finland"),
    ("israel", "Israel"),
    ("india", "India"),
    ("singapore", "Singapore"),
    ("japan", "Japan"),
    ("australia", "Australia"),
    ("new zealand", "New Zealand"),
];

/// Qualifiers after a remote marker that carry no place.
const REMOTE_FILLER: &[&str] = &[
    "",
    "in the world",
    "anywhere in the world",
    "world",
    "worldwide",
    "global",
    "globally",
    "first",
    "friendly",
    "ok",
    "only",
    "job",
    "position",
];

/// Canonical country name for a known alias.
pub fn known_country(s: &str) -> Option<&'static str> {
    let lower = s.trim().trim_end_matches('.').to_lowercase();
    COUNTRIES
        .iter()
        .find(|(alias, _)| *alias == lower || alias.trim_end_matches('.') == lower)
        .map(|(_, name)| *name)
}

/// Upper-cased state code when `s` is a US state abbreviation.
pub fn us_state(s: &str) -> Option<String> {
    let upper = s.trim().to_uppercase();
    US_STATES.contains(&upper.as_str()).then_some(upper)
}

/// Resolves location text into a structured location.
pub trait LocationStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn resolve(&self, text: &str) -> Option<Location>;
}

fn parts(text: &str) -> Vec<&str> {
    text.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

fn located(city: Option<&str>, region: Option<String>, country: Option<&str>, raw: &str) -> Location {
    Location {
        city: city.map(str::to_string),
        region,
        country: country.map(str::to_string),
        remote: false,
        raw: raw.to_string(),
    }
}

/// `Remote`, `Anywhere`, `Work from home`, with an optional qualifier.
pub struct RemoteStrategy {
    re: Regex,
}

impl RemoteStrategy {
    pub fn new() -> Result<Self> {
        Ok(Self {
            re: Regex::new(
                r"(?i)\b(?:fully\s+)?(?:remote|anywhere|work\s+from\s+home|wfh|worldwide|distributed)\b",
            )?,
        })
    }
}

impl LocationStrategy for RemoteStrategy {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn resolve(&self, text: &str) -> Option<Location> {
        if !self.re.is_match(text) {
            return None;
        }

        let rest = self.re.replace_all(text, " ");
        let qualifier = rest
            .trim_matches(|c: char| c.is_whitespace() || "-–—,;:/|()[]".contains(c))
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        let mut location = Location {
            remote: true,
            raw: text.to_string(),
            ..Location::default()
        };

        if REMOTE_FILLER.contains(&qualifier.to_lowercase().as_str()) {
            return Some(location);
        }
        if let Some(country) = known_country(&qualifier) {
            location.country = Some(country.to_string());
        } else if let Some(state) = us_state(&qualifier) {
            location.region = Some(state);
            location.country = Some(UNITED_STATES.to_string());
        } else {
            location.region = Some(qualifier);
        }
        Some(location)
    }
}

/// `City, ST` with a US state code and an optional ZIP code.
pub struct UsStateStrategy {
    re: Regex,
}

impl UsStateStrategy {
    pub fn new() -> Result<Self> {
        Ok(Self {
            re: Regex::new(r"^\s*([^,]+?)\s*,\s*([A-Za-z]{2})(?:\s+\d{5}(?:-\d{4})?)?\s*$")?,
        })
    }
}

impl LocationStrategy for UsStateStrategy {
    fn name(&self) -> &'static str {
        "city_state"
    }

    fn resolve(&self, text: &str) -> Option<Location> {
        let caps = self.re.captures(text)?;
        let state = us_state(caps.get(2)?.as_str())?;
        Some(located(
            Some(caps.get(1)?.as_str()),
            Some(state),
            Some(UNITED_STATES),
            text,
        ))
    }
}

/// `City, Region, Country` with a known country.
pub struct CityRegionCountryStrategy;

impl LocationStrategy for CityRegionCountryStrategy {
    fn name(&self) -> &'static str {
        "city_region_country"
    }

    fn resolve(&self, text: &str) -> Option<Location> {
        let p = parts(text);
        if p.len() != 3 {
            return None;
        }
        let country = known_country(p[2])?;
        let region = us_state(p[1]).unwrap_or_else(|| p[1].to_string());
        Some(located(Some(p[0]), Some(region), Some(country), text))
    }
}

/// `City, Country` with a known country.
pub struct CityCountryStrategy;

impl LocationStrategy for CityCountryStrategy {
    fn name(&self) -> &'static str {
        "city_country"
    }

    fn resolve(&self, text: &str) -> Option<Location> {
        let p = parts(text);
        if p.len() != 2 {
            return None;
        }
        let country = known_country(p[1])?;
        Some(located(Some(p[0]), None, Some(country), text))
    }
}

/// A known country on its own.
pub struct CountryStrategy;

impl LocationStrategy for CountryStrategy {
    fn name(&self) -> &'static str {
        "country"
    }

    fn resolve(&self, text: &str) -> Option<Location> {
        let country = known_country(text)?;
        Some(located(None, None, Some(country), text))
    }
}

/// `City, Region` where the region is not a known country.
pub struct CityRegionStrategy;

impl LocationStrategy for CityRegionStrategy {
    fn name(&self) -> &'static str {
        "city_region"
    }

    fn resolve(&self, text: &str) -> Option<Location> {
        let p = parts(text);
        if p.len() != 2 {
            return None;
        }
        Some(located(Some(p[0]), Some(p[1].to_string()), None, text))
    }
}

/// Fixed strategy chain with a raw-text fallback.
pub struct LocationParser {
    strategies: Vec<Box<dyn LocationStrategy>>,
}

impl LocationParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            strategies: vec![
                Box::new(RemoteStrategy::new()?),
                Box::new(UsStateStrategy::new()?),
                Box::new(CityRegionCountryStrategy),
                Box::new(CityCountryStrategy),
                Box::new(CountryStrategy),
                Box::new(CityRegionStrategy),
            ],
        })
    }

    /// Resolve already-cleaned text. Never fails.
    pub fn parse(&self, text: &str) -> Location {
        if text.trim().is_empty() {
            return Location::unresolved("");
        }
        for strategy in &self.strategies {
            if let Some(location) = strategy.resolve(text) {
                log::trace!("location '{text}' resolved by {}", strategy.name());
                return location;
            }
        }
        Location::unresolved(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Location {
        LocationParser::new().unwrap().parse(text)
    }

    fn triple(loc: &Location) -> (Option<&str>, Option<&str>, Option<&str>, bool) {
        (
            loc.city.as_deref(),
            loc.region.as_deref(),
            loc.country.as_deref(),
            loc.remote,
        )
    }

    #[test]
    fn test_remote_variants() {
        assert_eq!(triple(&parse("Remote")), (None, None, None, true));
        assert_eq!(triple(&parse("Anywhere in the World")), (None, None, None, true));
        assert_eq!(
            triple(&parse("Remote (USA)")),
            (None, None, Some("United States"), true)
        );
        assert_eq!(
            triple(&parse("Remote - Europe")),
            (None, Some("Europe"), None, true)
        );
        assert_eq!(triple(&parse("Work from home, TX")), (None, Some("TX"), Some("United States"), true));
    }

    #[test]
    fn test_city_state() {
        let loc = parse("Austin, tx 78701");
        assert_eq!(triple(&loc), (Some("Austin"), Some("TX"), Some("United States"), false));
        assert_eq!(loc.raw, "Austin, tx 78701");
    }

    #[test]
    fn test_same_place_same_key() {
        assert_eq!(parse("Austin, TX").key(), parse("Austin, TX, USA").key());
        assert_eq!(parse("London, UK").key(), parse("London, United Kingdom").key());
    }

    #[test]
    fn test_country_forms() {
        assert_eq!(
            triple(&parse("Berlin, Germany")),
            (Some("Berlin"), None, Some("Germany"), false)
        );
        assert_eq!(triple(&parse("Canada")), (None, None, Some("Canada"), false));
        assert_eq!(
            triple(&parse("Toronto, Ontario")),
            (Some("Toronto"), Some("Ontario"), None, false)
        );
    }

    #[test]
    fn test_fallback_keeps_raw() {
        let loc = parse("Hybrid - 3 days in office");
        assert!(!loc.is_structured());
        assert_eq!(loc.raw, "Hybrid - 3 days in office");
        assert_eq!(parse("").raw, "");
    }
}
