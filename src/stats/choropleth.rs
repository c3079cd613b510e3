/// Country colour scale for the click map.
///
/// Country breakdowns arrive keyed by free-form codes; they are normalised to
/// ISO 3166-1 alpha-2, merged, and quantised into a fixed palette.
use std::collections::BTreeMap;

use crate::models::statistics::StatisticsDataPoint;

/// Sequential palette, lightest to darkest.
pub const PALETTE: [&str; 10] = [
    "#eff6ff", "#dbeafe", "#bfdbfe", "#93c5fd", "#60a5fa", "#3b82f6", "#2563eb", "#1d4ed8",
    "#1e40af", "#1e3a8a",
];

/// Fill for countries without clicks.
pub const NO_DATA_COLOR: &str = "#e5e7eb";

/// Trim, uppercase and map the non-ISO aliases the backend may send.
pub fn normalize_country_code(code: &str) -> String {
    let code = code.trim().to_uppercase();
    match code.as_str() {
        "UK" => "GB".to_string(),
        "EL" => "GR".to_string(),
        _ => code,
    }
}

/// `[min, max]` of the values, widened so it is never degenerate.
///
/// Empty input gives `(0, 1)`.
pub fn color_domain(values: impl IntoIterator<Item = u64>) -> (u64, u64) {
    let mut iter = values.into_iter();
    let Some(first) = iter.next() else {
        return (0, 1);
    };
    let (min, max) = iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
    (min, max.max(min.saturating_add(1)))
}

#[derive(Debug, Clone, PartialEq)]
pub struct CountryScale {
    clicks: BTreeMap<String, u64>,
    domain: (u64, u64),
}

impl CountryScale {
    /// Build the scale from a country breakdown.
    ///
    /// Codes that normalise to the same country keep the larger count.
    /// Blank codes are dropped.
    pub fn from_points(points: &[StatisticsDataPoint]) -> Self {
        let mut clicks: BTreeMap<String, u64> = BTreeMap::new();
        for point in points {
            let code = normalize_country_code(&point.name);
            if code.is_empty() {
                continue;
            }
            let entry = clicks.entry(code).or_insert(0);
            *entry = (*entry).max(point.clicks);
        }
        let domain = color_domain(clicks.values().copied());
        Self { clicks, domain }
    }

    /// Force `region` to at least one click so it is always shaded.
    pub fn with_floor(mut self, region: &str) -> Self {
        let code = normalize_country_code(region);
        if code.is_empty() {
            return self;
        }
        let entry = self.clicks.entry(code).or_insert(0);
        *entry = (*entry).max(1);
        self.domain = color_domain(self.clicks.values().copied());
        self
    }

    pub fn domain(&self) -> (u64, u64) {
        self.domain
    }

    pub fn clicks(&self, code: &str) -> u64 {
        self.clicks
            .get(&normalize_country_code(code))
            .copied()
            .unwrap_or(0)
    }

    /// Countries with their click counts, ordered by code.
    pub fn entries(&self) -> impl Iterator<Item = (&str, u64)> {
        self.clicks.iter().map(|(code, n)| (code.as_str(), *n))
    }

    /// Palette index for a value, or `None` for zero.
    pub fn bucket(&self, value: u64) -> Option<usize> {
        if value == 0 {
            return None;
        }
        let (lo, hi) = self.domain;
        let value = value.clamp(lo, hi);
        let n = PALETTE.len() as u128;
        // Only degenerate when min is u64::MAX
        let span = u128::from(hi - lo).max(1);
        let index = u128::from(value - lo) * n / span;
        Some(index.min(n - 1) as usize)
    }

    pub fn color(&self, code: &str) -> &'static str {
        match self.bucket(self.clicks(code)) {
            Some(i) => PALETTE[i],
            None => NO_DATA_COLOR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(name: &str, clicks: u64) -> StatisticsDataPoint {
        StatisticsDataPoint {
            name: name.to_string(),
            clicks,
            percentage: 0.0,
        }
    }

    #[test]
    fn test_domain_is_never_degenerate() {
        assert_eq!(color_domain([5, 5, 5]), (5, 6));
        assert_eq!(color_domain([3, 9, 1]), (1, 9));
        assert_eq!(color_domain([]), (0, 1));
        assert_eq!(color_domain([0]), (0, 1));
    }

    #[test]
    fn test_huge_counts_do_not_overflow() {
        assert_eq!(color_domain([u64::MAX, u64::MAX]), (u64::MAX, u64::MAX));

        let scale = CountryScale::from_points(&[point("US", 1), point("VN", u64::MAX)]);
        assert_eq!(scale.bucket(1), Some(0));
        assert_eq!(scale.bucket(u64::MAX), Some(PALETTE.len() - 1));
        assert_eq!(scale.bucket(u64::MAX / 2), Some(4));

        let flat = CountryScale::from_points(&[point("US", u64::MAX)]);
        assert_eq!(flat.bucket(u64::MAX), Some(0));
    }

    #[test]
    fn test_normalize_aliases() {
        assert_eq!(normalize_country_code(" uk "), "GB");
        assert_eq!(normalize_country_code("el"), "GR");
        assert_eq!(normalize_country_code("vn"), "VN");
    }

    #[test]
    fn test_duplicate_codes_take_max() {
        let scale = CountryScale::from_points(&[point("UK", 4), point("gb", 9), point("US", 2)]);
        assert_eq!(scale.clicks("GB"), 9);
        assert_eq!(scale.clicks("uk"), 9);
        assert_eq!(scale.domain(), (2, 9));
        assert_eq!(scale.entries().count(), 2);
    }

    #[test]
    fn test_buckets_span_palette() {
        let scale = CountryScale::from_points(&[point("US", 1), point("VN", 11)]);
        assert_eq!(scale.bucket(1), Some(0));
        assert_eq!(scale.bucket(11), Some(9));
        assert_eq!(scale.bucket(6), Some(5));
        assert_eq!(scale.bucket(0), None);
        assert_eq!(scale.color("VN"), PALETTE[9]);
        assert_eq!(scale.color("FR"), NO_DATA_COLOR);
    }

    #[test]
    fn test_uniform_values_get_lightest_color() {
        let scale = CountryScale::from_points(&[point("US", 5), point("FR", 5)]);
        assert_eq!(scale.domain(), (5, 6));
        assert_eq!(scale.color("US"), PALETTE[0]);
    }

    #[test]
    fn test_floor_region() {
        let scale = CountryScale::from_points(&[point("US", 10)]).with_floor("vn");
        assert_eq!(scale.clicks("VN"), 1);
        assert_eq!(scale.domain(), (1, 10));
        assert_ne!(scale.color("VN"), NO_DATA_COLOR);

        // An existing larger count is kept
        let scale = CountryScale::from_points(&[point("VN", 7)]).with_floor("VN");
        assert_eq!(scale.clicks("VN"), 7);
    }
}
