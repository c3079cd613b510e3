/// Click statistics shapes and the dimension enum.
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use super::page::RawList;

/// An axis along which clicks are aggregated.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum DimensionType {
    Referrer,
    ReferrerType,
    UtmSource,
    UtmMedium,
    UtmCampaign,
    UtmTerm,
    UtmContent,
    Country,
    Region,
    City,
    Timezone,
    Browser,
    Os,
    DeviceType,
    Language,
    Custom,
}

/// Presentation grouping of dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum DimensionCategory {
    Sources,
    Geography,
    Technology,
    Custom,
}

impl DimensionType {
    /// Path segment of `GET /statistics/{code}/{segment}`.
    ///
    /// A few dimensions have backend paths that differ from their name; all
    /// others are the lowercased, hyphenated enum name.
    pub fn path_segment(self) -> String {
        match self {
            DimensionType::DeviceType => "device".to_string(),
            DimensionType::ReferrerType => "referrer-type".to_string(),
            DimensionType::Os => "os".to_string(),
            DimensionType::Country => "country".to_string(),
            other => other.to_string().to_lowercase().replace('_', "-"),
        }
    }

    pub fn category(self) -> DimensionCategory {
        match self {
            DimensionType::Referrer | DimensionType::ReferrerType => DimensionCategory::Sources,
            DimensionType::Country
            | DimensionType::Region
            | DimensionType::City
            | DimensionType::Timezone => DimensionCategory::Geography,
            DimensionType::Browser
            | DimensionType::Os
            | DimensionType::DeviceType
            | DimensionType::Language => DimensionCategory::Technology,
            DimensionType::UtmSource
            | DimensionType::UtmMedium
            | DimensionType::UtmCampaign
            | DimensionType::UtmTerm
            | DimensionType::UtmContent
            | DimensionType::Custom => DimensionCategory::Custom,
        }
    }

    /// Human label, e.g. "Device type".
    pub fn label(self) -> String {
        let name = self.to_string().to_lowercase().replace('_', " ");
        match self {
            DimensionType::Os => "OS".to_string(),
            DimensionType::UtmSource
            | DimensionType::UtmMedium
            | DimensionType::UtmCampaign
            | DimensionType::UtmTerm
            | DimensionType::UtmContent => name.replacen("utm", "UTM", 1),
            _ => {
                let mut chars = name.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => name,
                }
            }
        }
    }
}

impl DimensionCategory {
    pub fn dimensions(self) -> Vec<DimensionType> {
        DimensionType::iter()
            .filter(|d| d.category() == self)
            .collect()
    }
}

/// All dimensions grouped by category, in display order.
pub fn dimensions_by_category() -> IndexMap<DimensionCategory, Vec<DimensionType>> {
    DimensionCategory::iter()
        .map(|c| (c, c.dimensions()))
        .collect()
}

/// One row of a per-dimension breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsDataPoint {
    pub name: String,
    #[serde(default)]
    pub clicks: u64,
    #[serde(default)]
    pub percentage: f64,
}

/// One dimension's full result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsResponse {
    #[serde(default)]
    pub data: RawList<StatisticsDataPoint>,
    #[serde(default)]
    pub total_clicks: u64,
    #[serde(default)]
    pub category: String,
}

impl StatisticsResponse {
    /// Zero-value placeholder used when a dimension could not be fetched.
    pub fn empty(dimension: DimensionType) -> Self {
        Self {
            data: RawList::default(),
            total_clicks: 0,
            category: dimension.to_string(),
        }
    }

    pub fn points(&self) -> &[StatisticsDataPoint] {
        self.data.as_slice()
    }

    /// Replace a tuple-wrapped `data` with the plain list.
    pub fn normalized(self) -> Self {
        Self {
            data: RawList::Plain(self.data.into_vec()),
            ..self
        }
    }
}

/// Bucket size of a time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Granularity {
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

#[derive(Debug, Clone, Default)]
pub struct TimeSeriesQuery {
    pub granularity: Option<Granularity>,
    /// ISO-8601 lower bound.
    pub from: Option<String>,
    pub to: Option<String>,
    pub timezone: Option<String>,
}

impl TimeSeriesQuery {
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(g) = self.granularity {
            params.push(("granularity", g.to_string()));
        }
        if let Some(ref from) = self.from {
            params.push(("from", from.clone()));
        }
        if let Some(ref to) = self.to {
            params.push(("to", to.clone()));
        }
        if let Some(ref tz) = self.timezone {
            params.push(("timezone", tz.clone()));
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPoint {
    /// Bucket start as rendered by the backend.
    #[serde(alias = "time", alias = "timestamp")]
    pub bucket: String,
    #[serde(default)]
    pub clicks: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesResponse {
    #[serde(default)]
    pub granularity: Option<Granularity>,
    #[serde(default)]
    pub data: RawList<TimeSeriesPoint>,
    #[serde(default)]
    pub total_clicks: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakTimePoint {
    #[serde(alias = "time", alias = "hour")]
    pub period: String,
    #[serde(default)]
    pub clicks: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakTimesResponse {
    #[serde(default)]
    pub data: RawList<PeakTimePoint>,
    #[serde(default)]
    pub total_clicks: u64,
}

impl PeakTimesResponse {
    /// The period with the most clicks; first one wins on ties.
    pub fn peak(&self) -> Option<&PeakTimePoint> {
        self.data
            .as_slice()
            .iter()
            .fold(None, |best: Option<&PeakTimePoint>, p| match best {
                Some(b) if b.clicks >= p.clicks => Some(b),
                _ => Some(p),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn test_explicit_path_segments() {
        assert_eq!(DimensionType::DeviceType.path_segment(), "device");
        assert_eq!(DimensionType::ReferrerType.path_segment(), "referrer-type");
        assert_eq!(DimensionType::Os.path_segment(), "os");
    }

    #[test]
    fn test_derived_path_segments() {
        assert_eq!(DimensionType::UtmSource.path_segment(), "utm-source");
        assert_eq!(DimensionType::UtmCampaign.path_segment(), "utm-campaign");
        assert_eq!(DimensionType::Browser.path_segment(), "browser");
        assert_eq!(DimensionType::Timezone.path_segment(), "timezone");
    }

    #[test]
    fn test_every_dimension_has_a_category() {
        let grouped = dimensions_by_category();
        let total: usize = grouped.values().map(Vec::len).sum();
        assert_eq!(total, DimensionType::iter().count());
        assert_eq!(
            grouped.keys().copied().collect::<Vec<_>>(),
            vec![
                DimensionCategory::Sources,
                DimensionCategory::Geography,
                DimensionCategory::Technology,
                DimensionCategory::Custom
            ]
        );
        assert!(grouped[&DimensionCategory::Geography].contains(&DimensionType::Country));
    }

    #[test]
    fn test_dimension_serde_and_parse() {
        assert_eq!(
            serde_json::to_value(DimensionType::DeviceType).unwrap(),
            json!("DEVICE_TYPE")
        );
        assert_eq!(
            DimensionType::from_str("utm_source").unwrap(),
            DimensionType::UtmSource
        );
        assert!(DimensionType::from_str("planet").is_err());
    }

    #[test]
    fn test_labels() {
        assert_eq!(DimensionType::DeviceType.label(), "Device type");
        assert_eq!(DimensionType::UtmSource.label(), "UTM source");
        assert_eq!(DimensionType::Os.label(), "OS");
    }

    #[test]
    fn test_response_with_tagged_data() {
        let resp: StatisticsResponse = serde_json::from_value(json!({
            "data": ["java.util.ArrayList", [
                {"name": "Chrome", "clicks": 7, "percentage": 70.0},
                {"name": "Firefox", "clicks": 3, "percentage": 30.0}
            ]],
            "totalClicks": 10,
            "category": "BROWSER"
        }))
        .unwrap();
        let resp = resp.normalized();
        assert!(matches!(resp.data, RawList::Plain(_)));
        assert_eq!(resp.points()[0].name, "Chrome");
        assert_eq!(resp.total_clicks, 10);
    }

    #[test]
    fn test_empty_placeholder() {
        let empty = StatisticsResponse::empty(DimensionType::Country);
        assert!(empty.points().is_empty());
        assert_eq!(empty.total_clicks, 0);
        assert_eq!(empty.category, "COUNTRY");
    }

    #[test]
    fn test_peak_picks_highest() {
        let peaks: PeakTimesResponse = serde_json::from_value(json!({
            "data": [
                {"time": "08:00", "clicks": 4},
                {"time": "12:00", "clicks": 9},
                {"time": "18:00", "clicks": 9}
            ]
        }))
        .unwrap();
        assert_eq!(peaks.peak().unwrap().period, "12:00");
    }
}
