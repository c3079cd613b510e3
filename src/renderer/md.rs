use chrono::{DateTime, Utc};

use crate::models::short_url::ShortUrl;
use crate::models::statistics::{
    dimensions_by_category, DimensionType, PeakTimesResponse, StatisticsResponse,
    TimeSeriesResponse,
};
use crate::stats::{AggregatedStatistics, CountryScale};
use crate::timefmt::format_utc;

/// Rows shown per dimension table.
const TOP_ROWS: usize = 10;

/// Everything that goes into one statistics report.
pub struct StatisticsReport<'a> {
    pub short_code: &'a str,
    pub short_url: Option<&'a ShortUrl>,
    pub generated_at: DateTime<Utc>,
    pub data: &'a AggregatedStatistics,
    /// Top-level error of the last fetch, if any.
    pub error: Option<&'a str>,
    pub countries: Option<&'a CountryScale>,
    pub time_series: Option<&'a TimeSeriesResponse>,
    pub peak_times: Option<&'a PeakTimesResponse>,
}

/// Render a statistics report to Markdown.
///
/// Dimensions are grouped by category in display order; only requested
/// dimensions appear.
pub fn render(report: &StatisticsReport) -> String {
    let mut output = String::new();

    // 1. Title and link details
    render_header(&mut output, report);

    if let Some(error) = report.error {
        output.push_str(&format!("> ⚠️ {}\n\n", error));
    }

    // 2. Dimension breakdowns by category
    for (category, dimensions) in dimensions_by_category() {
        let present: Vec<_> = dimensions
            .iter()
            .filter_map(|d| report.data.get(d).map(|r| (*d, r)))
            .collect();
        if present.is_empty() {
            continue;
        }

        output.push_str(&format!("### {}\n", category));
        for (dimension, response) in present {
            render_dimension(&mut output, dimension, response);
            if dimension == DimensionType::Country {
                if let Some(scale) = report.countries {
                    render_country_map(&mut output, scale);
                }
            }
        }
    }

    // 3. Over time
    if let Some(series) = report.time_series {
        render_time_series(&mut output, series);
    }

    // 4. Peak times
    if let Some(peaks) = report.peak_times {
        render_peak_times(&mut output, peaks);
    }

    output
}

fn render_header(output: &mut String, report: &StatisticsReport) {
    output.push_str(&format!("# 📊 Statistics for `{}`\n", report.short_code));
    output.push_str(&format!(
        "*Generated {}*\n\n",
        format_utc(&report.generated_at)
    ));

    if let Some(url) = report.short_url {
        output.push_str("### 🔗 Link\n");
        let short_url = url.display_url().unwrap_or_else(|| url.short_code.clone());
        output.push_str(&format!("- **Short URL:** {}\n", short_url));
        output.push_str(&format!("- **Destination:** {}\n", url.original_url));
        output.push_str(&format!("- **Status:** {}\n", url.status));
        output.push_str(&format!(
            "- **Total clicks:** {}\n",
            format_number(url.total_clicks)
        ));
        if let Some(remaining) = url.remaining_usage() {
            output.push_str(&format!(
                "- **Remaining uses:** {}\n",
                format_number(remaining)
            ));
        }
        output.push('\n');
    }
}

fn render_dimension(output: &mut String, dimension: DimensionType, response: &StatisticsResponse) {
    output.push_str(&format!(
        "#### {} ({} clicks)\n",
        dimension.label(),
        format_number(response.total_clicks)
    ));

    let points = response.points();
    if points.is_empty() {
        output.push_str("_No data._\n\n");
        return;
    }

    output.push_str("| Rank | Name | Clicks | % |\n");
    output.push_str("| ---- | ---- | ------ | - |\n");
    for (i, point) in points.iter().take(TOP_ROWS).enumerate() {
        let name = if point.name.trim().is_empty() {
            "(unknown)"
        } else {
            point.name.as_str()
        };
        output.push_str(&format!(
            "| {} | {} | {} | {:.1} |\n",
            i + 1,
            escape_cell(name),
            format_number(point.clicks),
            point.percentage
        ));
    }
    if points.len() > TOP_ROWS {
        output.push_str(&format!("\n_…and {} more._\n", points.len() - TOP_ROWS));
    }
    output.push('\n');
}

fn render_country_map(output: &mut String, scale: &CountryScale) {
    let (lo, hi) = scale.domain();
    output.push_str(&format!(
        "**Map shading** (scale {} to {})\n\n",
        format_number(lo),
        format_number(hi)
    ));
    output.push_str("| Country | Clicks | Shade |\n");
    output.push_str("| ------- | ------ | ----- |\n");

    let mut entries: Vec<_> = scale.entries().collect();
    // Busiest first, then by code
    entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    for (code, clicks) in entries {
        output.push_str(&format!(
            "| {} | {} | `{}` |\n",
            code,
            format_number(clicks),
            scale.color(code)
        ));
    }
    output.push('\n');
}

fn render_time_series(output: &mut String, series: &TimeSeriesResponse) {
    output.push_str("### 📈 Over time\n");
    if let Some(granularity) = series.granularity {
        output.push_str(&format!("Granularity: {}\n\n", granularity));
    }

    let points = series.data.as_slice();
    if points.is_empty() {
        output.push_str("_No clicks in this range._\n\n");
        return;
    }

    output.push_str("| Period | Clicks |\n");
    output.push_str("| ------ | ------ |\n");
    for point in points {
        output.push_str(&format!(
            "| {} | {} |\n",
            point.bucket,
            format_number(point.clicks)
        ));
    }
    output.push('\n');
}

fn render_peak_times(output: &mut String, peaks: &PeakTimesResponse) {
    output.push_str("### ⏰ Peak times\n");
    match peaks.peak() {
        Some(peak) if peak.clicks > 0 => {
            output.push_str(&format!(
                "- 🔥 **Busiest period:** {} ({} clicks)\n\n",
                peak.period,
                format_number(peak.clicks)
            ));
        }
        _ => output.push_str("_No peak yet._\n\n"),
    }
}

/// Keep table cells on one line and free of column separators.
fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

/// Format a number with thousands separators (e.g. 1234567 -> "1,234,567")
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut grouped_rev = String::new();

    // Insert commas every three digits, starting from the right
    for (count, ch) in digits.chars().rev().enumerate() {
        if count > 0 && count.is_multiple_of(3) {
            grouped_rev.push(',');
        }
        grouped_rev.push(ch);
    }

    grouped_rev.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::statistics::{PeakTimePoint, StatisticsDataPoint};
    use chrono::TimeZone;

    fn response(points: &[(&str, u64)]) -> StatisticsResponse {
        StatisticsResponse {
            data: points
                .iter()
                .map(|(name, clicks)| StatisticsDataPoint {
                    name: name.to_string(),
                    clicks: *clicks,
                    percentage: 50.0,
                })
                .collect::<Vec<_>>()
                .into(),
            total_clicks: points.iter().map(|(_, c)| c).sum(),
            category: String::new(),
        }
    }

    fn report<'a>(data: &'a AggregatedStatistics) -> StatisticsReport<'a> {
        StatisticsReport {
            short_code: "abc123",
            short_url: None,
            generated_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            data,
            error: None,
            countries: None,
            time_series: None,
            peak_times: None,
        }
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_groups_by_category_in_order() {
        let mut data = AggregatedStatistics::new();
        data.insert(DimensionType::Browser, response(&[("Chrome", 3), ("Firefox", 1)]));
        data.insert(DimensionType::Referrer, response(&[("google.com", 4)]));
        data.insert(
            DimensionType::Country,
            StatisticsResponse::empty(DimensionType::Country),
        );

        let md = render(&report(&data));
        let sources = md.find("### Sources").unwrap();
        let geography = md.find("### Geography").unwrap();
        let technology = md.find("### Technology").unwrap();
        assert!(sources < geography && geography < technology);
        assert!(!md.contains("### Custom"));
        assert!(md.contains("| 1 | Chrome | 3 | 50.0 |"));
        assert!(md.contains("#### Country (0 clicks)\n_No data._"));
    }

    #[test]
    fn test_error_banner_and_peaks() {
        let data = AggregatedStatistics::new();
        let peaks = PeakTimesResponse {
            data: vec![
                PeakTimePoint {
                    period: "09:00".to_string(),
                    clicks: 12,
                },
                PeakTimePoint {
                    period: "21:00".to_string(),
                    clicks: 4,
                },
            ]
            .into(),
            total_clicks: 16,
        };
        let mut r = report(&data);
        r.error = Some("Unable to reach the server");
        r.peak_times = Some(&peaks);

        let md = render(&r);
        assert!(md.contains("> ⚠️ Unable to reach the server"));
        assert!(md.contains("**Busiest period:** 09:00 (12 clicks)"));
    }

    #[test]
    fn test_country_map_section() {
        let mut data = AggregatedStatistics::new();
        let countries = response(&[("VN", 10), ("us", 2)]);
        let scale = CountryScale::from_points(countries.points());
        data.insert(DimensionType::Country, countries);

        let mut r = report(&data);
        r.countries = Some(&scale);
        let md = render(&r);
        assert!(md.contains("**Map shading** (scale 2 to 10)"));
        let vn = md.find("| VN | 10 |").unwrap();
        let us = md.find("| US | 2 |").unwrap();
        assert!(vn < us);
    }
}
