use anyhow::{Context as _, Result};
use clap::Args;
use inquire::MultiSelect;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use intelink::models::statistics::{
    dimensions_by_category, DimensionCategory, DimensionType, Granularity, PeakTimesResponse,
    TimeSeriesQuery, TimeSeriesResponse,
};
use intelink::renderer::md::{self, StatisticsReport};
use intelink::stats::{CountryScale, StatisticsAggregator, StatisticsState};

use super::{finish_spinner, spinner, Context};

/// Shown when nothing is selected and no prompt is possible.
const DEFAULT_DIMENSIONS: [DimensionType; 5] = [
    DimensionType::Referrer,
    DimensionType::Country,
    DimensionType::Browser,
    DimensionType::Os,
    DimensionType::DeviceType,
];

#[derive(Args)]
pub struct StatsArgs {
    /// Short code to report on
    pub code: String,

    /// Dimension to include (repeatable), e.g. BROWSER, utm_source
    #[arg(short, long = "dimension", value_name = "DIMENSION")]
    pub dimensions: Vec<DimensionType>,

    /// Include every dimension of a category (SOURCES, GEOGRAPHY, TECHNOLOGY, CUSTOM)
    #[arg(short, long = "category", value_name = "CATEGORY")]
    pub categories: Vec<DimensionCategory>,

    /// Include every dimension
    #[arg(long)]
    pub all: bool,

    /// Include clicks over time at this granularity (HOURLY, DAILY, ...)
    #[arg(long, value_name = "GRANULARITY", num_args = 0..=1, default_missing_value = "DAILY")]
    pub timeseries: Option<Granularity>,

    /// Include the busiest periods
    #[arg(long)]
    pub peak_times: bool,

    /// Lower bound for time series and peak times (ISO 8601)
    #[arg(long)]
    pub from: Option<String>,

    /// Upper bound for time series and peak times (ISO 8601)
    #[arg(long)]
    pub to: Option<String>,

    /// Write the Markdown report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Re-fetch and re-print every N seconds
    #[arg(long, value_name = "SECONDS")]
    pub watch: Option<u64>,
}

pub async fn run(ctx: &Context, args: StatsArgs) -> Result<()> {
    ctx.require_user().await?;

    let dimensions = select_dimensions(&args)?;
    tracing::info!(
        "Statistics for {} over {} dimension(s)",
        args.code,
        dimensions.len()
    );

    let aggregator = StatisticsAggregator::new(ctx.api.clone());
    let pb = spinner(&format!("Fetching statistics for {}...", args.code));
    aggregator.set_inputs(&args.code, dimensions).await;
    let extras = fetch_extras(ctx, &args).await;
    finish_spinner(pb);
    emit(ctx, &args, &aggregator.snapshot(), &extras).await?;

    let Some(secs) = args.watch else {
        return Ok(());
    };
    let mut interval = tokio::time::interval(Duration::from_secs(secs.max(1)));
    interval.tick().await;
    loop {
        interval.tick().await;
        aggregator.refetch().await;
        let extras = fetch_extras(ctx, &args).await;
        emit(ctx, &args, &aggregator.snapshot(), &extras).await?;
    }
}

/// Flags first; otherwise an interactive pick on a terminal; otherwise a
/// default set.
fn select_dimensions(args: &StatsArgs) -> Result<Vec<DimensionType>> {
    if args.all {
        return Ok(dimensions_by_category().into_values().flatten().collect());
    }

    let mut dimensions = args.dimensions.clone();
    for category in &args.categories {
        dimensions.extend(category.dimensions());
    }
    if !dimensions.is_empty() {
        return Ok(dimensions);
    }

    if !std::io::stdin().is_terminal() {
        return Ok(DEFAULT_DIMENSIONS.to_vec());
    }

    let options: Vec<DimensionOption> = dimensions_by_category()
        .into_iter()
        .flat_map(|(category, dims)| {
            dims.into_iter()
                .map(move |dimension| DimensionOption { category, dimension })
        })
        .collect();
    let defaults: Vec<usize> = options
        .iter()
        .enumerate()
        .filter(|(_, o)| DEFAULT_DIMENSIONS.contains(&o.dimension))
        .map(|(i, _)| i)
        .collect();

    let selected = MultiSelect::new(
        "Select dimensions (use Space to select, Enter to confirm):",
        options,
    )
    .with_default(&defaults)
    .prompt()?;

    if selected.is_empty() {
        anyhow::bail!("No dimensions selected");
    }
    Ok(selected.into_iter().map(|o| o.dimension).collect())
}

struct DimensionOption {
    category: DimensionCategory,
    dimension: DimensionType,
}

impl std::fmt::Display for DimensionOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {}", self.category, self.dimension.label())
    }
}

#[derive(Default)]
struct Extras {
    time_series: Option<TimeSeriesResponse>,
    peak_times: Option<PeakTimesResponse>,
}

/// Time series and peak times are optional sections; a failure is logged
/// and the section left out.
async fn fetch_extras(ctx: &Context, args: &StatsArgs) -> Extras {
    let query = TimeSeriesQuery {
        granularity: args.timeseries,
        from: args.from.clone(),
        to: args.to.clone(),
        timezone: None,
    };

    let time_series = async {
        match args.timeseries {
            Some(_) => ctx
                .api
                .time_series(&args.code, &query)
                .await
                .inspect_err(|e| eprintln!("⚠️  Time series unavailable: {}", e))
                .ok(),
            None => None,
        }
    };
    let peak_times = async {
        if args.peak_times {
            ctx.api
                .peak_times(&args.code, &query)
                .await
                .inspect_err(|e| eprintln!("⚠️  Peak times unavailable: {}", e))
                .ok()
        } else {
            None
        }
    };

    let (time_series, peak_times) = tokio::join!(time_series, peak_times);
    Extras {
        time_series,
        peak_times,
    }
}

async fn emit(
    ctx: &Context,
    args: &StatsArgs,
    state: &StatisticsState,
    extras: &Extras,
) -> Result<()> {
    if let Some(ref error) = state.error {
        if state.data.is_empty() {
            anyhow::bail!("{}", error);
        }
        eprintln!("⚠️  {} Showing the last loaded statistics.", error);
    }

    let short_url = match ctx.api.get_short_url(&args.code).await {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::warn!("Could not load link details for {}: {}", args.code, e);
            None
        }
    };

    let countries = state.data.get(&DimensionType::Country).map(|response| {
        let scale = CountryScale::from_points(response.points());
        match ctx.config.map_floor_region {
            Some(ref region) => scale.with_floor(region),
            None => scale,
        }
    });

    let report = StatisticsReport {
        short_code: &args.code,
        short_url: short_url.as_ref(),
        generated_at: chrono::Utc::now(),
        data: &state.data,
        error: state.error.as_deref(),
        countries: countries.as_ref(),
        time_series: extras.time_series.as_ref(),
        peak_times: extras.peak_times.as_ref(),
    };
    let markdown = md::render(&report);

    match args.output {
        Some(ref path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create output directory: {}", parent.display())
                })?;
            }
            std::fs::write(path, markdown)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            eprintln!("Markdown report written to: {}", path.display());
        }
        None => print!("{}", markdown),
    }
    Ok(())
}
