//! Click analytics built on top of the per-dimension API.

pub mod aggregate;
pub mod choropleth;

pub use aggregate::{
    merge_results, AggregatedStatistics, DimensionSelection, StatisticsAggregator,
    StatisticsSource, StatisticsState,
};
pub use choropleth::{normalize_country_code, CountryScale};
