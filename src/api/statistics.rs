//! Statistics endpoints.

use super::{short_code_segment, ApiClient};
use crate::error::ApiError;
use crate::models::statistics::{
    DimensionType, PeakTimesResponse, StatisticsResponse, TimeSeriesQuery, TimeSeriesResponse,
};
use crate::stats::StatisticsSource;

impl ApiClient {
    /// `GET /statistics/{code}/{dimension-path}`
    ///
    /// The returned response always has plain (non tuple-wrapped) `data`.
    pub async fn dimension_statistics(
        &self,
        short_code: &str,
        dimension: DimensionType,
    ) -> Result<StatisticsResponse, ApiError> {
        let path = format!(
            "{}/{}",
            statistics_path(short_code)?,
            dimension.path_segment()
        );
        let response: StatisticsResponse = self.get(&path, &[]).await?;
        Ok(response.normalized())
    }

    /// `GET /statistics/{code}/timeseries`
    pub async fn time_series(
        &self,
        short_code: &str,
        query: &TimeSeriesQuery,
    ) -> Result<TimeSeriesResponse, ApiError> {
        let path = format!("{}/timeseries", statistics_path(short_code)?);
        self.get(&path, &query.to_params()).await
    }

    /// `GET /statistics/{code}/peak-times`
    pub async fn peak_times(
        &self,
        short_code: &str,
        query: &TimeSeriesQuery,
    ) -> Result<PeakTimesResponse, ApiError> {
        let path = format!("{}/peak-times", statistics_path(short_code)?);
        self.get(&path, &query.to_params()).await
    }
}

impl StatisticsSource for ApiClient {
    async fn fetch_dimension(
        &self,
        short_code: &str,
        dimension: DimensionType,
    ) -> Result<StatisticsResponse, ApiError> {
        self.dimension_statistics(short_code, dimension).await
    }
}

fn statistics_path(short_code: &str) -> Result<String, ApiError> {
    Ok(format!("/statistics/{}", short_code_segment(short_code)?))
}
