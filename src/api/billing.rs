//! Plan, subscription and payment endpoints.

use reqwest::Method;
use std::collections::BTreeMap;

use super::ApiClient;
use crate::error::ApiError;
use crate::models::billing::{
    CreatePlanRequest, CreateSubscriptionRequest, PaymentResult, Plan, PlanStatusRequest,
    Subscription, SubscriptionCost, UpdatePlanRequest, VnpayPaymentRequest, VnpayPaymentResponse,
};
use crate::models::RawList;

impl ApiClient {
    /// `GET /plan`
    pub async fn list_plans(&self) -> Result<Vec<Plan>, ApiError> {
        let plans: RawList<Plan> = self.get("/plan", &[]).await?;
        Ok(plans.into_vec())
    }

    /// `POST /plan` (admin)
    pub async fn create_plan(&self, request: &CreatePlanRequest) -> Result<Plan, ApiError> {
        self.send_validated(Method::POST, "/plan", request).await
    }

    /// `PUT /plan/{id}` (admin)
    pub async fn update_plan(&self, id: i64, request: &UpdatePlanRequest) -> Result<Plan, ApiError> {
        self.send_validated(Method::PUT, &format!("/plan/{}", id), request)
            .await
    }

    /// `DELETE /plan/{id}` (admin)
    pub async fn delete_plan(&self, id: i64) -> Result<(), ApiError> {
        self.send::<(), serde_json::Value>(Method::DELETE, &format!("/plan/{}", id), None)
            .await
            .map(|_| ())
    }

    /// `PATCH /plan/{id}/status` (admin)
    pub async fn set_plan_status(&self, id: i64, active: bool) -> Result<Plan, ApiError> {
        self.send(
            Method::PATCH,
            &format!("/plan/{}/status", id),
            Some(&PlanStatusRequest { active }),
        )
        .await
    }

    /// `POST /subscription`
    pub async fn create_subscription(
        &self,
        request: &CreateSubscriptionRequest,
    ) -> Result<Subscription, ApiError> {
        self.send(Method::POST, "/subscription", Some(request)).await
    }

    /// `GET /subscription`
    pub async fn list_subscriptions(&self) -> Result<Vec<Subscription>, ApiError> {
        let subs: RawList<Subscription> = self.get("/subscription", &[]).await?;
        Ok(subs.into_vec())
    }

    /// `GET /subscription/current`; `None` when the user has no subscription.
    pub async fn current_subscription(&self) -> Result<Option<Subscription>, ApiError> {
        match self.get("/subscription/current", &[]).await {
            Err(ApiError::NotFound { .. }) => Ok(None),
            other => other,
        }
    }

    /// `GET /subscription/cost?planId=..`
    pub async fn subscription_cost(&self, plan_id: i64) -> Result<SubscriptionCost, ApiError> {
        self.get("/subscription/cost", &[("planId", plan_id.to_string())])
            .await
    }

    /// `POST /subscription/{id}/cancel`
    pub async fn cancel_subscription(&self, id: &str) -> Result<Subscription, ApiError> {
        self.send::<(), _>(
            Method::POST,
            &format!("/subscription/{}/cancel", id.trim()),
            None,
        )
        .await
    }

    /// `POST /payments/vnpay/create`
    pub async fn create_vnpay_payment(
        &self,
        request: &VnpayPaymentRequest,
    ) -> Result<VnpayPaymentResponse, ApiError> {
        self.send_validated(Method::POST, "/payments/vnpay/create", request)
            .await
    }

    /// `GET /payments/vnpay/callback`, forwarding the gateway's query
    /// parameters untouched.
    pub async fn vnpay_callback(
        &self,
        params: &BTreeMap<String, String>,
    ) -> Result<PaymentResult, ApiError> {
        let query: Vec<(&str, String)> = params
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();
        self.get("/payments/vnpay/callback", &query).await
    }
}
