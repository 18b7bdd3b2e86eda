use axum::Json;
use axum::extract::State;
use icf_providers::StripeClient;
use icf_providers::stripe::CheckoutRequest;
use serde::{Deserialize, Serialize};

use super::AppState;
use super::error::ApiError;
use super::extract::{ApiJson, CurrentUser};

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Monthly,
    Annual,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutBody {
    pub plan: Plan,
}

#[derive(Debug, Serialize)]
pub struct RedirectUrl {
    pub url: String,
}

fn stripe(state: &AppState) -> Result<&StripeClient, ApiError> {
    state.stripe.as_ref().ok_or(ApiError::NotConfigured("stripe"))
}

/// Start a subscription checkout. Returning customers skip the trial.
pub async fn checkout(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(body): ApiJson<CheckoutBody>,
) -> Result<Json<RedirectUrl>, ApiError> {
    let stripe = stripe(&state)?;
    let config = &state.config.stripe;
    let price_id = match body.plan {
        Plan::Monthly => config.monthly_price_id.as_str(),
        Plan::Annual => config.annual_price_id.as_str(),
    };
    if price_id.is_empty() {
        return Err(ApiError::NotConfigured("stripe prices"));
    }

    let profile = state.service.get_profile(&user.user_id).await?;
    let subscription = &profile.subscription;
    let trial_days = if subscription.stripe_subscription_id.is_some() {
        0
    } else {
        config.trial_days
    };
    let app_url = state.config.server.app_url();
    let url = stripe
        .create_checkout_session(&CheckoutRequest {
            user_id: &profile.user_id,
            email: &profile.email,
            customer_id: subscription.stripe_customer_id.as_deref(),
            price_id,
            trial_days,
            success_url: format!("{app_url}/account?checkout=success"),
            cancel_url: format!("{app_url}/pricing?checkout=canceled"),
        })
        .await?;
    tracing::info!(user_id = %user.user_id, plan = ?body.plan, trial_days, "checkout started");
    Ok(Json(RedirectUrl { url }))
}

pub async fn portal(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<RedirectUrl>, ApiError> {
    let stripe = stripe(&state)?;
    let profile = state.service.get_profile(&user.user_id).await?;
    let Some(customer_id) = profile.subscription.stripe_customer_id.as_deref() else {
        return Err(ApiError::bad_request("no billing account yet"));
    };
    let return_url = format!("{}/account", state.config.server.app_url());
    let url = stripe.create_portal_session(customer_id, &return_url).await?;
    Ok(Json(RedirectUrl { url }))
}
