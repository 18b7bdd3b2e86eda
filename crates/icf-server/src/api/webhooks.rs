//! Inbound webhooks from the payment processor and the scheduling provider.
//!
//! Both verify a timestamped HMAC signature over the raw body before
//! anything is parsed, and both record the event id so a replay is
//! acknowledged without writes. When handling fails the id is forgotten
//! again so the provider's retry is processed.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use chrono::Utc;
use icf_auth::webhook_signature::{self, DEFAULT_TOLERANCE_SECS};
use icf_core::enums::SubscriptionStatus;
use icf_db::updates::profile::SubscriptionUpdate;
use icf_providers::calendly::WebhookEvent;
use icf_providers::stripe::{CheckoutSession, Event, Invoice, Subscription};
use serde_json::{Value, json};

use super::AppState;
use super::calendly::{InviteeRecord, record_invitee};
use super::error::ApiError;

const STRIPE_SIGNATURE: &str = "stripe-signature";
const CALENDLY_SIGNATURE: &str = "calendly-webhook-signature";

fn check_signature(
    headers: &HeaderMap,
    name: &str,
    body: &[u8],
    secret: &str,
) -> Result<(), ApiError> {
    let header = headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::bad_request(format!("missing {name} header")))?;
    webhook_signature::verify(
        header,
        body,
        secret,
        DEFAULT_TOLERANCE_SECS,
        Utc::now().timestamp(),
    )?;
    Ok(())
}

fn received(duplicate: bool) -> Json<Value> {
    if duplicate {
        Json(json!({"received": true, "duplicate": true}))
    } else {
        Json(json!({"received": true}))
    }
}

pub async fn stripe(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    if !state.config.stripe.is_configured() {
        return Err(ApiError::NotConfigured("stripe"));
    }
    check_signature(
        &headers,
        STRIPE_SIGNATURE,
        &body,
        &state.config.stripe.webhook_secret,
    )?;
    let event = Event::from_slice(&body).map_err(|e| ApiError::bad_request(e.to_string()))?;

    if !state.service.record_webhook_event("stripe", &event.id).await? {
        tracing::debug!(event_id = %event.id, "stripe event replayed");
        return Ok(received(true));
    }
    if let Err(error) = handle_stripe_event(&state, &event).await {
        tracing::warn!(event_id = %event.id, kind = %event.event_type, %error, "stripe event failed");
        state.service.forget_webhook_event("stripe", &event.id).await?;
        return Err(error);
    }
    Ok(received(false))
}

fn decode<T: serde::de::DeserializeOwned>(event: &Event) -> Result<T, ApiError> {
    event
        .object()
        .map_err(|e| ApiError::bad_request(e.to_string()))
}

async fn handle_stripe_event(state: &AppState, event: &Event) -> Result<(), ApiError> {
    match event.event_type.as_str() {
        "checkout.session.completed" => {
            let session: CheckoutSession = decode(event)?;
            checkout_completed(state, &session).await
        }
        "customer.subscription.created" | "customer.subscription.updated" => {
            let subscription: Subscription = decode(event)?;
            apply_subscription(state, &subscription, None).await
        }
        "customer.subscription.deleted" => {
            let subscription: Subscription = decode(event)?;
            apply_subscription(state, &subscription, Some(SubscriptionStatus::Canceled)).await
        }
        "invoice.payment_failed" => {
            let invoice: Invoice = decode(event)?;
            let Some(customer) = invoice.customer.as_deref() else {
                return Ok(());
            };
            let Some(profile) = state.service.find_profile_by_customer(customer).await? else {
                tracing::warn!(invoice = %invoice.id, "payment failed for unknown customer");
                return Ok(());
            };
            state
                .service
                .update_subscription(
                    &profile.user_id,
                    &SubscriptionUpdate::status(SubscriptionStatus::PastDue),
                )
                .await?;
            tracing::info!(user_id = %profile.user_id, "subscription past due");
            Ok(())
        }
        other => {
            tracing::debug!(kind = other, "stripe event ignored");
            Ok(())
        }
    }
}

async fn checkout_completed(state: &AppState, session: &CheckoutSession) -> Result<(), ApiError> {
    let Some(user_id) = session.client_reference_id.as_deref() else {
        tracing::warn!(session = %session.id, "checkout session without client reference");
        return Ok(());
    };
    if state.service.find_profile(user_id).await?.is_none() {
        tracing::warn!(session = %session.id, user_id, "checkout completed for unknown profile");
        return Ok(());
    }
    state
        .service
        .update_subscription(
            user_id,
            &SubscriptionUpdate {
                stripe_customer_id: session.customer.clone(),
                stripe_subscription_id: session.subscription.clone(),
                ..SubscriptionUpdate::default()
            },
        )
        .await?;

    let Some(subscription_id) = session.subscription.as_deref() else {
        return Ok(());
    };
    let stripe = state
        .stripe
        .as_ref()
        .ok_or(ApiError::NotConfigured("stripe"))?;
    let subscription = stripe.retrieve_subscription(subscription_id).await?;
    apply_subscription(state, &subscription, None).await
}

async fn apply_subscription(
    state: &AppState,
    subscription: &Subscription,
    status: Option<SubscriptionStatus>,
) -> Result<(), ApiError> {
    let Some(profile) = state
        .service
        .find_profile_by_customer(&subscription.customer)
        .await?
    else {
        tracing::warn!(subscription = %subscription.id, "subscription for unknown customer");
        return Ok(());
    };
    let status = status.unwrap_or_else(|| subscription.status());
    let update = SubscriptionUpdate {
        status: Some(status),
        stripe_customer_id: None,
        stripe_subscription_id: Some(subscription.id.clone()),
        price_id: Some(subscription.price_id().map(str::to_string)),
        current_period_end: Some(subscription.current_period_end()),
        cancel_at_period_end: Some(
            status != SubscriptionStatus::Canceled && subscription.cancel_at_period_end,
        ),
        trial_ends_at: Some(subscription.trial_end()),
    };
    state
        .service
        .update_subscription(&profile.user_id, &update)
        .await?;
    tracing::info!(user_id = %profile.user_id, status = %status, "subscription updated");
    Ok(())
}

pub async fn calendly(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let secret = &state.config.calendly.webhook_signing_key;
    if secret.is_empty() {
        return Err(ApiError::NotConfigured("calendly webhooks"));
    }
    check_signature(&headers, CALENDLY_SIGNATURE, &body, secret)?;
    let event = WebhookEvent::from_slice(&body).map_err(|e| ApiError::bad_request(e.to_string()))?;

    let event_key = format!("{}:{}", event.event, event.payload.uri);
    if !state.service.record_webhook_event("calendly", &event_key).await? {
        return Ok(received(true));
    }
    if let Err(error) = handle_calendly_event(&state, &event).await {
        tracing::warn!(event = %event_key, %error, "calendly event failed");
        state.service.forget_webhook_event("calendly", &event_key).await?;
        return Err(error);
    }
    Ok(received(false))
}

async fn handle_calendly_event(state: &AppState, event: &WebhookEvent) -> Result<(), ApiError> {
    let payload = &event.payload;
    match event.event.as_str() {
        "invitee.created" => {
            let Some(scheduled) = payload.scheduled_event.as_ref() else {
                tracing::warn!(invitee = %payload.uri, "invitee without scheduled event");
                return Ok(());
            };
            let mut owner = None;
            for host in scheduled.host_uris() {
                owner = state.service.find_profile_by_calendly_user(host).await?;
                if owner.is_some() {
                    break;
                }
            }
            let Some(owner) = owner else {
                tracing::warn!(event = %scheduled.uri, "no connected profile hosts this event");
                return Ok(());
            };
            let created = record_invitee(
                &state.service,
                &owner.user_id,
                scheduled,
                &InviteeRecord {
                    uri: &payload.uri,
                    name: &payload.name,
                    email: payload.email.as_deref(),
                },
            )
            .await?;
            tracing::info!(user_id = %owner.user_id, invitee = %payload.uri, created, "calendly invitee");
            Ok(())
        }
        "invitee.canceled" => {
            let removed = state.service.delete_session_by_invitee(&payload.uri).await?;
            tracing::info!(invitee = %payload.uri, removed, "calendly invitee canceled");
            Ok(())
        }
        other => {
            tracing::debug!(kind = other, "calendly event ignored");
            Ok(())
        }
    }
}
