use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use mongodb::bson::{doc, DateTime};
use service_core::error::AppError;
use validator::Validate;

use crate::dtos::{
    CreateSubscriptionRequest, DataResponse, ReviewDecisionRequest, SubscriptionResponse,
};
use crate::middleware::AuthUser;
use crate::models::{Subscription, SubscriptionPlan, SubscriptionStatus};
use crate::services::Role;
use crate::AppState;

async fn load_subscription(state: &AppState, id: &str) -> Result<Subscription, AppError> {
    state
        .db
        .subscriptions()
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Subscription not found"))
}

pub async fn list_plans() -> impl IntoResponse {
    Json(DataResponse::new(SubscriptionPlan::catalogue()))
}

pub async fn create_subscription(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateSubscriptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require(&[Role::Owner])?;
    payload.validate()?;

    let repo = state.db.subscriptions();
    if let Some(open) = repo.find_open_for_owner(&user.user_id).await? {
        return Err(AppError::conflict(format!(
            "You already have a {} subscription",
            open.status.as_str()
        )));
    }

    let subscription = Subscription::new(
        &user.user_id,
        payload.plan,
        &payload.screenshot_url,
        payload.payment_reference.trim(),
    );
    repo.insert(&subscription).await?;

    tracing::info!(
        subscription_id = %subscription.id,
        owner_id = %user.user_id,
        plan = subscription.plan.details().name,
        "Subscription requested"
    );
    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(SubscriptionResponse::from(&subscription))),
    ))
}

/// The owner's subscriptions. Active ones past their end date are expired on read.
pub async fn my_subscriptions(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    user.require(&[Role::Owner])?;

    let repo = state.db.subscriptions();
    let now = DateTime::now();
    let mut subscriptions = repo.list_for_owner(&user.user_id).await?;
    for subscription in subscriptions.iter_mut() {
        if !subscription.has_lapsed(now) {
            continue;
        }
        match repo
            .transition(
                &subscription.id,
                &[SubscriptionStatus::Active],
                SubscriptionStatus::Expired,
                doc! {},
            )
            .await?
        {
            Some(expired) => *subscription = expired,
            None => subscription.status = SubscriptionStatus::Expired,
        }
        tracing::info!(subscription_id = %subscription.id, "Subscription expired");
    }

    Ok(Json(DataResponse::new(
        subscriptions
            .iter()
            .map(SubscriptionResponse::from)
            .collect::<Vec<_>>(),
    )))
}

pub async fn verify_subscription(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<ReviewDecisionRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require_admin()?;
    payload.validate()?;

    let subscription = load_subscription(&state, &id).await?;
    if subscription.status != SubscriptionStatus::Pending {
        return Err(AppError::bad_request(format!(
            "Only pending subscriptions can be verified, this one is {}",
            subscription.status.as_str()
        )));
    }

    let (to, set) = if payload.approve {
        let (start, end) = subscription.activation_window(Utc::now());
        (
            SubscriptionStatus::Active,
            doc! { "start_date": start, "end_date": end, "verified_by": &user.user_id },
        )
    } else {
        (
            SubscriptionStatus::Rejected,
            doc! { "rejection_reason": payload.reason(), "verified_by": &user.user_id },
        )
    };

    let updated = state
        .db
        .subscriptions()
        .transition(&id, &[SubscriptionStatus::Pending], to, set)
        .await?
        .ok_or_else(|| AppError::conflict("Subscription was reviewed by another request"))?;

    tracing::info!(
        subscription_id = %id,
        status = to.as_str(),
        verified_by = %user.user_id,
        "Subscription reviewed"
    );
    Ok(Json(DataResponse::new(SubscriptionResponse::from(&updated))))
}

pub async fn cancel_subscription(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let subscription = load_subscription(&state, &id).await?;
    if subscription.owner_id != user.user_id {
        return Err(AppError::forbidden("This subscription belongs to another owner"));
    }

    let updated = state
        .db
        .subscriptions()
        .transition(
            &id,
            &[SubscriptionStatus::Active, SubscriptionStatus::Pending],
            SubscriptionStatus::Cancelled,
            doc! {},
        )
        .await?
        .ok_or_else(|| {
            AppError::bad_request("Only active or pending subscriptions can be cancelled")
        })?;

    tracing::info!(subscription_id = %id, "Subscription cancelled");
    Ok(Json(DataResponse::new(SubscriptionResponse::from(&updated))))
}
