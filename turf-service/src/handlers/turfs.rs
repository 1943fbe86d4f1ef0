use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use mongodb::bson::{self, doc};
use service_core::error::AppError;
use validator::Validate;

use super::{load_turf, parse_date};
use crate::dtos::{
    AvailabilityQuery, AvailabilityResponse, CreateTurfRequest, DataResponse, MessageResponse,
    PagedResponse, SlotAvailabilityDto, TurfListQuery, TurfResponse, UpdateTurfRequest,
    UpdateTurfStatusRequest,
};
use crate::middleware::AuthUser;
use crate::models::{NewTurf, PaymentPlan, Turf, TurfStatus, WeeklyHours};
use crate::services::repository::{Page, TurfFilter};
use crate::services::{slots, Role};
use crate::AppState;

/// Tier turfs are only allowed within the owner's current subscription.
async fn ensure_tier_capacity(state: &AppState, owner_id: &str) -> Result<(), AppError> {
    let subscription = state
        .db
        .subscriptions()
        .find_current_for_owner(owner_id)
        .await?
        .ok_or_else(|| AppError::forbidden("An active subscription is required for tier turfs"))?;

    let existing = state.db.turfs().count_tier_turfs(owner_id).await?;
    if existing >= u64::from(subscription.max_turfs) {
        return Err(AppError::forbidden(format!(
            "Your {} plan allows {} tier turf(s)",
            subscription.plan.details().name,
            subscription.max_turfs
        )));
    }
    Ok(())
}

pub async fn create_turf(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateTurfRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require(&[Role::Owner])?;
    payload.validate()?;

    if payload.payment_plan == PaymentPlan::Tier {
        ensure_tier_capacity(&state, &user.user_id).await?;
    }

    let turf = Turf::new(NewTurf {
        owner_id: user.user_id.clone(),
        name: payload.name.trim().to_string(),
        description: payload.description,
        address: payload.address.into(),
        location: payload.location,
        sports: payload.sports,
        weekday_rate: payload.weekday_rate,
        weekend_rate: payload.weekend_rate,
        operating_hours: payload.operating_hours.into(),
        slot_duration_minutes: payload.slot_duration,
        payment_plan: payload.payment_plan,
        owner_qr_url: payload.owner_qr_url,
    });
    state.db.turfs().insert(&turf).await?;

    tracing::info!(
        turf_id = %turf.id,
        owner_id = %turf.owner_id,
        plan = turf.payment_plan.as_str(),
        "Turf submitted for approval"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(TurfResponse::from(&turf))),
    ))
}

pub async fn list_turfs(
    State(state): State<AppState>,
    Query(query): Query<TurfListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = Page::new(query.page, query.page_size);
    let filter = TurfFilter {
        sport: query.sport.filter(|s| !s.trim().is_empty()),
        city: query.city.filter(|c| !c.trim().is_empty()),
    };

    let (turfs, total) = state.db.turfs().list_public(&filter, page).await?;

    Ok(Json(PagedResponse {
        success: true,
        data: turfs.iter().map(TurfResponse::from).collect(),
        total,
        page: page.page,
        page_size: page.page_size,
    }))
}

pub async fn get_turf(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let turf = load_turf(&state, &id).await?;

    let viewer_id = viewer.as_ref().map(|v| v.user_id.as_str());
    let is_admin = viewer.as_ref().map(AuthUser::is_admin).unwrap_or(false);
    if !turf.visible_to(viewer_id, is_admin) {
        return Err(AppError::not_found("Turf not found"));
    }

    Ok(Json(DataResponse::new(TurfResponse::from(&turf))))
}

pub async fn update_turf(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateTurfRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let turf = load_turf(&state, &id).await?;
    if turf.owner_id != user.user_id {
        return Err(AppError::forbidden("Only the turf owner can update it"));
    }

    let mut set = doc! {};
    if let Some(name) = payload.name {
        set.insert("name", name.trim());
    }
    if let Some(description) = payload.description {
        set.insert("description", description);
    }
    if let Some(rate) = payload.weekday_rate {
        set.insert("weekday_rate", rate);
    }
    if let Some(rate) = payload.weekend_rate {
        set.insert("weekend_rate", rate);
    }
    if let Some(hours) = payload.operating_hours {
        set.insert("operating_hours", bson::to_bson(&WeeklyHours::from(hours))?);
    }
    if let Some(sports) = payload.sports {
        set.insert("sports", sports);
    }
    if let Some(is_active) = payload.is_active {
        set.insert("is_active", is_active);
    }
    if let Some(qr) = payload.owner_qr_url {
        set.insert("owner_qr_url", qr);
    }

    if set.is_empty() {
        return Ok(Json(DataResponse::new(TurfResponse::from(&turf))));
    }

    let updated = state
        .db
        .turfs()
        .update(&id, set)
        .await?
        .ok_or_else(|| AppError::not_found("Turf not found"))?;

    tracing::info!(turf_id = %id, "Turf updated");
    Ok(Json(DataResponse::new(TurfResponse::from(&updated))))
}

pub async fn delete_turf(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let turf = load_turf(&state, &id).await?;
    user.require_owner_or_admin(&turf.owner_id)?;

    let today = state.clock.today(Utc::now());
    if state.db.bookings().has_upcoming_holding(&id, today).await? {
        return Err(AppError::conflict(
            "Turf has upcoming bookings and cannot be deleted",
        ));
    }

    if !state.db.turfs().delete(&id).await? {
        return Err(AppError::not_found("Turf not found"));
    }

    tracing::info!(turf_id = %id, deleted_by = %user.user_id, "Turf deleted");
    Ok(Json(MessageResponse::new("Turf deleted")))
}

pub async fn available_slots(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<impl IntoResponse, AppError> {
    let turf = load_turf(&state, &id).await?;
    if !turf.is_bookable() {
        return Err(AppError::not_found("Turf not found"));
    }
    let date = parse_date(&query.date)?;

    let generated = slots::slots_for_date(&turf, date);
    let taken = state.db.bookings().held_starts(&id, date).await?;
    let marked = slots::availability(&generated, &taken, date, &state.clock, Utc::now());

    Ok(Json(AvailabilityResponse {
        success: true,
        turf_id: turf.id,
        date: date.format("%Y-%m-%d").to_string(),
        slot_duration: turf.slot_duration_minutes,
        slots: marked.into_iter().map(SlotAvailabilityDto::from).collect(),
    }))
}

pub async fn update_turf_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateTurfStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require_admin()?;

    let status: TurfStatus = payload.status.into();
    let note = payload.note.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let turf = state
        .db
        .turfs()
        .set_status(&id, status, note)
        .await?
        .ok_or_else(|| AppError::not_found("Turf not found"))?;

    tracing::info!(
        turf_id = %id,
        status = status.as_str(),
        reviewed_by = %user.user_id,
        "Turf status changed"
    );
    Ok(Json(DataResponse::new(TurfResponse::from(&turf))))
}

pub async fn owner_turfs(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    user.require(&[Role::Owner])?;
    let turfs = state.db.turfs().list_by_owner(&user.user_id).await?;
    Ok(Json(DataResponse::new(
        turfs.iter().map(TurfResponse::from).collect::<Vec<_>>(),
    )))
}
