use axum::{extract::State, response::IntoResponse, Json};
use mongodb::bson::DateTime;
use service_core::error::AppError;
use validator::Validate;

use crate::dtos::{DataResponse, PlatformPaymentDto, SettingsResponse, UpdateSettingsRequest};
use crate::middleware::AuthUser;
use crate::models::PlatformSettings;
use crate::AppState;

/// Where customers send platform QR payments.
pub async fn payment_details(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let settings = state.db.settings().get().await?;
    Ok(Json(DataResponse::new(PlatformPaymentDto::from_settings(
        &settings, None,
    ))))
}

pub async fn get_settings(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    user.require_admin()?;
    let settings = state.db.settings().get().await?;
    Ok(Json(DataResponse::new(SettingsResponse::from(&settings))))
}

fn merge(mut settings: PlatformSettings, update: UpdateSettingsRequest) -> PlatformSettings {
    if let Some(bps) = update.commission_bps {
        settings.commission_bps = bps;
    }
    if let Some(bps) = update.cancellation_fee_bps {
        settings.cancellation_fee_bps = bps;
    }
    if let Some(upi_id) = update.upi_id {
        settings.upi_id = Some(upi_id.trim().to_string()).filter(|u| !u.is_empty());
    }
    if let Some(url) = update.qr_image_url {
        settings.qr_image_url = Some(url);
    }
    if let Some(bank) = update.bank_details {
        settings.bank_details = Some(bank.into());
    }
    settings
}

pub async fn update_settings(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require_admin()?;
    payload.validate()?;

    let repo = state.db.settings();
    let mut settings = merge(repo.get().await?, payload);
    settings.updated_by = Some(user.user_id.clone());
    settings.updated_at = Some(DateTime::now());
    repo.save(&settings).await?;

    tracing::info!(
        commission_bps = settings.commission_bps,
        cancellation_fee_bps = settings.cancellation_fee_bps,
        updated_by = %user.user_id,
        "Platform settings updated"
    );
    Ok(Json(DataResponse::new(SettingsResponse::from(&settings))))
}
