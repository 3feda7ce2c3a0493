/**
 * Visitor Preferences
 * Remembers per-visitor UI state such as the dismissed welcome popup
 */
use axum::{extract::State, response::Response, Json};
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;
use crate::visitor::Visitor;

pub const WELCOME_POPUP_KEY: &str = "welcome-popup";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomePopupState {
    pub key: &'static str,
    pub seen: bool,
}

/// GET /api/preferences/welcome-popup
pub async fn welcome_popup(
    State(state): State<AppState>,
    visitor: Visitor,
) -> Result<Response, AppError> {
    // A visitor minted on this request cannot have a stored preference.
    let seen = if visitor.is_new {
        false
    } else {
        state
            .store
            .get_preference(visitor.id, WELCOME_POPUP_KEY)
            .await?
            .unwrap_or(false)
    };

    Ok(visitor.respond(
        &state,
        Json(WelcomePopupState {
            key: WELCOME_POPUP_KEY,
            seen,
        }),
    ))
}

/// POST /api/preferences/welcome-popup/seen
pub async fn mark_welcome_popup_seen(
    State(state): State<AppState>,
    visitor: Visitor,
) -> Result<Response, AppError> {
    state
        .store
        .set_preference(visitor.id, WELCOME_POPUP_KEY, true)
        .await?;
    tracing::debug!(visitor = %visitor.id, "welcome popup dismissed");

    Ok(visitor.respond(
        &state,
        Json(WelcomePopupState {
            key: WELCOME_POPUP_KEY,
            seen: true,
        }),
    ))
}
