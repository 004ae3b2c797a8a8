//! Preference API endpoints.

use axum::extract::State;

use super::{success, ApiJson, ApiResult};
use crate::models::ThemeBody;
use crate::preferences::{get_theme, reset_theme, set_theme};
use crate::AppState;

/// GET /api/preferences/theme
pub async fn get_theme_preference(State(state): State<AppState>) -> ApiResult<ThemeBody> {
    let theme = get_theme(state.storage.as_ref()).await?;
    success(ThemeBody { theme })
}

/// PUT /api/preferences/theme
pub async fn put_theme_preference(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ThemeBody>,
) -> ApiResult<ThemeBody> {
    set_theme(state.storage.as_ref(), body.theme).await?;
    tracing::info!(theme = ?body.theme, "Theme preference updated");
    success(body)
}

/// DELETE /api/preferences/theme - Forget the stored theme.
pub async fn delete_theme_preference(State(state): State<AppState>) -> ApiResult<ThemeBody> {
    let theme = reset_theme(state.storage.as_ref()).await?;
    tracing::info!("Theme preference reset");
    success(ThemeBody { theme })
}
