//! Theme preference persistence.

use crate::db::{KeyValueStore, THEME_KEY};
use crate::errors::AppError;
use crate::models::ThemePreference;

/// Read the stored theme, falling back to `auto` when nothing is stored.
pub async fn get_theme(store: &dyn KeyValueStore) -> Result<ThemePreference, AppError> {
    match store.read(THEME_KEY).await? {
        Some(raw) => Ok(serde_json::from_str(&raw)?),
        None => Ok(ThemePreference::default()),
    }
}

pub async fn set_theme(store: &dyn KeyValueStore, theme: ThemePreference) -> Result<(), AppError> {
    let raw = serde_json::to_string(&theme)
        .map_err(|e| AppError::Internal(format!("Failed to serialize theme: {}", e)))?;
    store.write(THEME_KEY, &raw).await
}

/// Drop the stored theme so reads fall back to the default again.
pub async fn reset_theme(store: &dyn KeyValueStore) -> Result<ThemePreference, AppError> {
    store.remove(THEME_KEY).await?;
    Ok(ThemePreference::default())
}
