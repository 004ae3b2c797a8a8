//! User interface preferences persisted alongside exchanges.

use serde::{Deserialize, Serialize};

/// Colour theme preference.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    Light,
    Dark,
    #[default]
    Auto,
}

/// Request/response body for the theme endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeBody {
    pub theme: ThemePreference,
}
