//! Editor settings persisted between runs.

use crate::constants::{DEFAULT_CADENCE_MS, MAX_CADENCE_MS, MIN_CADENCE_MS};
use crate::planner::Strategy;
use serde::{Deserialize, Serialize};

/// User preferences stored through the eframe storage backend.
///
/// Unknown or missing fields fall back to their defaults, so settings written
/// by older builds keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Delay between two playback steps
    pub cadence_ms: u64,
    /// Strategy preselected in the planning panel
    pub strategy: Strategy,
    /// Whether non-default edge costs are labelled on the canvas
    pub show_costs: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            cadence_ms: DEFAULT_CADENCE_MS,
            strategy: Strategy::default(),
            show_costs: true,
        }
    }
}

impl EditorSettings {
    /// Key under which the settings are stored.
    pub const STORAGE_KEY: &'static str = "editor_settings";

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses stored settings, clamping the cadence into the allowed range.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.cadence_ms = settings.cadence_ms.clamp(MIN_CADENCE_MS, MAX_CADENCE_MS);
        Ok(settings)
    }

    /// Loads settings from `storage`, falling back to defaults.
    pub fn load(storage: Option<&dyn eframe::Storage>) -> Self {
        let Some(json) = storage.and_then(|storage| storage.get_string(Self::STORAGE_KEY)) else {
            return Self::default();
        };
        Self::from_json(&json).unwrap_or_else(|err| {
            log::warn!("Ignoring unreadable editor settings: {}", err);
            Self::default()
        })
    }
}
