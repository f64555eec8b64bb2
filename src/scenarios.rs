//! Quick scenarios: named form presets grouped by category.
//!
//! The catalog is bundled as JSON and parsed into observation snapshots.

use serde::{Deserialize, Serialize};

use crate::models::ObservationSnapshot;

const BUNDLED_CATALOG: &str = include_str!("../resources/scenarios.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub label: String,
    /// Form fields the preset fills in. Shift and gender are never part of it.
    pub state: ObservationSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioCategory {
    pub title: String,
    pub scenarios: Vec<Scenario>,
}

/// Parse the bundled scenario catalog.
pub fn load_catalog() -> Result<Vec<ScenarioCategory>, serde_json::Error> {
    serde_json::from_str(BUNDLED_CATALOG)
}

/// Find a scenario by its label across all categories.
pub fn find_scenario<'a>(catalog: &'a [ScenarioCategory], label: &str) -> Option<&'a Scenario> {
    catalog
        .iter()
        .flat_map(|category| category.scenarios.iter())
        .find(|scenario| scenario.label == label)
}

impl Scenario {
    /// Form state after applying this preset: the current shift and gender
    /// are kept, every other field comes from the preset.
    pub fn apply(&self, current: &ObservationSnapshot) -> ObservationSnapshot {
        ObservationSnapshot {
            shift: current.shift,
            gender: current.gender,
            ..self.state.clone()
        }
    }
}
