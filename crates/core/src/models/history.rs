use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::automatic::AutomaticSimulation;
use super::manual::ManualSimulation;
use super::price::PriceCache;
use super::settings::Settings;

/// The main data container. Everything in here gets serialized and saved
/// to the portable snapshot file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationHistory {
    pub settings: Settings,
    pub automatic: Vec<AutomaticSimulation>,
    pub manual: Vec<ManualSimulation>,
    /// Price bars fetched so far, reused across simulations and offline.
    #[serde(default)]
    pub price_cache: PriceCache,
}

impl SimulationHistory {
    /// Listing of every simulation, newest first.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        let automatic = self.automatic.iter().map(|s| HistoryEntry {
            id: s.id,
            kind: SimulationKind::Automatic,
            name: s.name.clone(),
            created_on: s.created_on,
            start: s.start,
            end: s.end,
            initial_contribution: Some(s.initial_contribution),
            monthly_contribution: Some(s.monthly_contribution),
            total_value: s.results.last().map(|p| p.value),
        });
        let manual = self.manual.iter().map(|s| HistoryEntry {
            id: s.id,
            kind: SimulationKind::Manual,
            name: s.name.clone(),
            created_on: s.created_on,
            start: s.start,
            end: s.current_month,
            initial_contribution: None,
            monthly_contribution: None,
            total_value: Some(s.cash + s.assets_value()),
        });

        let mut entries: Vec<HistoryEntry> = automatic.chain(manual).collect();
        entries.sort_by(|a, b| b.created_on.cmp(&a.created_on).then_with(|| a.name.cmp(&b.name)));
        entries
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimulationKind {
    Automatic,
    Manual,
}

impl std::fmt::Display for SimulationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationKind::Automatic => write!(f, "Automatic"),
            SimulationKind::Manual => write!(f, "Manual"),
        }
    }
}

/// One row of the simulation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub kind: SimulationKind,
    pub name: String,
    pub created_on: NaiveDate,
    pub start: NaiveDate,
    /// Last month of an automatic simulation, current month of a manual one.
    pub end: NaiveDate,
    pub initial_contribution: Option<f64>,
    pub monthly_contribution: Option<f64>,
    /// Latest known total value (assets plus cash), if any.
    pub total_value: Option<f64>,
}
