//! Scenario files
//!
//! A scenario bundles a strategy configuration, optional projection settings
//! and optionally a custom practice catalog into one TOML document:
//!
//! ```toml
//! [strategy]
//! budget = 500000.0
//! target_pct = 20.0
//!
//! [strategy.scoring]
//! method = "weighted_sum"
//!
//! [projection]
//! horizon_years = 5
//!
//! [[practices]]
//! name = "Cover Crops"
//! emission_delta = 0.2
//! carbon_delta = 1.6
//! base_cost = 300.0
//! difficulty = 3
//! stability = 4
//! ```
//!
//! Without a `[[practices]]` table the reference catalog is used.

use crate::config::{ProjectionParameters, StrategyConfig};
use crate::errors::PlanResult;
use crate::planner::{plan, PlanReport};
use crate::practice::{Practice, PracticeCatalog};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub strategy: StrategyConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection: Option<ProjectionParameters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub practices: Option<Vec<Practice>>,
}

impl Scenario {
    pub fn from_toml_str(contents: &str) -> PlanResult<Self> {
        let scenario: Scenario = toml::from_str(contents)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> PlanResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> PlanResult<()> {
        self.strategy.validate()?;
        self.catalog()?;
        Ok(())
    }

    /// The scenario's own catalog, or the reference catalog.
    pub fn catalog(&self) -> PlanResult<PracticeCatalog> {
        match &self.practices {
            Some(practices) => PracticeCatalog::new(practices.clone()),
            None => Ok(PracticeCatalog::reference()),
        }
    }

    pub fn horizon_years(&self) -> Option<u32> {
        self.projection.map(|p| p.horizon_years)
    }

    /// Run the full planning pipeline for this scenario.
    pub fn run(&self) -> PlanResult<PlanReport> {
        plan(&self.catalog()?, &self.strategy, self.horizon_years())
    }
}
