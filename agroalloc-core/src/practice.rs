//! Practice catalog
//!
//! Static reference data describing each mitigation practice a farmer can be
//! enrolled in. Rows are immutable: every run derives its own impact table
//! from the catalog instead of adding columns to it.

use crate::errors::{ensure_non_negative, ensure_positive, PlanError, PlanResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Lowest value of the difficulty and stability ordinals.
pub const MIN_ORDINAL: u8 = 1;
/// Highest value of the difficulty and stability ordinals.
pub const MAX_ORDINAL: u8 = 5;

/// A single agricultural mitigation practice.
///
/// Deltas are expressed per hectare per year relative to the conventional
/// baseline management of the same field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Practice {
    /// Unique identifier within a catalog.
    pub name: String,

    /// Change in input-related emissions versus baseline.
    /// Negative values are reductions.
    /// unit: tCO2e/ha/yr
    pub emission_delta: f64,

    /// Soil carbon sequestered versus baseline.
    /// unit: tCO2e/ha/yr
    pub carbon_delta: f64,

    /// Full, unsubsidised cost of the practice.
    /// unit: currency/ha/yr
    pub base_cost: f64,

    /// Adoption friction, 1 (trivial) to 5 (hard).
    pub difficulty: u8,

    /// Yield stability / resilience, 1 (poor) to 5 (excellent).
    pub stability: u8,
}

impl Practice {
    pub fn new(
        name: impl Into<String>,
        emission_delta: f64,
        carbon_delta: f64,
        base_cost: f64,
        difficulty: u8,
        stability: u8,
    ) -> Self {
        Self {
            name: name.into(),
            emission_delta,
            carbon_delta,
            base_cost,
            difficulty,
            stability,
        }
    }

    /// Undiscounted benefit per hectare: avoided input emissions plus soil carbon gain.
    ///
    /// A practice that increases input emissions has that increase subtracted.
    pub fn gross_benefit_per_ha(&self) -> f64 {
        -self.emission_delta + self.carbon_delta
    }

    /// Per-hectare cost paid from the programme budget when the incentive
    /// covers `incentive_pct` percent of the base cost.
    pub fn incentive_cost_per_ha(&self, incentive_pct: f64) -> f64 {
        self.base_cost * incentive_pct / 100.0
    }

    /// Check that the row is internally consistent.
    pub fn validate(&self) -> PlanResult<()> {
        let field = |f: &str| format!("practices.{}.{}", self.name, f);

        if !self.emission_delta.is_finite() {
            return Err(PlanError::invalid(
                field("emission_delta"),
                self.emission_delta,
                "must be finite",
            ));
        }
        ensure_non_negative(&field("carbon_delta"), self.carbon_delta)?;
        ensure_positive(&field("base_cost"), self.base_cost)?;

        for (name, value) in [("difficulty", self.difficulty), ("stability", self.stability)] {
            if !(MIN_ORDINAL..=MAX_ORDINAL).contains(&value) {
                return Err(PlanError::OrdinalOutOfRange {
                    practice: self.name.clone(),
                    field: name,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// An ordered, validated set of practices.
///
/// Insertion order is significant: it breaks ties between equally scored
/// practices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Practice>", into = "Vec<Practice>")]
pub struct PracticeCatalog {
    practices: Vec<Practice>,
}

impl PracticeCatalog {
    /// Build a catalog, rejecting empty inputs, duplicate names and invalid rows.
    pub fn new(practices: Vec<Practice>) -> PlanResult<Self> {
        if practices.is_empty() {
            return Err(PlanError::EmptyCatalog);
        }

        let mut seen = HashSet::new();
        for practice in &practices {
            practice.validate()?;
            if !seen.insert(practice.name.as_str()) {
                return Err(PlanError::DuplicatePractice(practice.name.clone()));
            }
        }

        Ok(Self { practices })
    }

    /// Reference catalog for an irrigated processing-tomato supply chain.
    ///
    /// Cover crops, residue incorporation and minimum tillage, alone and in
    /// combination.
    pub fn reference() -> Self {
        let practices = vec![
            Practice::new("Cover Crops", 0.2, 1.6, 300.0, 3, 4),
            Practice::new("Residue Incorporation", 0.5, 2.7, 400.0, 1, 3),
            Practice::new("Minimum Tillage", -0.5, 0.86, 400.0, 1, 3),
            Practice::new("Cover Crops + Residue Incorporation", 0.5, 3.8, 700.0, 4, 4),
            Practice::new("Cover Crops + Minimum Tillage", -0.2, 1.96, 500.0, 5, 4),
            Practice::new("Residue Incorporation + Minimum Tillage", -0.2, 3.4, 400.0, 5, 3),
            Practice::new("All Three Combined", 0.2, 4.17, 800.0, 5, 5),
        ];
        Self { practices }
    }

    pub fn practices(&self) -> &[Practice] {
        &self.practices
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Practice> {
        self.practices.iter()
    }

    pub fn len(&self) -> usize {
        self.practices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.practices.is_empty()
    }

    /// Look up a practice by name.
    pub fn get(&self, name: &str) -> Option<&Practice> {
        self.practices.iter().find(|p| p.name == name)
    }
}

impl TryFrom<Vec<Practice>> for PracticeCatalog {
    type Error = PlanError;

    fn try_from(practices: Vec<Practice>) -> PlanResult<Self> {
        Self::new(practices)
    }
}

impl From<PracticeCatalog> for Vec<Practice> {
    fn from(catalog: PracticeCatalog) -> Self {
        catalog.practices
    }
}

impl<'a> IntoIterator for &'a PracticeCatalog {
    type Item = &'a Practice;
    type IntoIter = std::slice::Iter<'a, Practice>;

    fn into_iter(self) -> Self::IntoIter {
        self.practices.iter()
    }
}
