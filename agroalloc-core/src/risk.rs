//! Risk adjustment
//!
//! Converts a practice's raw per-hectare deltas into a risk-discounted net
//! impact:
//!
//! $$I = (-\Delta E + \Delta C + L_{soc}) (1 - b) (1 - u) (1 - c)$$
//!
//! where $b$, $u$ and $c$ are the safety buffer, model uncertainty and churn
//! rates expressed as fractions. Practices whose net impact is not positive
//! cannot be ranked (the hectares needed to abate a tonne would be negative
//! or infinite) and are set aside with a warning.

use crate::config::{RiskParameters, StrategyConfig};
use crate::practice::{Practice, PracticeCatalog};
use serde::{Deserialize, Serialize};
use tracing::warn;

impl RiskParameters {
    /// Product of the independent `(1 - rate / 100)` discount factors.
    pub fn discount_factor(&self) -> f64 {
        let churn = if self.discount_churn {
            self.churn_rate_pct
        } else {
            0.0
        };
        [self.safety_buffer_pct, self.model_uncertainty_pct, churn]
            .iter()
            .map(|rate| 1.0 - rate / 100.0)
            .product()
    }

    /// Copy of these parameters with the churn discount switched off.
    pub fn without_churn_discount(&self) -> Self {
        Self {
            discount_churn: false,
            ..*self
        }
    }
}

/// Risk-discounted abatement per hectare per year (tCO2e/ha/yr).
pub fn compute_net_impact(practice: &Practice, risk: &RiskParameters) -> f64 {
    let gross = practice.gross_benefit_per_ha() + risk.baseline_soc_loss_offset;
    gross * risk.discount_factor()
}

/// A practice prepared for ranking under one configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactRow {
    pub name: String,
    /// Position in the source catalog, used to break ties.
    pub catalog_index: usize,
    pub net_impact_per_ha: f64,
    /// Cost per hectare charged to the budget.
    pub cost_per_ha: f64,
    pub difficulty: u8,
    pub stability: u8,
}

/// A practice left out of a run because its net impact is not positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedPractice {
    pub name: String,
    pub net_impact_per_ha: f64,
}

/// Per-run derived view of the catalog.
///
/// Built fresh for every configuration; the catalog itself is never touched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpactTable {
    pub rows: Vec<ImpactRow>,
    pub excluded: Vec<ExcludedPractice>,
}

impl ImpactTable {
    /// Net impact of a ranked practice, if it was not excluded.
    pub fn net_impact(&self, name: &str) -> Option<f64> {
        self.rows
            .iter()
            .find(|row| row.name == name)
            .map(|row| row.net_impact_per_ha)
    }
}

/// Derive the impact table for `config`, applying its risk discounts.
pub fn build_impact_table(catalog: &PracticeCatalog, config: &StrategyConfig) -> ImpactTable {
    build_impact_table_with(catalog, &config.risk, config.incentive_pct)
}

pub(crate) fn build_impact_table_with(
    catalog: &PracticeCatalog,
    risk: &RiskParameters,
    incentive_pct: f64,
) -> ImpactTable {
    let mut table = ImpactTable::default();

    for (catalog_index, practice) in catalog.iter().enumerate() {
        let net_impact_per_ha = compute_net_impact(practice, risk);

        if !(net_impact_per_ha.is_finite() && net_impact_per_ha > 0.0) {
            warn!(
                practice = %practice.name,
                net_impact_per_ha,
                "Practice has no positive net impact under the current risk discounts; excluding it"
            );
            table.excluded.push(ExcludedPractice {
                name: practice.name.clone(),
                net_impact_per_ha,
            });
            continue;
        }

        table.rows.push(ImpactRow {
            name: practice.name.clone(),
            catalog_index,
            net_impact_per_ha,
            cost_per_ha: practice.incentive_cost_per_ha(incentive_pct),
            difficulty: practice.difficulty,
            stability: practice.stability,
        });
    }

    table
}
