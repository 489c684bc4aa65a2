//! Temporal projector
//!
//! Multi-year extension of a regime-state allocation. Enrolment ramps up
//! linearly to the regime hectares over the horizon, a constant share of
//! enrolled hectares churns out every year, and the carbon held on churned
//! hectares decays geometrically instead of vanishing at once.
//!
//! # Algorithm
//!
//! With $P$ the regime abatement potential, $N$ the horizon, $c$ the churn
//! rate and $r = 1 - \text{decay}$ the retention of abandoned stock, for
//! year $i = 1 \dots N$:
//!
//! $$a_i = i / N$$
//! $$\text{new}_i = P \, a_i \, (1 - c)$$
//! $$\text{carry}_i = r \, \text{carry}_{i-1} + P \, a_{i-1} \, c$$
//! $$\text{net}_i = B - (\text{new}_i + \text{carry}_i)$$
//!
//! starting from $\text{carry}_0 = 0$ and $\text{net}_0 = B$, the baseline.
//! Churn is a constant annual hazard on the ramped hectares, not a cohort
//! survival model.

use crate::allocation::Allocation;
use crate::errors::{ensure_non_negative, ensure_rate_pct, PlanError, PlanResult};
use crate::risk::ImpactRow;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One simulated year. Year 0 is the undisturbed baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub year: u32,
    /// Abatement from hectares compliant this year.
    pub new_abatement: f64,
    /// Decaying benefit still held on hectares that churned out.
    pub carryover: f64,
    pub net_emissions: f64,
    pub cumulative_abatement: f64,
}

/// Constants of a projection run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSettings {
    pub baseline_total_emissions: f64,
    pub horizon_years: u32,
    pub churn_rate_pct: f64,
    pub carbon_decay_pct: f64,
}

impl ProjectionSettings {
    pub fn validate(&self) -> PlanResult<()> {
        ensure_non_negative("baseline_total_emissions", self.baseline_total_emissions)?;
        ensure_rate_pct("churn_rate_pct", self.churn_rate_pct)?;
        ensure_rate_pct("carbon_decay_pct", self.carbon_decay_pct)?;
        if self.horizon_years == 0 {
            return Err(PlanError::invalid(
                "horizon_years",
                0.0,
                "must be at least one year",
            ));
        }
        Ok(())
    }

    /// Share of abandoned carbon stock kept from one year to the next.
    pub fn retention_rate(&self) -> f64 {
        1.0 - self.carbon_decay_pct / 100.0
    }

    fn adoption_fraction(&self, year: u32) -> f64 {
        year as f64 / self.horizon_years as f64
    }
}

/// Annual abatement of the fully ramped allocation.
///
/// Practices without a matching impact row contribute nothing.
pub fn regime_abatement_potential(allocation: &Allocation, net_impacts: &[ImpactRow]) -> f64 {
    allocation
        .practices
        .iter()
        .filter(|p| p.hectares > 0.0)
        .map(|p| {
            match net_impacts.iter().find(|row| row.name == p.name) {
                Some(row) => p.hectares * row.net_impact_per_ha,
                None => {
                    warn!(practice = %p.name, "No net impact for allocated practice; ignoring it");
                    0.0
                }
            }
        })
        .sum()
}

/// Project the emissions trajectory of `allocation` over the horizon.
///
/// `net_impacts` should not already carry a churn discount, since churn is
/// modelled year by year here.
pub fn project_trajectory(
    allocation: &Allocation,
    net_impacts: &[ImpactRow],
    settings: &ProjectionSettings,
) -> PlanResult<Vec<TrajectoryPoint>> {
    project_potential(regime_abatement_potential(allocation, net_impacts), settings)
}

/// Project a trajectory directly from a regime abatement potential (tCO2e/yr).
pub fn project_potential(
    regime_potential: f64,
    settings: &ProjectionSettings,
) -> PlanResult<Vec<TrajectoryPoint>> {
    settings.validate()?;
    ensure_non_negative("regime_abatement_potential", regime_potential)?;

    let churn = settings.churn_rate_pct / 100.0;
    let active_fraction = 1.0 - churn;
    let retention = settings.retention_rate();
    let baseline = settings.baseline_total_emissions;

    let mut points = Vec::with_capacity(settings.horizon_years as usize + 1);
    points.push(TrajectoryPoint {
        year: 0,
        new_abatement: 0.0,
        carryover: 0.0,
        net_emissions: baseline,
        cumulative_abatement: 0.0,
    });

    let mut carryover = 0.0;
    let mut cumulative = 0.0;
    for year in 1..=settings.horizon_years {
        let new_abatement = regime_potential * settings.adoption_fraction(year) * active_fraction;
        // Stock abandoned last year joins what is left of older abandoned stock
        let newly_churned = regime_potential * settings.adoption_fraction(year - 1) * churn;
        carryover = carryover * retention + newly_churned;

        let abated = new_abatement + carryover;
        cumulative += abated;

        points.push(TrajectoryPoint {
            year,
            new_abatement,
            carryover,
            net_emissions: baseline - abated,
            cumulative_abatement: cumulative,
        });
    }

    Ok(points)
}
