//! End-to-end planning
//!
//! Wires the stages together: risk adjustment produces the impact table,
//! scoring ranks it, the allocation engine fills land and budget, and the
//! temporal projector optionally turns the regime allocation into a yearly
//! trajectory.

use crate::allocation::{allocate, Allocation, AllocationRequest};
use crate::config::StrategyConfig;
use crate::errors::{PlanError, PlanResult};
use crate::practice::PracticeCatalog;
use crate::risk::{
    build_impact_table, build_impact_table_with, compute_net_impact, ExcludedPractice,
};
use crate::scoring::{score_practices, RankedPractice};
use crate::temporal::{project_trajectory, ProjectionSettings, TrajectoryPoint};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Emissions per tonne of product before and after the plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmissionIntensity {
    /// unit: tCO2e/t
    pub baseline: f64,
    /// unit: tCO2e/t
    pub planned: f64,
}

/// Everything a caller needs to present one planning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanReport {
    pub baseline_total_emissions: f64,
    pub target_tons: f64,
    pub excluded: Vec<ExcludedPractice>,
    pub ranking: Vec<RankedPractice>,
    pub allocation: Allocation,
    /// Enrolled hectares per practice, in ranked order.
    pub hectares: IndexMap<String, f64>,
    pub intensity: Option<EmissionIntensity>,
    pub trajectory: Option<Vec<TrajectoryPoint>>,
}

/// Run the full pipeline for `catalog` under `config`.
///
/// When `horizon_years` is given the regime allocation is also projected
/// year by year, using net impacts without the churn discount since the
/// projection models churn itself.
pub fn plan(
    catalog: &PracticeCatalog,
    config: &StrategyConfig,
    horizon_years: Option<u32>,
) -> PlanResult<PlanReport> {
    config.validate()?;

    let baseline_total_emissions = config.baseline_total_emissions();
    let target_tons = config.target_abatement_tons();

    let impacts = build_impact_table(catalog, config);
    let ranking = score_practices(&impacts.rows, &config.scoring)?;

    let request = AllocationRequest::new(config.budget, config.total_land_area, target_tons)
        .with_spontaneous(config.spontaneous);
    let cap = config
        .operational_cap
        .policy(config.scoring.difficulty_aversion);
    let allocation = allocate(&ranking, &request, cap.as_deref())?;

    info!(
        method = %config.scoring.method,
        ranked = ranking.len(),
        excluded = impacts.excluded.len(),
        hectares = allocation.total_hectares(),
        abatement_tons = allocation.cumulative_abatement,
        residual_budget = allocation.residual_budget,
        "Allocation complete"
    );

    let intensity = config.production_volume_t.map(|volume| EmissionIntensity {
        baseline: baseline_total_emissions / volume,
        planned: (baseline_total_emissions - allocation.cumulative_abatement) / volume,
    });

    let trajectory = match horizon_years {
        Some(horizon_years) => {
            let projection_impacts = build_impact_table_with(
                catalog,
                &config.risk.without_churn_discount(),
                config.incentive_pct,
            );
            let settings = ProjectionSettings {
                baseline_total_emissions,
                horizon_years,
                churn_rate_pct: config.risk.churn_rate_pct,
                carbon_decay_pct: config.risk.carbon_decay_pct,
            };
            Some(project_trajectory(
                &allocation,
                &projection_impacts.rows,
                &settings,
            )?)
        }
        None => None,
    };

    Ok(PlanReport {
        baseline_total_emissions,
        target_tons,
        excluded: impacts.excluded,
        ranking,
        hectares: allocation.hectares_by_name(),
        allocation,
        intensity,
        trajectory,
    })
}

/// What it would take to meet the target with one practice alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinglePracticePlan {
    pub name: String,
    pub net_impact_per_ha: f64,
    pub cost_per_ha: f64,
    pub target_tons: f64,
    /// `None` when the practice has no positive net impact.
    pub hectares_needed: Option<f64>,
    pub total_cost: Option<f64>,
    /// Share of the total land area the practice would need.
    /// unit: %
    pub land_share_pct: Option<f64>,
    /// Budget left over, negative when the plan is over budget.
    pub budget_headroom: Option<f64>,
    pub fits_land: bool,
    pub fits_budget: bool,
}

/// Size a plan that relies on a single named practice.
pub fn plan_single_practice(
    catalog: &PracticeCatalog,
    config: &StrategyConfig,
    name: &str,
) -> PlanResult<SinglePracticePlan> {
    config.validate()?;
    let practice = catalog
        .get(name)
        .ok_or_else(|| PlanError::UnknownPractice(name.to_string()))?;

    let net_impact_per_ha = compute_net_impact(practice, &config.risk);
    let cost_per_ha = practice.incentive_cost_per_ha(config.incentive_pct);
    let target_tons = config.target_abatement_tons();

    let has_benefit = net_impact_per_ha.is_finite() && net_impact_per_ha > 0.0;
    let hectares_needed = has_benefit.then(|| target_tons / net_impact_per_ha);
    let total_cost = hectares_needed.map(|ha| ha * cost_per_ha);
    let land_share_pct = hectares_needed
        .filter(|_| config.total_land_area > 0.0)
        .map(|ha| ha / config.total_land_area * 100.0);
    let budget_headroom = total_cost.map(|cost| config.budget - cost);

    Ok(SinglePracticePlan {
        name: practice.name.clone(),
        net_impact_per_ha,
        cost_per_ha,
        target_tons,
        fits_land: hectares_needed.is_some_and(|ha| ha <= config.total_land_area),
        fits_budget: budget_headroom.is_some_and(|headroom| headroom >= 0.0),
        hectares_needed,
        total_cost,
        land_share_pct,
        budget_headroom,
    })
}
