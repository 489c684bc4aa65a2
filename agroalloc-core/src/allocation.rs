//! Allocation engine
//!
//! Converts a ranked list of practices into hectares under simultaneous
//! budget, land and target constraints.
//!
//! # Algorithm
//!
//! 1. **Spontaneous floor**: when a spontaneous adoption share is given, the
//!    practices with `difficulty <= difficulty_threshold` split that share of
//!    the land evenly. Their cost is charged to the budget before anything
//!    else.
//! 2. **Greedy fill**: practices are visited in ranked order. Each receives
//!    the smallest of
//!    - the hectares still needed to close the target gap,
//!    - the hectares the residual budget can pay for,
//!    - the land not yet enrolled,
//!    - an optional per-practice operational cap.
//! 3. **Termination**: the loop stops when the target is met, the budget or
//!    the land is exhausted, or every practice has been visited.
//!
//! This is a greedy heuristic. It yields a feasible, deterministic and
//! explainable allocation but makes no claim of global optimality; a linear
//! programme over the same constraints can do better.

use crate::config::{OperationalCap, SpontaneousAdoption};
use crate::errors::{ensure_non_negative, PlanResult};
use crate::scoring::RankedPractice;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Slack used when comparing accumulated floating-point totals to limits.
const TOLERANCE: f64 = 1e-9;

/// Upper bound on the total hectares a single practice may receive.
pub trait CapPolicy {
    fn max_hectares(&self, practice: &RankedPractice, total_land_area: f64) -> f64;
}

impl<F> CapPolicy for F
where
    F: Fn(&RankedPractice, f64) -> f64,
{
    fn max_hectares(&self, practice: &RankedPractice, total_land_area: f64) -> f64 {
        self(practice, total_land_area)
    }
}

/// A fixed share of the total land area per practice.
#[derive(Debug, Clone, Copy)]
pub struct FlatShare {
    pub fraction: f64,
}

impl CapPolicy for FlatShare {
    fn max_hectares(&self, _practice: &RankedPractice, total_land_area: f64) -> f64 {
        total_land_area * self.fraction
    }
}

/// Farmer reach shrinking with difficulty: `land / difficulty^(alpha / k)`.
#[derive(Debug, Clone, Copy)]
pub struct DifficultyPowerLaw {
    pub alpha: f64,
    pub k: f64,
}

impl CapPolicy for DifficultyPowerLaw {
    fn max_hectares(&self, practice: &RankedPractice, total_land_area: f64) -> f64 {
        total_land_area / (practice.difficulty as f64).powf(self.alpha / self.k)
    }
}

impl OperationalCap {
    /// Policy object for this configuration, `None` when uncapped.
    ///
    /// `difficulty_aversion` supplies alpha for the power-law policy.
    pub fn policy(&self, difficulty_aversion: f64) -> Option<Box<dyn CapPolicy>> {
        match *self {
            OperationalCap::None => None,
            OperationalCap::FlatShare { fraction } => Some(Box::new(FlatShare { fraction })),
            OperationalCap::DifficultyPowerLaw { k } => Some(Box::new(DifficultyPowerLaw {
                alpha: difficulty_aversion,
                k,
            })),
        }
    }
}

/// Constraints of one allocation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllocationRequest {
    pub budget: f64,
    pub total_land_area: f64,
    pub target_tons: f64,
    pub spontaneous: SpontaneousAdoption,
}

impl AllocationRequest {
    pub fn new(budget: f64, total_land_area: f64, target_tons: f64) -> Self {
        Self {
            budget,
            total_land_area,
            target_tons,
            spontaneous: SpontaneousAdoption::default(),
        }
    }

    pub fn with_spontaneous(mut self, spontaneous: SpontaneousAdoption) -> Self {
        self.spontaneous = spontaneous;
        self
    }

    pub fn validate(&self) -> PlanResult<()> {
        ensure_non_negative("budget", self.budget)?;
        ensure_non_negative("total_land_area", self.total_land_area)?;
        ensure_non_negative("target_tons", self.target_tons)?;
        self.spontaneous.validate()
    }
}

/// Hectares and their consequences for one practice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeAllocation {
    pub name: String,
    /// Total enrolled hectares, spontaneous share included.
    pub hectares: f64,
    /// Portion of `hectares` assigned by the spontaneous floor.
    pub spontaneous_hectares: f64,
    pub cost: f64,
    pub abatement_tons: f64,
}

impl PracticeAllocation {
    fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            hectares: 0.0,
            spontaneous_hectares: 0.0,
            cost: 0.0,
            abatement_tons: 0.0,
        }
    }
}

/// Why the greedy loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    TargetReached,
    BudgetExhausted,
    LandExhausted,
    PracticesExhausted,
}

/// Result of an allocation run.
///
/// Falling short of the target is a normal outcome reported through
/// `gap_tons`, never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    /// One entry per ranked practice, in ranked order.
    pub practices: Vec<PracticeAllocation>,
    pub residual_budget: f64,
    pub cumulative_abatement: f64,
    pub target_tons: f64,
    pub gap_tons: f64,
    pub termination: Termination,
}

impl Allocation {
    /// Enrolled hectares keyed by practice name, in ranked order.
    pub fn hectares_by_name(&self) -> IndexMap<String, f64> {
        self.practices
            .iter()
            .map(|p| (p.name.clone(), p.hectares))
            .collect()
    }

    pub fn hectares(&self, name: &str) -> Option<f64> {
        self.practices
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.hectares)
    }

    pub fn total_hectares(&self) -> f64 {
        self.practices.iter().map(|p| p.hectares).sum()
    }

    pub fn total_cost(&self) -> f64 {
        self.practices.iter().map(|p| p.cost).sum()
    }

    pub fn target_met(&self) -> bool {
        self.gap_tons <= 0.0
    }
}

/// Running totals of the allocation.
struct Ledger {
    entries: Vec<PracticeAllocation>,
    residual_budget: f64,
    cumulative_abatement: f64,
    land_used: f64,
}

impl Ledger {
    fn assign(&mut self, index: usize, practice: &RankedPractice, hectares: f64, spontaneous: bool) {
        let cost = (hectares * practice.cost_per_ha).min(self.residual_budget);
        let abatement = hectares * practice.net_impact_per_ha;

        let entry = &mut self.entries[index];
        entry.hectares += hectares;
        if spontaneous {
            entry.spontaneous_hectares += hectares;
        }
        entry.cost += cost;
        entry.abatement_tons += abatement;

        self.residual_budget = (self.residual_budget - cost).max(0.0);
        self.cumulative_abatement += abatement;
        self.land_used += hectares;
    }

    fn stop_reason(&self, request: &AllocationRequest) -> Option<Termination> {
        let target_slack = TOLERANCE * request.target_tons.max(1.0);
        if self.cumulative_abatement >= request.target_tons - target_slack {
            Some(Termination::TargetReached)
        } else if self.residual_budget <= TOLERANCE {
            Some(Termination::BudgetExhausted)
        } else if request.total_land_area - self.land_used <= TOLERANCE {
            Some(Termination::LandExhausted)
        } else {
            None
        }
    }
}

/// Allocate hectares to `ranked` practices, best first.
///
/// `ranked` must already be sorted by descending score (see
/// [`crate::scoring::score_practices`]). `cap` optionally limits the total
/// hectares of each practice; without it only land, budget and target apply.
pub fn allocate(
    ranked: &[RankedPractice],
    request: &AllocationRequest,
    cap: Option<&dyn CapPolicy>,
) -> PlanResult<Allocation> {
    request.validate()?;

    let mut ledger = Ledger {
        entries: ranked
            .iter()
            .map(|p| PracticeAllocation::empty(&p.name))
            .collect(),
        residual_budget: request.budget,
        cumulative_abatement: 0.0,
        land_used: 0.0,
    };

    apply_spontaneous_floor(ranked, request, &mut ledger);

    let mut termination = Termination::PracticesExhausted;
    for (index, practice) in ranked.iter().enumerate() {
        if let Some(reason) = ledger.stop_reason(request) {
            termination = reason;
            break;
        }

        let gap_hectares = ((request.target_tons - ledger.cumulative_abatement)
            / practice.net_impact_per_ha)
            .max(0.0);
        let budget_hectares = ledger.residual_budget / practice.cost_per_ha;
        let land_hectares = request.total_land_area - ledger.land_used;
        let cap_hectares = cap.map_or(f64::INFINITY, |c| {
            c.max_hectares(practice, request.total_land_area) - ledger.entries[index].hectares
        });

        let hectares = gap_hectares
            .min(budget_hectares)
            .min(land_hectares)
            .min(cap_hectares)
            .max(0.0);

        debug!(
            practice = %practice.name,
            gap_hectares,
            budget_hectares,
            land_hectares,
            cap_hectares,
            hectares,
            "Greedy step"
        );

        if hectares > 0.0 {
            ledger.assign(index, practice, hectares, false);
        }
    }
    if termination == Termination::PracticesExhausted {
        if let Some(reason) = ledger.stop_reason(request) {
            termination = reason;
        }
    }

    let gap_tons = (request.target_tons - ledger.cumulative_abatement).max(0.0);
    if termination != Termination::TargetReached {
        warn!(
            target_tons = request.target_tons,
            achieved_tons = ledger.cumulative_abatement,
            gap_tons,
            ?termination,
            "Abatement target not reached"
        );
    }

    Ok(Allocation {
        practices: ledger.entries,
        residual_budget: ledger.residual_budget,
        cumulative_abatement: ledger.cumulative_abatement,
        target_tons: request.target_tons,
        gap_tons: if termination == Termination::TargetReached {
            0.0
        } else {
            gap_tons
        },
        termination,
    })
}

/// Pre-assign the spontaneous share of land to low-difficulty practices.
///
/// If the budget cannot cover the floor, every eligible share is scaled down
/// by the same factor so the budget is never overdrawn.
fn apply_spontaneous_floor(
    ranked: &[RankedPractice],
    request: &AllocationRequest,
    ledger: &mut Ledger,
) {
    let spontaneous = &request.spontaneous;
    if spontaneous.adoption_pct <= 0.0 {
        return;
    }

    let eligible: Vec<usize> = ranked
        .iter()
        .enumerate()
        .filter(|(_, p)| p.difficulty <= spontaneous.difficulty_threshold)
        .map(|(i, _)| i)
        .collect();
    if eligible.is_empty() {
        return;
    }

    let share =
        request.total_land_area * spontaneous.adoption_pct / 100.0 / eligible.len() as f64;
    let floor_cost: f64 = eligible
        .iter()
        .map(|&i| share * ranked[i].cost_per_ha)
        .sum();

    let scale = if floor_cost > ledger.residual_budget {
        warn!(
            floor_cost,
            budget = ledger.residual_budget,
            "Budget cannot cover spontaneous adoption; scaling it down"
        );
        ledger.residual_budget / floor_cost
    } else {
        1.0
    };

    for &i in &eligible {
        ledger.assign(i, &ranked[i], share * scale, true);
    }
}
