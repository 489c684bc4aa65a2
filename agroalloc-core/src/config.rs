//! Strategy configuration
//!
//! Per-run parameters supplied by the caller. Every struct deserialises with
//! `#[serde(default)]` so a scenario file only needs to name the values it
//! changes. Defaults reproduce the reference tomato supply-chain scenario.

use crate::errors::{
    ensure_non_negative, ensure_positive, ensure_rate_pct, ensure_share_pct, PlanError,
    PlanResult,
};
use crate::practice::{MAX_ORDINAL, MIN_ORDINAL};
use serde::{Deserialize, Serialize};

/// Scientific and financial risk discounts.
///
/// Each percentage becomes an independent multiplicative factor
/// `(1 - rate / 100)` on the gross per-hectare benefit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskParameters {
    /// Reserve held back against non-permanence of stored carbon.
    /// unit: %
    /// default: 20.0
    pub safety_buffer_pct: f64,

    /// Discount for measurement and estimation error.
    /// unit: %
    /// default: 15.0
    pub model_uncertainty_pct: f64,

    /// Annual share of enrolled hectares leaving the programme.
    /// unit: %
    /// default: 15.0
    pub churn_rate_pct: f64,

    /// Annual loss of carbon stock on hectares that have churned out.
    /// The retention rate of abandoned stock is `1 - carbon_decay_pct / 100`.
    /// unit: %
    /// default: 70.0
    pub carbon_decay_pct: f64,

    /// Natural soil organic carbon loss arrested by any practice.
    /// Added to the gross benefit before discounting.
    /// unit: tCO2e/ha/yr
    /// default: 0.0
    pub baseline_soc_loss_offset: f64,

    /// Apply the churn discount to the per-hectare impact.
    ///
    /// Appropriate when a single year is modelled in isolation. The temporal
    /// projection models churn explicitly and disables this.
    /// default: true
    pub discount_churn: bool,
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            safety_buffer_pct: 20.0,
            model_uncertainty_pct: 15.0,
            churn_rate_pct: 15.0,
            carbon_decay_pct: 70.0,
            baseline_soc_loss_offset: 0.0,
            discount_churn: true,
        }
    }
}

impl RiskParameters {
    pub fn validate(&self) -> PlanResult<()> {
        ensure_rate_pct("risk.safety_buffer_pct", self.safety_buffer_pct)?;
        ensure_rate_pct("risk.model_uncertainty_pct", self.model_uncertainty_pct)?;
        ensure_rate_pct("risk.churn_rate_pct", self.churn_rate_pct)?;
        ensure_rate_pct("risk.carbon_decay_pct", self.carbon_decay_pct)?;
        ensure_non_negative(
            "risk.baseline_soc_loss_offset",
            self.baseline_soc_loss_offset,
        )
    }
}

/// Scoring mode used to rank practices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMethod {
    /// `net_impact / (cost * difficulty^alpha) * stability_weight`
    #[default]
    RatioPower,
    /// Min-max normalised weighted sum of impact, cost and difficulty.
    WeightedSum,
    /// Weighted harmonic mean of the same normalised criteria.
    HarmonicMean,
}

impl ScoringMethod {
    pub fn label(&self) -> &'static str {
        match self {
            ScoringMethod::RatioPower => "ratio-power",
            ScoringMethod::WeightedSum => "weighted-sum",
            ScoringMethod::HarmonicMean => "harmonic-mean",
        }
    }
}

impl std::fmt::Display for ScoringMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Relative importance of the MCDA criteria. Need not sum to one; the
/// weighted scoring methods normalise them before use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CriterionWeights {
    pub impact: f64,
    pub cost: f64,
    pub difficulty: f64,
}

impl Default for CriterionWeights {
    fn default() -> Self {
        Self {
            impact: 1.0,
            cost: 1.0,
            difficulty: 1.0,
        }
    }
}

impl CriterionWeights {
    pub fn new(impact: f64, cost: f64, difficulty: f64) -> Self {
        Self {
            impact,
            cost,
            difficulty,
        }
    }

    pub fn total(&self) -> f64 {
        self.impact + self.cost + self.difficulty
    }

    /// Weights rescaled to sum to one.
    ///
    /// Dividing by the largest weight first keeps the sum finite for any
    /// finite input. All-zero weights are returned unchanged.
    pub fn normalised(&self) -> Self {
        let largest = self.impact.max(self.cost).max(self.difficulty);
        if largest <= 0.0 {
            return *self;
        }
        let scaled = Self::new(
            self.impact / largest,
            self.cost / largest,
            self.difficulty / largest,
        );
        let total = scaled.total();
        Self::new(
            scaled.impact / total,
            scaled.cost / total,
            scaled.difficulty / total,
        )
    }

    pub fn validate(&self) -> PlanResult<()> {
        ensure_non_negative("scoring.criterion_weights.impact", self.impact)?;
        ensure_non_negative("scoring.criterion_weights.cost", self.cost)?;
        ensure_non_negative("scoring.criterion_weights.difficulty", self.difficulty)
    }
}

/// Parameters of the scoring function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringParameters {
    /// default: ratio_power
    pub method: ScoringMethod,

    /// Exponent applied to difficulty (alpha). Higher values penalise
    /// complex practices more. Typical range 0.5 to 5.0.
    /// default: 1.0
    pub difficulty_aversion: f64,

    /// Exponent applied to `stability / 5` in ratio-power scoring.
    /// Zero makes stability irrelevant.
    /// default: 1.0
    pub stability_emphasis: f64,

    pub criterion_weights: CriterionWeights,
}

impl Default for ScoringParameters {
    fn default() -> Self {
        Self {
            method: ScoringMethod::default(),
            difficulty_aversion: 1.0,
            stability_emphasis: 1.0,
            criterion_weights: CriterionWeights::default(),
        }
    }
}

impl ScoringParameters {
    pub fn validate(&self) -> PlanResult<()> {
        ensure_non_negative("scoring.difficulty_aversion", self.difficulty_aversion)?;
        ensure_non_negative("scoring.stability_emphasis", self.stability_emphasis)?;
        self.criterion_weights.validate()?;
        if self.method == ScoringMethod::HarmonicMean && self.criterion_weights.total() <= 0.0 {
            return Err(PlanError::ZeroCriterionWeights(self.method.to_string()));
        }
        Ok(())
    }
}

/// Land assumed to adopt low-friction practices without an incentive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpontaneousAdoption {
    /// Share of the total land area adopting spontaneously.
    /// unit: %
    /// default: 0.0
    pub adoption_pct: f64,

    /// Practices with `difficulty <= difficulty_threshold` are eligible.
    /// default: 2
    pub difficulty_threshold: u8,
}

impl Default for SpontaneousAdoption {
    fn default() -> Self {
        Self {
            adoption_pct: 0.0,
            difficulty_threshold: 2,
        }
    }
}

impl SpontaneousAdoption {
    pub fn validate(&self) -> PlanResult<()> {
        ensure_share_pct("spontaneous.adoption_pct", self.adoption_pct)?;
        if !(MIN_ORDINAL..=MAX_ORDINAL).contains(&self.difficulty_threshold) {
            return Err(PlanError::invalid(
                "spontaneous.difficulty_threshold",
                self.difficulty_threshold as f64,
                "must lie in [1, 5]",
            ));
        }
        Ok(())
    }
}

/// Per-practice ceiling on enrolled hectares.
///
/// This is a policy choice rather than a physical constraint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum OperationalCap {
    /// Only land, budget and target constrain a practice.
    #[default]
    None,
    /// At most `fraction` of the total land area per practice.
    FlatShare { fraction: f64 },
    /// At most `total_land_area / difficulty^(alpha / k)` per practice,
    /// where alpha is the scoring difficulty aversion.
    DifficultyPowerLaw { k: f64 },
}

impl OperationalCap {
    pub fn validate(&self) -> PlanResult<()> {
        match *self {
            OperationalCap::None => Ok(()),
            OperationalCap::FlatShare { fraction } => {
                if !fraction.is_finite() || fraction <= 0.0 || fraction > 1.0 {
                    return Err(PlanError::invalid(
                        "operational_cap.fraction",
                        fraction,
                        "must lie in (0, 1]",
                    ));
                }
                Ok(())
            }
            OperationalCap::DifficultyPowerLaw { k } => ensure_positive("operational_cap.k", k),
        }
    }
}

/// All per-run parameters of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Share of baseline emissions to abate.
    /// unit: %
    /// default: 27.0
    pub target_pct: f64,

    /// Currency available for incentives over the allocation period.
    /// default: 1_000_000.0
    pub budget: f64,

    /// Hectares shared by all practices.
    /// unit: ha
    /// default: 10_000.0
    pub total_land_area: f64,

    /// Baseline emissions of conventional management.
    /// unit: tCO2e/ha/yr
    /// default: 4.5
    pub baseline_emissions_per_ha: f64,

    /// Share of the base practice cost covered by the incentive.
    /// unit: %
    /// default: 75.0
    pub incentive_pct: f64,

    /// Annual product output of the supply chain, used for intensity figures.
    /// unit: t
    /// default: 800_000.0
    pub production_volume_t: Option<f64>,

    pub risk: RiskParameters,
    pub scoring: ScoringParameters,
    pub spontaneous: SpontaneousAdoption,
    pub operational_cap: OperationalCap,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            target_pct: 27.0,
            budget: 1_000_000.0,
            total_land_area: 10_000.0,
            baseline_emissions_per_ha: 4.5,
            incentive_pct: 75.0,
            production_volume_t: Some(800_000.0),
            risk: RiskParameters::default(),
            scoring: ScoringParameters::default(),
            spontaneous: SpontaneousAdoption::default(),
            operational_cap: OperationalCap::default(),
        }
    }
}

impl StrategyConfig {
    /// Check every parameter against its valid domain.
    pub fn validate(&self) -> PlanResult<()> {
        self.risk.validate()?;
        self.scoring.validate()?;
        self.spontaneous.validate()?;
        self.operational_cap.validate()?;
        ensure_share_pct("target_pct", self.target_pct)?;
        ensure_non_negative("budget", self.budget)?;
        ensure_non_negative("total_land_area", self.total_land_area)?;
        ensure_non_negative("baseline_emissions_per_ha", self.baseline_emissions_per_ha)?;
        if !self.incentive_pct.is_finite() || self.incentive_pct <= 0.0 || self.incentive_pct > 100.0
        {
            return Err(PlanError::invalid(
                "incentive_pct",
                self.incentive_pct,
                "must lie in (0, 100]",
            ));
        }
        if let Some(volume) = self.production_volume_t {
            ensure_positive("production_volume_t", volume)?;
        }
        Ok(())
    }

    /// Emissions of the whole land area under baseline management.
    pub fn baseline_total_emissions(&self) -> f64 {
        self.total_land_area * self.baseline_emissions_per_ha
    }

    /// Tonnes of CO2e the plan aims to abate each year.
    pub fn target_abatement_tons(&self) -> f64 {
        self.target_pct / 100.0 * self.baseline_total_emissions()
    }
}

/// Settings of the optional multi-year projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionParameters {
    /// Years over which enrolment ramps up linearly.
    /// default: 5
    pub horizon_years: u32,
}

impl Default for ProjectionParameters {
    fn default() -> Self {
        Self { horizon_years: 5 }
    }
}
