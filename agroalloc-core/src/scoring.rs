//! Scoring function
//!
//! Ranks practices by a priority score. Three interchangeable strategies are
//! available, selected by [`ScoringMethod`]:
//!
//! - **Ratio-power**: $S = \frac{I}{c \cdot d^{\alpha}} (s / 5)^{\sigma}$.
//!   Cost and difficulty penalise multiplicatively and the difficulty
//!   penalty is continuously tunable through $\alpha$.
//! - **Weighted sum**: $S = w_I S_I + w_c S_c + w_d S_d$ over min-max
//!   normalised criteria, where cost and difficulty are inverted so that 1
//!   is always best. Weights are rescaled to sum to one.
//! - **Weighted harmonic mean**: $S = \frac{\sum w}{\sum w / S_k}$ over the
//!   same criteria, each clipped to at least 0.01. A single very poor
//!   criterion drags the score down and cannot be masked by good ones.
//!
//! Ties are broken by catalog order so the ranking is fully deterministic.

use crate::config::{CriterionWeights, ScoringMethod, ScoringParameters};
use crate::errors::PlanResult;
use crate::practice::MAX_ORDINAL;
use crate::risk::ImpactRow;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Score assigned to a criterion that does not vary across practices.
const NEUTRAL_SCORE: f64 = 1.0;

/// Lower clip of normalised criteria in the harmonic mean.
const HARMONIC_FLOOR: f64 = 0.01;

/// A practice together with its priority score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPractice {
    pub name: String,
    pub score: f64,
    pub catalog_index: usize,
    pub net_impact_per_ha: f64,
    pub cost_per_ha: f64,
    pub difficulty: u8,
}

impl RankedPractice {
    fn from_row(row: &ImpactRow, score: f64) -> Self {
        Self {
            name: row.name.clone(),
            score,
            catalog_index: row.catalog_index,
            net_impact_per_ha: row.net_impact_per_ha,
            cost_per_ha: row.cost_per_ha,
            difficulty: row.difficulty,
        }
    }
}

/// Maps every row of an impact table to a raw score.
///
/// Returned scores line up with the input rows. Non-finite values are
/// allowed here and filtered by [`score_practices`].
pub trait ScoringStrategy {
    fn method(&self) -> ScoringMethod;

    fn scores(&self, rows: &[ImpactRow]) -> Vec<f64>;
}

/// Ratio of impact to difficulty-penalised cost.
#[derive(Debug, Clone, Copy)]
pub struct RatioPower {
    pub difficulty_aversion: f64,
    pub stability_emphasis: f64,
}

impl ScoringStrategy for RatioPower {
    fn method(&self) -> ScoringMethod {
        ScoringMethod::RatioPower
    }

    fn scores(&self, rows: &[ImpactRow]) -> Vec<f64> {
        rows.iter()
            .map(|row| {
                let difficulty_penalty = (row.difficulty as f64).powf(self.difficulty_aversion);
                let stability_weight =
                    (row.stability as f64 / MAX_ORDINAL as f64).powf(self.stability_emphasis);
                row.net_impact_per_ha / (row.cost_per_ha * difficulty_penalty) * stability_weight
            })
            .collect()
    }
}

/// Linear weighted sum of normalised criteria.
#[derive(Debug, Clone, Copy)]
pub struct WeightedSum {
    pub weights: CriterionWeights,
}

impl ScoringStrategy for WeightedSum {
    fn method(&self) -> ScoringMethod {
        ScoringMethod::WeightedSum
    }

    fn scores(&self, rows: &[ImpactRow]) -> Vec<f64> {
        let w = self.weights.normalised();
        normalise(rows)
            .iter()
            .map(|n| w.impact * n.impact + w.cost * n.cost + w.difficulty * n.difficulty)
            .collect()
    }
}

/// Weighted harmonic mean of normalised criteria.
#[derive(Debug, Clone, Copy)]
pub struct HarmonicMean {
    pub weights: CriterionWeights,
}

impl ScoringStrategy for HarmonicMean {
    fn method(&self) -> ScoringMethod {
        ScoringMethod::HarmonicMean
    }

    fn scores(&self, rows: &[ImpactRow]) -> Vec<f64> {
        let w = self.weights.normalised();
        let total = w.total();
        normalise(rows)
            .iter()
            .map(|n| {
                let denominator = w.impact / n.impact.max(HARMONIC_FLOOR)
                    + w.cost / n.cost.max(HARMONIC_FLOOR)
                    + w.difficulty / n.difficulty.max(HARMONIC_FLOOR);
                total / denominator
            })
            .collect()
    }
}

impl ScoringParameters {
    /// The strategy implementing the configured scoring method.
    pub fn strategy(&self) -> Box<dyn ScoringStrategy> {
        match self.method {
            ScoringMethod::RatioPower => Box::new(RatioPower {
                difficulty_aversion: self.difficulty_aversion,
                stability_emphasis: self.stability_emphasis,
            }),
            ScoringMethod::WeightedSum => Box::new(WeightedSum {
                weights: self.criterion_weights,
            }),
            ScoringMethod::HarmonicMean => Box::new(HarmonicMean {
                weights: self.criterion_weights,
            }),
        }
    }
}

/// Criteria rescaled to `[0, 1]`, 1 being best.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Normalised {
    impact: f64,
    cost: f64,
    difficulty: f64,
}

fn normalise(rows: &[ImpactRow]) -> Vec<Normalised> {
    let impact = Column::new(rows.iter().map(|r| r.net_impact_per_ha));
    let cost = Column::new(rows.iter().map(|r| r.cost_per_ha));
    let difficulty = Column::new(rows.iter().map(|r| r.difficulty as f64));

    rows.iter()
        .map(|r| Normalised {
            impact: impact.higher_is_better(r.net_impact_per_ha),
            cost: cost.lower_is_better(r.cost_per_ha),
            difficulty: difficulty.lower_is_better(r.difficulty as f64),
        })
        .collect()
}

/// Min-max bounds of one criterion.
struct Column {
    min: f64,
    max: f64,
}

impl Column {
    fn new(values: impl Iterator<Item = f64>) -> Self {
        values.fold(
            Self {
                min: f64::INFINITY,
                max: f64::NEG_INFINITY,
            },
            |acc, v| Self {
                min: acc.min.min(v),
                max: acc.max.max(v),
            },
        )
    }

    fn span(&self) -> Option<f64> {
        let span = self.max - self.min;
        // Zero-variance columns carry no information and must not divide by zero
        (span.is_finite() && span > f64::EPSILON * self.max.abs().max(1.0)).then_some(span)
    }

    fn higher_is_better(&self, value: f64) -> f64 {
        match self.span() {
            Some(span) => (value - self.min) / span,
            None => NEUTRAL_SCORE,
        }
    }

    fn lower_is_better(&self, value: f64) -> f64 {
        match self.span() {
            Some(span) => (self.max - value) / span,
            None => NEUTRAL_SCORE,
        }
    }
}

/// Rank the rows of an impact table, best first.
///
/// Rows with a non-positive net impact or a non-finite score are dropped
/// before sorting rather than being sorted to either end.
pub fn score_practices(
    rows: &[ImpactRow],
    scoring: &ScoringParameters,
) -> PlanResult<Vec<RankedPractice>> {
    scoring.validate()?;
    let strategy = scoring.strategy();

    let candidates: Vec<ImpactRow> = rows
        .iter()
        .filter(|row| {
            let usable = row.net_impact_per_ha.is_finite() && row.net_impact_per_ha > 0.0;
            if !usable {
                warn!(
                    practice = %row.name,
                    net_impact_per_ha = row.net_impact_per_ha,
                    "Skipping practice without a positive net impact"
                );
            }
            usable
        })
        .cloned()
        .collect();

    Ok(rank(strategy.as_ref(), &candidates))
}

fn rank(strategy: &dyn ScoringStrategy, rows: &[ImpactRow]) -> Vec<RankedPractice> {
    let scores = strategy.scores(rows);

    let mut ranked: Vec<RankedPractice> = rows
        .iter()
        .zip(scores)
        .filter_map(|(row, score)| {
            if score.is_finite() {
                Some(RankedPractice::from_row(row, score))
            } else {
                warn!(
                    practice = %row.name,
                    method = %strategy.method(),
                    score,
                    "Dropping practice with a non-finite score"
                );
                None
            }
        })
        .collect();

    // Stable sort: equal scores keep catalog order
    ranked.sort_by_key(|p| p.catalog_index);
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PlanError;
    use is_close::is_close;

    fn row(name: &str, index: usize, impact: f64, cost: f64, difficulty: u8) -> ImpactRow {
        ImpactRow {
            name: name.to_string(),
            catalog_index: index,
            net_impact_per_ha: impact,
            cost_per_ha: cost,
            difficulty,
            stability: 5,
        }
    }

    fn names(ranked: &[RankedPractice]) -> Vec<&str> {
        ranked.iter().map(|p| p.name.as_str()).collect()
    }

    fn weighted(method: ScoringMethod, impact: f64, cost: f64, difficulty: f64) -> ScoringParameters {
        ScoringParameters {
            method,
            criterion_weights: CriterionWeights::new(impact, cost, difficulty),
            ..Default::default()
        }
    }

    #[test]
    fn ratio_power_formula() {
        let rows = [row("a", 0, 3.0, 100.0, 2)];
        let scoring = ScoringParameters {
            difficulty_aversion: 2.0,
            stability_emphasis: 1.0,
            ..Default::default()
        };
        let ranked = score_practices(&rows, &scoring).unwrap();
        // 3 / (100 * 2^2) * (5 / 5)
        assert!(is_close!(ranked[0].score, 0.0075));
    }

    #[test]
    fn stability_weights_ratio_power() {
        let mut shaky = row("shaky", 0, 1.0, 100.0, 1);
        shaky.stability = 1;
        let steady = row("steady", 1, 1.0, 100.0, 1);

        let ranked = score_practices(&[shaky, steady], &ScoringParameters::default()).unwrap();
        assert_eq!(names(&ranked), ["steady", "shaky"]);
        assert!(is_close!(ranked[1].score, 0.01 * 0.2));
    }

    #[test]
    fn weighted_sum_follows_weights() {
        let rows = [row("A", 0, 2.0, 100.0, 1), row("B", 1, 5.0, 600.0, 1)];

        let by_impact = weighted(ScoringMethod::WeightedSum, 1.0, 0.0, 0.0);
        assert_eq!(names(&score_practices(&rows, &by_impact).unwrap()), ["B", "A"]);

        let by_cost = weighted(ScoringMethod::WeightedSum, 0.0, 1.0, 0.0);
        assert_eq!(names(&score_practices(&rows, &by_cost).unwrap()), ["A", "B"]);
    }

    #[test]
    fn zero_variance_column_is_neutral() {
        let rows = [row("a", 0, 1.0, 250.0, 2), row("b", 1, 3.0, 250.0, 4)];
        let scoring = weighted(ScoringMethod::WeightedSum, 0.0, 1.0, 0.0);
        let ranked = score_practices(&rows, &scoring).unwrap();
        for p in &ranked {
            assert!(is_close!(p.score, NEUTRAL_SCORE), "{}: {}", p.name, p.score);
        }
        // All scores tie, so catalog order is kept
        assert_eq!(names(&ranked), ["a", "b"]);
    }

    #[test]
    fn harmonic_mean_punishes_a_single_bad_criterion() {
        // "balanced" is middling everywhere, "lopsided" is best on two
        // criteria and worst on cost.
        let rows = [
            row("lopsided", 0, 4.0, 400.0, 1),
            row("balanced", 1, 3.0, 250.0, 2),
            row("weak", 2, 1.0, 100.0, 3),
        ];

        let sum = score_practices(&rows, &weighted(ScoringMethod::WeightedSum, 1.0, 1.0, 1.0))
            .unwrap();
        assert_eq!(sum[0].name, "lopsided");

        let harmonic =
            score_practices(&rows, &weighted(ScoringMethod::HarmonicMean, 1.0, 1.0, 1.0))
                .unwrap();
        assert_eq!(harmonic[0].name, "balanced");
        for p in &harmonic {
            assert!(p.score.is_finite() && p.score > 0.0);
        }
    }

    #[test]
    fn harmonic_mean_of_identical_rows() {
        let rows = [row("a", 0, 2.0, 100.0, 3), row("b", 1, 2.0, 100.0, 3)];
        let ranked =
            score_practices(&rows, &weighted(ScoringMethod::HarmonicMean, 2.0, 1.0, 0.5))
                .unwrap();
        assert!(is_close!(ranked[0].score, 1.0));
        assert_eq!(names(&ranked), ["a", "b"]);
    }

    #[test]
    fn harmonic_mean_rejects_zero_weights() {
        let rows = [row("a", 0, 2.0, 100.0, 3)];
        let scoring = weighted(ScoringMethod::HarmonicMean, 0.0, 0.0, 0.0);
        assert!(matches!(
            score_practices(&rows, &scoring),
            Err(PlanError::ZeroCriterionWeights(_))
        ));
    }

    #[test]
    fn huge_weights_keep_every_practice() {
        let rows = [
            row("best", 0, 4.0, 100.0, 1),
            row("mid", 1, 2.0, 200.0, 3),
            row("worst", 2, 1.0, 400.0, 5),
        ];
        for method in [ScoringMethod::WeightedSum, ScoringMethod::HarmonicMean] {
            let huge = score_practices(&rows, &weighted(method, 1e308, 1e308, 1e308)).unwrap();
            assert_eq!(names(&huge), ["best", "mid", "worst"], "{method}");

            // Only the ratio between weights matters
            let unit = score_practices(&rows, &weighted(method, 1.0, 1.0, 1.0)).unwrap();
            for (a, b) in huge.iter().zip(&unit) {
                assert!(is_close!(a.score, b.score), "{method}: {} vs {}", a.score, b.score);
            }
        }
    }

    #[test]
    fn weighted_sum_with_zero_weights_keeps_catalog_order() {
        let rows = [row("a", 0, 1.0, 300.0, 4), row("b", 1, 3.0, 100.0, 1)];
        let ranked =
            score_practices(&rows, &weighted(ScoringMethod::WeightedSum, 0.0, 0.0, 0.0)).unwrap();
        assert_eq!(names(&ranked), ["a", "b"]);
        assert!(ranked.iter().all(|p| p.score == 0.0));
    }

    struct NanForOdd;

    impl ScoringStrategy for NanForOdd {
        fn method(&self) -> ScoringMethod {
            ScoringMethod::WeightedSum
        }

        fn scores(&self, rows: &[ImpactRow]) -> Vec<f64> {
            rows.iter()
                .map(|r| match r.catalog_index % 2 {
                    0 => r.net_impact_per_ha,
                    _ => f64::NAN,
                })
                .collect()
        }
    }

    #[test]
    fn non_finite_scores_are_dropped() {
        let rows = [
            row("kept", 0, 1.0, 100.0, 1),
            row("nan", 1, 5.0, 100.0, 1),
            row("also-kept", 2, 2.0, 100.0, 1),
        ];
        let ranked = rank(&NanForOdd, &rows);
        assert_eq!(names(&ranked), ["also-kept", "kept"]);
    }

    #[test]
    fn ties_break_by_catalog_order() {
        let rows = [
            row("third", 2, 1.0, 100.0, 1),
            row("first", 0, 1.0, 100.0, 1),
            row("second", 1, 1.0, 100.0, 1),
        ];
        let ranked = score_practices(&rows, &ScoringParameters::default()).unwrap();
        assert_eq!(names(&ranked), ["first", "second", "third"]);
    }

    #[test]
    fn non_positive_impacts_are_filtered() {
        let rows = [
            row("negative", 0, -1.0, 100.0, 1),
            row("zero", 1, 0.0, 100.0, 1),
            row("good", 2, 1.0, 100.0, 1),
        ];
        for method in [
            ScoringMethod::RatioPower,
            ScoringMethod::WeightedSum,
            ScoringMethod::HarmonicMean,
        ] {
            let ranked = score_practices(&rows, &weighted(method, 1.0, 1.0, 1.0)).unwrap();
            assert_eq!(names(&ranked), ["good"], "{method}");
        }
    }

    #[test]
    fn difficulty_aversion_demotes_hard_practices() {
        let rows = [row("hard", 0, 3.0, 100.0, 5), row("easy", 1, 2.0, 100.0, 1)];
        let lenient = ScoringParameters {
            difficulty_aversion: 0.0,
            ..Default::default()
        };
        let strict = ScoringParameters {
            difficulty_aversion: 3.0,
            ..Default::default()
        };
        assert_eq!(names(&score_practices(&rows, &lenient).unwrap()), ["hard", "easy"]);
        assert_eq!(names(&score_practices(&rows, &strict).unwrap()), ["easy", "hard"]);
    }
}
