//! Whole-pipeline properties that must hold for any valid configuration.

use agroalloc_core::allocation::{allocate, AllocationRequest, Termination};
use agroalloc_core::config::{
    CriterionWeights, OperationalCap, ScoringMethod, ScoringParameters, SpontaneousAdoption,
    StrategyConfig,
};
use agroalloc_core::risk::ImpactRow;
use agroalloc_core::temporal::{project_potential, ProjectionSettings};
use agroalloc_core::{plan, score_practices, PracticeCatalog, RankedPractice};
use approx::assert_relative_eq;
use is_close::is_close;

const METHODS: [ScoringMethod; 3] = [
    ScoringMethod::RatioPower,
    ScoringMethod::WeightedSum,
    ScoringMethod::HarmonicMean,
];

fn row(name: &str, index: usize, impact: f64, cost: f64, difficulty: u8) -> ImpactRow {
    ImpactRow {
        name: name.to_string(),
        catalog_index: index,
        net_impact_per_ha: impact,
        cost_per_ha: cost,
        difficulty,
        stability: 3,
    }
}

fn ranked_single(impact: f64, cost: f64) -> Vec<RankedPractice> {
    score_practices(&[row("p", 0, impact, cost, 3)], &ScoringParameters::default()).unwrap()
}

fn position(ranking: &[RankedPractice], name: &str) -> usize {
    ranking.iter().position(|p| p.name == name).unwrap()
}

#[test]
fn allocations_respect_land_and_budget() {
    let catalog = PracticeCatalog::reference();
    for method in METHODS {
        for budget in [0.0, 5_000.0, 250_000.0, 1e6, 1e8] {
            for land in [0.0, 100.0, 10_000.0] {
                let mut config = StrategyConfig {
                    budget,
                    total_land_area: land,
                    ..Default::default()
                };
                config.scoring.method = method;
                config.spontaneous.adoption_pct = 5.0;

                let report = plan(&catalog, &config, None).unwrap();
                let total_hectares: f64 = report.hectares.values().sum();
                assert!(
                    total_hectares <= land + 1e-6,
                    "{method}: {total_hectares} ha on {land} ha"
                );

                // Price the hectares independently of the ledger's own cost
                let spent: f64 = report
                    .ranking
                    .iter()
                    .map(|p| report.hectares[p.name.as_str()] * p.cost_per_ha)
                    .sum();
                assert!(
                    spent <= budget * (1.0 + 1e-9) + 1e-6,
                    "{method}: spent {spent} of {budget}"
                );
                assert!(report.allocation.residual_budget >= 0.0);
            }
        }
    }
}

#[test]
fn more_budget_never_lowers_abatement() {
    let catalog = PracticeCatalog::reference();
    for method in METHODS {
        let mut previous = 0.0;
        for step in 0..=40 {
            let mut config = StrategyConfig {
                budget: step as f64 * 50_000.0,
                target_pct: 60.0,
                ..Default::default()
            };
            config.scoring.method = method;
            config.spontaneous.adoption_pct = 10.0;

            let achieved = plan(&catalog, &config, None)
                .unwrap()
                .allocation
                .cumulative_abatement;
            assert!(
                achieved >= previous - 1e-9,
                "{method}: abatement fell from {previous} to {achieved} at step {step}"
            );
            previous = achieved;
        }
    }
}

#[test]
fn difficulty_aversion_never_promotes_harder_practices() {
    let rows = [
        row("easy", 0, 2.0, 300.0, 1),
        row("medium", 1, 2.5, 300.0, 3),
        row("hard", 2, 3.0, 300.0, 5),
    ];
    let pairs = [("hard", "easy"), ("hard", "medium"), ("medium", "easy")];

    let mut last: Option<Vec<RankedPractice>> = None;
    for alpha in [0.0, 0.25, 0.5, 1.0, 2.0, 3.5, 5.0] {
        let scoring = ScoringParameters {
            difficulty_aversion: alpha,
            ..Default::default()
        };
        let ranking = score_practices(&rows, &scoring).unwrap();
        if let Some(previous) = &last {
            for (harder, easier) in pairs {
                if position(previous, harder) > position(previous, easier) {
                    assert!(
                        position(&ranking, harder) > position(&ranking, easier),
                        "{harder} overtook {easier} at alpha {alpha}"
                    );
                }
            }
        }
        last = Some(ranking);
    }

    // At high aversion the easiest practice leads
    let scoring = ScoringParameters {
        difficulty_aversion: 5.0,
        ..Default::default()
    };
    assert_eq!(score_practices(&rows, &scoring).unwrap()[0].name, "easy");
}

#[test]
fn identical_inputs_give_identical_reports() {
    let mut config = StrategyConfig::default();
    config.spontaneous.adoption_pct = 10.0;
    config.operational_cap = OperationalCap::DifficultyPowerLaw { k: 2.0 };

    let catalog = PracticeCatalog::reference();
    let first = plan(&catalog, &config, Some(5)).unwrap();
    let second = plan(&catalog, &config, Some(5)).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn equal_costs_score_without_nan() {
    let rows = [
        row("a", 0, 1.0, 250.0, 1),
        row("b", 1, 2.0, 250.0, 3),
        row("c", 2, 3.0, 250.0, 5),
    ];
    for method in METHODS {
        let scoring = ScoringParameters {
            method,
            ..Default::default()
        };
        let ranking = score_practices(&rows, &scoring).unwrap();
        assert_eq!(ranking.len(), 3, "{method} dropped a practice");
        assert!(ranking.iter().all(|p| p.score.is_finite()));

        let request = AllocationRequest::new(100_000.0, 1_000.0, 1_000.0);
        let allocation = allocate(&ranking, &request, None).unwrap();
        assert!(allocation.cumulative_abatement.is_finite());
    }
}

#[test]
fn no_churn_means_no_carryover() {
    let settings = ProjectionSettings {
        baseline_total_emissions: 45_000.0,
        horizon_years: 10,
        churn_rate_pct: 0.0,
        carbon_decay_pct: 70.0,
    };
    let points = project_potential(3_000.0, &settings).unwrap();
    assert_eq!(points.len(), 11);
    assert!(points.iter().all(|p| p.carryover == 0.0));
}

#[test]
fn single_practice_meets_target_exactly() {
    let request = AllocationRequest::new(100_000.0, 10_000.0, 600.0);
    let allocation = allocate(&ranked_single(3.0, 500.0), &request, None).unwrap();

    assert_relative_eq!(allocation.hectares("p").unwrap(), 200.0, epsilon = 1e-9);
    assert_relative_eq!(allocation.residual_budget, 0.0, epsilon = 1e-9);
    assert!(is_close!(allocation.cumulative_abatement, 600.0));
    assert_eq!(allocation.termination, Termination::TargetReached);
}

#[test]
fn single_practice_runs_out_of_budget() {
    let request = AllocationRequest::new(50_000.0, 10_000.0, 600.0);
    let allocation = allocate(&ranked_single(3.0, 500.0), &request, None).unwrap();

    assert_relative_eq!(allocation.hectares("p").unwrap(), 100.0, epsilon = 1e-9);
    assert_relative_eq!(allocation.gap_tons, 300.0, epsilon = 1e-9);
    assert_eq!(allocation.termination, Termination::BudgetExhausted);
}

#[test]
fn weighted_sum_follows_the_criterion_weights() {
    let rows = [row("A", 0, 2.0, 100.0, 2), row("B", 1, 5.0, 600.0, 2)];
    let ranking_with = |weights: CriterionWeights| {
        let scoring = ScoringParameters {
            method: ScoringMethod::WeightedSum,
            criterion_weights: weights,
            ..Default::default()
        };
        score_practices(&rows, &scoring).unwrap()
    };

    assert_eq!(ranking_with(CriterionWeights::new(1.0, 0.0, 0.0))[0].name, "B");
    assert_eq!(ranking_with(CriterionWeights::new(0.0, 1.0, 0.0))[0].name, "A");
}

#[test]
fn spontaneous_floor_precedes_greedy_fill() {
    let rows = [
        row("simple", 0, 1.0, 100.0, 1),
        row("also-simple", 1, 1.0, 200.0, 2),
        row("complex", 2, 8.0, 100.0, 4),
    ];
    let ranking = score_practices(&rows, &ScoringParameters::default()).unwrap();
    assert_eq!(ranking[0].name, "complex");

    let request = AllocationRequest::new(1_000_000.0, 10_000.0, 10_000.0).with_spontaneous(
        SpontaneousAdoption {
            adoption_pct: 10.0,
            difficulty_threshold: 2,
        },
    );
    let allocation = allocate(&ranking, &request, None).unwrap();

    for name in ["simple", "also-simple"] {
        let entry = allocation.practices.iter().find(|p| p.name == name).unwrap();
        assert_relative_eq!(entry.spontaneous_hectares, 500.0, epsilon = 1e-9);
    }
    let complex = allocation.practices.iter().find(|p| p.name == "complex").unwrap();
    assert_eq!(complex.spontaneous_hectares, 0.0);
    // Floor abates 1000 t, the rest comes from the top-ranked practice
    assert_relative_eq!(complex.hectares, 1_125.0, epsilon = 1e-6);
    // 50_000 + 100_000 for the floor, 112_500 for the greedy step
    assert_relative_eq!(allocation.residual_budget, 737_500.0, epsilon = 1e-6);
    assert_eq!(allocation.termination, Termination::TargetReached);
}

#[test]
fn carryover_comes_from_the_previous_years_enrolment() {
    let settings = ProjectionSettings {
        baseline_total_emissions: 10_000.0,
        horizon_years: 5,
        churn_rate_pct: 10.0,
        carbon_decay_pct: 70.0,
    };
    let points = project_potential(1_000.0, &settings).unwrap();

    assert_relative_eq!(points[1].new_abatement, 180.0, epsilon = 1e-9);
    assert_eq!(points[1].carryover, 0.0);
    // 1000 * (1/5) * 0.1 churned at the end of year one
    assert_relative_eq!(points[2].carryover, 20.0, epsilon = 1e-9);
    assert_relative_eq!(points[5].new_abatement, 900.0, epsilon = 1e-9);
    assert_relative_eq!(
        points[5].net_emissions,
        10_000.0 - points[5].new_abatement - points[5].carryover,
        epsilon = 1e-9
    );
}

#[test]
fn bundled_reference_scenario_runs() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../scenarios/reference.toml");
    let scenario = agroalloc_core::Scenario::from_path(path).unwrap();
    assert_eq!(scenario.horizon_years(), Some(5));
    assert_eq!(
        scenario.strategy.operational_cap,
        OperationalCap::FlatShare { fraction: 0.5 }
    );

    let report = scenario.run().unwrap();
    assert_relative_eq!(report.baseline_total_emissions, 45_000.0);

    let ranked_names: Vec<&str> = report.ranking.iter().map(|p| p.name.as_str()).collect();
    let mapped_names: Vec<&str> = report.hectares.keys().map(String::as_str).collect();
    assert_eq!(mapped_names, ranked_names);
    for p in &report.allocation.practices {
        assert_eq!(report.hectares[p.name.as_str()], p.hectares);
    }
    assert!(report.hectares.values().any(|&ha| ha > 0.0));
    for p in &report.allocation.practices {
        assert!(p.hectares <= 5_000.0 + 1e-6, "{} got {}", p.name, p.hectares);
    }
    assert_eq!(report.trajectory.unwrap().len(), 6);
}
