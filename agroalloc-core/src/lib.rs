//! Allocation engine for agricultural carbon-farming programmes
//!
//! Given a fixed land area, a catalog of mitigation practices and an annual
//! budget, decides how many hectares to enrol in each practice so as to
//! approach a CO2 abatement target at minimum cost.
//!
//! # Module Organisation
//!
//! - `practice`: the immutable practice catalog
//! - `config`: per-run strategy parameters with documented defaults
//! - `risk`: risk-discounted net impact per hectare
//! - `scoring`: ratio-power, weighted-sum and harmonic-mean rankings
//! - `allocation`: greedy, constraint-aware hectare allocation
//! - `temporal`: multi-year ramp-up with churn and carbon-stock carryover
//! - `planner`: the end-to-end pipeline
//! - `scenario`: TOML scenario files
//!
//! Every computation is a pure function of its inputs. Nothing is cached
//! between runs and the catalog is never mutated, so independent runs may
//! execute in parallel freely.

pub mod allocation;
pub mod config;
pub mod errors;
pub mod planner;
pub mod practice;
#[cfg(feature = "python")]
pub mod python;
pub mod risk;
pub mod scenario;
pub mod scoring;
pub mod temporal;

pub use allocation::{allocate, Allocation, AllocationRequest, CapPolicy, Termination};
pub use config::StrategyConfig;
pub use errors::{PlanError, PlanResult};
pub use planner::{plan, plan_single_practice, PlanReport};
pub use practice::{Practice, PracticeCatalog};
pub use risk::{build_impact_table, compute_net_impact};
pub use scenario::Scenario;
pub use scoring::{score_practices, RankedPractice};
pub use temporal::{project_trajectory, TrajectoryPoint};
