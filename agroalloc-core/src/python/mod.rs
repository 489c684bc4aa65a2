//! Python bindings for the planning pipeline
//!
//! Scenarios, practices and reports cross the boundary as plain dictionaries
//! and lists. Missing keys fall back to the same defaults as a TOML scenario.

use crate::config::RiskParameters;
use crate::errors::PlanError;
use crate::planner::plan_single_practice;
use crate::practice::{Practice, PracticeCatalog};
use crate::scenario::Scenario;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pythonize::{depythonize, pythonize};

impl From<PlanError> for PyErr {
    fn from(err: PlanError) -> Self {
        PyValueError::new_err(err.to_string())
    }
}

fn load_scenario(scenario: Option<Bound<'_, PyAny>>) -> PyResult<Scenario> {
    let scenario: Scenario = match scenario {
        Some(obj) => depythonize(&obj)?,
        None => Scenario::default(),
    };
    scenario.validate()?;
    Ok(scenario)
}

/// Run the full pipeline and return the plan report as a dict.
///
/// Example:
///     report = plan({"strategy": {"budget": 500000.0}, "projection": {"horizon_years": 5}})
#[pyfunction]
#[pyo3(signature = (scenario=None))]
fn plan<'py>(py: Python<'py>, scenario: Option<Bound<'py, PyAny>>) -> PyResult<Bound<'py, PyAny>> {
    let report = load_scenario(scenario)?.run()?;
    Ok(pythonize(py, &report)?)
}

/// Rank the scenario's practices, best first.
#[pyfunction]
#[pyo3(signature = (scenario=None))]
fn score_practices<'py>(
    py: Python<'py>,
    scenario: Option<Bound<'py, PyAny>>,
) -> PyResult<Bound<'py, PyAny>> {
    let scenario = load_scenario(scenario)?;
    let table = crate::risk::build_impact_table(&scenario.catalog()?, &scenario.strategy);
    let ranked = crate::scoring::score_practices(&table.rows, &scenario.strategy.scoring)?;
    Ok(pythonize(py, &ranked)?)
}

/// Risk-discounted net impact (tCO2e/ha/yr) of a single practice.
#[pyfunction]
#[pyo3(signature = (practice, risk=None))]
fn compute_net_impact(practice: Bound<'_, PyAny>, risk: Option<Bound<'_, PyAny>>) -> PyResult<f64> {
    let practice: Practice = depythonize(&practice)?;
    practice.validate()?;
    let risk: RiskParameters = match risk {
        Some(obj) => depythonize(&obj)?,
        None => RiskParameters::default(),
    };
    risk.validate()?;
    Ok(crate::risk::compute_net_impact(&practice, &risk))
}

/// Hectares, cost and budget headroom of meeting the target with one practice.
#[pyfunction]
#[pyo3(signature = (name, scenario=None))]
fn single_practice_plan<'py>(
    py: Python<'py>,
    name: &str,
    scenario: Option<Bound<'py, PyAny>>,
) -> PyResult<Bound<'py, PyAny>> {
    let scenario = load_scenario(scenario)?;
    let plan = plan_single_practice(&scenario.catalog()?, &scenario.strategy, name)?;
    Ok(pythonize(py, &plan)?)
}

/// The built-in reference practice catalog as a list of dicts.
#[pyfunction]
fn reference_catalog(py: Python<'_>) -> PyResult<Bound<'_, PyAny>> {
    Ok(pythonize(py, &PracticeCatalog::reference())?)
}

#[pymodule]
pub fn planning(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(plan, m)?)?;
    m.add_function(wrap_pyfunction!(score_practices, m)?)?;
    m.add_function(wrap_pyfunction!(compute_net_impact, m)?)?;
    m.add_function(wrap_pyfunction!(single_practice_plan, m)?)?;
    m.add_function(wrap_pyfunction!(reference_catalog, m)?)?;
    Ok(())
}
