use thiserror::Error;

/// Error type for invalid planning inputs.
///
/// Only configuration problems are errors. A practice whose risk-adjusted
/// impact is not positive is excluded from the run, and a target that cannot
/// be reached is reported as a gap on the allocation.
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Invalid value for `{name}`: {value} ({reason})")]
    InvalidParameter {
        name: String,
        value: f64,
        reason: String,
    },
    #[error("Practice `{practice}` has {field}={value}, expected an ordinal between 1 and 5")]
    OrdinalOutOfRange {
        practice: String,
        field: &'static str,
        value: u8,
    },
    #[error("Practice `{0}` appears more than once in the catalog")]
    DuplicatePractice(String),
    #[error("The practice catalog is empty")]
    EmptyCatalog,
    #[error("All criterion weights are zero but the {0} scoring method divides by their sum")]
    ZeroCriterionWeights(String),
    #[error("Unknown practice `{0}`")]
    UnknownPractice(String),
    #[error("Could not read scenario file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not parse scenario: {0}")]
    Toml(#[from] toml::de::Error),
}

impl PlanError {
    pub(crate) fn invalid(name: impl Into<String>, value: f64, reason: impl Into<String>) -> Self {
        PlanError::InvalidParameter {
            name: name.into(),
            value,
            reason: reason.into(),
        }
    }
}

/// Convenience type for `Result<T, PlanError>`.
pub type PlanResult<T> = Result<T, PlanError>;

/// Require a finite value that is zero or greater.
pub(crate) fn ensure_non_negative(name: &str, value: f64) -> PlanResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(PlanError::invalid(name, value, "must be finite and >= 0"));
    }
    Ok(())
}

/// Require a finite value that is strictly positive.
pub(crate) fn ensure_positive(name: &str, value: f64) -> PlanResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(PlanError::invalid(name, value, "must be finite and > 0"));
    }
    Ok(())
}

/// Require a discount rate in `[0, 100)`.
pub(crate) fn ensure_rate_pct(name: &str, value: f64) -> PlanResult<()> {
    if !value.is_finite() || !(0.0..100.0).contains(&value) {
        return Err(PlanError::invalid(name, value, "must lie in [0, 100)"));
    }
    Ok(())
}

/// Require a share in `[0, 100]`.
pub(crate) fn ensure_share_pct(name: &str, value: f64) -> PlanResult<()> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(PlanError::invalid(name, value, "must lie in [0, 100]"));
    }
    Ok(())
}
