use thiserror::Error;

/// Failures of wizard operations
///
/// None of them is fatal: every variant ends in a notification and the
/// wizard stays interactive.
#[derive(Debug, Error)]
pub enum WizardError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("failed to persist network setup: {0:#}")]
    Persistence(#[source] anyhow::Error),

    #[error("backend request failed: {0:#}")]
    Transport(#[source] anyhow::Error),

    #[error("wizard state unavailable")]
    StateUnavailable,
}
