//! Error taxonomy for the fleet loading solver.

use std::fmt;

#[derive(Debug)]
pub enum SolverError {
    /// Non-positive capacity or demand, duplicate ids, empty fleet.
    InvalidInput {
        reason: String,
    },
    /// Illegal colony parameters, reported before any iteration runs.
    ConfigError {
        parameter: &'static str,
        reason: String,
    },
    /// A single ant could not place a shipment on any vehicle.
    InfeasibleAssignment {
        shipment: String,
    },
    /// Internal inconsistency. Always a bug, never a user error.
    InvariantViolation {
        reason: String,
    },
    /// The run completed without any ant producing a feasible assignment.
    NoFeasibleSolution {
        iterations: usize,
    },
    Io(std::io::Error),
    Parse {
        reason: String,
    },
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverError::InvalidInput { reason } => write!(f, "Invalid input: {}", reason),
            SolverError::ConfigError { parameter, reason } => {
                write!(f, "Invalid configuration for '{}': {}", parameter, reason)
            }
            SolverError::InfeasibleAssignment { shipment } => write!(
                f,
                "Shipment '{}' does not fit in any available vehicle",
                shipment
            ),
            SolverError::InvariantViolation { reason } => {
                write!(f, "Invariant violation: {}", reason)
            }
            SolverError::NoFeasibleSolution { iterations } => write!(
                f,
                "No feasible solution found after {} iterations",
                iterations
            ),
            SolverError::Io(e) => write!(f, "I/O error: {}", e),
            SolverError::Parse { reason } => write!(f, "Parse error: {}", reason),
        }
    }
}

impl std::error::Error for SolverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SolverError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SolverError {
    fn from(e: std::io::Error) -> Self {
        SolverError::Io(e)
    }
}

impl From<serde_json::Error> for SolverError {
    fn from(e: serde_json::Error) -> Self {
        SolverError::Parse {
            reason: e.to_string(),
        }
    }
}

impl From<csv::Error> for SolverError {
    fn from(e: csv::Error) -> Self {
        SolverError::Parse {
            reason: e.to_string(),
        }
    }
}

impl SolverError {
    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        SolverError::InvalidInput {
            reason: reason.into(),
        }
    }

    pub(crate) fn config(parameter: &'static str, reason: impl Into<String>) -> Self {
        SolverError::ConfigError {
            parameter,
            reason: reason.into(),
        }
    }

    pub(crate) fn invariant(reason: impl Into<String>) -> Self {
        SolverError::InvariantViolation {
            reason: reason.into(),
        }
    }
}

pub type SolverResult<T> = std::result::Result<T, SolverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = SolverError::config("decay", "must lie in [0, 1), got 1.5");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for 'decay': must lie in [0, 1), got 1.5"
        );

        let err = SolverError::NoFeasibleSolution { iterations: 0 };
        assert!(err.to_string().contains("0 iterations"));
    }

    #[test]
    fn test_io_error_has_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: SolverError = io.into();
        assert!(std::error::Error::source(&err).is_some());
    }
}
