use std::fmt;

/// Errors that stop a simulation run.
///
/// Numeric problems never surface here: the model substitutes defaults and
/// sentinels instead. Only run control, study lookup and sensitivity problem
/// definitions can fail.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// The run was cancelled or its deadline expired
    Cancelled,
    /// No study with this identifier exists in the registry
    UnknownStudy(String),
    Problem(ProblemError),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::Cancelled => write!(f, "simulation cancelled"),
            SimulationError::UnknownStudy(id) => write!(f, "unknown study '{id}'"),
            SimulationError::Problem(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulationError::Problem(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ProblemError> for SimulationError {
    fn from(e: ProblemError) -> Self {
        SimulationError::Problem(e)
    }
}

/// Errors in the definition of a sensitivity problem
#[derive(Debug, Clone, PartialEq)]
pub enum ProblemError {
    NoParameters,
    TooManyParameters { count: usize, max: usize },
    InvalidBounds {
        name: String,
        lower: f64,
        upper: f64,
    },
    NoSamples,
}

impl fmt::Display for ProblemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProblemError::NoParameters => write!(f, "sensitivity problem has no parameters"),
            ProblemError::TooManyParameters { count, max } => {
                write!(f, "sensitivity problem has {count} parameters (max {max})")
            }
            ProblemError::InvalidBounds { name, lower, upper } => {
                write!(f, "invalid bounds for {name}: [{lower}, {upper}]")
            }
            ProblemError::NoSamples => write!(f, "sample size must be positive"),
        }
    }
}

impl std::error::Error for ProblemError {}

pub type Result<T> = std::result::Result<T, SimulationError>;
