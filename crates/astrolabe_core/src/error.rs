use thiserror::Error;

/// Errors raised by the propagation core.
///
/// Budget exhaustion and unmet event conditions are not errors; they are
/// reported through the `condition_is_satisfied` / `execution_is_complete`
/// flags of the solutions.
#[derive(Debug, Error)]
pub enum Error {
    /// A required input is missing, undefined, or not part of the
    /// propagation it is looked up in.
    #[error("{0}")]
    UndefinedArgument(String),

    /// Malformed numerical solver settings.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An input is defined but not acceptable for this operation.
    #[error("{0}")]
    InvalidArgument(String),

    /// A coordinates subset is not registered with the broker in use.
    #[error("Coordinates subset [{name}] (size {size}) is not registered with the coordinates broker.")]
    UndefinedCoordinates { name: String, size: usize },

    /// A sequence of values is not in the required order.
    #[error("{0} are not in the required order.")]
    WrongOrder(String),

    /// A requested value lies outside the covered span.
    #[error("{what} [{value}] is out of range [{lower}, {upper}].")]
    OutOfRange {
        what: String,
        value: f64,
        lower: f64,
        upper: f64,
    },

    /// An operation needs data that is absent, or integration broke down.
    #[error("{0}")]
    Runtime(String),

    /// Failure reported by an external collaborator (frames, guidance laws).
    #[error("{context}: {source}")]
    Collaborator {
        context: String,
        #[source]
        source: anyhow::Error,
    },
}

impl Error {
    pub(crate) fn collaborator(context: impl Into<String>, source: anyhow::Error) -> Self {
        Error::Collaborator {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
