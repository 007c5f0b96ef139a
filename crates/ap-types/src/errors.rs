use thiserror::Error;

/// Main error type for the AutoPipe system
#[derive(Error, Debug)]
pub enum ApError {
    #[error("Literal error: {0}")]
    Literal(#[from] LiteralError),

    #[error("Search space error: {0}")]
    Space(#[from] SpaceError),

    #[error("Search space update error: {0}")]
    Update(#[from] UpdateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Errors raised while decoding a literal
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LiteralError {
    #[error("Unexpected end of input, expected {expected}")]
    UnexpectedEnd { expected: String },

    #[error("Unexpected character '{found}' at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },

    #[error("Malformed number '{text}'")]
    MalformedNumber { text: String },

    #[error("Unterminated string starting at offset {offset}")]
    UnterminatedString { offset: usize },

    #[error("Invalid escape sequence '\\{sequence}' at offset {offset}")]
    InvalidEscape { sequence: String, offset: usize },

    #[error("Unsupported literal '{text}'")]
    Unsupported { text: String },

    #[error("Literal nested deeper than {max} levels at offset {offset}")]
    TooDeep { max: usize, offset: usize },

    #[error("Trailing input '{rest}' after literal")]
    TrailingInput { rest: String },
}

/// Configuration-space construction errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpaceError {
    #[error("Hyperparameter {name}: lower bound {lower} must be smaller than upper bound {upper}")]
    InvalidBounds {
        name: String,
        lower: String,
        upper: String,
    },

    #[error("Hyperparameter {name}: default value {default} is outside [{lower}, {upper}]")]
    DefaultOutOfBounds {
        name: String,
        default: String,
        lower: String,
        upper: String,
    },

    #[error("Hyperparameter {name}: bounds [{lower}, {upper}] must be finite with a finite span")]
    NonFiniteBounds {
        name: String,
        lower: String,
        upper: String,
    },

    #[error("Hyperparameter {name}: log scale requires a positive lower bound, got {lower}")]
    NonPositiveLogBound { name: String, lower: String },

    #[error("Hyperparameter {name}: categorical choices must not be empty")]
    EmptyChoices { name: String },

    #[error("Hyperparameter {name}: default value {default} is not one of {choices}")]
    DefaultNotAChoice {
        name: String,
        default: String,
        choices: String,
    },

    #[error("Hyperparameter {name}: value range {range} is not a valid {expected} range")]
    RangeTypeMismatch {
        name: String,
        range: String,
        expected: String,
    },

    #[error("Hyperparameter {name}: default value {default} does not match {expected} range")]
    DefaultTypeMismatch {
        name: String,
        default: String,
        expected: String,
    },

    #[error("Hyperparameter {name}: log scale is only meaningful for numerical hyperparameters")]
    LogOnCategorical { name: String },

    #[error("Hyperparameter {name} already exists in the configuration space")]
    DuplicateHyperparameter { name: String },

    #[error("Hyperparameter {name} not found in the configuration space")]
    UnknownHyperparameter { name: String },

    #[error("Condition on {child}: value {value} is not legal for parent {parent}")]
    IllegalConditionValue {
        child: String,
        parent: String,
        value: String,
    },
}

/// Errors raised while applying, parsing or persisting search-space updates
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UpdateError {
    #[error(
        "Unknown hyperparameter for component {component}. Expected update hyperparameter to be in [{}] got {got}",
        .expected.join(", ")
    )]
    UnknownHyperparameter {
        component: String,
        expected: Vec<String>,
        got: String,
    },

    #[error("Unknown component for choice {choice}. Expected one of [{}] got {got}", .expected.join(", "))]
    UnknownComponent {
        choice: String,
        expected: Vec<String>,
        got: String,
    },

    #[error("Malformed search space update at line {line}: {message}")]
    MalformedLine { line: usize, message: String },

    #[error("Value range at line {line} must be a tuple or list, got {found}")]
    RangeNotSequence { line: usize, found: String },
}

/// Result type alias for AutoPipe operations
pub type ApResult<T> = Result<T, ApError>;

/// Macro for creating validation errors
#[macro_export]
macro_rules! validation_error {
    ($($arg:tt)*) => {
        $crate::ApError::Validation(format!($($arg)*))
    };
}

/// Macro for creating internal errors
#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)*) => {
        $crate::ApError::Internal(format!($($arg)*))
    };
}

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::ApError::Config(format!($($arg)*))
    };
}
