//! Hyperparameter definitions and their declarative search-space form.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::SpaceError;
use crate::literal::{Literal, ValueRange};

/// A single dimension of a configuration space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameter {
    name: String,
    kind: HyperparameterKind,
}

/// Domain and default of a hyperparameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HyperparameterKind {
    /// Continuous range [lower, upper].
    UniformFloat {
        lower: f64,
        upper: f64,
        default_value: f64,
        log: bool,
    },
    /// Integer range [lower, upper] inclusive.
    UniformInteger {
        lower: i64,
        upper: i64,
        default_value: i64,
        log: bool,
    },
    /// Categorical choices.
    Categorical {
        choices: Vec<Literal>,
        default_value: Literal,
    },
}

impl Hyperparameter {
    pub fn uniform_float(
        name: impl Into<String>,
        lower: f64,
        upper: f64,
        default_value: f64,
        log: bool,
    ) -> Result<Self, SpaceError> {
        let name = name.into();
        if !(upper - lower).is_finite() {
            return Err(SpaceError::NonFiniteBounds {
                name,
                lower: Literal::Float(lower).to_string(),
                upper: Literal::Float(upper).to_string(),
            });
        }
        if !(lower < upper) {
            return Err(SpaceError::InvalidBounds {
                name,
                lower: Literal::Float(lower).to_string(),
                upper: Literal::Float(upper).to_string(),
            });
        }
        if log && lower <= 0.0 {
            return Err(SpaceError::NonPositiveLogBound {
                name,
                lower: Literal::Float(lower).to_string(),
            });
        }
        // sampling draws uniformly from [ln lower, ln upper]
        if log && !(upper.ln() - lower.ln()).is_finite() {
            return Err(SpaceError::NonFiniteBounds {
                name,
                lower: Literal::Float(lower).to_string(),
                upper: Literal::Float(upper).to_string(),
            });
        }
        if !(lower..=upper).contains(&default_value) {
            return Err(SpaceError::DefaultOutOfBounds {
                name,
                default: Literal::Float(default_value).to_string(),
                lower: Literal::Float(lower).to_string(),
                upper: Literal::Float(upper).to_string(),
            });
        }
        Ok(Self {
            name,
            kind: HyperparameterKind::UniformFloat {
                lower,
                upper,
                default_value,
                log,
            },
        })
    }

    pub fn uniform_integer(
        name: impl Into<String>,
        lower: i64,
        upper: i64,
        default_value: i64,
        log: bool,
    ) -> Result<Self, SpaceError> {
        let name = name.into();
        if lower >= upper {
            return Err(SpaceError::InvalidBounds {
                name,
                lower: lower.to_string(),
                upper: upper.to_string(),
            });
        }
        if log && lower <= 0 {
            return Err(SpaceError::NonPositiveLogBound {
                name,
                lower: lower.to_string(),
            });
        }
        if !(lower..=upper).contains(&default_value) {
            return Err(SpaceError::DefaultOutOfBounds {
                name,
                default: default_value.to_string(),
                lower: lower.to_string(),
                upper: upper.to_string(),
            });
        }
        Ok(Self {
            name,
            kind: HyperparameterKind::UniformInteger {
                lower,
                upper,
                default_value,
                log,
            },
        })
    }

    pub fn categorical(
        name: impl Into<String>,
        choices: Vec<Literal>,
        default_value: Literal,
    ) -> Result<Self, SpaceError> {
        let name = name.into();
        if choices.is_empty() {
            return Err(SpaceError::EmptyChoices { name });
        }
        if !choices.contains(&default_value) {
            return Err(SpaceError::DefaultNotAChoice {
                name,
                default: default_value.to_string(),
                choices: Literal::Tuple(choices).to_string(),
            });
        }
        Ok(Self {
            name,
            kind: HyperparameterKind::Categorical {
                choices,
                default_value,
            },
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &HyperparameterKind {
        &self.kind
    }

    /// Same hyperparameter under `prefix:name`.
    pub fn prefixed(&self, prefix: &str) -> Self {
        Self {
            name: format!("{prefix}:{}", self.name),
            kind: self.kind.clone(),
        }
    }

    pub fn default_value(&self) -> Literal {
        match &self.kind {
            HyperparameterKind::UniformFloat { default_value, .. } => Literal::Float(*default_value),
            HyperparameterKind::UniformInteger { default_value, .. } => Literal::Int(*default_value),
            HyperparameterKind::Categorical { default_value, .. } => default_value.clone(),
        }
    }

    /// Lower bound of a numerical hyperparameter.
    pub fn lower(&self) -> Option<f64> {
        match self.kind {
            HyperparameterKind::UniformFloat { lower, .. } => Some(lower),
            HyperparameterKind::UniformInteger { lower, .. } => Some(lower as f64),
            HyperparameterKind::Categorical { .. } => None,
        }
    }

    /// Upper bound of a numerical hyperparameter.
    pub fn upper(&self) -> Option<f64> {
        match self.kind {
            HyperparameterKind::UniformFloat { upper, .. } => Some(upper),
            HyperparameterKind::UniformInteger { upper, .. } => Some(upper as f64),
            HyperparameterKind::Categorical { .. } => None,
        }
    }

    pub fn is_log(&self) -> bool {
        match self.kind {
            HyperparameterKind::UniformFloat { log, .. } => log,
            HyperparameterKind::UniformInteger { log, .. } => log,
            HyperparameterKind::Categorical { .. } => false,
        }
    }

    pub fn choices(&self) -> Option<&[Literal]> {
        match &self.kind {
            HyperparameterKind::Categorical { choices, .. } => Some(choices),
            _ => None,
        }
    }

    /// Whether `value` lies in this hyperparameter's domain.
    pub fn is_legal(&self, value: &Literal) -> bool {
        match &self.kind {
            HyperparameterKind::UniformFloat { lower, upper, .. } => value
                .as_f64()
                .is_some_and(|v| (*lower..=*upper).contains(&v)),
            HyperparameterKind::UniformInteger { lower, upper, .. } => match value {
                Literal::Int(v) => (*lower..=*upper).contains(v),
                _ => false,
            },
            HyperparameterKind::Categorical { choices, .. } => choices.contains(value),
        }
    }
}

impl fmt::Display for Hyperparameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            HyperparameterKind::UniformFloat {
                lower,
                upper,
                default_value,
                log,
            } => {
                write!(
                    f,
                    "{}, Type: UniformFloat, Range: [{}, {}], Default: {}",
                    self.name,
                    Literal::Float(*lower),
                    Literal::Float(*upper),
                    Literal::Float(*default_value)
                )?;
                if *log {
                    f.write_str(", on log-scale")?;
                }
                Ok(())
            }
            HyperparameterKind::UniformInteger {
                lower,
                upper,
                default_value,
                log,
            } => {
                write!(
                    f,
                    "{}, Type: UniformInteger, Range: [{lower}, {upper}], Default: {default_value}",
                    self.name
                )?;
                if *log {
                    f.write_str(", on log-scale")?;
                }
                Ok(())
            }
            HyperparameterKind::Categorical {
                choices,
                default_value,
            } => {
                let rendered: Vec<String> = choices.iter().map(ToString::to_string).collect();
                write!(
                    f,
                    "{}, Type: Categorical, Choices: {{{}}}, Default: {default_value}",
                    self.name,
                    rendered.join(", ")
                )
            }
        }
    }
}

/// Which concrete hyperparameter a search space should become.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HyperparameterType {
    UniformFloat,
    UniformInteger,
    Categorical,
}

impl fmt::Display for HyperparameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UniformFloat => "float",
            Self::UniformInteger => "integer",
            Self::Categorical => "categorical",
        };
        f.write_str(name)
    }
}

/// Declarative description of one hyperparameter's domain, as a component
/// declares it by default or as a search-space update overrides it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperparameterSearchSpace {
    pub hyperparameter: String,
    pub value_range: ValueRange,
    pub default_value: Literal,
    pub log: bool,
}

impl HyperparameterSearchSpace {
    pub fn new(
        hyperparameter: impl Into<String>,
        value_range: ValueRange,
        default_value: impl Into<Literal>,
        log: bool,
    ) -> Self {
        Self {
            hyperparameter: hyperparameter.into(),
            value_range,
            default_value: default_value.into(),
            log,
        }
    }

    /// `(lower, upper)` numerical domain.
    pub fn numeric(
        hyperparameter: impl Into<String>,
        lower: impl Into<Literal>,
        upper: impl Into<Literal>,
        default_value: impl Into<Literal>,
        log: bool,
    ) -> Self {
        Self::new(hyperparameter, ValueRange::numeric(lower, upper), default_value, log)
    }

    pub fn categorical<I, T>(hyperparameter: impl Into<String>, choices: I, default_value: impl Into<Literal>) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Literal>,
    {
        Self::new(hyperparameter, ValueRange::choices(choices), default_value, false)
    }

    /// Build the concrete hyperparameter, checking that range and default
    /// agree with the requested type.
    pub fn to_hyperparameter(&self, kind: HyperparameterType) -> Result<Hyperparameter, SpaceError> {
        match kind {
            HyperparameterType::UniformFloat => self.to_float(),
            HyperparameterType::UniformInteger => self.to_integer(),
            HyperparameterType::Categorical => self.to_categorical(),
        }
    }

    pub fn to_float(&self) -> Result<Hyperparameter, SpaceError> {
        let (lower, upper) = self.numeric_bounds(HyperparameterType::UniformFloat, Literal::as_f64)?;
        let default_value = self
            .default_value
            .as_f64()
            .ok_or_else(|| self.default_mismatch(HyperparameterType::UniformFloat))?;
        Hyperparameter::uniform_float(&self.hyperparameter, lower, upper, default_value, self.log)
    }

    pub fn to_integer(&self) -> Result<Hyperparameter, SpaceError> {
        let (lower, upper) = self.numeric_bounds(HyperparameterType::UniformInteger, Literal::as_i64)?;
        let default_value = self
            .default_value
            .as_i64()
            .ok_or_else(|| self.default_mismatch(HyperparameterType::UniformInteger))?;
        Hyperparameter::uniform_integer(&self.hyperparameter, lower, upper, default_value, self.log)
    }

    pub fn to_categorical(&self) -> Result<Hyperparameter, SpaceError> {
        if self.log {
            return Err(SpaceError::LogOnCategorical {
                name: self.hyperparameter.clone(),
            });
        }
        Hyperparameter::categorical(
            &self.hyperparameter,
            self.value_range.items().to_vec(),
            self.default_value.clone(),
        )
    }

    fn numeric_bounds<T>(
        &self,
        kind: HyperparameterType,
        convert: impl Fn(&Literal) -> Option<T>,
    ) -> Result<(T, T), SpaceError> {
        self.value_range
            .bounds()
            .and_then(|(lower, upper)| Some((convert(lower)?, convert(upper)?)))
            .ok_or_else(|| SpaceError::RangeTypeMismatch {
                name: self.hyperparameter.clone(),
                range: self.value_range.to_string(),
                expected: kind.to_string(),
            })
    }

    fn default_mismatch(&self, kind: HyperparameterType) -> SpaceError {
        SpaceError::DefaultTypeMismatch {
            name: self.hyperparameter.clone(),
            default: self.default_value.to_string(),
            expected: kind.to_string(),
        }
    }
}
