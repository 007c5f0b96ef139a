//! Configuration spaces: named hyperparameters plus activation conditions.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::errors::SpaceError;
use crate::hyperparameter::{Hyperparameter, HyperparameterKind};
use crate::literal::Literal;

/// Activates `child` only for certain values of `parent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    Equals {
        child: String,
        parent: String,
        value: Literal,
    },
    In {
        child: String,
        parent: String,
        values: Vec<Literal>,
    },
}

impl Condition {
    pub fn equals(child: impl Into<String>, parent: impl Into<String>, value: impl Into<Literal>) -> Self {
        Self::Equals {
            child: child.into(),
            parent: parent.into(),
            value: value.into(),
        }
    }

    pub fn in_values<I, T>(child: impl Into<String>, parent: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Literal>,
    {
        Self::In {
            child: child.into(),
            parent: parent.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn child(&self) -> &str {
        match self {
            Self::Equals { child, .. } | Self::In { child, .. } => child,
        }
    }

    pub fn parent(&self) -> &str {
        match self {
            Self::Equals { parent, .. } | Self::In { parent, .. } => parent,
        }
    }

    fn values(&self) -> &[Literal] {
        match self {
            Self::Equals { value, .. } => std::slice::from_ref(value),
            Self::In { values, .. } => values,
        }
    }

    pub fn is_satisfied_by(&self, parent_value: &Literal) -> bool {
        self.values().contains(parent_value)
    }

    fn prefixed(&self, prefix: &str) -> Self {
        match self {
            Self::Equals {
                child,
                parent,
                value,
            } => Self::Equals {
                child: format!("{prefix}:{child}"),
                parent: format!("{prefix}:{parent}"),
                value: value.clone(),
            },
            Self::In {
                child,
                parent,
                values,
            } => Self::In {
                child: format!("{prefix}:{child}"),
                parent: format!("{prefix}:{parent}"),
                values: values.clone(),
            },
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals {
                child,
                parent,
                value,
            } => write!(f, "{child} | {parent} == {value}"),
            Self::In {
                child,
                parent,
                values,
            } => {
                let values: Vec<String> = values.iter().map(Literal::to_string).collect();
                write!(f, "{child} | {parent} in {{{}}}", values.join(", "))
            }
        }
    }
}

/// One assignment of values to the active hyperparameters of a space.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    values: BTreeMap<String, Literal>,
}

impl Configuration {
    pub fn get(&self, name: &str) -> Option<&Literal> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Literal)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// An ordered set of hyperparameters with conditions between them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationSpace {
    hyperparameters: Vec<Hyperparameter>,
    conditions: Vec<Condition>,
}

impl ConfigurationSpace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_hyperparameter(&mut self, hyperparameter: Hyperparameter) -> Result<(), SpaceError> {
        if self.contains(hyperparameter.name()) {
            return Err(SpaceError::DuplicateHyperparameter {
                name: hyperparameter.name().to_string(),
            });
        }
        self.hyperparameters.push(hyperparameter);
        Ok(())
    }

    pub fn add_hyperparameters(
        &mut self,
        hyperparameters: impl IntoIterator<Item = Hyperparameter>,
    ) -> Result<(), SpaceError> {
        for hyperparameter in hyperparameters {
            self.add_hyperparameter(hyperparameter)?;
        }
        Ok(())
    }

    /// Both ends must exist and every condition value must be legal for the parent.
    pub fn add_condition(&mut self, condition: Condition) -> Result<(), SpaceError> {
        if !self.contains(condition.child()) {
            return Err(SpaceError::UnknownHyperparameter {
                name: condition.child().to_string(),
            });
        }
        let parent = self
            .get_hyperparameter(condition.parent())
            .ok_or_else(|| SpaceError::UnknownHyperparameter {
                name: condition.parent().to_string(),
            })?;
        if let Some(illegal) = condition.values().iter().find(|v| !parent.is_legal(v)) {
            return Err(SpaceError::IllegalConditionValue {
                child: condition.child().to_string(),
                parent: condition.parent().to_string(),
                value: illegal.to_string(),
            });
        }
        self.conditions.push(condition);
        Ok(())
    }

    pub fn add_conditions(&mut self, conditions: impl IntoIterator<Item = Condition>) -> Result<(), SpaceError> {
        for condition in conditions {
            self.add_condition(condition)?;
        }
        Ok(())
    }

    /// Merge `other` under `prefix:`. With a `parent`, every top-level
    /// hyperparameter of `other` (one without a condition of its own) is
    /// activated only when the parent takes the given value.
    pub fn add_configuration_space(
        &mut self,
        prefix: &str,
        other: &ConfigurationSpace,
        parent: Option<(&str, Literal)>,
    ) -> Result<(), SpaceError> {
        for hyperparameter in &other.hyperparameters {
            self.add_hyperparameter(hyperparameter.prefixed(prefix))?;
        }
        for condition in &other.conditions {
            self.add_condition(condition.prefixed(prefix))?;
        }
        if let Some((parent_name, value)) = parent {
            for hyperparameter in &other.hyperparameters {
                if other.conditions_on(hyperparameter.name()).next().is_some() {
                    continue;
                }
                self.add_condition(Condition::Equals {
                    child: format!("{prefix}:{}", hyperparameter.name()),
                    parent: parent_name.to_string(),
                    value: value.clone(),
                })?;
            }
        }
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get_hyperparameter(name).is_some()
    }

    pub fn get_hyperparameter(&self, name: &str) -> Option<&Hyperparameter> {
        self.hyperparameters.iter().find(|hp| hp.name() == name)
    }

    pub fn hyperparameters(&self) -> &[Hyperparameter] {
        &self.hyperparameters
    }

    pub fn hyperparameter_names(&self) -> Vec<&str> {
        self.hyperparameters.iter().map(Hyperparameter::name).collect()
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn len(&self) -> usize {
        self.hyperparameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hyperparameters.is_empty()
    }

    fn conditions_on<'a>(&'a self, child: &'a str) -> impl Iterator<Item = &'a Condition> + 'a {
        self.conditions.iter().filter(move |c| c.child() == child)
    }

    /// A hyperparameter is active when every condition on it is satisfied
    /// by the value its parent takes in `configuration`.
    pub fn is_active(&self, name: &str, configuration: &Configuration) -> bool {
        self.conditions_on(name).all(|condition| {
            configuration
                .get(condition.parent())
                .is_some_and(|value| condition.is_satisfied_by(value))
        })
    }

    pub fn default_configuration(&self) -> Configuration {
        self.resolve(|hp| hp.default_value())
    }

    /// Draw one configuration; log-scale hyperparameters are sampled
    /// uniformly in log-space.
    pub fn sample_configuration<R: Rng>(&self, rng: &mut R) -> Configuration {
        self.resolve(|hp| sample_value(hp, &mut *rng))
    }

    /// Assign values parent-first; inactive hyperparameters are left out.
    fn resolve(&self, mut pick: impl FnMut(&Hyperparameter) -> Literal) -> Configuration {
        let mut configuration = Configuration::default();
        let mut decided: HashSet<&str> = HashSet::new();

        loop {
            let mut progress = false;
            for hyperparameter in &self.hyperparameters {
                let name = hyperparameter.name();
                if decided.contains(name) {
                    continue;
                }
                if self
                    .conditions_on(name)
                    .any(|condition| !decided.contains(condition.parent()))
                {
                    continue;
                }
                decided.insert(name);
                progress = true;
                if self.is_active(name, &configuration) {
                    configuration.values.insert(name.to_string(), pick(hyperparameter));
                }
            }
            if !progress {
                break;
            }
        }

        configuration
    }
}

fn sample_value<R: Rng>(hyperparameter: &Hyperparameter, rng: &mut R) -> Literal {
    match hyperparameter.kind() {
        HyperparameterKind::UniformFloat {
            lower, upper, log, ..
        } => {
            let value = if *log {
                let log_val: f64 = rng.random_range(lower.ln()..=upper.ln());
                log_val.exp().clamp(*lower, *upper)
            } else {
                rng.random_range(*lower..=*upper)
            };
            Literal::Float(value)
        }
        HyperparameterKind::UniformInteger {
            lower, upper, log, ..
        } => {
            let value = if *log {
                let log_val: f64 = rng.random_range((*lower as f64).ln()..=(*upper as f64).ln());
                (log_val.exp().round() as i64).clamp(*lower, *upper)
            } else {
                rng.random_range(*lower..=*upper)
            };
            Literal::Int(value)
        }
        HyperparameterKind::Categorical { choices, .. } => {
            let idx = rng.random_range(0..choices.len());
            choices[idx].clone()
        }
    }
}
