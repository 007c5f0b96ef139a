//! A single search-space override and the stage capability it targets.

use ap_types::{ApResult, HyperparameterSearchSpace, Literal, ValueRange};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::parser;

/// Implemented by every pipeline stage that exposes a tunable search space.
pub trait AcceptsSearchSpaceUpdate {
    /// Override the domain of `hyperparameter`. Stages reject names they do
    /// not expose with `UpdateError::UnknownHyperparameter`.
    fn apply_search_space_update(
        &mut self,
        hyperparameter: &str,
        value_range: &ValueRange,
        log: bool,
        default_value: &Literal,
    ) -> ApResult<()>;
}

impl<T: AcceptsSearchSpaceUpdate + ?Sized> AcceptsSearchSpaceUpdate for Box<T> {
    fn apply_search_space_update(
        &mut self,
        hyperparameter: &str,
        value_range: &ValueRange,
        log: bool,
        default_value: &Literal,
    ) -> ApResult<()> {
        (**self).apply_search_space_update(hyperparameter, value_range, log, default_value)
    }
}

/// Override of one hyperparameter of one named pipeline stage.
///
/// Nothing is validated on construction; the receiving stage checks the
/// hyperparameter name and the consistency of range and default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpaceUpdate {
    stage_name: String,
    hyperparameter: String,
    value_range: ValueRange,
    default_value: Literal,
    log: bool,
}

impl SearchSpaceUpdate {
    pub fn new(
        stage_name: impl Into<String>,
        hyperparameter: impl Into<String>,
        value_range: ValueRange,
        default_value: impl Into<Literal>,
        log: bool,
    ) -> Self {
        Self {
            stage_name: stage_name.into(),
            hyperparameter: hyperparameter.into(),
            value_range,
            default_value: default_value.into(),
            log,
        }
    }

    pub fn stage_name(&self) -> &str {
        &self.stage_name
    }

    pub fn hyperparameter(&self) -> &str {
        &self.hyperparameter
    }

    pub fn value_range(&self) -> &ValueRange {
        &self.value_range
    }

    pub fn default_value(&self) -> &Literal {
        &self.default_value
    }

    pub fn log(&self) -> bool {
        self.log
    }

    /// The override as the stage stores it.
    pub fn to_search_space(&self) -> HyperparameterSearchSpace {
        HyperparameterSearchSpace::new(
            self.hyperparameter.clone(),
            self.value_range.clone(),
            self.default_value.clone(),
            self.log,
        )
    }

    /// Hand the override to every stage named `stage_name`. Stages with
    /// other names are untouched, so one update set can serve pipelines
    /// that do not contain every stage.
    pub fn apply<S: AcceptsSearchSpaceUpdate>(&self, stages: &mut [(String, S)]) -> ApResult<()> {
        let mut matched = 0usize;
        for (_, stage) in stages.iter_mut().filter(|(name, _)| *name == self.stage_name) {
            stage.apply_search_space_update(
                &self.hyperparameter,
                &self.value_range,
                self.log,
                &self.default_value,
            )?;
            matched += 1;
        }

        if matched == 0 {
            debug!("No stage named {} in pipeline, skipping update of {}", self.stage_name, self.hyperparameter);
        } else {
            debug!("Applied search space update {}:{}", self.stage_name, self.hyperparameter);
        }
        Ok(())
    }
}

/// One line of the update file: `stage hyperparameter range default[ log]`.
impl fmt::Display for SearchSpaceUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.stage_name, self.hyperparameter, self.value_range, self.default_value
        )?;
        if self.log {
            f.write_str(" log")?;
        }
        Ok(())
    }
}

impl FromStr for SearchSpaceUpdate {
    type Err = ap_types::UpdateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parser::parse_line(s, 1)?.ok_or(ap_types::UpdateError::MalformedLine {
            line: 1,
            message: "empty line".to_string(),
        })
    }
}
