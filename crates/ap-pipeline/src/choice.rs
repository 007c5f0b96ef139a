//! Stages that pick one of several interchangeable components.

use ap_types::{ApResult, ConfigurationSpace, HyperparameterSearchSpace, Literal, UpdateError, ValueRange};
use tracing::debug;

use crate::component::Component;

/// Hyperparameter that selects the active component of a choice.
pub const CHOICE_HYPERPARAMETER: &str = "__choice__";

/// A named set of components of which exactly one is active.
///
/// Its configuration space holds a `__choice__` categorical and every
/// component's space under `Component:`, conditioned on the choice.
#[derive(Debug)]
pub struct ComponentChoice {
    name: String,
    components: Vec<Box<dyn Component>>,
    default_component: Option<String>,
    choice_override: Option<HyperparameterSearchSpace>,
}

impl ComponentChoice {
    pub fn new(name: impl Into<String>, components: Vec<Box<dyn Component>>) -> Self {
        Self {
            name: name.into(),
            components,
            default_component: None,
            choice_override: None,
        }
    }

    pub fn with_default(mut self, component: impl Into<String>) -> Self {
        self.default_component = Some(component.into());
        self
    }

    /// Keep only the listed components.
    pub fn with_include(mut self, include: &[String]) -> ApResult<Self> {
        self.check_known(include)?;
        self.components.retain(|c| include.iter().any(|name| name == c.name()));
        Ok(self)
    }

    /// Drop the listed components.
    pub fn with_exclude(mut self, exclude: &[String]) -> ApResult<Self> {
        self.check_known(exclude)?;
        self.components.retain(|c| !exclude.iter().any(|name| name == c.name()));
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn component_names(&self) -> Vec<&str> {
        self.components.iter().map(|c| c.name()).collect()
    }

    pub fn component(&self, name: &str) -> Option<&dyn Component> {
        self.components.iter().find(|c| c.name() == name).map(|c| c.as_ref())
    }

    fn check_known(&self, names: &[String]) -> ApResult<()> {
        match names.iter().find(|name| self.component(name).is_none()) {
            Some(unknown) => Err(UpdateError::UnknownComponent {
                choice: self.name.clone(),
                expected: self.component_names().iter().map(|s| s.to_string()).collect(),
                got: unknown.clone(),
            }
            .into()),
            None => Ok(()),
        }
    }

    /// `__choice__` or `Component:hyperparameter` for every component.
    pub fn hyperparameter_names(&self) -> Vec<String> {
        std::iter::once(CHOICE_HYPERPARAMETER.to_string())
            .chain(self.components.iter().flat_map(|c| {
                c.hyperparameter_names()
                    .into_iter()
                    .map(move |hp| format!("{}:{hp}", c.name()))
            }))
            .collect()
    }

    /// Route an update to the choice itself or to the named component.
    pub fn apply_update(
        &mut self,
        hyperparameter: &str,
        value_range: &ValueRange,
        log: bool,
        default_value: &Literal,
    ) -> ApResult<()> {
        if hyperparameter == CHOICE_HYPERPARAMETER {
            let names: Vec<String> = value_range
                .iter()
                .map(|choice| choice.as_str().map(str::to_string).unwrap_or_else(|| choice.to_string()))
                .collect();
            self.check_known(&names)?;
            self.choice_override = Some(HyperparameterSearchSpace::new(
                hyperparameter,
                value_range.clone(),
                default_value.clone(),
                log,
            ));
            return Ok(());
        }

        let target = hyperparameter
            .split_once(':')
            .and_then(|(component, rest)| {
                self.components
                    .iter_mut()
                    .find(|c| c.name() == component)
                    .map(|c| (c, rest))
            });
        match target {
            Some((component, rest)) => {
                debug!("Routing update of {} in {} to {}", rest, self.name, component.name());
                component.apply_override(rest, value_range, log, default_value)
            }
            None => Err(UpdateError::UnknownHyperparameter {
                component: self.name.clone(),
                expected: self.hyperparameter_names(),
                got: hyperparameter.to_string(),
            }
            .into()),
        }
    }

    /// Components still selectable after a `__choice__` update, and the default one.
    fn choice_search_space(&self) -> HyperparameterSearchSpace {
        if let Some(space) = &self.choice_override {
            return space.clone();
        }
        let names = self.component_names();
        let default = self
            .default_component
            .as_deref()
            .filter(|d| names.contains(d))
            .or_else(|| names.first().copied())
            .unwrap_or_default();
        HyperparameterSearchSpace::categorical(CHOICE_HYPERPARAMETER, names.iter().copied(), default)
    }

    pub fn hyperparameter_search_space(&self) -> ApResult<ConfigurationSpace> {
        let choice = self.choice_search_space().to_categorical()?;
        let mut cs = ConfigurationSpace::new();
        cs.add_hyperparameter(choice.clone())?;

        for component in &self.components {
            let value = Literal::from(component.name());
            if !choice.is_legal(&value) {
                continue;
            }
            let sub_space = component.hyperparameter_search_space()?;
            cs.add_configuration_space(component.name(), &sub_space, Some((CHOICE_HYPERPARAMETER, value)))?;
        }
        Ok(cs)
    }
}
