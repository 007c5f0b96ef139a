//! Pipeline components and the search-space overrides they accept.

use ap_types::{
    internal_error, ApResult, Condition, ConfigurationSpace, Hyperparameter, HyperparameterSearchSpace,
    HyperparameterType, Literal, UpdateError, ValueRange,
};
use std::collections::HashMap;
use std::fmt;

/// Static description of a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentProperties {
    pub shortname: &'static str,
    pub name: &'static str,
    pub handles_sparse: bool,
}

/// Search-space overrides received by a component, keyed by hyperparameter.
/// A newer override replaces an older one for the same hyperparameter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchSpaceOverrides {
    spaces: HashMap<String, HyperparameterSearchSpace>,
}

impl SearchSpaceOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, space: HyperparameterSearchSpace) {
        self.spaces.insert(space.hyperparameter.clone(), space);
    }

    pub fn get(&self, hyperparameter: &str) -> Option<&HyperparameterSearchSpace> {
        self.spaces.get(hyperparameter)
    }

    pub fn len(&self) -> usize {
        self.spaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spaces.is_empty()
    }
}

/// Per-hyperparameter search spaces after overrides were laid over the
/// component's defaults.
#[derive(Debug, Clone, Default)]
pub struct ResolvedSearchSpace {
    spaces: HashMap<String, HyperparameterSearchSpace>,
}

impl ResolvedSearchSpace {
    pub fn get(&self, hyperparameter: &str) -> ApResult<&HyperparameterSearchSpace> {
        self.spaces
            .get(hyperparameter)
            .ok_or_else(|| internal_error!("no search space declared for {}", hyperparameter))
    }

    /// Build the concrete hyperparameter for `name`.
    pub fn hyperparameter(&self, name: &str, kind: HyperparameterType) -> ApResult<Hyperparameter> {
        Ok(self.get(name)?.to_hyperparameter(kind)?)
    }
}

/// A pipeline component, seen only through its search space.
pub trait Component: fmt::Debug + Send {
    /// Name under which the component registers inside a choice.
    fn name(&self) -> &'static str;

    fn properties(&self) -> ComponentProperties;

    /// One entry per hyperparameter, as declared by the component.
    fn default_search_space(&self) -> Vec<HyperparameterSearchSpace>;

    fn overrides(&self) -> &SearchSpaceOverrides;

    fn overrides_mut(&mut self) -> &mut SearchSpaceOverrides;

    /// Assemble the component's configuration space, including its conditions.
    fn build_space(&self, spaces: &ResolvedSearchSpace) -> ApResult<ConfigurationSpace>;

    fn hyperparameter_names(&self) -> Vec<String> {
        self.default_search_space()
            .into_iter()
            .map(|space| space.hyperparameter)
            .collect()
    }

    /// Record an override for one of this component's hyperparameters.
    fn apply_override(
        &mut self,
        hyperparameter: &str,
        value_range: &ValueRange,
        log: bool,
        default_value: &Literal,
    ) -> ApResult<()> {
        let expected = self.hyperparameter_names();
        if !expected.iter().any(|name| name == hyperparameter) {
            return Err(UpdateError::UnknownHyperparameter {
                component: self.name().to_string(),
                expected,
                got: hyperparameter.to_string(),
            }
            .into());
        }
        self.overrides_mut().insert(HyperparameterSearchSpace::new(
            hyperparameter,
            value_range.clone(),
            default_value.clone(),
            log,
        ));
        Ok(())
    }

    fn resolved_search_space(&self) -> ResolvedSearchSpace {
        let spaces = self
            .default_search_space()
            .into_iter()
            .map(|default| {
                let space = self
                    .overrides()
                    .get(&default.hyperparameter)
                    .cloned()
                    .unwrap_or(default);
                (space.hyperparameter.clone(), space)
            })
            .collect();
        ResolvedSearchSpace { spaces }
    }

    fn hyperparameter_search_space(&self) -> ApResult<ConfigurationSpace> {
        self.build_space(&self.resolved_search_space())
    }
}

/// Add `child` active only while `parent` takes one of `values`.
///
/// Values an override removed from the parent's choices are dropped; if none
/// remain the child can never be active and is left out.
pub fn add_conditional_hyperparameter(
    cs: &mut ConfigurationSpace,
    child: Hyperparameter,
    parent: &Hyperparameter,
    values: &[Literal],
) -> ApResult<()> {
    let legal: Vec<Literal> = values.iter().filter(|v| parent.is_legal(v)).cloned().collect();
    if legal.is_empty() {
        return Ok(());
    }

    let condition = match legal.as_slice() {
        [value] => Condition::equals(child.name(), parent.name(), value.clone()),
        _ => Condition::in_values(child.name(), parent.name(), legal.clone()),
    };
    cs.add_hyperparameter(child)?;
    cs.add_condition(condition)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ap_types::{ApError, HyperparameterKind};

    #[derive(Debug, Default)]
    struct Scaler {
        overrides: SearchSpaceOverrides,
    }

    impl Component for Scaler {
        fn name(&self) -> &'static str {
            "Scaler"
        }

        fn properties(&self) -> ComponentProperties {
            ComponentProperties {
                shortname: "Scaler",
                name: "Test scaler",
                handles_sparse: false,
            }
        }

        fn default_search_space(&self) -> Vec<HyperparameterSearchSpace> {
            vec![
                HyperparameterSearchSpace::categorical("method", ["standard", "minmax"], "standard"),
                HyperparameterSearchSpace::numeric("clip", 1.0, 10.0, 5.0, false),
            ]
        }

        fn overrides(&self) -> &SearchSpaceOverrides {
            &self.overrides
        }

        fn overrides_mut(&mut self) -> &mut SearchSpaceOverrides {
            &mut self.overrides
        }

        fn build_space(&self, spaces: &ResolvedSearchSpace) -> ApResult<ConfigurationSpace> {
            let method = spaces.hyperparameter("method", HyperparameterType::Categorical)?;
            let clip = spaces.hyperparameter("clip", HyperparameterType::UniformFloat)?;
            let mut cs = ConfigurationSpace::new();
            cs.add_hyperparameter(method.clone())?;
            add_conditional_hyperparameter(&mut cs, clip, &method, &["minmax".into()])?;
            Ok(cs)
        }
    }

    #[test]
    fn test_rejects_unknown_hyperparameter() {
        let mut scaler = Scaler::default();
        let err = scaler
            .apply_override("scale", &ValueRange::numeric(0, 1), false, &Literal::Int(0))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Search space update error: Unknown hyperparameter for component Scaler. \
             Expected update hyperparameter to be in [method, clip] got scale"
        );
        assert!(scaler.overrides().is_empty());
    }

    #[test]
    fn test_later_override_replaces_earlier() {
        let mut scaler = Scaler::default();
        scaler
            .apply_override("clip", &ValueRange::numeric(1.0, 4.0), false, &Literal::Float(2.0))
            .unwrap();
        scaler
            .apply_override("clip", &ValueRange::numeric(2.0, 8.0), true, &Literal::Float(3.0))
            .unwrap();
        assert_eq!(scaler.overrides().len(), 1);

        let cs = scaler.hyperparameter_search_space().unwrap();
        assert_eq!(
            cs.get_hyperparameter("clip").unwrap().kind(),
            &HyperparameterKind::UniformFloat {
                lower: 2.0,
                upper: 8.0,
                default_value: 3.0,
                log: true
            }
        );
    }

    #[test]
    fn test_mismatched_override_fails_when_building() {
        let mut scaler = Scaler::default();
        scaler
            .apply_override("clip", &ValueRange::choices(["low", "high"]), false, &Literal::from("low"))
            .unwrap();
        assert!(matches!(
            scaler.hyperparameter_search_space(),
            Err(ApError::Space(_))
        ));
    }

    #[test]
    fn test_child_dropped_when_parent_value_removed() {
        let mut scaler = Scaler::default();
        scaler
            .apply_override("method", &ValueRange::choices(["standard"]), false, &Literal::from("standard"))
            .unwrap();
        let cs = scaler.hyperparameter_search_space().unwrap();
        assert_eq!(cs.hyperparameter_names(), vec!["method"]);
        assert!(cs.conditions().is_empty());
    }
}
