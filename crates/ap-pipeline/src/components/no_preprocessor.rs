use ap_types::{ApResult, ConfigurationSpace, HyperparameterSearchSpace};

use crate::component::{Component, ComponentProperties, ResolvedSearchSpace, SearchSpaceOverrides};

/// Leaves the features untouched; has no hyperparameters.
#[derive(Debug, Clone, Default)]
pub struct NoFeaturePreprocessor {
    overrides: SearchSpaceOverrides,
}

impl NoFeaturePreprocessor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Component for NoFeaturePreprocessor {
    fn name(&self) -> &'static str {
        "NoFeaturePreprocessor"
    }

    fn properties(&self) -> ComponentProperties {
        ComponentProperties {
            shortname: "NoFeaturePreprocessing",
            name: "No Feature Preprocessing",
            handles_sparse: true,
        }
    }

    fn default_search_space(&self) -> Vec<HyperparameterSearchSpace> {
        Vec::new()
    }

    fn overrides(&self) -> &SearchSpaceOverrides {
        &self.overrides
    }

    fn overrides_mut(&mut self) -> &mut SearchSpaceOverrides {
        &mut self.overrides
    }

    fn build_space(&self, _spaces: &ResolvedSearchSpace) -> ApResult<ConfigurationSpace> {
        Ok(ConfigurationSpace::new())
    }
}
