use ap_types::{ApResult, ConfigurationSpace, HyperparameterSearchSpace, HyperparameterType, Literal};

use crate::component::{
    add_conditional_hyperparameter, Component, ComponentProperties, ResolvedSearchSpace, SearchSpaceOverrides,
};

/// Gaussian blur image augmentation. The blur sigma is drawn from
/// `[sigma_min, sigma_min + sigma_offset]`.
#[derive(Debug, Clone, Default)]
pub struct GaussianBlur {
    overrides: SearchSpaceOverrides,
}

impl GaussianBlur {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Component for GaussianBlur {
    fn name(&self) -> &'static str {
        "GaussianBlur"
    }

    fn properties(&self) -> ComponentProperties {
        ComponentProperties {
            shortname: "GaussianBlur",
            name: "GaussianBlur",
            handles_sparse: false,
        }
    }

    fn default_search_space(&self) -> Vec<HyperparameterSearchSpace> {
        vec![
            HyperparameterSearchSpace::categorical("use_augmenter", [true, false], true),
            HyperparameterSearchSpace::numeric("sigma_min", 0, 3, 0, false),
            HyperparameterSearchSpace::numeric("sigma_offset", 0.0, 3.0, 0.5, false),
        ]
    }

    fn overrides(&self) -> &SearchSpaceOverrides {
        &self.overrides
    }

    fn overrides_mut(&mut self) -> &mut SearchSpaceOverrides {
        &mut self.overrides
    }

    fn build_space(&self, spaces: &ResolvedSearchSpace) -> ApResult<ConfigurationSpace> {
        let use_augmenter = spaces.hyperparameter("use_augmenter", HyperparameterType::Categorical)?;
        let sigma_min = spaces.hyperparameter("sigma_min", HyperparameterType::UniformFloat)?;
        let sigma_offset = spaces.hyperparameter("sigma_offset", HyperparameterType::UniformFloat)?;

        let mut cs = ConfigurationSpace::new();
        cs.add_hyperparameter(use_augmenter.clone())?;
        let enabled = [Literal::Bool(true)];
        add_conditional_hyperparameter(&mut cs, sigma_min, &use_augmenter, &enabled)?;
        add_conditional_hyperparameter(&mut cs, sigma_offset, &use_augmenter, &enabled)?;
        Ok(cs)
    }
}
