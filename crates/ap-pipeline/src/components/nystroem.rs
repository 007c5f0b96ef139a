use ap_types::{ApResult, ConfigurationSpace, HyperparameterSearchSpace, HyperparameterType, Literal};

use crate::component::{
    add_conditional_hyperparameter, Component, ComponentProperties, ResolvedSearchSpace, SearchSpaceOverrides,
};

/// Nystroem kernel approximation of the numerical features.
#[derive(Debug, Clone, Default)]
pub struct Nystroem {
    overrides: SearchSpaceOverrides,
}

impl Nystroem {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Component for Nystroem {
    fn name(&self) -> &'static str {
        "Nystroem"
    }

    fn properties(&self) -> ComponentProperties {
        ComponentProperties {
            shortname: "Nystroem",
            name: "Nystroem kernel approximation",
            handles_sparse: true,
        }
    }

    fn default_search_space(&self) -> Vec<HyperparameterSearchSpace> {
        vec![
            HyperparameterSearchSpace::numeric("n_components", 10, 2000, 100, true),
            HyperparameterSearchSpace::categorical("kernel", ["poly", "rbf", "sigmoid", "cosine"], "rbf"),
            HyperparameterSearchSpace::numeric("gamma", 3.0517578125e-05, 8, 0.01, true),
            HyperparameterSearchSpace::numeric("degree", 2, 5, 3, false),
            HyperparameterSearchSpace::numeric("coef0", -1, 1, 0, false),
        ]
    }

    fn overrides(&self) -> &SearchSpaceOverrides {
        &self.overrides
    }

    fn overrides_mut(&mut self) -> &mut SearchSpaceOverrides {
        &mut self.overrides
    }

    fn build_space(&self, spaces: &ResolvedSearchSpace) -> ApResult<ConfigurationSpace> {
        let n_components = spaces.hyperparameter("n_components", HyperparameterType::UniformInteger)?;
        let kernel = spaces.hyperparameter("kernel", HyperparameterType::Categorical)?;
        let degree = spaces.hyperparameter("degree", HyperparameterType::UniformInteger)?;
        let gamma = spaces.hyperparameter("gamma", HyperparameterType::UniformFloat)?;
        let coef0 = spaces.hyperparameter("coef0", HyperparameterType::UniformFloat)?;

        let mut cs = ConfigurationSpace::new();
        cs.add_hyperparameters([n_components, kernel.clone()])?;

        // degree only for poly, coef0 for poly/sigmoid, gamma for poly/rbf
        add_conditional_hyperparameter(&mut cs, degree, &kernel, &[Literal::from("poly")])?;
        add_conditional_hyperparameter(&mut cs, gamma, &kernel, &["poly".into(), "rbf".into()])?;
        add_conditional_hyperparameter(&mut cs, coef0, &kernel, &["poly".into(), "sigmoid".into()])?;
        Ok(cs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ap_types::{Condition, HyperparameterKind, ValueRange};

    #[test]
    fn test_default_space_matches_declaration() {
        let cs = Nystroem::new().hyperparameter_search_space().unwrap();
        assert_eq!(
            cs.hyperparameter_names(),
            vec!["n_components", "kernel", "degree", "gamma", "coef0"]
        );

        let gamma = cs.get_hyperparameter("gamma").unwrap();
        assert_eq!(gamma.lower(), Some(3.0517578125e-05));
        assert_eq!(gamma.upper(), Some(8.0));
        assert!(gamma.is_log());
        assert_eq!(gamma.default_value(), Literal::Float(0.01));

        assert!(cs.conditions().contains(&Condition::equals("degree", "kernel", "poly")));
        assert!(cs
            .conditions()
            .contains(&Condition::in_values("coef0", "kernel", ["poly", "sigmoid"])));
    }

    #[test]
    fn test_properties() {
        let properties = Nystroem::new().properties();
        assert_eq!(properties.shortname, "Nystroem");
        assert!(properties.handles_sparse);
    }

    #[test]
    fn test_kernel_restriction_prunes_conditions() {
        let mut nystroem = Nystroem::new();
        nystroem
            .apply_override("kernel", &ValueRange::choices(["rbf", "cosine"]), false, &Literal::from("cosine"))
            .unwrap();
        let cs = nystroem.hyperparameter_search_space().unwrap();

        assert!(!cs.contains("degree"));
        assert!(!cs.contains("coef0"));
        assert!(cs.conditions().contains(&Condition::equals("gamma", "kernel", "rbf")));
        assert_eq!(
            cs.get_hyperparameter("kernel").unwrap().default_value(),
            Literal::from("cosine")
        );
    }

    #[test]
    fn test_n_components_update_is_reflected() {
        let mut nystroem = Nystroem::new();
        nystroem
            .apply_override("n_components", &ValueRange::numeric(50, 500), false, &Literal::Int(60))
            .unwrap();
        let cs = nystroem.hyperparameter_search_space().unwrap();
        assert_eq!(
            cs.get_hyperparameter("n_components").unwrap().kind(),
            &HyperparameterKind::UniformInteger {
                lower: 50,
                upper: 500,
                default_value: 60,
                log: false
            }
        );
    }
}
