use ap_types::{ApResult, ConfigurationSpace, Literal, ValueRange};
use ap_updates::AcceptsSearchSpaceUpdate;

use crate::choice::ComponentChoice;
use crate::component::Component;

/// One step of a pipeline: a fixed component or a choice between several.
#[derive(Debug)]
pub enum Stage {
    Component(Box<dyn Component>),
    Choice(ComponentChoice),
}

impl Stage {
    pub fn component<C: Component + 'static>(component: C) -> Self {
        Stage::Component(Box::new(component))
    }

    pub fn choice(choice: ComponentChoice) -> Self {
        Stage::Choice(choice)
    }

    pub fn name(&self) -> &str {
        match self {
            Stage::Component(component) => component.name(),
            Stage::Choice(choice) => choice.name(),
        }
    }

    pub fn hyperparameter_search_space(&self) -> ApResult<ConfigurationSpace> {
        match self {
            Stage::Component(component) => component.hyperparameter_search_space(),
            Stage::Choice(choice) => choice.hyperparameter_search_space(),
        }
    }
}

impl AcceptsSearchSpaceUpdate for Stage {
    fn apply_search_space_update(
        &mut self,
        hyperparameter: &str,
        value_range: &ValueRange,
        log: bool,
        default_value: &Literal,
    ) -> ApResult<()> {
        match self {
            Stage::Component(component) => component.apply_override(hyperparameter, value_range, log, default_value),
            Stage::Choice(choice) => choice.apply_update(hyperparameter, value_range, log, default_value),
        }
    }
}

impl From<ComponentChoice> for Stage {
    fn from(choice: ComponentChoice) -> Self {
        Stage::Choice(choice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{GaussianBlur, NoFeaturePreprocessor, Nystroem};
    use ap_updates::SearchSpaceUpdates;

    #[test]
    fn test_updates_reach_both_stage_kinds() {
        let mut stages = vec![
            (
                "feature_preprocessor".to_string(),
                Stage::choice(ComponentChoice::new(
                    "feature_preprocessor",
                    vec![Box::new(NoFeaturePreprocessor::new()), Box::new(Nystroem::new())],
                )),
            ),
            ("gaussian_blur".to_string(), Stage::component(GaussianBlur::new())),
        ];

        let mut updates = SearchSpaceUpdates::new();
        updates.append("gaussian_blur", "sigma_offset", ValueRange::numeric(0.0, 1.0), 0.25, false);
        updates.append("feature_preprocessor", "Nystroem:degree", ValueRange::numeric(2, 3), 2, false);
        updates.apply(&mut stages).unwrap();

        let blur = stages[1].1.hyperparameter_search_space().unwrap();
        assert_eq!(blur.get_hyperparameter("sigma_offset").unwrap().upper(), Some(1.0));

        let choice = stages[0].1.hyperparameter_search_space().unwrap();
        assert_eq!(
            choice.get_hyperparameter("Nystroem:degree").unwrap().default_value(),
            Literal::Int(2)
        );
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::component(Nystroem::new()).name(), "Nystroem");
        assert_eq!(Stage::from(ComponentChoice::new("encoder", Vec::new())).name(), "encoder");
    }
}
