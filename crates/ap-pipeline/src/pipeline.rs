//! Pipeline assembly: named stages, update application and the combined
//! configuration space.

use ap_types::{validation_error, ApResult, Configuration, ConfigurationSpace};
use ap_updates::SearchSpaceUpdates;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::choice::ComponentChoice;
use crate::components::{GaussianBlur, NoFeaturePreprocessor, Nystroem};
use crate::config::PipelineConfig;
use crate::stage::Stage;

pub const FEATURE_PREPROCESSOR_STEP: &str = "feature_preprocessor";
pub const GAUSSIAN_BLUR_STEP: &str = "gaussian_blur";

/// An ordered list of named stages.
///
/// Search-space updates are applied once, on construction, in file order.
/// Each step's space appears in the pipeline's space under `step:`.
#[derive(Debug)]
pub struct Pipeline {
    steps: Vec<(String, Stage)>,
    search_space_updates: Option<SearchSpaceUpdates>,
    config_space: ConfigurationSpace,
}

impl Pipeline {
    pub fn new(mut steps: Vec<(String, Stage)>, search_space_updates: Option<SearchSpaceUpdates>) -> ApResult<Self> {
        {
            let mut seen = HashSet::new();
            if let Some((duplicate, _)) = steps.iter().find(|(name, _)| !seen.insert(name.as_str())) {
                return Err(validation_error!("Duplicate pipeline step name: {}", duplicate));
            }
        }

        if let Some(updates) = &search_space_updates {
            info!("Applying {} search space updates to {} steps", updates.len(), steps.len());
            updates.apply(&mut steps)?;
        }

        let mut config_space = ConfigurationSpace::new();
        for (name, stage) in &steps {
            let space = stage.hyperparameter_search_space()?;
            debug!("Step {} contributes {} hyperparameters", name, space.len());
            config_space.add_configuration_space(name, &space, None)?;
        }
        info!(
            "Built pipeline with {} steps and {} hyperparameters",
            steps.len(),
            config_space.len()
        );

        Ok(Self {
            steps,
            search_space_updates,
            config_space,
        })
    }

    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Feature preprocessing choice followed by a blur augmentation.
    ///
    /// `include`/`exclude` restrict the components of choice steps, keyed by
    /// step name.
    pub fn feature_pipeline(
        include: &HashMap<String, Vec<String>>,
        exclude: &HashMap<String, Vec<String>>,
        search_space_updates: Option<SearchSpaceUpdates>,
    ) -> ApResult<Self> {
        let choice_steps = [FEATURE_PREPROCESSOR_STEP];
        if let Some(step) = include
            .keys()
            .chain(exclude.keys())
            .find(|step| !choice_steps.contains(&step.as_str()))
        {
            return Err(validation_error!(
                "Cannot include or exclude components of {}, expected one of {:?}",
                step,
                choice_steps
            ));
        }

        let mut feature_preprocessor = ComponentChoice::new(
            FEATURE_PREPROCESSOR_STEP,
            vec![Box::new(NoFeaturePreprocessor::new()), Box::new(Nystroem::new())],
        )
        .with_default("NoFeaturePreprocessor");
        if let Some(names) = include.get(FEATURE_PREPROCESSOR_STEP) {
            feature_preprocessor = feature_preprocessor.with_include(names)?;
        }
        if let Some(names) = exclude.get(FEATURE_PREPROCESSOR_STEP) {
            feature_preprocessor = feature_preprocessor.with_exclude(names)?;
        }
        if feature_preprocessor.component_names().is_empty() {
            return Err(validation_error!("No components left for {}", FEATURE_PREPROCESSOR_STEP));
        }

        Self::builder()
            .step(FEATURE_PREPROCESSOR_STEP, Stage::choice(feature_preprocessor))
            .step(GAUSSIAN_BLUR_STEP, Stage::component(GaussianBlur::new()))
            .search_space_updates(search_space_updates)
            .build()
    }

    /// Validate `config`, load its update file and build the feature pipeline.
    pub fn from_config(config: &PipelineConfig) -> ApResult<Self> {
        config.validate()?;
        info!("Building pipeline {}", config.name);
        let updates = config.load_search_space_updates()?;
        Self::feature_pipeline(&config.include, &config.exclude, updates)
    }

    pub fn named_steps(&self) -> &[(String, Stage)] {
        &self.steps
    }

    pub fn step(&self, name: &str) -> Option<&Stage> {
        self.steps.iter().find(|(step, _)| step == name).map(|(_, stage)| stage)
    }

    pub fn hyperparameter_search_space(&self) -> &ConfigurationSpace {
        &self.config_space
    }

    pub fn search_space_updates(&self) -> Option<&SearchSpaceUpdates> {
        self.search_space_updates.as_ref()
    }

    pub fn default_configuration(&self) -> Configuration {
        self.config_space.default_configuration()
    }

    pub fn sample_configuration<R: Rng>(&self, rng: &mut R) -> Configuration {
        self.config_space.sample_configuration(rng)
    }
}

/// Incremental construction of a [`Pipeline`].
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    steps: Vec<(String, Stage)>,
    search_space_updates: Option<SearchSpaceUpdates>,
}

impl PipelineBuilder {
    pub fn step(mut self, name: impl Into<String>, stage: Stage) -> Self {
        self.steps.push((name.into(), stage));
        self
    }

    pub fn search_space_updates(mut self, updates: Option<SearchSpaceUpdates>) -> Self {
        self.search_space_updates = updates;
        self
    }

    pub fn build(self) -> ApResult<Pipeline> {
        Pipeline::new(self.steps, self.search_space_updates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ap_types::{ApError, Literal, SpaceError, UpdateError, ValueRange};
    use ap_updates::parse_search_space_updates;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn no_filter() -> HashMap<String, Vec<String>> {
        HashMap::new()
    }

    fn pipeline(updates: Option<SearchSpaceUpdates>) -> ApResult<Pipeline> {
        Pipeline::feature_pipeline(&no_filter(), &no_filter(), updates)
    }

    #[test]
    fn test_default_space_prefixes_steps() {
        let pipeline = pipeline(None).unwrap();
        let cs = pipeline.hyperparameter_search_space();
        assert!(cs.contains("feature_preprocessor:__choice__"));
        assert!(cs.contains("feature_preprocessor:Nystroem:gamma"));
        assert!(cs.contains("gaussian_blur:sigma_min"));
        assert!(pipeline.search_space_updates().is_none());

        let defaults = pipeline.default_configuration();
        assert_eq!(
            defaults.get("feature_preprocessor:__choice__"),
            Some(&Literal::from("NoFeaturePreprocessor"))
        );
        assert!(!defaults.contains("feature_preprocessor:Nystroem:kernel"));
        assert_eq!(defaults.get("gaussian_blur:sigma_offset"), Some(&Literal::Float(0.5)));
    }

    #[test]
    fn test_last_update_wins() {
        let mut updates = SearchSpaceUpdates::new();
        updates.append("feature_preprocessor", "Nystroem:gamma", ValueRange::numeric(0.001, 1.0), 0.1, true);
        updates.append("feature_preprocessor", "Nystroem:gamma", ValueRange::numeric(0.01, 2.0), 0.5, false);

        let pipeline = pipeline(Some(updates)).unwrap();
        let gamma = pipeline
            .hyperparameter_search_space()
            .get_hyperparameter("feature_preprocessor:Nystroem:gamma")
            .unwrap();
        assert_eq!(gamma.lower(), Some(0.01));
        assert_eq!(gamma.upper(), Some(2.0));
        assert_eq!(gamma.default_value(), Literal::Float(0.5));
        assert!(!gamma.is_log());
    }

    #[test]
    fn test_updates_for_absent_stages_are_ignored() {
        let mut updates = SearchSpaceUpdates::new();
        updates.append("trainer", "lr", ValueRange::numeric(0.001, 0.1), 0.01, true);

        let updated = pipeline(Some(updates)).unwrap();
        let plain = pipeline(None).unwrap();
        assert_eq!(updated.hyperparameter_search_space(), plain.hyperparameter_search_space());
    }

    #[test]
    fn test_unknown_hyperparameter_fails_construction() {
        let mut updates = SearchSpaceUpdates::new();
        updates.append("gaussian_blur", "sigma_max", ValueRange::numeric(0.0, 1.0), 0.5, false);

        let err = pipeline(Some(updates)).unwrap_err();
        assert!(matches!(err, ApError::Update(UpdateError::UnknownHyperparameter { .. })));
        assert!(err.to_string().contains(
            "Expected update hyperparameter to be in [use_augmenter, sigma_min, sigma_offset] got sigma_max"
        ));
    }

    #[test]
    fn test_mistyped_range_fails_construction() {
        let mut updates = SearchSpaceUpdates::new();
        updates.append(
            "feature_preprocessor",
            "Nystroem:n_components",
            ValueRange::choices(["few", "many"]),
            "few",
            false,
        );
        assert!(matches!(
            pipeline(Some(updates)),
            Err(ApError::Space(SpaceError::RangeTypeMismatch { .. }))
        ));
    }

    #[test]
    fn test_unbounded_float_range_fails_construction() {
        for line in [
            "gaussian_blur sigma_offset (0.0, 1e309) 0.5",
            "gaussian_blur sigma_offset (-1e308, 1e308) 0.5",
        ] {
            let updates: SearchSpaceUpdates = line.parse().unwrap();
            assert!(
                matches!(
                    pipeline(Some(updates)),
                    Err(ApError::Space(SpaceError::NonFiniteBounds { .. }))
                ),
                "accepted {line:?}"
            );
        }
    }

    #[test]
    fn test_duplicate_step_names_are_rejected() {
        let result = Pipeline::builder()
            .step("blur", Stage::component(GaussianBlur::new()))
            .step("blur", Stage::component(GaussianBlur::new()))
            .build();
        assert!(matches!(result, Err(ApError::Validation(_))));
    }

    #[test]
    fn test_include_and_exclude_shape_the_choice() {
        let include = HashMap::from([("feature_preprocessor".to_string(), vec!["Nystroem".to_string()])]);
        let pipeline = Pipeline::feature_pipeline(&include, &no_filter(), None).unwrap();
        let choice = pipeline
            .hyperparameter_search_space()
            .get_hyperparameter("feature_preprocessor:__choice__")
            .unwrap();
        assert_eq!(choice.choices().unwrap(), &[Literal::from("Nystroem")]);

        let exclude = HashMap::from([(
            "feature_preprocessor".to_string(),
            vec!["Nystroem".to_string(), "NoFeaturePreprocessor".to_string()],
        )]);
        assert!(matches!(
            Pipeline::feature_pipeline(&no_filter(), &exclude, None),
            Err(ApError::Validation(_))
        ));

        let bad_step = HashMap::from([("gaussian_blur".to_string(), vec!["GaussianBlur".to_string()])]);
        assert!(Pipeline::feature_pipeline(&bad_step, &no_filter(), None).is_err());
    }

    #[test]
    fn test_saved_updates_rebuild_the_same_pipeline() {
        let mut updates = SearchSpaceUpdates::new();
        updates.append(
            "feature_preprocessor",
            "__choice__",
            ValueRange::choices(["NoFeaturePreprocessor", "Nystroem"]),
            "Nystroem",
            false,
        );
        updates.append(
            "feature_preprocessor",
            "Nystroem:kernel",
            ValueRange::choices(["poly", "rbf", "sigmoid"]),
            "sigmoid",
            false,
        );
        updates.append("gaussian_blur", "sigma_offset", ValueRange::numeric(0.0, 3.0), 0.5, false);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("updates.txt");
        updates.save_as_file(&path).unwrap();

        let parsed = parse_search_space_updates(Some(&path)).unwrap();
        let from_file = pipeline(parsed).unwrap();
        let in_memory = pipeline(Some(updates.clone())).unwrap();

        assert_eq!(from_file.search_space_updates(), Some(&updates));
        assert_eq!(
            from_file.hyperparameter_search_space(),
            in_memory.hyperparameter_search_space()
        );
        assert_eq!(
            from_file.default_configuration().get("feature_preprocessor:Nystroem:kernel"),
            Some(&Literal::from("sigmoid"))
        );
    }

    #[test]
    fn test_samples_respect_the_active_choice() {
        let pipeline = pipeline(None).unwrap();
        let cs = pipeline.hyperparameter_search_space();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..50 {
            let config = pipeline.sample_configuration(&mut rng);
            let choice = config.get("feature_preprocessor:__choice__").unwrap();
            let nystroem_active = config.contains("feature_preprocessor:Nystroem:kernel");
            assert_eq!(nystroem_active, choice == &Literal::from("Nystroem"));
            for (name, _) in config.iter() {
                assert!(cs.is_active(name, &config), "{name} sampled while inactive");
            }
        }
    }
}
