//! Ordered collections of search-space updates.

use ap_types::{ApResult, Literal, UpdateError, ValueRange};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::parser;
use crate::update::{AcceptsSearchSpaceUpdate, SearchSpaceUpdate};

/// Updates in insertion order. Overlapping updates are kept as they are;
/// the stage receiving them keeps the last one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchSpaceUpdates {
    updates: Vec<SearchSpaceUpdate>,
}

impl SearchSpaceUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> &[SearchSpaceUpdate] {
        &self.updates
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SearchSpaceUpdate> {
        self.updates.iter()
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Apply every update in order; the first stage error aborts.
    pub fn apply<S: AcceptsSearchSpaceUpdate>(&self, stages: &mut [(String, S)]) -> ApResult<()> {
        for update in &self.updates {
            update.apply(stages)?;
        }
        Ok(())
    }

    pub fn append(
        &mut self,
        stage_name: impl Into<String>,
        hyperparameter: impl Into<String>,
        value_range: ValueRange,
        default_value: impl Into<Literal>,
        log: bool,
    ) {
        self.updates.push(SearchSpaceUpdate::new(
            stage_name,
            hyperparameter,
            value_range,
            default_value,
            log,
        ));
    }

    /// Write one line per update, replacing any existing file at `path`.
    pub fn save_as_file(&self, path: impl AsRef<Path>) -> ApResult<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        for update in &self.updates {
            writeln!(writer, "{update}")?;
        }
        writer.flush()?;

        info!("Saved {} search space updates to {}", self.updates.len(), path.display());
        Ok(())
    }
}

impl From<Vec<SearchSpaceUpdate>> for SearchSpaceUpdates {
    fn from(updates: Vec<SearchSpaceUpdate>) -> Self {
        Self { updates }
    }
}

impl FromIterator<SearchSpaceUpdate> for SearchSpaceUpdates {
    fn from_iter<I: IntoIterator<Item = SearchSpaceUpdate>>(iter: I) -> Self {
        Self {
            updates: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for SearchSpaceUpdates {
    type Item = SearchSpaceUpdate;
    type IntoIter = std::vec::IntoIter<SearchSpaceUpdate>;

    fn into_iter(self) -> Self::IntoIter {
        self.updates.into_iter()
    }
}

impl<'a> IntoIterator for &'a SearchSpaceUpdates {
    type Item = &'a SearchSpaceUpdate;
    type IntoIter = std::slice::Iter<'a, SearchSpaceUpdate>;

    fn into_iter(self) -> Self::IntoIter {
        self.updates.iter()
    }
}

/// Same grammar as the update file.
impl FromStr for SearchSpaceUpdates {
    type Err = UpdateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parser::parse_updates_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ap_types::ApError;
    use std::collections::HashMap;

    /// Stage that keeps the latest override per hyperparameter.
    #[derive(Debug, Default)]
    struct LatestWinsStage {
        overrides: HashMap<String, (ValueRange, Literal)>,
        fail_on: Option<&'static str>,
    }

    impl AcceptsSearchSpaceUpdate for LatestWinsStage {
        fn apply_search_space_update(
            &mut self,
            hyperparameter: &str,
            value_range: &ValueRange,
            _log: bool,
            default_value: &Literal,
        ) -> ApResult<()> {
            if self.fail_on == Some(hyperparameter) {
                return Err(ApError::Validation(format!("rejected {hyperparameter}")));
            }
            self.overrides
                .insert(hyperparameter.to_string(), (value_range.clone(), default_value.clone()));
            Ok(())
        }
    }

    fn sample_updates() -> SearchSpaceUpdates {
        let mut updates = SearchSpaceUpdates::new();
        updates.append(
            "feature_preprocessor",
            "Nystroem:n_components",
            ValueRange::numeric(10, 2000),
            100,
            true,
        );
        updates.append(
            "feature_preprocessor",
            "Nystroem:kernel",
            ValueRange::choices(["poly", "rbf", "sigmoid"]),
            "rbf",
            false,
        );
        updates.append(
            "feature_preprocessor",
            "Nystroem:coef0",
            ValueRange::numeric(-1, 1),
            0,
            false,
        );
        updates.append(
            "image_augmenter:GaussianBlur",
            "use_augmenter",
            ValueRange::list(vec![Literal::Bool(true), Literal::Bool(false)]),
            true,
            false,
        );
        updates
    }

    #[test]
    fn test_append_preserves_order() {
        let updates = sample_updates();
        assert_eq!(updates.len(), 4);
        let names: Vec<&str> = updates.iter().map(SearchSpaceUpdate::hyperparameter).collect();
        assert_eq!(
            names,
            vec!["Nystroem:n_components", "Nystroem:kernel", "Nystroem:coef0", "use_augmenter"]
        );
    }

    #[test]
    fn test_last_write_wins_inside_the_stage() {
        let mut updates = SearchSpaceUpdates::new();
        updates.append("trainer", "lr", ValueRange::numeric(0.001, 0.1), 0.01, true);
        updates.append("trainer", "lr", ValueRange::numeric(0.0001, 0.5), 0.05, true);
        let mut stages = vec![("trainer".to_string(), LatestWinsStage::default())];

        updates.apply(&mut stages).unwrap();

        assert_eq!(
            stages[0].1.overrides.get("lr"),
            Some(&(ValueRange::numeric(0.0001, 0.5), Literal::Float(0.05)))
        );
    }

    #[test]
    fn test_first_error_aborts_application() {
        let mut updates = SearchSpaceUpdates::new();
        updates.append("trainer", "lr", ValueRange::numeric(0.001, 0.1), 0.01, true);
        updates.append("trainer", "momentum", ValueRange::numeric(0.1, 0.9), 0.5, false);
        updates.append("trainer", "batch_size", ValueRange::numeric(16, 512), 64, true);
        let mut stages = vec![(
            "trainer".to_string(),
            LatestWinsStage {
                fail_on: Some("momentum"),
                ..Default::default()
            },
        )];

        assert!(updates.apply(&mut stages).is_err());
        assert!(stages[0].1.overrides.contains_key("lr"));
        assert!(!stages[0].1.overrides.contains_key("batch_size"));
    }

    #[test]
    fn test_save_writes_one_line_per_update() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("updates.txt");
        sample_updates().save_as_file(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "feature_preprocessor Nystroem:n_components (10, 2000) 100 log\n\
             feature_preprocessor Nystroem:kernel ('poly', 'rbf', 'sigmoid') 'rbf'\n\
             feature_preprocessor Nystroem:coef0 (-1, 1) 0\n\
             image_augmenter:GaussianBlur use_augmenter [True, False] True\n"
        );
    }

    #[test]
    fn test_save_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("updates.txt");
        std::fs::write(&path, "stale content that is much longer than the new one\n".repeat(10)).unwrap();

        let mut updates = SearchSpaceUpdates::new();
        updates.append("trainer", "lr", ValueRange::numeric(0.001, 0.1), 0.01, true);
        updates.save_as_file(&path).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "trainer lr (0.001, 0.1) 0.01 log\n"
        );
    }

    #[test]
    fn test_save_then_parse_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("updates.txt");
        let original = sample_updates();
        original.save_as_file(&path).unwrap();

        let parsed = crate::parse_search_space_updates(Some(&path)).unwrap().unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_save_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("updates.txt");
        assert!(matches!(sample_updates().save_as_file(&path), Err(ApError::Io(_))));
    }

    #[test]
    fn test_parses_from_str() {
        let updates: SearchSpaceUpdates = "trainer lr (0.001, 0.1) 0.01 log\n\ntrainer epochs (5, 50) 20\n"
            .parse()
            .unwrap();
        assert_eq!(updates.len(), 2);
        assert!(updates.updates()[0].log());
        assert!(!updates.updates()[1].log());
    }
}
