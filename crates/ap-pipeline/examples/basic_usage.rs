use ap_pipeline::*;
use ap_types::ValueRange;
use ap_updates::{parse_search_space_updates, SearchSpaceUpdates};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("AutoPipe search space updates example");

    // Narrow a few hyperparameters of the feature pipeline
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
        "Nystroem:gamma",
        ValueRange::numeric(3.0517578125e-05, 8),
        0.01,
        true,
    );
    updates.append("gaussian_blur", "sigma_offset", ValueRange::numeric(0.0, 1.5), 0.5, false);
    println!("Created {} updates", updates.len());

    // Persist and read back
    let path = std::env::temp_dir().join("autopipe_search_space_updates.txt");
    updates.save_as_file(&path)?;
    println!("Saved updates to {}", path.display());
    for line in std::fs::read_to_string(&path)?.lines() {
        println!("  {line}");
    }

    let loaded = parse_search_space_updates(Some(&path))?;
    println!("Loaded {} updates", loaded.as_ref().map_or(0, |u| u.len()));

    let pipeline = Pipeline::feature_pipeline(&HashMap::new(), &HashMap::new(), loaded)?;
    let space = pipeline.hyperparameter_search_space();
    println!("Pipeline has {} hyperparameters", space.len());
    for hyperparameter in space.hyperparameters() {
        println!("  {hyperparameter}");
    }

    println!("Default configuration:");
    for (name, value) in pipeline.default_configuration().iter() {
        println!("  {name} = {value}");
    }

    let mut rng = StdRng::seed_from_u64(1);
    println!("Sampled configuration:");
    for (name, value) in pipeline.sample_configuration(&mut rng).iter() {
        println!("  {name} = {value}");
    }

    std::fs::remove_file(&path)?;
    Ok(())
}
