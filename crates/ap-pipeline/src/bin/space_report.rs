//! Print the configuration space of the feature pipeline.
//!
//! Usage: `ap-space-report [pipeline.json | updates.txt]`

use anyhow::{bail, Context};
use ap_pipeline::{Pipeline, PipelineConfig, Stage};
use ap_updates::parse_search_space_updates;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let input = args.next().map(PathBuf::from);
    if args.next().is_some() {
        bail!("usage: ap-space-report [pipeline.json | updates.txt]");
    }

    let pipeline = match &input {
        Some(path) if path.extension().is_some_and(|ext| ext == "json") => {
            let config = PipelineConfig::from_json_file(path)
                .with_context(|| format!("reading pipeline config {}", path.display()))?;
            Pipeline::from_config(&config)?
        }
        _ => {
            let updates = parse_search_space_updates(input.as_deref())
                .with_context(|| format!("reading search space updates {:?}", input))?;
            Pipeline::feature_pipeline(&HashMap::new(), &HashMap::new(), updates)?
        }
    };

    println!("Steps:");
    for (name, stage) in pipeline.named_steps() {
        match stage {
            Stage::Component(component) => println!("  {name}: {}", component.properties().name),
            Stage::Choice(choice) => println!("  {name}: one of {}", choice.component_names().join(", ")),
        }
    }

    let space = pipeline.hyperparameter_search_space();
    info!("Pipeline has {} hyperparameters", space.len());

    println!("Hyperparameters:");
    for hyperparameter in space.hyperparameters() {
        println!("  {hyperparameter}");
    }
    println!("Conditions:");
    for condition in space.conditions() {
        println!("  {condition}");
    }
    if let Some(updates) = pipeline.search_space_updates() {
        println!("Applied updates:");
        for update in updates {
            println!("  {update}");
        }
    }
    Ok(())
}
