//! # ap-pipeline
//!
//! Pipeline stages and their hyperparameter search spaces for AutoPipe.
//!
//! Components declare a default search space per hyperparameter. Search-space
//! updates loaded through `ap-updates` override those defaults when a
//! [`Pipeline`] is built, and the pipeline exposes the resulting combined
//! configuration space.

pub mod choice;
pub mod component;
pub mod components;
pub mod config;
pub mod pipeline;
pub mod stage;

pub use choice::{ComponentChoice, CHOICE_HYPERPARAMETER};
pub use component::{
    add_conditional_hyperparameter, Component, ComponentProperties, ResolvedSearchSpace, SearchSpaceOverrides,
};
pub use config::PipelineConfig;
pub use pipeline::{Pipeline, PipelineBuilder, FEATURE_PREPROCESSOR_STEP, GAUSSIAN_BLUR_STEP};
pub use stage::Stage;
