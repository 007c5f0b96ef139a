//! Built-in components. Only their search spaces are modelled here.

mod gaussian_blur;
mod no_preprocessor;
mod nystroem;

pub use gaussian_blur::GaussianBlur;
pub use no_preprocessor::NoFeaturePreprocessor;
pub use nystroem::Nystroem;
