pub mod errors;
pub mod hyperparameter;
pub mod literal;
pub mod space;

pub use errors::*;
pub use hyperparameter::*;
pub use literal::*;
pub use space::*;
