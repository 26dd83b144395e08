pub mod error;
pub mod input;
pub mod model;
pub mod time_value;
pub mod types;

pub mod financing;
pub mod investment;
pub mod planning;
pub mod scenarios;
pub mod statements;

pub use error::ModelError;
pub use input::ModelInput;
pub use model::{run_model, ModelOutput};
pub use types::*;

/// Standard result type for all model operations
pub type ModelResult<T> = Result<T, ModelError>;
