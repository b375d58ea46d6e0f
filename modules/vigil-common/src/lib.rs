pub mod config;
pub mod error;
pub mod geo;
pub mod types;

pub use config::{Config, LlmProvider};
pub use error::VigilError;
pub use geo::*;
pub use types::*;
