pub mod aggregator;
pub mod interpret;
pub mod providers;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use aggregator::{AggregatorConfig, ContextAggregator};
pub use providers::LiveSources;
pub use traits::EnvironmentSource;
