mod runner;
mod summary;

pub use runner::{ChainObserver, ChainRunner, NullObserver, StepResult};
pub use summary::{compose_response, deterministic_summary};
