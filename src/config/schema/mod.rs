mod backend;
mod core;
mod gating;
mod reasoning;

pub use backend::BackendConfig;
pub use self::core::Config;
pub use gating::{DEFAULT_IDENTIFIER_PATTERN, GatingConfig, PlannerConfig, SingleFlightPolicy};
pub use reasoning::ReasoningConfig;
