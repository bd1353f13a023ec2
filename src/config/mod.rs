pub mod schema;

pub use schema::{
    BackendConfig, Config, DEFAULT_IDENTIFIER_PATTERN, GatingConfig, PlannerConfig,
    ReasoningConfig, SingleFlightPolicy,
};
