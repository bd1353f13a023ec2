pub mod chain;
pub mod engine;
pub mod gating;
pub mod planner;
pub mod preferences;
pub mod providers;
pub mod session;
