mod fallback;
mod parser;
pub mod prompt;
pub mod resolver;
mod types;

pub use fallback::HeuristicPlanner;
pub use parser::PlanParser;
pub use resolver::PlaceholderResolver;
pub use types::{ExecutionPlan, ExecutionStep, PlanOrigin, ToolDescriptor};
