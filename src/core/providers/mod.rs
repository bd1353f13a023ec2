pub mod compatible;
mod http_client;
pub mod reliable;
pub mod scrub;
pub mod traits;

pub use compatible::OpenAiCompatibleReasoner;
pub use reliable::ReliableReasoner;
pub use scrub::sanitize_api_error;
pub use traits::ReasoningService;

use crate::config::ReasoningConfig;

/// Reasoning service for the configured endpoint, wrapped with retries.
pub fn create_reasoner(config: &ReasoningConfig) -> Box<dyn ReasoningService> {
    let base = OpenAiCompatibleReasoner::from_config(config);
    Box::new(ReliableReasoner::from_config(Box::new(base), config))
}
