use crate::core::session::BoxFuture;

/// Text-in/text-out reasoning endpoint used for planning and for turning
/// tool output into an answer.
pub trait ReasoningService: Send + Sync {
    /// Service identifier used in logs and error messages.
    fn name(&self) -> &str;

    fn complete<'a>(
        &'a self,
        system_prompt: &'a str,
        prompt: &'a str,
    ) -> BoxFuture<'a, anyhow::Result<String>>;
}
