mod chat;
pub mod context;
mod surface;

pub use chat::{ChatEngine, ChatReply, EngineOutcome, describe_error};
pub use surface::{
    ConfirmationSurface, ContainerDecision, ContainerRequest, ScopeDecision, ScopeRequest,
    Transcript,
};
