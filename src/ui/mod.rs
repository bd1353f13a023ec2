pub mod style;
mod terminal;

pub use terminal::{TerminalSurface, TerminalTranscript};
