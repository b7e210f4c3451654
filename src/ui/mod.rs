//! User interface rendering and input handling.
//!
//! - **renderer**: prints the transcript and the prompt line
//! - **keymapper**: keyboard input to session actions

pub mod keymapper;
pub mod renderer;

pub use keymapper::{Action, KeyMapper};
pub use renderer::Renderer;
