//! Presentation helpers shared by the CLI and library users.

pub mod display;

pub use display::{join_display, to_display};
