//! Entrypoint command implementations

pub mod render;
pub mod resolve;
pub mod run;

pub use render::{execute_render, RenderArgs};
pub use resolve::execute_resolve;
pub use run::{execute_run, RunArgs};
