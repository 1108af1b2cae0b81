//! Discord bot wiring: client setup, event handling, command dispatch.

pub mod bot;
pub mod commands;
pub mod handler;
pub mod ppc;

pub use bot::build_client;
pub use commands::CommandRouter;
