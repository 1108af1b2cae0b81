//! Binary query protocols for game servers.

pub mod a2s;
pub mod minecraft;
