//! Durable per-profile upstream sessions, the downstream listener that
//! attaches clients to them, and the bidirectional rewriter between the
//! two (spec §1).

pub mod bridge;
pub mod config;
pub mod dump;
pub mod error;
pub mod io;
pub mod listener;
pub mod management;
pub mod observer;
pub mod profile;
pub mod session;
pub mod upstream;
