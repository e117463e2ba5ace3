//! Show planning: occurrence calculation, event generation and the
//! synchronization and maintenance services built on it.

pub mod bootstrap;
pub mod cli;
pub mod runtime;
pub mod state;
