// Puzzle core shared by the binary, the integration tests and the benchmarks.
// The terminal front end (app, event, ui) lives only in the binary.

pub mod config;
pub mod engine;
pub mod error;
pub mod session;
pub mod store;
