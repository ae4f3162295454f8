pub mod bank;
pub mod puzzle;

pub use puzzle::{Counters, PlacementMode, PuzzleSession, SessionEvent, SessionOptions};
