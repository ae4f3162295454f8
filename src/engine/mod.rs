pub mod arena;
pub mod board;
pub mod column;
pub mod record;
pub mod token;

pub use board::{BindingChange, Board};
pub use column::{Column, LayoutMode};
pub use record::{Record, RecordKind};
pub use token::Token;

/// Vertical position of the first layout slot.
pub const SLOT_ORIGIN: f32 = 5.0;
/// Distance between consecutive layout slots.
pub const SLOT_STEP: f32 = 40.0;
/// A token aligns with `y` when its position lies in `[y - WINDOW_ABOVE, y + WINDOW_BELOW)`.
pub const WINDOW_ABOVE: f32 = 10.0;
pub const WINDOW_BELOW: f32 = 5.0;

pub fn slot_y(index: usize) -> f32 {
    SLOT_ORIGIN + index as f32 * SLOT_STEP
}

/// Address of a token: its column and its slot in that column's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId {
    pub column: usize,
    pub slot: usize,
}

impl TokenId {
    pub fn new(column: usize, slot: usize) -> Self {
        Self { column, slot }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecordId(pub(crate) usize);
