use crate::engine::{RecordId, WINDOW_ABOVE, WINDOW_BELOW};

/// One draggable field value. Owned by its column's arena; the ring links are
/// slot indices into that same arena.
#[derive(Clone, Debug)]
pub struct Token {
    text: String,
    column: usize,
    y: f32,
    movable: bool,
    visible: bool,
    confirmed: bool,
    seq: u64,
    pub(crate) ring_next: usize,
    pub(crate) ring_prev: usize,
    default_record: RecordId,
    current_record: Option<RecordId>,
}

impl Token {
    pub(crate) fn new(
        text: &str,
        column: usize,
        slot: usize,
        seq: u64,
        default_record: RecordId,
    ) -> Self {
        Self {
            text: text.to_string(),
            column,
            y: 0.0,
            movable: true,
            visible: true,
            confirmed: false,
            seq,
            ring_next: slot,
            ring_prev: slot,
            default_record,
            current_record: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    /// Display width in characters.
    pub fn width(&self) -> usize {
        self.text.chars().count()
    }

    /// Creation order within the column; duplicate rings are kept sorted by it.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn is_movable(&self) -> bool {
        self.movable
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    /// Confirmed tokens stay put until their record is unbound.
    pub fn can_move(&self) -> bool {
        self.movable && !self.confirmed
    }

    pub fn default_record(&self) -> RecordId {
        self.default_record
    }

    pub fn current_record(&self) -> Option<RecordId> {
        self.current_record
    }

    pub fn is_bound(&self) -> bool {
        self.current_record.is_some()
    }

    /// Whether this token sits inside the tolerance window around `y`.
    pub fn in_window(&self, y: f32) -> bool {
        self.y >= y - WINDOW_ABOVE && self.y < y + WINDOW_BELOW
    }

    pub(crate) fn set_y(&mut self, y: f32) {
        self.y = y;
    }

    pub(crate) fn set_movable(&mut self, movable: bool) {
        self.movable = movable;
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub(crate) fn bind(&mut self, record: RecordId) {
        self.current_record = Some(record);
    }

    pub(crate) fn unbind(&mut self) {
        self.current_record = None;
        self.confirmed = false;
    }

    pub(crate) fn show_confirmed(&mut self, shown: bool) {
        self.confirmed = shown;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_at(y: f32) -> Token {
        let mut token = Token::new("cat", 0, 0, 0, RecordId(0));
        token.set_y(y);
        token
    }

    #[test]
    fn test_window_is_half_open() {
        let token = token_at(100.0);
        assert!(token.in_window(100.0));
        // lower edge: token.y == y - 10 is inside
        assert!(token.in_window(110.0));
        // upper edge: token.y == y + 5 is outside
        assert!(!token.in_window(95.0));
        assert!(token.in_window(95.5));
        assert!(!token.in_window(110.5));
    }

    #[test]
    fn test_confirmed_locks_movement() {
        let mut token = token_at(5.0);
        assert!(token.can_move());
        token.bind(RecordId(3));
        token.show_confirmed(true);
        assert!(!token.can_move());
        token.show_confirmed(true);
        assert!(token.is_confirmed());
    }

    #[test]
    fn test_unbind_clears_confirmed() {
        let mut token = token_at(5.0);
        token.bind(RecordId(1));
        token.show_confirmed(true);
        token.unbind();
        assert!(!token.is_bound());
        assert!(!token.is_confirmed());
        assert!(token.can_move());
    }

    #[test]
    fn test_immovable_column_blocks_movement() {
        let mut token = token_at(5.0);
        token.set_movable(false);
        assert!(!token.can_move());
    }

    #[test]
    fn test_width_counts_chars() {
        let token = Token::new("chèvre", 1, 0, 0, RecordId(0));
        assert_eq!(token.width(), 6);
    }
}
