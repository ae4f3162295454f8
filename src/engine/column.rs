use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::engine::arena::Arena;
use crate::engine::token::Token;
use crate::engine::{RecordId, slot_y};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    #[default]
    Sort,
    Shuffle,
}

impl LayoutMode {
    pub fn as_str(self) -> &'static str {
        match self {
            LayoutMode::Sort => "sort",
            LayoutMode::Shuffle => "shuffle",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            LayoutMode::Sort => LayoutMode::Shuffle,
            LayoutMode::Shuffle => LayoutMode::Sort,
        }
    }

    /// Layout for column `index`; the last configured mode repeats for extra columns.
    pub fn for_column(modes: &[LayoutMode], index: usize) -> LayoutMode {
        modes
            .get(index)
            .or_else(|| modes.last())
            .copied()
            .unwrap_or(LayoutMode::Shuffle)
    }
}

/// All tokens for one field position.
#[derive(Clone, Debug)]
pub struct Column {
    index: usize,
    tokens: Arena<Token>,
    order: Vec<usize>,
    layout: LayoutMode,
    movable: bool,
    visible: bool,
    widest: usize,
    next_seq: u64,
}

impl Column {
    pub fn new(index: usize, layout: LayoutMode) -> Self {
        Self {
            index,
            tokens: Arena::new(),
            order: Vec::new(),
            layout,
            movable: true,
            visible: true,
            widest: 0,
            next_seq: 0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn layout_mode(&self) -> LayoutMode {
        self.layout
    }

    pub fn is_movable(&self) -> bool {
        self.movable
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Width of the widest token, in characters.
    pub fn widest(&self) -> usize {
        self.widest
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn token(&self, slot: usize) -> Option<&Token> {
        self.tokens.get(slot)
    }

    pub(crate) fn token_mut(&mut self, slot: usize) -> Option<&mut Token> {
        self.tokens.get_mut(slot)
    }

    /// Tokens in the column's current order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Token)> {
        self.order.iter().map(|&slot| (slot, &self.tokens[slot]))
    }

    pub fn find(&self, text: &str) -> Option<usize> {
        self.order
            .iter()
            .copied()
            .find(|&slot| self.tokens[slot].text() == text)
    }

    pub(crate) fn add_token(&mut self, text: &str, default_record: RecordId) -> usize {
        let seq = self.next_seq;
        self.next_seq += 1;

        let duplicate = self.find(text);
        let slot = self.tokens.insert(Token::new(text, self.index, 0, seq, default_record));
        let token = &mut self.tokens[slot];
        token.ring_next = slot;
        token.ring_prev = slot;
        token.set_movable(self.movable);
        token.set_visible(self.visible);

        if let Some(existing) = duplicate {
            // Append after the newest member so the ring stays in creation order.
            let newest = self
                .ring(existing)
                .max_by_key(|&s| self.tokens[s].seq())
                .unwrap_or(existing);
            self.splice_after(newest, slot);
        }

        self.order.push(slot);
        self.widest = self.widest.max(self.tokens[slot].width());
        slot
    }

    pub(crate) fn remove_token(&mut self, slot: usize) -> Option<Token> {
        if !self.tokens.contains(slot) {
            return None;
        }
        self.splice_out(slot);
        self.order.retain(|&s| s != slot);
        let token = self.tokens.remove(slot)?;
        if token.width() == self.widest {
            self.recalc_widest();
        }
        Some(token)
    }

    pub(crate) fn clear(&mut self) {
        self.tokens.clear();
        self.order.clear();
        self.widest = 0;
    }

    fn recalc_widest(&mut self) {
        self.widest = self.tokens.iter().map(|(_, t)| t.width()).max().unwrap_or(0);
    }

    fn splice_after(&mut self, anchor: usize, slot: usize) {
        let next = self.tokens[anchor].ring_next;
        self.tokens[slot].ring_prev = anchor;
        self.tokens[slot].ring_next = next;
        self.tokens[anchor].ring_next = slot;
        self.tokens[next].ring_prev = slot;
    }

    fn splice_out(&mut self, slot: usize) {
        let prev = self.tokens[slot].ring_prev;
        let next = self.tokens[slot].ring_next;
        self.tokens[prev].ring_next = next;
        self.tokens[next].ring_prev = prev;
        self.tokens[slot].ring_next = slot;
        self.tokens[slot].ring_prev = slot;
    }

    /// Walks the duplicate ring once, starting at `slot`.
    pub fn ring(&self, slot: usize) -> RingIter<'_> {
        RingIter {
            column: self,
            start: slot,
            next: self.tokens.contains(slot).then_some(slot),
        }
    }

    pub fn ring_len(&self, slot: usize) -> usize {
        self.ring(slot).count()
    }

    /// First ring member, starting at `slot`, positioned in the tolerance window
    /// around `y` and not confirmed. First match wins, not the closest one.
    pub fn check(&self, slot: usize, y: f32) -> Option<usize> {
        self.ring(slot).find(|&s| {
            let token = &self.tokens[s];
            token.in_window(y) && !token.is_confirmed()
        })
    }

    pub(crate) fn set_layout_mode(&mut self, layout: LayoutMode) {
        self.layout = layout;
    }

    /// Reorders the column per its layout mode and assigns fixed-step slots.
    pub(crate) fn layout<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        match self.layout {
            LayoutMode::Shuffle => self.order.shuffle(rng),
            LayoutMode::Sort => {
                let tokens = &self.tokens;
                // sort_by is stable: equal text keeps its prior relative order
                self.order
                    .sort_by(|&a, &b| tokens[a].text().cmp(tokens[b].text()));
            }
        }
        for (row, &slot) in self.order.iter().enumerate() {
            self.tokens[slot].set_y(slot_y(row));
        }
    }

    pub(crate) fn place(&mut self, slot: usize, y: f32) {
        if let Some(token) = self.tokens.get_mut(slot) {
            token.set_y(y);
        }
    }

    pub(crate) fn toggle_movable(&mut self) -> bool {
        self.movable = !self.movable;
        for slot in &self.order {
            self.tokens[*slot].set_movable(self.movable);
        }
        self.movable
    }

    pub(crate) fn toggle_visible(&mut self) -> bool {
        self.visible = !self.visible;
        for slot in &self.order {
            self.tokens[*slot].set_visible(self.visible);
        }
        self.visible
    }

    /// Shows or hides confirmation on every token that currently holds a record.
    pub(crate) fn reveal(&mut self, shown: bool) {
        for slot in &self.order {
            let token = &mut self.tokens[*slot];
            if token.is_bound() {
                token.show_confirmed(shown);
            }
        }
    }
}

pub struct RingIter<'a> {
    column: &'a Column,
    start: usize,
    next: Option<usize>,
}

impl Iterator for RingIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;
        let following = self.column.tokens[current].ring_next;
        self.next = (following != self.start).then_some(following);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn column_with(texts: &[&str]) -> (Column, Vec<usize>) {
        let mut column = Column::new(0, LayoutMode::Sort);
        let slots = texts
            .iter()
            .enumerate()
            .map(|(i, text)| column.add_token(text, RecordId(i)))
            .collect();
        (column, slots)
    }

    fn texts(column: &Column) -> Vec<String> {
        column.iter().map(|(_, t)| t.text().to_string()).collect()
    }

    #[test]
    fn test_duplicates_share_a_ring_in_creation_order() {
        let (column, slots) = column_with(&["cat", "dog", "cat", "cat"]);
        let ring: Vec<usize> = column.ring(slots[0]).collect();
        assert_eq!(ring, vec![slots[0], slots[2], slots[3]]);
        let from_middle: Vec<usize> = column.ring(slots[2]).collect();
        assert_eq!(from_middle, vec![slots[2], slots[3], slots[0]]);
        assert_eq!(column.ring_len(slots[1]), 1);
    }

    #[test]
    fn test_ring_is_circular_after_removal() {
        let (mut column, slots) = column_with(&["cat", "cat", "cat"]);
        column.remove_token(slots[1]);
        assert_eq!(column.ring_len(slots[0]), 2);
        let mut slot = slots[0];
        for _ in 0..2 {
            slot = column.token(slot).unwrap().ring_next;
        }
        assert_eq!(slot, slots[0]);
    }

    #[test]
    fn test_newcomer_after_removal_keeps_creation_order() {
        let (mut column, slots) = column_with(&["cat", "cat"]);
        column.remove_token(slots[0]);
        let late = column.add_token("cat", RecordId(9));
        let ring: Vec<usize> = column.ring(slots[1]).collect();
        assert_eq!(ring, vec![slots[1], late]);
    }

    #[test]
    fn test_check_returns_first_ring_match_not_closest() {
        let (mut column, slots) = column_with(&["cat", "cat", "cat"]);
        column.place(slots[0], 200.0);
        column.place(slots[1], 92.0); // inside the window, far from 100
        column.place(slots[2], 100.0); // exact hit, but later in the ring
        assert_eq!(column.check(slots[0], 100.0), Some(slots[1]));
    }

    #[test]
    fn test_check_skips_confirmed_tokens() {
        let (mut column, slots) = column_with(&["cat", "cat"]);
        column.place(slots[0], 100.0);
        column.place(slots[1], 100.0);
        let token = column.token_mut(slots[0]).unwrap();
        token.bind(RecordId(7));
        token.show_confirmed(true);
        assert_eq!(column.check(slots[0], 100.0), Some(slots[1]));
        column.token_mut(slots[1]).unwrap().show_confirmed(true);
        assert_eq!(column.check(slots[0], 100.0), None);
    }

    #[test]
    fn test_sort_is_idempotent_and_stable() {
        let (mut column, slots) = column_with(&["pear", "apple", "pear", "fig"]);
        let mut rng = SmallRng::seed_from_u64(7);
        column.set_layout_mode(LayoutMode::Shuffle);
        column.layout(&mut rng);
        let pears_before: Vec<usize> = column
            .iter()
            .filter(|(_, t)| t.text() == "pear")
            .map(|(s, _)| s)
            .collect();

        column.set_layout_mode(LayoutMode::Sort);
        column.layout(&mut rng);
        let first: Vec<usize> = column.iter().map(|(s, _)| s).collect();
        column.layout(&mut rng);
        let second: Vec<usize> = column.iter().map(|(s, _)| s).collect();

        assert_eq!(first, second);
        assert_eq!(texts(&column), vec!["apple", "fig", "pear", "pear"]);
        let pears_after: Vec<usize> = column
            .iter()
            .filter(|(_, t)| t.text() == "pear")
            .map(|(s, _)| s)
            .collect();
        assert_eq!(pears_before, pears_after);
        assert!(slots.iter().all(|s| column.token(*s).is_some()));
    }

    #[test]
    fn test_layout_assigns_fixed_step_slots() {
        let (mut column, _) = column_with(&["c", "a", "b"]);
        let mut rng = SmallRng::seed_from_u64(1);
        column.layout(&mut rng);
        let ys: Vec<f32> = column.iter().map(|(_, t)| t.y()).collect();
        assert_eq!(ys, vec![slot_y(0), slot_y(1), slot_y(2)]);
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let words: Vec<String> = (0..20).map(|i| format!("w{i:02}")).collect();
        let refs: Vec<&str> = words.iter().map(String::as_str).collect();
        let (mut column, _) = column_with(&refs);
        column.set_layout_mode(LayoutMode::Shuffle);
        column.layout(&mut SmallRng::seed_from_u64(42));
        let mut shuffled = texts(&column);
        shuffled.sort();
        assert_eq!(shuffled, words);
    }

    #[test]
    fn test_widest_tracks_removal() {
        let (mut column, slots) = column_with(&["ox", "giraffe", "cat"]);
        assert_eq!(column.widest(), 7);
        column.remove_token(slots[1]);
        assert_eq!(column.widest(), 3);
    }

    #[test]
    fn test_toggles_propagate_to_tokens() {
        let (mut column, slots) = column_with(&["a", "b"]);
        assert!(!column.toggle_movable());
        assert!(!column.token(slots[0]).unwrap().can_move());
        assert!(!column.toggle_visible());
        assert!(!column.token(slots[1]).unwrap().is_visible());
        // tokens added later pick up the column flags
        let late = column.add_token("c", RecordId(5));
        assert!(!column.token(late).unwrap().is_movable());
    }

    #[test]
    fn test_reveal_only_touches_bound_tokens() {
        let (mut column, slots) = column_with(&["a", "b"]);
        column.token_mut(slots[0]).unwrap().bind(RecordId(1));
        column.reveal(true);
        assert!(column.token(slots[0]).unwrap().is_confirmed());
        assert!(!column.token(slots[1]).unwrap().is_confirmed());
        column.reveal(false);
        assert!(!column.token(slots[0]).unwrap().is_confirmed());
    }

    #[test]
    fn test_layout_for_column_repeats_last() {
        let modes = [LayoutMode::Sort, LayoutMode::Shuffle];
        assert_eq!(LayoutMode::for_column(&modes, 0), LayoutMode::Sort);
        assert_eq!(LayoutMode::for_column(&modes, 4), LayoutMode::Shuffle);
        assert_eq!(LayoutMode::for_column(&[], 0), LayoutMode::Shuffle);
    }
}
