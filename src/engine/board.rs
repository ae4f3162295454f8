use std::collections::HashMap;

use rand::Rng;
use tracing::debug;

use crate::engine::arena::Arena;
use crate::engine::column::{Column, LayoutMode};
use crate::engine::record::{Record, RecordKind};
use crate::engine::token::Token;
use crate::engine::{RecordId, TokenId};

/// What a move or a removal did to the set of bound records.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BindingChange {
    /// Records bound by this change, all still live.
    pub bound: Vec<RecordId>,
    /// Number of previously bound records that were dissolved.
    pub released: usize,
}

impl BindingChange {
    pub fn is_empty(&self) -> bool {
        self.bound.is_empty() && self.released == 0
    }

    /// Net change in the number of bound records.
    pub fn delta(&self) -> isize {
        self.bound.len() as isize - self.released as isize
    }
}

/// The grid: one column per field plus every record, default and bound.
#[derive(Clone, Debug)]
pub struct Board {
    columns: Vec<Column>,
    records: Arena<Record>,
}

impl Board {
    pub fn new(column_count: usize, layouts: &[LayoutMode]) -> Self {
        let columns = (0..column_count)
            .map(|i| Column::new(i, LayoutMode::for_column(layouts, i)))
            .collect();
        Self {
            columns,
            records: Arena::new(),
        }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn token(&self, id: TokenId) -> Option<&Token> {
        self.columns.get(id.column)?.token(id.slot)
    }

    fn token_mut(&mut self, id: TokenId) -> Option<&mut Token> {
        self.columns.get_mut(id.column)?.token_mut(id.slot)
    }

    pub fn record(&self, id: RecordId) -> Option<&Record> {
        self.records.get(id.0)
    }

    /// Grid entries: the default records currently on the board.
    pub fn entries(&self) -> impl Iterator<Item = (RecordId, &Record)> {
        self.records
            .iter()
            .filter(|(_, r)| r.kind() == RecordKind::Default)
            .map(|(idx, r)| (RecordId(idx), r))
    }

    pub fn bound_records(&self) -> impl Iterator<Item = (RecordId, &Record)> {
        self.records
            .iter()
            .filter(|(_, r)| r.kind() == RecordKind::Bound)
            .map(|(idx, r)| (RecordId(idx), r))
    }

    pub fn grid_size(&self) -> usize {
        self.entries().count()
    }

    pub fn bound_count(&self) -> usize {
        self.bound_records().count()
    }

    pub fn entry(&self, id: RecordId) -> Option<String> {
        self.record(id).map(|r| r.entry(&self.columns))
    }

    /// The word-list line an entry was dealt from, or its joined fields when it
    /// was inserted without one.
    pub fn literal(&self, id: RecordId) -> Option<String> {
        let record = self.record(id)?;
        Some(
            record
                .line()
                .map_or_else(|| record.entry(&self.columns), str::to_string),
        )
    }

    /// Adds a grid entry: one token per column, tagged with a fresh default record.
    pub fn insert_entry(&mut self, fields: &[&str]) -> RecordId {
        self.insert_record(Record::new(RecordKind::Default), fields)
    }

    /// Adds a grid entry that remembers the full line it came from.
    pub fn insert_line(&mut self, line: &str, fields: &[&str]) -> RecordId {
        self.insert_record(
            Record::new(RecordKind::Default).with_line(line.to_string()),
            fields,
        )
    }

    fn insert_record(&mut self, record: Record, fields: &[&str]) -> RecordId {
        debug_assert_eq!(fields.len(), self.columns.len());
        let id = RecordId(self.records.insert(record));
        for (column, text) in self.columns.iter_mut().zip(fields) {
            let slot = column.add_token(text, id);
            self.records[id.0].push(TokenId::new(column.index(), slot));
        }
        id
    }

    /// Removes every token of a grid entry. Bound records that lose a member are
    /// dissolved and counted as released.
    pub fn remove_entry(&mut self, id: RecordId) -> BindingChange {
        let tokens = match self.records.get(id.0) {
            Some(record) if record.kind() == RecordKind::Default => record.tokens().to_vec(),
            _ => return BindingChange::default(),
        };
        let mut change = BindingChange::default();
        for token in tokens {
            change.released += self.remove_token(token);
        }
        change
    }

    fn remove_token(&mut self, id: TokenId) -> usize {
        let Some(token) = self.token(id) else {
            return 0;
        };
        let current = token.current_record();
        let default = token.default_record();

        let released = match current {
            Some(record) => {
                self.unbind_record(record);
                1
            }
            None => 0,
        };

        self.columns[id.column].remove_token(id.slot);
        if let Some(record) = self.records.get_mut(default.0) {
            record.remove_token(id);
            if record.is_empty() {
                self.records.remove(default.0);
            }
        }
        released
    }

    pub fn clear(&mut self) {
        for column in &mut self.columns {
            column.clear();
        }
        self.records.clear();
    }

    /// Repositions a token and re-runs alignment for it. Locked tokens stay put.
    pub fn move_token(&mut self, id: TokenId, y: f32) -> BindingChange {
        match self.token(id) {
            Some(token) if token.can_move() => {}
            _ => return BindingChange::default(),
        }
        self.columns[id.column].place(id.slot, y);
        self.align(id)
    }

    /// Repositions a token without matching.
    pub fn place(&mut self, id: TokenId, y: f32) {
        if let Some(column) = self.columns.get_mut(id.column) {
            column.place(id.slot, y);
        }
    }

    /// Finds a record whose template is satisfied by the tokens aligned with `t0`
    /// and binds it.
    ///
    /// Each member of `t0`'s duplicate ring, starting at `t0`, offers its default
    /// record as a template. `t0` stands in for that member; every other slot must
    /// be filled by a same-text token near `t0`'s position in its own column. The
    /// first template that fills completely wins. When none does, `t0`'s previous
    /// binding is dissolved.
    pub fn align(&mut self, t0: TokenId) -> BindingChange {
        let Some(token) = self.token(t0) else {
            return BindingChange::default();
        };
        let y = token.y();
        let previous = token.current_record();
        let column = &self.columns[t0.column];

        let mut attempt = None;
        'ring: for candidate in column.ring(t0.slot) {
            let Some(template) = column
                .token(candidate)
                .and_then(|c| self.records.get(c.default_record().0))
            else {
                continue;
            };

            let mut tokens = Vec::with_capacity(template.len());
            for &slot in template.tokens() {
                if slot == TokenId::new(t0.column, candidate) {
                    tokens.push(t0);
                    continue;
                }
                match self.columns[slot.column].check(slot.slot, y) {
                    Some(found) => tokens.push(TokenId::new(slot.column, found)),
                    None => continue 'ring,
                }
            }
            attempt = Some(tokens);
            break;
        }

        match (attempt, previous) {
            (Some(tokens), Some(prev))
                if self
                    .record(prev)
                    .is_some_and(|r| r.tokens() == tokens.as_slice()) =>
            {
                BindingChange::default()
            }
            (Some(tokens), _) => self.bind_record(tokens),
            (None, Some(prev)) => {
                self.unbind_record(prev);
                debug!(column = t0.column, slot = t0.slot, "alignment broken");
                BindingChange {
                    bound: Vec::new(),
                    released: 1,
                }
            }
            (None, None) => BindingChange::default(),
        }
    }

    fn bind_record(&mut self, tokens: Vec<TokenId>) -> BindingChange {
        let mut change = BindingChange::default();
        for &id in &tokens {
            if let Some(previous) = self.token(id).and_then(Token::current_record) {
                self.unbind_record(previous);
                change.released += 1;
            }
        }

        let id = RecordId(
            self.records
                .insert(Record::with_tokens(RecordKind::Bound, tokens.clone())),
        );
        for token in tokens {
            if let Some(token) = self.token_mut(token) {
                token.bind(id);
            }
        }
        debug!(record = id.0, entry = %self.entry(id).unwrap_or_default(), "record bound");
        change.bound.push(id);
        change
    }

    fn unbind_record(&mut self, id: RecordId) {
        let Some(record) = self.records.remove(id.0) else {
            return;
        };
        for &token in record.tokens() {
            if let Some(token) = self.token_mut(token)
                && token.current_record() == Some(id)
            {
                token.unbind();
            }
        }
    }

    /// Repositions every token per its column's layout mode. Bindings are left
    /// as they are; only moves bind.
    pub fn layout_all<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for column in &mut self.columns {
            column.layout(rng);
        }
    }

    pub(crate) fn set_layout_mode(&mut self, column: usize, mode: LayoutMode) {
        if let Some(column) = self.columns.get_mut(column) {
            column.set_layout_mode(mode);
        }
    }

    pub(crate) fn toggle_movable(&mut self, column: usize) -> Option<bool> {
        self.columns.get_mut(column).map(Column::toggle_movable)
    }

    pub(crate) fn toggle_visible(&mut self, column: usize) -> Option<bool> {
        self.columns.get_mut(column).map(Column::toggle_visible)
    }

    /// Shows or hides confirmation on every bound token.
    pub fn reveal(&mut self, shown: bool) {
        for column in &mut self.columns {
            column.reveal(shown);
        }
    }

    pub fn reveal_record(&mut self, id: RecordId) {
        let Some(record) = self.records.get(id.0) else {
            return;
        };
        for token in record.tokens().to_vec() {
            if let Some(token) = self.token_mut(token) {
                token.show_confirmed(true);
            }
        }
    }

    /// Bound records whose confirmation is showing.
    pub fn confirmed_count(&self) -> usize {
        self.bound_records()
            .filter(|(_, r)| self.is_record_confirmed(r))
            .count()
    }

    fn is_record_confirmed(&self, record: &Record) -> bool {
        record
            .tokens()
            .iter()
            .all(|&id| self.token(id).is_some_and(Token::is_confirmed))
    }

    /// Entry texts of confirmed bound records, counted with multiplicity.
    fn confirmed_texts(&self) -> HashMap<String, usize> {
        let mut texts = HashMap::new();
        for (_, record) in self.bound_records() {
            if self.is_record_confirmed(record) {
                *texts.entry(record.entry(&self.columns)).or_insert(0) += 1;
            }
        }
        texts
    }

    /// Splits grid entries into confirmed and unconfirmed. Identical entries are
    /// interchangeable, so a confirmed alignment accounts for any one grid entry
    /// with the same text.
    pub fn partition_entries(&self) -> (Vec<RecordId>, Vec<RecordId>) {
        let mut solved = self.confirmed_texts();
        let mut confirmed = Vec::new();
        let mut unconfirmed = Vec::new();
        for (id, record) in self.entries() {
            let text = record.entry(&self.columns);
            match solved.get_mut(&text) {
                Some(count) if *count > 0 => {
                    *count -= 1;
                    confirmed.push(id);
                }
                _ => unconfirmed.push(id),
            }
        }
        (confirmed, unconfirmed)
    }

    pub fn is_entry_confirmed(&self, id: RecordId) -> bool {
        self.partition_entries().0.contains(&id)
    }

    pub fn unconfirmed_entries(&self) -> Vec<String> {
        self.partition_entries()
            .1
            .into_iter()
            .filter_map(|id| self.entry(id))
            .collect()
    }
}
