use crate::engine::TokenId;
use crate::engine::column::Column;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    /// The home record a grid entry was created with.
    Default,
    /// A record formed by spatial alignment.
    Bound,
}

/// One answer: a token per column, in column order.
#[derive(Clone, Debug)]
pub struct Record {
    kind: RecordKind,
    tokens: Vec<TokenId>,
    /// Word-list line a default record was dealt from, extra fields included.
    line: Option<String>,
}

impl Record {
    pub(crate) fn new(kind: RecordKind) -> Self {
        Self {
            kind,
            tokens: Vec::new(),
            line: None,
        }
    }

    pub(crate) fn with_tokens(kind: RecordKind, tokens: Vec<TokenId>) -> Self {
        Self {
            kind,
            tokens,
            line: None,
        }
    }

    pub(crate) fn with_line(mut self, line: String) -> Self {
        self.line = Some(line);
        self
    }

    pub fn line(&self) -> Option<&str> {
        self.line.as_deref()
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn tokens(&self) -> &[TokenId] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn contains(&self, id: TokenId) -> bool {
        self.tokens.contains(&id)
    }

    pub(crate) fn push(&mut self, id: TokenId) {
        self.tokens.push(id);
    }

    pub(crate) fn remove_token(&mut self, id: TokenId) {
        self.tokens.retain(|&t| t != id);
    }

    /// Field values joined with tabs, in column order.
    pub fn entry(&self, columns: &[Column]) -> String {
        self.tokens
            .iter()
            .filter_map(|id| columns.get(id.column)?.token(id.slot))
            .map(|token| token.text())
            .collect::<Vec<_>>()
            .join("\t")
    }
}
