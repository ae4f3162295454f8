use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, info};

use crate::config::Config;
use crate::session::PuzzleSession;

const SESSION_FILE: &str = "session.tsv";

/// The word list left over from the last run: bank plus unsolved grid entries.
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new() -> Self {
        Self {
            path: Config::dir().join(SESSION_FILE),
        }
    }

    pub fn with_base_dir(base_dir: &Path) -> Self {
        Self {
            path: base_dir.join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Loads the saved list into `session` and deals a grid. A missing or
    /// unreadable file leaves the session as it was.
    pub fn restore(&self, session: &mut PuzzleSession) -> bool {
        if !self.path.exists() {
            return false;
        }
        match session.load(&self.path) {
            Ok(columns) => {
                session.advance();
                info!(path = %self.path.display(), columns, "restored previous session");
                true
            }
            Err(err) => {
                debug!(error = %err, "no session restored");
                false
            }
        }
    }

    /// Writes what is left to learn. When nothing is left the file is removed.
    pub fn persist(&self, session: &PuzzleSession) -> Result<()> {
        if session.bank().is_empty() && session.board().unconfirmed_entries().is_empty() {
            if self.path.exists() {
                fs::remove_file(&self.path)?;
                info!(path = %self.path.display(), "nothing left to learn, removed session");
            }
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        session.save(&self.path)?;
        Ok(())
    }
}

impl Default for SessionFile {
    fn default() -> Self {
        Self::new()
    }
}
