//! SQLite statement store.
//!
//! Each row is one utterance. `in_response_to` links a reply to the text it
//! answered; the distinct `in_response_to` values of a bot are the prompts the
//! best-match adapter compares input against. All SQL lives in `cli/sql/`.

use crate::core::error::{ChatError, Result};
use crate::engine::compat;
use anyhow::{anyhow, Context};
use rusqlite::Connection;
use std::path::Path;
use tracing::debug;

const SQL_SCHEMA: &str = include_str!("../../sql/schema.sql");
const SQL_INDEXES: &str = include_str!("../../sql/indexes.sql");
const SQL_INSERT_STATEMENT: &str = include_str!("../../sql/insert_statement.sql");
const SQL_SELECT_PROMPTS: &str = include_str!("../../sql/select_prompts.sql");
const SQL_SELECT_RESPONSES: &str = include_str!("../../sql/select_responses.sql");
const SQL_COUNT_STATEMENTS: &str = include_str!("../../sql/count_statements.sql");
const SQL_COUNT_EXCHANGE: &str = include_str!("../../sql/count_exchange.sql");

/// A statement about to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStatement<'a> {
    pub bot: &'a str,
    pub text: &'a str,
    pub in_response_to: Option<&'a str>,
    pub conversation: &'a str,
    pub persona: &'a str,
}

/// The engine's storage session.
pub struct SqliteStorage {
    conn: Option<Connection>,
}

impl SqliteStorage {
    /// Open or create the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Opening statement database at {}", path.display());
        let conn = Connection::open(path).map_err(ChatError::from)?;
        Self::init(conn)
    }

    /// A throwaway database, for tests.
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(ChatError::from)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SQL_SCHEMA)
            .map_err(ChatError::from)
            .context("Failed to create statement table")?;
        if !compat::apply(&conn) {
            return Err(anyhow!(ChatError::Storage(
                "statement table is missing the namespace column and could not be patched"
                    .to_string()
            )));
        }
        conn.execute_batch(SQL_INDEXES)
            .map_err(ChatError::from)
            .context("Failed to create statement indexes")?;
        Ok(Self { conn: Some(conn) })
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn
            .as_ref()
            .ok_or_else(|| anyhow!(ChatError::Storage("session is closed".to_string())))
    }

    pub fn insert(&self, statement: &NewStatement<'_>) -> Result<()> {
        let created_at = chrono::Utc::now().to_rfc3339();
        self.conn()?
            .execute(
                SQL_INSERT_STATEMENT,
                rusqlite::params![
                    statement.bot,
                    statement.text,
                    statement.in_response_to,
                    statement.conversation,
                    statement.persona,
                    created_at,
                ],
            )
            .map_err(ChatError::from)?;
        Ok(())
    }

    /// Distinct texts that some stored statement answers, oldest first.
    pub fn prompts(&self, bot: &str) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(SQL_SELECT_PROMPTS).map_err(ChatError::from)?;
        let rows = stmt
            .query_map([bot], |row| row.get::<_, String>(0))
            .map_err(ChatError::from)?;
        let prompts = rows
            .collect::<rusqlite::Result<Vec<String>>>()
            .map_err(ChatError::from)?;
        Ok(prompts)
    }

    /// Every stored reply to `prompt`, in insertion order (duplicates kept).
    pub fn responses_to(&self, bot: &str, prompt: &str) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(SQL_SELECT_RESPONSES)
            .map_err(ChatError::from)?;
        let rows = stmt
            .query_map([bot, prompt], |row| row.get::<_, String>(0))
            .map_err(ChatError::from)?;
        let responses = rows
            .collect::<rusqlite::Result<Vec<String>>>()
            .map_err(ChatError::from)?;
        Ok(responses)
    }

    pub fn count(&self, bot: &str) -> Result<usize> {
        let count: i64 = self
            .conn()?
            .query_row(SQL_COUNT_STATEMENTS, [bot], |row| row.get(0))
            .map_err(ChatError::from)?;
        Ok(count as usize)
    }

    /// True if `conversation` already holds `text` as a reply to `prompt`.
    pub fn has_exchange(
        &self,
        bot: &str,
        conversation: &str,
        prompt: &str,
        text: &str,
    ) -> Result<bool> {
        let count: i64 = self
            .conn()?
            .query_row(SQL_COUNT_EXCHANGE, [bot, conversation, prompt, text], |row| {
                row.get(0)
            })
            .map_err(ChatError::from)?;
        Ok(count > 0)
    }

    /// Closes the connection. Closing an already closed session is a no-op.
    pub fn close(&mut self) -> Result<()> {
        match self.conn.take() {
            Some(conn) => {
                conn.close().map_err(|(_, e)| ChatError::from(e))?;
                debug!("Statement database closed.");
                Ok(())
            }
            None => Ok(()),
        }
    }
}
