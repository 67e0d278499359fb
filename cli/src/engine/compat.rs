//! Schema compatibility for statement databases written by older builds.
//!
//! Early databases predate the per-bot namespace and have no `bot` column.
//! [`apply`] patches such a table in place so the engine's queries can run.
//! It must run after the table exists and before anything touches `bot`.

use rusqlite::Connection;
use tracing::{info, warn};

const SQL_HAS_COLUMN: &str = include_str!("../../sql/has_column.sql");
const SQL_ADD_BOT_COLUMN: &str = include_str!("../../sql/add_bot_column.sql");

/// Ensures the `statement` table carries the `bot` column.
///
/// Returns `true` if the column exists afterwards and `false` if the table
/// could not be inspected or patched. Never fails; safe to call repeatedly.
pub fn apply(conn: &Connection) -> bool {
    match has_bot_column(conn) {
        Ok(true) => true,
        Ok(false) => match conn.execute_batch(SQL_ADD_BOT_COLUMN) {
            Ok(()) => {
                info!("Added namespace column to legacy statement table.");
                true
            }
            Err(e) => {
                warn!("Failed to patch legacy statement table: {}", e);
                false
            }
        },
        Err(e) => {
            warn!("Failed to inspect statement table: {}", e);
            false
        }
    }
}

fn has_bot_column(conn: &Connection) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(SQL_HAS_COLUMN, ["bot"], |row| row.get(0))?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY_SCHEMA: &str = "CREATE TABLE statement (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        text TEXT NOT NULL,
        in_response_to TEXT,
        conversation TEXT NOT NULL DEFAULT '',
        persona TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    );";

    #[test]
    fn patches_legacy_table_once() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(LEGACY_SCHEMA).unwrap();
        conn.execute(
            "INSERT INTO statement (text, created_at) VALUES ('old', 'then')",
            [],
        )
        .unwrap();

        assert!(!has_bot_column(&conn).unwrap());
        assert!(apply(&conn));
        assert!(has_bot_column(&conn).unwrap());

        // Idempotent: second application is a no-op.
        assert!(apply(&conn));

        let bot: String = conn
            .query_row("SELECT bot FROM statement WHERE text = 'old'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(bot, "");
    }

    #[test]
    fn current_schema_needs_no_patch() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(include_str!("../../sql/schema.sql"))
            .unwrap();
        assert!(apply(&conn));
    }

    #[test]
    fn missing_table_reports_false() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(!apply(&conn));
    }
}
