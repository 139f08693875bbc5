//! Append-only transcript store keyed by session id.
//!
//! Each processing pass works under a freshly minted session id and never
//! reads another session's rows, so no locking is layered on top of the
//! database.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::errors::BotError;
use crate::threads::{Role, Turn};

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Appends turns to the session transcript, preserving order.
    async fn append(&self, session_id: Uuid, turns: &[Turn]) -> Result<(), BotError>;

    /// Loads the session transcript in insertion order.
    async fn load(&self, session_id: Uuid) -> Result<Vec<Turn>, BotError>;

    /// Wipes the whole table scope; called once at drain time. Returns the
    /// number of rows removed.
    async fn clear_all(&self) -> Result<u64, BotError>;
}

/// Postgres-backed store. The table name comes from configuration and is
/// identifier-validated at load time, before it is ever interpolated here.
pub struct PgSessionStore {
    pool: PgPool,
    table: String,
}

impl PgSessionStore {
    /// Connects a fresh pool and wraps it around the configured table.
    pub async fn connect(database_url: &str, table: &str) -> Result<Self, BotError> {
        info!("Connecting to PostgreSQL...");
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        info!("PostgreSQL connection pool established");
        Ok(PgSessionStore {
            pool,
            table: table.to_string(),
        })
    }

    /// Creates the transcript table when missing.
    pub async fn ensure_schema(&self) -> Result<(), BotError> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id BIGSERIAL PRIMARY KEY,
                session_id UUID NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )
            "#,
            self.table
        ))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn append(&self, session_id: Uuid, turns: &[Turn]) -> Result<(), BotError> {
        let statement = format!(
            "INSERT INTO {} (session_id, role, content, created_at) VALUES ($1, $2, $3, $4)",
            self.table
        );
        for turn in turns {
            sqlx::query(&statement)
                .bind(session_id)
                .bind(role_str(turn.role))
                .bind(&turn.content)
                .bind(chrono::Utc::now())
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    async fn load(&self, session_id: Uuid) -> Result<Vec<Turn>, BotError> {
        let rows = sqlx::query(&format!(
            "SELECT role, content FROM {} WHERE session_id = $1 ORDER BY id",
            self.table
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let role: String = row.try_get("role")?;
                let content: String = row.try_get("content")?;
                Ok(match role.as_str() {
                    "agent" => Turn::agent(content),
                    _ => Turn::human(content),
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(BotError::from)
    }

    async fn clear_all(&self) -> Result<u64, BotError> {
        let result = sqlx::query(&format!("DELETE FROM {}", self.table))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::Human => "human",
        Role::Agent => "agent",
    }
}

/// In-memory store backing the orchestration tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: std::sync::Mutex<std::collections::HashMap<Uuid, Vec<Turn>>>,
}

#[cfg(test)]
impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_rows(&self) -> usize {
        self.sessions.lock().unwrap().values().map(Vec::len).sum()
    }
}

#[cfg(test)]
#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn append(&self, session_id: Uuid, turns: &[Turn]) -> Result<(), BotError> {
        self.sessions
            .lock()
            .unwrap()
            .entry(session_id)
            .or_default()
            .extend_from_slice(turns);
        Ok(())
    }

    async fn load(&self, session_id: Uuid) -> Result<Vec<Turn>, BotError> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .get(&session_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn clear_all(&self) -> Result<u64, BotError> {
        let mut sessions = self.sessions.lock().unwrap();
        let rows: usize = sessions.values().map(Vec::len).sum();
        sessions.clear();
        Ok(rows as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_str_matches_stored_values() {
        assert_eq!(role_str(Role::Human), "human");
        assert_eq!(role_str(Role::Agent), "agent");
    }

    #[tokio::test]
    async fn test_memory_store_appends_in_order() {
        let store = MemorySessionStore::new();
        let session = Uuid::new_v4();
        store
            .append(session, &[Turn::human("а"), Turn::agent("б")])
            .await
            .unwrap();
        store.append(session, &[Turn::human("в")]).await.unwrap();

        let transcript = store.load(session).await.unwrap();
        assert_eq!(
            transcript,
            vec![Turn::human("а"), Turn::agent("б"), Turn::human("в")]
        );
    }

    #[tokio::test]
    async fn test_memory_store_sessions_are_isolated() {
        let store = MemorySessionStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store.append(a, &[Turn::human("моё")]).await.unwrap();
        assert!(store.load(b).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_clear_all_reports_rows() {
        let store = MemorySessionStore::new();
        store
            .append(Uuid::new_v4(), &[Turn::human("1"), Turn::agent("2")])
            .await
            .unwrap();
        assert_eq!(store.clear_all().await.unwrap(), 2);
        assert_eq!(store.total_rows(), 0);
    }
}
