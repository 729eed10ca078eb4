//! Round scoping

use sqlx::SqlitePool;

/// How a request names its round
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundScope {
    Id(i64),
    ClassRound { class_name: String, round_number: i64 },
}

/// Resolve a scope to the canonical round id; `None` if no such round
pub async fn resolve_round_id(pool: &SqlitePool, scope: &RoundScope) -> Result<Option<i64>, sqlx::Error> {
    match scope {
        RoundScope::Id(id) => {
            sqlx::query_scalar("SELECT id FROM rounds WHERE id = ?")
                .bind(id)
                .fetch_optional(pool)
                .await
        }
        RoundScope::ClassRound {
            class_name,
            round_number,
        } => {
            sqlx::query_scalar("SELECT id FROM rounds WHERE class_name = ? AND round_number = ?")
                .bind(class_name)
                .bind(round_number)
                .fetch_optional(pool)
                .await
        }
    }
}
