//! Score lookups

use sqlx::SqlitePool;

/// Wrong-question text of a student's score in a round
///
/// Outer `None`: no score row. A row with a NULL column reads as `None` too.
pub async fn wrong_questions(
    pool: &SqlitePool,
    phone: &str,
    round_id: i64,
) -> Result<Option<String>, sqlx::Error> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("SELECT wrong_questions FROM scores WHERE phone = ? AND round_id = ?")
            .bind(phone)
            .bind(round_id)
            .fetch_optional(pool)
            .await?;

    Ok(row.and_then(|(text,)| text))
}
