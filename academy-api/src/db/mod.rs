//! Database access layer for academy-api
//!
//! Everything is scoped by round id. Requests that name a round by class
//! and round number are resolved through [`rounds::resolve_round_id`] first.

pub mod materials;
pub mod rounds;
pub mod scores;

use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::notes::{NoteError, RegionRecord, RegionSource, ScoreSource};

/// SQLite-backed score and region lookups for the note pipeline
#[derive(Clone)]
pub struct Catalog {
    pool: SqlitePool,
}

impl Catalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScoreSource for Catalog {
    async fn wrong_questions(&self, phone: &str, round_id: i64) -> Result<Option<String>, NoteError> {
        Ok(scores::wrong_questions(&self.pool, phone, round_id).await?)
    }
}

#[async_trait]
impl RegionSource for Catalog {
    async fn material_for_round(&self, round_id: i64) -> Result<Option<i64>, NoteError> {
        Ok(materials::material_id_for_round(&self.pool, round_id).await?)
    }

    async fn regions_for_questions(
        &self,
        material_id: i64,
        questions: &BTreeSet<i64>,
    ) -> Result<Vec<RegionRecord>, NoteError> {
        Ok(materials::regions_for_questions(&self.pool, material_id, questions).await?)
    }
}
