//! Material and question region queries

use std::collections::BTreeSet;

use academy_common::db::{Material, MaterialSummary, QuestionRegion};
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::info;

use crate::notes::RegionRecord;

/// Material row to insert after its document has been stored
#[derive(Debug, Clone)]
pub struct NewMaterial {
    pub round_id: i64,
    pub material_name: String,
    pub file_key: String,
    pub file_url: Option<String>,
    pub total_pages: Option<i64>,
}

/// Region as drawn in the editor
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRegion {
    pub question_number: i64,
    pub page_number: i64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

pub async fn material_id_for_round(pool: &SqlitePool, round_id: i64) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT id FROM materials WHERE round_id = ?")
        .bind(round_id)
        .fetch_optional(pool)
        .await
}

/// Regions of one material restricted to `questions`, ascending by question
/// number, each carrying the material's storage key
pub async fn regions_for_questions(
    pool: &SqlitePool,
    material_id: i64,
    questions: &BTreeSet<i64>,
) -> Result<Vec<RegionRecord>, sqlx::Error> {
    if questions.is_empty() {
        return Ok(Vec::new());
    }

    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT m.file_key AS storage_key, qr.question_number, qr.page_number, \
                qr.x, qr.y, qr.width, qr.height \
         FROM materials m \
         JOIN question_regions qr ON m.id = qr.material_id \
         WHERE m.id = ",
    );
    query.push_bind(material_id);
    query.push(" AND qr.question_number IN (");
    let mut in_list = query.separated(", ");
    for question in questions {
        in_list.push_bind(*question);
    }
    in_list.push_unseparated(")");
    query.push(" ORDER BY qr.question_number ASC");

    query.build_query_as::<RegionRecord>().fetch_all(pool).await
}

pub async fn round_exists(pool: &SqlitePool, round_id: i64) -> Result<bool, sqlx::Error> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM rounds WHERE id = ?")
        .bind(round_id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

pub async fn insert_material(pool: &SqlitePool, material: &NewMaterial) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO materials (round_id, material_name, file_key, file_url, total_pages)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(material.round_id)
    .bind(&material.material_name)
    .bind(&material.file_key)
    .bind(&material.file_url)
    .bind(material.total_pages)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// All materials with their class and round number, newest first
pub async fn list_materials(pool: &SqlitePool) -> Result<Vec<MaterialSummary>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT m.id, m.round_id, m.material_name, m.file_key, m.file_url, m.total_pages,
               m.uploaded_at, r.class_name, r.round_number
        FROM materials m
        JOIN rounds r ON m.round_id = r.id
        ORDER BY m.uploaded_at DESC, m.id DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn get_material(pool: &SqlitePool, material_id: i64) -> Result<Option<Material>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, round_id, material_name, file_key, file_url, total_pages, uploaded_at
         FROM materials WHERE id = ?",
    )
    .bind(material_id)
    .fetch_optional(pool)
    .await
}

pub async fn regions_for_material(
    pool: &SqlitePool,
    material_id: i64,
) -> Result<Vec<QuestionRegion>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, material_id, question_number, page_number, x, y, width, height
         FROM question_regions WHERE material_id = ?
         ORDER BY question_number ASC",
    )
    .bind(material_id)
    .fetch_all(pool)
    .await
}

/// Replace every region of a material in one transaction
///
/// Delete-all-then-insert-all; on any failure nothing changes.
pub async fn replace_regions(
    pool: &SqlitePool,
    material_id: i64,
    regions: &[NewRegion],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM question_regions WHERE material_id = ?")
        .bind(material_id)
        .execute(&mut *tx)
        .await?;

    for region in regions {
        sqlx::query(
            r#"
            INSERT INTO question_regions (material_id, question_number, page_number, x, y, width, height)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(material_id)
        .bind(region.question_number)
        .bind(region.page_number)
        .bind(region.x)
        .bind(region.y)
        .bind(region.width)
        .bind(region.height)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    info!(material_id, count = regions.len(), "Replaced question regions");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use academy_common::db::init_memory_database;

    async fn seeded() -> SqlitePool {
        let pool = init_memory_database().await.unwrap();
        sqlx::query("INSERT INTO rounds (id, class_name, round_number) VALUES (1, 'A1', 5)")
            .execute(&pool)
            .await
            .unwrap();
        insert_material(
            &pool,
            &NewMaterial {
                round_id: 1,
                material_name: "5회차 시험지".to_string(),
                file_key: "materials/1_exam.pdf".to_string(),
                file_url: None,
                total_pages: Some(2),
            },
        )
        .await
        .unwrap();
        pool
    }

    fn region(question_number: i64, page_number: i64) -> NewRegion {
        NewRegion {
            question_number,
            page_number,
            x: 10.0,
            y: 20.0,
            width: 100.0,
            height: 50.0,
        }
    }

    #[tokio::test]
    async fn test_regions_filtered_and_ordered() {
        let pool = seeded().await;
        replace_regions(&pool, 1, &[region(15, 2), region(3, 1), region(7, 1), region(9, 2)])
            .await
            .unwrap();

        let questions: BTreeSet<i64> = [15, 3, 7, 42].into_iter().collect();
        let rows = regions_for_questions(&pool, 1, &questions).await.unwrap();

        let numbers: Vec<i64> = rows.iter().map(|r| r.question_number).collect();
        assert_eq!(numbers, vec![3, 7, 15]);
        assert!(rows.iter().all(|r| r.storage_key == "materials/1_exam.pdf"));
    }

    #[tokio::test]
    async fn test_unknown_material_is_empty() {
        let pool = seeded().await;
        let questions: BTreeSet<i64> = [1].into_iter().collect();
        assert!(regions_for_questions(&pool, 99, &questions).await.unwrap().is_empty());
        assert!(regions_for_questions(&pool, 1, &BTreeSet::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_overwrites_previous_regions() {
        let pool = seeded().await;
        replace_regions(&pool, 1, &[region(1, 1), region(2, 1)]).await.unwrap();
        replace_regions(&pool, 1, &[region(5, 2)]).await.unwrap();

        let rows = regions_for_material(&pool, 1).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].question_number, 5);
        assert_eq!(rows[0].page_number, 2);
    }

    #[tokio::test]
    async fn test_replace_rolls_back_on_failure() {
        let pool = seeded().await;
        replace_regions(&pool, 1, &[region(1, 1)]).await.unwrap();

        // Duplicate question number violates UNIQUE(material_id, question_number)
        let result = replace_regions(&pool, 1, &[region(2, 1), region(2, 2)]).await;
        assert!(result.is_err());

        let rows = regions_for_material(&pool, 1).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].question_number, 1);
    }

    #[tokio::test]
    async fn test_material_lookup_by_round() {
        let pool = seeded().await;
        assert_eq!(material_id_for_round(&pool, 1).await.unwrap(), Some(1));
        assert_eq!(material_id_for_round(&pool, 2).await.unwrap(), None);

        let listed = list_materials(&pool).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].class_name, "A1");
        assert_eq!(listed[0].round_number, 5);
    }
}
