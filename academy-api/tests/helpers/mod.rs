//! Shared fixtures for academy-api integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use academy_api::storage::{DocumentStore, StorageError};
use async_trait::async_trait;
use lopdf::{dictionary, Document, Object, Stream};
use sqlx::SqlitePool;

pub const A4: (f32, f32) = (595.28, 841.89);

/// Blank PDF with one page per entry
pub fn blank_pdf(sizes: &[(f32, f32)]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = sizes
        .iter()
        .map(|(w, h)| {
            let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Real(*w), Object::Real(*h)],
            });
            page_id.into()
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => sizes.len() as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).expect("Should serialize fixture PDF");
    out
}

/// Decode a `data:application/pdf;base64,` URI and return its page count
pub fn data_uri_page_count(uri: &str) -> usize {
    use base64::Engine;

    let encoded = uri
        .strip_prefix("data:application/pdf;base64,")
        .expect("Should be a PDF data URI");
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .expect("Should be valid base64");
    Document::load_mem(&bytes)
        .expect("Should load cropped PDF")
        .get_pages()
        .len()
}

/// In-memory document store that counts reads
#[derive(Default)]
pub struct CountingStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    gets: AtomicUsize,
    unavailable: bool,
}

impl CountingStore {
    pub fn with_object(key: &str, data: Vec<u8>) -> Self {
        let store = Self::default();
        store.objects.lock().unwrap().insert(key.to_string(), data);
        store
    }

    /// Store whose every read fails as if the backend were down
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl DocumentStore for CountingStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(StorageError::Unavailable("connection refused".to_string()));
        }
        self.object(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn put(&self, key: &str, data: Vec<u8>, _content_type: &str) -> Result<String, StorageError> {
        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(format!("memory://{}", key))
    }
}

/// Insert a round and return its id
pub async fn seed_round(pool: &SqlitePool, class_name: &str, round_number: i64) -> i64 {
    sqlx::query("INSERT INTO rounds (class_name, round_number) VALUES (?, ?)")
        .bind(class_name)
        .bind(round_number)
        .execute(pool)
        .await
        .expect("Should insert round")
        .last_insert_rowid()
}

/// Insert a material for a round and return its id
pub async fn seed_material(pool: &SqlitePool, round_id: i64, file_key: &str, total_pages: i64) -> i64 {
    sqlx::query(
        "INSERT INTO materials (round_id, material_name, file_key, total_pages) VALUES (?, 'exam', ?, ?)",
    )
    .bind(round_id)
    .bind(file_key)
    .bind(total_pages)
    .execute(pool)
    .await
    .expect("Should insert material")
    .last_insert_rowid()
}

pub async fn seed_region(pool: &SqlitePool, material_id: i64, question_number: i64, page_number: i64) {
    sqlx::query(
        "INSERT INTO question_regions (material_id, question_number, page_number, x, y, width, height)
         VALUES (?, ?, ?, 100, 50, 200, 80)",
    )
    .bind(material_id)
    .bind(question_number)
    .bind(page_number)
    .execute(pool)
    .await
    .expect("Should insert region");
}

pub async fn seed_score(pool: &SqlitePool, round_id: i64, phone: &str, wrong_questions: Option<&str>) {
    sqlx::query("INSERT INTO scores (round_id, phone, wrong_questions) VALUES (?, ?, ?)")
        .bind(round_id)
        .bind(phone)
        .bind(wrong_questions)
        .execute(pool)
        .await
        .expect("Should insert score");
}
