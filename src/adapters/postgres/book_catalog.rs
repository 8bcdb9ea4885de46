use crate::domain::value_objects::BookId;
use crate::ports::book_catalog::{BookCatalog as BookCatalogTrait, Result};
use async_trait::async_trait;
use sqlx::PgPool;

/// BookCatalogのPostgreSQL実装
///
/// `books`テーブルを参照するだけで、書き込みは行わない。
pub struct BookCatalog {
    pool: PgPool,
}

impl BookCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookCatalogTrait for BookCatalog {
    async fn exists(&self, book_id: BookId) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM books WHERE book_id = $1)")
                .bind(book_id.value())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }
}
