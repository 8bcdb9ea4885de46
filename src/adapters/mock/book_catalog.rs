use crate::domain::value_objects::BookId;
use crate::ports::book_catalog::{BookCatalog as BookCatalogTrait, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

/// BookCatalogのインメモリ実装
///
/// 登録した書籍IDだけを「存在する」と答える。
pub struct BookCatalog {
    books: Mutex<HashSet<BookId>>,
}

impl BookCatalog {
    pub fn new() -> Self {
        Self {
            books: Mutex::new(HashSet::new()),
        }
    }

    /// 書籍を登録
    pub fn add_book(&self, book_id: BookId) {
        self.books
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(book_id);
    }
}

impl Default for BookCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookCatalogTrait for BookCatalog {
    async fn exists(&self, book_id: BookId) -> Result<bool> {
        let books = self.books.lock().map_err(|e| e.to_string())?;
        Ok(books.contains(&book_id))
    }
}
