use crate::domain::value_objects::CustomerId;
use crate::ports::customer_directory::{CustomerDirectory as CustomerDirectoryTrait, Result};
use async_trait::async_trait;
use sqlx::PgPool;

/// CustomerDirectoryのPostgreSQL実装
///
/// `customers`テーブルを参照するだけで、書き込みは行わない。
pub struct CustomerDirectory {
    pool: PgPool,
}

impl CustomerDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerDirectoryTrait for CustomerDirectory {
    async fn exists(&self, customer_id: CustomerId) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM customers WHERE customer_id = $1)")
                .bind(customer_id.value())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }
}
