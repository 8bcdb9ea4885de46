#![allow(dead_code)]

use library_circulation::adapters::mock::{BookCatalog, CustomerDirectory, LoanRepository};
use library_circulation::application::loan::ServiceDependencies;
use library_circulation::domain::value_objects::{BookId, CustomerId};
use sqlx::PgPool;
use std::sync::Arc;

/// インメモリアダプターで組み立てた貸出台帳
///
/// テストからカタログ・名簿・リポジトリを直接操作できるよう、
/// 具象型のArcも保持する。
pub struct TestLedger {
    pub deps: ServiceDependencies,
    pub repository: Arc<LoanRepository>,
    pub catalog: Arc<BookCatalog>,
    pub directory: Arc<CustomerDirectory>,
}

impl TestLedger {
    pub fn new() -> Self {
        let repository = Arc::new(LoanRepository::new());
        let catalog = Arc::new(BookCatalog::new());
        let directory = Arc::new(CustomerDirectory::new());

        let deps =
            ServiceDependencies::new(repository.clone(), catalog.clone(), directory.clone());

        Self {
            deps,
            repository,
            catalog,
            directory,
        }
    }

    /// 同じストレージを共有し、ロックだけ別の依存関係（別プロセス相当）
    pub fn second_process(&self) -> ServiceDependencies {
        ServiceDependencies::new(
            self.repository.clone(),
            self.catalog.clone(),
            self.directory.clone(),
        )
    }

    pub fn add_book(&self) -> BookId {
        let book_id = BookId::new();
        self.catalog.add_book(book_id);
        book_id
    }

    pub fn add_customer(&self) -> CustomerId {
        let customer_id = CustomerId::new();
        self.directory.add_customer(customer_id);
        customer_id
    }
}

/// テスト用データベースプールを作成し、マイグレーションを実行
///
/// DATABASE_URLが未設定の場合は`None`を返し、呼び出し側のテストはスキップする。
pub async fn create_test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL is not set; skipping PostgreSQL test");
        return None;
    };

    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    // 本番と同じマイグレーションを適用
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    Some(pool)
}
