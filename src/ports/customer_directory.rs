use crate::domain::value_objects::CustomerId;
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 利用者名簿ポート
///
/// 貸出台帳は利用者の詳細を知らず、CustomerIdのみを扱う。
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    /// 利用者が登録されているか確認する
    async fn exists(&self, customer_id: CustomerId) -> Result<bool>;
}
