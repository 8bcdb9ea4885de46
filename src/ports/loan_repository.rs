use crate::domain::{
    events::{DomainEvent, LoanIssued},
    loan::{Loan, OpenLoan},
    value_objects::{BookId, CustomerId, LoanId},
};
use async_trait::async_trait;
use chrono::NaiveDate;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 書き込み結果
///
/// ストレージ層の制約に阻まれた書き込みは`Conflict`として返し、
/// インフラ障害（`Err`）とは区別する。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied,
    Conflict,
}

/// 貸出リポジトリポート
///
/// 貸出台帳の唯一の永続化先。貸出の状態と監査イベントを
/// 同一トランザクションで書き込む。
#[async_trait]
pub trait LoanRepository: Send + Sync {
    /// 新しい貸出を保存する
    ///
    /// 同じ書籍に未返却の貸出が既にある場合は`WriteOutcome::Conflict`を返し、
    /// 何も書き込まない。
    async fn insert(&self, loan: &OpenLoan, event: &LoanIssued) -> Result<WriteOutcome>;

    /// 既存の貸出の状態を置き換える
    ///
    /// `expected`は`loan`を計算する元になった読み取り時点の状態。
    /// 保存済みの貸出が未返却で、返却期限・更新済みフラグが`expected`と
    /// 一致する場合だけ書き込む。それ以外（返却済み、または別の書き込みが
    /// 先に入った）は`WriteOutcome::Conflict`を返し、何も書き込まない。
    async fn update(
        &self,
        expected: &Loan,
        loan: &Loan,
        event: &DomainEvent,
    ) -> Result<WriteOutcome>;

    /// IDで貸出を取得する
    async fn find_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>>;

    /// 利用者の未返却貸出数を数える
    ///
    /// 貸出上限（5冊）の確認に使用される。
    async fn count_open_for_customer(&self, customer_id: CustomerId) -> Result<usize>;

    /// 書籍の未返却貸出を取得する
    async fn find_open_for_book(&self, book_id: BookId) -> Result<Option<Loan>>;

    /// 利用者の未返却貸出（返却期限の昇順）
    async fn find_open_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Loan>>;

    /// 利用者の返却済み貸出（返却日の降順）
    async fn find_closed_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Loan>>;

    /// 書籍の全貸出（貸出日の降順）
    async fn find_by_book(&self, book_id: BookId) -> Result<Vec<Loan>>;

    /// `today`時点で延滞中の貸出（返却期限の昇順）
    async fn find_overdue(&self, today: NaiveDate) -> Result<Vec<Loan>>;

    /// 貸出の監査イベントを記録順に取得する
    async fn events_for(&self, loan_id: LoanId) -> Result<Vec<DomainEvent>>;
}
