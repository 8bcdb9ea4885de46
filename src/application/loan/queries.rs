use crate::domain::{loan::Loan, value_objects::*};
use chrono::NaiveDate;

use super::errors::{CirculationError, Result};
use super::loan_service::{
    MAX_OPEN_LOANS, ServiceDependencies, ensure_book_exists, ensure_customer_exists, load_loan,
};

// 参照系はロックを取らない。毎回リポジトリから読み直す。

/// IDで貸出を取得する
pub async fn get_loan(deps: &ServiceDependencies, loan_id: LoanId) -> Result<Loan> {
    load_loan(&deps.loan_repository, loan_id).await
}

/// 書籍が貸出可能か（未返却の貸出がないか）
///
/// カタログに存在しない書籍は`BookNotFound`。
pub async fn is_available(deps: &ServiceDependencies, book_id: BookId) -> Result<bool> {
    ensure_book_exists(deps, book_id).await?;

    let current = deps
        .loan_repository
        .find_open_for_book(book_id)
        .await
        .map_err(CirculationError::RepositoryError)?;

    Ok(current.is_none())
}

/// 利用者がさらに借りられるか（未返却が上限未満か）
pub async fn can_customer_borrow(
    deps: &ServiceDependencies,
    customer_id: CustomerId,
) -> Result<bool> {
    ensure_customer_exists(deps, customer_id).await?;

    let open_loans = deps
        .loan_repository
        .count_open_for_customer(customer_id)
        .await
        .map_err(CirculationError::RepositoryError)?;

    Ok(open_loans < MAX_OPEN_LOANS)
}

/// 利用者の現在の貸出（返却期限の近い順）
pub async fn list_current(deps: &ServiceDependencies, customer_id: CustomerId) -> Result<Vec<Loan>> {
    deps.loan_repository
        .find_open_by_customer(customer_id)
        .await
        .map_err(CirculationError::RepositoryError)
}

/// 利用者の貸出履歴（返却日の新しい順）
pub async fn list_history(deps: &ServiceDependencies, customer_id: CustomerId) -> Result<Vec<Loan>> {
    deps.loan_repository
        .find_closed_by_customer(customer_id)
        .await
        .map_err(CirculationError::RepositoryError)
}

/// 書籍の貸出履歴（貸出日の新しい順、貸出中を含む）
pub async fn list_book_history(deps: &ServiceDependencies, book_id: BookId) -> Result<Vec<Loan>> {
    deps.loan_repository
        .find_by_book(book_id)
        .await
        .map_err(CirculationError::RepositoryError)
}

/// `today`時点の延滞貸出（返却期限の古い順）
pub async fn list_overdue(deps: &ServiceDependencies, today: NaiveDate) -> Result<Vec<Loan>> {
    deps.loan_repository
        .find_overdue(today)
        .await
        .map_err(CirculationError::RepositoryError)
}
