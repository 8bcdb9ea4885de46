use crate::domain::{RenewLoanError, ReturnLoanError};
use thiserror::Error;

/// 貸出台帳アプリケーション層のエラー
///
/// 業務ルールによる拒否とインフラ障害の2系統に分かれる。
/// インフラ障害は自動で再試行しない。
#[derive(Debug, Error)]
pub enum CirculationError {
    /// 利用者が存在しない
    #[error("Customer not found")]
    CustomerNotFound,

    /// 書籍が存在しない
    #[error("Book not found")]
    BookNotFound,

    /// 貸出上限（5冊）に達している
    #[error("Borrow limit exceeded (max 5 open loans)")]
    BorrowLimitExceeded,

    /// 書籍が貸出中
    #[error("Book is already on loan")]
    BookUnavailable,

    /// 貸出が見つからない
    #[error("Loan not found")]
    LoanNotFound,

    /// 既に1回更新済み
    #[error("Loan has already been renewed once")]
    AlreadyRenewed,

    /// 既に返却済み
    #[error("Loan is already closed")]
    LoanAlreadyClosed,

    /// LoanRepositoryのエラー
    #[error("Loan repository error")]
    RepositoryError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// BookCatalogのエラー
    #[error("Book catalog error")]
    BookCatalogError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// CustomerDirectoryのエラー
    #[error("Customer directory error")]
    CustomerDirectoryError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl CirculationError {
    /// 業務ルールによる拒否か（呼び出し側で対処すべき想定内の結果）
    pub fn is_rejection(&self) -> bool {
        !matches!(
            self,
            CirculationError::RepositoryError(_)
                | CirculationError::BookCatalogError(_)
                | CirculationError::CustomerDirectoryError(_)
        )
    }
}

impl From<RenewLoanError> for CirculationError {
    fn from(err: RenewLoanError) -> Self {
        match err {
            RenewLoanError::AlreadyClosed => CirculationError::LoanAlreadyClosed,
            RenewLoanError::AlreadyRenewed => CirculationError::AlreadyRenewed,
        }
    }
}

impl From<ReturnLoanError> for CirculationError {
    fn from(err: ReturnLoanError) -> Self {
        match err {
            ReturnLoanError::AlreadyClosed => CirculationError::LoanAlreadyClosed,
        }
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, CirculationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_errors_are_rejections() {
        assert!(CirculationError::BorrowLimitExceeded.is_rejection());
        assert!(CirculationError::BookUnavailable.is_rejection());
        assert!(CirculationError::LoanAlreadyClosed.is_rejection());
    }

    #[test]
    fn test_infrastructure_errors_are_not_rejections() {
        let err = CirculationError::RepositoryError("connection reset".into());
        assert!(!err.is_rejection());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_domain_errors_convert() {
        assert!(matches!(
            CirculationError::from(RenewLoanError::AlreadyRenewed),
            CirculationError::AlreadyRenewed
        ));
        assert!(matches!(
            CirculationError::from(ReturnLoanError::AlreadyClosed),
            CirculationError::LoanAlreadyClosed
        ));
    }
}
