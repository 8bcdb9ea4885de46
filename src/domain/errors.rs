use super::AlreadyRenewedError;

/// 更新のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenewLoanError {
    /// 既に返却済み
    AlreadyClosed,
    /// 既に1回更新済み
    AlreadyRenewed,
}

impl From<AlreadyRenewedError> for RenewLoanError {
    fn from(_: AlreadyRenewedError) -> Self {
        RenewLoanError::AlreadyRenewed
    }
}

/// 返却のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnLoanError {
    /// 既に返却済み（返却日は書き換えない）
    AlreadyClosed,
}
