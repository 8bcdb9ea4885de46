use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, CustomerId, LoanId};

/// コマンド：書籍を貸し出す
///
/// 貸出日は`issued_at`のUTC日付。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueLoan {
    pub book_id: BookId,
    pub customer_id: CustomerId,
    pub issued_at: DateTime<Utc>,
}

/// コマンド：貸出を更新する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenewLoan {
    pub loan_id: LoanId,
    pub renewed_at: DateTime<Utc>,
}

/// コマンド：書籍を返却する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnLoan {
    pub loan_id: LoanId,
    pub returned_at: DateTime<Utc>,
}
