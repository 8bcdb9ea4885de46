use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, CustomerId, LoanId};

/// イベント：書籍が貸し出された
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanIssued {
    pub loan_id: LoanId,
    pub book_id: BookId,
    pub customer_id: CustomerId,
    pub issued_on: NaiveDate,
    pub due_on: NaiveDate,
    pub issued_at: DateTime<Utc>,
}

/// イベント：貸出が更新（延長）された
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRenewed {
    pub loan_id: LoanId,
    pub old_due_on: NaiveDate,
    pub new_due_on: NaiveDate,
    pub renewed_at: DateTime<Utc>,
}

/// イベント：書籍が返却された
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanReturned {
    pub loan_id: LoanId,
    pub book_id: BookId,
    pub customer_id: CustomerId,
    pub returned_on: NaiveDate,
    pub returned_at: DateTime<Utc>,
    pub was_overdue: bool,
}

/// ドメインイベント統合型
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainEvent {
    LoanIssued(LoanIssued),
    LoanRenewed(LoanRenewed),
    LoanReturned(LoanReturned),
}

impl DomainEvent {
    pub fn loan_id(&self) -> LoanId {
        match self {
            DomainEvent::LoanIssued(e) => e.loan_id,
            DomainEvent::LoanRenewed(e) => e.loan_id,
            DomainEvent::LoanReturned(e) => e.loan_id,
        }
    }

    /// 永続化時の種別識別子
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::LoanIssued(_) => "LoanIssued",
            DomainEvent::LoanRenewed(_) => "LoanRenewed",
            DomainEvent::LoanReturned(_) => "LoanReturned",
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            DomainEvent::LoanIssued(e) => e.issued_at,
            DomainEvent::LoanRenewed(e) => e.renewed_at,
            DomainEvent::LoanReturned(e) => e.returned_at,
        }
    }
}
