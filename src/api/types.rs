use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    commands::IssueLoan,
    loan::Loan,
    value_objects::{BookId, CustomerId},
};

/// 貸出作成リクエスト（POST /loans）
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateLoanRequest {
    pub book_id: Uuid,
    pub customer_id: Uuid,
}

impl CreateLoanRequest {
    pub fn to_command(&self, issued_at: DateTime<Utc>) -> IssueLoan {
        IssueLoan {
            book_id: BookId::from_uuid(self.book_id),
            customer_id: CustomerId::from_uuid(self.customer_id),
            issued_at,
        }
    }
}

/// 貸出レスポンス
///
/// 延滞状態は保存せず、レスポンス生成時点の日付から算出する。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanResponse {
    pub loan_id: Uuid,
    pub book_id: Uuid,
    pub customer_id: Uuid,
    pub issued_on: NaiveDate,
    pub due_on: NaiveDate,
    pub returned_on: Option<NaiveDate>,
    pub renewed: bool,
    pub is_overdue: bool,
    pub was_overdue: bool,
    pub created_at: DateTime<Utc>,
}

impl LoanResponse {
    pub fn from_loan(loan: &Loan, today: NaiveDate) -> Self {
        let core = loan.core();
        Self {
            loan_id: core.loan_id.value(),
            book_id: core.book_id.value(),
            customer_id: core.customer_id.value(),
            issued_on: core.issued_on,
            due_on: core.due_on,
            returned_on: loan.returned_on(),
            renewed: core.renewal.is_renewed(),
            is_overdue: loan.is_overdue(today),
            was_overdue: loan.was_overdue(),
            created_at: core.created_at,
        }
    }

    pub fn from_loans(loans: &[Loan], today: NaiveDate) -> Vec<Self> {
        loans
            .iter()
            .map(|loan| Self::from_loan(loan, today))
            .collect()
    }
}

/// 貸出可否レスポンス（GET /books/:id/availability）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub book_id: Uuid,
    pub available: bool,
}

/// 借入可否レスポンス（GET /customers/:id/eligibility）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibilityResponse {
    pub customer_id: Uuid,
    pub can_borrow: bool,
}

/// エラーレスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
