use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{
    BookId, CustomerId, LoanId, LoanIssued, LoanRenewed, LoanReturned, Renewal, RenewLoanError,
    ReturnLoanError,
};

/// 貸出期間（日数）
pub const LOAN_PERIOD_DAYS: i64 = 21;

/// 更新1回で延びる日数
pub const RENEWAL_PERIOD_DAYS: i64 = 7;

// ============================================================================
// 型安全な状態パターン
// ============================================================================

/// Loan集約の共通フィールド
///
/// 貸出中・返却済みの両状態で共有されるコアデータ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanCore {
    // 識別子
    pub loan_id: LoanId,

    // 他の集約への参照（IDのみ）
    pub book_id: BookId,
    pub customer_id: CustomerId,

    // 貸出管理の責務
    pub issued_on: NaiveDate,
    pub due_on: NaiveDate,
    pub renewal: Renewal,

    // 監査情報
    pub created_at: DateTime<Utc>,
}

/// 貸出中状態
///
/// ビジネスルール：
/// - 返却日を持たない
/// - 1回だけ更新可能
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenLoan {
    #[serde(flatten)]
    pub core: LoanCore,
}

impl std::ops::Deref for OpenLoan {
    type Target = LoanCore;

    fn deref(&self) -> &Self::Target {
        &self.core
    }
}

/// 返却済み状態
///
/// ビジネスルール：
/// - returned_onが必須（型で保証）
/// - 終端状態。以降の遷移はない
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedLoan {
    #[serde(flatten)]
    pub core: LoanCore,
    pub returned_on: NaiveDate,
}

impl std::ops::Deref for ClosedLoan {
    type Target = LoanCore;

    fn deref(&self) -> &Self::Target {
        &self.core
    }
}

/// Loan集約 - 1冊の書籍の1回の貸出
///
/// 状態遷移：
/// - Open(未更新) → Open(更新済み) → Closed
/// - Open(未更新) → Closed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Loan {
    Open(OpenLoan),
    Closed(ClosedLoan),
}

impl Loan {
    pub fn core(&self) -> &LoanCore {
        match self {
            Loan::Open(open) => &open.core,
            Loan::Closed(closed) => &closed.core,
        }
    }

    pub fn loan_id(&self) -> LoanId {
        self.core().loan_id
    }

    pub fn returned_on(&self) -> Option<NaiveDate> {
        match self {
            Loan::Open(_) => None,
            Loan::Closed(closed) => Some(closed.returned_on),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Loan::Open(_))
    }

    /// 延滞中か（読み取り時に算出する派生状態）
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        is_overdue(self, today)
    }

    /// 延滞して返却されたか（読み取り時に算出する派生状態）
    pub fn was_overdue(&self) -> bool {
        was_overdue(self)
    }
}

impl From<OpenLoan> for Loan {
    fn from(loan: OpenLoan) -> Self {
        Loan::Open(loan)
    }
}

impl From<ClosedLoan> for Loan {
    fn from(loan: ClosedLoan) -> Self {
        Loan::Closed(loan)
    }
}

// ============================================================================
// 純粋関数
// ============================================================================

/// 純粋関数：書籍を貸し出す
///
/// ビジネスルール：
/// - 貸出日は`issued_at`の日付
/// - 返却期限は貸出日 + 21日
/// - 未更新・未返却で開始
///
/// 貸出上限や在庫の確認はアプリケーション層の責務。
/// 副作用なし。新しいOpenLoanとイベントを返す。
pub fn issue_loan(
    book_id: BookId,
    customer_id: CustomerId,
    issued_at: DateTime<Utc>,
) -> (OpenLoan, LoanIssued) {
    let loan_id = LoanId::new();
    let issued_on = issued_at.date_naive();
    let due_on = issued_on + Duration::days(LOAN_PERIOD_DAYS);

    let loan = OpenLoan {
        core: LoanCore {
            loan_id,
            book_id,
            customer_id,
            issued_on,
            due_on,
            renewal: Renewal::NotRenewed,
            created_at: issued_at,
        },
    };

    let event = LoanIssued {
        loan_id,
        book_id,
        customer_id,
        issued_on,
        due_on,
        issued_at,
    };

    (loan, event)
}

/// 純粋関数：貸出を更新する
///
/// ビジネスルール：
/// - 返却済みは更新不可
/// - 更新は1回まで
/// - 延滞中でも更新は受け付ける
/// - 更新時：現在の返却期限 + 7日
///
/// 副作用なし。新しいOpenLoanとイベントを返す。
pub fn renew_loan(
    loan: Loan,
    renewed_at: DateTime<Utc>,
) -> Result<(OpenLoan, LoanRenewed), RenewLoanError> {
    let open = match loan {
        Loan::Open(open) => open,
        Loan::Closed(_) => return Err(RenewLoanError::AlreadyClosed),
    };

    let renewal = open.renewal.renew()?;
    let old_due_on = open.due_on;
    let new_due_on = old_due_on + Duration::days(RENEWAL_PERIOD_DAYS);

    let event = LoanRenewed {
        loan_id: open.loan_id,
        old_due_on,
        new_due_on,
        renewed_at,
    };

    let renewed = OpenLoan {
        core: LoanCore {
            due_on: new_due_on,
            renewal,
            ..open.core
        },
    };

    Ok((renewed, event))
}

/// 純粋関数：書籍を返却する
///
/// ビジネスルール：
/// - 延滞していても返却は受け付ける
/// - 返却済みの貸出は再返却不可（返却日は不変）
///
/// 副作用なし。ClosedLoanとイベントを返す。
pub fn return_loan(
    loan: Loan,
    returned_at: DateTime<Utc>,
) -> Result<(ClosedLoan, LoanReturned), ReturnLoanError> {
    let open = match loan {
        Loan::Open(open) => open,
        Loan::Closed(_) => return Err(ReturnLoanError::AlreadyClosed),
    };

    let returned_on = returned_at.date_naive();
    let closed = ClosedLoan {
        core: open.core,
        returned_on,
    };

    let event = LoanReturned {
        loan_id: closed.loan_id,
        book_id: closed.book_id,
        customer_id: closed.customer_id,
        returned_on,
        returned_at,
        was_overdue: returned_on > closed.due_on,
    };

    Ok((closed, event))
}

/// 純粋関数：延滞判定
///
/// 返却期限が今日より前の貸出中の貸出のみ延滞。期限当日は延滞ではない。
pub fn is_overdue(loan: &Loan, today: NaiveDate) -> bool {
    match loan {
        Loan::Open(open) => open.due_on < today,
        Loan::Closed(_) => false,
    }
}

/// 純粋関数：延滞返却判定
pub fn was_overdue(loan: &Loan) -> bool {
    match loan {
        Loan::Open(_) => false,
        Loan::Closed(closed) => closed.returned_on > closed.due_on,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 10, 30, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn issue(issued_at: DateTime<Utc>) -> OpenLoan {
        issue_loan(BookId::new(), CustomerId::new(), issued_at).0
    }

    #[test]
    fn test_issue_loan_sets_due_date_21_days_out() {
        let book_id = BookId::new();
        let customer_id = CustomerId::new();
        let issued_at = at(2024, 3, 1);

        let (loan, event) = issue_loan(book_id, customer_id, issued_at);

        assert_eq!(loan.issued_on, date(2024, 3, 1));
        assert_eq!(loan.due_on, date(2024, 3, 22));
        assert!(!loan.renewal.is_renewed());
        assert_eq!(loan.created_at, issued_at);

        assert_eq!(event.loan_id, loan.loan_id);
        assert_eq!(event.book_id, book_id);
        assert_eq!(event.customer_id, customer_id);
        assert_eq!(event.due_on, loan.due_on);
    }

    #[test]
    fn test_renew_loan_extends_due_date_by_7_days() {
        let loan = issue(at(2024, 3, 1));

        let (renewed, event) = renew_loan(loan.into(), at(2024, 3, 10)).unwrap();

        // D + 21 + 7
        assert_eq!(renewed.due_on, date(2024, 3, 29));
        assert!(renewed.renewal.is_renewed());
        assert_eq!(event.old_due_on, date(2024, 3, 22));
        assert_eq!(event.new_due_on, date(2024, 3, 29));
    }

    #[test]
    fn test_renew_loan_twice_fails() {
        let loan = issue(at(2024, 3, 1));
        let (renewed, _) = renew_loan(loan.into(), at(2024, 3, 10)).unwrap();

        let result = renew_loan(renewed.into(), at(2024, 3, 11));
        assert_eq!(result.unwrap_err(), RenewLoanError::AlreadyRenewed);
    }

    #[test]
    fn test_renew_overdue_loan_is_allowed() {
        let loan = issue(at(2024, 3, 1));

        let result = renew_loan(loan.into(), at(2024, 4, 1));
        assert!(result.is_ok());
    }

    #[test]
    fn test_renew_closed_loan_fails() {
        let loan = issue(at(2024, 3, 1));
        let (closed, _) = return_loan(loan.into(), at(2024, 3, 5)).unwrap();

        let result = renew_loan(closed.into(), at(2024, 3, 6));
        assert_eq!(result.unwrap_err(), RenewLoanError::AlreadyClosed);
    }

    #[test]
    fn test_return_loan_on_time() {
        let loan = issue(at(2024, 3, 1));

        let (closed, event) = return_loan(loan.into(), at(2024, 3, 22)).unwrap();

        assert_eq!(closed.returned_on, date(2024, 3, 22));
        assert!(!event.was_overdue);
        assert!(!Loan::Closed(closed).was_overdue());
    }

    #[test]
    fn test_return_loan_late_marks_was_overdue() {
        let loan = issue(at(2024, 3, 1));

        let (closed, event) = return_loan(loan.into(), at(2024, 3, 26)).unwrap();

        assert!(event.was_overdue);
        assert!(Loan::Closed(closed).was_overdue());
    }

    #[test]
    fn test_return_closed_loan_fails_and_keeps_return_date() {
        let loan = issue(at(2024, 3, 1));
        let (closed, _) = return_loan(loan.into(), at(2024, 3, 5)).unwrap();
        let closed = Loan::Closed(closed);

        let result = return_loan(closed.clone(), at(2024, 3, 9));
        assert_eq!(result.unwrap_err(), ReturnLoanError::AlreadyClosed);
        assert_eq!(closed.returned_on(), Some(date(2024, 3, 5)));
    }

    #[test]
    fn test_is_overdue_boundaries() {
        let loan: Loan = issue(at(2024, 3, 1)).into();

        assert!(!loan.is_overdue(date(2024, 3, 21)));
        // 期限当日は延滞ではない
        assert!(!loan.is_overdue(date(2024, 3, 22)));
        assert!(loan.is_overdue(date(2024, 3, 23)));
    }

    #[test]
    fn test_closed_loan_is_never_overdue() {
        let loan = issue(at(2024, 3, 1));
        let (closed, _) = return_loan(loan.into(), at(2024, 4, 1)).unwrap();

        assert!(!Loan::Closed(closed).is_overdue(date(2024, 5, 1)));
    }

    #[test]
    fn test_open_loan_was_not_overdue() {
        let loan: Loan = issue(at(2024, 3, 1)).into();
        assert!(!loan.was_overdue());
    }

    #[test]
    fn test_loan_serializes_with_status_tag() {
        let loan: Loan = issue(at(2024, 3, 1)).into();

        let json = serde_json::to_value(&loan).unwrap();
        assert_eq!(json["status"], "open");
        assert_eq!(json["renewal"], false);
        assert_eq!(json["due_on"], "2024-03-22");
    }
}
