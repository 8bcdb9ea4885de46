use crate::domain::{
    events::{DomainEvent, LoanIssued},
    loan::{Loan, OpenLoan},
    value_objects::{BookId, CustomerId, LoanId},
};
use crate::ports::loan_repository::{LoanRepository as LoanRepositoryTrait, Result, WriteOutcome};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct State {
    loans: HashMap<LoanId, Loan>,
    events: Vec<DomainEvent>,
}

impl State {
    fn has_open_loan_for(&self, book_id: BookId) -> bool {
        self.loans
            .values()
            .any(|loan| loan.is_open() && loan.core().book_id == book_id)
    }

    fn collect<F>(&self, filter: F, order: fn(&Loan, &Loan) -> Ordering) -> Vec<Loan>
    where
        F: Fn(&Loan) -> bool,
    {
        let mut loans: Vec<Loan> = self.loans.values().filter(|l| filter(*l)).cloned().collect();
        loans.sort_by(|a, b| order(a, b).then_with(|| tie_break(a, b)));
        loans
    }
}

/// 同順位は作成日時 → IDで並べる（PostgreSQL実装と同じ規則）
fn tie_break(a: &Loan, b: &Loan) -> Ordering {
    let (a, b) = (a.core(), b.core());
    a.created_at
        .cmp(&b.created_at)
        .then_with(|| a.loan_id.cmp(&b.loan_id))
}

/// PostgreSQL実装の`WHERE returned_on IS NULL AND due_on = .. AND renewed = ..`に相当
fn matches_snapshot(stored: &Loan, expected: &Loan) -> bool {
    stored.is_open()
        && expected.is_open()
        && stored.core().due_on == expected.core().due_on
        && stored.core().renewal == expected.core().renewal
}

fn by_due_on_asc(a: &Loan, b: &Loan) -> Ordering {
    a.core().due_on.cmp(&b.core().due_on)
}

fn by_returned_on_desc(a: &Loan, b: &Loan) -> Ordering {
    b.returned_on().cmp(&a.returned_on())
}

fn by_issued_on_desc(a: &Loan, b: &Loan) -> Ordering {
    b.core().issued_on.cmp(&a.core().issued_on)
}

/// LoanRepositoryのインメモリ実装
///
/// PostgreSQL実装と同じ制約を持つ：
/// - 書籍ごとに未返却の貸出は1件まで
/// - 返却済みの貸出は書き換え不可
///
/// テストとローカル実行用。
pub struct LoanRepository {
    state: Mutex<State>,
}

impl LoanRepository {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    /// 保存されている貸出の総数
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .loans
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, State>> {
        self.state.lock().map_err(|e| e.to_string().into())
    }
}

impl Default for LoanRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LoanRepositoryTrait for LoanRepository {
    async fn insert(&self, loan: &OpenLoan, event: &LoanIssued) -> Result<WriteOutcome> {
        let mut state = self.lock_state()?;

        if state.loans.contains_key(&loan.loan_id) || state.has_open_loan_for(loan.book_id) {
            return Ok(WriteOutcome::Conflict);
        }

        state.loans.insert(loan.loan_id, Loan::Open(loan.clone()));
        state.events.push(DomainEvent::LoanIssued(event.clone()));
        Ok(WriteOutcome::Applied)
    }

    async fn update(
        &self,
        expected: &Loan,
        loan: &Loan,
        event: &DomainEvent,
    ) -> Result<WriteOutcome> {
        let mut state = self.lock_state()?;

        match state.loans.get(&loan.loan_id()) {
            None => return Err(format!("loan {} does not exist", loan.loan_id()).into()),
            Some(stored) if !matches_snapshot(stored, expected) => {
                return Ok(WriteOutcome::Conflict);
            }
            Some(_) => {}
        }

        state.loans.insert(loan.loan_id(), loan.clone());
        state.events.push(event.clone());
        Ok(WriteOutcome::Applied)
    }

    async fn find_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        Ok(self.lock_state()?.loans.get(&loan_id).cloned())
    }

    async fn count_open_for_customer(&self, customer_id: CustomerId) -> Result<usize> {
        let state = self.lock_state()?;
        Ok(state
            .loans
            .values()
            .filter(|l| l.is_open() && l.core().customer_id == customer_id)
            .count())
    }

    async fn find_open_for_book(&self, book_id: BookId) -> Result<Option<Loan>> {
        let state = self.lock_state()?;
        Ok(state
            .loans
            .values()
            .find(|l| l.is_open() && l.core().book_id == book_id)
            .cloned())
    }

    async fn find_open_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Loan>> {
        let state = self.lock_state()?;
        Ok(state.collect(
            |l| l.is_open() && l.core().customer_id == customer_id,
            by_due_on_asc,
        ))
    }

    async fn find_closed_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Loan>> {
        let state = self.lock_state()?;
        Ok(state.collect(
            |l| !l.is_open() && l.core().customer_id == customer_id,
            by_returned_on_desc,
        ))
    }

    async fn find_by_book(&self, book_id: BookId) -> Result<Vec<Loan>> {
        let state = self.lock_state()?;
        Ok(state.collect(|l| l.core().book_id == book_id, by_issued_on_desc))
    }

    async fn find_overdue(&self, today: NaiveDate) -> Result<Vec<Loan>> {
        let state = self.lock_state()?;
        Ok(state.collect(|l| l.is_overdue(today), by_due_on_asc))
    }

    async fn events_for(&self, loan_id: LoanId) -> Result<Vec<DomainEvent>> {
        let state = self.lock_state()?;
        Ok(state
            .events
            .iter()
            .filter(|e| e.loan_id() == loan_id)
            .cloned()
            .collect())
    }
}
