use crate::domain::{
    events::{DomainEvent, LoanIssued},
    loan::{ClosedLoan, Loan, LoanCore, OpenLoan},
    value_objects::{BookId, CustomerId, LoanId, Renewal},
};
use crate::ports::loan_repository::{LoanRepository as LoanRepositoryTrait, Result, WriteOutcome};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool, Row, postgres::PgRow};

/// PostgreSQLの行データをLoanに変換する
///
/// returned_onの有無で貸出中・返却済みを判別する。
fn map_row_to_loan(row: &PgRow) -> Result<Loan> {
    let renewed: bool = row.try_get("renewed")?;
    let core = LoanCore {
        loan_id: LoanId::from_uuid(row.try_get("loan_id")?),
        book_id: BookId::from_uuid(row.try_get("book_id")?),
        customer_id: CustomerId::from_uuid(row.try_get("customer_id")?),
        issued_on: row.try_get("issued_on")?,
        due_on: row.try_get("due_on")?,
        renewal: Renewal::from(renewed),
        created_at: row.try_get("created_at")?,
    };

    let returned_on: Option<NaiveDate> = row.try_get("returned_on")?;
    Ok(match returned_on {
        Some(returned_on) => Loan::Closed(ClosedLoan { core, returned_on }),
        None => Loan::Open(OpenLoan { core }),
    })
}

/// 監査イベントを追記する
///
/// 呼び出し側のトランザクション内で実行すること。
async fn append_event(conn: &mut PgConnection, event: &DomainEvent) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO loan_events (loan_id, event_type, event_data, occurred_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(event.loan_id().value())
    .bind(event.event_type())
    .bind(serde_json::to_value(event)?)
    .bind(event.occurred_at())
    .execute(conn)
    .await?;

    Ok(())
}

/// LoanRepositoryのPostgreSQL実装
///
/// 「1冊につき未返却の貸出は1件」は部分一意インデックス
/// `loans_one_open_per_book`で保証する。
pub struct LoanRepository {
    pool: PgPool,
}

impl LoanRepository {
    /// PostgreSQLコネクションプールから新しいLoanRepositoryを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoanRepositoryTrait for LoanRepository {
    /// 貸出を保存
    ///
    /// ON CONFLICT DO NOTHINGで一意制約違反を0行挿入として受け取り、
    /// `WriteOutcome::Conflict`として返す。
    async fn insert(&self, loan: &OpenLoan, event: &LoanIssued) -> Result<WriteOutcome> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO loans (
                loan_id,
                book_id,
                customer_id,
                issued_on,
                due_on,
                returned_on,
                renewed,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, NULL, $6, $7)
            ON CONFLICT (book_id) WHERE returned_on IS NULL
            DO NOTHING
            "#,
        )
        .bind(loan.loan_id.value())
        .bind(loan.book_id.value())
        .bind(loan.customer_id.value())
        .bind(loan.issued_on)
        .bind(loan.due_on)
        .bind(loan.renewal.is_renewed())
        .bind(loan.created_at)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            tx.rollback().await?;
            return Ok(WriteOutcome::Conflict);
        }

        append_event(&mut tx, &DomainEvent::LoanIssued(event.clone())).await?;

        tx.commit().await?;
        Ok(WriteOutcome::Applied)
    }

    /// 貸出を更新
    ///
    /// 読み取り時点の返却期限・更新済みフラグと一致し、かつ未返却の行だけを
    /// 更新対象にする。0行更新なら`WriteOutcome::Conflict`を返す。
    async fn update(
        &self,
        expected: &Loan,
        loan: &Loan,
        event: &DomainEvent,
    ) -> Result<WriteOutcome> {
        if !expected.is_open() {
            return Ok(WriteOutcome::Conflict);
        }

        let core = loan.core();
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE loans
            SET due_on = $2,
                returned_on = $3,
                renewed = $4
            WHERE loan_id = $1
              AND returned_on IS NULL
              AND due_on = $5
              AND renewed = $6
            "#,
        )
        .bind(core.loan_id.value())
        .bind(core.due_on)
        .bind(loan.returned_on())
        .bind(core.renewal.is_renewed())
        .bind(expected.core().due_on)
        .bind(expected.core().renewal.is_renewed())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Ok(WriteOutcome::Conflict);
        }

        append_event(&mut tx, event).await?;

        tx.commit().await?;
        Ok(WriteOutcome::Applied)
    }

    async fn find_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        let row = sqlx::query(
            r#"
            SELECT
                loan_id,
                book_id,
                customer_id,
                issued_on,
                due_on,
                returned_on,
                renewed,
                created_at
            FROM loans
            WHERE loan_id = $1
            "#,
        )
        .bind(loan_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_loan).transpose()
    }

    /// 部分インデックス`loans_open_by_customer`を使用
    async fn count_open_for_customer(&self, customer_id: CustomerId) -> Result<usize> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM loans
            WHERE customer_id = $1 AND returned_on IS NULL
            "#,
        )
        .bind(customer_id.value())
        .fetch_one(&self.pool)
        .await?;

        Ok(usize::try_from(count)?)
    }

    async fn find_open_for_book(&self, book_id: BookId) -> Result<Option<Loan>> {
        let row = sqlx::query(
            r#"
            SELECT
                loan_id,
                book_id,
                customer_id,
                issued_on,
                due_on,
                returned_on,
                renewed,
                created_at
            FROM loans
            WHERE book_id = $1 AND returned_on IS NULL
            "#,
        )
        .bind(book_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_loan).transpose()
    }

    async fn find_open_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Loan>> {
        let rows = sqlx::query(
            r#"
            SELECT
                loan_id,
                book_id,
                customer_id,
                issued_on,
                due_on,
                returned_on,
                renewed,
                created_at
            FROM loans
            WHERE customer_id = $1 AND returned_on IS NULL
            ORDER BY due_on ASC, created_at ASC, loan_id ASC
            "#,
        )
        .bind(customer_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_loan).collect()
    }

    async fn find_closed_by_customer(&self, customer_id: CustomerId) -> Result<Vec<Loan>> {
        let rows = sqlx::query(
            r#"
            SELECT
                loan_id,
                book_id,
                customer_id,
                issued_on,
                due_on,
                returned_on,
                renewed,
                created_at
            FROM loans
            WHERE customer_id = $1 AND returned_on IS NOT NULL
            ORDER BY returned_on DESC, created_at ASC, loan_id ASC
            "#,
        )
        .bind(customer_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_loan).collect()
    }

    async fn find_by_book(&self, book_id: BookId) -> Result<Vec<Loan>> {
        let rows = sqlx::query(
            r#"
            SELECT
                loan_id,
                book_id,
                customer_id,
                issued_on,
                due_on,
                returned_on,
                renewed,
                created_at
            FROM loans
            WHERE book_id = $1
            ORDER BY issued_on DESC, created_at ASC, loan_id ASC
            "#,
        )
        .bind(book_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_loan).collect()
    }

    /// 部分インデックス`loans_overdue`を使用
    async fn find_overdue(&self, today: NaiveDate) -> Result<Vec<Loan>> {
        let rows = sqlx::query(
            r#"
            SELECT
                loan_id,
                book_id,
                customer_id,
                issued_on,
                due_on,
                returned_on,
                renewed,
                created_at
            FROM loans
            WHERE returned_on IS NULL AND due_on < $1
            ORDER BY due_on ASC, created_at ASC, loan_id ASC
            "#,
        )
        .bind(today)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_loan).collect()
    }

    async fn events_for(&self, loan_id: LoanId) -> Result<Vec<DomainEvent>> {
        let rows = sqlx::query(
            r#"
            SELECT event_data
            FROM loan_events
            WHERE loan_id = $1
            ORDER BY sequence_number ASC
            "#,
        )
        .bind(loan_id.value())
        .fetch_all(&self.pool)
        .await?;

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let event_data: serde_json::Value = row.try_get("event_data")?;
            events.push(serde_json::from_value(event_data)?);
        }

        Ok(events)
    }
}
