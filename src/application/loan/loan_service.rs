use crate::domain::{self, DomainEvent, commands::*, loan::Loan, value_objects::*};
use crate::ports::*;
use std::sync::Arc;

use super::errors::{CirculationError, Result};
use super::locks::CirculationLocks;

/// 利用者1人あたりの最大貸出冊数
pub const MAX_OPEN_LOANS: usize = 5;

/// サービスの依存関係
///
/// 関数型DDDの原則に従い、データ構造として定義。
/// 振る舞い（メソッド）は持たず、純粋な関数に依存関係を渡す。
///
/// `locks`はプロセス内で共有する直列化ポイントなので、
/// 同じ台帳を扱うすべての呼び出しで同じインスタンスを使うこと。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub loan_repository: Arc<dyn LoanRepository>,
    pub book_catalog: Arc<dyn BookCatalog>,
    pub customer_directory: Arc<dyn CustomerDirectory>,
    pub locks: Arc<CirculationLocks>,
}

impl ServiceDependencies {
    pub fn new(
        loan_repository: Arc<dyn LoanRepository>,
        book_catalog: Arc<dyn BookCatalog>,
        customer_directory: Arc<dyn CustomerDirectory>,
    ) -> Self {
        Self {
            loan_repository,
            book_catalog,
            customer_directory,
            locks: Arc::new(CirculationLocks::new()),
        }
    }
}

/// リポジトリから貸出を取得するヘルパー関数
///
/// # エラー
/// - RepositoryError: 読み込み失敗
/// - LoanNotFound: 貸出が存在しない
pub(super) async fn load_loan(
    loan_repository: &Arc<dyn LoanRepository>,
    loan_id: LoanId,
) -> Result<Loan> {
    loan_repository
        .find_by_id(loan_id)
        .await
        .map_err(CirculationError::RepositoryError)?
        .ok_or(CirculationError::LoanNotFound)
}

pub(super) async fn ensure_customer_exists(
    deps: &ServiceDependencies,
    customer_id: CustomerId,
) -> Result<()> {
    let exists = deps
        .customer_directory
        .exists(customer_id)
        .await
        .map_err(CirculationError::CustomerDirectoryError)?;

    if !exists {
        return Err(CirculationError::CustomerNotFound);
    }
    Ok(())
}

pub(super) async fn ensure_book_exists(deps: &ServiceDependencies, book_id: BookId) -> Result<()> {
    let exists = deps
        .book_catalog
        .exists(book_id)
        .await
        .map_err(CirculationError::BookCatalogError)?;

    if !exists {
        return Err(CirculationError::BookNotFound);
    }
    Ok(())
}

/// 書籍を貸し出す
///
/// ビジネスルール（この順で確認）：
/// - 利用者・書籍が存在すること
/// - 利用者の未返却貸出が5冊未満であること
/// - 書籍に未返却の貸出がないこと
///
/// 上限確認から保存までは利用者・書籍のロックを保持したまま行う。
/// 別プロセスからの同時貸出はストレージの一意制約で`BookUnavailable`になる。
/// 貸出上限にはストレージ側の制約がなく、プロセス内のロックでしか守られない。
/// 複数プロセスから同じ利用者へ同時に貸し出すと6冊目が通りうる。
///
/// # 冪等性
///
/// 冪等ではない。失敗時も自動再試行はしない。
///
/// # 戻り値
/// 成功時は作成された貸出
#[tracing::instrument(
    skip(deps, cmd),
    fields(book_id = %cmd.book_id, customer_id = %cmd.customer_id),
    err(level = "warn")
)]
pub async fn create_loan(deps: &ServiceDependencies, cmd: IssueLoan) -> Result<Loan> {
    // 1. 参照先の存在確認
    ensure_customer_exists(deps, cmd.customer_id).await?;
    ensure_book_exists(deps, cmd.book_id).await?;

    // 2. 利用者 → 書籍の順でロック
    let _customer_guard = deps.locks.lock_customer(cmd.customer_id).await;
    let _book_guard = deps.locks.lock_book(cmd.book_id).await;

    // 3. 貸出上限確認（5冊まで）
    let open_loans = deps
        .loan_repository
        .count_open_for_customer(cmd.customer_id)
        .await
        .map_err(CirculationError::RepositoryError)?;

    if open_loans >= MAX_OPEN_LOANS {
        return Err(CirculationError::BorrowLimitExceeded);
    }

    // 4. 書籍の貸出状況確認
    let current = deps
        .loan_repository
        .find_open_for_book(cmd.book_id)
        .await
        .map_err(CirculationError::RepositoryError)?;

    if current.is_some() {
        return Err(CirculationError::BookUnavailable);
    }

    // 5. ドメイン層の純粋関数を呼び出し
    let (loan, event) = domain::loan::issue_loan(cmd.book_id, cmd.customer_id, cmd.issued_at);

    // 6. 保存（一意制約に阻まれたら貸出中とみなす）
    let outcome = deps
        .loan_repository
        .insert(&loan, &event)
        .await
        .map_err(CirculationError::RepositoryError)?;

    if outcome == WriteOutcome::Conflict {
        return Err(CirculationError::BookUnavailable);
    }

    tracing::info!(loan_id = %loan.loan_id, due_on = %loan.due_on, "loan issued");
    Ok(Loan::Open(loan))
}

/// 同じ貸出への書き込みを試みる最大回数
///
/// 貸出の状態は「未更新 → 更新済み → 返却済み」と一方向にしか進まないため、
/// 競合で読み直すのは高々2回。3回目はドメインのルールが結論を出す。
const MAX_WRITE_ATTEMPTS: usize = 3;

/// 貸出を更新する
///
/// ビジネスルール：
/// - 貸出が存在すること
/// - 未返却であること
/// - まだ更新していないこと
///
/// 延滞中でも更新できる。
///
/// 読み取り後に別プロセスが同じ貸出を書き換えていた場合は、
/// 読み直してルールを判定し直す（`AlreadyRenewed`・`LoanAlreadyClosed`）。
#[tracing::instrument(skip(deps, cmd), fields(loan_id = %cmd.loan_id), err(level = "warn"))]
pub async fn renew_loan(deps: &ServiceDependencies, cmd: RenewLoan) -> Result<Loan> {
    let loan = load_loan(&deps.loan_repository, cmd.loan_id).await?;
    let _book_guard = deps.locks.lock_book(loan.core().book_id).await;

    for _ in 0..MAX_WRITE_ATTEMPTS {
        // ロック取得前・競合前に読んだ状態は古い可能性がある
        let current = load_loan(&deps.loan_repository, cmd.loan_id).await?;

        let (renewed, event) = domain::loan::renew_loan(current.clone(), cmd.renewed_at)?;
        let loan = Loan::Open(renewed);

        let outcome =
            persist_update(deps, &current, &loan, DomainEvent::LoanRenewed(event)).await?;
        if outcome == WriteOutcome::Applied {
            tracing::info!(due_on = %loan.core().due_on, "loan renewed");
            return Ok(loan);
        }

        tracing::debug!("loan changed concurrently, re-reading");
    }

    Err(write_attempts_exhausted(cmd.loan_id))
}

/// 書籍を返却する
///
/// ビジネスルール：
/// - 貸出が存在すること
/// - 未返却であること（返却日は一度しか設定しない）
/// - 延滞していても返却は受け付ける
///
/// 延滞判定は書き込み時点で保存されている返却期限に対して行う。
#[tracing::instrument(skip(deps, cmd), fields(loan_id = %cmd.loan_id), err(level = "warn"))]
pub async fn return_loan(deps: &ServiceDependencies, cmd: ReturnLoan) -> Result<Loan> {
    let loan = load_loan(&deps.loan_repository, cmd.loan_id).await?;
    let _book_guard = deps.locks.lock_book(loan.core().book_id).await;

    for _ in 0..MAX_WRITE_ATTEMPTS {
        let current = load_loan(&deps.loan_repository, cmd.loan_id).await?;

        let (closed, event) = domain::loan::return_loan(current.clone(), cmd.returned_at)?;
        let was_overdue = event.was_overdue;
        let loan = Loan::Closed(closed);

        let outcome =
            persist_update(deps, &current, &loan, DomainEvent::LoanReturned(event)).await?;
        if outcome == WriteOutcome::Applied {
            tracing::info!(was_overdue, "loan returned");
            return Ok(loan);
        }

        tracing::debug!("loan changed concurrently, re-reading");
    }

    Err(write_attempts_exhausted(cmd.loan_id))
}

async fn persist_update(
    deps: &ServiceDependencies,
    expected: &Loan,
    loan: &Loan,
    event: DomainEvent,
) -> Result<WriteOutcome> {
    deps.loan_repository
        .update(expected, loan, &event)
        .await
        .map_err(CirculationError::RepositoryError)
}

/// 状態が一方向にしか進まない限り到達しない。ストレージの異常として扱う。
fn write_attempts_exhausted(loan_id: LoanId) -> CirculationError {
    CirculationError::RepositoryError(
        format!("loan {loan_id} kept changing after {MAX_WRITE_ATTEMPTS} attempts").into(),
    )
}
