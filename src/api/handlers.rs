use crate::application::loan::{self as circulation, ServiceDependencies};
use crate::domain::{
    commands::{RenewLoan, ReturnLoan},
    value_objects::{BookId, CustomerId, LoanId},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::{
    error::ApiError,
    types::{AvailabilityResponse, CreateLoanRequest, EligibilityResponse, LoanResponse},
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
}

// ============================================================================
// Command handlers (POST)
// ============================================================================

/// POST /loans - 新しい貸出を作成
///
/// 強制されるビジネスルール:
/// - 利用者・書籍が存在すること
/// - 利用者の貸出数が上限（5冊）未満であること
/// - 書籍が貸出中でないこと
pub async fn create_loan(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateLoanRequest>,
) -> Result<(StatusCode, Json<LoanResponse>), ApiError> {
    let now = Utc::now();
    let loan = circulation::create_loan(&state.service_deps, req.to_command(now)).await?;

    Ok((
        StatusCode::CREATED,
        Json(LoanResponse::from_loan(&loan, now.date_naive())),
    ))
}

/// POST /loans/:id/renew - 貸出を更新
///
/// 返却期限を7日延長する。更新は1回まで。
pub async fn renew_loan(
    State(state): State<Arc<AppState>>,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<LoanResponse>, ApiError> {
    let now = Utc::now();
    let cmd = RenewLoan {
        loan_id: LoanId::from_uuid(loan_id),
        renewed_at: now,
    };

    let loan = circulation::renew_loan(&state.service_deps, cmd).await?;

    Ok(Json(LoanResponse::from_loan(&loan, now.date_naive())))
}

/// POST /loans/:id/return - 書籍を返却
///
/// 延滞中の貸出も返却可能。返却済みの貸出は再返却できない。
pub async fn return_loan(
    State(state): State<Arc<AppState>>,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<LoanResponse>, ApiError> {
    let now = Utc::now();
    let cmd = ReturnLoan {
        loan_id: LoanId::from_uuid(loan_id),
        returned_at: now,
    };

    let loan = circulation::return_loan(&state.service_deps, cmd).await?;

    Ok(Json(LoanResponse::from_loan(&loan, now.date_naive())))
}

// ============================================================================
// Query handlers (GET)
// ============================================================================

/// GET /loans/:id - 貸出詳細をIDで取得
pub async fn get_loan(
    State(state): State<Arc<AppState>>,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<LoanResponse>, ApiError> {
    let loan = circulation::get_loan(&state.service_deps, LoanId::from_uuid(loan_id)).await?;

    Ok(Json(LoanResponse::from_loan(&loan, today())))
}

/// GET /loans/overdue - 延滞中の貸出一覧（返却期限の古い順）
pub async fn list_overdue(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LoanResponse>>, ApiError> {
    let today = today();
    let loans = circulation::list_overdue(&state.service_deps, today).await?;

    Ok(Json(LoanResponse::from_loans(&loans, today)))
}

/// GET /customers/:id/loans/current - 利用者の現在の貸出
pub async fn list_current(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<Vec<LoanResponse>>, ApiError> {
    let customer_id = CustomerId::from_uuid(customer_id);
    let loans = circulation::list_current(&state.service_deps, customer_id).await?;

    Ok(Json(LoanResponse::from_loans(&loans, today())))
}

/// GET /customers/:id/loans/history - 利用者の返却済み貸出
pub async fn list_history(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<Vec<LoanResponse>>, ApiError> {
    let customer_id = CustomerId::from_uuid(customer_id);
    let loans = circulation::list_history(&state.service_deps, customer_id).await?;

    Ok(Json(LoanResponse::from_loans(&loans, today())))
}

/// GET /customers/:id/eligibility - 利用者がさらに借りられるか
pub async fn customer_eligibility(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<EligibilityResponse>, ApiError> {
    let can_borrow =
        circulation::can_customer_borrow(&state.service_deps, CustomerId::from_uuid(customer_id))
            .await?;

    Ok(Json(EligibilityResponse {
        customer_id,
        can_borrow,
    }))
}

/// GET /books/:id/loans - 書籍の貸出履歴（貸出中を含む）
pub async fn list_book_history(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
) -> Result<Json<Vec<LoanResponse>>, ApiError> {
    let loans = circulation::list_book_history(&state.service_deps, BookId::from_uuid(book_id))
        .await?;

    Ok(Json(LoanResponse::from_loans(&loans, today())))
}

/// GET /books/:id/availability - 書籍が貸出可能か
pub async fn book_availability(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let available =
        circulation::is_available(&state.service_deps, BookId::from_uuid(book_id)).await?;

    Ok(Json(AvailabilityResponse { book_id, available }))
}

fn today() -> chrono::NaiveDate {
    Utc::now().date_naive()
}
