use crate::application::loan::CirculationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub struct ApiError(CirculationError);

impl From<CirculationError> for ApiError {
    fn from(err: CirculationError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self.0 {
            // 404 Not Found - リクエストされたリソースが存在しない
            CirculationError::LoanNotFound => {
                (StatusCode::NOT_FOUND, "LOAN_NOT_FOUND", "Loan not found")
            }

            // 422 Unprocessable Entity - ビジネスルール違反
            CirculationError::CustomerNotFound => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "CUSTOMER_NOT_FOUND",
                "Customer not found",
            ),
            CirculationError::BookNotFound => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "BOOK_NOT_FOUND",
                "Book not found",
            ),
            CirculationError::BorrowLimitExceeded => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "BORROW_LIMIT_EXCEEDED",
                "Borrow limit exceeded (max 5 open loans per customer)",
            ),
            CirculationError::BookUnavailable => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "BOOK_UNAVAILABLE",
                "Book is already on loan",
            ),
            CirculationError::AlreadyRenewed => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "ALREADY_RENEWED",
                "Loan has already been renewed once",
            ),
            CirculationError::LoanAlreadyClosed => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "LOAN_ALREADY_CLOSED",
                "Loan has already been returned",
            ),

            // 500 Internal Server Error - システム障害
            // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
            CirculationError::RepositoryError(ref e) => {
                tracing::error!("Loan repository error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "REPOSITORY_ERROR",
                    "Failed to access loan records",
                )
            }
            CirculationError::BookCatalogError(ref e) => {
                tracing::error!("Book catalog error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "BOOK_CATALOG_ERROR",
                    "Book catalog error",
                )
            }
            CirculationError::CustomerDirectoryError(ref e) => {
                tracing::error!("Customer directory error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CUSTOMER_DIRECTORY_ERROR",
                    "Customer directory error",
                )
            }
        };

        let body = Json(ErrorResponse::new(error_type, message));
        (status, body).into_response()
    }
}
