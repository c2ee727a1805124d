use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    UnprocessableEntity(String),
    #[error("{0}")]
    EntityNotFound(String),
    // 開始時刻が終了時刻以降など、時間窓そのものが不正な場合
    #[error("{0}")]
    InvalidRange(String),
    // ルールの時間窓が会場の営業時間の外にはみ出している場合
    #[error("{0}")]
    OutOfVenueHours(String),
    // 同一の設備・日付・開始時刻にすでに有効な予約が存在する場合。
    // 同時リクエストで日常的に起こりうるため、ストレージ起因の失敗とは
    // 区別して呼び出し元へ返す。
    #[error("{0}")]
    SlotConflict(String),
    // PENDING 以外の予約に対する確定操作
    #[error("{0}")]
    NotPending(String),
    // キャンセル・ブロック解除できない状態の予約に対する操作
    #[error("{0}")]
    NotCancellable(String),
    #[error("キャンセル・ブロックには理由の指定が必要です。")]
    ReasonRequired,
    #[error("{0}")]
    ValidationError(#[from] garde::Report),
    #[error("許可されていない操作です。")]
    ForbiddenOperation,
    #[error("認証情報がありません。")]
    UnauthenticatedError,
    #[error("{0}")]
    ConvertToUuidError(#[from] uuid::Error),
    #[error("{0}")]
    ConversionEntityError(String),
    #[error("トランザクションを実行できませんでした。")]
    TransactionError(#[source] sqlx::Error),
    #[error("データベース処理実行中にエラーが発生しました。")]
    SpecificOperationError(#[source] sqlx::Error),
    #[error("No rows affected: {0}")]
    NoRowsAffectedError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status_code = match &self {
            AppError::UnprocessableEntity(_)
            | AppError::InvalidRange(_)
            | AppError::OutOfVenueHours(_)
            | AppError::NotPending(_)
            | AppError::NotCancellable(_)
            | AppError::ReasonRequired
            | AppError::ValidationError(_)
            | AppError::ConvertToUuidError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::EntityNotFound(_) => StatusCode::NOT_FOUND,
            AppError::SlotConflict(_) => StatusCode::CONFLICT,
            AppError::ForbiddenOperation => StatusCode::FORBIDDEN,
            AppError::UnauthenticatedError => StatusCode::UNAUTHORIZED,
            e @ (AppError::ConversionEntityError(_)
            | AppError::TransactionError(_)
            | AppError::SpecificOperationError(_)
            | AppError::NoRowsAffectedError(_)) => {
                tracing::error!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "Unexpected error happened"
                );
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status_code, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
