use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::catalog::CatalogError;
use crate::progression::error::EngineError;
use crate::progression::service::ServiceError;
use crate::store::StoreError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub success: bool,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub trace_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    pub details: Option<Value>,
    pub is_operational: bool,
}

impl AppError {
    fn operational(status: StatusCode, code: &str, message: &str) -> Self {
        Self {
            status,
            code: code.to_string(),
            message: message.to_string(),
            details: None,
            is_operational: true,
        }
    }

    pub fn bad_request(code: &str, message: &str) -> Self {
        Self::operational(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn unauthorized(message: &str) -> Self {
        Self::operational(StatusCode::UNAUTHORIZED, "AUTH_UNAUTHORIZED", message)
    }

    pub fn not_found(message: &str) -> Self {
        Self::operational(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn conflict(code: &str, message: &str) -> Self {
        Self::operational(StatusCode::CONFLICT, code, message)
    }

    pub fn locked(message: &str, details: Value) -> Self {
        Self {
            details: Some(details),
            ..Self::operational(StatusCode::LOCKED, "CONTENT_LOCKED", message)
        }
    }

    pub fn internal(message: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "INTERNAL_ERROR".to_string(),
            message: message.to_string(),
            details: None,
            is_operational: false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let exposed_message = if self.is_operational {
            self.message.clone()
        } else {
            "服务器内部错误".to_string()
        };

        if self.is_operational {
            tracing::warn!(status = %self.status, code = %self.code, error = %self.message, "API error");
        } else {
            tracing::error!(status = %self.status, code = %self.code, error = %self.message, "Internal API error");
        }

        (
            self.status,
            Json(ErrorBody {
                success: false,
                code: self.code,
                message: exposed_message,
                details: self.details,
                trace_id: None,
            }),
        )
            .into_response()
    }
}

impl From<EngineError> for AppError {
    fn from(value: EngineError) -> Self {
        match &value {
            EngineError::InvalidInput(msg) => AppError::bad_request("INVALID_INPUT", msg),
            EngineError::PoolExhausted { .. } => Self::operational(
                StatusCode::NOT_FOUND,
                "CONTENT_UNAVAILABLE",
                &value.to_string(),
            ),
            EngineError::Locked {
                requested,
                unlocked,
                next_unlock_at,
            } => AppError::locked(
                &value.to_string(),
                serde_json::json!({
                    "requested": requested,
                    "unlocked": unlocked,
                    "nextUnlockAt": next_unlock_at,
                }),
            ),
        }
    }
}

// 映射规则：
// - Conflict -> 409（重复提交或进度已被其他请求推进）
// - NotFound -> 404
// - Validation -> 400（用户输入或损坏记录，消息可安全暴露）
// - 其他 -> 500（IntoResponse 中替换为通用消息）
impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        match &value {
            StoreError::Conflict { .. } => {
                AppError::conflict("PROGRESS_CONFLICT", "进度已更新，请刷新后重试")
            }
            StoreError::NotFound { .. } => AppError::not_found(&value.to_string()),
            StoreError::Validation(msg) => AppError::bad_request("VALIDATION_ERROR", msg),
            _ => AppError::internal(&value.to_string()),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::Engine(e) => e.into(),
            ServiceError::Store(e) => e.into(),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(value: CatalogError) -> Self {
        AppError::internal(&value.to_string())
    }
}

pub fn ok<T: Serialize>(data: T) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(ApiResponse {
            success: true,
            data,
        }),
    )
}

pub fn created<T: Serialize>(data: T) -> impl IntoResponse {
    (
        StatusCode::CREATED,
        Json(ApiResponse {
            success: true,
            data,
        }),
    )
}
