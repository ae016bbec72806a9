use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::JsonResponse;

pub const DEACTIVATED_CODE: &str = "ACCOUNT_DEACTIVATED";

#[derive(Debug)]
pub enum RequestError {
    NotFound(&'static str),
    NotAuthorized(&'static str),
    Forbidden,
    Deactivated,
    RunTimeError(&'static str),
    ServerError,
    DatabaseError(sqlx::Error),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RequestErrorJsonWrapper {
    pub success: bool,
    pub errors: RequestErrorJson,
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RequestErrorJson {
    pub body: Vec<String>,
}

impl RequestErrorJsonWrapper {
    pub fn new(error: &str, code: &str) -> RequestErrorJsonWrapper {
        RequestErrorJsonWrapper {
            success: false,
            errors: RequestErrorJson {
                body: vec![error.to_string()],
            },
            code: code.to_string(),
        }
    }

    pub fn message(&self) -> String {
        self.errors.body.join("\n")
    }
}

impl From<sqlx::Error> for RequestError {
    fn from(value: sqlx::Error) -> Self {
        Self::DatabaseError(value)
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> axum::response::Response {
        self.to_json_response().into_response()
    }
}

impl RequestError {
    pub fn to_json_response(&self) -> JsonResponse<RequestErrorJsonWrapper> {
        let (status_code, json) = match self {
            RequestError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                RequestErrorJsonWrapper::new(message, "NOT_FOUND"),
            ),
            RequestError::NotAuthorized(message) => (
                StatusCode::UNAUTHORIZED,
                RequestErrorJsonWrapper::new(message, "UNAUTHORIZED"),
            ),
            RequestError::Forbidden => (
                StatusCode::FORBIDDEN,
                RequestErrorJsonWrapper::new("Forbidden", "FORBIDDEN"),
            ),
            RequestError::Deactivated => (
                StatusCode::FORBIDDEN,
                RequestErrorJsonWrapper::new("Account has been deactivated", DEACTIVATED_CODE),
            ),
            RequestError::RunTimeError(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                RequestErrorJsonWrapper::new(message, "UNPROCESSABLE"),
            ),
            RequestError::ServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                RequestErrorJsonWrapper::new("Internal Server Error", "SERVER_ERROR"),
            ),
            RequestError::DatabaseError(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    RequestErrorJsonWrapper::new("Internal Server Error", "SERVER_ERROR"),
                )
            }
        };
        (status_code, Json(json))
    }

    pub fn is_unique_violation(&self) -> bool {
        match self {
            RequestError::DatabaseError(sqlx::Error::Database(e)) => {
                e.message().contains("UNIQUE constraint failed")
            }
            _ => false,
        }
    }
}
