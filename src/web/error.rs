//! Errors returned by API handlers, always rendered as a [`GenericResponse`].

use super::response::GenericResponse;
use crate::help::HelpError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use validator::ValidationErrors;

#[derive(Debug)]
pub enum ApiError {
    /// Malformed path argument such as a non-positive id
    InvalidArgument(String),
    /// Malformed or rejected input
    BadRequest(Vec<String>),
    Unauthorized,
    Forbidden,
    NotFound(String),
    Internal,
}

impl ApiError {
    pub fn bad_request(message: &str) -> Self {
        ApiError::BadRequest(vec![message.to_owned()])
    }

    fn messages(&self) -> Vec<String> {
        match self {
            ApiError::InvalidArgument(msg) | ApiError::NotFound(msg) => vec![msg.to_owned()],
            ApiError::BadRequest(messages) => messages.to_owned(),
            ApiError::Unauthorized => vec!["Authentication required.".to_owned()],
            ApiError::Forbidden => vec!["Insufficient permissions.".to_owned()],
            ApiError::Internal => vec!["Internal server error.".to_owned()],
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.messages().join(" "))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidArgument(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(GenericResponse::<()>::failure(self.messages()))
    }
}

impl From<HelpError> for ApiError {
    fn from(e: HelpError) -> Self {
        match e {
            HelpError::NotFound(msg) => ApiError::NotFound(msg.to_owned()),
            HelpError::Invalid(msg) => ApiError::bad_request(msg),
            HelpError::Forbidden => ApiError::Forbidden,
            HelpError::Db(_) | HelpError::Upload(_) => {
                log::error!("{}", e);
                ApiError::Internal
            }
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(e: ValidationErrors) -> Self {
        ApiError::BadRequest(validation_messages(&e))
    }
}

/// Flattens field errors into sorted `"field: message"` strings.
pub fn validation_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| match &error.message {
                Some(message) => format!("{}: {}", field, message),
                None => format!("{}: {}", field, error.code),
            })
        })
        .collect();
    messages.sort();
    messages
}
