use actix_web::{http::StatusCode, HttpResponse};
use serde::Serialize;
use snafu::Snafu;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Resource not found: {resource}"))]
    NotFound { resource: String },

    #[snafu(display("Method not allowed"))]
    MethodNotAllowed,

    #[snafu(display("{source}"))]
    Sqlx {
        #[snafu(source)]
        source: sqlx::Error,
    },

    #[snafu(display("Error running migrations"))]
    Migration {
        #[snafu(source)]
        source: sqlx::migrate::MigrateError,
    },

    #[snafu(display("{message}"))]
    Unavailable { message: String },

    #[snafu(display("Invalid parameter: {message}"))]
    InvalidParameter { message: String },

    #[snafu(display("{message}"))]
    MissingParameter { message: String },
}

impl From<sqlx::Error> for Error {
    fn from(source: sqlx::Error) -> Self {
        Self::Sqlx { source }
    }
}

impl From<sqlx::migrate::MigrateError> for Error {
    fn from(source: sqlx::migrate::MigrateError) -> Self {
        Self::Migration { source }
    }
}

impl Error {
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    pub fn missing_parameter(message: impl Into<String>) -> Self {
        Self::MissingParameter {
            message: message.into(),
        }
    }

    /// True for failures of the backing store rather than of the request.
    pub fn is_store_error(&self) -> bool {
        matches!(
            self,
            Self::Sqlx { .. } | Self::Migration { .. } | Self::Unavailable { .. }
        )
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl actix_web::ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,

            Self::MissingParameter { .. } | Self::InvalidParameter { .. } => {
                StatusCode::BAD_REQUEST
            }

            Self::Migration { .. } | Self::Sqlx { .. } | Self::Unavailable { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}
