use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use donation_payment_engine::{DonationApiError, LedgerError};
use provider_tools::ProviderApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not interpret the request payload. {0}")]
    MalformedPayload(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The donation can no longer be cancelled. {0}")]
    CancelForbidden(String),
    #[error("The payment provider could not be reached. {0}")]
    ProviderUnavailable(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::CancelForbidden(_) => StatusCode::CONFLICT,
            Self::ProviderUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<LedgerError> for ServerError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::DonationNotFound(_) | LedgerError::CampaignNotFound(_) => Self::NoRecordFound(e.to_string()),
            LedgerError::CancelForbidden(_) => Self::CancelForbidden(e.to_string()),
            LedgerError::InvalidAmount(_) => Self::MalformedPayload(e.to_string()),
            LedgerError::DatabaseError(_) | LedgerError::QueryError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<DonationApiError> for ServerError {
    fn from(e: DonationApiError) -> Self {
        Self::BackendError(e.to_string())
    }
}

impl From<ProviderApiError> for ServerError {
    fn from(e: ProviderApiError) -> Self {
        Self::ProviderUnavailable(e.to_string())
    }
}
