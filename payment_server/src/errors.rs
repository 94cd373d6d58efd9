use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use payment_engine::traits::PaymentGatewayError;
use thiserror::Error;

use crate::integrations::gateway::GatewayError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Payload deserialization error. {0}")]
    CouldNotDeserializePayload(String),
    #[error("Payment signature is invalid")]
    InvalidSignature,
    #[error("Payment verification failed. {0}")]
    VerificationFailed(String),
    #[error("The payment has not been captured by the gateway")]
    PaymentNotCaptured,
    #[error("The payment gateway could not be reached to verify the payment")]
    VerificationUnavailable,
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("The requested status change is not allowed. {0}")]
    InvalidTransition(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::CouldNotDeserializePayload(_) => StatusCode::BAD_REQUEST,
            Self::InvalidSignature => StatusCode::BAD_REQUEST,
            Self::VerificationFailed(_) => StatusCode::BAD_REQUEST,
            Self::PaymentNotCaptured => StatusCode::BAD_REQUEST,
            Self::InvalidTransition(_) => StatusCode::BAD_REQUEST,
            Self::VerificationUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
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
            .body(serde_json::json!({ "success": false, "error": self.to_string() }).to_string())
    }
}

impl From<PaymentGatewayError> for ServerError {
    fn from(e: PaymentGatewayError) -> Self {
        match e {
            PaymentGatewayError::OrderNotFound(id) => Self::NoRecordFound(format!("Order {id} not found")),
            PaymentGatewayError::TransitionError(e) => Self::InvalidTransition(e.to_string()),
            PaymentGatewayError::StatusConflict(id) => {
                Self::InvalidTransition(format!("The status of order {id} changed while the update was in flight"))
            },
            PaymentGatewayError::DraftRequired(id) => {
                Self::VerificationFailed(format!("No order details on record or supplied for {id}"))
            },
            e => Self::BackendError(e.to_string()),
        }
    }
}

impl From<GatewayError> for ServerError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Unavailable(_) => Self::VerificationUnavailable,
            GatewayError::PaymentNotFound(id) => Self::VerificationFailed(format!("Payment {id} is not known to the gateway")),
            GatewayError::InvalidResponse(s) => Self::BackendError(format!("Unexpected gateway response: {s}")),
        }
    }
}
