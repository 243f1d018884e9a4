//! Mapping from ledger errors to HTTP responses.
//!
//! Every failure leaves the server as a status code and a `{"error": ...}`
//! body. Storage details never reach the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use campus_ledger::{
    catalog::CatalogError, directory::DirectoryError, fees::FeeError, invoices::InvoiceError,
    payments::PaymentError, refunds::RefundError, reports::ReportError, session::SessionError,
    store::StoreError,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error returned by every handler
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "Insufficient permissions")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

fn store_status(e: &StoreError) -> StatusCode {
    match e {
        StoreError::Conflict(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn directory_status(e: &DirectoryError) -> StatusCode {
    match e {
        DirectoryError::Store(e) => store_status(e),
        DirectoryError::UserNotFound(_) => StatusCode::NOT_FOUND,
        DirectoryError::UsernameTaken(_) => StatusCode::CONFLICT,
        DirectoryError::InvalidUsername
        | DirectoryError::InsufficientBalance { .. }
        | DirectoryError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
    }
}

fn catalog_status(e: &CatalogError) -> StatusCode {
    match e {
        CatalogError::Store(e) => store_status(e),
        CatalogError::CategoryNotFound(_)
        | CatalogError::StructureNotFound(_)
        | CatalogError::PolicyNotFound(_) => StatusCode::NOT_FOUND,
        CatalogError::InvalidAmount(_) | CatalogError::MissingField(_) => StatusCode::BAD_REQUEST,
    }
}

fn fee_status(e: &FeeError) -> StatusCode {
    match e {
        FeeError::Store(e) => store_status(e),
        FeeError::Catalog(e) => catalog_status(e),
        FeeError::Directory(e) => directory_status(e),
        FeeError::FeeNotFound(_) | FeeError::StructureNotFound(_) | FeeError::UserNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        FeeError::InvalidAmount(_) | FeeError::ExceedsRemaining { .. } => StatusCode::BAD_REQUEST,
    }
}

fn payment_status(e: &PaymentError) -> StatusCode {
    match e {
        PaymentError::Store(e) => store_status(e),
        PaymentError::Fee(e) => fee_status(e),
        PaymentError::Directory(e) => directory_status(e),
        PaymentError::FeeNotFound(_) | PaymentError::PaymentNotFound(_) => StatusCode::NOT_FOUND,
        PaymentError::InvalidAmount(_) | PaymentError::InsufficientBalance { .. } => {
            StatusCode::BAD_REQUEST
        }
        PaymentError::DuplicatePayment(_) => StatusCode::CONFLICT,
    }
}

fn refund_status(e: &RefundError) -> StatusCode {
    match e {
        RefundError::Store(e) => store_status(e),
        RefundError::RequestNotFound(_) => StatusCode::NOT_FOUND,
        RefundError::InvalidAmount(_) | RefundError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
    }
}

fn invoice_status(e: &InvoiceError) -> StatusCode {
    match e {
        InvoiceError::Store(e) => store_status(e),
        InvoiceError::Payment(e) => payment_status(e),
        InvoiceError::Directory(e) => directory_status(e),
        InvoiceError::InvoiceNotFound(_) => StatusCode::NOT_FOUND,
        InvoiceError::NotPayable { .. } => StatusCode::CONFLICT,
        InvoiceError::InvalidAmount(_)
        | InvoiceError::MissingField(_)
        | InvoiceError::InsufficientBalance { .. } => StatusCode::BAD_REQUEST,
    }
}

fn session_status(e: &SessionError) -> StatusCode {
    match e {
        SessionError::Store(e) => store_status(e),
        SessionError::Directory(e) => directory_status(e),
        SessionError::InvalidCredentials | SessionError::SessionNotFound => {
            StatusCode::UNAUTHORIZED
        }
        SessionError::AccountDisabled => StatusCode::FORBIDDEN,
    }
}

fn report_status(e: &ReportError) -> StatusCode {
    match e {
        ReportError::Directory(e) => directory_status(e),
        ReportError::Fee(e) => fee_status(e),
        ReportError::Payment(e) => payment_status(e),
    }
}

macro_rules! impl_from_ledger_error {
    ($($error:ty => $status:ident),* $(,)?) => {
        $(
            impl From<$error> for ApiError {
                fn from(e: $error) -> Self {
                    let status = $status(&e);
                    if status.is_server_error() {
                        tracing::error!("Request failed: {e}");
                    }
                    ApiError::new(status, e.client_message())
                }
            }
        )*
    };
}

impl_from_ledger_error! {
    StoreError => store_status,
    DirectoryError => directory_status,
    CatalogError => catalog_status,
    FeeError => fee_status,
    PaymentError => payment_status,
    RefundError => refund_status,
    InvoiceError => invoice_status,
    SessionError => session_status,
    ReportError => report_status,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let err: ApiError = FeeError::FeeNotFound("sfee-1".to_string()).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_nested_errors_keep_inner_status() {
        let err: ApiError =
            PaymentError::Fee(FeeError::Directory(DirectoryError::UsernameTaken("a".into())))
                .into();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[test]
    fn test_storage_details_are_hidden() {
        let io = std::io::Error::other("disk on fire");
        let err: ApiError = DirectoryError::Store(StoreError::Io(io)).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("disk"));
    }

    #[test]
    fn test_duplicate_payment_is_conflict() {
        let err: ApiError = PaymentError::DuplicatePayment("key".to_string()).into();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[test]
    fn test_bad_credentials_are_unauthorized() {
        let err: ApiError = SessionError::InvalidCredentials.into();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        let err: ApiError = SessionError::AccountDisabled.into();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }
}
