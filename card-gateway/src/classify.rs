//! Mapping of Stripe failures onto gateway error categories.

use reqwest::StatusCode;
use voucher_types::ErrorCategory;

/// Classifies the `error.type` field of a Stripe error body.
pub fn classify_error_type(error_type: &str) -> ErrorCategory {
    match error_type {
        "invalid_request_error" => ErrorCategory::InvalidRequest,
        "api_error" => ErrorCategory::ProviderError,
        "api_connection_error" => ErrorCategory::ConnectionFailure,
        "card_error" => ErrorCategory::CardDeclined,
        _ => ErrorCategory::Unknown,
    }
}

/// Classifies a failed response whose body carried no usable error type.
pub fn classify_status(status: StatusCode) -> ErrorCategory {
    match status {
        StatusCode::PAYMENT_REQUIRED => ErrorCategory::CardDeclined,
        StatusCode::BAD_REQUEST
        | StatusCode::UNAUTHORIZED
        | StatusCode::FORBIDDEN
        | StatusCode::NOT_FOUND => ErrorCategory::InvalidRequest,
        StatusCode::TOO_MANY_REQUESTS => ErrorCategory::ProviderError,
        s if s.is_server_error() => ErrorCategory::ProviderError,
        _ => ErrorCategory::Unknown,
    }
}

/// Classifies a transport-level failure from the HTTP client, including a
/// body that stopped arriving.
pub fn classify_transport(err: &reqwest::Error) -> ErrorCategory {
    if err.is_timeout() || err.is_connect() || err.is_request() || err.is_body() {
        ErrorCategory::ConnectionFailure
    } else if err.is_builder() {
        ErrorCategory::InvalidRequest
    } else {
        ErrorCategory::Unknown
    }
}
