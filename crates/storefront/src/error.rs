//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding. All route handlers return `Result<T, AppError>`, and
//! every error reaches the client as `{"error": "<message>"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use green_aura_core::{CartError, OrderStatusError};

use crate::db::RepositoryError;
use crate::db::orders::PlaceOrderError;
use crate::models::ValidationError;
use crate::services::auth::AuthError;
use crate::services::cart::CartServiceError;
use crate::services::checkout::CheckoutError;
use crate::services::orders::OrderServiceError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart mutation rejected.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Order placement failed.
    #[error("Order error: {0}")]
    Order(#[from] PlaceOrderError),

    /// Status change rejected.
    #[error("Status error: {0}")]
    Status(#[from] OrderStatusError),

    /// Request body failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Session store failure.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Signed in, but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request conflicts with current state.
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<CartServiceError> for AppError {
    fn from(err: CartServiceError) -> Self {
        match err {
            CartServiceError::Cart(e) => Self::Cart(e),
            CartServiceError::ProductUnavailable(_) => Self::NotFound(err.to_string()),
            CartServiceError::InsufficientStock { .. } => Self::Conflict(err.to_string()),
            CartServiceError::Session(e) => Self::Session(e),
            CartServiceError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::EmptyCart => Self::BadRequest("Your cart is empty".to_owned()),
            CheckoutError::Order(e) => Self::Order(e),
            CheckoutError::Session(e) => Self::Session(e),
            CheckoutError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<OrderServiceError> for AppError {
    fn from(err: OrderServiceError) -> Self {
        match err {
            OrderServiceError::NotFound => Self::NotFound("Order not found".to_owned()),
            OrderServiceError::Status(e) => Self::Status(e),
            OrderServiceError::StatusChanged => Self::Conflict(err.to_string()),
            OrderServiceError::Repository(e) => Self::Database(e),
        }
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
                AuthError::EmailNotVerified => StatusCode::FORBIDDEN,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_)
                | AuthError::InvalidCode
                | AuthError::CodeExpired => StatusCode::BAD_REQUEST,
                AuthError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Cart(err) => match err {
                CartError::InvalidQuantity => StatusCode::BAD_REQUEST,
                CartError::NotInCart(_) => StatusCode::NOT_FOUND,
            },
            Self::Order(err) => match err {
                PlaceOrderError::EmptyOrder | PlaceOrderError::InvalidQuantity => {
                    StatusCode::BAD_REQUEST
                }
                PlaceOrderError::AddressNotFound => StatusCode::NOT_FOUND,
                PlaceOrderError::OrganizationUnavailable
                | PlaceOrderError::ProductUnavailable(_)
                | PlaceOrderError::WrongOrganization(_)
                | PlaceOrderError::InsufficientStock { .. } => StatusCode::CONFLICT,
                PlaceOrderError::Database(_) | PlaceOrderError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Status(err) => match err {
                OrderStatusError::Unknown(_) => StatusCode::BAD_REQUEST,
                OrderStatusError::InvalidTransition { .. } | OrderStatusError::Terminal(_) => {
                    StatusCode::CONFLICT
                }
            },
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the client. Server errors are not described.
    fn client_message(&self) -> String {
        if self.status().is_server_error() {
            return "Internal server error".to_owned();
        }
        match self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_owned(),
            Self::Database(RepositoryError::Conflict(msg)) => msg.clone(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => {
                    "Invalid credentials".to_owned()
                }
                AuthError::EmailNotVerified => {
                    "Verify your email address before signing in".to_owned()
                }
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_owned()
                }
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_owned(),
                AuthError::InvalidCode => "Invalid verification code".to_owned(),
                AuthError::CodeExpired => {
                    "Verification code expired, request a new one".to_owned()
                }
                AuthError::TooManyAttempts => {
                    "Too many incorrect codes, request a new one".to_owned()
                }
                _ => "Authentication error".to_owned(),
            },
            Self::Cart(err) => err.to_string(),
            Self::Order(err) => err.to_string(),
            Self::Status(err) => err.to_string(),
            Self::Validation(err) => err.to_string(),
            Self::NotFound(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg)
            | Self::Conflict(msg) => msg.clone(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(json!({ "error": self.client_message() }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
