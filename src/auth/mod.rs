pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user::normalize_email;
use crate::models::User;

// Re-export necessary items
pub use extractors::AuthenticatedUser;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenService};

/// Represents the payload for a user signup request.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SignupRequest {
    /// Must be a valid email format.
    #[serde(default)]
    #[validate(email(message = "Enter a valid email"))]
    pub email: String,
    /// Must be at least 6 characters long.
    #[serde(default)]
    #[validate(length(min = 6, message = "Password should be of minimum 6 characters length"))]
    pub password: String,
}

impl SignupRequest {
    pub fn normalized(self) -> Self {
        Self {
            email: normalize_email(&self.email),
            password: self.password,
        }
    }
}

/// Represents the payload for a user login request.
///
/// Only presence is checked; a malformed email simply fails as invalid credentials.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Response after successful signup or login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The bearer token for subsequent requests.
    pub token: String,
    pub user: User,
}
