use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::error::AppError;
use crate::models::User;

/// The caller resolved by `AuthMiddleware`.
///
/// Handlers take this instead of any client-supplied user id. Outside a scope wrapped by
/// `AuthMiddleware` the extension is missing and extraction fails with 401.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<User>().cloned() {
            Some(user) => ready(Ok(AuthenticatedUser(user))),
            None => {
                let err = AppError::Unauthorized(format!(
                    "no authenticated user on {}; is AuthMiddleware applied?",
                    req.path()
                ));
                ready(Err(err.into()))
            }
        }
    }
}
