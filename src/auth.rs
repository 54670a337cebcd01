//! Identity of the caller, issued by the external auth service as a JWT.
//!
//! The token is read from the `Authorization: Bearer` header or from the
//! identity cookie and verified with the shared secret. The hub carried by
//! the token scopes every query of the request.

use std::future::{Ready, ready};

use actix_identity::IdentityExt;
use actix_web::dev::Payload;
use actix_web::error::InternalError;
use actix_web::http::header;
use actix_web::{FromRequest, HttpRequest, HttpResponse, HttpResponseBuilder, web};
use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::dto::ApiResponse;
use crate::models::config::ServerConfig;

/// Claims of an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub sub: String,
    pub email: String,
    pub hub_id: i32,
    pub name: String,
    pub roles: Vec<String>,
    pub exp: usize,
}

/// Whether `roles` contains `role`.
pub fn check_role(role: &str, roles: &[String]) -> bool {
    roles.iter().any(|r| r == role)
}

/// Verifies an HS256 token and returns its claims.
pub fn decode_token(
    token: &str,
    secret: &str,
) -> Result<AuthenticatedUser, jsonwebtoken::errors::Error> {
    let data = jsonwebtoken::decode::<AuthenticatedUser>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

fn reject(mut status: HttpResponseBuilder, message: &'static str) -> actix_web::Error {
    let response = status.json(ApiResponse::failure(message));
    InternalError::from_response(message, response).into()
}

impl AuthenticatedUser {
    fn from_http_request(req: &HttpRequest) -> Result<Self, actix_web::Error> {
        let Some(config) = req.app_data::<web::Data<ServerConfig>>() else {
            log::error!("Server config is not registered as app data");
            return Err(reject(
                HttpResponse::InternalServerError(),
                "internal error",
            ));
        };

        let token = bearer_token(req)
            .or_else(|| {
                req.get_identity()
                    .ok()
                    .and_then(|identity| identity.id().ok())
            })
            .ok_or_else(|| reject(HttpResponse::Unauthorized(), "unauthorized"))?;

        decode_token(&token, &config.secret).map_err(|e| {
            log::warn!("Rejected identity token: {e}");
            reject(HttpResponse::Unauthorized(), "unauthorized")
        })
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_http_request(req))
    }
}
