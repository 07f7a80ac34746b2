use std::sync::Arc;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::user;

pub mod middleware;
pub mod service;

type Result<T> = std::result::Result<T, Error>;
pub type Service = Arc<dyn service::AuthService + Send + Sync>;

/// Cookie the web client keeps its session token in.
pub const SESSION_COOKIE: &str = "jwt";

#[derive(Serialize, Deserialize, Clone, Debug)]
struct TokenClaims {
    sub: user::Id,
    exp: u64,
}

/// Caller of the current request, resolved from the session token.
#[derive(Clone, Debug, PartialEq)]
pub struct User {
    id: user::Id,
}

impl User {
    pub fn new(id: user::Id) -> Self {
        Self { id }
    }

    pub const fn id(&self) -> &user::Id {
        &self.id
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("unauthorized to access the resource")]
    Unauthorized,

    #[error(transparent)]
    _JsonWebtoken(#[from] jsonwebtoken::errors::Error),
}

impl From<Error> for StatusCode {
    fn from(_: Error) -> Self {
        StatusCode::UNAUTHORIZED
    }
}
