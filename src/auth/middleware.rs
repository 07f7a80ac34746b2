use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use log::debug;

use crate::auth;

/// Resolves the caller from a bearer token or the session cookie and stores it as an
/// `auth::User` request extension.
pub async fn authorize(
    State(auth_service): State<auth::Service>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> crate::Result<Response> {
    let token = match req.headers().typed_get::<Authorization<Bearer>>() {
        Some(header) => header.token().to_owned(),
        None => jar
            .get(auth::SESSION_COOKIE)
            .map(|c| c.value().to_owned())
            .ok_or(auth::Error::Unauthorized)?,
    };

    let user_id = auth_service.validate(&token)?;
    debug!("authorized {user_id}");

    req.extensions_mut().insert(auth::User::new(user_id));

    Ok(next.run(req).await)
}
