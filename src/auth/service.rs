use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use log::debug;

use super::TokenClaims;
use crate::user;

pub trait AuthService {
    fn validate(&self, token: &str) -> super::Result<user::Id>;

    fn issue(&self, user_id: &user::Id, ttl: Duration) -> super::Result<String>;
}

pub struct JwtAuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtAuthService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

impl AuthService for JwtAuthService {
    fn validate(&self, token: &str) -> super::Result<user::Id> {
        match decode::<TokenClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Ok(data.claims.sub),
            Err(e) => {
                debug!("rejecting token: {e}");
                Err(super::Error::Unauthorized)
            }
        }
    }

    fn issue(&self, user_id: &user::Id, ttl: Duration) -> super::Result<String> {
        let exp = jsonwebtoken::get_current_timestamp() + ttl.as_secs();
        let claims = TokenClaims { sub: *user_id, exp };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }
}
