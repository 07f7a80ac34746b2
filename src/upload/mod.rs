use std::sync::Arc;

use axum::{Router, http::StatusCode, routing::post};
use log::debug;
use url::Url;

use service::MediaHost;

use crate::state::AppState;

mod handler;
pub mod service;

type Result<T> = std::result::Result<T, Error>;
pub type Service = Arc<dyn MediaHost + Send + Sync>;

const DATA_URI_PREFIX: &str = "data:";

pub fn api<S>(s: AppState) -> Router<S> {
    Router::new()
        .route("/uploads", post(handler::api::upload))
        .with_state(s)
}

/// Turns an inline image into a hosted URL.
///
/// `data:` URIs are pushed to the media host and replaced by the URL it returns.
/// Anything else must already be an absolute URL and is kept as a reference.
/// Blank values mean "no image".
pub async fn resolve_image(media: &Service, image: Option<String>) -> Result<Option<String>> {
    let Some(image) = image.filter(|i| !i.trim().is_empty()) else {
        return Ok(None);
    };

    if image.starts_with(DATA_URI_PREFIX) {
        let url = media.upload(&image).await?;
        debug!("inline image uploaded to {url}");
        return Ok(Some(url));
    }

    match Url::parse(&image) {
        Ok(url) if !url.cannot_be_a_base() => Ok(Some(image)),
        _ => Err(Error::InvalidImage),
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("image is required")]
    Missing,
    #[error("image must be a data URI or an absolute URL")]
    InvalidImage,
    #[error("media host rejected upload with status {0}")]
    Rejected(reqwest::StatusCode),
    #[error("media host response has no url")]
    MissingUrl,

    #[error(transparent)]
    _Reqwest(#[from] reqwest::Error),
}

impl From<Error> for StatusCode {
    fn from(e: Error) -> Self {
        match e {
            Error::Missing | Error::InvalidImage => StatusCode::BAD_REQUEST,
            Error::Rejected(_) | Error::MissingUrl | Error::_Reqwest(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
