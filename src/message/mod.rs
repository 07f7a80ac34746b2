use std::sync::Arc;

use axum::{Router, http::StatusCode, routing::get};

use repository::MessageRepository;
use service::MessageService;

use crate::{group, state::AppState, upload};

mod handler;
pub mod model;
pub mod repository;
pub mod service;

type Result<T> = std::result::Result<T, Error>;
pub type Repository = Arc<dyn MessageRepository + Send + Sync>;
pub type Service = Arc<dyn MessageService + Send + Sync>;

uuid_id!(Id);

pub fn api<S>(s: AppState) -> Router<S> {
    Router::new()
        .route(
            "/groups/{id}/messages",
            get(handler::api::find_all).post(handler::api::create),
        )
        .with_state(s)
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("message has neither text nor image")]
    EmptyMessage,

    #[error(transparent)]
    _Group(#[from] group::Error),
    #[error(transparent)]
    _Upload(#[from] upload::Error),
    #[error(transparent)]
    _R2d2(#[from] r2d2::Error),
    #[error(transparent)]
    _Diesel(#[from] diesel::result::Error),
    #[error(transparent)]
    _Join(#[from] tokio::task::JoinError),
}

impl From<Error> for StatusCode {
    fn from(e: Error) -> Self {
        match e {
            Error::EmptyMessage => StatusCode::BAD_REQUEST,
            Error::_Group(e) => e.into(),
            Error::_Upload(e) => e.into(),
            Error::_R2d2(_) | Error::_Diesel(_) | Error::_Join(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
