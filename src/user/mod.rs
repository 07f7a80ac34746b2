use std::sync::Arc;

use axum::http::StatusCode;

use repository::UserRepository;
use service::UserService;

pub mod model;
pub mod repository;
pub mod service;

type Result<T> = std::result::Result<T, Error>;
pub type Repository = Arc<dyn UserRepository + Send + Sync>;
pub type Service = Arc<dyn UserService + Send + Sync>;

uuid_id!(Id);

#[derive(thiserror::Error, Debug)]
pub enum Error {
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
            Error::_R2d2(_) | Error::_Diesel(_) | Error::_Join(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
