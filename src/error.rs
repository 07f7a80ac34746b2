use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use log::{error, warn};
use serde::Serialize;

use crate::{auth, event, group, integration, message, upload, user};

#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    _Auth(#[from] auth::Error),
    _Event(#[from] event::Error),
    _Group(#[from] group::Error),
    _Integration(#[from] integration::Error),
    _Json(#[from] JsonRejection),
    _Message(#[from] message::Error),
    _Path(#[from] PathRejection),
    _Upload(#[from] upload::Error),
    _User(#[from] user::Error),
}

impl From<Error> for StatusCode {
    fn from(e: Error) -> Self {
        match e {
            Error::_Auth(e) => e.into(),
            Error::_Group(e) => e.into(),
            Error::_Message(e) => e.into(),
            Error::_Upload(e) => e.into(),
            Error::_User(e) => e.into(),
            Error::_Json(_) | Error::_Path(_) => StatusCode::BAD_REQUEST,
            Error::_Event(_) | Error::_Integration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let status = StatusCode::from(self);

        let message = if status.is_server_error() {
            error!("{message}");
            "Internal server error".to_owned()
        } else {
            warn!("{status}: {message}");
            message
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}
