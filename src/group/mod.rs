use std::sync::Arc;

use axum::{
    Router,
    http::StatusCode,
    routing::{delete, post},
};

use repository::GroupRepository;
use service::GroupService;

use crate::{state::AppState, upload, user};

mod handler;
pub mod model;
pub mod repository;
pub mod service;

type Result<T> = std::result::Result<T, Error>;
pub type Repository = Arc<dyn GroupRepository + Send + Sync>;
pub type Service = Arc<dyn GroupService + Send + Sync>;

/// Stored form of a membership entry: the bare user id.
pub type MemberRef = user::Id;

/// Members a group needs besides its creator.
pub const MIN_OTHER_MEMBERS: usize = 2;

uuid_id!(Id);

pub fn api<S>(s: AppState) -> Router<S> {
    Router::new()
        .route(
            "/groups",
            post(handler::api::create).get(handler::api::find_all),
        )
        .route("/groups/{id}", delete(handler::api::delete))
        .route("/groups/{id}/leave", post(handler::api::leave))
        .route("/groups/{id}/members", post(handler::api::add_members))
        .with_state(s)
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("group not found: {0}")]
    NotFound(Id),
    #[error("only the group admin can do that")]
    NotAdmin,
    #[error("not a member of the group")]
    NotMember,
    #[error("missing group name")]
    MissingName,
    #[error("group needs at least 2 members besides the creator, got {0}")]
    NotEnoughMembers(usize),
    #[error("members are required")]
    NoMembersToAdd,
    #[error("all users are already members")]
    AlreadyMembers,
    #[error("selected users do not exist: {0:?}")]
    NonExistingUsers(Vec<user::Id>),
    #[error("could not delete group")]
    NotDeleted,

    #[error(transparent)]
    _Upload(#[from] upload::Error),
    #[error(transparent)]
    _User(#[from] user::Error),
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
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::NotAdmin | Error::NotMember => StatusCode::FORBIDDEN,
            Error::MissingName
            | Error::NotEnoughMembers(_)
            | Error::NoMembersToAdd
            | Error::AlreadyMembers
            | Error::NonExistingUsers(_) => StatusCode::BAD_REQUEST,
            Error::_Upload(e) => e.into(),
            Error::NotDeleted
            | Error::_User(_)
            | Error::_R2d2(_)
            | Error::_Diesel(_)
            | Error::_Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
