use std::pin::Pin;
use std::sync::Arc;

use axum::{Router, routing::get};
use futures::Stream;
use serde::{Deserialize, Serialize};

use service::EventService;

use crate::group::model::{GroupDto, UpdateAction};
use crate::message::model::{DirectMessageDto, GroupMessageDto};
use crate::user::model::MemberSummary;
use crate::{group, state::AppState, user};

mod handler;
pub mod service;

type Result<T> = std::result::Result<T, Error>;
pub type Service = Arc<dyn EventService + Send + Sync>;
pub type NotificationStream = Pin<Box<dyn Stream<Item = Notification> + Send>>;

pub fn api<S>(s: AppState) -> Router<S> {
    Router::new()
        .route("/ws", get(handler::ws))
        .with_state(s)
}

/// Per-user push channel.
#[derive(Clone, Debug)]
pub enum Subject<'a> {
    Notifications(&'a user::Id),
}

/// Every real-time event a session can receive, framed as `{"event": .., "payload": ..}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum Notification {
    #[serde(rename = "group:created")]
    GroupCreated(GroupDto),
    #[serde(rename = "newGroupMessage")]
    NewGroupMessage(GroupMessageDto),
    #[serde(rename = "groupDeleted", rename_all = "camelCase")]
    GroupDeleted { group_id: group::Id },
    #[serde(rename = "group:member-left", rename_all = "camelCase")]
    MemberLeft {
        group_id: group::Id,
        left_user_id: user::Id,
        updated_group: GroupDto,
    },
    #[serde(rename = "addedToGroup")]
    AddedToGroup(GroupDto),
    #[serde(rename = "groupUpdated", rename_all = "camelCase")]
    GroupUpdated {
        action: UpdateAction,
        group: GroupDto,
        added_members: Vec<MemberSummary>,
    },
    #[serde(rename = "newMessage")]
    NewMessage(DirectMessageDto),
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    _Subscribe(#[from] async_nats::SubscribeError),
}
