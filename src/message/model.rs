use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::{Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};

use crate::integration::db;
use crate::{group, user};

use super::Id;

#[derive(Queryable, Selectable, Insertable, Clone, Debug, PartialEq)]
#[diesel(table_name = crate::schema::group_messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct GroupMessage {
    id: Id,
    group_id: group::Id,
    sender_id: user::Id,
    text: Option<String>,
    image: Option<String>,
    created_at: NaiveDateTime,
}

impl GroupMessage {
    pub fn new(
        group_id: group::Id,
        sender_id: user::Id,
        text: Option<String>,
        image: Option<String>,
    ) -> Self {
        Self {
            id: Id::random(),
            group_id,
            sender_id,
            text,
            image,
            created_at: db::now(),
        }
    }

    pub const fn id(&self) -> &Id {
        &self.id
    }

    pub const fn group_id(&self) -> &group::Id {
        &self.group_id
    }

    pub const fn sender_id(&self) -> &user::Id {
        &self.sender_id
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMessageDto {
    id: Id,
    group_id: group::Id,
    sender_id: user::Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    created_at: DateTime<Utc>,
}

impl GroupMessageDto {
    pub const fn id(&self) -> &Id {
        &self.id
    }

    pub const fn group_id(&self) -> &group::Id {
        &self.group_id
    }

    pub const fn sender_id(&self) -> &user::Id {
        &self.sender_id
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }
}

impl From<GroupMessage> for GroupMessageDto {
    fn from(m: GroupMessage) -> Self {
        Self {
            id: m.id,
            group_id: m.group_id,
            sender_id: m.sender_id,
            text: m.text,
            image: m.image,
            created_at: m.created_at.and_utc(),
        }
    }
}

/// One-to-one message owned by the direct-message subsystem; carried on the same event stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectMessageDto {
    id: Id,
    sender_id: user::Id,
    receiver_id: user::Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    created_at: DateTime<Utc>,
}

impl DirectMessageDto {
    pub fn new(sender_id: user::Id, receiver_id: user::Id, text: impl Into<String>) -> Self {
        Self {
            id: Id::random(),
            sender_id,
            receiver_id,
            text: Some(text.into()),
            image: None,
            created_at: Utc::now(),
        }
    }

    pub const fn id(&self) -> &Id {
        &self.id
    }

    pub const fn sender_id(&self) -> &user::Id {
        &self.sender_id
    }

    pub const fn receiver_id(&self) -> &user::Id {
        &self.receiver_id
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
