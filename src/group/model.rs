use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::{Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};

use crate::integration::db;
use crate::user::{self, model::MemberSummary};

use super::{Id, MemberRef};

#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    id: Id,
    name: String,
    admin: MemberRef,
    image: Option<String>,
    members: Vec<MemberRef>,
    created_at: NaiveDateTime,
}

impl Group {
    pub fn new(
        name: impl Into<String>,
        admin: MemberRef,
        members: Vec<MemberRef>,
        image: Option<String>,
    ) -> Self {
        Self {
            id: Id::random(),
            name: name.into(),
            admin,
            image,
            members,
            created_at: db::now(),
        }
    }

    pub const fn id(&self) -> &Id {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn admin(&self) -> &MemberRef {
        &self.admin
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn members(&self) -> &[MemberRef] {
        &self.members
    }

    pub const fn created_at(&self) -> &NaiveDateTime {
        &self.created_at
    }

    pub fn is_member(&self, user_id: &user::Id) -> bool {
        self.members.contains(user_id)
    }

    pub fn is_admin(&self, user_id: &user::Id) -> bool {
        self.admin.eq(user_id)
    }

    pub fn set_admin(&mut self, admin: MemberRef) {
        self.admin = admin;
    }

    pub fn add_members(&mut self, members: &[MemberRef]) {
        for m in members {
            if !self.members.contains(m) {
                self.members.push(*m);
            }
        }
    }

    pub fn remove_member(&mut self, user_id: &user::Id) {
        self.members.retain(|m| m.ne(user_id));
    }

    /// Longest-standing member other than `leaving`.
    pub fn successor_of(&self, leaving: &user::Id) -> Option<&MemberRef> {
        self.members.iter().find(|m| (*m).ne(leaving))
    }
}

#[derive(Queryable, Selectable, Identifiable)]
#[diesel(table_name = crate::schema::groups)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct GroupRow {
    id: Id,
    name: String,
    admin: user::Id,
    image: Option<String>,
    created_at: NaiveDateTime,
}

impl GroupRow {
    pub const fn id(&self) -> &Id {
        &self.id
    }

    pub fn with_members(self, members: Vec<MemberRef>) -> Group {
        Group {
            id: self.id,
            name: self.name,
            admin: self.admin,
            image: self.image,
            members,
            created_at: self.created_at,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::groups)]
pub struct NewGroup<'a> {
    id: &'a Id,
    name: &'a str,
    admin: &'a user::Id,
    image: Option<&'a str>,
    created_at: &'a NaiveDateTime,
}

impl<'a> From<&'a Group> for NewGroup<'a> {
    fn from(g: &'a Group) -> Self {
        Self {
            id: &g.id,
            name: &g.name,
            admin: &g.admin,
            image: g.image.as_deref(),
            created_at: &g.created_at,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::groups_users)]
pub struct NewGroupUser<'a> {
    group_id: &'a Id,
    user_id: &'a user::Id,
}

impl<'a> NewGroupUser<'a> {
    pub fn new(group_id: &'a Id, user_id: &'a user::Id) -> Self {
        Self { group_id, user_id }
    }
}

/// Group as served to clients, with every member resolved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDto {
    id: Id,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    admin: MemberSummary,
    members: Vec<MemberSummary>,
    created_at: DateTime<Utc>,
}

impl GroupDto {
    pub fn new(g: &Group, members: Vec<MemberSummary>) -> Self {
        let admin = members
            .iter()
            .find(|m| m.id().eq(g.admin()))
            .cloned()
            .unwrap_or_else(|| MemberSummary::unresolved(*g.admin()));

        Self {
            id: *g.id(),
            name: g.name().to_owned(),
            image: g.image.clone(),
            admin,
            members,
            created_at: g.created_at().and_utc(),
        }
    }

    pub const fn id(&self) -> &Id {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub const fn admin(&self) -> &MemberSummary {
        &self.admin
    }

    pub fn members(&self) -> &[MemberSummary] {
        &self.members
    }

    pub fn member_ids(&self) -> Vec<user::Id> {
        self.members.iter().map(|m| *m.id()).collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UpdateAction {
    MembersAdded,
}

/// Keeps the first occurrence of every id, `first` leading.
pub fn unique_members(first: &MemberRef, others: &[MemberRef]) -> Vec<MemberRef> {
    let mut members = Vec::with_capacity(others.len() + 1);
    members.push(*first);
    for m in others {
        if !members.contains(m) {
            members.push(*m);
        }
    }
    members
}
