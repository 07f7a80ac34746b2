use diesel::prelude::{Identifiable, Queryable, Selectable};
use serde::{Deserialize, Serialize};

use super::Id;

/// Projection of a user owned by the direct-message subsystem.
#[derive(Queryable, Selectable, Identifiable, Clone, Debug, PartialEq)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    id: Id,
    name: String,
    picture: String,
}

impl User {
    pub fn new(id: Id, name: impl Into<String>, picture: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            picture: picture.into(),
        }
    }

    pub const fn id(&self) -> &Id {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn picture(&self) -> &str {
        &self.picture
    }
}

/// Display-ready member record, the resolved form of a bare member id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSummary {
    id: Id,
    name: String,
    picture: String,
}

impl MemberSummary {
    const UNKNOWN_NAME: &'static str = "Unknown user";

    pub fn new(id: Id, name: impl Into<String>, picture: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            picture: picture.into(),
        }
    }

    /// Placeholder for an id the directory no longer knows.
    pub fn unresolved(id: Id) -> Self {
        Self::new(id, Self::UNKNOWN_NAME, "")
    }

    pub const fn id(&self) -> &Id {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn picture(&self) -> &str {
        &self.picture
    }
}

impl From<User> for MemberSummary {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            picture: u.picture,
        }
    }
}
