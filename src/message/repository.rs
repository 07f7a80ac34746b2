use async_trait::async_trait;
use diesel::{ExpressionMethods, QueryDsl, RunQueryDsl, SelectableHelper};

use crate::group;
use crate::integration::db::{self, Pool};
use crate::schema::group_messages;

use super::model::GroupMessage;

#[async_trait]
pub trait MessageRepository {
    async fn insert(&self, msg: &GroupMessage) -> super::Result<()>;

    /// Messages of the group in the order they were appended.
    async fn find_by_group_id(&self, group_id: &group::Id) -> super::Result<Vec<GroupMessage>>;

    async fn delete_by_group_id(&self, group_id: &group::Id) -> super::Result<usize>;
}

pub struct PgMessageRepository {
    pool: Pool,
}

impl PgMessageRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn insert(&self, msg: &GroupMessage) -> super::Result<()> {
        let msg = msg.clone();

        db::run(&self.pool, move |conn| {
            diesel::insert_into(group_messages::table)
                .values(&msg)
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn find_by_group_id(&self, group_id: &group::Id) -> super::Result<Vec<GroupMessage>> {
        let group_id = *group_id;

        db::run(&self.pool, move |conn| {
            let messages = group_messages::table
                .filter(group_messages::group_id.eq(group_id))
                .order(group_messages::seq.asc())
                .select(GroupMessage::as_select())
                .load(conn)?;
            Ok(messages)
        })
        .await
    }

    async fn delete_by_group_id(&self, group_id: &group::Id) -> super::Result<usize> {
        let group_id = *group_id;

        db::run(&self.pool, move |conn| {
            let deleted = diesel::delete(
                group_messages::table.filter(group_messages::group_id.eq(group_id)),
            )
            .execute(conn)?;
            Ok(deleted)
        })
        .await
    }
}
