use async_trait::async_trait;
use diesel::{
    Connection, ExpressionMethods, OptionalExtension, PgConnection, QueryDsl, RunQueryDsl,
    SelectableHelper,
};

use crate::integration::db::{self, Pool};
use crate::schema::{groups, groups_users};
use crate::user;

use super::model::{Group, GroupRow, NewGroup, NewGroupUser};
use super::{Id, MemberRef};

#[async_trait]
pub trait GroupRepository {
    async fn insert(&self, g: &Group) -> super::Result<()>;

    async fn find_by_id(&self, id: &Id) -> super::Result<Group>;

    /// Groups the user belongs to, oldest first.
    async fn find_by_member(&self, user_id: &user::Id) -> super::Result<Vec<Group>>;

    async fn add_members(&self, id: &Id, members: &[MemberRef]) -> super::Result<()>;

    /// Removes the member and, when given, hands the admin role to `successor`.
    async fn remove_member(
        &self,
        id: &Id,
        user_id: &user::Id,
        successor: Option<&MemberRef>,
    ) -> super::Result<()>;

    async fn delete(&self, id: &Id) -> super::Result<()>;
}

pub struct PgGroupRepository {
    pool: Pool,
}

impl PgGroupRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

fn load_members(conn: &mut PgConnection, id: &Id) -> super::Result<Vec<MemberRef>> {
    let members = groups_users::table
        .filter(groups_users::group_id.eq(id))
        .order(groups_users::position.asc())
        .select(groups_users::user_id)
        .load::<user::Id>(conn)?;
    Ok(members)
}

#[async_trait]
impl GroupRepository for PgGroupRepository {
    async fn insert(&self, g: &Group) -> super::Result<()> {
        let g = g.clone();

        db::run(&self.pool, move |conn| {
            conn.transaction::<_, super::Error, _>(|conn| {
                diesel::insert_into(groups::table)
                    .values(NewGroup::from(&g))
                    .execute(conn)?;

                let members = g
                    .members()
                    .iter()
                    .map(|m| NewGroupUser::new(g.id(), m))
                    .collect::<Vec<_>>();

                diesel::insert_into(groups_users::table)
                    .values(&members)
                    .execute(conn)?;
                Ok(())
            })
        })
        .await
    }

    async fn find_by_id(&self, id: &Id) -> super::Result<Group> {
        let id = *id;

        db::run(&self.pool, move |conn| {
            let row = groups::table
                .find(&id)
                .select(GroupRow::as_select())
                .first(conn)
                .optional()?
                .ok_or(super::Error::NotFound(id))?;

            let members = load_members(conn, &id)?;
            Ok(row.with_members(members))
        })
        .await
    }

    async fn find_by_member(&self, user_id: &user::Id) -> super::Result<Vec<Group>> {
        let user_id = *user_id;

        db::run(&self.pool, move |conn| {
            let rows = groups::table
                .filter(
                    groups::id.eq_any(
                        groups_users::table
                            .filter(groups_users::user_id.eq(user_id))
                            .select(groups_users::group_id),
                    ),
                )
                .order(groups::created_at.asc())
                .select(GroupRow::as_select())
                .load(conn)?;

            let mut result = Vec::with_capacity(rows.len());
            for row in rows {
                let members = load_members(conn, row.id())?;
                result.push(row.with_members(members));
            }
            Ok(result)
        })
        .await
    }

    async fn add_members(&self, id: &Id, members: &[MemberRef]) -> super::Result<()> {
        let id = *id;
        let members = members.to_vec();

        db::run(&self.pool, move |conn| {
            let rows = members
                .iter()
                .map(|m| NewGroupUser::new(&id, m))
                .collect::<Vec<_>>();

            diesel::insert_into(groups_users::table)
                .values(&rows)
                .on_conflict_do_nothing()
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn remove_member(
        &self,
        id: &Id,
        user_id: &user::Id,
        successor: Option<&MemberRef>,
    ) -> super::Result<()> {
        let id = *id;
        let user_id = *user_id;
        let successor = successor.copied();

        db::run(&self.pool, move |conn| {
            conn.transaction::<_, super::Error, _>(|conn| {
                diesel::delete(
                    groups_users::table
                        .filter(groups_users::group_id.eq(id))
                        .filter(groups_users::user_id.eq(user_id)),
                )
                .execute(conn)?;

                if let Some(admin) = successor {
                    diesel::update(groups::table.find(&id))
                        .set(groups::admin.eq(admin))
                        .execute(conn)?;
                }
                Ok(())
            })
        })
        .await
    }

    async fn delete(&self, id: &Id) -> super::Result<()> {
        let id = *id;

        db::run(&self.pool, move |conn| {
            let deleted = diesel::delete(groups::table.find(&id)).execute(conn)?;
            if deleted == 0 {
                return Err(super::Error::NotFound(id));
            }
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod test {
    use testcontainers_modules::postgres::Postgres;
    use testcontainers_modules::testcontainers::runners::AsyncRunner;

    use crate::integration::db::test::migrated_pool;
    use crate::message::model::GroupMessage;
    use crate::message::repository::{MessageRepository, PgMessageRepository};

    use super::*;

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn should_insert_and_find_group_with_ordered_members() {
        let node = Postgres::default().start().await.unwrap();
        let repo = PgGroupRepository::new(migrated_pool(&node).await);

        let admin = user::Id::random();
        let members = vec![admin, user::Id::random(), user::Id::random()];
        let g = Group::new("friends", admin, members.clone(), None);

        repo.insert(&g).await.unwrap();

        let actual = repo.find_by_id(g.id()).await.unwrap();
        assert_eq!(actual, g);
        assert_eq!(actual.members(), members.as_slice());
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn should_not_find_missing_group() {
        let node = Postgres::default().start().await.unwrap();
        let repo = PgGroupRepository::new(migrated_pool(&node).await);

        let id = Id::random();
        let res = repo.find_by_id(&id).await;

        assert!(matches!(res, Err(crate::group::Error::NotFound(missing)) if missing == id));
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn should_find_groups_by_member() {
        let node = Postgres::default().start().await.unwrap();
        let repo = PgGroupRepository::new(migrated_pool(&node).await);

        let jora = user::Id::random();
        let valera = user::Id::random();
        let igor = user::Id::random();
        let first = Group::new("first", jora, vec![jora, valera, igor], None);
        let second = Group::new("second", valera, vec![valera, igor, jora], None);
        let foreign = Group::new("foreign", valera, vec![valera, igor], None);
        for g in [&first, &second, &foreign] {
            repo.insert(g).await.unwrap();
        }

        let actual = repo.find_by_member(&jora).await.unwrap();

        assert_eq!(actual.len(), 2);
        assert!(actual.contains(&first));
        assert!(actual.contains(&second));
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn should_add_and_remove_members() {
        let node = Postgres::default().start().await.unwrap();
        let repo = PgGroupRepository::new(migrated_pool(&node).await);

        let admin = user::Id::random();
        let jora = user::Id::random();
        let valera = user::Id::random();
        let g = Group::new("friends", admin, vec![admin, jora], None);
        repo.insert(&g).await.unwrap();

        repo.add_members(g.id(), &[valera, jora]).await.unwrap();
        repo.remove_member(g.id(), &jora, Some(&valera))
            .await
            .unwrap();

        let actual = repo.find_by_id(g.id()).await.unwrap();
        assert_eq!(actual.members(), &[admin, valera]);
        assert_eq!(actual.admin(), &valera);
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn should_refuse_to_delete_group_with_messages() {
        let node = Postgres::default().start().await.unwrap();
        let pool = migrated_pool(&node).await;
        let repo = PgGroupRepository::new(pool.clone());
        let message_repo = PgMessageRepository::new(pool);

        let admin = user::Id::random();
        let g = Group::new("friends", admin, vec![admin], None);
        repo.insert(&g).await.unwrap();
        message_repo
            .insert(&GroupMessage::new(*g.id(), admin, Some("hi".into()), None))
            .await
            .unwrap();

        assert!(repo.delete(g.id()).await.is_err());

        message_repo.delete_by_group_id(g.id()).await.unwrap();
        repo.delete(g.id()).await.unwrap();
        assert!(repo.find_by_id(g.id()).await.is_err());
    }
}
