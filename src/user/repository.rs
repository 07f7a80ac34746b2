use async_trait::async_trait;
use diesel::{ExpressionMethods, QueryDsl, RunQueryDsl, SelectableHelper};

use crate::integration::db::{self, Pool};
use crate::schema::users;

use super::Id;
use super::model::User;

#[async_trait]
pub trait UserRepository {
    async fn find_by_ids(&self, ids: &[Id]) -> super::Result<Vec<User>>;
}

pub struct PgUserRepository {
    pool: Pool,
}

impl PgUserRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_ids(&self, ids: &[Id]) -> super::Result<Vec<User>> {
        let ids = ids.to_vec();

        db::run(&self.pool, move |conn| {
            let users = users::table
                .filter(users::id.eq_any(ids))
                .select(User::as_select())
                .load(conn)?;
            Ok(users)
        })
        .await
    }
}
