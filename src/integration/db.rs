use std::env;
use std::time::Duration;

use chrono::{NaiveDateTime, SubsecRound, Utc};
use diesel::PgConnection;
use diesel::r2d2::ConnectionManager;
use tokio::task::JoinError;

pub type Pool = r2d2::Pool<ConnectionManager<PgConnection>>;

#[derive(Clone)]
pub struct Config {
    host: String,
    port: u16,
    user: String,
    password: String,
    db: String,
    pool_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: String::from("127.0.0.1"),
            port: 5432,
            user: String::from("postgres"),
            password: String::from("postgres"),
            db: String::from("messenger"),
            pool_size: 10,
        }
    }
}

impl Config {
    pub fn env() -> Option<Self> {
        let host = env::var("PG_HOST").ok()?;
        let port = env::var("PG_PORT")
            .unwrap_or_else(|_| "5432".to_string())
            .parse()
            .ok()?;
        let user = env::var("PG_USER").ok()?;
        let password = env::var("PG_PASSWORD").ok()?;
        let db = env::var("PG_DB").ok()?;
        let pool_size = env::var("PG_POOL_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        Some(Self {
            host,
            port,
            user,
            password,
            db,
            pool_size,
        })
    }

    fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.db
        )
    }

    pub fn connect(&self) -> Result<Pool, r2d2::Error> {
        let manager = ConnectionManager::<PgConnection>::new(self.url());

        r2d2::Pool::builder()
            .max_size(self.pool_size)
            .connection_timeout(Duration::from_secs(5))
            .build(manager)
    }
}

/// Current UTC time at the precision Postgres stores.
pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc().trunc_subsecs(6)
}

/// Runs a blocking diesel closure on the blocking thread pool with a pooled connection.
pub async fn run<T, E, F>(pool: &Pool, f: F) -> Result<T, E>
where
    F: FnOnce(&mut PgConnection) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: From<r2d2::Error> + From<JoinError> + Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        f(&mut conn)
    })
    .await?
}
