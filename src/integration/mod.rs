use std::env;
use std::fs::File;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderValue;
use dotenv::dotenv;
use log::{LevelFilter, warn};
use simplelog::{ColorChoice, CombinedLogger, TermLogger, TerminalMode, WriteLogger};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

pub mod db;
pub mod media;
pub mod pubsub;

type Result<T> = std::result::Result<T, Error>;

#[derive(Clone, Debug, PartialEq)]
pub enum Env {
    Local,
    Dev,
    Stage,
    Production,
}

impl Env {
    pub fn addr(&self) -> SocketAddr {
        match self {
            Env::Local => SocketAddr::from(([127, 0, 0, 1], 8000)),
            Env::Dev | Env::Stage | Env::Production => SocketAddr::from(([0, 0, 0, 0], 8000)),
        }
    }

    pub fn allow_origin(&self) -> AllowOrigin {
        match self {
            Env::Local | Env::Dev => AllowOrigin::any(),
            Env::Stage | Env::Production => {
                let origins = env::var("ALLOW_ORIGIN")
                    .unwrap_or_default()
                    .split(',')
                    .filter_map(|o| HeaderValue::from_str(o.trim()).ok())
                    .collect::<Vec<HeaderValue>>();
                if origins.is_empty() {
                    warn!("ALLOW_ORIGIN is empty, cross-origin requests will be rejected");
                }
                AllowOrigin::list(origins)
            }
        }
    }

    pub fn cors(&self) -> CorsLayer {
        CorsLayer::new()
            .allow_origin(self.allow_origin())
            .allow_methods(AllowMethods::any())
            .allow_headers(AllowHeaders::any())
    }
}

impl FromStr for Env {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "local" => Ok(Env::Local),
            "dev" => Ok(Env::Dev),
            "stg" => Ok(Env::Stage),
            "prod" => Ok(Env::Production),
            other => Err(Error::InvalidEnv(other.to_owned())),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub env: Env,
    pub jwt_secret: String,

    pub db: db::Config,
    pub pubsub: pubsub::Config,
    pub media: media::Config,
}

impl Config {
    /// Reads `.env` and the process environment. Missing integration settings fall back to
    /// their local defaults, a missing `JWT_SECRET` does not.
    pub fn env() -> Result<Self> {
        dotenv().ok();

        let env = match env::var("ENV") {
            Ok(e) => e.parse()?,
            Err(_) => Env::Local,
        };

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| Error::MissingVar("JWT_SECRET"))?;

        Ok(Self {
            env,
            jwt_secret,
            db: db::Config::env().unwrap_or_default(),
            pubsub: pubsub::Config::env().unwrap_or_default(),
            media: media::Config::env().unwrap_or_default(),
        })
    }
}

pub fn init_logger() -> Result<()> {
    let rust_log = env::var("RUST_LOG").unwrap_or("info".into());
    let level = LevelFilter::from_str(&rust_log).unwrap_or(LevelFilter::Info);
    let log_file = env::var("SERVICE_NAME")
        .map(|pkg| format!("{pkg}.log"))
        .unwrap_or("service.log".into());

    CombinedLogger::init(vec![
        TermLogger::new(
            level,
            simplelog::Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(level, simplelog::Config::default(), File::create(log_file)?),
    ])?;

    Ok(())
}

pub fn init_http_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(2))
        .timeout(Duration::from_secs(10))
        .build()?;
    Ok(client)
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid environment: {0}")]
    InvalidEnv(String),
    #[error("{0} must be set")]
    MissingVar(&'static str),

    #[error(transparent)]
    _Io(#[from] std::io::Error),
    #[error(transparent)]
    _Logger(#[from] log::SetLoggerError),
    #[error(transparent)]
    _Reqwest(#[from] reqwest::Error),
    #[error(transparent)]
    _R2d2(#[from] r2d2::Error),
    #[error(transparent)]
    _Nats(#[from] async_nats::ConnectError),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_parse_known_envs() {
        assert_eq!("local".parse::<Env>().unwrap(), Env::Local);
        assert_eq!("dev".parse::<Env>().unwrap(), Env::Dev);
        assert_eq!("stg".parse::<Env>().unwrap(), Env::Stage);
        assert_eq!("prod".parse::<Env>().unwrap(), Env::Production);
    }

    #[test]
    fn should_reject_unknown_env() {
        let err = "qa".parse::<Env>().unwrap_err();
        assert!(matches!(err, Error::InvalidEnv(e) if e == "qa"));
    }

    #[test]
    fn should_bind_loopback_only_locally() {
        assert!(Env::Local.addr().ip().is_loopback());
        assert!(!Env::Production.addr().ip().is_loopback());
    }
}
