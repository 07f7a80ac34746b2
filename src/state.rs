use std::sync::Arc;

use axum::extract::FromRef;

use crate::event::service::NatsEventService;
use crate::group::repository::PgGroupRepository;
use crate::group::service::GroupServiceImpl;
use crate::integration::{self, Config};
use crate::message::repository::PgMessageRepository;
use crate::message::service::MessageServiceImpl;
use crate::upload::service::CloudinaryHost;
use crate::user::repository::PgUserRepository;
use crate::user::service::UserServiceImpl;
use crate::{auth, event, group, message, upload, user};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub auth_service: auth::Service,
    pub user_service: user::Service,
    pub group_service: group::Service,
    pub message_service: message::Service,
    pub event_service: event::Service,
    pub media: upload::Service,
}

impl AppState {
    pub async fn init(config: &Config) -> crate::Result<Self> {
        let pool = config.db.connect().map_err(integration::Error::from)?;
        let pubsub = config
            .pubsub
            .connect()
            .await
            .map_err(integration::Error::from)?;
        let http = integration::init_http_client()?;

        let event_service: event::Service = Arc::new(NatsEventService::new(pubsub));
        let media: upload::Service = Arc::new(CloudinaryHost::new(http, config.media.clone()));
        let user_service: user::Service =
            Arc::new(UserServiceImpl::new(Arc::new(PgUserRepository::new(pool.clone()))));
        let message_repo: message::Repository = Arc::new(PgMessageRepository::new(pool.clone()));

        let group_service: group::Service = Arc::new(GroupServiceImpl::new(
            Arc::new(PgGroupRepository::new(pool)),
            message_repo.clone(),
            user_service.clone(),
            event_service.clone(),
            media.clone(),
        ));
        let message_service: message::Service = Arc::new(MessageServiceImpl::new(
            message_repo,
            group_service.clone(),
            event_service.clone(),
            media.clone(),
        ));

        Ok(Self {
            auth_service: Arc::new(auth::service::JwtAuthService::new(&config.jwt_secret)),
            user_service,
            group_service,
            message_service,
            event_service,
            media,
        })
    }
}
