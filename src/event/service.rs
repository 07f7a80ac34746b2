use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use log::{debug, error};

use crate::user;

use super::{Notification, NotificationStream, Subject};

#[async_trait]
pub trait EventService: Send + Sync {
    /// Best effort: a failed publish is logged, never returned.
    async fn publish(&self, s: &Subject<'_>, n: &Notification);

    async fn subscribe(&self, s: &Subject<'_>) -> super::Result<NotificationStream>;

    async fn broadcast(&self, recipients: &[user::Id], n: &Notification) {
        for r in recipients {
            self.publish(&Subject::Notifications(r), n).await;
        }
    }
}

#[derive(Clone)]
pub struct NatsEventService {
    pubsub: async_nats::Client,
}

impl NatsEventService {
    pub fn new(pubsub: async_nats::Client) -> Self {
        Self { pubsub }
    }
}

#[async_trait]
impl EventService for NatsEventService {
    async fn publish(&self, s: &Subject<'_>, n: &Notification) {
        if let Err(e) = self.pubsub.publish(s, Bytes::from(n)).await {
            error!("failed to publish notification to {s}: {e:?}");
        }
    }

    async fn subscribe(&self, s: &Subject<'_>) -> super::Result<NotificationStream> {
        let subscriber = self.pubsub.subscribe(s).await?;
        debug!("subscribed to {s}");

        let stream = subscriber.filter_map(|msg| async move {
            match serde_json::from_slice::<Notification>(&msg.payload) {
                Ok(n) => Some(n),
                Err(e) => {
                    error!("failed to deserialize notification: {e:?}");
                    None
                }
            }
        });

        Ok(Box::pin(stream))
    }
}
