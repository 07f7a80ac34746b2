//! In-memory stand-ins for the Postgres, NATS and media host integrations.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream;
use tokio::sync::broadcast;

use crate::auth::service::JwtAuthService;
use crate::event::service::EventService;
use crate::event::{Notification, NotificationStream, Subject};
use crate::group::model::Group;
use crate::group::repository::GroupRepository;
use crate::group::service::GroupServiceImpl;
use crate::message::model::GroupMessage;
use crate::message::repository::MessageRepository;
use crate::message::service::MessageServiceImpl;
use crate::state::AppState;
use crate::upload::service::MediaHost;
use crate::user::model::User;
use crate::user::repository::UserRepository;
use crate::user::service::UserServiceImpl;
use crate::{event, group, message, upload, user};

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn with(users: &[User]) -> Self {
        Self {
            users: Mutex::new(users.to_vec()),
        }
    }

    pub fn forget(&self, id: &user::Id) {
        self.users.lock().unwrap().retain(|u| u.id().ne(id));
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_ids(&self, ids: &[user::Id]) -> Result<Vec<User>, user::Error> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .filter(|u| ids.contains(u.id()))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryGroupRepository {
    groups: Mutex<Vec<Group>>,
}

impl InMemoryGroupRepository {
    fn update(&self, id: &group::Id, f: impl FnOnce(&mut Group)) -> Result<(), group::Error> {
        let mut groups = self.groups.lock().unwrap();
        let g = groups
            .iter_mut()
            .find(|g| g.id().eq(id))
            .ok_or(group::Error::NotFound(*id))?;
        f(g);
        Ok(())
    }
}

#[async_trait]
impl GroupRepository for InMemoryGroupRepository {
    async fn insert(&self, g: &Group) -> Result<(), group::Error> {
        self.groups.lock().unwrap().push(g.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &group::Id) -> Result<Group, group::Error> {
        let groups = self.groups.lock().unwrap();
        groups
            .iter()
            .find(|g| g.id().eq(id))
            .cloned()
            .ok_or(group::Error::NotFound(*id))
    }

    async fn find_by_member(&self, user_id: &user::Id) -> Result<Vec<Group>, group::Error> {
        let groups = self.groups.lock().unwrap();
        Ok(groups
            .iter()
            .filter(|g| g.is_member(user_id))
            .cloned()
            .collect())
    }

    async fn add_members(
        &self,
        id: &group::Id,
        members: &[group::MemberRef],
    ) -> Result<(), group::Error> {
        self.update(id, |g| g.add_members(members))
    }

    async fn remove_member(
        &self,
        id: &group::Id,
        user_id: &user::Id,
        successor: Option<&group::MemberRef>,
    ) -> Result<(), group::Error> {
        self.update(id, |g| {
            g.remove_member(user_id);
            if let Some(admin) = successor {
                g.set_admin(*admin);
            }
        })
    }

    async fn delete(&self, id: &group::Id) -> Result<(), group::Error> {
        let mut groups = self.groups.lock().unwrap();
        let before = groups.len();
        groups.retain(|g| g.id().ne(id));
        if groups.len() == before {
            return Err(group::Error::NotFound(*id));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: Mutex<Vec<GroupMessage>>,
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn insert(&self, msg: &GroupMessage) -> Result<(), message::Error> {
        self.messages.lock().unwrap().push(msg.clone());
        Ok(())
    }

    async fn find_by_group_id(
        &self,
        group_id: &group::Id,
    ) -> Result<Vec<GroupMessage>, message::Error> {
        let messages = self.messages.lock().unwrap();
        Ok(messages
            .iter()
            .filter(|m| m.group_id().eq(group_id))
            .cloned()
            .collect())
    }

    async fn delete_by_group_id(&self, group_id: &group::Id) -> Result<usize, message::Error> {
        let mut messages = self.messages.lock().unwrap();
        let before = messages.len();
        messages.retain(|m| m.group_id().ne(group_id));
        Ok(before - messages.len())
    }
}

/// Records every publish per recipient. A failing recorder drops everything, the way a
/// broken NATS connection would.
pub struct RecordingEventService {
    sent: Mutex<Vec<(user::Id, Notification)>>,
    live: broadcast::Sender<(user::Id, Notification)>,
    failing: bool,
}

impl Default for RecordingEventService {
    fn default() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            live: broadcast::channel(64).0,
            failing: false,
        }
    }
}

impl RecordingEventService {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn received(&self, user_id: &user::Id) -> Vec<Notification> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| to.eq(user_id))
            .map(|(_, n)| n.clone())
            .collect()
    }

    pub fn all(&self) -> Vec<(user::Id, Notification)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl EventService for RecordingEventService {
    async fn publish(&self, s: &Subject<'_>, n: &Notification) {
        if self.failing {
            return;
        }
        let Subject::Notifications(to) = s;
        self.sent.lock().unwrap().push((**to, n.clone()));
        let _ = self.live.send((**to, n.clone()));
    }

    async fn subscribe(&self, s: &Subject<'_>) -> Result<NotificationStream, event::Error> {
        let Subject::Notifications(me) = s;
        let me = **me;
        let rx = self.live.subscribe();

        let stream = stream::unfold(rx, move |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok((to, n)) if to == me => return Some((n, rx)),
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });

        Ok(Box::pin(stream))
    }
}

#[derive(Default)]
pub struct FakeMediaHost {
    uploads: AtomicUsize,
}

impl FakeMediaHost {
    pub const HOSTED_URL: &'static str = "https://media.test/image/upload/pic.png";

    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaHost for FakeMediaHost {
    async fn upload(&self, _data_uri: &str) -> Result<String, upload::Error> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(Self::HOSTED_URL.to_owned())
    }
}

/// A wired set of fakes sharing state across the services built from it.
pub struct Fixture {
    pub users: Arc<InMemoryUserRepository>,
    pub groups: Arc<InMemoryGroupRepository>,
    pub messages: Arc<InMemoryMessageRepository>,
    pub events: Arc<RecordingEventService>,
    pub media: Arc<FakeMediaHost>,
    ids: Vec<user::Id>,
}

impl Fixture {
    pub const SECRET: &'static str = "test-secret";

    /// Registers one directory user per name, ids in the same order.
    pub fn with_users(names: &[&str]) -> Self {
        let users = names
            .iter()
            .map(|n| User::new(user::Id::random(), *n, format!("{n}.png")))
            .collect::<Vec<_>>();

        Self {
            ids: users.iter().map(|u| *u.id()).collect(),
            users: Arc::new(InMemoryUserRepository::with(&users)),
            groups: Arc::new(InMemoryGroupRepository::default()),
            messages: Arc::new(InMemoryMessageRepository::default()),
            events: Arc::new(RecordingEventService::default()),
            media: Arc::new(FakeMediaHost::default()),
        }
    }

    pub fn ids<const N: usize>(&self) -> [user::Id; N] {
        std::array::from_fn(|i| self.ids[i])
    }

    pub fn user_service(&self) -> user::Service {
        Arc::new(UserServiceImpl::new(self.users.clone()))
    }

    pub fn group_service(&self) -> group::Service {
        self.group_service_with_events(self.events.clone())
    }

    pub fn group_service_with_events(&self, events: event::Service) -> group::Service {
        Arc::new(GroupServiceImpl::new(
            self.groups.clone(),
            self.messages.clone(),
            self.user_service(),
            events,
            self.media.clone(),
        ))
    }

    pub fn message_service(&self) -> message::Service {
        Arc::new(MessageServiceImpl::new(
            self.messages.clone(),
            self.group_service(),
            self.events.clone(),
            self.media.clone(),
        ))
    }

    pub fn state(&self) -> AppState {
        AppState {
            auth_service: Arc::new(JwtAuthService::new(Self::SECRET)),
            user_service: self.user_service(),
            group_service: self.group_service(),
            message_service: self.message_service(),
            event_service: self.events.clone(),
            media: self.media.clone(),
        }
    }
}
