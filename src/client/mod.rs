//! Client-side conversation store: a pure reducer in [`store`], driven by a task that runs
//! its effects against a [`ChatApi`] and folds push notifications back in.

use std::sync::Arc;

use futures::StreamExt;
use log::{debug, warn};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use api::ChatApi;
use store::{Action, Effect, State};

use crate::event::NotificationStream;
use crate::user;

pub mod api;
pub mod store;

type Result<T> = std::result::Result<T, Error>;
pub type Api = Arc<dyn ChatApi + Send + Sync>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{message}")]
    Server { status: u16, message: String },

    #[error(transparent)]
    _Reqwest(#[from] reqwest::Error),
    #[error(transparent)]
    _Url(#[from] url::ParseError),
}

/// Handle to a running store. Clones share the same driver, which stops once every
/// handle is dropped.
#[derive(Clone)]
pub struct Store {
    tx: mpsc::UnboundedSender<Action>,
    state: watch::Receiver<State>,
}

impl Store {
    pub fn spawn(me: user::Id, api: Api) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(State::new(me));

        tokio::spawn(drive(rx, tx.downgrade(), state_tx, api));

        Self {
            tx,
            state: state_rx,
        }
    }

    pub fn dispatch(&self, action: Action) {
        if self.tx.send(action).is_err() {
            warn!("store driver is gone, dropping action");
        }
    }

    pub fn snapshot(&self) -> State {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<State> {
        self.state.clone()
    }

    /// Feeds push notifications into the store until the stream ends or the store is dropped.
    pub fn attach(&self, mut notifications: NotificationStream) -> JoinHandle<()> {
        let tx = self.tx.downgrade();
        tokio::spawn(async move {
            while let Some(n) = notifications.next().await {
                let Some(tx) = tx.upgrade() else {
                    break;
                };
                if tx.send(Action::Reconcile(n)).is_err() {
                    break;
                }
            }
            debug!("notification feed detached");
        })
    }
}

async fn drive(
    mut rx: mpsc::UnboundedReceiver<Action>,
    tx: mpsc::WeakUnboundedSender<Action>,
    state: watch::Sender<State>,
    api: Api,
) {
    while let Some(action) = rx.recv().await {
        let mut effects = Vec::new();
        state.send_modify(|s| effects = s.apply(action));

        for effect in effects {
            let Some(tx) = tx.upgrade() else {
                return;
            };
            let api = api.clone();
            tokio::spawn(async move {
                let outcome = run(api, effect).await;
                let _ = tx.send(outcome);
            });
        }
    }
    debug!("store driver stopped");
}

async fn run(api: Api, effect: Effect) -> Action {
    fn msg<T>(r: Result<T>) -> std::result::Result<T, String> {
        r.map_err(|e| e.to_string())
    }

    match effect {
        Effect::FetchGroups => Action::GroupsLoaded(msg(api.groups().await)),
        Effect::FetchMessages { seq, conversation } => Action::MessagesLoaded {
            seq,
            result: msg(api.messages(&conversation).await),
        },
        Effect::CreateGroup {
            name,
            members,
            image,
        } => {
            let created = api.create_group(&name, &members, image.as_deref()).await;
            Action::GroupCreated(msg(created))
        }
        Effect::AddMembers { group_id, members } => {
            Action::MembersAdded(msg(api.add_members(&group_id, &members).await).map(|_| ()))
        }
        Effect::LeaveGroup(group_id) => Action::GroupLeft {
            group_id,
            result: msg(api.leave_group(&group_id).await),
        },
        Effect::DeleteGroup(group_id) => Action::GroupDeleted {
            group_id,
            result: msg(api.delete_group(&group_id).await),
        },
        Effect::SendMessage {
            conversation,
            text,
            image,
        } => {
            let sent = api
                .send(&conversation, text.as_deref(), image.as_deref())
                .await;
            Action::MessageSent {
                conversation,
                result: msg(sent),
            }
        }
    }
}
