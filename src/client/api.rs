use async_trait::async_trait;
use log::debug;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use super::store::{ChatMessage, Conversation};
use crate::group::{self, model::GroupDto};
use crate::message::model::{DirectMessageDto, GroupMessageDto};
use crate::user;

/// Server operations the conversation store relies on.
#[async_trait]
pub trait ChatApi {
    async fn groups(&self) -> super::Result<Vec<GroupDto>>;

    async fn messages(&self, c: &Conversation) -> super::Result<Vec<ChatMessage>>;

    async fn create_group(
        &self,
        name: &str,
        members: &[user::Id],
        image: Option<&str>,
    ) -> super::Result<GroupDto>;

    async fn add_members(&self, id: &group::Id, members: &[user::Id]) -> super::Result<GroupDto>;

    async fn leave_group(&self, id: &group::Id) -> super::Result<()>;

    async fn delete_group(&self, id: &group::Id) -> super::Result<()>;

    async fn send(
        &self,
        c: &Conversation,
        text: Option<&str>,
        image: Option<&str>,
    ) -> super::Result<ChatMessage>;
}

pub struct HttpChatApi {
    http: reqwest::Client,
    base: Url,
    token: String,
}

impl HttpChatApi {
    pub fn new(http: reqwest::Client, base: Url, token: impl Into<String>) -> Self {
        Self {
            http,
            base,
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> super::Result<Url> {
        Ok(self.base.join(path)?)
    }

    async fn call(&self, req: RequestBuilder) -> super::Result<Response> {
        let res = req.bearer_auth(&self.token).send().await?;

        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        #[derive(Deserialize)]
        struct ErrorBody {
            message: String,
        }

        let message = match res.json::<ErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => status.to_string(),
        };
        debug!("server responded with {status}: {message}");

        Err(super::Error::Server {
            status: status.as_u16(),
            message,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> super::Result<T> {
        let res = self.call(self.http.get(self.url(path)?)).await?;
        Ok(res.json().await?)
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> super::Result<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let res = self
            .call(self.http.post(self.url(path)?).json(body))
            .await?;
        Ok(res.json().await?)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateGroupBody<'a> {
    name: &'a str,
    members: &'a [user::Id],
    #[serde(skip_serializing_if = "Option::is_none")]
    group_pic: Option<&'a str>,
}

#[derive(Serialize)]
struct MembersBody<'a> {
    members: &'a [user::Id],
}

#[derive(Serialize)]
struct MessageBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<&'a str>,
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn groups(&self) -> super::Result<Vec<GroupDto>> {
        self.get("groups").await
    }

    async fn messages(&self, c: &Conversation) -> super::Result<Vec<ChatMessage>> {
        let messages = match c {
            Conversation::Group(id) => self
                .get::<Vec<GroupMessageDto>>(&format!("groups/{id}/messages"))
                .await?
                .into_iter()
                .map(ChatMessage::Group)
                .collect(),
            Conversation::Direct(id) => self
                .get::<Vec<DirectMessageDto>>(&format!("messages/{id}"))
                .await?
                .into_iter()
                .map(ChatMessage::Direct)
                .collect(),
        };
        Ok(messages)
    }

    async fn create_group(
        &self,
        name: &str,
        members: &[user::Id],
        image: Option<&str>,
    ) -> super::Result<GroupDto> {
        let body = CreateGroupBody {
            name,
            members,
            group_pic: image,
        };
        self.post("groups", &body).await
    }

    async fn add_members(&self, id: &group::Id, members: &[user::Id]) -> super::Result<GroupDto> {
        self.post(&format!("groups/{id}/members"), &MembersBody { members })
            .await
    }

    async fn leave_group(&self, id: &group::Id) -> super::Result<()> {
        self.call(self.http.post(self.url(&format!("groups/{id}/leave"))?))
            .await?;
        Ok(())
    }

    async fn delete_group(&self, id: &group::Id) -> super::Result<()> {
        self.call(self.http.delete(self.url(&format!("groups/{id}"))?))
            .await?;
        Ok(())
    }

    async fn send(
        &self,
        c: &Conversation,
        text: Option<&str>,
        image: Option<&str>,
    ) -> super::Result<ChatMessage> {
        let body = MessageBody { text, image };
        let msg = match c {
            Conversation::Group(id) => ChatMessage::Group(
                self.post(&format!("groups/{id}/messages"), &body)
                    .await?,
            ),
            Conversation::Direct(id) => {
                ChatMessage::Direct(self.post(&format!("messages/send/{id}"), &body).await?)
            }
        };
        Ok(msg)
    }
}
