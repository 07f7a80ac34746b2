use async_trait::async_trait;
use log::debug;

use super::Repository;
use super::model::{GroupMessage, GroupMessageDto, non_blank};
use crate::{event, group, upload, user};

#[async_trait]
pub trait MessageService {
    async fn create(
        &self,
        group_id: &group::Id,
        sender: &user::Id,
        text: Option<String>,
        image: Option<String>,
    ) -> super::Result<GroupMessageDto>;

    async fn find_by_group_id(
        &self,
        group_id: &group::Id,
        requester: &user::Id,
    ) -> super::Result<Vec<GroupMessageDto>>;
}

#[derive(Clone)]
pub struct MessageServiceImpl {
    repo: Repository,
    group_service: group::Service,
    event_service: event::Service,
    media: upload::Service,
}

impl MessageServiceImpl {
    pub fn new(
        repo: Repository,
        group_service: group::Service,
        event_service: event::Service,
        media: upload::Service,
    ) -> Self {
        Self {
            repo,
            group_service,
            event_service,
            media,
        }
    }
}

#[async_trait]
impl MessageService for MessageServiceImpl {
    async fn create(
        &self,
        group_id: &group::Id,
        sender: &user::Id,
        text: Option<String>,
        image: Option<String>,
    ) -> super::Result<GroupMessageDto> {
        let g = self.group_service.check_member(group_id, sender).await?;

        let text = non_blank(text);
        let image = non_blank(image);
        if text.is_none() && image.is_none() {
            return Err(super::Error::EmptyMessage);
        }
        let image = upload::resolve_image(&self.media, image).await?;

        let msg = GroupMessage::new(*group_id, *sender, text, image);
        self.repo.insert(&msg).await?;
        debug!("appended message {} to group {group_id}", msg.id());

        let dto = GroupMessageDto::from(msg);
        self.event_service
            .broadcast(
                g.members(),
                &event::Notification::NewGroupMessage(dto.clone()),
            )
            .await;

        Ok(dto)
    }

    async fn find_by_group_id(
        &self,
        group_id: &group::Id,
        requester: &user::Id,
    ) -> super::Result<Vec<GroupMessageDto>> {
        self.group_service.check_member(group_id, requester).await?;

        let messages = self.repo.find_by_group_id(group_id).await?;
        Ok(messages.into_iter().map(GroupMessageDto::from).collect())
    }
}
