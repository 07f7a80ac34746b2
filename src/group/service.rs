use async_trait::async_trait;
use futures::future::try_join_all;
use log::{debug, error};

use super::model::{Group, GroupDto, UpdateAction, unique_members};
use super::{Id, MIN_OTHER_MEMBERS, MemberRef, Repository};
use crate::{event, message, upload, user};

#[async_trait]
pub trait GroupService {
    /// `image` is a data URI or an absolute URL, hosted only once the group passes validation.
    async fn create(
        &self,
        creator: &user::Id,
        name: &str,
        members: &[MemberRef],
        image: Option<String>,
    ) -> super::Result<GroupDto>;

    async fn find_all(&self, user_id: &user::Id) -> super::Result<Vec<GroupDto>>;

    async fn find_by_id(&self, id: &Id) -> super::Result<Group>;

    /// Fails with `NotMember` unless the user currently belongs to the group.
    async fn check_member(&self, id: &Id, user_id: &user::Id) -> super::Result<Group>;

    async fn add_members(
        &self,
        id: &Id,
        requester: &user::Id,
        members: &[MemberRef],
    ) -> super::Result<GroupDto>;

    async fn leave(&self, id: &Id, user_id: &user::Id) -> super::Result<()>;

    async fn delete(&self, id: &Id, requester: &user::Id) -> super::Result<()>;
}

#[derive(Clone)]
pub struct GroupServiceImpl {
    repo: Repository,
    message_repo: message::Repository,
    user_service: user::Service,
    event_service: event::Service,
    media: upload::Service,
}

impl GroupServiceImpl {
    pub fn new(
        repo: Repository,
        message_repo: message::Repository,
        user_service: user::Service,
        event_service: event::Service,
        media: upload::Service,
    ) -> Self {
        Self {
            repo,
            message_repo,
            user_service,
            event_service,
            media,
        }
    }
}

#[async_trait]
impl GroupService for GroupServiceImpl {
    async fn create(
        &self,
        creator: &user::Id,
        name: &str,
        members: &[MemberRef],
        image: Option<String>,
    ) -> super::Result<GroupDto> {
        let name = name.trim();
        if name.is_empty() {
            return Err(super::Error::MissingName);
        }

        let members = unique_members(creator, members);
        let others = members.len() - 1;
        if others < MIN_OTHER_MEMBERS {
            return Err(super::Error::NotEnoughMembers(others));
        }

        let unknown = self.user_service.find_unknown(&members).await?;
        if !unknown.is_empty() {
            return Err(super::Error::NonExistingUsers(unknown));
        }

        // upload only once the group is known to be valid
        let image = upload::resolve_image(&self.media, image).await?;

        let g = Group::new(name, *creator, members, image);
        self.repo.insert(&g).await?;
        debug!("created group {} with {} members", g.id(), g.members().len());

        let dto = self.group_to_dto(&g).await?;
        self.event_service
            .broadcast(g.members(), &event::Notification::GroupCreated(dto.clone()))
            .await;

        Ok(dto)
    }

    async fn find_all(&self, user_id: &user::Id) -> super::Result<Vec<GroupDto>> {
        let groups = self.repo.find_by_member(user_id).await?;

        try_join_all(groups.iter().map(|g| self.group_to_dto(g))).await
    }

    async fn find_by_id(&self, id: &Id) -> super::Result<Group> {
        self.repo.find_by_id(id).await
    }

    async fn check_member(&self, id: &Id, user_id: &user::Id) -> super::Result<Group> {
        let g = self.repo.find_by_id(id).await?;
        if !g.is_member(user_id) {
            return Err(super::Error::NotMember);
        }
        Ok(g)
    }

    async fn add_members(
        &self,
        id: &Id,
        requester: &user::Id,
        members: &[MemberRef],
    ) -> super::Result<GroupDto> {
        let mut g = self.repo.find_by_id(id).await?;
        if !g.is_admin(requester) {
            return Err(super::Error::NotAdmin);
        }

        if members.is_empty() {
            return Err(super::Error::NoMembersToAdd);
        }

        let mut added: Vec<MemberRef> = Vec::with_capacity(members.len());
        for m in members {
            if !g.is_member(m) && !added.contains(m) {
                added.push(*m);
            }
        }
        if added.is_empty() {
            return Err(super::Error::AlreadyMembers);
        }

        let unknown = self.user_service.find_unknown(&added).await?;
        if !unknown.is_empty() {
            return Err(super::Error::NonExistingUsers(unknown));
        }

        let existing = g.members().to_vec();
        self.repo.add_members(id, &added).await?;
        g.add_members(&added);

        let dto = self.group_to_dto(&g).await?;
        let added_members = dto
            .members()
            .iter()
            .filter(|m| added.contains(m.id()))
            .cloned()
            .collect();

        self.event_service
            .broadcast(&added, &event::Notification::AddedToGroup(dto.clone()))
            .await;
        self.event_service
            .broadcast(
                &existing,
                &event::Notification::GroupUpdated {
                    action: UpdateAction::MembersAdded,
                    group: dto.clone(),
                    added_members,
                },
            )
            .await;

        Ok(dto)
    }

    async fn leave(&self, id: &Id, user_id: &user::Id) -> super::Result<()> {
        let mut g = self.repo.find_by_id(id).await?;
        if !g.is_member(user_id) {
            return Err(super::Error::NotMember);
        }

        if g.members().len() == 1 {
            debug!("last member left group {id}, removing it");
            return self.remove(id).await;
        }

        let successor = if g.is_admin(user_id) {
            g.successor_of(user_id).copied()
        } else {
            None
        };

        self.repo
            .remove_member(id, user_id, successor.as_ref())
            .await?;
        g.remove_member(user_id);
        if let Some(admin) = successor {
            debug!("admin of group {id} passed to {admin}");
            g.set_admin(admin);
        }

        let dto = self.group_to_dto(&g).await?;
        self.event_service
            .broadcast(
                g.members(),
                &event::Notification::MemberLeft {
                    group_id: *id,
                    left_user_id: *user_id,
                    updated_group: dto,
                },
            )
            .await;

        Ok(())
    }

    async fn delete(&self, id: &Id, requester: &user::Id) -> super::Result<()> {
        let g = self.repo.find_by_id(id).await?;
        if !g.is_admin(requester) {
            return Err(super::Error::NotAdmin);
        }

        self.remove(id).await?;

        self.event_service
            .broadcast(
                g.members(),
                &event::Notification::GroupDeleted { group_id: *id },
            )
            .await;

        Ok(())
    }
}

impl GroupServiceImpl {
    async fn group_to_dto(&self, g: &Group) -> super::Result<GroupDto> {
        let members = self.user_service.find_summaries(g.members()).await?;
        Ok(GroupDto::new(g, members))
    }

    /// Drops every message of the group, then the group itself.
    async fn remove(&self, id: &Id) -> super::Result<()> {
        if let Err(e) = self.message_repo.delete_by_group_id(id).await {
            error!("could not delete messages of group {id}: {e:?}");
            return Err(super::Error::NotDeleted);
        }

        self.repo.delete(id).await
    }
}
