use serde::{Deserialize, Serialize};

use crate::event::Notification;
use crate::group::model::GroupDto;
use crate::message::model::{DirectMessageDto, GroupMessageDto};
use crate::{group, message, user};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Conversation {
    Direct(user::Id),
    Group(group::Id),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatMessage {
    Group(GroupMessageDto),
    Direct(DirectMessageDto),
}

impl ChatMessage {
    pub fn id(&self) -> &message::Id {
        match self {
            ChatMessage::Group(m) => m.id(),
            ChatMessage::Direct(m) => m.id(),
        }
    }

    pub fn belongs_to(&self, c: &Conversation) -> bool {
        match (self, c) {
            (ChatMessage::Group(m), Conversation::Group(id)) => m.group_id().eq(id),
            (ChatMessage::Direct(m), Conversation::Direct(other)) => {
                m.sender_id().eq(other) || m.receiver_id().eq(other)
            }
            _ => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Transient, dismissable message for the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    id: u64,
    level: NoticeLevel,
    text: String,
}

impl Notice {
    pub const fn id(&self) -> u64 {
        self.id
    }

    pub const fn level(&self) -> NoticeLevel {
        self.level
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Debug)]
pub enum Action {
    LoadGroups,
    GroupsLoaded(Result<Vec<GroupDto>, String>),

    Select(Conversation),
    MessagesLoaded {
        seq: u64,
        result: Result<Vec<ChatMessage>, String>,
    },

    Reconcile(Notification),

    CreateGroup {
        name: String,
        members: Vec<user::Id>,
        image: Option<String>,
    },
    GroupCreated(Result<GroupDto, String>),

    AddMembers {
        group_id: group::Id,
        members: Vec<user::Id>,
    },
    MembersAdded(Result<(), String>),

    LeaveGroup(group::Id),
    GroupLeft {
        group_id: group::Id,
        result: Result<(), String>,
    },

    DeleteGroup(group::Id),
    GroupDeleted {
        group_id: group::Id,
        result: Result<(), String>,
    },

    SendMessage {
        text: Option<String>,
        image: Option<String>,
    },
    MessageSent {
        conversation: Conversation,
        result: Result<ChatMessage, String>,
    },

    DismissNotice(u64),
    Reset,
}

/// Work the driver performs outside the reducer. Each one reports back with an `Action`.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    FetchGroups,
    FetchMessages {
        seq: u64,
        conversation: Conversation,
    },
    CreateGroup {
        name: String,
        members: Vec<user::Id>,
        image: Option<String>,
    },
    AddMembers {
        group_id: group::Id,
        members: Vec<user::Id>,
    },
    LeaveGroup(group::Id),
    DeleteGroup(group::Id),
    SendMessage {
        conversation: Conversation,
        text: Option<String>,
        image: Option<String>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct State {
    me: user::Id,
    groups: Vec<GroupDto>,
    selected: Option<Conversation>,
    messages: Vec<ChatMessage>,
    loading: bool,
    /// Pushes for the selected conversation received while its load is in flight.
    pending: Vec<ChatMessage>,
    notices: Vec<Notice>,
    load_seq: u64,
    next_notice: u64,
}

impl State {
    pub fn new(me: user::Id) -> Self {
        Self {
            me,
            groups: Vec::new(),
            selected: None,
            messages: Vec::new(),
            loading: false,
            pending: Vec::new(),
            notices: Vec::new(),
            load_seq: 0,
            next_notice: 0,
        }
    }

    pub const fn me(&self) -> &user::Id {
        &self.me
    }

    pub fn groups(&self) -> &[GroupDto] {
        &self.groups
    }

    pub const fn selected(&self) -> Option<&Conversation> {
        self.selected.as_ref()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn apply(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::LoadGroups => return vec![Effect::FetchGroups],
            Action::GroupsLoaded(Ok(groups)) => self.groups = groups,
            Action::GroupsLoaded(Err(e)) => self.error(e),

            Action::Select(conversation) => {
                self.selected = Some(conversation);
                self.messages.clear();
                self.pending.clear();
                self.loading = true;
                self.load_seq += 1;
                return vec![Effect::FetchMessages {
                    seq: self.load_seq,
                    conversation,
                }];
            }
            Action::MessagesLoaded { seq, result } => {
                if seq != self.load_seq {
                    return Vec::new();
                }
                self.loading = false;
                let pending = std::mem::take(&mut self.pending);
                match result {
                    Ok(messages) => {
                        self.messages = messages;
                        for msg in pending {
                            self.append_message(msg);
                        }
                    }
                    Err(e) => {
                        self.messages.clear();
                        self.error(e);
                    }
                }
            }

            Action::Reconcile(n) => self.reconcile(n),

            Action::CreateGroup {
                name,
                members,
                image,
            } => {
                return vec![Effect::CreateGroup {
                    name,
                    members,
                    image,
                }];
            }
            Action::GroupCreated(Ok(g)) => self.append_group(g),
            Action::GroupCreated(Err(e)) => self.error(e),

            Action::AddMembers { group_id, members } => {
                return vec![Effect::AddMembers { group_id, members }];
            }
            // the updated record arrives as a push event
            Action::MembersAdded(Ok(())) => {}
            Action::MembersAdded(Err(e)) => self.error(e),

            Action::LeaveGroup(group_id) => return vec![Effect::LeaveGroup(group_id)],
            Action::GroupLeft { group_id, result } => match result {
                Ok(()) => self.drop_group(&group_id),
                Err(e) => self.error(e),
            },

            Action::DeleteGroup(group_id) => return vec![Effect::DeleteGroup(group_id)],
            Action::GroupDeleted { group_id, result } => match result {
                Ok(()) => {
                    self.drop_group(&group_id);
                    self.success("Group deleted successfully".to_owned());
                }
                Err(e) => self.error(e),
            },

            Action::SendMessage { text, image } => {
                if let Some(conversation) = self.selected {
                    return vec![Effect::SendMessage {
                        conversation,
                        text,
                        image,
                    }];
                }
            }
            Action::MessageSent {
                conversation,
                result,
            } => match result {
                Ok(msg) if self.selected == Some(conversation) => self.append_message(msg),
                Ok(_) => {}
                Err(e) => self.error(e),
            },

            Action::DismissNotice(id) => self.notices.retain(|n| n.id != id),
            Action::Reset => {
                let load_seq = self.load_seq + 1;
                let next_notice = self.next_notice;
                *self = Self::new(self.me);
                self.load_seq = load_seq;
                self.next_notice = next_notice;
            }
        }

        Vec::new()
    }

    fn reconcile(&mut self, n: Notification) {
        match n {
            Notification::GroupCreated(g) => self.append_group(g),
            Notification::AddedToGroup(g) => {
                if !self.has_group(g.id()) {
                    self.success(format!("You've been added to {}", g.name()));
                    self.groups.insert(0, g);
                }
            }
            Notification::GroupUpdated {
                group,
                added_members,
                ..
            } => {
                self.success(format!("{} new members added", added_members.len()));
                self.replace_group(group);
            }
            Notification::MemberLeft {
                group_id,
                left_user_id,
                updated_group,
            } => {
                if left_user_id.eq(&self.me) {
                    self.drop_group(&group_id);
                } else {
                    self.replace_group(updated_group);
                }
            }
            Notification::GroupDeleted { group_id } => self.drop_group(&group_id),
            Notification::NewGroupMessage(m) => self.append_message(ChatMessage::Group(m)),
            Notification::NewMessage(m) => self.append_message(ChatMessage::Direct(m)),
        }
    }

    fn has_group(&self, id: &group::Id) -> bool {
        self.groups.iter().any(|g| g.id().eq(id))
    }

    fn append_group(&mut self, g: GroupDto) {
        if !self.has_group(g.id()) {
            self.groups.push(g);
        }
    }

    fn replace_group(&mut self, group: GroupDto) {
        if let Some(g) = self.groups.iter_mut().find(|g| g.id().eq(group.id())) {
            *g = group;
        }
    }

    /// Removes the group and leaves it if it was the selected conversation.
    fn drop_group(&mut self, id: &group::Id) {
        self.groups.retain(|g| g.id().ne(id));
        if self.selected == Some(Conversation::Group(*id)) {
            self.selected = None;
            self.messages.clear();
            self.pending.clear();
            self.loading = false;
            self.load_seq += 1;
        }
    }

    fn append_message(&mut self, msg: ChatMessage) {
        let Some(selected) = &self.selected else {
            return;
        };
        if !msg.belongs_to(selected) {
            return;
        }
        let target = if self.loading {
            &mut self.pending
        } else {
            &mut self.messages
        };
        if target.iter().any(|m| m.id().eq(msg.id())) {
            return;
        }
        target.push(msg);
    }

    fn success(&mut self, text: String) {
        self.notify(NoticeLevel::Success, text);
    }

    fn error(&mut self, text: String) {
        self.notify(NoticeLevel::Error, text);
    }

    fn notify(&mut self, level: NoticeLevel, text: String) {
        self.next_notice += 1;
        self.notices.push(Notice {
            id: self.next_notice,
            level,
            text,
        });
    }
}

#[cfg(test)]
mod test {
    use crate::group::model::{Group, UpdateAction};
    use crate::message::model::GroupMessage;
    use crate::user::model::MemberSummary;

    use super::*;

    fn group_of(members: &[user::Id]) -> GroupDto {
        let g = Group::new("trip", members[0], members.to_vec(), None);
        let summaries = members
            .iter()
            .map(|m| MemberSummary::new(*m, m.to_string(), ""))
            .collect();
        GroupDto::new(&g, summaries)
    }

    /// Same group record as the server would send it after a membership change.
    fn with_members(group: &GroupDto, members: Vec<MemberSummary>) -> GroupDto {
        let mut v = serde_json::to_value(group).unwrap();
        v["members"] = serde_json::to_value(members).unwrap();
        serde_json::from_value(v).unwrap()
    }

    fn group_message(group_id: &group::Id, text: &str) -> GroupMessageDto {
        GroupMessageDto::from(GroupMessage::new(
            *group_id,
            user::Id::random(),
            Some(text.into()),
            None,
        ))
    }

    fn fetch_seq(effects: &[Effect]) -> u64 {
        match effects {
            [Effect::FetchMessages { seq, .. }] => *seq,
            other => panic!("unexpected effects: {other:?}"),
        }
    }

    struct Given {
        me: user::Id,
        other: user::Id,
        group: GroupDto,
        state: State,
    }

    /// `me` belongs to one group which is selected and loaded.
    fn selected_group() -> Given {
        let me = user::Id::random();
        let other = user::Id::random();
        let group = group_of(&[other, me, user::Id::random()]);
        let mut state = State::new(me);
        state.apply(Action::GroupsLoaded(Ok(vec![group.clone()])));
        let seq = fetch_seq(&state.apply(Action::Select(Conversation::Group(*group.id()))));
        state.apply(Action::MessagesLoaded {
            seq,
            result: Ok(vec![]),
        });
        Given {
            me,
            other,
            group,
            state,
        }
    }

    #[test]
    fn should_clear_messages_and_load_on_select() {
        let Given {
            group, mut state, ..
        } = selected_group();
        state.apply(Action::Reconcile(Notification::NewGroupMessage(
            group_message(group.id(), "hi"),
        )));
        assert_eq!(state.messages().len(), 1);

        let other = Conversation::Direct(user::Id::random());
        let effects = state.apply(Action::Select(other));

        assert_eq!(state.selected(), Some(&other));
        assert!(state.messages().is_empty());
        assert!(state.is_loading());
        assert!(matches!(
            effects.as_slice(),
            [Effect::FetchMessages { conversation, .. }] if conversation == &other
        ));
    }

    #[test]
    fn should_drop_result_of_superseded_load() {
        let mut state = State::new(user::Id::random());
        let first = Conversation::Group(group::Id::random());
        let second = Conversation::Group(group::Id::random());

        let stale = fetch_seq(&state.apply(Action::Select(first)));
        let fresh = fetch_seq(&state.apply(Action::Select(second)));
        let group_id = match second {
            Conversation::Group(id) => id,
            Conversation::Direct(_) => unreachable!(),
        };
        let expected = ChatMessage::Group(group_message(&group_id, "fresh"));

        state.apply(Action::MessagesLoaded {
            seq: fresh,
            result: Ok(vec![expected.clone()]),
        });
        state.apply(Action::MessagesLoaded {
            seq: stale,
            result: Ok(vec![]),
        });

        assert_eq!(state.selected(), Some(&second));
        assert_eq!(state.messages(), &[expected]);
        assert!(!state.is_loading());
    }

    #[test]
    fn should_leave_messages_empty_and_notify_when_load_fails() {
        let mut state = State::new(user::Id::random());
        let seq = fetch_seq(&state.apply(Action::Select(Conversation::Group(group::Id::random()))));

        state.apply(Action::MessagesLoaded {
            seq,
            result: Err("Failed to load messages".into()),
        });

        assert!(state.messages().is_empty());
        assert!(!state.is_loading());
        assert_eq!(state.notices().len(), 1);
        assert_eq!(state.notices()[0].level(), NoticeLevel::Error);
    }

    #[test]
    fn should_append_message_of_selected_group_once() {
        let Given {
            group, mut state, ..
        } = selected_group();
        let msg = group_message(group.id(), "hi");

        state.apply(Action::Reconcile(Notification::NewGroupMessage(msg.clone())));
        state.apply(Action::MessageSent {
            conversation: Conversation::Group(*group.id()),
            result: Ok(ChatMessage::Group(msg.clone())),
        });

        assert_eq!(state.messages(), &[ChatMessage::Group(msg)]);
    }

    #[test]
    fn should_keep_message_pushed_while_loading() {
        let Given {
            group, mut state, ..
        } = selected_group();
        let seq = fetch_seq(&state.apply(Action::Select(Conversation::Group(*group.id()))));
        let pushed = group_message(group.id(), "during load");

        state.apply(Action::Reconcile(Notification::NewGroupMessage(pushed.clone())));
        assert!(state.is_loading());
        assert!(state.messages().is_empty());

        let older = ChatMessage::Group(group_message(group.id(), "before"));
        state.apply(Action::MessagesLoaded {
            seq,
            result: Ok(vec![older.clone()]),
        });

        assert_eq!(state.messages(), &[older, ChatMessage::Group(pushed)]);
    }

    #[test]
    fn should_not_duplicate_message_already_in_loaded_history() {
        let Given {
            group, mut state, ..
        } = selected_group();
        let seq = fetch_seq(&state.apply(Action::Select(Conversation::Group(*group.id()))));
        let msg = group_message(group.id(), "hi");

        state.apply(Action::Reconcile(Notification::NewGroupMessage(msg.clone())));
        state.apply(Action::MessagesLoaded {
            seq,
            result: Ok(vec![ChatMessage::Group(msg.clone())]),
        });

        assert_eq!(state.messages(), &[ChatMessage::Group(msg)]);
    }

    #[test]
    fn should_drop_pushed_messages_when_load_is_superseded() {
        let Given {
            group, mut state, ..
        } = selected_group();
        fetch_seq(&state.apply(Action::Select(Conversation::Group(*group.id()))));
        state.apply(Action::Reconcile(Notification::NewGroupMessage(
            group_message(group.id(), "hi"),
        )));

        let other = Conversation::Direct(user::Id::random());
        let seq = fetch_seq(&state.apply(Action::Select(other)));
        state.apply(Action::MessagesLoaded {
            seq,
            result: Ok(vec![]),
        });

        assert!(state.messages().is_empty());
    }

    #[test]
    fn should_ignore_message_of_other_conversation() {
        let Given { mut state, .. } = selected_group();

        state.apply(Action::Reconcile(Notification::NewGroupMessage(
            group_message(&group::Id::random(), "elsewhere"),
        )));

        assert!(state.messages().is_empty());
    }

    #[test]
    fn should_append_direct_message_from_selected_user() {
        let me = user::Id::random();
        let friend = user::Id::random();
        let mut state = State::new(me);
        let seq = fetch_seq(&state.apply(Action::Select(Conversation::Direct(friend))));
        state.apply(Action::MessagesLoaded {
            seq,
            result: Ok(vec![]),
        });

        let incoming = DirectMessageDto::new(friend, me, "hi");
        let stranger = DirectMessageDto::new(user::Id::random(), me, "spam");
        state.apply(Action::Reconcile(Notification::NewMessage(incoming.clone())));
        state.apply(Action::Reconcile(Notification::NewMessage(stranger)));

        assert_eq!(state.messages(), &[ChatMessage::Direct(incoming)]);
    }

    #[test]
    fn should_clear_selection_when_selected_group_is_deleted() {
        let Given {
            group, mut state, ..
        } = selected_group();
        state.apply(Action::Reconcile(Notification::NewGroupMessage(
            group_message(group.id(), "hi"),
        )));

        state.apply(Action::Reconcile(Notification::GroupDeleted {
            group_id: *group.id(),
        }));

        assert_eq!(state.selected(), None);
        assert!(state.messages().is_empty());
        assert!(state.groups().is_empty());
    }

    #[test]
    fn should_keep_selection_when_other_group_is_deleted() {
        let Given {
            me,
            group,
            mut state,
            ..
        } = selected_group();
        let background = group_of(&[me, user::Id::random(), user::Id::random()]);
        state.apply(Action::Reconcile(Notification::GroupCreated(background.clone())));

        state.apply(Action::Reconcile(Notification::GroupDeleted {
            group_id: *background.id(),
        }));

        assert_eq!(state.selected(), Some(&Conversation::Group(*group.id())));
        assert_eq!(state.groups(), &[group]);
    }

    #[test]
    fn should_drop_group_when_local_user_left() {
        let Given {
            me,
            group,
            mut state,
            ..
        } = selected_group();

        state.apply(Action::Reconcile(Notification::MemberLeft {
            group_id: *group.id(),
            left_user_id: me,
            updated_group: group.clone(),
        }));

        assert_eq!(state.selected(), None);
        assert!(state.groups().is_empty());
    }

    #[test]
    fn should_replace_group_when_other_member_left() {
        let Given {
            other,
            group,
            mut state,
            ..
        } = selected_group();
        let remaining = group
            .members()
            .iter()
            .filter(|m| m.id().ne(&other))
            .cloned()
            .collect();
        let updated = with_members(&group, remaining);

        state.apply(Action::Reconcile(Notification::MemberLeft {
            group_id: *group.id(),
            left_user_id: other,
            updated_group: updated.clone(),
        }));

        assert_eq!(state.groups(), &[updated]);
        assert_eq!(state.selected(), Some(&Conversation::Group(*group.id())));
    }

    #[test]
    fn should_prepend_group_when_added_and_notify_once() {
        let Given { me, mut state, .. } = selected_group();
        let added = group_of(&[user::Id::random(), user::Id::random(), me]);

        state.apply(Action::Reconcile(Notification::AddedToGroup(added.clone())));
        state.apply(Action::Reconcile(Notification::AddedToGroup(added.clone())));

        assert_eq!(state.groups().len(), 2);
        assert_eq!(&state.groups()[0], &added);
        assert_eq!(state.notices().len(), 1);
        assert_eq!(state.notices()[0].text(), "You've been added to trip");
    }

    #[test]
    fn should_not_duplicate_created_group() {
        let Given {
            group, mut state, ..
        } = selected_group();

        state.apply(Action::GroupCreated(Ok(group.clone())));
        state.apply(Action::Reconcile(Notification::GroupCreated(group)));

        assert_eq!(state.groups().len(), 1);
    }

    #[test]
    fn should_replace_group_on_update_and_count_added() {
        let Given {
            group, mut state, ..
        } = selected_group();
        let added = MemberSummary::new(user::Id::random(), "dave", "");
        let mut members = group.members().to_vec();
        members.push(added.clone());
        let updated = with_members(&group, members);

        state.apply(Action::Reconcile(Notification::GroupUpdated {
            action: UpdateAction::MembersAdded,
            group: updated.clone(),
            added_members: vec![added],
        }));

        assert_eq!(state.groups(), &[updated]);
        assert_eq!(state.notices()[0].text(), "1 new members added");
    }

    #[test]
    fn should_only_change_state_after_confirmation() {
        let Given {
            group, mut state, ..
        } = selected_group();

        let effects = state.apply(Action::DeleteGroup(*group.id()));
        assert_eq!(effects, vec![Effect::DeleteGroup(*group.id())]);
        assert_eq!(state.groups().len(), 1);

        state.apply(Action::GroupDeleted {
            group_id: *group.id(),
            result: Err("Failed to delete group".into()),
        });
        assert_eq!(state.groups().len(), 1);
        assert_eq!(state.notices()[0].level(), NoticeLevel::Error);

        state.apply(Action::GroupDeleted {
            group_id: *group.id(),
            result: Ok(()),
        });
        assert!(state.groups().is_empty());
        assert_eq!(state.selected(), None);
    }

    #[test]
    fn should_send_only_with_selection() {
        let mut state = State::new(user::Id::random());
        assert!(
            state
                .apply(Action::SendMessage {
                    text: Some("hi".into()),
                    image: None
                })
                .is_empty()
        );

        let Given {
            group, mut state, ..
        } = selected_group();
        let effects = state.apply(Action::SendMessage {
            text: Some("hi".into()),
            image: None,
        });

        assert_eq!(
            effects,
            vec![Effect::SendMessage {
                conversation: Conversation::Group(*group.id()),
                text: Some("hi".into()),
                image: None,
            }]
        );
    }

    #[test]
    fn should_dismiss_notice() {
        let mut state = State::new(user::Id::random());
        state.apply(Action::GroupsLoaded(Err("Failed to load groups".into())));
        let id = state.notices()[0].id();

        state.apply(Action::DismissNotice(id));

        assert!(state.notices().is_empty());
    }

    #[test]
    fn should_reset_and_ignore_in_flight_load() {
        let Given { me, mut state, .. } = selected_group();
        let seq = fetch_seq(&state.apply(Action::Select(Conversation::Direct(user::Id::random()))));

        state.apply(Action::Reset);
        state.apply(Action::MessagesLoaded {
            seq,
            result: Ok(vec![ChatMessage::Direct(DirectMessageDto::new(
                me,
                user::Id::random(),
                "late",
            ))]),
        });

        assert_eq!(state.me(), &me);
        assert!(state.groups().is_empty());
        assert_eq!(state.selected(), None);
        assert!(state.messages().is_empty());
    }
}
