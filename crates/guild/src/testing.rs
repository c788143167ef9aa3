use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use agegate_core::{ChannelId, GuildId, RoleId, UserId};

use crate::actions::{GuildActions, GuildMember};
use crate::error::GuildError;
use crate::message::ChannelMessage;

/// A single captured guild call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuildCall {
    AddRole { user: UserId, role: RoleId },
    RemoveRole { user: UserId, role: RoleId },
    Ban { user: UserId, reason: String },
    Unban { user: UserId, reason: String },
    Kick { user: UserId, reason: String },
    ChannelMessage {
        channel: ChannelId,
        message: ChannelMessage,
    },
    Dm {
        user: UserId,
        message: ChannelMessage,
    },
    MembersWithRole { role: RoleId },
}

/// Records every guild call for assertions; optionally injects failures.
///
/// Role listings return fixtures installed with
/// [`set_members`](RecordingGuild::set_members).
#[derive(Default)]
pub struct RecordingGuild {
    calls: Mutex<Vec<GuildCall>>,
    members: Mutex<HashMap<RoleId, Vec<GuildMember>>>,
    fail_role_changes: AtomicBool,
    fail_bans: AtomicBool,
    fail_kicks: AtomicBool,
    fail_messages: AtomicBool,
}

impl RecordingGuild {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call captured so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<GuildCall> {
        self.calls.lock().expect("lock poisoned").clone()
    }

    /// Every DM sent to a user, in order.
    #[must_use]
    pub fn dms_to(&self, user: &UserId) -> Vec<ChannelMessage> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GuildCall::Dm { user: to, message } if &to == user => Some(message),
                _ => None,
            })
            .collect()
    }

    /// Every message posted to a channel, in order.
    #[must_use]
    pub fn channel_messages(&self, channel: &ChannelId) -> Vec<ChannelMessage> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GuildCall::ChannelMessage { channel: to, message } if &to == channel => {
                    Some(message)
                }
                _ => None,
            })
            .collect()
    }

    /// Install the members returned for a role.
    pub fn set_members(&self, role: RoleId, members: Vec<GuildMember>) {
        self.members
            .lock()
            .expect("lock poisoned")
            .insert(role, members);
    }

    /// Make role grants and removals fail.
    pub fn fail_role_changes(&self, fail: bool) {
        self.fail_role_changes.store(fail, Ordering::SeqCst);
    }

    /// Make bans and unbans fail.
    pub fn fail_bans(&self, fail: bool) {
        self.fail_bans.store(fail, Ordering::SeqCst);
    }

    /// Make kicks fail.
    pub fn fail_kicks(&self, fail: bool) {
        self.fail_kicks.store(fail, Ordering::SeqCst);
    }

    /// Make channel messages and DMs fail.
    pub fn fail_messages(&self, fail: bool) {
        self.fail_messages.store(fail, Ordering::SeqCst);
    }

    fn record(&self, call: GuildCall) {
        self.calls.lock().expect("lock poisoned").push(call);
    }

    fn scripted_failure(flag: &AtomicBool) -> Result<(), GuildError> {
        if flag.load(Ordering::SeqCst) {
            return Err(GuildError::PermissionDenied(
                "scripted failure".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl GuildActions for RecordingGuild {
    async fn add_role(
        &self,
        _guild: &GuildId,
        user: &UserId,
        role: &RoleId,
        _reason: &str,
    ) -> Result<(), GuildError> {
        self.record(GuildCall::AddRole {
            user: user.clone(),
            role: role.clone(),
        });
        Self::scripted_failure(&self.fail_role_changes)
    }

    async fn remove_role(
        &self,
        _guild: &GuildId,
        user: &UserId,
        role: &RoleId,
        _reason: &str,
    ) -> Result<(), GuildError> {
        self.record(GuildCall::RemoveRole {
            user: user.clone(),
            role: role.clone(),
        });
        Self::scripted_failure(&self.fail_role_changes)
    }

    async fn ban(&self, _guild: &GuildId, user: &UserId, reason: &str) -> Result<(), GuildError> {
        self.record(GuildCall::Ban {
            user: user.clone(),
            reason: reason.to_string(),
        });
        Self::scripted_failure(&self.fail_bans)
    }

    async fn unban(&self, _guild: &GuildId, user: &UserId, reason: &str) -> Result<(), GuildError> {
        self.record(GuildCall::Unban {
            user: user.clone(),
            reason: reason.to_string(),
        });
        Self::scripted_failure(&self.fail_bans)
    }

    async fn kick(&self, _guild: &GuildId, user: &UserId, reason: &str) -> Result<(), GuildError> {
        self.record(GuildCall::Kick {
            user: user.clone(),
            reason: reason.to_string(),
        });
        Self::scripted_failure(&self.fail_kicks)
    }

    async fn send_channel_message(
        &self,
        channel: &ChannelId,
        message: &ChannelMessage,
    ) -> Result<(), GuildError> {
        self.record(GuildCall::ChannelMessage {
            channel: channel.clone(),
            message: message.clone(),
        });
        Self::scripted_failure(&self.fail_messages)
    }

    async fn send_dm(&self, user: &UserId, message: &ChannelMessage) -> Result<(), GuildError> {
        self.record(GuildCall::Dm {
            user: user.clone(),
            message: message.clone(),
        });
        Self::scripted_failure(&self.fail_messages)
    }

    async fn members_with_role(
        &self,
        _guild: &GuildId,
        role: &RoleId,
    ) -> Result<Vec<GuildMember>, GuildError> {
        self.record(GuildCall::MembersWithRole { role: role.clone() });
        Ok(self
            .members
            .lock()
            .expect("lock poisoned")
            .get(role)
            .cloned()
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        "recording"
    }
}
