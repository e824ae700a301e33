use serde::{Deserialize, Serialize};

use crate::model::now_millis;
use crate::user;

use super::{Error, Id, Result};

/// A user attached to a conversation. `last_read_at` moves independently per
/// participant and only ever forward.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Participant {
    pub user: user::Id,
    pub joined_at: i64,
    pub last_read_at: i64,
}

impl Participant {
    fn new(user: user::Id, now: i64) -> Self {
        Self {
            user,
            joined_at: now,
            last_read_at: now,
        }
    }
}

/// Denormalized snapshot of the latest message, kept on the chat so list
/// views render without touching the messages collection. May lag behind the
/// messages collection under concurrent sends, never run ahead of it.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LastMessage {
    pub content: String,
    pub sender: user::Id,
    pub sent_at: i64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Chat {
    #[serde(rename = "_id")]
    pub id: Id,
    pub participants: Vec<Participant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<LastMessage>,
    pub message_count: u64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Chat {
    pub fn new(
        me: user::Id,
        other: user::Id,
        product: Option<String>,
        title: Option<String>,
    ) -> Result<Self> {
        if me == other {
            return Err(Error::SelfChat);
        }

        let now = now_millis();
        Ok(Self {
            id: Id::random(),
            participants: vec![Participant::new(me, now), Participant::new(other, now)],
            product,
            title,
            is_active: true,
            last_message: None,
            message_count: 0,
            created_at: now,
            updated_at: now,
        })
    }
}

impl Chat {
    pub fn participant(&self, user: &user::Id) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user == *user)
    }

    pub fn is_participant(&self, user: &user::Id) -> bool {
        self.participant(user).is_some()
    }

    /// Everyone in the chat except `user`.
    pub fn counterparts(&self, user: &user::Id) -> Vec<user::Id> {
        self.participants
            .iter()
            .filter(|p| p.user != *user)
            .map(|p| p.user.clone())
            .collect()
    }

    /// Advances the participant's read marker, never backwards.
    pub fn mark_read(&mut self, user: &user::Id, read_at: i64) -> Result<i64> {
        let participant = self
            .participants
            .iter_mut()
            .find(|p| p.user == *user)
            .ok_or(Error::NotParticipant)?;

        participant.last_read_at = participant.last_read_at.max(read_at);
        Ok(participant.last_read_at)
    }

    /// Replaces the last-message snapshot and bumps the message counter.
    pub fn register_message(&mut self, last: LastMessage) {
        self.updated_at = last.sent_at;
        self.last_message = Some(last);
        self.message_count += 1;
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ParticipantDto {
    pub user: user::Id,
    pub name: String,
    pub last_read_at: i64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ChatDto {
    pub id: Id,
    pub participants: Vec<ParticipantDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<LastMessage>,
    pub unread_count: u64,
    pub created_at: i64,
    pub updated_at: i64,
}
