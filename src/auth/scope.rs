//! Authorization scope documents
//!
//! A scope is a tree of grants rooted at the application:
//!
//! ```text
//! app (id, turn, actions)
//! └── channels[]      one room, or `*`
//!     ├── members[]   name pattern `*`, publication, subscription
//!     └── sfuBots[]   forwardings
//! ```
//!
//! Every node carries an [`ActionSet`]; name patterns are matched by the
//! verifier when a room is joined.

use crate::auth::actions::ActionSet;
use crate::config::ConfigurationError;
use crate::rooms::{pattern_matches, Room, RoomPolicy, WILDCARD};
use serde::{Deserialize, Serialize};

/// Root of the grant tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthScope {
    pub app: AppGrant,
}

/// Application-level grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppGrant {
    pub id: String,
    /// Allow TURN relay for media traversal
    pub turn: bool,
    pub actions: ActionSet,
    pub channels: Vec<ChannelGrant>,
}

/// Grant on a room (channel), by name or `*`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelGrant {
    pub name: String,
    pub actions: ActionSet,
    pub members: Vec<MemberGrant>,
    pub sfu_bots: Vec<SfuBotGrant>,
}

/// Template applied to members of a room whose name matches `name`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberGrant {
    pub name: String,
    pub actions: ActionSet,
    pub publication: ActionGrant,
    pub subscription: ActionGrant,
}

/// Template applied to media relay (SFU) bots in a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SfuBotGrant {
    pub actions: ActionSet,
    pub forwardings: Vec<ActionGrant>,
}

/// Leaf grant with nothing but actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionGrant {
    pub actions: ActionSet,
}

impl ActionGrant {
    pub fn read_write() -> Self {
        Self {
            actions: ActionSet::read_write(),
        }
    }
}

impl AuthScope {
    /// Channel grant that applies to a concrete room name.
    ///
    /// An exact name wins over a `*` grant.
    pub fn channel_for(&self, room: &str) -> Option<&ChannelGrant> {
        let channels = &self.app.channels;
        channels
            .iter()
            .find(|c| c.name == room)
            .or_else(|| channels.iter().find(|c| pattern_matches(&c.name, room)))
    }
}

impl ChannelGrant {
    /// Member template that applies to a concrete member name
    pub fn member_for(&self, member: &str) -> Option<&MemberGrant> {
        self.members
            .iter()
            .find(|m| m.name == member)
            .or_else(|| self.members.iter().find(|m| pattern_matches(&m.name, member)))
    }
}

/// Builds the scope for one room of one application.
///
/// Every grant below the app node is the full `read`/`write` set and the
/// member template matches every member (`*`). Tokens built for [`Room::Any`]
/// open every room of the app to the holder.
#[derive(Debug, Clone)]
pub struct ScopeBuilder {
    app_id: String,
    room_policy: RoomPolicy,
}

impl ScopeBuilder {
    pub fn new(app_id: impl Into<String>) -> Result<Self, ConfigurationError> {
        let app_id = app_id.into();
        if app_id.is_empty() {
            return Err(ConfigurationError::MissingAppId);
        }

        Ok(Self {
            app_id,
            room_policy: RoomPolicy::default(),
        })
    }

    pub fn with_room_policy(mut self, policy: RoomPolicy) -> Self {
        self.room_policy = policy;
        self
    }

    /// Build the scope for the requested room; `None` or `""` means every room
    pub fn build(&self, room: Option<&str>) -> AuthScope {
        self.build_for(&Room::resolve(room, self.room_policy))
    }

    pub fn build_for(&self, room: &Room) -> AuthScope {
        AuthScope {
            app: AppGrant {
                id: self.app_id.clone(),
                turn: true,
                actions: ActionSet::read_only(),
                channels: vec![channel_grant(room)],
            },
        }
    }
}

fn channel_grant(room: &Room) -> ChannelGrant {
    ChannelGrant {
        name: room.as_str().to_string(),
        actions: ActionSet::read_write(),
        members: vec![MemberGrant {
            name: WILDCARD.to_string(),
            actions: ActionSet::read_write(),
            publication: ActionGrant::read_write(),
            subscription: ActionGrant::read_write(),
        }],
        sfu_bots: vec![SfuBotGrant {
            actions: ActionSet::read_write(),
            forwardings: vec![ActionGrant::read_write()],
        }],
    }
}
