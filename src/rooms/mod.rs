//! Room selection and name matching
//!
//! A token is scoped to exactly one room, named by the caller:
//! - `lobby-42` grants access to the room called `lobby-42`
//! - an omitted or empty name, or `*`, grants access to every room under the app
//!
//! The wildcard is an intentional open mode: any client holding such a token
//! may join any room of the application. Patterns are resolved by the verifier
//! when a room is joined, never expanded at issuance.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Pattern matching every name
pub const WILDCARD: &str = "*";

/// Characters kept by [`RoomPolicy::Sanitize`]
fn is_safe_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Check a concrete name against a grant pattern (`*` or an exact name)
pub fn pattern_matches(pattern: &str, name: &str) -> bool {
    pattern == WILDCARD || pattern == name
}

#[derive(Debug, Error)]
#[error("unknown room policy '{0}': expected 'passthrough' or 'sanitize'")]
pub struct UnknownPolicy(String);

/// How caller-supplied room names are embedded into a scope
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoomPolicy {
    /// Embed the name exactly as received
    #[default]
    Passthrough,
    /// Drop every character outside `[A-Za-z0-9_-]`; a name with nothing left
    /// becomes the wildcard
    Sanitize,
}

impl FromStr for RoomPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "passthrough" => Ok(RoomPolicy::Passthrough),
            "sanitize" => Ok(RoomPolicy::Sanitize),
            _ => Err(UnknownPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for RoomPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomPolicy::Passthrough => write!(f, "passthrough"),
            RoomPolicy::Sanitize => write!(f, "sanitize"),
        }
    }
}

/// The room a token is scoped to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Room {
    /// Every room under the app
    Any,
    /// One room, by name
    Named(String),
}

impl Room {
    /// Resolve the caller's requested room under the given policy
    pub fn resolve(requested: Option<&str>, policy: RoomPolicy) -> Self {
        let name = match (requested, policy) {
            (None, _) => return Room::Any,
            (Some(name), RoomPolicy::Passthrough) => name.to_string(),
            (Some(name), RoomPolicy::Sanitize) => name.chars().filter(|c| is_safe_char(*c)).collect(),
        };

        if name.is_empty() || name == WILDCARD {
            Room::Any
        } else {
            Room::Named(name)
        }
    }

    /// Name as it appears in the channel grant
    pub fn as_str(&self) -> &str {
        match self {
            Room::Any => WILDCARD,
            Room::Named(name) => name,
        }
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_omitted_and_empty_rooms_are_wildcard() {
        assert_eq!(Room::resolve(None, RoomPolicy::Passthrough), Room::Any);
        assert_eq!(Room::resolve(Some(""), RoomPolicy::Passthrough), Room::Any);
        assert_eq!(Room::resolve(Some("*"), RoomPolicy::Passthrough), Room::Any);
        assert_eq!(Room::Any.as_str(), "*");
    }

    #[test]
    fn test_passthrough_keeps_name_verbatim() {
        let room = Room::resolve(Some("ロビー 42/main"), RoomPolicy::Passthrough);
        assert_eq!(room.as_str(), "ロビー 42/main");
        assert_ne!(room, Room::Any);
    }

    #[test]
    fn test_sanitize_strips_unsafe_characters() {
        let room = Room::resolve(Some("lobby 42/../main!"), RoomPolicy::Sanitize);
        assert_eq!(room, Room::Named("lobby42main".to_string()));

        let room = Room::resolve(Some("team_a-1"), RoomPolicy::Sanitize);
        assert_eq!(room.as_str(), "team_a-1");
    }

    #[test]
    fn test_sanitize_falls_back_to_wildcard() {
        assert_eq!(Room::resolve(Some("!!!"), RoomPolicy::Sanitize), Room::Any);
        assert_eq!(Room::resolve(Some("ロビー"), RoomPolicy::Sanitize), Room::Any);
    }

    #[test]
    fn test_room_matching() {
        let lobby = Room::Named("lobby".to_string());
        assert!(pattern_matches(lobby.as_str(), "lobby"));
        assert!(!pattern_matches(lobby.as_str(), "lobby-2"));
        assert!(pattern_matches(Room::Any.as_str(), "anything"));
        assert!(pattern_matches("*", "alice"));
        assert!(!pattern_matches("alice", "bob"));
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("sanitize".parse::<RoomPolicy>().unwrap(), RoomPolicy::Sanitize);
        assert_eq!("Passthrough".parse::<RoomPolicy>().unwrap(), RoomPolicy::Passthrough);
        assert!("strict".parse::<RoomPolicy>().is_err());
        assert_eq!(RoomPolicy::default(), RoomPolicy::Passthrough);
    }
}
