//! Action sets carried by every node of a scope

use serde::{Deserialize, Serialize};
use std::fmt;

/// Actions a grant can allow
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Observe the resource (list, subscribe, receive)
    Read,
    /// Mutate the resource (join, publish, forward)
    Write,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Read => write!(f, "read"),
            Action::Write => write!(f, "write"),
        }
    }
}

/// An ordered, duplicate-free set of actions.
///
/// Serializes as a JSON array in canonical order (`read` before `write`), so
/// two sets with the same members always produce the same bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Action>", into = "Vec<Action>")]
pub struct ActionSet {
    actions: Vec<Action>,
}

impl ActionSet {
    pub fn new() -> Self {
        Self { actions: Vec::new() }
    }

    /// `["read"]`
    pub fn read_only() -> Self {
        Self {
            actions: vec![Action::Read],
        }
    }

    /// `["read", "write"]`, the widest set a node can hold
    pub fn read_write() -> Self {
        Self {
            actions: vec![Action::Read, Action::Write],
        }
    }

    /// Add an action, keeping the set sorted and unique
    pub fn add(&mut self, action: Action) {
        if let Err(pos) = self.actions.binary_search(&action) {
            self.actions.insert(pos, action);
        }
    }

    pub fn allows(&self, action: Action) -> bool {
        self.actions.contains(&action)
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }
}

impl FromIterator<Action> for ActionSet {
    fn from_iter<T: IntoIterator<Item = Action>>(iter: T) -> Self {
        let mut set = ActionSet::new();
        for action in iter {
            set.add(action);
        }
        set
    }
}

impl From<Vec<Action>> for ActionSet {
    fn from(actions: Vec<Action>) -> Self {
        actions.into_iter().collect()
    }
}

impl From<ActionSet> for Vec<Action> {
    fn from(set: ActionSet) -> Self {
        set.actions
    }
}

impl fmt::Display for ActionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.actions.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", names.join(","))
    }
}
