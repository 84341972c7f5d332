//! Lifecycle actions that can be invoked on a CONTAINER cell

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PaddockError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerAction {
    Start,
    Stop,
    Pause,
    Unpause,
    Restart,
    Remove,
    Kill,
}

impl ContainerAction {
    pub const ALL: [ContainerAction; 7] = [
        ContainerAction::Start,
        ContainerAction::Stop,
        ContainerAction::Pause,
        ContainerAction::Unpause,
        ContainerAction::Restart,
        ContainerAction::Remove,
        ContainerAction::Kill,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerAction::Start => "start",
            ContainerAction::Stop => "stop",
            ContainerAction::Pause => "pause",
            ContainerAction::Unpause => "unpause",
            ContainerAction::Restart => "restart",
            ContainerAction::Remove => "remove",
            ContainerAction::Kill => "kill",
        }
    }

    /// Case-insensitive lookup that returns `None` for non-action names
    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for ContainerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContainerAction {
    type Err = PaddockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::lookup(s).ok_or_else(|| PaddockError::UnknownFunction(s.to_string()))
    }
}
