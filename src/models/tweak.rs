//! Test tweak model

use serde::{Deserialize, Serialize};

use super::enums::TweakMode;

/// Structural override of one pipeline node for a test run
///
/// Tweaks are identified by node name; a test holds at most one per node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestTweak {
    pub node_name: String,
    #[serde(default)]
    pub mode: TweakMode,
}

impl TestTweak {
    pub fn new(node_name: impl Into<String>, mode: TweakMode) -> Self {
        Self {
            node_name: node_name.into(),
            mode,
        }
    }

    pub fn bypass(node_name: impl Into<String>) -> Self {
        Self::new(node_name, TweakMode::Bypass)
    }

    pub fn remove(node_name: impl Into<String>) -> Self {
        Self::new(node_name, TweakMode::Remove)
    }
}
