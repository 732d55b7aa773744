/// Data structures for Tab Herder
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Host sentinel for "not in any group"
pub const NO_GROUP: i32 = -1;

/// Browser tab identifier, unique while the tab exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub i32);

/// Browser window identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub i32);

/// Host-level tab group identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub i32);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Load status reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabStatus {
    Loading,
    Complete,
    Unloaded,
}

/// Colors the host accepts for a tab group, in palette order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupColor {
    Blue,
    Red,
    Yellow,
    Green,
    Pink,
    Purple,
    Cyan,
    Orange,
    Grey,
}

impl GroupColor {
    pub const PALETTE: [GroupColor; 9] = [
        GroupColor::Blue,
        GroupColor::Red,
        GroupColor::Yellow,
        GroupColor::Green,
        GroupColor::Pink,
        GroupColor::Purple,
        GroupColor::Cyan,
        GroupColor::Orange,
        GroupColor::Grey,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupColor::Blue => "blue",
            GroupColor::Red => "red",
            GroupColor::Yellow => "yellow",
            GroupColor::Green => "green",
            GroupColor::Pink => "pink",
            GroupColor::Purple => "purple",
            GroupColor::Cyan => "cyan",
            GroupColor::Orange => "orange",
            GroupColor::Grey => "grey",
        }
    }
}

impl fmt::Display for GroupColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutedInfo {
    #[serde(default)]
    pub muted: bool,
}

/// Information about a browser tab, in the host's camelCase shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: TabId,
    pub window_id: WindowId,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: Option<TabStatus>,
    #[serde(default, deserialize_with = "group_membership")]
    pub group_id: Option<GroupId>,
    #[serde(default)]
    pub muted_info: Option<MutedInfo>,
}

impl Tab {
    #[cfg(test)]
    pub fn new(id: i32, window_id: i32, url: &str) -> Tab {
        Tab {
            id: TabId(id),
            window_id: WindowId(window_id),
            url: Some(url.to_string()).filter(|u| !u.is_empty()),
            title: String::new(),
            status: Some(TabStatus::Complete),
            group_id: None,
            muted_info: None,
        }
    }

    /// URL if present and non-empty
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.is_empty())
    }

    pub fn is_muted(&self) -> bool {
        self.muted_info.map_or(false, |info| info.muted)
    }
}

/// Maps the host's `-1` sentinel (or a missing value) to `None`
fn group_membership<'de, D>(deserializer: D) -> Result<Option<GroupId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<i32>::deserialize(deserializer)?;
    Ok(raw.filter(|id| *id != NO_GROUP).map(GroupId))
}

/// Change info delivered with a tab-updated notification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabChange {
    #[serde(default)]
    pub status: Option<TabStatus>,
    #[serde(default)]
    pub url: Option<String>,
}

impl TabChange {
    #[cfg(test)]
    pub fn completed() -> TabChange {
        TabChange {
            status: Some(TabStatus::Complete),
            url: None,
        }
    }
}

/// A window together with its tabs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowSnapshot {
    pub id: WindowId,
    #[serde(default)]
    pub tabs: Vec<Tab>,
}

/// A live host-level tab group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabGroup {
    pub id: GroupId,
    pub window_id: WindowId,
    #[serde(default)]
    pub title: String,
    pub color: GroupColor,
}
