/// Browser capabilities the grouping logic depends on
use crate::tab_data::{GroupColor, GroupId, Tab, TabGroup, TabId, WindowId, WindowSnapshot};
use async_trait::async_trait;
use thiserror::Error;

#[cfg(test)]
pub(crate) mod fake;

pub type HostResult<T> = Result<T, HostError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    #[error("tab group {0} no longer exists")]
    GroupNotFound(GroupId),

    #[error("host rejected command: {0}")]
    Rejected(String),

    #[error("failed to decode host response: {0}")]
    Decode(String),
}

/// Which tabs a query returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabQuery {
    All,
    Window(WindowId),
    CurrentWindow,
}

/// Asynchronous tab, window and group commands
///
/// Every call resolves exactly once. Implementations run on a single thread,
/// so futures are not required to be `Send`.
#[async_trait(?Send)]
pub trait TabHost {
    async fn query_tabs(&self, query: TabQuery) -> HostResult<Vec<Tab>>;

    /// Every open window with its tabs
    async fn query_windows(&self) -> HostResult<Vec<WindowSnapshot>>;

    /// Fails with `GroupNotFound` once the group is gone
    async fn get_group(&self, group_id: GroupId) -> HostResult<TabGroup>;

    /// Move tabs into `group_id`, or into a new group when `None`
    async fn group_tabs(&self, tab_ids: &[TabId], group_id: Option<GroupId>) -> HostResult<GroupId>;

    async fn update_group(&self, group_id: GroupId, title: &str, color: GroupColor) -> HostResult<()>;

    async fn ungroup_tabs(&self, tab_ids: &[TabId]) -> HostResult<()>;

    async fn set_muted(&self, tab_id: TabId, muted: bool) -> HostResult<()>;

    async fn remove_tabs(&self, tab_ids: &[TabId]) -> HostResult<()>;

    async fn activate_tab(&self, tab_id: TabId) -> HostResult<()>;
}
