/// In-memory host used by the unit tests
use super::{HostError, HostResult, TabHost, TabQuery};
use crate::tab_data::{GroupColor, GroupId, MutedInfo, Tab, TabGroup, TabId, WindowId, WindowSnapshot};
use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A command the host executed, in execution order
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    GetGroup(GroupId),
    Group { tabs: Vec<TabId>, group: Option<GroupId> },
    Update { group: GroupId, title: String, color: GroupColor },
    Ungroup(Vec<TabId>),
    SetMuted(TabId, bool),
    Remove(Vec<TabId>),
}

/// Host operations a test can make fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Failure {
    Query,
    Create,
    Append,
    Update,
    Ungroup,
    Remove,
    Mute(TabId),
}

#[derive(Debug, Default)]
struct FakeState {
    tabs: Vec<Tab>,
    groups: BTreeMap<GroupId, TabGroup>,
    next_group: i32,
    current_window: Option<WindowId>,
    commands: Vec<Command>,
    failures: HashSet<Failure>,
    yield_on_call: bool,
}

#[derive(Debug, Default)]
pub struct FakeHost {
    state: RefCell<FakeState>,
}

impl FakeHost {
    pub fn new() -> Self {
        let host = Self::default();
        host.state.borrow_mut().next_group = 100;
        host
    }

    pub fn with_tabs(tabs: Vec<Tab>) -> Self {
        let host = Self::new();
        host.state.borrow_mut().tabs = tabs;
        host
    }

    /// Every call returns `Pending` once before completing, so concurrently
    /// driven handlers interleave at each host command
    pub fn yield_on_call(&self) {
        self.state.borrow_mut().yield_on_call = true;
    }

    pub fn set_current_window(&self, window_id: WindowId) {
        self.state.borrow_mut().current_window = Some(window_id);
    }

    pub fn fail(&self, failure: Failure) {
        self.state.borrow_mut().failures.insert(failure);
    }

    pub fn open_tab(&self, tab: Tab) {
        self.state.borrow_mut().tabs.push(tab);
    }

    pub fn mute(&self, tab_id: TabId) {
        let mut state = self.state.borrow_mut();
        if let Some(tab) = state.tabs.iter_mut().find(|t| t.id == tab_id) {
            tab.muted_info = Some(MutedInfo { muted: true });
        }
    }

    /// Simulate the user dissolving a group by hand
    pub fn dissolve_group(&self, group_id: GroupId) {
        let mut state = self.state.borrow_mut();
        state.groups.remove(&group_id);
        for tab in state.tabs.iter_mut().filter(|t| t.group_id == Some(group_id)) {
            tab.group_id = None;
        }
    }

    /// Simulate the user dragging a group, with its tabs, into another window
    pub fn move_group(&self, group_id: GroupId, window_id: WindowId) {
        let mut state = self.state.borrow_mut();
        if let Some(group) = state.groups.get_mut(&group_id) {
            group.window_id = window_id;
        }
        for tab in state.tabs.iter_mut().filter(|t| t.group_id == Some(group_id)) {
            tab.window_id = window_id;
        }
    }

    pub fn tab(&self, tab_id: TabId) -> Option<Tab> {
        self.state.borrow().tabs.iter().find(|t| t.id == tab_id).cloned()
    }

    pub fn group_of(&self, tab_id: TabId) -> Option<GroupId> {
        self.tab(tab_id).and_then(|t| t.group_id)
    }

    pub fn group(&self, group_id: GroupId) -> Option<TabGroup> {
        self.state.borrow().groups.get(&group_id).cloned()
    }

    pub fn group_count(&self) -> usize {
        self.state.borrow().groups.len()
    }

    pub fn tab_count(&self) -> usize {
        self.state.borrow().tabs.len()
    }

    pub fn commands(&self) -> Vec<Command> {
        self.state.borrow().commands.clone()
    }

    /// Tab sets of every create-group command
    pub fn creates(&self) -> Vec<Vec<TabId>> {
        self.commands()
            .into_iter()
            .filter_map(|command| match command {
                Command::Group { tabs, group: None } => Some(tabs),
                _ => None,
            })
            .collect()
    }

    /// Tab sets and targets of every append-to-group command
    pub fn appends(&self) -> Vec<(Vec<TabId>, GroupId)> {
        self.commands()
            .into_iter()
            .filter_map(|command| match command {
                Command::Group { tabs, group: Some(group) } => Some((tabs, group)),
                _ => None,
            })
            .collect()
    }

    async fn call(&self) {
        let should_yield = self.state.borrow().yield_on_call;
        if should_yield {
            YieldNow(false).await;
        }
    }

    fn failing(&self, failure: Failure) -> bool {
        self.state.borrow().failures.contains(&failure)
    }

    fn record(&self, command: Command) {
        self.state.borrow_mut().commands.push(command);
    }
}

impl FakeState {
    /// The host drops groups that lost their last tab
    fn prune_empty_groups(&mut self) {
        let tabs = &self.tabs;
        self.groups
            .retain(|id, _| tabs.iter().any(|t| t.group_id == Some(*id)));
    }
}

#[async_trait(?Send)]
impl TabHost for FakeHost {
    async fn query_tabs(&self, query: TabQuery) -> HostResult<Vec<Tab>> {
        self.call().await;
        if self.failing(Failure::Query) {
            return Err(HostError::Rejected("query failed".to_string()));
        }

        let state = self.state.borrow();
        let window = match query {
            TabQuery::All => None,
            TabQuery::Window(window_id) => Some(window_id),
            TabQuery::CurrentWindow => state.current_window,
        };
        Ok(state
            .tabs
            .iter()
            .filter(|t| window.is_none_or(|w| t.window_id == w))
            .cloned()
            .collect())
    }

    async fn query_windows(&self) -> HostResult<Vec<WindowSnapshot>> {
        self.call().await;
        if self.failing(Failure::Query) {
            return Err(HostError::Rejected("query failed".to_string()));
        }

        let state = self.state.borrow();
        let mut windows: Vec<WindowSnapshot> = Vec::new();
        for tab in &state.tabs {
            match windows.iter_mut().find(|w| w.id == tab.window_id) {
                Some(window) => window.tabs.push(tab.clone()),
                None => windows.push(WindowSnapshot {
                    id: tab.window_id,
                    tabs: vec![tab.clone()],
                }),
            }
        }
        Ok(windows)
    }

    async fn get_group(&self, group_id: GroupId) -> HostResult<TabGroup> {
        self.call().await;
        self.record(Command::GetGroup(group_id));
        self.group(group_id).ok_or(HostError::GroupNotFound(group_id))
    }

    async fn group_tabs(&self, tab_ids: &[TabId], group_id: Option<GroupId>) -> HostResult<GroupId> {
        self.call().await;
        self.record(Command::Group {
            tabs: tab_ids.to_vec(),
            group: group_id,
        });

        let failure = if group_id.is_some() { Failure::Append } else { Failure::Create };
        if self.failing(failure) {
            return Err(HostError::Rejected("grouping failed".to_string()));
        }

        let mut state = self.state.borrow_mut();
        let first = tab_ids
            .first()
            .and_then(|id| state.tabs.iter().find(|t| t.id == *id))
            .ok_or_else(|| HostError::Rejected("no such tab".to_string()))?;
        let window_id = first.window_id;

        let target = match group_id {
            Some(existing) => {
                if !state.groups.contains_key(&existing) {
                    return Err(HostError::GroupNotFound(existing));
                }
                existing
            }
            None => {
                let id = GroupId(state.next_group);
                state.next_group += 1;
                state.groups.insert(
                    id,
                    TabGroup {
                        id,
                        window_id,
                        title: String::new(),
                        color: GroupColor::Grey,
                    },
                );
                id
            }
        };

        for tab in state.tabs.iter_mut().filter(|t| tab_ids.contains(&t.id)) {
            tab.group_id = Some(target);
        }
        state.prune_empty_groups();
        Ok(target)
    }

    async fn update_group(&self, group_id: GroupId, title: &str, color: GroupColor) -> HostResult<()> {
        self.call().await;
        self.record(Command::Update {
            group: group_id,
            title: title.to_string(),
            color,
        });
        if self.failing(Failure::Update) {
            return Err(HostError::Rejected("update failed".to_string()));
        }

        let mut state = self.state.borrow_mut();
        let group = state
            .groups
            .get_mut(&group_id)
            .ok_or(HostError::GroupNotFound(group_id))?;
        group.title = title.to_string();
        group.color = color;
        Ok(())
    }

    async fn ungroup_tabs(&self, tab_ids: &[TabId]) -> HostResult<()> {
        self.call().await;
        self.record(Command::Ungroup(tab_ids.to_vec()));
        if self.failing(Failure::Ungroup) {
            return Err(HostError::Rejected("ungroup failed".to_string()));
        }

        let mut state = self.state.borrow_mut();
        for tab in state.tabs.iter_mut().filter(|t| tab_ids.contains(&t.id)) {
            tab.group_id = None;
        }
        state.prune_empty_groups();
        Ok(())
    }

    async fn set_muted(&self, tab_id: TabId, muted: bool) -> HostResult<()> {
        self.call().await;
        self.record(Command::SetMuted(tab_id, muted));
        if self.failing(Failure::Mute(tab_id)) {
            return Err(HostError::Rejected(format!("cannot mute tab {}", tab_id)));
        }

        let mut state = self.state.borrow_mut();
        let tab = state
            .tabs
            .iter_mut()
            .find(|t| t.id == tab_id)
            .ok_or_else(|| HostError::Rejected("no such tab".to_string()))?;
        tab.muted_info = Some(MutedInfo { muted });
        Ok(())
    }

    async fn remove_tabs(&self, tab_ids: &[TabId]) -> HostResult<()> {
        self.call().await;
        self.record(Command::Remove(tab_ids.to_vec()));
        if self.failing(Failure::Remove) {
            return Err(HostError::Rejected("remove failed".to_string()));
        }

        let mut state = self.state.borrow_mut();
        state.tabs.retain(|t| !tab_ids.contains(&t.id));
        state.prune_empty_groups();
        Ok(())
    }

    async fn activate_tab(&self, tab_id: TabId) -> HostResult<()> {
        self.call().await;
        self.tab(tab_id)
            .map(|_| ())
            .ok_or_else(|| HostError::Rejected(format!("no tab {}", tab_id)))
    }
}

/// Returns `Pending` exactly once
struct YieldNow(bool);

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}
