/// Incremental auto-grouping driven by tab lifecycle events
///
/// Each qualifying event walks `Classify -> Lookup -> Append`, or
/// `CollectCandidates -> Create` when no live group exists for the label.
/// Host failures never escape: they are logged, the store is corrected, and
/// the decision is reported as a `GroupOutcome`.
///
/// Handlers are not serialised. Two events for the same label that overlap
/// at the host can both decide to create a group; the later record wins and
/// the host drops the emptied group. That duplicate work is accepted.
use crate::domain::{classify_domain, is_internal_url};
use crate::group_store::SharedGroupStore;
use crate::host::{HostError, TabHost, TabQuery};
use crate::tab_data::{GroupColor, GroupId, Tab, TabChange, TabId, TabStatus, WindowId};
use log::{debug, error, info, warn};
use std::cell::Cell;
use std::rc::Rc;

/// Why an event did not reach the grouping logic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    NoUrl,
    NotLoaded,
    InternalUrl,
    Unclassifiable,
}

/// What a single event did
#[derive(Debug, Clone, PartialEq)]
pub enum GroupOutcome {
    Skipped(SkipReason),
    Appended {
        label: String,
        group: GroupId,
    },
    Created {
        label: String,
        group: GroupId,
        tabs: Vec<TabId>,
        color: GroupColor,
    },
    NotEnoughTabs {
        label: String,
        count: usize,
    },
    Failed {
        label: String,
        error: HostError,
    },
}

pub struct GroupingReconciler<H: TabHost> {
    host: Rc<H>,
    store: SharedGroupStore,
    enabled: Cell<bool>,
}

impl<H: TabHost> GroupingReconciler<H> {
    pub fn new(host: Rc<H>, store: SharedGroupStore) -> Self {
        GroupingReconciler {
            host,
            store,
            enabled: Cell::new(true),
        }
    }

    pub fn set_auto_grouping(&self, enabled: bool) {
        if self.enabled.replace(enabled) != enabled {
            info!("Auto-grouping {}", if enabled { "enabled" } else { "disabled" });
        }
    }

    pub fn auto_grouping(&self) -> bool {
        self.enabled.get()
    }

    pub fn store(&self) -> &SharedGroupStore {
        &self.store
    }

    /// A new tab usually has no URL yet; it is grouped on its first
    /// completed update instead.
    pub async fn on_tab_created(&self, tab: &Tab) -> GroupOutcome {
        if !self.auto_grouping() {
            return GroupOutcome::Skipped(SkipReason::Disabled);
        }
        if tab.url().is_none() {
            return GroupOutcome::Skipped(SkipReason::NoUrl);
        }

        self.group_tab(tab).await
    }

    /// Covers both freshly loaded tabs and navigation to a new URL
    pub async fn on_tab_updated(&self, change: &TabChange, tab: &Tab) -> GroupOutcome {
        if !self.auto_grouping() {
            return GroupOutcome::Skipped(SkipReason::Disabled);
        }
        if change.status != Some(TabStatus::Complete) {
            return GroupOutcome::Skipped(SkipReason::NotLoaded);
        }
        if tab.url().is_none() {
            return GroupOutcome::Skipped(SkipReason::NoUrl);
        }

        self.group_tab(tab).await
    }

    pub fn on_window_removed(&self, window_id: WindowId) {
        let dropped = self.store.borrow_mut().drop_window(window_id);
        if dropped > 0 {
            debug!("Window {} closed, forgot {} group(s)", window_id, dropped);
        }
    }

    /// Put one tab into the group for its domain label
    pub async fn group_tab(&self, tab: &Tab) -> GroupOutcome {
        let Some(url) = tab.url() else {
            return GroupOutcome::Skipped(SkipReason::NoUrl);
        };
        if is_internal_url(url) {
            debug!("Skipping internal URL: {}", url);
            return GroupOutcome::Skipped(SkipReason::InternalUrl);
        }
        let Some(label) = classify_domain(url) else {
            debug!("No label for URL: {}", url);
            return GroupOutcome::Skipped(SkipReason::Unclassifiable);
        };
        debug!("Tab {} classified as {}", tab.id, label);

        let window_id = tab.window_id;
        let existing = self.store.borrow().get(window_id, &label);
        if let Some(group_id) = existing {
            match self.append_to_group(tab, &label, group_id).await {
                Ok(()) => {
                    return GroupOutcome::Appended {
                        label,
                        group: group_id,
                    };
                }
                Err(err) => {
                    debug!("Group {} for {} unusable ({}), recreating", group_id, label, err);
                    self.store.borrow_mut().invalidate(window_id, &label);
                }
            }
        }

        self.create_group(tab, label).await
    }

    async fn append_to_group(&self, tab: &Tab, label: &str, group_id: GroupId) -> Result<(), HostError> {
        let group = self.host.get_group(group_id).await?;
        // A group dragged to another window must not pull this tab across
        if group.window_id != tab.window_id {
            debug!("Group {} moved to window {}, treating as stale", group_id, group.window_id);
            return Err(HostError::GroupNotFound(group_id));
        }

        match self.host.group_tabs(&[tab.id], Some(group_id)).await {
            Ok(_) => {
                debug!("Added tab {} to existing group {} ({})", tab.id, group_id, label);
                Ok(())
            }
            Err(err) => {
                warn!("Error adding tab {} to group {}: {}", tab.id, group_id, err);
                Err(err)
            }
        }
    }

    async fn create_group(&self, tab: &Tab, label: String) -> GroupOutcome {
        let window_id = tab.window_id;

        let window_tabs = match self.host.query_tabs(TabQuery::Window(window_id)).await {
            Ok(tabs) => tabs,
            Err(error) => {
                error!("Error listing tabs of window {}: {}", window_id, error);
                return GroupOutcome::Failed { label, error };
            }
        };

        let mut candidates: Vec<TabId> = window_tabs
            .iter()
            .filter(|other| other.id != tab.id)
            .filter(|other| {
                other
                    .url()
                    .and_then(classify_domain)
                    .is_some_and(|other_label| other_label == label)
            })
            .map(|other| other.id)
            .collect();
        candidates.push(tab.id);

        if candidates.len() < 2 {
            debug!("Not enough tabs for {}: {}", label, candidates.len());
            return GroupOutcome::NotEnoughTabs {
                label,
                count: candidates.len(),
            };
        }

        let group_id = match self.host.group_tabs(&candidates, None).await {
            Ok(group_id) => group_id,
            Err(error) => {
                error!("Error creating group for {}: {}", label, error);
                return GroupOutcome::Failed { label, error };
            }
        };

        let color = {
            let mut store = self.store.borrow_mut();
            store.set(window_id, &label, group_id);
            store.next_color()
        };
        info!("Created group {} for {} with {} tabs", group_id, label, candidates.len());

        if let Err(err) = self.host.update_group(group_id, &label, color).await {
            error!("Error updating group {}: {}", group_id, err);
        }

        GroupOutcome::Created {
            label,
            group: group_id,
            tabs: candidates,
            color,
        }
    }
}
