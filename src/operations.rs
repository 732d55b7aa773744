/// Bulk tab operations triggered from the popup: dedupe, ungroup, mute,
/// group-by-domain and group-by-category sweeps

use crate::category::classify_categories;
use crate::domain::classify_domain;
use crate::group_store::{ColorCursor, SharedGroupStore};
use crate::host::{HostError, TabHost, TabQuery};
use crate::tab_data::{GroupColor, GroupId, Tab, TabId, WindowId, WindowSnapshot};
use futures::future::join_all;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// A bulk action requested by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum BulkCommand {
    Deduplicate,
    UngroupAll,
    MuteAll,
    UnmuteAll,
    GroupByDomain,
    GroupByCategory,
}

/// Result of a bulk action, reported once every sub-operation finished
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSummary {
    pub action: BulkCommand,
    pub count: usize,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl BulkSummary {
    fn ok(action: BulkCommand, count: usize) -> BulkSummary {
        BulkSummary {
            action,
            count,
            errors: Vec::new(),
        }
    }

    fn failed(action: BulkCommand, error: HostError) -> BulkSummary {
        BulkSummary {
            action,
            count: 0,
            errors: vec![error.to_string()],
        }
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// User-facing one-line result
    pub fn message(&self) -> String {
        let done = match self.action {
            BulkCommand::Deduplicate => format!("Closed {} duplicate tabs", self.count),
            BulkCommand::UngroupAll => format!("Ungrouped {} tabs", self.count),
            BulkCommand::MuteAll => format!("Muted {} tabs", self.count),
            BulkCommand::UnmuteAll => format!("Unmuted {} tabs", self.count),
            BulkCommand::GroupByDomain | BulkCommand::GroupByCategory => {
                format!("Created {} groups", self.count)
            }
        };

        match self.errors.len() {
            0 => done,
            1 => format!("{} (error: {})", done, self.errors[0]),
            n => format!("{} ({} errors, first: {})", done, n, self.errors[0]),
        }
    }
}

/// One group a sweep is about to create
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedGroup {
    pub window_id: WindowId,
    pub title: String,
    pub color: GroupColor,
    pub tabs: Vec<TabId>,
}

/// Tabs to close so that every URL (ignoring `#fragment`) stays open once
pub fn find_duplicate_tabs(tabs: &[Tab]) -> Vec<TabId> {
    let mut seen_urls = HashSet::new();
    let mut remove_ids = Vec::new();

    for tab in tabs {
        let Some(url) = tab.url() else { continue };
        let key = url.split('#').next().unwrap_or(url);
        if !seen_urls.insert(key) {
            remove_ids.push(tab.id);
        }
    }

    remove_ids
}

/// Bucket tabs by domain label, buckets in first-seen order
pub fn bucket_by_domain(tabs: &[Tab]) -> Vec<(String, Vec<TabId>)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<(String, Vec<TabId>)> = Vec::new();

    for tab in tabs {
        let Some(label) = tab.url().and_then(classify_domain) else {
            continue;
        };
        match index.get(&label) {
            Some(&slot) => buckets[slot].1.push(tab.id),
            None => {
                index.insert(label.clone(), buckets.len());
                buckets.push((label, vec![tab.id]));
            }
        }
    }

    buckets
}

/// Bucket tabs by category; a tab lands in every category it matches
pub fn bucket_by_category(tabs: &[Tab]) -> Vec<(&'static str, GroupColor, Vec<TabId>)> {
    let mut buckets: Vec<(&'static str, GroupColor, Vec<TabId>)> = Vec::new();

    for tab in tabs {
        let Some(url) = tab.url() else { continue };
        for rule in classify_categories(url) {
            match buckets.iter_mut().find(|(name, _, _)| *name == rule.name) {
                Some((_, _, ids)) => ids.push(tab.id),
                None => buckets.push((rule.name, rule.color, vec![tab.id])),
            }
        }
    }

    buckets
}

/// Domain groups for one window; colors restart at the top of the palette
pub fn plan_domain_groups(window: &WindowSnapshot) -> Vec<PlannedGroup> {
    let mut cursor = ColorCursor::new();
    bucket_by_domain(&window.tabs)
        .into_iter()
        .filter(|(_, tabs)| tabs.len() > 1)
        .map(|(title, tabs)| PlannedGroup {
            window_id: window.id,
            title,
            color: cursor.advance(),
            tabs,
        })
        .collect()
}

/// Category groups for one window, each with its category's color
pub fn plan_category_groups(window: &WindowSnapshot) -> Vec<PlannedGroup> {
    bucket_by_category(&window.tabs)
        .into_iter()
        .filter(|(_, _, tabs)| tabs.len() > 1)
        .map(|(name, color, tabs)| PlannedGroup {
            window_id: window.id,
            title: name.to_string(),
            color,
            tabs,
        })
        .collect()
}

/// Runs bulk actions against the host
pub struct BulkActions<H: TabHost> {
    host: Rc<H>,
    store: SharedGroupStore,
}

impl<H: TabHost> BulkActions<H> {
    pub fn new(host: Rc<H>, store: SharedGroupStore) -> Self {
        BulkActions { host, store }
    }

    pub async fn run(&self, command: BulkCommand) -> BulkSummary {
        let summary = match command {
            BulkCommand::Deduplicate => match self.deduplicate().await {
                Ok(count) => BulkSummary::ok(command, count),
                Err(err) => BulkSummary::failed(command, err),
            },
            BulkCommand::UngroupAll => match self.ungroup_all().await {
                Ok(count) => BulkSummary::ok(command, count),
                Err(err) => BulkSummary::failed(command, err),
            },
            BulkCommand::MuteAll => self.set_muted_all(true).await,
            BulkCommand::UnmuteAll => self.set_muted_all(false).await,
            BulkCommand::GroupByDomain => self.group_by_domain().await,
            BulkCommand::GroupByCategory => self.group_by_category().await,
        };

        info!("{:?}: {}", command, summary.message());
        summary
    }

    /// Close every tab whose URL (ignoring `#fragment`) is already open
    pub async fn deduplicate(&self) -> Result<usize, HostError> {
        let tabs = self.host.query_tabs(TabQuery::All).await?;
        let remove_ids = find_duplicate_tabs(&tabs);

        if remove_ids.is_empty() {
            info!("No duplicate tabs found to close");
            return Ok(0);
        }

        self.host.remove_tabs(&remove_ids).await?;
        Ok(remove_ids.len())
    }

    /// Take every tab in every window out of its group
    pub async fn ungroup_all(&self) -> Result<usize, HostError> {
        let tabs = self.host.query_tabs(TabQuery::All).await?;
        let tab_ids: Vec<TabId> = tabs.iter().map(|t| t.id).collect();

        if tab_ids.is_empty() {
            return Ok(0);
        }

        self.host.ungroup_tabs(&tab_ids).await?;
        Ok(tab_ids.len())
    }

    /// Mute or unmute the current window; tabs already in that state are
    /// left alone
    pub async fn set_muted_all(&self, muted: bool) -> BulkSummary {
        let command = if muted { BulkCommand::MuteAll } else { BulkCommand::UnmuteAll };

        let tabs = match self.host.query_tabs(TabQuery::CurrentWindow).await {
            Ok(tabs) => tabs,
            Err(err) => return BulkSummary::failed(command, err),
        };

        let results = join_all(
            tabs.iter()
                .filter(|tab| tab.is_muted() != muted)
                .map(|tab| self.host.set_muted(tab.id, muted)),
        )
        .await;

        collect_results(command, results)
    }

    /// Group every window's tabs by domain label
    pub async fn group_by_domain(&self) -> BulkSummary {
        let command = BulkCommand::GroupByDomain;
        let windows = match self.host.query_windows().await {
            Ok(windows) => windows,
            Err(err) => return BulkSummary::failed(command, err),
        };

        let per_window = join_all(windows.iter().map(|window| async move {
            let plans = plan_domain_groups(window);
            join_all(plans.into_iter().map(|plan| async move {
                let created = self.create_planned_group(&plan).await;
                if let Ok(group_id) = created {
                    self.store
                        .borrow_mut()
                        .set(plan.window_id, &plan.title, group_id);
                }
                created
            }))
            .await
        }))
        .await;

        collect_results(command, per_window.into_iter().flatten().collect())
    }

    /// Group every window's tabs by content category
    pub async fn group_by_category(&self) -> BulkSummary {
        let command = BulkCommand::GroupByCategory;
        let windows = match self.host.query_windows().await {
            Ok(windows) => windows,
            Err(err) => return BulkSummary::failed(command, err),
        };

        let per_window = join_all(windows.iter().map(|window| async move {
            let plans = plan_category_groups(window);
            join_all(plans.iter().map(|plan| self.create_planned_group(plan))).await
        }))
        .await;

        collect_results(command, per_window.into_iter().flatten().collect())
    }

    async fn create_planned_group(&self, plan: &PlannedGroup) -> Result<GroupId, HostError> {
        let group_id = self
            .host
            .group_tabs(&plan.tabs, None)
            .await
            .inspect_err(|err| error!("Error grouping tabs as {}: {}", plan.title, err))?;

        if let Err(err) = self.host.update_group(group_id, &plan.title, plan.color).await {
            warn!("Error naming group {}: {}", group_id, err);
        } else {
            info!(
                "Grouped tabs in window {} with groupId: {}, name: {}, color: {}",
                plan.window_id, group_id, plan.title, plan.color
            );
        }

        Ok(group_id)
    }
}

fn collect_results<T>(command: BulkCommand, results: Vec<Result<T, HostError>>) -> BulkSummary {
    let mut summary = BulkSummary::ok(command, 0);
    for result in results {
        match result {
            Ok(_) => summary.count += 1,
            Err(err) => summary.errors.push(err.to_string()),
        }
    }
    summary
}
