/// Popup UI for Tab Herder extension

use yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use patternfly_yew::prelude::*;
use crate::chrome::{self, ChromeHost};
use crate::host::{TabHost, TabQuery};
use crate::operations::{BulkCommand, BulkSummary};
use crate::search::{SearchCursor, SearchHit, highlight, shown_hits};
use crate::storage::{AUTO_GROUPING_KEY, DARK_MODE_KEY, Settings};
use crate::tab_data::{Tab, TabId};

#[derive(Clone, PartialEq)]
enum AppState {
    Idle,
    Loading(String),
    Done(BulkSummary),
    Error(String),
}

#[function_component(App)]
pub fn app() -> Html {
    let state = use_state(|| AppState::Idle);
    let settings = use_state(Settings::default);
    let tabs = use_state(Vec::<Tab>::new);
    let query = use_state(String::new);
    let cursor = use_state(SearchCursor::default);

    // Load settings and tabs on mount
    {
        let settings = settings.clone();
        let tabs = tabs.clone();
        let state = state.clone();
        use_effect_with((), move |_| {
            spawn_local(async move {
                match chrome::load_settings().await {
                    Ok(loaded) => settings.set(loaded),
                    Err(e) => state.set(AppState::Error(format!("Failed to load settings: {}", e))),
                }
                refresh_tabs(tabs).await;
            });
            || ()
        });
    }

    // Keep the counter current while the popup is open
    {
        let tabs = tabs.clone();
        use_effect_with((), move |_| {
            let watch = chrome::watch_tabs(move || {
                spawn_local(refresh_tabs(tabs.clone()));
            });
            move || drop(watch)
        });
    }

    let hits: Vec<SearchHit> = shown_hits(&query, &tabs);

    // Settings toggles
    let on_toggle = {
        let settings = settings.clone();
        let state = state.clone();
        move |key: &'static str| {
            let settings = settings.clone();
            let state = state.clone();
            Callback::from(move |e: Event| {
                let Some(input) = e.target_dyn_into::<HtmlInputElement>() else { return };
                let checked = input.checked();

                let mut updated = *settings;
                if key == AUTO_GROUPING_KEY {
                    updated.auto_grouping_enabled = checked;
                } else {
                    updated.dark_mode = checked;
                }
                settings.set(updated);

                let state = state.clone();
                spawn_local(async move {
                    if let Err(e) = chrome::save_setting(key, checked).await {
                        state.set(AppState::Error(format!("Failed to save setting: {}", e)));
                    }
                });
            })
        }
    };

    // Bulk action handlers
    let on_bulk = {
        let state = state.clone();
        let tabs = tabs.clone();
        move |command: BulkCommand, message: &'static str| {
            let state = state.clone();
            let tabs = tabs.clone();
            Callback::from(move |_| {
                let state = state.clone();
                let tabs = tabs.clone();
                state.set(AppState::Loading(message.to_string()));

                spawn_local(async move {
                    match chrome::send_bulk_command(command).await {
                        Ok(summary) => state.set(AppState::Done(summary)),
                        Err(e) => state.set(AppState::Error(format!("{} failed: {}", message, e))),
                    }
                    refresh_tabs(tabs).await;
                });
            })
        }
    };

    // Search handlers
    let on_search_input = {
        let query = query.clone();
        let cursor = cursor.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                query.set(input.value());
                cursor.set(SearchCursor::default());
            }
        })
    };

    let on_search_key = {
        let cursor = cursor.clone();
        let hit_ids: Vec<TabId> = hits.iter().map(|hit| hit.tab_id).collect();
        Callback::from(move |e: KeyboardEvent| {
            if hit_ids.is_empty() {
                return;
            }
            let mut next = *cursor;
            next.reset(hit_ids.len());
            match e.key().as_str() {
                "ArrowDown" => {
                    e.prevent_default();
                    next.down();
                }
                "ArrowUp" => {
                    e.prevent_default();
                    next.up();
                }
                "Enter" => {
                    if let Some(tab_id) = next.selected().and_then(|index| hit_ids.get(index)) {
                        activate(*tab_id);
                    }
                }
                _ => {}
            }
            cursor.set(next);
        })
    };

    let is_busy = matches!(*state, AppState::Loading(_));
    let selected = cursor.selected();

    html! {
        <div class={classes!("padding-20", settings.dark_mode.then_some("dark-mode"))}>
            <h1 class="popup-title">{"Tab Herder"}</h1>
            <p class="tab-counter">{format!("{} open tabs", tabs.len())}</p>

            // Settings
            <div class="flex-column-gap">
                <label class="toggle-row">
                    <input
                        type="checkbox"
                        checked={settings.auto_grouping_enabled}
                        onchange={on_toggle(AUTO_GROUPING_KEY)}
                    />
                    {" Auto-group tabs by domain"}
                </label>
                <label class="toggle-row">
                    <input
                        type="checkbox"
                        checked={settings.dark_mode}
                        onchange={on_toggle(DARK_MODE_KEY)}
                    />
                    {" Dark mode"}
                </label>
            </div>

            // Status display
            {match &*state {
                AppState::Loading(msg) => html! {
                    <div class="loading-text-center">
                        <Spinner />
                        <p class="loading-text">{msg}</p>
                    </div>
                },
                AppState::Done(summary) if summary.is_success() => html! {
                    <div class="message-top-margin">
                        <Alert r#type={AlertType::Success} title={summary.message()} inline={true}>
                        </Alert>
                    </div>
                },
                AppState::Done(summary) => html! {
                    <div class="message-top-margin">
                        <Alert r#type={AlertType::Warning} title={summary.message()} inline={true}>
                        </Alert>
                    </div>
                },
                AppState::Error(err) => html! {
                    <div class="message-top-margin">
                        <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                            {err.clone()}
                        </Alert>
                    </div>
                },
                AppState::Idle => html! {}
            }}

            // Bulk actions
            <div class="flex-column-gap">
                <Button onclick={on_bulk(BulkCommand::GroupByDomain, "Grouping by domain...")} disabled={is_busy} variant={ButtonVariant::Secondary} block={true}>
                    {"Group Tabs by Domain"}
                </Button>
                <Button onclick={on_bulk(BulkCommand::GroupByCategory, "Grouping by category...")} disabled={is_busy} variant={ButtonVariant::Secondary} block={true}>
                    {"Group Tabs by Category"}
                </Button>
                <Button onclick={on_bulk(BulkCommand::UngroupAll, "Ungrouping tabs...")} disabled={is_busy} variant={ButtonVariant::Secondary} block={true}>
                    {"Ungroup All Tabs"}
                </Button>
                <Button onclick={on_bulk(BulkCommand::Deduplicate, "Closing duplicates...")} disabled={is_busy} variant={ButtonVariant::Secondary} block={true}>
                    {"Close Duplicate Tabs"}
                </Button>
                <Button onclick={on_bulk(BulkCommand::MuteAll, "Muting tabs...")} disabled={is_busy} variant={ButtonVariant::Secondary} block={true}>
                    {"Mute All Tabs"}
                </Button>
                <Button onclick={on_bulk(BulkCommand::UnmuteAll, "Unmuting tabs...")} disabled={is_busy} variant={ButtonVariant::Secondary} block={true}>
                    {"Unmute All Tabs"}
                </Button>
            </div>

            // Search
            <div class="search-container">
                <input
                    class="search-input"
                    type="search"
                    placeholder="Search tabs..."
                    value={(*query).clone()}
                    oninput={on_search_input}
                    onkeydown={on_search_key}
                />
                if !hits.is_empty() {
                    <ul class="search-results">
                        {for hits.iter().enumerate().map(|(index, hit)| {
                            let tab_id = hit.tab_id;
                            let onclick = Callback::from(move |_: MouseEvent| activate(tab_id));
                            let class = if selected == Some(index) { "search-hit selected" } else { "search-hit" };
                            html! {
                                <li key={tab_id.0} class={class} onclick={onclick}>
                                    <div class="search-hit-title">{render_segments(&hit.title, &query)}</div>
                                    <div class="search-hit-url">{render_segments(&hit.url, &query)}</div>
                                </li>
                            }
                        })}
                    </ul>
                }
            </div>

            <p class="footer-popup">
                {"Tab Herder v0.1.0"}
            </p>
        </div>
    }
}

// Helper functions

fn render_segments(text: &str, query: &str) -> Html {
    highlight(text, query)
        .into_iter()
        .map(|segment| {
            if segment.matched {
                html! { <mark>{segment.text}</mark> }
            } else {
                html! { <span>{segment.text}</span> }
            }
        })
        .collect::<Html>()
}

async fn refresh_tabs(tabs: UseStateHandle<Vec<Tab>>) {
    match ChromeHost.query_tabs(TabQuery::All).await {
        Ok(all) => tabs.set(all),
        Err(e) => log::warn!("Failed to get tabs: {}", e),
    }
}

fn activate(tab_id: TabId) {
    spawn_local(async move {
        if let Err(e) = ChromeHost.activate_tab(tab_id).await {
            log::warn!("Failed to activate tab {}: {}", tab_id, e);
        }
    });
}
