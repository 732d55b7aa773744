/// Tab search for the popup: filter, highlight, keyboard selection
use crate::tab_data::{Tab, TabId};

/// A tab that matched the query
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub tab_id: TabId,
    pub title: String,
    pub url: String,
}

/// A run of text, marked if it matched the query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub matched: bool,
}

/// Tabs whose title or URL contains `query`, case-insensitively, in tab
/// order. An empty query matches every tab.
pub fn search_tabs(query: &str, tabs: &[Tab]) -> Vec<SearchHit> {
    let needle = query.trim().to_lowercase();

    tabs.iter()
        .filter(|tab| {
            needle.is_empty()
                || tab.title.to_lowercase().contains(&needle)
                || tab.url().is_some_and(|url| url.to_lowercase().contains(&needle))
        })
        .map(|tab| SearchHit {
            tab_id: tab.id,
            title: tab.title.clone(),
            url: tab.url().unwrap_or_default().to_string(),
        })
        .collect()
}

/// The hits the popup lists and navigates: none until the user has typed
/// something, even though an empty query matches every tab
pub fn shown_hits(query: &str, tabs: &[Tab]) -> Vec<SearchHit> {
    if query.trim().is_empty() {
        return Vec::new();
    }
    search_tabs(query, tabs)
}

/// Split `text` into matched and unmatched runs
pub fn highlight(text: &str, query: &str) -> Vec<Segment> {
    let needle: Vec<char> = query.trim().chars().flat_map(char::to_lowercase).collect();
    if needle.is_empty() {
        return plain(text);
    }

    // Compare char by char so byte offsets stay valid in the original text
    // even when lower-casing changes a character's length.
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut segments = Vec::new();
    let mut run_start = 0;
    let mut i = 0;

    while i < chars.len() {
        match match_len(&chars[i..], &needle) {
            Some(len) => {
                let start = chars[i].0;
                let end = chars.get(i + len).map_or(text.len(), |(offset, _)| *offset);
                if run_start < start {
                    segments.push(Segment {
                        text: text[run_start..start].to_string(),
                        matched: false,
                    });
                }
                segments.push(Segment {
                    text: text[start..end].to_string(),
                    matched: true,
                });
                run_start = end;
                i += len;
            }
            None => i += 1,
        }
    }

    if run_start < text.len() {
        segments.push(Segment {
            text: text[run_start..].to_string(),
            matched: false,
        });
    }

    segments
}

/// Number of chars of `haystack` matching `needle` at its start
fn match_len(haystack: &[(usize, char)], needle: &[char]) -> Option<usize> {
    let mut lowered = haystack
        .iter()
        .enumerate()
        .flat_map(|(n, (_, c))| c.to_lowercase().map(move |lc| (n, lc)));

    let mut last = 0;
    for expected in needle {
        let (n, actual) = lowered.next()?;
        if actual != *expected {
            return None;
        }
        last = n;
    }

    // a partial match of a multi-char lowercase expansion does not count
    match lowered.next() {
        Some((n, _)) if n == last => None,
        _ => Some(last + 1),
    }
}

fn plain(text: &str) -> Vec<Segment> {
    if text.is_empty() {
        Vec::new()
    } else {
        vec![Segment {
            text: text.to_string(),
            matched: false,
        }]
    }
}

/// Keyboard selection over a hit list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchCursor {
    selected: Option<usize>,
    len: usize,
}

impl SearchCursor {
    #[cfg(test)]
    pub fn new(len: usize) -> Self {
        SearchCursor { selected: None, len }
    }

    /// New result list: drop the selection if it fell off the end
    pub fn reset(&mut self, len: usize) {
        self.len = len;
        self.selected = self.selected.filter(|&index| index < len);
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Move down, wrapping to the top
    pub fn down(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        self.selected = Some(match self.selected {
            Some(index) => (index + 1) % self.len,
            None => 0,
        });
        self.selected
    }

    /// Move up, wrapping to the bottom
    pub fn up(&mut self) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        self.selected = Some(match self.selected {
            Some(0) | None => self.len - 1,
            Some(index) => index - 1,
        });
        self.selected
    }
}
