/// Content categories: keyword rules over the full URL
use crate::tab_data::GroupColor;
use regex::Regex;
use std::sync::LazyLock;

/// A named category with a fixed group color
#[derive(Debug)]
pub struct CategoryRule {
    pub name: &'static str,
    pub color: GroupColor,
    pattern: Regex,
}

impl CategoryRule {
    fn new(name: &'static str, color: GroupColor, pattern: &str) -> CategoryRule {
        CategoryRule {
            name,
            color,
            // Patterns are literals in this file; a bad one is a programming error.
            pattern: Regex::new(pattern).expect("category pattern must compile"),
        }
    }

    /// `url` must already be lower-cased
    pub fn matches(&self, url: &str) -> bool {
        self.pattern.is_match(url)
    }
}

static CATEGORY_RULES: LazyLock<Vec<CategoryRule>> = LazyLock::new(|| {
    vec![
        CategoryRule::new("Social", GroupColor::Pink, r"facebook|twitter|instagram|linkedin|reddit|tiktok"),
        CategoryRule::new("Work", GroupColor::Blue, r"office|slack|teams|zoom|asana|notion|trello|work|jira"),
        CategoryRule::new("Shopping", GroupColor::Yellow, r"amazon|ebay|flipkart|shop|cart|walmart|aliexpress"),
        CategoryRule::new("News", GroupColor::Green, r"news|cnn|bbc|nytimes|guardian|reuters"),
        CategoryRule::new("Video", GroupColor::Purple, r"youtube|netflix|primevideo|hulu|hotstar|vimeo|twitch"),
        CategoryRule::new("Mail", GroupColor::Red, r"mail\.google|outlook|mail\.yahoo|protonmail|zoho"),
        CategoryRule::new("Docs", GroupColor::Cyan, r"docs\.google|drive\.google|dropbox|onedrive"),
    ]
});

/// All category rules in table order
pub fn category_rules() -> &'static [CategoryRule] {
    &CATEGORY_RULES
}

/// Every category whose rule matches the URL, in table order
///
/// Categories are not exclusive: a URL can land in several of them.
pub fn classify_categories(url: &str) -> Vec<&'static CategoryRule> {
    let url = url.to_lowercase();
    category_rules()
        .iter()
        .filter(|rule| rule.matches(&url))
        .collect()
}
