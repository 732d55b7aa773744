/// Domain classification: URL -> group label
use url::Url;

/// Schemes that belong to the browser itself and are never grouped
const INTERNAL_SCHEMES: &[&str] = &[
    "chrome",
    "chrome-extension",
    "chrome-search",
    "devtools",
    "edge",
    "about",
];

/// Subdomain prefixes of the multi-service provider, first match wins
const GOOGLE_SERVICES: &[(&str, &str)] = &[
    ("mail.", "Gmail"),
    ("drive.", "Google Drive"),
    ("docs.", "Google Docs"),
    ("sheets.", "Google Sheets"),
    ("slides.", "Google Slides"),
    ("calendar.", "Google Calendar"),
    ("meet.", "Google Meet"),
    ("chat.", "Google Chat"),
    ("photos.", "Google Photos"),
    ("keep.", "Google Keep"),
];

/// A single-label provider matched against the hostname
struct ProviderRule {
    needles: &'static [&'static str],
    label: &'static str,
}

/// Order is significant: the first rule with a matching needle wins.
const PROVIDERS: &[ProviderRule] = &[
    ProviderRule { needles: &["youtube"], label: "YouTube" },
    ProviderRule { needles: &["github"], label: "GitHub" },
    ProviderRule { needles: &["microsoft", "office", "live.com"], label: "Microsoft" },
    ProviderRule { needles: &["amazon"], label: "Amazon" },
    ProviderRule { needles: &["facebook", "fb.com", "messenger"], label: "Facebook" },
    ProviderRule { needles: &["twitter", "x.com"], label: "Twitter" },
    ProviderRule { needles: &["instagram"], label: "Instagram" },
    ProviderRule { needles: &["linkedin"], label: "LinkedIn" },
    ProviderRule { needles: &["reddit"], label: "Reddit" },
];

/// True for the browser's own pages and blank pages
pub fn is_internal_url(url: &str) -> bool {
    let url = url.trim();
    if url.is_empty() || url.eq_ignore_ascii_case("about:blank") {
        return true;
    }

    match url.split_once(':') {
        Some((scheme, _)) => INTERNAL_SCHEMES
            .iter()
            .any(|internal| scheme.eq_ignore_ascii_case(internal)),
        None => false,
    }
}

/// Extract the lower-cased hostname from a URL
pub fn hostname(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?;

    if host.is_empty() {
        None
    } else {
        Some(host.to_lowercase())
    }
}

/// Classify a URL into a group label
///
/// Algorithm (first match wins):
/// 1. Internal/blank pages and unparsable URLs -> `None`
/// 2. Google services by subdomain prefix, falling back to "Google"
/// 3. Well-known single-label providers (YouTube, GitHub, ...)
/// 4. Generic: strip `www.`, take the second-to-last host label and
///    capitalize it
///
/// Examples:
/// - https://mail.google.com/mail/u/0 -> Gmail
/// - https://a.github.com/x -> GitHub
/// - https://sub.example.com -> Example
/// - https://example.co.uk -> Co (multi-label TLDs are not special-cased)
pub fn classify_domain(url: &str) -> Option<String> {
    if is_internal_url(url) {
        return None;
    }

    let host = hostname(url)?;

    if host.contains("google") {
        let label = GOOGLE_SERVICES
            .iter()
            .find(|(prefix, _)| host.starts_with(prefix))
            .map_or("Google", |(_, label)| label);
        return Some(label.to_string());
    }

    if let Some(rule) = PROVIDERS
        .iter()
        .find(|rule| rule.needles.iter().any(|needle| host.contains(needle)))
    {
        return Some(rule.label.to_string());
    }

    generic_label(&host)
}

fn generic_label(host: &str) -> Option<String> {
    let host = host.strip_prefix("www.").unwrap_or(host);
    let parts: Vec<&str> = host.split('.').collect();

    let label = if parts.len() >= 2 {
        capitalize(parts[parts.len() - 2])
    } else {
        host.to_string()
    };

    if label.is_empty() { None } else { Some(label) }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
