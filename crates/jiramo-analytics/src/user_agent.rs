//! Coarse browser / OS / device labels from a user-agent string

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgentInfo {
    pub browser: String,
    pub os: String,
    pub device: String,
}

/// A label that applies when the lowercased UA contains any of `any` and none of `none`.
struct Rule {
    any: &'static [&'static str],
    none: &'static [&'static str],
    label: &'static str,
}

impl Rule {
    const fn new(any: &'static [&'static str], label: &'static str) -> Self {
        Self {
            any,
            none: &[],
            label,
        }
    }

    const fn unless(mut self, none: &'static [&'static str]) -> Self {
        self.none = none;
        self
    }

    fn matches(&self, ua: &str) -> bool {
        self.any.iter().any(|needle| ua.contains(needle))
            && !self.none.iter().any(|needle| ua.contains(needle))
    }
}

// Order matters: the first matching rule wins.
const DEVICE_RULES: &[Rule] = &[
    Rule::new(&["mobile"], "mobile"),
    Rule::new(&["tablet", "ipad"], "tablet"),
];

const OS_RULES: &[Rule] = &[
    Rule::new(&["windows"], "Windows"),
    Rule::new(&["mac os", "macos"], "macOS"),
    Rule::new(&["iphone", "ipad"], "iOS"),
    Rule::new(&["android"], "Android"),
    Rule::new(&["linux"], "Linux"),
];

const BROWSER_RULES: &[Rule] = &[
    Rule::new(&["edg/", "edge/"], "Edge"),
    Rule::new(&["opr/", "opera"], "Opera"),
    Rule::new(&["firefox"], "Firefox"),
    Rule::new(&["chrome"], "Chrome").unless(&["chromium"]),
    Rule::new(&["safari"], "Safari").unless(&["chrome"]),
    Rule::new(&["chromium"], "Chromium"),
];

fn first_match(rules: &[Rule], ua: &str, fallback: &'static str) -> String {
    rules
        .iter()
        .find(|rule| rule.matches(ua))
        .map_or(fallback, |rule| rule.label)
        .to_string()
}

/// Classify a raw user-agent header. Never fails; unknown agents get fallback labels.
pub fn classify(user_agent: &str) -> UserAgentInfo {
    let ua = user_agent.to_lowercase();

    UserAgentInfo {
        browser: first_match(BROWSER_RULES, &ua, "Other"),
        os: first_match(OS_RULES, &ua, "Other"),
        device: first_match(DEVICE_RULES, &ua, "desktop"),
    }
}
