use regex::Regex;

/// Keeps ASCII letters and digits, lowercased.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Exact,
    Wildcard,
    Fuzzy,
}

pub const CHAIN: [Strategy; 3] = [Strategy::Exact, Strategy::Wildcard, Strategy::Fuzzy];

impl Strategy {
    /// `Some(verdict)` when this strategy owns the decision, `None` to defer.
    pub fn decide(self, pattern: &str, key: &str) -> Option<bool> {
        match self {
            Strategy::Exact => (pattern == key).then_some(true),
            Strategy::Wildcard => pattern
                .contains('*')
                .then(|| wildcard_matches(pattern, key)),
            Strategy::Fuzzy => {
                let n_pat = normalize(pattern);
                let n_key = normalize(key);
                if n_pat.is_empty() || n_key.is_empty() {
                    return Some(false);
                }
                Some(n_pat == n_key || n_key.contains(&n_pat) || n_pat.contains(&n_key))
            }
        }
    }
}

pub fn matches(pattern: &str, key: &str) -> bool {
    if pattern.is_empty() || key.is_empty() {
        return false;
    }
    CHAIN
        .iter()
        .find_map(|strategy| strategy.decide(pattern, key))
        .unwrap_or(false)
}

/// Either direction; wildcards may sit on either side.
pub fn matches_either(a: &str, b: &str) -> bool {
    matches(a, b) || matches(b, a)
}

fn wildcard_matches(pattern: &str, key: &str) -> bool {
    let parts: Vec<String> = pattern.split('*').map(normalize).collect();
    let n_key = normalize(key);
    let body = parts
        .iter()
        .map(|part| regex::escape(part))
        .collect::<Vec<_>>()
        .join(".*");
    match Regex::new(&format!("^{body}$")) {
        Ok(re) => re.is_match(&n_key),
        Err(_) => n_key.contains(&parts.concat()),
    }
}
