//! Console settings. Defaults work against a same-origin API; the
//! frontend overrides them from build-time environment.

use serde::{Deserialize, Serialize};

use crate::staging::CommitPolicy;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub api_base: String,
    pub toast_duration_ms: u32,
    pub page_size: usize,
    /// Maximum duties sent per bulk save; `None` sends them all.
    pub commit_cap: Option<usize>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self { api_base: "/api".to_string(), toast_duration_ms: 3000, page_size: 10, commit_cap: None }
    }
}

impl ConsoleConfig {
    /// Applies raw overrides, ignoring blank or unparsable values.
    pub fn with_overrides(
        mut self,
        api_base: Option<&str>,
        toast_duration_ms: Option<&str>,
        page_size: Option<&str>,
        commit_cap: Option<&str>,
    ) -> Self {
        if let Some(base) = api_base.map(str::trim).filter(|b| !b.is_empty()) {
            self.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(ms) = toast_duration_ms.and_then(|v| v.trim().parse().ok()) {
            self.toast_duration_ms = ms;
        }
        if let Some(n) = page_size.and_then(|v| v.trim().parse::<usize>().ok()).filter(|n| *n > 0) {
            self.page_size = n;
        }
        if let Some(cap) = commit_cap.and_then(|v| v.trim().parse::<usize>().ok()) {
            self.commit_cap = (cap > 0).then_some(cap);
        }
        self
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    pub fn commit_policy(&self) -> CommitPolicy {
        CommitPolicy { max_items: self.commit_cap }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ConsoleConfig::default();
        assert_eq!((c.toast_duration_ms, c.page_size, c.commit_cap), (3000, 10, None));
        assert_eq!(c.url("/duty"), "/api/duty");
    }

    #[test]
    fn overrides_skip_garbage() {
        let c = ConsoleConfig::default().with_overrides(
            Some("https://guards.example.org/api/"),
            Some("abc"),
            Some("0"),
            Some("25"),
        );
        assert_eq!(c.url("/team"), "https://guards.example.org/api/team");
        assert_eq!(c.toast_duration_ms, 3000);
        assert_eq!(c.page_size, 10);
        assert_eq!(c.commit_policy().max_items, Some(25));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let c: ConsoleConfig = serde_json::from_str(r#"{"page_size":25}"#).unwrap();
        assert_eq!(c.page_size, 25);
        assert_eq!(c.api_base, "/api");
    }
}
