use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::DetectError;

/// Embedded host rule database.
const EMBEDDED_DB: &str = include_str!("../data/hosts.toml");

/// One step of a host-specific discovery hook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    /// Query a media element with a host-specific selector.
    Selector { selector: String },
    /// Query the generic native selector.
    Native,
    /// Probe the global SDK entry points.
    Sdk,
}

/// Special-cased discovery for a known embed host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostRule {
    /// Display name (e.g., "Hydrax").
    pub name: String,
    /// Regex patterns matched against the frame hostname.
    #[serde(default)]
    pub host_patterns: Vec<String>,
    /// Discovery steps, tried in order.
    #[serde(default)]
    pub strategies: Vec<Strategy>,
    /// Whether this rule is consulted at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// Host-independent discovery inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericRules {
    #[serde(default = "default_native_selector")]
    pub native_selector: String,
    /// Wrapper markup of common third-party players.
    #[serde(default)]
    pub fallback_selectors: Vec<String>,
    /// Global functions returning a player object (e.g. `jwplayer`).
    #[serde(default)]
    pub sdk_entry_points: Vec<String>,
}

fn default_native_selector() -> String {
    "video".to_string()
}

impl Default for GenericRules {
    fn default() -> Self {
        Self {
            native_selector: default_native_selector(),
            fallback_selectors: Vec::new(),
            sdk_entry_points: Vec::new(),
        }
    }
}

/// Wrapper for TOML deserialization.
#[derive(Debug, Deserialize)]
struct HostDbFile {
    #[serde(rename = "host", default)]
    hosts: Vec<HostRule>,
    #[serde(default)]
    generic: Option<GenericRules>,
}

/// Database of host rules plus the generic fallbacks.
#[derive(Debug, Clone)]
pub struct HostDatabase {
    hosts: Vec<HostRule>,
    compiled: Vec<Vec<regex::Regex>>,
    generic: GenericRules,
}

impl HostDatabase {
    /// Load the embedded host database.
    pub fn embedded() -> Self {
        Self::from_toml(EMBEDDED_DB).expect("embedded hosts.toml should be valid")
    }

    /// Load a host database from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, DetectError> {
        let db: HostDbFile = toml::from_str(toml_str)?;
        let compiled = db.hosts.iter().map(compile_patterns).collect();
        Ok(Self {
            hosts: db.hosts,
            compiled,
            generic: db.generic.unwrap_or_default(),
        })
    }

    /// Merge a user database into this one.
    /// Rules with matching names are replaced; new rules are appended.
    /// User fallback selectors and entry points are appended after the
    /// built-in ones.
    pub fn merge_user(&mut self, user_db: &HostDatabase) {
        for (i, user_rule) in user_db.hosts.iter().enumerate() {
            if let Some(pos) = self.hosts.iter().position(|h| h.name == user_rule.name) {
                self.hosts[pos] = user_rule.clone();
                self.compiled[pos] = user_db.compiled[i].clone();
            } else {
                self.hosts.push(user_rule.clone());
                self.compiled.push(user_db.compiled[i].clone());
            }
        }
        extend_unique(
            &mut self.generic.fallback_selectors,
            &user_db.generic.fallback_selectors,
        );
        extend_unique(
            &mut self.generic.sdk_entry_points,
            &user_db.generic.sdk_entry_points,
        );
    }

    /// Find the first enabled rule whose host patterns match.
    pub fn match_host(&self, hostname: &str) -> Option<&HostRule> {
        self.hosts.iter().enumerate().find_map(|(i, h)| {
            if h.enabled && self.compiled[i].iter().any(|re| re.is_match(hostname)) {
                Some(h)
            } else {
                None
            }
        })
    }

    pub fn generic(&self) -> &GenericRules {
        &self.generic
    }

    /// Number of host rules.
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

fn compile_patterns(rule: &HostRule) -> Vec<regex::Regex> {
    rule.host_patterns
        .iter()
        .filter_map(|p| match regex::Regex::new(p) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!(rule = %rule.name, pattern = %p, "Skipping invalid host pattern: {e}");
                None
            }
        })
        .collect()
}

fn extend_unique(into: &mut Vec<String>, from: &[String]) {
    for item in from {
        if !into.contains(item) {
            into.push(item.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_db_loads() {
        let db = HostDatabase::embedded();
        assert_eq!(db.len(), 3);
        assert_eq!(db.generic().native_selector, "video");
        assert_eq!(db.generic().fallback_selectors.len(), 6);
        assert_eq!(db.generic().sdk_entry_points, vec!["jwplayer".to_string()]);
    }

    #[test]
    fn test_match_host_hydrax() {
        let db = HostDatabase::embedded();
        let rule = db.match_host("abysscdn.hydrax.net").unwrap();
        assert_eq!(rule.name, "Hydrax");
        assert_eq!(
            rule.strategies[0],
            Strategy::Selector {
                selector: "#hydrax-player video".into()
            }
        );
    }

    #[test]
    fn test_match_host_vidcloud_prefers_sdk() {
        let db = HostDatabase::embedded();
        let rule = db.match_host("vidcloud9.com").unwrap();
        assert_eq!(rule.strategies, vec![Strategy::Sdk, Strategy::Native]);
    }

    #[test]
    fn test_match_host_unknown() {
        let db = HostDatabase::embedded();
        assert!(db.match_host("www.example.com").is_none());
    }

    #[test]
    fn test_invalid_pattern_is_skipped() {
        let db = HostDatabase::from_toml(
            r#"
            [[host]]
            name = "Broken"
            host_patterns = ["(unclosed", "broken\\.tv"]
            strategies = [{ kind = "native" }]
            "#,
        )
        .unwrap();
        assert!(db.match_host("broken.tv").is_some());
        assert_eq!(db.generic(), &GenericRules::default());
    }

    #[test]
    fn test_invalid_toml() {
        let err = HostDatabase::from_toml("[[host]]\nname = 3").unwrap_err();
        assert!(matches!(err, DetectError::Database(_)));
    }

    #[test]
    fn test_merge_user() {
        let mut db = HostDatabase::embedded();

        let user_toml = r##"
            [generic]
            fallback_selectors = [".plyr video", ".dplayer video"]
            sdk_entry_points = ["videojs"]

            [[host]]
            name = "Hydrax"
            host_patterns = ["hydrax"]
            enabled = false

            [[host]]
            name = "StreamTape"
            host_patterns = ["streamtape\\.(com|to)"]
            strategies = [{ kind = "selector", selector = "#mainvideo" }]
        "##;
        let user_db = HostDatabase::from_toml(user_toml).unwrap();
        db.merge_user(&user_db);

        // Hydrax is disabled now.
        assert!(db.match_host("hydrax.net").is_none());

        assert_eq!(db.len(), 4);
        let streamtape = db.match_host("streamtape.to").unwrap();
        assert_eq!(streamtape.name, "StreamTape");
        assert_eq!(
            streamtape.strategies,
            vec![Strategy::Selector {
                selector: "#mainvideo".into()
            }]
        );

        // Duplicates are not appended twice.
        assert_eq!(db.generic().fallback_selectors.len(), 7);
        assert_eq!(
            db.generic().sdk_entry_points,
            vec!["jwplayer".to_string(), "videojs".to_string()]
        );
    }
}
