//! Declarative hook registry.
//!
//! An inventory of named hook configurations keyed by event kind, kept for
//! host-side integration tooling. It is data, not behavior: dispatch never
//! consults it, registration appends in order, and nothing de-duplicates or
//! sorts. Consumers that care about priority sort the returned sequence.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use gismo_protocol::HookEventName;

/// One declarative hook configuration entry.
#[derive(Debug, Clone)]
pub struct HookConfig {
    pub name: String,
    pub event: HookEventName,
    /// Regex over tool names; empty matches every tool.
    pub matcher: String,
    /// Lower runs earlier. Stored, not acted on.
    pub priority: i32,
    pub timeout: Duration,
}

impl HookConfig {
    pub fn new(name: impl Into<String>, event: HookEventName) -> Self {
        Self {
            name: name.into(),
            event,
            matcher: String::new(),
            priority: 0,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_matcher(mut self, matcher: impl Into<String>) -> Self {
        self.matcher = matcher.into();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether this entry's matcher covers `tool`.
    ///
    /// An empty or invalid pattern matches everything / nothing
    /// respectively; the registry stays declarative either way.
    pub fn matches_tool(&self, tool: &str) -> bool {
        if self.matcher.is_empty() {
            return true;
        }
        match regex::Regex::new(&self.matcher) {
            Ok(re) => re.is_match(tool),
            Err(err) => {
                tracing::warn!(matcher = %self.matcher, %err, "invalid hook matcher");
                false
            }
        }
    }
}

/// Thread-safe, insertion-ordered hook inventory.
#[derive(Debug, Default)]
pub struct HookRegistry {
    entries: RwLock<HashMap<HookEventName, Vec<HookConfig>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a configuration under its event kind.
    pub fn register(&self, config: HookConfig) {
        self.entries
            .write()
            .expect("Failed to acquire registry lock")
            .entry(config.event)
            .or_default()
            .push(config);
    }

    /// All entries for an event kind, in registration order.
    pub fn lookup(&self, event: HookEventName) -> Vec<HookConfig> {
        self.entries
            .read()
            .expect("Failed to acquire registry lock")
            .get(&event)
            .cloned()
            .unwrap_or_default()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.entries
            .write()
            .expect("Failed to acquire registry lock")
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .expect("Failed to acquire registry lock")
            .values()
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_preserves_order_and_duplicates() {
        let registry = HookRegistry::new();
        registry.register(HookConfig::new("lint", HookEventName::PreToolUse).with_priority(10));
        registry.register(HookConfig::new("audit", HookEventName::PreToolUse).with_priority(-5));
        registry.register(HookConfig::new("lint", HookEventName::PreToolUse));

        let entries = registry.lookup(HookEventName::PreToolUse);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].name, "lint");
        assert_eq!(entries[1].name, "audit");
        assert_eq!(entries[2].name, "lint");
    }

    #[test]
    fn test_lookup_missing_event_is_empty() {
        let registry = HookRegistry::new();
        assert!(registry.lookup(HookEventName::PreCompact).is_empty());
    }

    #[test]
    fn test_clear() {
        let registry = HookRegistry::new();
        registry.register(HookConfig::new("a", HookEventName::Stop));
        assert_eq!(registry.len(), 1);

        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_matcher_semantics() {
        let config = HookConfig::new("lint", HookEventName::PreToolUse).with_matcher("Write|Edit");
        assert!(config.matches_tool("Write"));
        assert!(config.matches_tool("MultiEdit"));
        assert!(!config.matches_tool("Bash"));

        let all = HookConfig::new("audit", HookEventName::PreToolUse);
        assert!(all.matches_tool("anything"));

        let broken = HookConfig::new("bad", HookEventName::PreToolUse).with_matcher("(");
        assert!(!broken.matches_tool("Write"));
    }
}
