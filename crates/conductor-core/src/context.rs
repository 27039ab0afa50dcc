//! Per-agent context filtering
//!
//! Reduces a shared project context to the subset relevant to an agent type
//! before local dispatch. Filtering is a pure function of (filter, context):
//! the same inputs always yield the same output, and the caller's context is
//! never mutated.

use crate::delegation::TaskContext;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Context keys that survive every filter (request metadata, not content).
const META_KEYS: &[&str] = &["working_directory", "timestamp", "current_task"];

/// Allow/deny policy for one agent type.
#[derive(Debug, Clone)]
pub struct ContextFilter {
    agent_type: String,
    include_patterns: Vec<Regex>,
    exclude_patterns: Vec<Regex>,
    file_extensions: Vec<String>,
    sections: Vec<String>,
}

impl ContextFilter {
    /// Create an empty filter for an agent type
    #[must_use]
    pub fn new(agent_type: impl Into<String>) -> Self {
        Self {
            agent_type: agent_type.into(),
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            file_extensions: Vec::new(),
            sections: Vec::new(),
        }
    }

    /// Agent type this filter applies to
    #[must_use]
    pub fn agent_type(&self) -> &str {
        &self.agent_type
    }

    /// Add a file path include pattern.
    ///
    /// # Panics
    /// Panics on an invalid regex; filter tables are built from literals at
    /// startup, so a bad pattern is a programming error.
    #[must_use]
    pub fn include(mut self, pattern: &str) -> Self {
        self.include_patterns
            .push(Regex::new(pattern).expect("invalid include pattern"));
        self
    }

    /// Add a file path exclude pattern (checked before includes).
    ///
    /// # Panics
    /// Panics on an invalid regex, same as `include`.
    #[must_use]
    pub fn exclude(mut self, pattern: &str) -> Self {
        self.exclude_patterns
            .push(Regex::new(pattern).expect("invalid exclude pattern"));
        self
    }

    /// Add a file extension to the allow-list (e.g. `.md`)
    #[must_use]
    pub fn extension(mut self, ext: impl Into<String>) -> Self {
        self.file_extensions.push(ext.into());
        self
    }

    /// Allow a non-file context section through
    #[must_use]
    pub fn section(mut self, key: impl Into<String>) -> Self {
        self.sections.push(key.into());
        self
    }

    /// Whether a file path passes this filter
    #[must_use]
    pub fn matches_file(&self, path: &str) -> bool {
        if self.exclude_patterns.iter().any(|re| re.is_match(path)) {
            return false;
        }
        if self.include_patterns.iter().any(|re| re.is_match(path)) {
            return true;
        }
        self.file_extensions.iter().any(|ext| path.ends_with(ext))
    }

    /// Whether a non-file section key passes this filter
    #[must_use]
    pub fn allows_section(&self, key: &str) -> bool {
        META_KEYS.contains(&key) || self.sections.iter().any(|s| s == key)
    }
}

/// Registry of context filters keyed by agent type.
#[derive(Debug, Clone)]
pub struct ContextFilterSet {
    filters: HashMap<String, ContextFilter>,
}

impl ContextFilterSet {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self {
            filters: HashMap::new(),
        }
    }

    /// Create a set with filters for the nine stock agent types
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut set = Self::new();
        for filter in default_filters() {
            set.register(filter);
        }
        set
    }

    /// Register a filter; replaces any existing filter for the same type
    pub fn register(&mut self, filter: ContextFilter) {
        self.filters.insert(filter.agent_type.clone(), filter);
    }

    /// Look up the filter for an agent type
    #[must_use]
    pub fn get(&self, agent_type: &str) -> Option<&ContextFilter> {
        self.filters.get(agent_type)
    }

    /// Number of registered filters
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Whether the set is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Filter a context down to what this agent type should see.
    ///
    /// Unknown agent types get the full context unchanged; filtering is an
    /// optimization, never a gate on unknown agents.
    #[must_use]
    pub fn filter(&self, agent_type: &str, context: &TaskContext) -> TaskContext {
        let Some(filter) = self.filters.get(agent_type) else {
            return context.clone();
        };

        let mut filtered = TaskContext::new();
        for (key, value) in context {
            if key == "files" {
                if let Value::Object(files) = value {
                    let kept: serde_json::Map<String, Value> = files
                        .iter()
                        .filter(|(path, _)| filter.matches_file(path))
                        .map(|(path, content)| (path.clone(), content.clone()))
                        .collect();
                    filtered.insert("files".to_string(), Value::Object(kept));
                }
            } else if filter.allows_section(key) {
                filtered.insert(key.clone(), value.clone());
            }
        }

        debug!(
            agent_type,
            original = estimate_tokens(context),
            filtered = estimate_tokens(&filtered),
            "filtered context"
        );
        filtered
    }
}

impl Default for ContextFilterSet {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Rough token estimate for a context (chars / 4).
#[must_use]
pub fn estimate_tokens(context: &TaskContext) -> usize {
    serde_json::to_string(context).map_or(0, |s| s.len() / 4)
}

/// Filter tables for the stock agent types.
fn default_filters() -> Vec<ContextFilter> {
    vec![
        ContextFilter::new("documentation")
            .include(r"(?i)readme")
            .include(r"(?i)changelog")
            .include(r"^docs/")
            .extension(".md")
            .section("project_overview"),
        ContextFilter::new("qa")
            .include(r"^tests?/")
            .include(r"(^|/)test_[^/]+$")
            .include(r"_test\.[a-z]+$")
            .section("test_results")
            .section("quality_metrics"),
        ContextFilter::new("engineer")
            .include(r"^src/")
            .include(r"^lib/")
            .extension(".rs")
            .extension(".py")
            .extension(".ts")
            .exclude(r"^tests?/")
            .section("technical_specs")
            .section("project_overview"),
        ContextFilter::new("research")
            .include(r"^research/")
            .include(r"^docs/")
            .extension(".md")
            .section("project_overview")
            .section("technical_specs"),
        ContextFilter::new("ops")
            .include(r"^deploy/")
            .include(r"(?i)dockerfile")
            .include(r"docker-compose")
            .extension(".yml")
            .extension(".yaml")
            .section("deployment_config"),
        ContextFilter::new("security")
            .include(r"(^|/)\.env$")
            .include(r"^security/")
            .include(r"(?i)auth")
            .exclude(r"\.env\.example$")
            .section("security_policies"),
        ContextFilter::new("version_control")
            .include(r"(^|/)\.git")
            .section("git_status")
            .section("recent_commits"),
        ContextFilter::new("ticketing")
            .include(r"^tickets?/")
            .section("active_tickets")
            .section("sprint_status"),
        ContextFilter::new("data_engineer")
            .include(r"^migrations/")
            .include(r"^data/")
            .extension(".sql")
            .section("database_schema")
            .section("technical_specs"),
    ]
}
