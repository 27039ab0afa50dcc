//! Agent profile resolution
//!
//! Profiles are markdown documents named `<agent>.md`, looked up across a
//! three-tier hierarchy with strict precedence: project > user > system.
//! The first tier with a matching file wins; later tiers never merge in.
//!
//! Profile text is consumed as unstructured instructions injected into the
//! model prompt. The conventional `## Role` / `## Capabilities` /
//! `## Authority Scope` headings are extracted opportunistically for listing
//! and inspection, but extraction is best effort and never fatal.

use crate::delegation::DelegationRequest;
use crate::error::{Error, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Conventional profile directory under a project root or home directory
const AGENTS_SUBDIR: &str = ".conductor/agents";

/// Profile hierarchy tiers, ordered by precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileTier {
    /// Project-local profiles, highest precedence
    Project,
    /// Per-user profiles
    User,
    /// Framework-shipped profiles, lowest precedence
    System,
}

impl std::fmt::Display for ProfileTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Project => "project",
            Self::User => "user",
            Self::System => "system",
        };
        f.write_str(s)
    }
}

/// A resolved agent profile.
#[derive(Debug, Clone)]
pub struct AgentProfile {
    /// Agent name (file stem)
    pub name: String,
    /// Tier the profile was resolved from
    pub tier: ProfileTier,
    /// Source file path
    pub path: PathBuf,
    /// One-line role summary extracted from `## Role`
    pub role: String,
    /// Capability bullets extracted from `## Capabilities`
    pub capabilities: Vec<String>,
    /// Authority bullets extracted from `## Authority Scope`
    pub authority_scope: Vec<String>,
    /// Full profile text, injected verbatim into the prompt
    pub content: String,
}

impl AgentProfile {
    /// Stable identifier combining tier and name
    #[must_use]
    pub fn profile_id(&self) -> String {
        format!("{}:{}", self.tier, self.name)
    }
}

/// Hit/miss counters for the read-through profile cache.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct CacheStats {
    /// Cache hits
    pub hits: u64,
    /// Cache misses (tier walks)
    pub misses: u64,
}

impl CacheStats {
    /// Fraction of lookups served from cache, 0.0 when no lookups happened
    #[must_use]
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Three-tier profile resolver with a read-through cache.
///
/// Lookup sources are an explicit ordered list queried in sequence, not an
/// inheritance chain. Registration order is fixed at construction.
#[derive(Debug)]
pub struct ProfileResolver {
    tiers: Vec<(ProfileTier, PathBuf)>,
    cache: RwLock<HashMap<String, Arc<AgentProfile>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ProfileResolver {
    /// Create a resolver with explicit tier directories
    #[must_use]
    pub fn new(project_dir: PathBuf, user_dir: PathBuf, system_dir: PathBuf) -> Self {
        Self {
            tiers: vec![
                (ProfileTier::Project, project_dir),
                (ProfileTier::User, user_dir),
                (ProfileTier::System, system_dir),
            ],
            cache: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Create a resolver rooted at a working directory.
    ///
    /// Project tier: `<working_dir>/.conductor/agents`; user tier:
    /// `~/.conductor/agents`; system tier: `system_dir` or a `agents/`
    /// directory next to the running executable.
    #[must_use]
    pub fn from_working_dir(working_dir: &Path, system_dir: Option<PathBuf>) -> Self {
        let project = working_dir.join(AGENTS_SUBDIR);
        let user = dirs::home_dir()
            .map(|h| h.join(AGENTS_SUBDIR))
            .unwrap_or_else(|| PathBuf::from(AGENTS_SUBDIR));
        let system = system_dir.unwrap_or_else(|| {
            std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|d| d.join("agents")))
                .unwrap_or_else(|| PathBuf::from("agents"))
        });
        Self::new(project, user, system)
    }

    /// Resolve an agent name to its effective profile.
    ///
    /// Walks project, then user, then system tier; first match wins.
    ///
    /// # Errors
    /// `Error::ProfileNotFound` when no tier has `<name>.md`.
    pub fn resolve(&self, agent_name: &str) -> Result<Arc<AgentProfile>> {
        validate_agent_name(agent_name)?;

        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(profile) = cache.get(agent_name) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(profile.clone());
            }
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        for (tier, dir) in &self.tiers {
            let path = dir.join(format!("{agent_name}.md"));
            if !path.is_file() {
                continue;
            }
            let content = std::fs::read_to_string(&path).map_err(|e| {
                Error::Configuration(format!("failed to read profile {}: {e}", path.display()))
            })?;
            let profile = Arc::new(parse_profile(agent_name, *tier, path, content));
            debug!(agent = %agent_name, tier = %tier, "resolved agent profile");

            let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
            cache.insert(agent_name.to_string(), profile.clone());
            return Ok(profile);
        }

        Err(Error::ProfileNotFound(agent_name.to_string()))
    }

    /// Whether any tier defines this agent
    #[must_use]
    pub fn exists(&self, agent_name: &str) -> bool {
        self.tiers
            .iter()
            .any(|(_, dir)| dir.join(format!("{agent_name}.md")).is_file())
    }

    /// All profiles defined for this agent, in precedence order.
    ///
    /// Unlike `resolve`, this does not stop at the first match; shadowed
    /// tiers are included for inspection.
    pub fn hierarchy(&self, agent_name: &str) -> Vec<AgentProfile> {
        let mut profiles = Vec::new();
        for (tier, dir) in &self.tiers {
            let path = dir.join(format!("{agent_name}.md"));
            if !path.is_file() {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(content) => profiles.push(parse_profile(agent_name, *tier, path, content)),
                Err(e) => warn!(path = %path.display(), "failed to read profile: {e}"),
            }
        }
        profiles
    }

    /// Every visible agent with its effective tier.
    ///
    /// Project shadows user shadows system; each name appears once.
    pub fn list_agents(&self) -> Vec<(String, ProfileTier)> {
        let mut seen: HashMap<String, ProfileTier> = HashMap::new();
        let mut order = Vec::new();
        for (tier, dir) in &self.tiers {
            let Ok(entries) = std::fs::read_dir(dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "md") {
                    if let Some(stem) = path.file_stem() {
                        let name = stem.to_string_lossy().to_string();
                        if !seen.contains_key(&name) {
                            seen.insert(name.clone(), *tier);
                            order.push(name);
                        }
                    }
                }
            }
        }
        order.sort();
        order
            .into_iter()
            .map(|name| {
                let tier = seen[&name];
                (name, tier)
            })
            .collect()
    }

    /// Drop one cached profile; the next resolve re-reads from disk
    pub fn invalidate(&self, agent_name: &str) {
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache.remove(agent_name);
    }

    /// Drop the whole cache
    pub fn invalidate_all(&self) {
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache.clear();
    }

    /// Current cache counters
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

fn validate_agent_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidRequest("agent name is empty".to_string()));
    }
    if name.contains(['/', '\\', '.']) {
        return Err(Error::InvalidRequest(format!(
            "agent name '{name}' contains path characters"
        )));
    }
    Ok(())
}

/// Parse a profile document, extracting the conventional sections.
fn parse_profile(name: &str, tier: ProfileTier, path: PathBuf, content: String) -> AgentProfile {
    let role = section_body(&content, "Role")
        .and_then(|body| body.lines().find(|l| !l.trim().is_empty()))
        .map(|l| l.trim().to_string())
        .unwrap_or_else(|| format!("{name} agent"));

    AgentProfile {
        name: name.to_string(),
        tier,
        path,
        role,
        capabilities: section_bullets(&content, "Capabilities"),
        authority_scope: section_bullets(&content, "Authority Scope"),
        content,
    }
}

/// Slice out the body of a `## <heading>` section, up to the next heading.
fn section_body<'a>(content: &'a str, heading: &str) -> Option<&'a str> {
    let mut start = None;
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_end();
        if let Some(rest) = trimmed.strip_prefix("## ") {
            if start.is_some() {
                return Some(&content[start.unwrap()..offset]);
            }
            if rest.trim().eq_ignore_ascii_case(heading) {
                start = Some(offset + line.len());
            }
        }
        offset += line.len();
    }
    start.map(|s| &content[s..])
}

/// Collect `- ` bullet lines from a section body.
fn section_bullets(content: &str, heading: &str) -> Vec<String> {
    section_body(content, heading)
        .map(|body| {
            body.lines()
                .filter_map(|l| {
                    let t = l.trim();
                    t.strip_prefix("- ")
                        .or_else(|| t.strip_prefix("* "))
                        .map(|b| b.trim().to_string())
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Render the full prompt injected into the model for a delegation.
///
/// Combines the task header, temporal context, requirements, deliverables,
/// and the profile text, in that order.
#[must_use]
pub fn render_task_prompt(profile: &AgentProfile, request: &DelegationRequest) -> String {
    let today = Utc::now().format("%Y-%m-%d");

    let requirements = if request.requirements.is_empty() {
        "None specified".to_string()
    } else {
        request
            .requirements
            .iter()
            .map(|r| format!("- {r}"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let deliverables = if request.deliverables.is_empty() {
        "None specified".to_string()
    } else {
        request
            .deliverables
            .iter()
            .map(|d| format!("- {d}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let mut prompt = format!(
        "**{role}**: {task}\n\n\
         TEMPORAL CONTEXT: Today is {today}. Apply date awareness to task execution.\n\n\
         **Requirements**:\n{requirements}\n\n\
         **Deliverables**:\n{deliverables}\n\n\
         Priority: {priority:?}\n\n\
         **Agent Instructions**:\n{content}\n",
        role = profile.role,
        task = request.task_description,
        priority = request.priority,
        content = profile.content.trim_end(),
    );
    if let Some(notes) = &request.integration_notes {
        prompt.push_str(&format!("\n**Integration Notes**: {notes}\n"));
    }
    prompt
}
