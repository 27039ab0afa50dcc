//! `conductor agents` command

use anyhow::{Context, Result};
use conductor_core::profiles::ProfileResolver;

/// List every visible agent with its effective tier and role.
pub fn run() -> Result<()> {
    let settings = crate::settings::load_config()?;
    let working_dir = std::env::current_dir().context("failed to resolve working directory")?;
    let resolver =
        ProfileResolver::from_working_dir(&working_dir, settings.profiles.system_agents_dir);

    let agents = resolver.list_agents();
    if agents.is_empty() {
        println!("No agent profiles found. Add markdown profiles under .conductor/agents/.");
        return Ok(());
    }

    for (name, tier) in agents {
        match resolver.resolve(&name) {
            Ok(profile) => println!("{name:<20} [{tier}]  {}", profile.role),
            Err(_) => println!("{name:<20} [{tier}]"),
        }
    }
    Ok(())
}
