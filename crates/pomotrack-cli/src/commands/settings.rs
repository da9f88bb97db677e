//! Timer duration settings, stored globally or per project.

use clap::Subcommand;
use pomotrack_core::settings::apply_overrides;
use pomotrack_core::{CoreError, Database, SettingsResolver};
use serde_json::json;

use super::require_project;

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show effective settings
    Show {
        /// Project ID (default: global)
        #[arg(long)]
        project: Option<String>,
    },
    /// Set one or more values, e.g. `focus=50 interval=3`
    Set {
        /// Project ID (default: global)
        #[arg(long)]
        project: Option<String>,
        /// key=value pairs; keys: focus, short, long (minutes), interval
        #[arg(required = true)]
        values: Vec<String>,
    },
    /// Drop stored settings so the scope uses the defaults
    Reset {
        /// Project ID (default: global)
        #[arg(long)]
        project: Option<String>,
    },
}

fn parse_pair(pair: &str) -> Result<(String, i64), CoreError> {
    let (key, value) = pair
        .split_once('=')
        .ok_or_else(|| CoreError::Custom(format!("expected key=value, got '{pair}'")))?;
    let value = value
        .trim()
        .parse::<i64>()
        .map_err(|_| CoreError::Custom(format!("'{value}' is not a whole number")))?;
    Ok((key.trim().to_string(), value))
}

pub fn run(action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        SettingsAction::Show { project } => {
            if let Some(ref id) = project {
                require_project(&db, id)?;
            }
            let resolver = SettingsResolver::new(Box::new(db));
            let scope = project.as_deref();
            let out = json!({
                "project_id": project,
                "stored": resolver.has_own(scope)?,
                "settings": resolver.resolve(scope),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        SettingsAction::Set { project, values } => {
            if let Some(ref id) = project {
                require_project(&db, id)?;
            }
            let overrides = values
                .iter()
                .map(|v| parse_pair(v))
                .collect::<Result<Vec<_>, _>>()?;
            let resolver = SettingsResolver::new(Box::new(db));
            let scope = project.as_deref();
            let settings = apply_overrides(resolver.resolve(scope), &overrides)?;
            resolver.save(scope, &settings)?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        SettingsAction::Reset { project } => {
            let resolver = SettingsResolver::new(Box::new(db));
            let scope = project.as_deref();
            if resolver.reset(scope)? {
                println!("settings reset");
            } else {
                println!("nothing to reset");
            }
        }
    }
    Ok(())
}
