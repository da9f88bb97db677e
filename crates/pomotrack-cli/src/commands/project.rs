//! Project management commands for CLI.

use clap::Subcommand;
use pomotrack_core::{CoreError, Database, Project};

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create a new project
    Create {
        /// Project name
        name: String,
        /// Color as #rrggbb
        #[arg(long)]
        color: Option<String>,
    },
    /// List all projects
    List,
    /// Rename a project
    Rename {
        /// Project ID
        id: String,
        /// New name
        name: String,
    },
    /// Change a project's color
    Recolor {
        /// Project ID
        id: String,
        /// Color as #rrggbb
        color: String,
    },
    /// Delete a project with its sessions and settings
    Delete {
        /// Project ID
        id: String,
    },
}

pub fn run(action: ProjectAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        ProjectAction::Create { name, color } => {
            let project = Project::new(&name, color.as_deref())?;
            db.create_project(&project)?;
            println!("Project created: {}", project.id);
            println!("{}", serde_json::to_string_pretty(&project)?);
        }
        ProjectAction::List => {
            let projects = db.list_projects()?;
            println!("{}", serde_json::to_string_pretty(&projects)?);
        }
        ProjectAction::Rename { id, name } => {
            let project = db.update_project(&id, Some(&name), None)?;
            println!("{}", serde_json::to_string_pretty(&project)?);
        }
        ProjectAction::Recolor { id, color } => {
            let project = db.update_project(&id, None, Some(&color))?;
            println!("{}", serde_json::to_string_pretty(&project)?);
        }
        ProjectAction::Delete { id } => {
            if !db.delete_project(&id)? {
                return Err(CoreError::NotFound { kind: "project", id }.into());
            }
            println!("Project deleted: {id}");
        }
    }
    Ok(())
}
