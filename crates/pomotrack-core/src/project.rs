//! Projects group focus sessions and carry their own timer settings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::timer::ProjectId;

pub const DEFAULT_PROJECT_COLOR: &str = "#3b82f6";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// Create a project with a fresh id.
    ///
    /// # Errors
    /// Rejects blank names and colors that are not `#rrggbb`.
    pub fn new(name: &str, color: Option<&str>) -> Result<Self, ValidationError> {
        let name = validate_name(name)?;
        let color = match color {
            Some(c) => validate_color(c)?,
            None => DEFAULT_PROJECT_COLOR.to_string(),
        };
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name,
            color,
            created_at: Utc::now(),
        })
    }
}

pub fn validate_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "name".into(),
            message: "project name is required".into(),
        });
    }
    Ok(trimmed.to_string())
}

pub fn validate_color(color: &str) -> Result<String, ValidationError> {
    let c = color.trim();
    let ok = c.len() == 7
        && c.starts_with('#')
        && c[1..].chars().all(|ch| ch.is_ascii_hexdigit());
    if !ok {
        return Err(ValidationError::InvalidValue {
            field: "color".into(),
            message: format!("expected #rrggbb, got '{color}'"),
        });
    }
    Ok(c.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trims_name_and_defaults_color() {
        let p = Project::new("  Thesis ", None).unwrap();
        assert_eq!(p.name, "Thesis");
        assert_eq!(p.color, DEFAULT_PROJECT_COLOR);
        assert!(!p.id.is_empty());
    }

    #[test]
    fn blank_name_is_rejected() {
        assert!(Project::new("   ", None).is_err());
    }

    #[test]
    fn color_must_be_hex() {
        assert_eq!(validate_color("#FF5733").unwrap(), "#ff5733");
        assert!(validate_color("red").is_err());
        assert!(validate_color("#12345").is_err());
    }
}
