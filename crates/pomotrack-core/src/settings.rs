//! Resolution of effective timer settings for a project.

use tracing::{debug, warn};

use crate::error::{Result, ValidationError};
use crate::storage::SettingsStore;
use crate::timer::TimerSettings;

/// Looks settings up in the row for the requested scope: the project's own
/// row for `Some(id)`, the global row for `None`. A missing row resolves to
/// the built-in defaults; projects never inherit the global row.
pub struct SettingsResolver {
    store: Box<dyn SettingsStore>,
}

impl SettingsResolver {
    pub fn new(store: Box<dyn SettingsStore>) -> Self {
        Self { store }
    }

    /// Effective settings for `project_id`. Never fails: store errors are
    /// logged and answered with the defaults.
    pub fn resolve(&self, project_id: Option<&str>) -> TimerSettings {
        match self.store.get(project_id) {
            Ok(Some(settings)) => settings.normalized(),
            Ok(None) => TimerSettings::default(),
            Err(e) => {
                warn!(project_id, error = %e, "failed to load settings; using defaults");
                TimerSettings::default()
            }
        }
    }

    /// Whether `project_id` has a stored row (as opposed to the defaults).
    pub fn has_own(&self, project_id: Option<&str>) -> Result<bool> {
        Ok(self.store.get(project_id)?.is_some())
    }

    /// Persist settings for a project (`None` = global).
    ///
    /// # Errors
    /// Rejects non-positive fields with [`ValidationError::InvalidSettings`];
    /// propagates store failures.
    pub fn save(&self, project_id: Option<&str>, settings: &TimerSettings) -> Result<()> {
        // Re-run the checks on the raw fields to name the bad one.
        TimerSettings::new(
            settings.focus_duration.into(),
            settings.short_break_duration.into(),
            settings.long_break_duration.into(),
            settings.long_break_interval.into(),
        )
        .map_err(crate::error::CoreError::from)?;
        self.store.put(project_id, settings)?;
        debug!(project_id, ?settings, "settings saved");
        Ok(())
    }

    /// Drop a stored row so the scope uses the defaults. Returns whether one existed.
    pub fn reset(&self, project_id: Option<&str>) -> Result<bool> {
        self.store.remove(project_id)
    }
}

/// Parse `key=value` overrides on top of `base`, as typed on the CLI.
///
/// Keys: `focus`, `short`, `long`, `interval` (or the full field names).
pub fn apply_overrides(
    base: TimerSettings,
    overrides: &[(String, i64)],
) -> std::result::Result<TimerSettings, ValidationError> {
    let mut raw = [
        i64::from(base.focus_duration),
        i64::from(base.short_break_duration),
        i64::from(base.long_break_duration),
        i64::from(base.long_break_interval),
    ];
    for (key, value) in overrides {
        let slot = match key.as_str() {
            "focus" | "focus_duration" => 0,
            "short" | "short_break" | "short_break_duration" => 1,
            "long" | "long_break" | "long_break_duration" => 2,
            "interval" | "long_break_interval" => 3,
            other => {
                return Err(ValidationError::InvalidValue {
                    field: other.to_string(),
                    message: "expected focus, short, long or interval".into(),
                })
            }
        };
        raw[slot] = *value;
    }
    TimerSettings::new(raw[0], raw[1], raw[2], raw[3])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::storage::MemoryStore;

    struct BrokenStore;

    impl SettingsStore for BrokenStore {
        fn get(&self, _: Option<&str>) -> Result<Option<TimerSettings>> {
            Err(CoreError::Custom("offline".into()))
        }
        fn put(&self, _: Option<&str>, _: &TimerSettings) -> Result<()> {
            Err(CoreError::Custom("offline".into()))
        }
        fn remove(&self, _: Option<&str>) -> Result<bool> {
            Err(CoreError::Custom("offline".into()))
        }
    }

    fn custom(focus: u32) -> TimerSettings {
        TimerSettings {
            focus_duration: focus,
            ..TimerSettings::default()
        }
    }

    #[test]
    fn each_scope_reads_only_its_own_row() {
        let store = MemoryStore::new();
        let resolver = SettingsResolver::new(Box::new(store.clone()));
        assert_eq!(resolver.resolve(None), TimerSettings::default());
        assert_eq!(resolver.resolve(Some("p")), TimerSettings::default());

        store.put(Some("p"), &custom(50)).unwrap();
        assert_eq!(resolver.resolve(Some("p")), custom(50));
        assert_eq!(resolver.resolve(None), TimerSettings::default());
    }

    #[test]
    fn project_without_row_gets_builtin_defaults_not_global() {
        let store = MemoryStore::new();
        store.put(None, &custom(50)).unwrap();
        let resolver = SettingsResolver::new(Box::new(store));
        assert_eq!(resolver.resolve(None), custom(50));
        assert_eq!(resolver.resolve(Some("fresh-project")), TimerSettings::default());
    }

    #[test]
    fn store_errors_resolve_to_defaults() {
        let resolver = SettingsResolver::new(Box::new(BrokenStore));
        assert_eq!(resolver.resolve(Some("p")), TimerSettings::default());
        assert_eq!(resolver.resolve(None), TimerSettings::default());
        assert!(resolver.save(None, &custom(30)).is_err());
    }

    #[test]
    fn zero_fields_are_normalized_on_resolve() {
        let store = MemoryStore::new();
        store.put(Some("p"), &custom(0)).unwrap();
        let resolver = SettingsResolver::new(Box::new(store));
        assert_eq!(resolver.resolve(Some("p")).focus_duration, 25);
    }

    #[test]
    fn save_rejects_invalid_settings() {
        let resolver = SettingsResolver::new(Box::new(MemoryStore::new()));
        let err = resolver.save(Some("p"), &custom(0)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::InvalidSettings {
                field: "focus_duration",
                ..
            })
        ));
        assert!(!resolver.has_own(Some("p")).unwrap());
    }

    #[test]
    fn reset_reverts_to_defaults() {
        let resolver = SettingsResolver::new(Box::new(MemoryStore::new()));
        resolver.save(Some("p"), &custom(45)).unwrap();
        assert!(resolver.has_own(Some("p")).unwrap());
        assert!(resolver.reset(Some("p")).unwrap());
        assert_eq!(resolver.resolve(Some("p")), TimerSettings::default());
    }

    #[test]
    fn overrides_by_short_key() {
        let s = apply_overrides(
            TimerSettings::default(),
            &[("focus".into(), 50), ("interval".into(), 2)],
        )
        .unwrap();
        assert_eq!(s.focus_duration, 50);
        assert_eq!(s.long_break_interval, 2);
        assert_eq!(s.short_break_duration, 5);
        assert!(apply_overrides(TimerSettings::default(), &[("nap".into(), 5)]).is_err());
        assert!(apply_overrides(TimerSettings::default(), &[("short".into(), 0)]).is_err());
    }
}
