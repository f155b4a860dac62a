use crate::config::{ConfigError, LoggingConfig};
use crate::level::Level;
use ahash::RandomState;
use std::collections::HashMap;

const SEPARATOR: char = '.';

/// Per-module minimum levels, resolved by longest dotted prefix.
///
/// Prefixes only match on whole segments: an override on `data` applies to
/// `data` and `data.x`, never to `database`.
#[derive(Debug, Clone)]
pub struct ModuleLevelTable {
    default: Level,
    overrides: HashMap<String, Level, RandomState>,
    /// Lowest level any logger can resolve to.
    floor: Level,
}

impl ModuleLevelTable {
    pub fn new(default: Level) -> Self {
        Self {
            default,
            overrides: HashMap::default(),
            floor: default,
        }
    }

    pub fn with_override(mut self, prefix: &str, level: Level) -> Self {
        self.set_override(prefix, level);
        self
    }

    pub fn from_config(cfg: &LoggingConfig) -> Result<Self, ConfigError> {
        let mut table = Self::new(cfg.default_level()?);
        for (prefix, level) in cfg.module_levels()? {
            table.set_override(&prefix, level);
        }
        Ok(table)
    }

    fn set_override(&mut self, prefix: &str, level: Level) {
        let prefix = prefix.trim().trim_matches(SEPARATOR);
        if prefix.is_empty() {
            return;
        }
        self.overrides.insert(prefix.to_string(), level);
        self.floor = self.overrides.values().copied().fold(self.default, Level::min);
    }

    pub fn default_level(&self) -> Level {
        self.default
    }

    pub fn overrides(&self) -> impl Iterator<Item = (&str, Level)> {
        self.overrides.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn effective_level(&self, logger_name: &str) -> Level {
        if self.overrides.is_empty() {
            return self.default;
        }

        let mut candidate = logger_name;
        loop {
            if let Some(level) = self.overrides.get(candidate) {
                return *level;
            }
            match candidate.rfind(SEPARATOR) {
                Some(idx) => candidate = &candidate[..idx],
                None => return self.default,
            }
        }
    }

    pub fn should_emit(&self, logger_name: &str, level: Level) -> bool {
        if level < self.floor {
            return false;
        }
        level >= self.effective_level(logger_name)
    }
}

impl Default for ModuleLevelTable {
    fn default() -> Self {
        Self::new(Level::Warning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table() -> ModuleLevelTable {
        ModuleLevelTable::new(Level::Info)
            .with_override("auth", Level::Debug)
            .with_override("auth.service", Level::Trace)
            .with_override("database", Level::Error)
            .with_override("network.comms", Level::Warning)
    }

    #[test]
    fn longest_prefix_wins() {
        let t = table();
        assert_eq!(t.effective_level("auth.service.tokens"), Level::Trace);
        assert_eq!(t.effective_level("auth.session"), Level::Debug);
        assert_eq!(t.effective_level("auth"), Level::Debug);
        assert_eq!(t.effective_level("network.comms.client"), Level::Warning);
        assert_eq!(t.effective_level("network"), Level::Info);
        assert_eq!(t.effective_level("other.component"), Level::Info);
    }

    // Overrides are assumed to be segment-aligned: "data" must not capture "database".
    #[test]
    fn prefix_matching_is_segment_aligned() {
        let t = ModuleLevelTable::new(Level::Info).with_override("data", Level::Critical);
        assert_eq!(t.effective_level("database"), Level::Info);
        assert_eq!(t.effective_level("database.queries"), Level::Info);
        assert_eq!(t.effective_level("data"), Level::Critical);
        assert_eq!(t.effective_level("data.pipeline"), Level::Critical);
    }

    #[test]
    fn default_error_filters_warning_without_override() {
        let t = ModuleLevelTable::new(Level::Error);
        assert!(!t.should_emit("database.queries", Level::Warning));
        assert!(t.should_emit("database.queries", Level::Error));
    }

    #[test]
    fn override_beats_default_via_prefix() {
        let t = ModuleLevelTable::new(Level::Info).with_override("database", Level::Error);
        assert!(!t.should_emit("database.connection", Level::Info));
        assert!(t.should_emit("web.handler", Level::Info));
    }

    #[test]
    fn trace_only_when_effective_level_is_trace() {
        let t = table();
        assert!(t.should_emit("auth.service.x", Level::Trace));
        assert!(!t.should_emit("auth.session", Level::Trace));
        assert!(!t.should_emit("other", Level::Trace));
    }

    #[test]
    fn empty_prefix_is_ignored() {
        let t = ModuleLevelTable::new(Level::Warning).with_override("", Level::Trace);
        assert_eq!(t.overrides().count(), 0);
        assert_eq!(t.effective_level("anything"), Level::Warning);
    }

    #[test]
    fn from_config_rejects_bad_level() {
        let cfg = LoggingConfig::default().with_module_level("auth", "LOUD");
        assert!(matches!(
            ModuleLevelTable::from_config(&cfg),
            Err(ConfigError::InvalidModuleLevel { .. })
        ));
    }
}
