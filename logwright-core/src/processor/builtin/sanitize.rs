use crate::config::{ConfigError, SanitizationConfig};
use crate::event::{FieldValue, Fields, LogEvent};
use crate::processor::core::Processor;
use crate::processor::core::result::ProcessorResult;
use glob::{MatchOptions, Pattern};

pub const REDACTED: &str = "***REDACTED***";

const MATCH: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Value prefixes that identify a credential on their own.
const SECRET_PREFIXES: [&str; 5] = ["sk-", "ghp_", "gho_", "xoxb-", "AKIA"];

/// Shortest value treated as a prefixed secret; avoids masking words like "sk-".
const MIN_SECRET_LEN: usize = 16;

/// Masks sensitive field values before they reach any sink.
#[derive(Debug, Clone)]
pub struct SanitizeProcessor {
    patterns: Vec<Pattern>,
    mask_values: bool,
    nested: bool,
}

impl SanitizeProcessor {
    pub fn from_config(cfg: &SanitizationConfig) -> Result<Self, ConfigError> {
        let patterns = cfg
            .sensitive_keys
            .iter()
            .map(|raw| {
                Pattern::new(&raw.to_ascii_lowercase()).map_err(|source| {
                    ConfigError::InvalidKeyPattern {
                        pattern: raw.clone(),
                        source,
                    }
                })
            })
            .collect::<Result<_, _>>()?;

        Ok(Self {
            patterns,
            mask_values: cfg.mask_values,
            nested: cfg.sanitize_nested,
        })
    }

    fn is_sensitive_key(&self, key: &str) -> bool {
        self.patterns.iter().any(|p| p.matches_with(key, MATCH))
    }

    fn sanitize_fields(&self, fields: &mut Fields, depth: usize) {
        for (key, value) in fields.iter_mut() {
            if self.is_sensitive_key(key) {
                *value = FieldValue::Str(REDACTED.to_string());
            } else {
                self.sanitize_value(value, depth);
            }
        }
    }

    fn sanitize_value(&self, value: &mut FieldValue, depth: usize) {
        match value {
            FieldValue::Str(s) if self.mask_values => {
                if let Some(masked) = mask_secret(s) {
                    *s = masked;
                }
            }
            FieldValue::Map(inner) if self.nested && depth > 0 => {
                self.sanitize_fields(inner, depth - 1);
            }
            FieldValue::List(items) if self.nested && depth > 0 => {
                for item in items {
                    self.sanitize_value(item, depth - 1);
                }
            }
            _ => {}
        }
    }
}

/// Nesting depth beyond which values are left as they are.
const MAX_DEPTH: usize = 16;

/// Masked replacement for values that look like credentials.
pub fn mask_secret(value: &str) -> Option<String> {
    let trimmed = value.trim_start();
    for scheme in ["Bearer ", "Basic "] {
        if trimmed.len() > scheme.len()
            && trimmed.is_char_boundary(scheme.len())
            && trimmed[..scheme.len()].eq_ignore_ascii_case(scheme)
        {
            return Some(format!("{}{REDACTED}", &trimmed[..scheme.len()]));
        }
    }

    let looks_prefixed = SECRET_PREFIXES.iter().any(|p| trimmed.starts_with(p));
    if looks_prefixed && trimmed.len() >= MIN_SECRET_LEN && !trimmed.contains(char::is_whitespace) {
        return Some(REDACTED.to_string());
    }
    None
}

impl Processor for SanitizeProcessor {
    fn name(&self) -> &'static str {
        "sanitize"
    }

    fn process(&self, event: &mut LogEvent) -> ProcessorResult {
        self.sanitize_fields(&mut event.fields, MAX_DEPTH);
        ProcessorResult::Continue
    }
}
