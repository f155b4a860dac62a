use crate::event::LogEvent;
use crate::processor::core::Processor;
use crate::processor::core::result::ProcessorResult;
use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const LOGGER_EMOJI_KEY: &str = "_logger_emoji";
pub const DAS_EMOJI_KEY: &str = "_das_emoji";

pub const DOMAIN_KEY: &str = "domain";
pub const ACTION_KEY: &str = "action";
pub const STATUS_KEY: &str = "status";

const DEFAULT_LOGGER_EMOJI: &str = "🔹";
const DEFAULT_DOMAIN_EMOJI: &str = "❓";
const DEFAULT_ACTION_EMOJI: &str = "⚙️";
const DEFAULT_STATUS_EMOJI: &str = "➡️";

static LOGGER_EMOJI: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("api", "🔌"),
        ("auth", "🔐"),
        ("cache", "💾"),
        ("config", "⚙️"),
        ("database", "🗄️"),
        ("db", "🗄️"),
        ("http", "🌐"),
        ("logwright", "🪵"),
        ("metrics", "📈"),
        ("network", "🌐"),
        ("queue", "📬"),
        ("scheduler", "⏱️"),
        ("security", "🛡️"),
        ("storage", "📦"),
        ("test", "🧪"),
    ])
});

static DOMAIN_EMOJI: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("api", "🔌"),
        ("auth", "🔑"),
        ("cache", "💾"),
        ("client", "🙋"),
        ("database", "🗄️"),
        ("file", "📄"),
        ("network", "🌐"),
        ("security", "🔐"),
        ("server", "🛎️"),
        ("system", "⚙️"),
        ("user", "👤"),
    ])
});

static ACTION_EMOJI: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("connect", "🔗"),
        ("create", "✨"),
        ("delete", "🗑️"),
        ("disconnect", "💔"),
        ("init", "🌱"),
        ("login", "➡️"),
        ("logout", "⬅️"),
        ("query", "🔍"),
        ("read", "📖"),
        ("receive", "📥"),
        ("send", "📤"),
        ("start", "🚀"),
        ("stop", "🛑"),
        ("update", "🔄"),
        ("validate", "🛡️"),
        ("write", "📝"),
    ])
});

static STATUS_EMOJI: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("attempt", "⏳"),
        ("complete", "🏁"),
        ("error", "🔥"),
        ("failure", "❌"),
        ("info", "ℹ️"),
        ("pending", "⏳"),
        ("success", "✅"),
        ("warning", "⚠️"),
    ])
});

/// Emoji for the longest segment-aligned prefix of `logger_name` in the table.
pub fn logger_emoji(logger_name: &str) -> &'static str {
    let mut candidate = logger_name;
    loop {
        if let Some(emoji) = LOGGER_EMOJI.get(candidate) {
            return *emoji;
        }
        match candidate.rfind('.') {
            Some(idx) => candidate = &candidate[..idx],
            None => return DEFAULT_LOGGER_EMOJI,
        }
    }
}

/// `[domain][action][status]` prefix; unknown values use each table's fallback.
pub fn das_prefix(domain: &str, action: &str, status: &str) -> String {
    let pick = |table: &HashMap<&'static str, &'static str>, key: &str, fallback| {
        table
            .get(key.to_ascii_lowercase().as_str())
            .copied()
            .unwrap_or(fallback)
    };
    format!(
        "[{}][{}][{}]",
        pick(&DOMAIN_EMOJI, domain, DEFAULT_DOMAIN_EMOJI),
        pick(&ACTION_EMOJI, action, DEFAULT_ACTION_EMOJI),
        pick(&STATUS_EMOJI, status, DEFAULT_STATUS_EMOJI),
    )
}

/// Records the logger-name emoji for the strip stage to fold into the message.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggerNameEmojiProcessor;

impl Processor for LoggerNameEmojiProcessor {
    fn name(&self) -> &'static str {
        "logger_name_emoji"
    }

    fn process(&self, event: &mut LogEvent) -> ProcessorResult {
        let emoji = logger_emoji(&event.logger_name);
        event.fields.insert(LOGGER_EMOJI_KEY, emoji);
        ProcessorResult::Continue
    }
}

/// Records the domain/action/status prefix when all three fields are present.
#[derive(Debug, Default, Clone, Copy)]
pub struct DasEmojiProcessor;

impl Processor for DasEmojiProcessor {
    fn name(&self) -> &'static str {
        "das_emoji"
    }

    fn process(&self, event: &mut LogEvent) -> ProcessorResult {
        let fields = &event.fields;
        let (Some(domain), Some(action), Some(status)) = (
            fields.get(DOMAIN_KEY),
            fields.get(ACTION_KEY),
            fields.get(STATUS_KEY),
        ) else {
            return ProcessorResult::Continue;
        };

        let prefix = das_prefix(
            &domain.to_string(),
            &action.to_string(),
            &status.to_string(),
        );
        event.fields.insert(DAS_EMOJI_KEY, prefix);
        ProcessorResult::Continue
    }
}
