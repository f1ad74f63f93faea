//! Engagement-signal vocabularies and label code tables.

use once_cell::sync::Lazy;
use regex::Regex;

macro_rules! vocab {
    ($name:ident, $pattern:expr) => {
        pub static $name: Lazy<Regex> =
            Lazy::new(|| Regex::new($pattern).expect(concat!("invalid ", stringify!($name), " regex")));
    };
}

vocab!(SECOND_PERSON, r"(?i)\b(you|your|you're|youre|yours|yourself)\b");
vocab!(LIST_MARKER, r"(?m)^\s*(\d{1,2}[.)]|[-•*→✅])\s+\S");
vocab!(
    TIME_REFERENCE,
    r"(?i)\b(today|tonight|tomorrow|morning|evening|night|daily|weekly|every day|minutes?|hours?|days?|weeks?|months?|years?)\b"
);
vocab!(
    ACTION_VERB,
    r"(?i)\b(try|start|stop|avoid|eat|drink|sleep|walk|take|add|cut|swap|track|skip|choose|switch|move|breathe|lift|stretch)\b"
);
vocab!(
    CONTROVERSY,
    r"(?i)\b(myths?|lies?|wrong|truth|overrated|underrated|unpopular|controversial|debunk(ed)?|nobody tells you|they don't want)\b"
);
vocab!(
    URGENCY,
    r"(?i)\b(now|immediately|urgent|asap|right now|before it's too late|don't wait|starting today)\b"
);
vocab!(
    CITATION,
    r"(?i)\b(study|studies|research|journal|published|according to|trials?|meta-analysis|systematic review|pubmed|doi)\b"
);
vocab!(
    STATISTIC,
    r"(?i)(\d+(\.\d+)?\s?%|\b\d+(\.\d+)?x\b|\b\d+ (out of|in) \d+\b|\bpercent\b)"
);
vocab!(
    EXPERT,
    r"(?i)\b(?:doctors?|physicians?|scientists?|researchers?|experts?|professors?|cardiologists?|neuroscientists?|dietitians?|clinical)\b|\bdr\."
);
vocab!(
    CLAIM,
    r"(?i)\b(always|never|proven|guaranteed|must|should|will|everyone|nobody|definitely|undeniably|the (best|worst|only)|science says|studies show|the fact is)\b"
);
vocab!(HASHTAG, r"#\w+");

pub const HOOK_TYPES: &[&str] = &[
    "question",
    "bold_claim",
    "statistic",
    "story",
    "myth_buster",
    "how_to",
    "contrarian",
    "list",
];

pub const CTA_TYPES: &[&str] = &["follow", "reply", "repost", "bookmark", "save", "link"];

pub const STYLES: &[&str] = &[
    "educational",
    "conversational",
    "provocative",
    "storytelling",
    "data_driven",
    "humorous",
];

pub const TOPICS: &[&str] = &[
    "sleep",
    "nutrition",
    "exercise",
    "mental_health",
    "longevity",
    "hormones",
    "gut_health",
    "supplements",
    "heart_health",
    "metabolism",
];

/// 1-based position of a normalized label in `table`; 0 for unknown or absent.
pub fn label_code(table: &[&str], label: Option<&str>) -> u32 {
    let Some(label) = label else {
        return 0;
    };
    let normalized: String = label
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect();
    table
        .iter()
        .position(|entry| *entry == normalized)
        .map(|i| i as u32 + 1)
        .unwrap_or(0)
}
