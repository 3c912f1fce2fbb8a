//! Temporal resolution for code-mixed relative time expressions.
//!
//! The resolver fixes the "current time" anchor in Indian Standard Time and
//! carries the lexicon of relative-day words the model is told how to resolve.
//! Words like Hindi `kal` or Gujarati `kaale` mean either yesterday or
//! tomorrow; without a clear future cue they resolve to the most recent past,
//! and that resolution is flagged as low confidence.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use serde::Serialize;

use crate::domain::foundation::Timestamp;

/// UTC+05:30.
pub const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Returns the Indian Standard Time offset.
pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(IST_OFFSET_SECS).expect("IST offset is within bounds")
}

/// Language a lexicon word comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Hindi,
    Gujarati,
}

/// How a relative-day word maps onto the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativeDay {
    /// A fixed offset in days from the anchor date.
    Absolute(i64),
    /// Either `n` days before or after the anchor, decided by context.
    Bidirectional(i64),
}

/// One entry of the relative-time lexicon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RelativeTimeToken {
    pub word: &'static str,
    pub language: Language,
    pub meaning: RelativeDay,
}

impl RelativeTimeToken {
    const fn new(word: &'static str, language: Language, meaning: RelativeDay) -> Self {
        Self {
            word,
            language,
            meaning,
        }
    }

    /// True for words whose direction depends on context.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self.meaning, RelativeDay::Bidirectional(_))
    }

    fn rule(&self) -> String {
        let language = match self.language {
            Language::English => "English",
            Language::Hindi => "Hindi",
            Language::Gujarati => "Gujarati",
        };
        match self.meaning {
            RelativeDay::Absolute(0) => format!("'{}' ({}): the current date", self.word, language),
            RelativeDay::Absolute(n) if n < 0 => {
                format!("'{}' ({}): {} day(s) before the current date", self.word, language, -n)
            }
            RelativeDay::Absolute(n) => {
                format!("'{}' ({}): {} day(s) after the current date", self.word, language, n)
            }
            RelativeDay::Bidirectional(n) => format!(
                "'{}' ({}): {} day(s) before OR after the current date; decide from sentence context \
                 (tense, words like 'will', 'jaish', 'jayenge'); if still ambiguous use the past date",
                self.word, language, n
            ),
        }
    }
}

static LEXICON: [RelativeTimeToken; 9] = [
    RelativeTimeToken::new("today", Language::English, RelativeDay::Absolute(0)),
    RelativeTimeToken::new("yesterday", Language::English, RelativeDay::Absolute(-1)),
    RelativeTimeToken::new("tomorrow", Language::English, RelativeDay::Absolute(1)),
    RelativeTimeToken::new("aaj", Language::Hindi, RelativeDay::Absolute(0)),
    RelativeTimeToken::new("kal", Language::Hindi, RelativeDay::Bidirectional(1)),
    RelativeTimeToken::new("parso", Language::Hindi, RelativeDay::Bidirectional(2)),
    RelativeTimeToken::new("aaje", Language::Gujarati, RelativeDay::Absolute(0)),
    RelativeTimeToken::new("kaale", Language::Gujarati, RelativeDay::Bidirectional(1)),
    RelativeTimeToken::new("kale", Language::Gujarati, RelativeDay::Bidirectional(1)),
];

/// Resolves the request anchor and model-supplied datetimes in a fixed timezone.
#[derive(Debug, Clone, Copy)]
pub struct TemporalResolver {
    offset: FixedOffset,
}

impl Default for TemporalResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TemporalResolver {
    /// Creates a resolver for Indian Standard Time.
    pub fn new() -> Self {
        Self { offset: ist() }
    }

    /// The display timezone offset.
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// The "current time" anchor for a request that began at `now`.
    pub fn anchor(&self, now: Timestamp) -> DateTime<FixedOffset> {
        now.at_offset(self.offset)
    }

    /// The relative-time lexicon.
    pub fn lexicon(&self) -> &'static [RelativeTimeToken] {
        &LEXICON
    }

    /// Resolution rules for every lexicon word, one per line.
    pub fn prompt_rules(&self) -> String {
        LEXICON
            .iter()
            .map(|token| format!("- {}", token.rule()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Lexicon words occurring in `text`, in order of first occurrence.
    pub fn scan(&self, text: &str) -> Vec<&'static RelativeTimeToken> {
        let mut found: Vec<&'static RelativeTimeToken> = Vec::new();
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let word = word.to_lowercase();
            if let Some(token) = LEXICON.iter().find(|t| t.word == word) {
                if !found.iter().any(|f| f.word == token.word) {
                    found.push(token);
                }
            }
        }
        found
    }

    /// Calendar date a token denotes, preferring the most recent past when ambiguous.
    pub fn resolve_date(&self, token: &RelativeTimeToken, anchor: DateTime<FixedOffset>) -> NaiveDate {
        let days = match token.meaning {
            RelativeDay::Absolute(n) => n,
            RelativeDay::Bidirectional(n) => -n,
        };
        (anchor + Duration::days(days)).date_naive()
    }

    /// The ambiguous word in `text` that `resolved` was defaulted from.
    ///
    /// Returns a word only when the resolved date is the most-recent-past
    /// reading of it. A datetime on any other date means context decided the
    /// direction, or the word was not a time reference at all.
    pub fn past_default(
        &self,
        text: &str,
        resolved: Option<DateTime<FixedOffset>>,
        anchor: DateTime<FixedOffset>,
    ) -> Option<&'static RelativeTimeToken> {
        let resolved = self.normalize(resolved?).date_naive();
        let anchor = self.normalize(anchor);
        self.scan(text)
            .into_iter()
            .filter(|token| token.is_ambiguous())
            .find(|token| self.resolve_date(token, anchor) == resolved)
    }

    /// Expresses any instant in the display timezone.
    pub fn normalize(&self, dt: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        dt.with_timezone(&self.offset)
    }

    /// Parses a model-supplied datetime string.
    ///
    /// Accepts RFC 3339 with an offset, naive date-times (interpreted in the
    /// display timezone) and bare dates (given the anchor's time of day).
    /// Returns `None` for anything else.
    pub fn parse_datetime(&self, raw: &str, anchor: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(self.normalize(dt));
        }

        const NAIVE_FORMATS: [&str; 4] = [
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%dT%H:%M",
            "%Y-%m-%d %H:%M",
        ];
        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
                return self.offset.from_local_datetime(&naive).single();
            }
        }

        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            let naive = date.and_time(anchor.with_timezone(&self.offset).time());
            return self.offset.from_local_datetime(&naive).single();
        }

        None
    }
}
