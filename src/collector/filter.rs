//! Resource name 필터링
//!
//! Decides whether a resource (queue, topic, route...) is reported. Every
//! include pattern must match the WHOLE name, so patterns are compiled
//! anchored. Names with the broker's temporary or system prefixes are hidden
//! unless explicitly shown.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::PatternError;

/// Prefix of temporary destinations
pub const TMP_PREFIX: &str = "$TMP$.";

/// Prefix of system destinations
pub const SYSTEM_PREFIX: &str = "$sys.";

/// Compiled whole-name pattern
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    regex: Regex,
}

impl Pattern {
    /// 패턴 컴파일 (전체 이름 매칭)
    pub fn new(raw: &str) -> Result<Self, PatternError> {
        let regex = Regex::new(&format!("^(?:{})$", raw)).map_err(|source| {
            PatternError::InvalidPattern {
                pattern: raw.to_string(),
                source,
            }
        })?;

        Ok(Self {
            raw: raw.to_string(),
            regex,
        })
    }

    /// Source pattern text
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True when the pattern matches the whole name
    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

/// Compile a pattern list, dropping the ones that fail
///
/// Dropped patterns are logged and returned so callers can report them.
pub fn compile_patterns(raw: &[String]) -> (Vec<Pattern>, Vec<PatternError>) {
    let mut patterns = Vec::with_capacity(raw.len());
    let mut errors = Vec::new();

    for p in raw {
        match Pattern::new(p) {
            Ok(pattern) => patterns.push(pattern),
            Err(e) => {
                warn!(pattern = %p, error = %e, "Ignoring invalid name pattern");
                errors.push(e);
            }
        }
    }

    (patterns, errors)
}

fn hidden_by_prefix(name: &str, show_system: bool, show_temp: bool) -> bool {
    (!show_temp && name.starts_with(TMP_PREFIX)) || (!show_system && name.starts_with(SYSTEM_PREFIX))
}

/// Include-only decision
///
/// A name is reported only if it passes the temp/system checks and some
/// include pattern matches it entirely. An empty include list reports nothing.
pub fn should_include(
    name: Option<&str>,
    include: &[Pattern],
    show_system: bool,
    show_temp: bool,
) -> bool {
    let Some(name) = name else {
        return false;
    };

    if hidden_by_prefix(name, show_system, show_temp) {
        return false;
    }

    include.iter().any(|p| p.matches(name))
}

/// Include/exclude decision used by older configurations
///
/// When include patterns exist only a matching name is reported. Exclude
/// patterns are consulted only when there are no include patterns, and a
/// name matching none of them is reported. With neither list nothing is.
pub fn should_include_legacy(
    name: Option<&str>,
    include: &[Pattern],
    exclude: &[Pattern],
    show_system: bool,
    show_temp: bool,
) -> bool {
    let Some(name) = name else {
        return false;
    };

    if hidden_by_prefix(name, show_system, show_temp) {
        return false;
    }

    if !include.is_empty() {
        include.iter().any(|p| p.matches(name))
    } else if !exclude.is_empty() {
        !exclude.iter().any(|p| p.matches(name))
    } else {
        false
    }
}

/// Which inclusion rule a filter applies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Only names matching an include pattern are reported
    #[default]
    IncludeOnly,
    /// Include patterns first, then exclude patterns
    Legacy,
}

/// Per-category name filter
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    pub include: Vec<Pattern>,
    pub exclude: Vec<Pattern>,
    pub show_system: bool,
    pub show_temp: bool,
    pub mode: FilterMode,
}

impl FilterConfig {
    /// Include-only filter from raw patterns
    pub fn include_only(include: &[String], show_system: bool, show_temp: bool) -> Self {
        let (include, _) = compile_patterns(include);
        Self {
            include,
            exclude: Vec::new(),
            show_system,
            show_temp,
            mode: FilterMode::IncludeOnly,
        }
    }

    /// Filter from raw include/exclude patterns with an explicit mode
    pub fn from_patterns(
        include: &[String],
        exclude: &[String],
        show_system: bool,
        show_temp: bool,
        mode: FilterMode,
    ) -> Self {
        let (include, _) = compile_patterns(include);
        let (exclude, _) = compile_patterns(exclude);
        Self {
            include,
            exclude,
            show_system,
            show_temp,
            mode,
        }
    }

    /// Whether a resource with this name is reported
    pub fn allows(&self, name: Option<&str>) -> bool {
        match self.mode {
            FilterMode::IncludeOnly => {
                should_include(name, &self.include, self.show_system, self.show_temp)
            }
            FilterMode::Legacy => should_include_legacy(
                name,
                &self.include,
                &self.exclude,
                self.show_system,
                self.show_temp,
            ),
        }
    }
}
