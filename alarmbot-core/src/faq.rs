//! Free-text FAQ matcher.
//!
//! An ordered list of case-insensitive regex patterns, each mapped to a canned
//! reply. Patterns are anchored at the start of the text, so a keyword buried
//! later in a sentence does not match. The first matching pattern wins; text
//! matching nothing gets [`FALLBACK_REPLY`].

use regex::{Regex, RegexBuilder};
use thiserror::Error;

use crate::knowledge::{
    APR, CIRCUIT_PACK_FAILED, HIGH_FIBER_LOSS, HIGH_RECEIVED_SPAN_LOSS, LOW_ORL, OSC_LOS,
    POWER_FAILURE, SHUTOFF_THRESHOLD_CROSSED,
};

/// Reply for text no pattern matches.
pub const FALLBACK_REPLY: &str = "I'm not sure about that. Please contact the support team.";

/// Built-in patterns, in priority order.
const BUILTIN_RULES: &[(&str, &str)] = &[
    (r"\bhi\b|\bhello\b|\bhey\b", "Hello! How can I assist you today?"),
    (
        r"\bAPR\b|\bAutomatic Power Reduction\b|\bAPR alarm\b|\bresolve APR alarm\b",
        APR,
    ),
    (
        r"\bOSC Los\b|\bOSCLOS\b|\bosc\b|\bOptical Line Fail\b|\bOptical Line Failed\b|\bOpticalLine\b|\bLD_Input\b|\bLD Input\b|\blos\b",
        OSC_LOS,
    ),
    (
        r"\bPower Failure - A\b|\bPower Failure - B\b|\bPower\b",
        POWER_FAILURE,
    ),
    (
        r"\bShutoff Threshold Crossed\b|\bShutoff\b",
        SHUTOFF_THRESHOLD_CROSSED,
    ),
    (
        r"\bhigh Received Span loss\b|\bSpan Loss\b|\bSpan\b",
        HIGH_RECEIVED_SPAN_LOSS,
    ),
    (r"\bHigh Fiber Loss\b|\bHighFiber\b|\bHFL\b", HIGH_FIBER_LOSS),
    (r"\b(.*)Circuit Pack Fail\b", CIRCUIT_PACK_FAILED),
    (
        r"\bLow Orl\b|\bORL\b|\blow optical return loss at output\b",
        LOW_ORL,
    ),
    (r"\bbye\b|\bgoodbye\b", "Goodbye! Have a great day!"),
];

/// Errors raised while compiling FAQ patterns.
#[derive(Debug, Error)]
pub enum FaqError {
    /// A pattern is not a valid regular expression.
    #[error("invalid FAQ pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// The underlying regex error.
        source: regex::Error,
    },
}

#[derive(Debug, Clone)]
struct FaqRule {
    pattern: Regex,
    reply: String,
}

/// Compiled, ordered FAQ patterns.
#[derive(Debug, Clone)]
pub struct FaqMatcher {
    rules: Vec<FaqRule>,
}

impl FaqMatcher {
    /// Compile `(pattern, reply)` pairs. Patterns match case-insensitively and
    /// only at the start of the text.
    ///
    /// # Errors
    ///
    /// Returns [`FaqError::InvalidPattern`] for the first pattern that fails
    /// to compile.
    pub fn new<P, R>(rules: impl IntoIterator<Item = (P, R)>) -> Result<Self, FaqError>
    where
        P: AsRef<str>,
        R: Into<String>,
    {
        let rules = rules
            .into_iter()
            .map(|(pattern, reply)| {
                let pattern = pattern.as_ref();
                RegexBuilder::new(&format!("^(?:{pattern})"))
                    .case_insensitive(true)
                    .build()
                    .map(|pattern| FaqRule {
                        pattern,
                        reply: reply.into(),
                    })
                    .map_err(|source| FaqError::InvalidPattern {
                        pattern: pattern.to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// The built-in troubleshooting FAQ.
    pub fn builtin() -> Result<Self, FaqError> {
        Self::new(BUILTIN_RULES.iter().copied())
    }

    /// Reply for `text`: the first matching rule, else [`FALLBACK_REPLY`].
    pub fn respond(&self, text: &str) -> &str {
        self.rules
            .iter()
            .find(|r| r.pattern.is_match(text))
            .map(|r| r.reply.as_str())
            .unwrap_or(FALLBACK_REPLY)
    }

    /// Number of compiled rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rules are compiled.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
