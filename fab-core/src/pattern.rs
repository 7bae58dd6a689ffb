//! Rule name templates and matching.
//!
//! A template is either a literal, which only matches itself, or contains a single wildcard
//! `%?`. A wildcard stands in for any run of characters other than `/`, and whatever it matched
//! (the "capture") can be substituted into other templates.

use regex::Regex;

use crate::error::PatternError;

/// The wildcard token.
pub const WILDCARD: &str = "%?";
/// Placeholder for the whole resolved target name, only meaningful in commands.
pub const TARGET: &str = "%@";

/// A compiled name template.
#[derive(Debug, Clone)]
pub enum Pattern {
    Literal(String),
    Wildcard { template: String, regex: Regex },
}

impl Pattern {
    /// Compile `template`.
    ///
    /// # Errors
    ///
    /// * If the template contains the wildcard more than once.
    pub fn compile(template: &str) -> Result<Pattern, PatternError> {
        let count = template.matches(WILDCARD).count();
        if count > 1 {
            return Err(PatternError::RepeatedWildcard {
                template: template.to_string(),
                count,
            });
        }

        let Some((prefix, suffix)) = template.split_once(WILDCARD) else {
            return Ok(Pattern::Literal(template.to_string()));
        };
        let regex = format!(
            "^{}([^/]*){}$",
            regex::escape(prefix),
            regex::escape(suffix)
        );
        Ok(Pattern::Wildcard {
            template: template.to_string(),
            regex: Regex::new(&regex)?,
        })
    }

    /// The template this pattern was compiled from.
    pub fn template(&self) -> &str {
        match self {
            Pattern::Literal(template) | Pattern::Wildcard { template, .. } => template,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Pattern::Wildcard { .. })
    }

    /// Match all of `name` against this pattern.
    pub fn captures<'n>(&self, name: &'n str) -> Option<Match<'n>> {
        match self {
            Pattern::Literal(literal) => (literal == name).then_some(Match { capture: None }),
            Pattern::Wildcard { regex, .. } => {
                let captures = regex.captures(name)?;
                let capture = captures.get(1).map(|m| m.as_str());
                Some(Match { capture })
            }
        }
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.captures(name).is_some()
    }
}

/// A successful [`Pattern`] match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<'n> {
    capture: Option<&'n str>,
}

impl<'n> Match<'n> {
    /// What the wildcard stood in for, `None` for literal patterns.
    pub fn capture(&self) -> Option<&'n str> {
        self.capture
    }
}

/// Replace the wildcard in `template` with `capture`.
///
/// Without a capture the template is returned as is.
pub fn substitute(template: &str, capture: Option<&str>) -> String {
    match capture {
        Some(capture) => template.replace(WILDCARD, capture),
        None => template.to_string(),
    }
}
