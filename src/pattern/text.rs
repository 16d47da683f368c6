//! Text leaf combinator.

use regex::Regex;

use crate::context::Context;
use crate::location::Location;
use crate::outcome::{Failure, MatchData, MatchRecord, MatchResult, ParseResult, Success};
use crate::pattern::Parser;
use crate::span::Span;

enum TextPattern {
    Literal { text: String, fold_case: bool },
    Re(Regex),
}

/// Match text anchored at the text cursor.
///
/// This is a match, not a search: the pattern must hold starting exactly at
/// the current text offset, and only up to the scan end. On success the
/// text cursor advances by the match length and the annotation cursor is
/// realigned. A named regex match records the matched text and its capture
/// groups.
pub struct Text {
    pattern: TextPattern,
    name: Option<String>,
}

impl Text {
    /// Case-sensitive literal.
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            pattern: TextPattern::Literal {
                text: text.into(),
                fold_case: false,
            },
            name: None,
        }
    }

    /// Case-insensitive literal, folded by Unicode lowercase expansion.
    pub fn literal_nocase(text: impl Into<String>) -> Self {
        Self {
            pattern: TextPattern::Literal {
                text: text.into(),
                fold_case: true,
            },
            name: None,
        }
    }

    /// Compiled regular expression; `(?i)` inside the pattern controls
    /// case sensitivity.
    pub fn regex(re: Regex) -> Self {
        Self {
            pattern: TextPattern::Re(re),
            name: None,
        }
    }

    /// Record the match under `name`.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl Parser for Text {
    fn parse(&self, loc: Location, ctx: &Context) -> ParseResult {
        let rest = &ctx.doc()[loc.text_offset..ctx.end()];
        let (len, text, groups) = match &self.pattern {
            TextPattern::Literal { text, fold_case } => {
                match literal_prefix_len(rest, text, *fold_case) {
                    Some(len) => (len, rest[..len].to_string(), Vec::new()),
                    None => {
                        return Err(Failure::new(
                            "Text",
                            format!("literal {text:?} does not match here"),
                            loc,
                        ));
                    }
                }
            }
            TextPattern::Re(re) => {
                // Leftmost-first search: if any match starts at offset zero
                // the leftmost one does, so this is an anchored match.
                let caps = match re.captures(rest) {
                    Some(c) if c.get(0).is_some_and(|m| m.start() == 0) => c,
                    _ => {
                        return Err(Failure::new(
                            "Text",
                            format!("pattern /{}/ does not match here", re.as_str()),
                            loc,
                        ));
                    }
                };
                let whole = &caps[0];
                let groups = (1..caps.len())
                    .map(|i| caps.get(i).map(|m| m.as_str().to_string()))
                    .collect();
                (whole.len(), whole.to_string(), groups)
            }
        };

        let span = Span::new(loc.text_offset, loc.text_offset + len);
        let next = ctx.advance_by_offset(loc, len);
        let mut result = MatchResult::plain(next, span);
        if let Some(name) = &self.name {
            result.matches.push(MatchRecord {
                name: name.clone(),
                location: loc,
                span,
                data: MatchData::Text { text, groups },
            });
        }
        Ok(Success::single(result))
    }
}

/// Byte length of the prefix of `rest` matching `want`, if any.
fn literal_prefix_len(rest: &str, want: &str, fold_case: bool) -> Option<usize> {
    if !fold_case {
        return rest.starts_with(want).then_some(want.len());
    }
    let mut len = 0;
    let mut rest_chars = rest.chars();
    for want_ch in want.chars() {
        let rest_ch = rest_chars.next()?;
        if !unicode_case_eq_char(rest_ch, want_ch) {
            return None;
        }
        len += rest_ch.len_utf8();
    }
    Some(len)
}

fn unicode_case_eq_char(a: char, b: char) -> bool {
    a.to_lowercase().eq(b.to_lowercase())
}
