//! Comment templates with a fixed set of named placeholders.
//!
//! Templates are parsed once when the configuration is loaded, so a typo in a
//! placeholder is reported before any ticket is touched. Literal braces are
//! written as `{{` and `}}`.

use crate::errors::TemplateError;
use std::fmt;

/// A value that can be interpolated into a comment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    StaleDays,
    WarningDays,
    WarningLabel,
    DoneLabel,
}

impl Placeholder {
    pub const ALL: [Placeholder; 4] = [
        Placeholder::StaleDays,
        Placeholder::WarningDays,
        Placeholder::WarningLabel,
        Placeholder::DoneLabel,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Placeholder::StaleDays => "stale_days",
            Placeholder::WarningDays => "warning_days",
            Placeholder::WarningLabel => "warning_label",
            Placeholder::DoneLabel => "done_label",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// Placeholders a warning comment may use
pub const WARNING_PLACEHOLDERS: &[Placeholder] = &[
    Placeholder::StaleDays,
    Placeholder::WarningDays,
    Placeholder::WarningLabel,
];

/// Placeholders a done comment may use
pub const DONE_PLACEHOLDERS: &[Placeholder] = &[
    Placeholder::WarningDays,
    Placeholder::WarningLabel,
    Placeholder::DoneLabel,
];

/// Values substituted into a template
#[derive(Debug, Clone, Copy)]
pub struct TemplateParams<'a> {
    pub stale_days: u32,
    pub warning_days: u32,
    pub warning_label: &'a str,
    pub done_label: &'a str,
}

impl TemplateParams<'_> {
    fn value(&self, placeholder: Placeholder) -> String {
        match placeholder {
            Placeholder::StaleDays => self.stale_days.to_string(),
            Placeholder::WarningDays => self.warning_days.to_string(),
            Placeholder::WarningLabel => self.warning_label.to_string(),
            Placeholder::DoneLabel => self.done_label.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Value(Placeholder),
}

/// A parsed, validated comment template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl CommentTemplate {
    /// Parse `source`, accepting only the placeholders in `allowed`.
    ///
    /// `context` names the template in error messages ("warning", "done").
    ///
    /// # Examples
    ///
    /// ```
    /// use stalebot::template::{CommentTemplate, TemplateParams, DONE_PLACEHOLDERS};
    ///
    /// let template = CommentTemplate::parse(
    ///     "Closed after {warning_days} days as {{{done_label}}}.",
    ///     "done",
    ///     DONE_PLACEHOLDERS,
    /// )
    /// .unwrap();
    ///
    /// let params = TemplateParams {
    ///     stale_days: 30,
    ///     warning_days: 7,
    ///     warning_label: "stale",
    ///     done_label: "auto-closed",
    /// };
    /// assert_eq!(template.render(&params), "Closed after 7 days as {auto-closed}.");
    ///
    /// // stale_days is not available to done comments
    /// assert!(CommentTemplate::parse("{stale_days}", "done", DONE_PLACEHOLDERS).is_err());
    /// ```
    pub fn parse(
        source: &str,
        context: &str,
        allowed: &[Placeholder],
    ) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((offset, c)) = chars.next() {
            match c {
                '{' if chars.peek().map(|&(_, next)| next) == Some('{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek().map(|&(_, next)| next) == Some('}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(TemplateError::UnbalancedBrace { brace: '}', offset }),
                '{' => {
                    let rest = &source[offset + 1..];
                    let end = rest
                        .find('}')
                        .ok_or(TemplateError::UnbalancedBrace { brace: '{', offset })?;
                    let name = &rest[..end];
                    if name.is_empty() {
                        return Err(TemplateError::EmptyPlaceholder(offset));
                    }
                    if let Some(split) = name.find([':', '!']) {
                        return Err(TemplateError::UnsupportedFormatSpec {
                            name: name[..split].to_string(),
                            spec: name[split..].to_string(),
                        });
                    }

                    let placeholder = Placeholder::from_name(name)
                        .ok_or_else(|| TemplateError::UnknownPlaceholder(name.to_string()))?;
                    if !allowed.contains(&placeholder) {
                        return Err(TemplateError::PlaceholderNotAllowed {
                            name: name.to_string(),
                            context: context.to_string(),
                        });
                    }

                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Value(placeholder));

                    // Skip the placeholder body and its closing brace
                    while let Some((i, _)) = chars.peek() {
                        if *i > offset + end + 1 {
                            break;
                        }
                        chars.next();
                    }
                }
                other => literal.push(other),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Placeholders referenced by this template, in order of appearance
    pub fn placeholders(&self) -> Vec<Placeholder> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Value(p) => Some(*p),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    pub fn render(&self, params: &TemplateParams<'_>) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.clone(),
                Segment::Value(p) => params.value(*p),
            })
            .collect()
    }
}

impl fmt::Display for CommentTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> TemplateParams<'static> {
        TemplateParams {
            stale_days: 60,
            warning_days: 14,
            warning_label: "stale-major",
            done_label: "auto-deprioritized-major",
        }
    }

    #[test]
    fn test_render_all_warning_placeholders() {
        let template = CommentTemplate::parse(
            "Idle for {stale_days}d, marked {warning_label}, {warning_days}d to respond",
            "warning",
            WARNING_PLACEHOLDERS,
        )
        .unwrap();
        assert_eq!(
            template.render(&params()),
            "Idle for 60d, marked stale-major, 14d to respond"
        );
        assert_eq!(
            template.placeholders(),
            vec![
                Placeholder::StaleDays,
                Placeholder::WarningLabel,
                Placeholder::WarningDays
            ]
        );
    }

    #[test]
    fn test_adjacent_placeholders_and_repeats() {
        let template =
            CommentTemplate::parse("{done_label}{done_label}", "done", DONE_PLACEHOLDERS).unwrap();
        assert_eq!(
            template.render(&params()),
            "auto-deprioritized-majorauto-deprioritized-major"
        );
    }

    #[test]
    fn test_plain_text_and_escapes() {
        let template = CommentTemplate::parse("a {{b}} c", "done", DONE_PLACEHOLDERS).unwrap();
        assert_eq!(template.render(&params()), "a {b} c");
        assert!(template.placeholders().is_empty());
        assert_eq!(template.to_string(), "a {{b}} c");
    }

    #[test]
    fn test_multibyte_text_around_placeholders() {
        let template =
            CommentTemplate::parse("→ {warning_label} ✓", "warning", WARNING_PLACEHOLDERS).unwrap();
        assert_eq!(template.render(&params()), "→ stale-major ✓");
    }

    #[test]
    fn test_unknown_placeholder() {
        let err = CommentTemplate::parse("{stale_dayz}", "warning", WARNING_PLACEHOLDERS)
            .unwrap_err();
        assert_eq!(err, TemplateError::UnknownPlaceholder("stale_dayz".to_string()));
    }

    #[test]
    fn test_placeholder_not_allowed_in_context() {
        let err =
            CommentTemplate::parse("{done_label}", "warning", WARNING_PLACEHOLDERS).unwrap_err();
        assert_eq!(
            err,
            TemplateError::PlaceholderNotAllowed {
                name: "done_label".to_string(),
                context: "warning".to_string(),
            }
        );
    }

    #[test]
    fn test_unbalanced_braces() {
        assert_eq!(
            CommentTemplate::parse("oops {", "done", DONE_PLACEHOLDERS).unwrap_err(),
            TemplateError::UnbalancedBrace {
                brace: '{',
                offset: 5
            }
        );
        assert_eq!(
            CommentTemplate::parse("oops }", "done", DONE_PLACEHOLDERS).unwrap_err(),
            TemplateError::UnbalancedBrace {
                brace: '}',
                offset: 5
            }
        );
    }

    #[test]
    fn test_placeholder_names_are_exact() {
        assert_eq!(
            CommentTemplate::parse("{ stale_days }", "warning", WARNING_PLACEHOLDERS).unwrap_err(),
            TemplateError::UnknownPlaceholder(" stale_days ".to_string())
        );
    }

    #[test]
    fn test_format_specs_are_rejected() {
        assert_eq!(
            CommentTemplate::parse("{stale_days:d}", "warning", WARNING_PLACEHOLDERS).unwrap_err(),
            TemplateError::UnsupportedFormatSpec {
                name: "stale_days".to_string(),
                spec: ":d".to_string(),
            }
        );
        assert!(matches!(
            CommentTemplate::parse("{warning_label!r}", "warning", WARNING_PLACEHOLDERS),
            Err(TemplateError::UnsupportedFormatSpec { .. })
        ));
    }

    #[test]
    fn test_empty_placeholder() {
        assert_eq!(
            CommentTemplate::parse("x {} y", "done", DONE_PLACEHOLDERS).unwrap_err(),
            TemplateError::EmptyPlaceholder(2)
        );
    }
}
