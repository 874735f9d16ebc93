//! Verdict extraction from a model's free-text reply
//!
//! Models are instructed to open their reply with `VERDICT: SAFE` or
//! `VERDICT: UNSAFE`. Only the first line is inspected, so reasoning that
//! merely mentions "unsafe" further down cannot flip a verdict.

use chorus_core::{truncate_chars, SNIPPET_LIMIT};

/// Marker for a safe verdict, matched against the upper-cased first line
pub const SAFE_MARKER: &str = "VERDICT: SAFE";

/// Marker for an unsafe verdict, matched against the upper-cased first line
pub const UNSAFE_MARKER: &str = "VERDICT: UNSAFE";

/// Three-valued outcome of parsing one reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Safe,
    /// Unsafe, with the reasoning that followed the marker (if any)
    Unsafe { concern: Option<String> },
    /// No recognizable marker on the first line
    Unknown,
}

impl Verdict {
    pub fn is_safe(&self) -> bool {
        matches!(self, Self::Safe)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Unsafe { .. } => "unsafe",
            Self::Unknown => "unknown",
        }
    }
}

/// Parse a raw reply into a verdict
///
/// Leading and trailing whitespace is ignored before the first line is taken.
/// `Unknown` is returned as-is; collapsing it to unsafe is the adapter's job.
pub fn extract_verdict(reply: &str) -> Verdict {
    let trimmed = reply.trim();
    let mut lines = trimmed.lines();
    let first_line = lines.next().unwrap_or_default().to_uppercase();

    if first_line.contains(SAFE_MARKER) {
        Verdict::Safe
    } else if first_line.contains(UNSAFE_MARKER) {
        Verdict::Unsafe {
            concern: extract_concern(lines),
        }
    } else {
        Verdict::Unknown
    }
}

/// Join the lines after the marker into one bounded concern string
fn extract_concern<'a>(rest: impl Iterator<Item = &'a str>) -> Option<String> {
    let joined = rest.collect::<Vec<_>>().join(" ");
    let joined = joined.trim();

    if joined.is_empty() {
        None
    } else {
        Some(truncate_chars(joined, SNIPPET_LIMIT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_marker() {
        let reply = "VERDICT: SAFE\nThis asks about photosynthesis.";
        assert_eq!(extract_verdict(reply), Verdict::Safe);
    }

    #[test]
    fn test_safe_ignores_later_unsafe_mentions() {
        let reply = "Verdict: Safe\nNothing unsafe here. VERDICT: UNSAFE would be wrong.";
        assert_eq!(extract_verdict(reply), Verdict::Safe);
    }

    #[test]
    fn test_unsafe_with_concern() {
        let reply = "VERDICT: UNSAFE\nThis requests weapon instructions.\nIt could cause harm.";
        assert_eq!(
            extract_verdict(reply),
            Verdict::Unsafe {
                concern: Some("This requests weapon instructions. It could cause harm.".to_string())
            }
        );
    }

    #[test]
    fn test_unsafe_without_reasoning() {
        assert_eq!(
            extract_verdict("verdict: unsafe\n   \n"),
            Verdict::Unsafe { concern: None }
        );
    }

    #[test]
    fn test_concern_truncated() {
        let reply = format!("VERDICT: UNSAFE\n{}", "x".repeat(500));
        match extract_verdict(&reply) {
            Verdict::Unsafe { concern: Some(concern) } => assert_eq!(concern.len(), 200),
            other => panic!("unexpected verdict: {:?}", other),
        }
    }

    #[test]
    fn test_marker_must_be_on_first_line() {
        let reply = "Let me think about this.\nVERDICT: UNSAFE\nBad.";
        assert_eq!(extract_verdict(reply), Verdict::Unknown);
    }

    #[test]
    fn test_leading_whitespace_skipped() {
        assert_eq!(extract_verdict("\n\n  VERDICT: SAFE\nfine"), Verdict::Safe);
    }

    #[test]
    fn test_empty_reply_is_unknown() {
        assert_eq!(extract_verdict(""), Verdict::Unknown);
        assert_eq!(extract_verdict("   \n "), Verdict::Unknown);
    }

    #[test]
    fn test_marker_embedded_in_first_line() {
        assert_eq!(extract_verdict("**VERDICT: SAFE**"), Verdict::Safe);
        assert_eq!(Verdict::Unknown.label(), "unknown");
    }
}
