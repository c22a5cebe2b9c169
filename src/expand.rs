//! Template variable references
//!
//! Output templates embed two reference forms: plain `[name]`, substituted
//! with the current capture, and recursive `$[name]`, whose capture is
//! re-dispatched through the engine as a fresh utterance.

use thiserror::Error;

/// Why template expansion failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExpandError {
    #[error("recursive variable [{0}] produced no response")]
    EmptyRecursion(String),

    #[error("expansion recursion exceeded depth {0}")]
    DepthExceeded(usize),
}

/// A variable reference found in an output template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarRef {
    /// Byte offset where the reference starts (`[`, or the `$` before it).
    pub start: usize,
    pub name: String,
    pub recursive: bool,
}

impl VarRef {
    /// Length of the reference in the template: the name plus two
    /// delimiters, plus one more for the recursive marker.
    pub fn len(&self) -> usize {
        self.name.len() + if self.recursive { 3 } else { 2 }
    }

    /// Byte offset just past the reference.
    pub fn end(&self) -> usize {
        self.start + self.len()
    }
}

fn is_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

/// Find the next variable reference at or after `offset`. Bracket pairs
/// that do not hold a valid name are treated as literal text.
pub fn parse_variable(template: &str, offset: usize) -> Option<VarRef> {
    let bytes = template.as_bytes();
    let mut i = offset;

    while i < bytes.len() {
        if bytes[i] == b'[' {
            if let Some(close) = template[i + 1..].find(']') {
                let name = &template[i + 1..i + 1 + close];
                if is_name(name) {
                    let recursive = i > offset && bytes[i - 1] == b'$';
                    let start = if recursive { i - 1 } else { i };
                    return Some(VarRef {
                        start,
                        name: name.to_string(),
                        recursive,
                    });
                }
            }
        }
        i += 1;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_reference() {
        let r = parse_variable("nice to meet you [name]", 0).unwrap();
        assert_eq!(r.start, 17);
        assert_eq!(r.name, "name");
        assert!(!r.recursive);
        assert_eq!(r.len(), 6);
        assert_eq!(r.end(), 23);
    }

    #[test]
    fn test_recursive_reference() {
        let template = "I heard $[q]";
        let r = parse_variable(template, 0).unwrap();
        assert_eq!(r.start, 8);
        assert_eq!(r.name, "q");
        assert!(r.recursive);
        assert_eq!(&template[r.start..r.end()], "$[q]");
    }

    #[test]
    fn test_scan_resumes_after_offset() {
        let template = "[a] and [b]";
        let first = parse_variable(template, 0).unwrap();
        assert_eq!(first.name, "a");
        let second = parse_variable(template, first.end()).unwrap();
        assert_eq!(second.name, "b");
        assert!(parse_variable(template, second.end()).is_none());
    }

    #[test]
    fn test_no_reference() {
        assert!(parse_variable("plain text", 0).is_none());
        assert!(parse_variable("", 0).is_none());
    }

    #[test]
    fn test_invalid_names_are_literal() {
        assert!(parse_variable("a [b c] d", 0).is_none());
        assert!(parse_variable("weird [!] stuff", 0).is_none());
        // An invalid pair does not hide a later valid one.
        let r = parse_variable("[] then [ok]", 0).unwrap();
        assert_eq!(r.name, "ok");
    }

    #[test]
    fn test_dollar_at_scan_start_is_plain() {
        // The marker must precede the bracket within the scanned region;
        // a reference at the very start of the scan has nothing before it.
        let r = parse_variable("[q]", 0).unwrap();
        assert!(!r.recursive);
    }

    #[test]
    fn test_unterminated_bracket() {
        assert!(parse_variable("hello [name", 0).is_none());
    }
}
