//! # Document Paths
//!
//! Immutable addresses of a node inside a document tree.
//!
//! A path is a sequence of key and index segments, written as
//! `/server/endpoints[0]/port`: `/name` steps into a table by key, `[n]`
//! steps into an array (or table array) by position. The empty string is
//! the root path.

use crate::document::{Document, DocumentNode, node_kind};
use errors::PathError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One step of a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl Segment {
    fn apply<'a>(&self, node: &'a DocumentNode) -> Result<&'a DocumentNode, PathError> {
        let kind = node_kind(node);
        match (self, node) {
            (Segment::Key(key), DocumentNode::Table(table)) => table
                .get(key)
                .ok_or_else(|| self.navigation(kind, "key not present")),
            (Segment::Index(index), DocumentNode::Array(items)) => items
                .get(*index)
                .ok_or_else(|| self.navigation(kind, "index out of range")),
            (Segment::Key(_), _) => Err(self.navigation(kind, "not a table")),
            (Segment::Index(_), _) => Err(self.navigation(kind, "not an array")),
        }
    }

    fn apply_mut<'a>(&self, node: &'a mut DocumentNode) -> Result<&'a mut DocumentNode, PathError> {
        let kind = node_kind(node);
        match (self, node) {
            (Segment::Key(key), DocumentNode::Table(table)) => table
                .get_mut(key)
                .ok_or_else(|| self.navigation(kind, "key not present")),
            (Segment::Index(index), DocumentNode::Array(items)) => items
                .get_mut(*index)
                .ok_or_else(|| self.navigation(kind, "index out of range")),
            (Segment::Key(_), _) => Err(self.navigation(kind, "not a table")),
            (Segment::Index(_), _) => Err(self.navigation(kind, "not an array")),
        }
    }

    fn navigation(&self, found: &str, reason: &str) -> PathError {
        PathError::Navigation {
            segment: self.to_string(),
            found: found.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => write!(f, "/{key}"),
            Segment::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// An immutable, composable address into a document.
///
/// Appending a segment returns a new path and leaves the receiver untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    pub fn root() -> Self {
        Path::default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn with_key(&self, key: impl Into<String>) -> Path {
        self.with_segment(Segment::Key(key.into()))
    }

    pub fn with_index(&self, index: usize) -> Path {
        self.with_segment(Segment::Index(index))
    }

    fn with_segment(&self, segment: Segment) -> Path {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Path { segments }
    }

    /// Segments, oldest first.
    pub fn segments(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }

    /// Split into the containing path and the final segment.
    pub fn parent(&self) -> Option<(Path, &Segment)> {
        let (last, prefix) = self.segments.split_last()?;
        Some((
            Path {
                segments: prefix.to_vec(),
            },
            last,
        ))
    }

    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Navigate from `root` to the node this path names.
    pub fn apply<'a>(&self, root: &'a DocumentNode) -> Result<&'a DocumentNode, PathError> {
        self.segments
            .iter()
            .try_fold(root, |node, segment| segment.apply(node))
    }

    /// Navigate from a document root.
    pub fn apply_in<'a>(&self, root: &'a Document) -> Result<Option<&'a DocumentNode>, PathError> {
        let Some((first, rest)) = self.segments.split_first() else {
            return Ok(None);
        };
        let start = match first {
            Segment::Key(key) => root.get(key).ok_or_else(|| PathError::Navigation {
                segment: first.to_string(),
                found: "table".to_string(),
                reason: "key not present".to_string(),
            })?,
            Segment::Index(_) => return Err(root_index_error(first)),
        };
        rest.iter()
            .try_fold(start, |node, segment| segment.apply(node))
            .map(Some)
    }

    /// Remove the entry named by the final key segment from its containing table.
    ///
    /// Returns whether anything was removed.
    pub fn clear(&self, root: &mut Document) -> Result<bool, PathError> {
        let Some((prefix, last)) = self.parent() else {
            return Err(PathError::Unclearable {
                path: self.to_string(),
            });
        };
        let Segment::Key(key) = last else {
            return Err(PathError::Unclearable {
                path: self.to_string(),
            });
        };

        let table = table_at_mut(root, &prefix.segments)?;
        Ok(table.remove(key).is_some())
    }

    /// Place `node` at this path, creating intermediate tables for missing keys.
    ///
    /// An index segment must name an existing element; the final segment may
    /// also name the position one past the end, which appends.
    pub fn insert(&self, root: &mut Document, node: DocumentNode) -> Result<Option<DocumentNode>, PathError> {
        let Some((last, prefix)) = self.segments.split_last() else {
            return Err(PathError::Navigation {
                segment: String::new(),
                found: "table".to_string(),
                reason: "cannot replace the document root".to_string(),
            });
        };

        let mut current: &mut DocumentNode = match prefix.first() {
            None => return insert_into_table(root, last, node),
            Some(Segment::Key(key)) => root
                .entry(key.clone())
                .or_insert_with(|| DocumentNode::Table(Document::new())),
            Some(first @ Segment::Index(_)) => return Err(root_index_error(first)),
        };

        for segment in &prefix[1..] {
            current = match segment {
                Segment::Key(key) => match current {
                    DocumentNode::Table(table) => table
                        .entry(key.clone())
                        .or_insert_with(|| DocumentNode::Table(Document::new())),
                    other => return Err(segment.navigation(node_kind(other), "not a table")),
                },
                Segment::Index(_) => segment.apply_mut(current)?,
            };
        }

        let kind = node_kind(current);
        match current {
            DocumentNode::Table(table) => insert_into_table(table, last, node),
            DocumentNode::Array(items) => match last {
                Segment::Index(index) if *index < items.len() => {
                    Ok(Some(std::mem::replace(&mut items[*index], node)))
                }
                Segment::Index(index) if *index == items.len() => {
                    items.push(node);
                    Ok(None)
                }
                Segment::Index(_) => Err(last.navigation(kind, "index out of range")),
                Segment::Key(_) => Err(last.navigation(kind, "not a table")),
            },
            _ => Err(last.navigation(kind, "not a container")),
        }
    }

    /// Parse the textual form, e.g. `/server/endpoints[0]/port`.
    pub fn parse(input: &str) -> Result<Path, PathError> {
        let format_error = |offset: usize, reason: &str| PathError::Format {
            input: input.to_string(),
            offset,
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut chars = input.char_indices().peekable();

        while let Some((offset, c)) = chars.next() {
            match c {
                '/' => {
                    let mut key = String::new();
                    while let Some(&(at, next)) = chars.peek() {
                        match next {
                            '/' | '[' => break,
                            ']' => return Err(format_error(at, "unexpected ']' in key")),
                            _ => {
                                key.push(next);
                                chars.next();
                            }
                        }
                    }
                    segments.push(Segment::Key(key));
                }
                '[' => {
                    let mut digits = String::new();
                    let mut closed = false;
                    for (at, next) in chars.by_ref() {
                        if next == ']' {
                            closed = true;
                            break;
                        }
                        if !next.is_ascii_digit() {
                            return Err(format_error(at, "index must be a non-negative integer"));
                        }
                        digits.push(next);
                    }
                    if !closed {
                        return Err(format_error(offset, "index has no closing ']'"));
                    }
                    let index = digits
                        .parse::<usize>()
                        .map_err(|_| format_error(offset, "index must be a non-negative integer"))?;
                    segments.push(Segment::Index(index));
                }
                _ => return Err(format_error(offset, "expected '/' or '['")),
            }
        }

        Ok(Path { segments })
    }
}

fn root_index_error(segment: &Segment) -> PathError {
    PathError::Navigation {
        segment: segment.to_string(),
        found: "table".to_string(),
        reason: "not an array".to_string(),
    }
}

fn insert_into_table(
    table: &mut Document,
    last: &Segment,
    node: DocumentNode,
) -> Result<Option<DocumentNode>, PathError> {
    match last {
        Segment::Key(key) => Ok(table.insert(key.clone(), node)),
        Segment::Index(_) => Err(root_index_error(last)),
    }
}

fn table_at_mut<'a>(root: &'a mut Document, prefix: &[Segment]) -> Result<&'a mut Document, PathError> {
    let Some((first, rest)) = prefix.split_first() else {
        return Ok(root);
    };
    let mut node = match first {
        Segment::Key(key) => root.get_mut(key).ok_or_else(|| PathError::Navigation {
            segment: first.to_string(),
            found: "table".to_string(),
            reason: "key not present".to_string(),
        })?,
        Segment::Index(_) => return Err(root_index_error(first)),
    };
    for segment in rest {
        node = segment.apply_mut(node)?;
    }
    match node {
        DocumentNode::Table(table) => Ok(table),
        other => Err(PathError::Navigation {
            segment: prefix.last().map(ToString::to_string).unwrap_or_default(),
            found: node_kind(other).to_string(),
            reason: "not a table".to_string(),
        }),
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl TryFrom<String> for Path {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Path::parse(&value)
    }
}

impl From<Path> for String {
    fn from(path: Path) -> Self {
        path.to_string()
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Document {
        toml::from_str(text).unwrap()
    }

    fn node(text: &str) -> DocumentNode {
        DocumentNode::Table(doc(text))
    }

    #[test]
    fn test_parse_round_trip() {
        for text in ["", "/a", "/a[2]/b", "/server/endpoints[0]/port", "/a[0][1]", "/with space"] {
            assert_eq!(Path::parse(text).unwrap().to_string(), text);
        }
    }

    #[test]
    fn test_builders_match_parse() {
        let built = Path::root().with_key("a").with_index(2).with_key("b");
        assert_eq!(built, Path::parse("/a[2]/b").unwrap());
    }

    #[test]
    fn test_with_key_leaves_original_untouched() {
        let base = Path::root().with_key("a");
        let longer = base.with_key("b");
        assert_eq!(base.to_string(), "/a");
        assert_eq!(longer.to_string(), "/a/b");
    }

    #[test]
    fn test_segment_equality() {
        assert_eq!(Segment::Key("1".into()), Segment::Key("1".into()));
        assert_eq!(Segment::Index(1), Segment::Index(1));
        assert_ne!(Segment::Key("1".into()), Segment::Index(1));
        assert_ne!(Path::parse("/a").unwrap(), Path::parse("/b").unwrap());
    }

    #[test]
    fn test_segments_iterate_oldest_first() {
        let path = Path::parse("/a[1]/b").unwrap();
        let segments: Vec<&Segment> = path.segments().collect();
        assert_eq!(
            segments,
            vec![&Segment::Key("a".into()), &Segment::Index(1), &Segment::Key("b".into())]
        );
    }

    #[test]
    fn test_parse_rejects_unterminated_index() {
        let err = Path::parse("/a[2").unwrap_err();
        assert!(matches!(err, PathError::Format { .. }));
    }

    #[test]
    fn test_parse_rejects_non_numeric_index() {
        assert!(matches!(Path::parse("/a[x]"), Err(PathError::Format { .. })));
        assert!(matches!(Path::parse("/a[]"), Err(PathError::Format { .. })));
        assert!(matches!(Path::parse("/a[-1]"), Err(PathError::Format { .. })));
    }

    #[test]
    fn test_parse_rejects_text_outside_segments() {
        assert!(matches!(Path::parse("a/b"), Err(PathError::Format { offset: 0, .. })));
        assert!(matches!(Path::parse("/a[1]b"), Err(PathError::Format { offset: 5, .. })));
        assert!(matches!(Path::parse("/a]"), Err(PathError::Format { .. })));
    }

    #[test]
    fn test_apply_navigates_tables_and_arrays() {
        let root = node("a = [ {}, {}, { b = 9 } ]");
        let path = Path::parse("/a[2]/b").unwrap();
        assert_eq!(path.apply(&root).unwrap().as_integer(), Some(9));
    }

    #[test]
    fn test_apply_into_table_array() {
        let root = node("[[servers]]\nport = 1\n[[servers]]\nport = 2");
        let path = Path::parse("/servers[1]/port").unwrap();
        assert_eq!(path.apply(&root).unwrap().as_integer(), Some(2));
    }

    #[test]
    fn test_apply_root_returns_node() {
        let root = node("a = 1");
        assert_eq!(Path::root().apply(&root).unwrap(), &root);
    }

    #[test]
    fn test_apply_key_on_non_table_names_segment_and_kind() {
        let root = node("a = [1, 2]");
        let err = Path::parse("/a/b").unwrap().apply(&root).unwrap_err();
        match err {
            PathError::Navigation { segment, found, .. } => {
                assert_eq!(segment, "/b");
                assert_eq!(found, "array");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_apply_index_on_table_fails() {
        let root = node("[a]\nb = 1");
        let err = Path::parse("/a[0]").unwrap().apply(&root).unwrap_err();
        assert!(matches!(err, PathError::Navigation { ref found, .. } if found == "table"));
    }

    #[test]
    fn test_apply_missing_key_and_index() {
        let root = node("a = [1]");
        assert!(Path::parse("/b").unwrap().apply(&root).unwrap_err().is_navigation());
        assert!(Path::parse("/a[3]").unwrap().apply(&root).unwrap_err().is_navigation());
    }

    #[test]
    fn test_apply_in_document() {
        let document = doc("[a]\nb = 1");
        let found = Path::parse("/a/b").unwrap().apply_in(&document).unwrap();
        assert_eq!(found.and_then(DocumentNode::as_integer), Some(1));
        assert!(Path::root().apply_in(&document).unwrap().is_none());
    }

    #[test]
    fn test_clear_removes_entry() {
        let mut document = doc("[a]\nb = 1\nc = 2");
        let removed = Path::parse("/a/b").unwrap().clear(&mut document).unwrap();
        assert!(removed);
        assert_eq!(document, doc("[a]\nc = 2"));
    }

    #[test]
    fn test_clear_absent_key_reports_false() {
        let mut document = doc("[a]\nc = 2");
        assert!(!Path::parse("/a/b").unwrap().clear(&mut document).unwrap());
    }

    #[test]
    fn test_clear_through_array() {
        let mut document = doc("[[s]]\nx = 1\ny = 2");
        assert!(Path::parse("/s[0]/x").unwrap().clear(&mut document).unwrap());
        assert_eq!(document, doc("[[s]]\ny = 2"));
    }

    #[test]
    fn test_clear_requires_final_key() {
        let mut document = doc("a = [1]");
        let err = Path::parse("/a[0]").unwrap().clear(&mut document).unwrap_err();
        assert!(matches!(err, PathError::Unclearable { .. }));
        assert!(matches!(Path::root().clear(&mut document), Err(PathError::Unclearable { .. })));
    }

    #[test]
    fn test_clear_missing_prefix_is_navigation_error() {
        let mut document = doc("a = 1");
        let err = Path::parse("/x/y").unwrap().clear(&mut document).unwrap_err();
        assert!(err.is_navigation());
    }

    #[test]
    fn test_insert_creates_intermediate_tables() {
        let mut document = Document::new();
        Path::parse("/a/b/c")
            .unwrap()
            .insert(&mut document, DocumentNode::Integer(3))
            .unwrap();
        assert_eq!(document, doc("[a.b]\nc = 3"));
    }

    #[test]
    fn test_insert_replaces_and_appends_array_elements() {
        let mut document = doc("a = [1, 2]");
        let previous = Path::parse("/a[1]")
            .unwrap()
            .insert(&mut document, DocumentNode::Integer(5))
            .unwrap();
        assert_eq!(previous, Some(DocumentNode::Integer(2)));
        Path::parse("/a[2]")
            .unwrap()
            .insert(&mut document, DocumentNode::Integer(7))
            .unwrap();
        assert_eq!(document, doc("a = [1, 5, 7]"));
        let err = Path::parse("/a[9]")
            .unwrap()
            .insert(&mut document, DocumentNode::Integer(0))
            .unwrap_err();
        assert!(err.is_navigation());
    }

    #[test]
    fn test_insert_through_scalar_fails() {
        let mut document = doc("a = 1");
        let err = Path::parse("/a/b")
            .unwrap()
            .insert(&mut document, DocumentNode::Integer(0))
            .unwrap_err();
        assert!(matches!(err, PathError::Navigation { ref found, .. } if found == "integer"));
    }

    #[test]
    fn test_starts_with_and_parent() {
        let path = Path::parse("/a/b[0]").unwrap();
        assert!(path.starts_with(&Path::parse("/a").unwrap()));
        assert!(path.starts_with(&Path::root()));
        assert!(!path.starts_with(&Path::parse("/b").unwrap()));
        let (parent, last) = path.parent().unwrap();
        assert_eq!(parent.to_string(), "/a/b");
        assert_eq!(last, &Segment::Index(0));
    }

    #[test]
    fn test_serde_uses_text_form() {
        #[derive(Debug, Serialize, Deserialize)]
        struct Route {
            path: Path,
        }
        let route: Route = toml::from_str("path = \"/user/theme\"").unwrap();
        assert_eq!(route.path, Path::root().with_key("user").with_key("theme"));
        assert!(toml::from_str::<Route>("path = \"/a[\"").is_err());
        assert_eq!(toml::to_string(&route).unwrap().trim(), "path = \"/user/theme\"");
    }
}
