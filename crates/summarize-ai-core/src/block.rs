//! Ordered association list for the interior of a metadata block.
//!
//! A [`MetadataBlock`] is a sequence of segments: top-level entries and the
//! comment or blank lines between them. Every parsed entry keeps the exact
//! text it was read from, so entries nobody touches serialize back
//! byte-for-byte. Only entries changed through [`MetadataBlock::set`] or
//! [`MetadataBlock::set_list`] are re-rendered.
//!
//! The model understands three shapes:
//!
//! ```text
//! title: A note            -> Value::Scalar
//! aliases:                 -> Value::List
//!   - first
//!   - second
//! nested:                  -> Value::Opaque (carried through untouched)
//!   child: value
//! ```

use crate::error::FrontmatterError;
use crate::scalar;

/// Interpreted value of a top-level entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Scalar(String),
    List(Vec<String>),
    /// Content this model does not interpret (nested maps, block scalars,
    /// multi-line plain scalars). Preserved verbatim, never rewritten.
    Opaque,
}

impl Value {
    /// The scalar content, if this is a scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    key: String,
    value: Value,
    /// Source text including line terminators; `None` once rewritten.
    raw: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Entry(Entry),
    /// Blank or comment lines between entries.
    Trivia(String),
}

/// The interior of a `---` delimited block as an ordered list of entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataBlock {
    segments: Vec<Segment>,
    line_ending: &'static str,
}

impl Default for MetadataBlock {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataBlock {
    /// An empty block using `\n` line endings.
    pub fn new() -> Self {
        Self::with_line_ending("\n")
    }

    /// An empty block rendering new entries with `line_ending`.
    pub fn with_line_ending(line_ending: &'static str) -> Self {
        Self {
            segments: Vec::new(),
            line_ending,
        }
    }

    /// Line terminator used for re-rendered entries.
    pub fn line_ending(&self) -> &'static str {
        self.line_ending
    }

    /// Parse the text between the two delimiter lines.
    ///
    /// Line numbers in errors count from the first interior line (1).
    pub fn parse(interior: &str) -> Result<Self, FrontmatterError> {
        let line_ending = if interior.contains("\r\n") { "\r\n" } else { "\n" };
        let mut parser = Parser::default();

        for (idx, line) in interior.split_inclusive('\n').enumerate() {
            parser.feed(idx + 1, line)?;
        }

        Ok(Self {
            segments: parser.finish(),
            line_ending,
        })
    }

    /// Value of the first entry named `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries()
            .find(|(k, _)| *k == key)
            .map(|(_, value)| value)
    }

    /// Scalar value of `key`; `None` if absent or not a scalar.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Entries in document order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Entry(entry) => Some((entry.key.as_str(), &entry.value)),
            Segment::Trivia(_) => None,
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries().map(|(key, _)| key)
    }

    pub fn len(&self) -> usize {
        self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Set a scalar entry, in place if the key exists, appended otherwise.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.upsert(key, Value::Scalar(value.into()));
    }

    /// Set a list entry, in place if the key exists, appended otherwise.
    pub fn set_list<I, S>(&mut self, key: &str, items: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items = items.into_iter().map(Into::into).collect();
        self.upsert(key, Value::List(items));
    }

    /// Remove every entry named `key`. Returns whether anything was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.segments.len();
        self.segments
            .retain(|segment| !matches!(segment, Segment::Entry(entry) if entry.key == key));
        self.segments.len() != before
    }

    /// Render the block interior (without delimiter lines).
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Trivia(raw)
                | Segment::Entry(Entry {
                    raw: Some(raw), ..
                }) => {
                    self.terminate_line(&mut out);
                    out.push_str(raw);
                }
                Segment::Entry(entry) => {
                    self.terminate_line(&mut out);
                    self.render_entry(&mut out, entry);
                }
            }
        }
        out
    }

    fn upsert(&mut self, key: &str, value: Value) {
        let entry = Entry {
            key: key.to_string(),
            value,
            raw: None,
        };

        let mut positions = self
            .segments
            .iter()
            .enumerate()
            .filter(|(_, segment)| matches!(segment, Segment::Entry(e) if e.key == key))
            .map(|(idx, _)| idx);

        match positions.next() {
            Some(first) => {
                let duplicates: Vec<usize> = positions.collect();
                for idx in duplicates.into_iter().rev() {
                    self.segments.remove(idx);
                }
                self.segments[first] = Segment::Entry(entry);
            }
            None => {
                // New keys go after the last entry, ahead of trailing trivia.
                let at = self
                    .segments
                    .iter()
                    .rposition(|segment| matches!(segment, Segment::Entry(_)))
                    .map(|idx| idx + 1)
                    .unwrap_or(self.segments.len());
                self.segments.insert(at, Segment::Entry(entry));
            }
        }
    }

    fn terminate_line(&self, out: &mut String) {
        if !out.is_empty() && !out.ends_with('\n') {
            out.push_str(self.line_ending);
        }
    }

    fn render_entry(&self, out: &mut String, entry: &Entry) {
        let le = self.line_ending;
        match &entry.value {
            Value::Scalar(value) => {
                out.push_str(&format!("{}: {}{}", entry.key, scalar::render(value), le));
            }
            Value::List(items) if items.is_empty() => {
                out.push_str(&format!("{}: []{}", entry.key, le));
            }
            Value::List(items) => {
                out.push_str(&format!("{}:{}", entry.key, le));
                for item in items {
                    out.push_str(&format!("  - {}{}", scalar::render(item), le));
                }
            }
            Value::Opaque => out.push_str(&format!("{}:{}", entry.key, le)),
        }
    }
}

/// Line-by-line builder for [`MetadataBlock::parse`].
#[derive(Default)]
struct Parser {
    segments: Vec<Segment>,
    current: Option<PendingEntry>,
    /// Blank/comment lines not yet attributed to an entry or to trivia.
    trivia: String,
}

struct PendingEntry {
    key: String,
    inline: String,
    raw: String,
    continuation: Vec<String>,
}

impl Parser {
    fn feed(&mut self, line_no: usize, line: &str) -> Result<(), FrontmatterError> {
        let content = line.trim_end_matches(['\n', '\r']);
        let stripped = content.trim_start();

        if stripped.is_empty() || stripped.starts_with('#') {
            self.trivia.push_str(line);
            return Ok(());
        }

        let indented = content.starts_with([' ', '\t']);
        let list_item = content == "-" || content.starts_with("- ");

        if indented || list_item {
            let entry = self
                .current
                .as_mut()
                .ok_or(FrontmatterError::OrphanContinuation { line: line_no })?;
            entry.raw.push_str(&self.trivia);
            self.trivia.clear();
            entry.raw.push_str(line);
            entry.continuation.push(content.to_string());
            return Ok(());
        }

        let (key, inline) = split_key(content).ok_or_else(|| FrontmatterError::InvalidLine {
            line: line_no,
            text: content.to_string(),
        })?;

        self.flush_entry();
        self.flush_trivia();
        self.current = Some(PendingEntry {
            key,
            inline: inline.to_string(),
            raw: line.to_string(),
            continuation: Vec::new(),
        });
        Ok(())
    }

    fn finish(mut self) -> Vec<Segment> {
        self.flush_entry();
        self.flush_trivia();
        self.segments
    }

    fn flush_entry(&mut self) {
        if let Some(pending) = self.current.take() {
            let value = interpret(&pending.inline, &pending.continuation);
            self.segments.push(Segment::Entry(Entry {
                key: pending.key,
                value,
                raw: Some(pending.raw),
            }));
        }
    }

    fn flush_trivia(&mut self) {
        if !self.trivia.is_empty() {
            self.segments
                .push(Segment::Trivia(std::mem::take(&mut self.trivia)));
        }
    }
}

/// Split `key: value` at the first colon followed by whitespace or end of line.
fn split_key(content: &str) -> Option<(String, &str)> {
    let bytes = content.as_bytes();
    let pos = content.char_indices().find_map(|(idx, c)| {
        let next = bytes.get(idx + 1);
        (c == ':' && matches!(next, None | Some(b' ') | Some(b'\t'))).then_some(idx)
    })?;

    let key = scalar::unquote(&content[..pos]);
    if key.is_empty() {
        return None;
    }
    Some((key, &content[pos + 1..]))
}

fn interpret(inline: &str, continuation: &[String]) -> Value {
    let inline = inline.trim();

    if continuation.is_empty() {
        return match scalar::parse_flow_list(inline) {
            Some(items) => Value::List(items),
            None if inline.starts_with(['|', '>']) => Value::Opaque,
            None => Value::Scalar(scalar::unquote(inline)),
        };
    }

    if !inline.is_empty() && !inline.starts_with('#') {
        return Value::Opaque;
    }

    let indent = |line: &str| line.len() - line.trim_start().len();
    let first_indent = indent(&continuation[0]);
    let mut items = Vec::with_capacity(continuation.len());

    for line in continuation {
        let stripped = line.trim_start();
        let item = match stripped.strip_prefix('-') {
            Some(rest) if rest.is_empty() || rest.starts_with(' ') => rest.trim(),
            _ => return Value::Opaque,
        };
        let nested_map = !item.starts_with(['"', '\'']) && item.contains(": ");
        if indent(line) != first_indent || nested_map || item.starts_with("- ") {
            return Value::Opaque;
        }
        items.push(scalar::unquote(item));
    }

    Value::List(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scalars_lists_and_opaque_entries() {
        let interior = "title: Movie\nyear: 1999\ncast:\n  - Keanu\n  - \"Carrie-Anne\"\nmeta:\n  rating: 5\n";
        let block = MetadataBlock::parse(interior).unwrap();

        assert_eq!(block.get_str("title"), Some("Movie"));
        assert_eq!(block.get_str("year"), Some("1999"));
        assert_eq!(
            block.get("cast"),
            Some(&Value::List(vec!["Keanu".into(), "Carrie-Anne".into()]))
        );
        assert_eq!(block.get("meta"), Some(&Value::Opaque));
        assert_eq!(
            block.keys().collect::<Vec<_>>(),
            vec!["title", "year", "cast", "meta"]
        );
    }

    #[test]
    fn unindented_list_items_belong_to_previous_key() {
        let block = MetadataBlock::parse("tags:\n- a\n- b\n").unwrap();
        assert_eq!(block.get("tags"), Some(&Value::List(vec!["a".into(), "b".into()])));
    }

    #[test]
    fn flow_list_and_block_scalar() {
        let block = MetadataBlock::parse("tags: [x, y]\nbody: |\n  line one\n  line two\n").unwrap();
        assert_eq!(block.get("tags"), Some(&Value::List(vec!["x".into(), "y".into()])));
        assert_eq!(block.get("body"), Some(&Value::Opaque));
    }

    #[test]
    fn untouched_block_serializes_byte_identical() {
        let interior = "# leading comment\ntitle:   spaced   # trailing\n\naliases:\n    - one\n\n    - two\nnested:\n  a: 1\n";
        let block = MetadataBlock::parse(interior).unwrap();
        assert_eq!(block.serialize(), interior);
    }

    #[test]
    fn set_updates_in_place_and_preserves_order() {
        let mut block = MetadataBlock::parse("a: 1\nb: 2\nc: 3\n").unwrap();
        block.set("b", "two");
        block.set("d", "4");
        assert_eq!(block.serialize(), "a: 1\nb: two\nc: 3\nd: '4'\n");
    }

    #[test]
    fn set_drops_duplicate_keys() {
        let mut block = MetadataBlock::parse("a: 1\nb: 2\na: 3\n").unwrap();
        block.set("a", "x");
        assert_eq!(block.serialize(), "a: x\nb: 2\n");
    }

    #[test]
    fn set_list_and_remove() {
        let mut block = MetadataBlock::parse("title: T\ntags:\n  - old\n").unwrap();
        block.set_list("tags", ["new", "other"]);
        assert_eq!(block.serialize(), "title: T\ntags:\n  - new\n  - other\n");
        assert!(block.remove("tags"));
        assert!(!block.remove("tags"));
        assert_eq!(block.serialize(), "title: T\n");
    }

    #[test]
    fn appended_keys_go_before_trailing_trivia() {
        let mut block = MetadataBlock::parse("a: 1\n\n# end\n").unwrap();
        block.set("b", "2x");
        assert_eq!(block.serialize(), "a: 1\nb: 2x\n\n# end\n");
    }

    #[test]
    fn crlf_blocks_keep_crlf() {
        let mut block = MetadataBlock::parse("a: 1\r\nb: 2\r\n").unwrap();
        block.set("c", "three");
        assert_eq!(block.serialize(), "a: 1\r\nb: 2\r\nc: three\r\n");
    }

    #[test]
    fn structural_errors() {
        assert_eq!(
            MetadataBlock::parse("  indented: first\n"),
            Err(FrontmatterError::OrphanContinuation { line: 1 })
        );
        assert_eq!(
            MetadataBlock::parse("title: ok\njust some words\n"),
            Err(FrontmatterError::InvalidLine {
                line: 2,
                text: "just some words".into()
            })
        );
    }

    #[test]
    fn colon_inside_value_does_not_split_key() {
        let block = MetadataBlock::parse("url: https://example.com/a:b\ntime: 12:30\n").unwrap();
        assert_eq!(block.get_str("url"), Some("https://example.com/a:b"));
        assert_eq!(block.get_str("time"), Some("12:30"));
    }

    #[test]
    fn empty_block() {
        let block = MetadataBlock::parse("").unwrap();
        assert!(block.is_empty());
        assert_eq!(block.serialize(), "");
    }
}
