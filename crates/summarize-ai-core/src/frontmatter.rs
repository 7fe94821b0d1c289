//! Locating the metadata block at the top of a note.
//!
//! A block opens when the first non-blank line of the document is exactly
//! `---` (a UTF-8 BOM is ignored) and closes at the next line that is `---`.
//! Everything else about the document is left to the caller: [`split`]
//! returns sub-slices of the input so nothing outside the interior is ever
//! copied or re-rendered.

use crate::block::MetadataBlock;
use crate::error::FrontmatterError;

/// Marker line opening and closing a metadata block.
pub const DELIMITER: &str = "---";

/// A document cut around its metadata block.
///
/// Concatenating `prefix + opening + interior + closing + body` gives back
/// the original input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split<'a> {
    /// Blank lines before the opening delimiter.
    pub prefix: &'a str,
    /// The opening delimiter line, including its line terminator.
    pub opening: &'a str,
    /// Lines between the delimiters.
    pub interior: &'a str,
    /// The closing delimiter line, including its terminator if any.
    pub closing: &'a str,
    /// Everything after the closing delimiter line.
    pub body: &'a str,
}

impl Split<'_> {
    /// Byte offset at which the body starts.
    pub fn body_offset(&self) -> usize {
        self.prefix.len() + self.opening.len() + self.interior.len() + self.closing.len()
    }
}

/// Cut `raw` around its metadata block.
///
/// Returns `Ok(None)` when the document has no block and
/// [`FrontmatterError::Unterminated`] when a block is opened but never closed.
pub fn split(raw: &str) -> Result<Option<Split<'_>>, FrontmatterError> {
    let mut lines = raw.split_inclusive('\n').enumerate();
    let mut offset = 0;

    let (open_line, open_start) = loop {
        let Some((idx, line)) = lines.next() else {
            return Ok(None);
        };
        let candidate = line.trim_start_matches('\u{feff}');
        if candidate.trim().is_empty() {
            offset += line.len();
            continue;
        }
        if candidate.trim() != DELIMITER {
            return Ok(None);
        }
        break (idx + 1, offset);
    };

    let interior_start = raw[open_start..]
        .find('\n')
        .map(|pos| open_start + pos + 1)
        .unwrap_or(raw.len());
    offset = interior_start;

    for (_, line) in lines {
        if line.trim_end() == DELIMITER {
            let body_start = offset + line.len();
            return Ok(Some(Split {
                prefix: &raw[..open_start],
                opening: &raw[open_start..interior_start],
                interior: &raw[interior_start..offset],
                closing: &raw[offset..body_start],
                body: &raw[body_start..],
            }));
        }
        offset += line.len();
    }

    Err(FrontmatterError::Unterminated { line: open_line })
}

/// Parse the metadata block of `raw`.
///
/// Returns the block (if any) and the byte offset of the body, which is `0`
/// for documents without a block.
pub fn parse(raw: &str) -> Result<(Option<MetadataBlock>, usize), FrontmatterError> {
    match split(raw)? {
        Some(parts) => {
            let block = MetadataBlock::parse(parts.interior)?;
            Ok((Some(block), parts.body_offset()))
        }
        None => Ok((None, 0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_block() {
        assert_eq!(split("# Title\nBody").unwrap(), None);
        assert_eq!(split("").unwrap(), None);
        assert_eq!(split("\n\n").unwrap(), None);
        assert_eq!(parse("plain text, no block").unwrap(), (None, 0));
    }

    #[test]
    fn basic_block() {
        let raw = "---\ntitle: A\n---\nBody\n";
        let parts = split(raw).unwrap().unwrap();
        assert_eq!(parts.prefix, "");
        assert_eq!(parts.opening, "---\n");
        assert_eq!(parts.interior, "title: A\n");
        assert_eq!(parts.closing, "---\n");
        assert_eq!(parts.body, "Body\n");
        assert_eq!(&raw[parts.body_offset()..], "Body\n");
    }

    #[test]
    fn leading_blank_lines_and_bom() {
        let raw = "\n  \n\u{feff}---\na: 1\n---";
        let parts = split(raw).unwrap().unwrap();
        assert_eq!(parts.prefix, "\n  \n");
        assert_eq!(parts.interior, "a: 1\n");
        assert_eq!(parts.closing, "---");
        assert_eq!(parts.body, "");
    }

    #[test]
    fn empty_interior() {
        let parts = split("---\n---\nrest").unwrap().unwrap();
        assert_eq!(parts.interior, "");
        assert_eq!(parts.body, "rest");
    }

    #[test]
    fn closing_delimiter_must_be_whole_line() {
        let raw = "---\nrule: ----\ntext: --- inline\n---\n";
        let parts = split(raw).unwrap().unwrap();
        assert_eq!(parts.interior, "rule: ----\ntext: --- inline\n");
    }

    #[test]
    fn unterminated_block_is_an_error() {
        assert_eq!(
            split("---\ntitle: A\nno end"),
            Err(FrontmatterError::Unterminated { line: 1 })
        );
        assert_eq!(
            split("\n---\n"),
            Err(FrontmatterError::Unterminated { line: 2 })
        );
    }

    #[test]
    fn parse_reports_body_offset() {
        let raw = "---\na: 1\n---\nbody";
        let (block, offset) = parse(raw).unwrap();
        assert_eq!(block.unwrap().get_str("a"), Some("1"));
        assert_eq!(offset, raw.len() - "body".len());
    }
}
