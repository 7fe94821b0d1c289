//! Prompt templates.
//!
//! A template is plain text with two placeholders: [`TEXT_PLACEHOLDER`]
//! (required) is replaced by the note content and [`PATH_PLACEHOLDER`]
//! (optional) by the note's path. The template's identity hash is stored in
//! every annotation so later runs can tell which prompt produced it.

use sha2::{Digest, Sha256};

use crate::error::PromptError;

pub const TEXT_PLACEHOLDER: &str = "{{text}}";
pub const PATH_PLACEHOLDER: &str = "{{path}}";

/// Number of hex characters kept from the SHA-256 digest.
pub const HASH_LEN: usize = 16;

/// A validated prompt template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Validate `template`. Fails when the text placeholder is missing.
    pub fn new(template: impl Into<String>) -> Result<Self, PromptError> {
        let template = template.into();
        if template.trim().is_empty() {
            return Err(PromptError::Empty);
        }
        if !template.contains(TEXT_PLACEHOLDER) {
            return Err(PromptError::MissingTextPlaceholder {
                placeholder: TEXT_PLACEHOLDER,
            });
        }
        Ok(Self { template })
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Template length in characters, the fixed per-request overhead.
    pub fn char_len(&self) -> usize {
        self.template.chars().count()
    }

    pub fn has_path_placeholder(&self) -> bool {
        self.template.contains(PATH_PLACEHOLDER)
    }

    /// Substitute both placeholders in a single pass, so placeholder-like
    /// text inside the note itself is never expanded.
    pub fn render(&self, text: &str, path: &str) -> String {
        let mut out = String::with_capacity(self.template.len() + text.len() + path.len());
        let mut rest = self.template.as_str();

        loop {
            let next = [(TEXT_PLACEHOLDER, text), (PATH_PLACEHOLDER, path)]
                .into_iter()
                .filter_map(|(token, value)| rest.find(token).map(|pos| (pos, token, value)))
                .min_by_key(|(pos, _, _)| *pos);

            match next {
                Some((pos, token, value)) => {
                    out.push_str(&rest[..pos]);
                    out.push_str(value);
                    rest = &rest[pos + token.len()..];
                }
                None => {
                    out.push_str(rest);
                    return out;
                }
            }
        }
    }

    /// First [`HASH_LEN`] hex characters of the template's SHA-256 digest.
    pub fn hash(&self) -> String {
        prompt_hash(&self.template)
    }
}

pub fn prompt_hash(template: &str) -> String {
    let digest = Sha256::digest(template.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(HASH_LEN);
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_template_without_text_placeholder() {
        assert_eq!(
            PromptTemplate::new("Summarize {{path}}"),
            Err(PromptError::MissingTextPlaceholder {
                placeholder: TEXT_PLACEHOLDER
            })
        );
        assert_eq!(PromptTemplate::new("   "), Err(PromptError::Empty));
    }

    #[test]
    fn renders_both_placeholders() {
        let prompt = PromptTemplate::new("File {{path}}:\n{{text}}\n-- {{path}}").unwrap();
        assert!(prompt.has_path_placeholder());
        assert_eq!(
            prompt.render("hello", "notes/a.md"),
            "File notes/a.md:\nhello\n-- notes/a.md"
        );
    }

    #[test]
    fn placeholders_inside_note_text_are_not_expanded() {
        let prompt = PromptTemplate::new("{{text}} @ {{path}}").unwrap();
        assert_eq!(prompt.render("see {{path}}", "p.md"), "see {{path}} @ p.md");
    }

    #[test]
    fn missing_path_placeholder_is_allowed() {
        let prompt = PromptTemplate::new("Summarize:\n{{text}}").unwrap();
        assert!(!prompt.has_path_placeholder());
        assert_eq!(prompt.render("x", "ignored"), "Summarize:\nx");
    }

    #[test]
    fn hash_is_sixteen_hex_chars_of_sha256() {
        // sha256("abc") = ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad
        assert_eq!(prompt_hash("abc"), "ba7816bf8f01cfea");
        let prompt = PromptTemplate::new("{{text}}").unwrap();
        assert_eq!(prompt.hash().len(), HASH_LEN);
        assert_ne!(prompt.hash(), PromptTemplate::new("x {{text}}").unwrap().hash());
    }
}
