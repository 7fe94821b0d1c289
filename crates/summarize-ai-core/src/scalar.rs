//! Reading and writing single-line YAML scalar values.
//!
//! Decoding and encoding go through `serde_yaml`, so quoting and escape
//! rules are the ones every YAML reader applies. The metadata block itself
//! stays line-oriented; only the text after `key:` (or after `- ` in a
//! list) is handed to the YAML parser.
//!
//! [`render`] keeps values on one line so that `unquote(&render(s)) == s`
//! holds for every `s`.

use serde_yaml::Value as Yaml;

/// Decode the textual value found after `key:` into its string content.
///
/// Numbers, booleans and null keep the text they were written with. Text
/// that is not a valid scalar (unbalanced quotes, a nested mapping) is kept
/// as written.
pub fn unquote(raw: &str) -> String {
    let trimmed = raw.trim();
    match serde_yaml::from_str::<Yaml>(trimmed) {
        Ok(Yaml::String(value)) => value,
        Ok(Yaml::Bool(_) | Yaml::Number(_) | Yaml::Null) => strip_comment(trimmed).to_string(),
        _ => trimmed.to_string(),
    }
}

/// Encode a string so it reads back unchanged as a single-line value.
pub fn render(value: &str) -> String {
    if let Ok(encoded) = serde_yaml::to_string(value) {
        let line = encoded.strip_suffix('\n').unwrap_or(&encoded);
        if !line.contains('\n') && unquote(line) == value {
            return line.to_string();
        }
    }
    double_quoted(value)
}

/// Parse an inline flow list (`[a, b]`). Returns `None` when `raw` is not one.
pub fn parse_flow_list(raw: &str) -> Option<Vec<String>> {
    let trimmed = raw.trim();
    if !trimmed.starts_with('[') {
        return None;
    }
    match serde_yaml::from_str::<Yaml>(trimmed).ok()? {
        Yaml::Sequence(items) => items.into_iter().map(scalar_text).collect(),
        _ => None,
    }
}

fn scalar_text(value: Yaml) -> Option<String> {
    match value {
        Yaml::String(s) => Some(s),
        Yaml::Bool(b) => Some(b.to_string()),
        Yaml::Number(n) => Some(n.to_string()),
        Yaml::Null => Some(String::new()),
        _ => None,
    }
}

fn strip_comment(plain: &str) -> &str {
    match plain.find(" #") {
        Some(pos) => plain[..pos].trim_end(),
        None => plain,
    }
}

/// Multi-line strings come out of the YAML emitter as block scalars, which
/// do not fit on a `key: value` line.
fn double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
