//! Identifier rules for layer, attribute and symbol names.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\p{XID_Start}_]\p{XID_Continue}*$").expect("identifier pattern is valid")
});

/// Names that would shadow parts of the text model, plus the language's keywords.
static RESERVED: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // text model
        "text", "layers", "spans", "start", "end", "parent", "enveloping", "ambiguous",
        "attributes", "name",
        // keywords
        "as", "break", "const", "continue", "crate", "else", "enum", "extern", "false", "fn",
        "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref",
        "return", "self", "Self", "static", "struct", "super", "trait", "true", "type",
        "unsafe", "use", "where", "while", "async", "await", "dyn",
    ]
    .iter()
    .copied()
    .collect()
});

/// Check that `name` may be used as a layer, attribute or symbol name.
///
/// Returns the reason for rejection.
pub fn check_identifier(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("name is empty");
    }
    if !IDENTIFIER.is_match(name) {
        return Err("name is not an identifier");
    }
    if RESERVED.contains(name) {
        return Err("name is reserved");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_identifiers() {
        assert!(check_identifier("words").is_ok());
        assert!(check_identifier("morph_analysis").is_ok());
        assert!(check_identifier("_layer_0").is_ok());
    }

    #[test]
    fn accepts_non_ascii_identifiers() {
        assert!(check_identifier("sõnad").is_ok());
        assert!(check_identifier("öösel_2").is_ok());
        assert_eq!(check_identifier("2öö"), Err("name is not an identifier"));
        assert_eq!(check_identifier("sõna-liik"), Err("name is not an identifier"));
    }

    #[test]
    fn rejects_malformed_and_reserved() {
        assert_eq!(check_identifier(""), Err("name is empty"));
        assert_eq!(check_identifier(" "), Err("name is not an identifier"));
        assert_eq!(check_identifier("3"), Err("name is not an identifier"));
        assert_eq!(check_identifier("two words"), Err("name is not an identifier"));
        assert_eq!(check_identifier("text"), Err("name is reserved"));
        assert_eq!(check_identifier("match"), Err("name is reserved"));
    }
}
