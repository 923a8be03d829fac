//! Data-quality checks for catalog strings.
//!
//! Catalog names are kept exactly as the model was trained on them; these
//! checks only report irregular spellings so they can be fixed upstream.

/// A spelling irregularity in a catalog name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameDefect {
    LeadingWhitespace,
    TrailingWhitespace,
    DoubledSpace,
    /// A space inside an identifier-style name
    EmbeddedSpace,
    /// A character other than lower-case ASCII, digits or `_`
    NonIdentifierChar(char),
}

impl std::fmt::Display for NameDefect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NameDefect::LeadingWhitespace => f.write_str("leading whitespace"),
            NameDefect::TrailingWhitespace => f.write_str("trailing whitespace"),
            NameDefect::DoubledSpace => f.write_str("doubled space"),
            NameDefect::EmbeddedSpace => f.write_str("embedded space"),
            NameDefect::NonIdentifierChar(c) => write!(f, "non-identifier character {c:?}"),
        }
    }
}

fn whitespace_defects(name: &str) -> Vec<NameDefect> {
    let mut defects = Vec::new();
    if name.starts_with(char::is_whitespace) {
        defects.push(NameDefect::LeadingWhitespace);
    }
    if name.ends_with(char::is_whitespace) {
        defects.push(NameDefect::TrailingWhitespace);
    }
    if name.contains("  ") {
        defects.push(NameDefect::DoubledSpace);
    }
    defects
}

/// Defects of a symptom name, which should look like `snake_case`.
#[must_use]
pub fn symptom_name_defects(name: &str) -> Vec<NameDefect> {
    let mut defects = whitespace_defects(name);
    if name.trim().contains(' ') {
        defects.push(NameDefect::EmbeddedSpace);
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_' || *c == ' '))
    {
        defects.push(NameDefect::NonIdentifierChar(c));
    }
    defects
}

/// Defects of a disease display name. Free text, so only whitespace counts.
#[must_use]
pub fn disease_name_defects(name: &str) -> Vec<NameDefect> {
    whitespace_defects(name)
}
