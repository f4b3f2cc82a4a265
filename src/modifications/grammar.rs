//! Parsing and formatting of text-side modification annotations
//!
//! Two grammars are in circulation:
//!
//! ```text
//! current: 2(0,S,Acetyl)(1,C,Carbamidomethyl)
//! legacy:  2/0,S,Acetyl/1,C,Carbamidomethyl
//! ```
//!
//! Positions are 0-based here. Tags may themselves contain parentheses
//! (`Label:13C(6)15N(2)`), so the current grammar is scanned with a depth
//! counter rather than split.

/// Errors raised for malformed annotations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModParseError {
    /// The leading count is missing or not a number
    #[error("Missing modification count in {0:?}")]
    MissingCount(String),

    /// An entry does not have the `pos,aa,tag` shape
    #[error("Malformed modification entry {entry:?} in {annotation:?}")]
    MalformedEntry {
        /// The offending entry
        entry: String,
        /// The whole annotation
        annotation: String,
    },

    /// Unbalanced parentheses
    #[error("Unterminated modification entry in {0:?}")]
    Unterminated(String),
}

/// One parsed `(pos,aa,tag)` entry
#[derive(Debug, Clone, PartialEq)]
pub struct ModTag {
    /// 0-based position in the unmodified sequence
    pub position: usize,
    /// Residue letter as written
    pub residue: char,
    /// Modification name or formatted mass
    pub tag: String,
}

impl ModTag {
    /// Create a tag entry
    pub fn new(position: usize, residue: char, tag: impl Into<String>) -> Self {
        Self {
            position,
            residue,
            tag: tag.into(),
        }
    }
}

/// A parsed annotation, remembering which grammar it was written in
#[derive(Debug, Clone, PartialEq)]
pub enum ModAnnotation {
    /// Slash-separated grammar
    Legacy(Vec<ModTag>),
    /// Parenthesised grammar
    Current(Vec<ModTag>),
}

impl ModAnnotation {
    /// Parse either grammar
    pub fn parse(annotation: &str) -> Result<Self, ModParseError> {
        let text = annotation.trim().trim_matches('"');
        let digits = text.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 {
            return Err(ModParseError::MissingCount(annotation.to_string()));
        }
        let declared: usize = text[..digits]
            .parse()
            .map_err(|_| ModParseError::MissingCount(annotation.to_string()))?;
        let rest = &text[digits..];

        let parsed = if rest.starts_with('/') {
            ModAnnotation::Legacy(parse_legacy(rest, annotation)?)
        } else if rest.starts_with('(') || rest.is_empty() {
            ModAnnotation::Current(parse_current(rest, annotation)?)
        } else {
            return Err(ModParseError::MalformedEntry {
                entry: rest.to_string(),
                annotation: annotation.to_string(),
            });
        };

        if parsed.tags().len() != declared {
            log::warn!(
                "Modification annotation {:?} declares {} entries but contains {}",
                annotation,
                declared,
                parsed.tags().len()
            );
        }
        Ok(parsed)
    }

    /// Entries in written order
    pub fn tags(&self) -> &[ModTag] {
        match self {
            ModAnnotation::Legacy(tags) | ModAnnotation::Current(tags) => tags,
        }
    }

    /// Consume into the entries
    pub fn into_tags(self) -> Vec<ModTag> {
        match self {
            ModAnnotation::Legacy(tags) | ModAnnotation::Current(tags) => tags,
        }
    }
}

fn parse_entry(entry: &str, annotation: &str) -> Result<ModTag, ModParseError> {
    let malformed = || ModParseError::MalformedEntry {
        entry: entry.to_string(),
        annotation: annotation.to_string(),
    };
    let mut parts = entry.splitn(3, ',');
    let position = parts
        .next()
        .and_then(|p| p.trim().parse::<usize>().ok())
        .ok_or_else(malformed)?;
    let residue = parts
        .next()
        .map(str::trim)
        .and_then(|r| r.chars().next())
        .ok_or_else(malformed)?;
    let tag = parts.next().map(str::trim).ok_or_else(malformed)?;
    if tag.is_empty() {
        return Err(malformed());
    }
    Ok(ModTag::new(position, residue, tag))
}

fn parse_legacy(rest: &str, annotation: &str) -> Result<Vec<ModTag>, ModParseError> {
    rest.split('/')
        .filter(|entry| !entry.trim().is_empty())
        .map(|entry| parse_entry(entry, annotation))
        .collect()
}

fn parse_current(rest: &str, annotation: &str) -> Result<Vec<ModTag>, ModParseError> {
    let mut tags = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for (i, c) in rest.char_indices() {
        match c {
            '(' => {
                if depth == 0 {
                    start = i + 1;
                }
                depth += 1;
            }
            ')' => {
                if depth == 0 {
                    return Err(ModParseError::MalformedEntry {
                        entry: rest.to_string(),
                        annotation: annotation.to_string(),
                    });
                }
                depth -= 1;
                if depth == 0 {
                    tags.push(parse_entry(&rest[start..i], annotation)?);
                }
            }
            c if depth == 0 && !c.is_whitespace() => {
                return Err(ModParseError::MalformedEntry {
                    entry: rest[i..].to_string(),
                    annotation: annotation.to_string(),
                });
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(ModParseError::Unterminated(annotation.to_string()));
    }
    Ok(tags)
}

/// Format entries in the current grammar; no entries formats as `0`
pub fn format_annotation(tags: &[ModTag]) -> String {
    let mut out = tags.len().to_string();
    for tag in tags {
        out.push_str(&format!("({},{},{})", tag.position, tag.residue, tag.tag));
    }
    out
}

/// Format entries in the legacy grammar
pub fn format_legacy_annotation(tags: &[ModTag]) -> String {
    let mut out = tags.len().to_string();
    for tag in tags {
        out.push_str(&format!("/{},{},{}", tag.position, tag.residue, tag.tag));
    }
    out
}
