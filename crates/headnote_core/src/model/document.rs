//! Structured rich-text document model.
//!
//! # Responsibility
//! - Represent note content as an ordered list of insert operations.
//! - Expose the line view (text + block formats) used by heading checks.
//! - Keep the JSON wire shape compatible with rich-text delta payloads.
//!
//! # Invariants
//! - Attributes form a closed set; unknown keys fail deserialization.
//! - A line's block formats live on the newline that terminates it.
//! - `Header`, `List`, `Blockquote` and `CodeBlock` are mutually exclusive
//!   on one line.
//!
//! # See also
//! - `crate::heading` for the first-line heading rule.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

const MAX_INDENT: u8 = 8;

pub type DocumentResult<T> = Result<T, DocumentError>;

/// Validation and editing errors for [`Document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    InvalidHeadingLevel(u8),
    InvalidIndent(u8),
    LineOutOfRange { index: usize, line_count: usize },
    NotALineFormat(AttributeKind),
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidHeadingLevel(level) => {
                write!(f, "heading level {level} is outside 1..=6")
            }
            Self::InvalidIndent(level) => {
                write!(f, "indent level {level} is outside 1..={MAX_INDENT}")
            }
            Self::LineOutOfRange { index, line_count } => write!(
                f,
                "line index {index} is out of range for document with {line_count} lines"
            ),
            Self::NotALineFormat(kind) => {
                write!(f, "attribute `{}` cannot format a whole line", kind.key())
            }
        }
    }
}

impl Error for DocumentError {}

/// Heading levels supported by the editing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
}

impl HeadingLevel {
    pub fn from_u8(level: u8) -> DocumentResult<Self> {
        match level {
            1 => Ok(Self::H1),
            2 => Ok(Self::H2),
            3 => Ok(Self::H3),
            4 => Ok(Self::H4),
            5 => Ok(Self::H5),
            6 => Ok(Self::H6),
            other => Err(DocumentError::InvalidHeadingLevel(other)),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Self::H1 => 1,
            Self::H2 => 2,
            Self::H3 => 3,
            Self::H4 => 4,
            Self::H5 => 5,
            Self::H6 => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Ordered,
    Bullet,
}

/// Discriminant of [`Attribute`], used as the key of an [`AttributeSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttributeKind {
    Header,
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
    Link,
    List,
    Indent,
    Blockquote,
    CodeBlock,
}

impl AttributeKind {
    /// Wire key used in serialized attribute maps.
    pub fn key(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Underline => "underline",
            Self::Strike => "strike",
            Self::Code => "code",
            Self::Link => "link",
            Self::List => "list",
            Self::Indent => "indent",
            Self::Blockquote => "blockquote",
            Self::CodeBlock => "code-block",
        }
    }

    /// Returns whether this attribute applies to a whole line.
    pub fn is_line_format(self) -> bool {
        matches!(
            self,
            Self::Header | Self::List | Self::Indent | Self::Blockquote | Self::CodeBlock
        )
    }

    /// Block kinds that replace each other when a line is reformatted.
    fn is_exclusive_block(self) -> bool {
        matches!(
            self,
            Self::Header | Self::List | Self::Blockquote | Self::CodeBlock
        )
    }
}

/// One formatting attribute. The set of variants is closed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Attribute {
    Header(HeadingLevel),
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
    Link(String),
    List(ListKind),
    Indent(u8),
    Blockquote,
    CodeBlock,
}

impl Attribute {
    pub fn kind(&self) -> AttributeKind {
        match self {
            Self::Header(_) => AttributeKind::Header,
            Self::Bold => AttributeKind::Bold,
            Self::Italic => AttributeKind::Italic,
            Self::Underline => AttributeKind::Underline,
            Self::Strike => AttributeKind::Strike,
            Self::Code => AttributeKind::Code,
            Self::Link(_) => AttributeKind::Link,
            Self::List(_) => AttributeKind::List,
            Self::Indent(_) => AttributeKind::Indent,
            Self::Blockquote => AttributeKind::Blockquote,
            Self::CodeBlock => AttributeKind::CodeBlock,
        }
    }
}

/// Formatting attributes of one operation, at most one value per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAttributes", into = "RawAttributes")]
pub struct AttributeSet {
    entries: BTreeMap<AttributeKind, Attribute>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Inserts `attribute`, replacing any previous value of the same kind.
    pub fn insert(&mut self, attribute: Attribute) -> Option<Attribute> {
        self.entries.insert(attribute.kind(), attribute)
    }

    pub fn remove(&mut self, kind: AttributeKind) -> Option<Attribute> {
        self.entries.remove(&kind)
    }

    pub fn get(&self, kind: AttributeKind) -> Option<&Attribute> {
        self.entries.get(&kind)
    }

    pub fn contains(&self, attribute: &Attribute) -> bool {
        self.entries.get(&attribute.kind()) == Some(attribute)
    }

    pub fn header(&self) -> Option<HeadingLevel> {
        match self.entries.get(&AttributeKind::Header) {
            Some(Attribute::Header(level)) => Some(*level),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.entries.values()
    }

    /// Returns only the attributes that format a whole line.
    pub fn line_formats(&self) -> AttributeSet {
        self.iter()
            .filter(|attribute| attribute.kind().is_line_format())
            .cloned()
            .collect()
    }

    /// Applies a line format, dropping competing block kinds first.
    fn apply_line_format(&mut self, attribute: Attribute) {
        if attribute.kind().is_exclusive_block() {
            self.entries.retain(|kind, _| !kind.is_exclusive_block());
        }
        self.insert(attribute);
    }
}

impl FromIterator<Attribute> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        let mut set = AttributeSet::new();
        for attribute in iter {
            set.insert(attribute);
        }
        set
    }
}

/// Wire shape of an attribute map.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    header: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    underline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    strike: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    code: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    list: Option<ListKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    indent: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    blockquote: Option<bool>,
    #[serde(
        default,
        rename = "code-block",
        skip_serializing_if = "Option::is_none"
    )]
    code_block: Option<bool>,
}

impl TryFrom<RawAttributes> for AttributeSet {
    type Error = DocumentError;

    fn try_from(raw: RawAttributes) -> Result<Self, Self::Error> {
        let mut set = AttributeSet::new();
        if let Some(level) = raw.header {
            set.insert(Attribute::Header(HeadingLevel::from_u8(level)?));
        }
        let flags = [
            (raw.bold, Attribute::Bold),
            (raw.italic, Attribute::Italic),
            (raw.underline, Attribute::Underline),
            (raw.strike, Attribute::Strike),
            (raw.code, Attribute::Code),
            (raw.blockquote, Attribute::Blockquote),
            (raw.code_block, Attribute::CodeBlock),
        ];
        for (flag, attribute) in flags {
            if flag == Some(true) {
                set.insert(attribute);
            }
        }
        if let Some(url) = raw.link {
            set.insert(Attribute::Link(url));
        }
        if let Some(kind) = raw.list {
            set.insert(Attribute::List(kind));
        }
        if let Some(level) = raw.indent {
            if level == 0 || level > MAX_INDENT {
                return Err(DocumentError::InvalidIndent(level));
            }
            set.insert(Attribute::Indent(level));
        }
        Ok(set)
    }
}

impl From<AttributeSet> for RawAttributes {
    fn from(set: AttributeSet) -> Self {
        let mut raw = RawAttributes::default();
        for attribute in set.entries.into_values() {
            match attribute {
                Attribute::Header(level) => raw.header = Some(level.as_u8()),
                Attribute::Bold => raw.bold = Some(true),
                Attribute::Italic => raw.italic = Some(true),
                Attribute::Underline => raw.underline = Some(true),
                Attribute::Strike => raw.strike = Some(true),
                Attribute::Code => raw.code = Some(true),
                Attribute::Link(url) => raw.link = Some(url),
                Attribute::List(kind) => raw.list = Some(kind),
                Attribute::Indent(level) => raw.indent = Some(level),
                Attribute::Blockquote => raw.blockquote = Some(true),
                Attribute::CodeBlock => raw.code_block = Some(true),
            }
        }
        raw
    }
}

/// Non-text content occupying a single position in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Embed {
    Image(String),
    Video(String),
    Formula(String),
}

/// Inserted value of one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Insert {
    Text(String),
    Embed(Embed),
}

/// One insert operation with its formatting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Op {
    pub insert: Insert,
    #[serde(default, skip_serializing_if = "AttributeSet::is_empty")]
    pub attributes: AttributeSet,
}

impl Op {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            insert: Insert::Text(text.into()),
            attributes: AttributeSet::new(),
        }
    }

    pub fn formatted(text: impl Into<String>, attributes: AttributeSet) -> Self {
        Self {
            insert: Insert::Text(text.into()),
            attributes,
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            insert: Insert::Embed(embed),
            attributes: AttributeSet::new(),
        }
    }
}

/// One rendered line: its text (embeds omitted) and block formats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub index: usize,
    pub text: String,
    pub formats: AttributeSet,
}

/// Ordered insert operations describing the whole note body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Document {
    pub ops: Vec<Op>,
}

impl Document {
    pub fn new(ops: Vec<Op>) -> Self {
        Self { ops }
    }

    /// Empty document whose single line already carries heading level 1.
    pub fn fresh() -> Self {
        let formats = AttributeSet::from_iter([Attribute::Header(HeadingLevel::H1)]);
        Self {
            ops: vec![Op::formatted("\n", formats)],
        }
    }

    /// Builds an unformatted document from plain text.
    pub fn from_text(text: &str) -> Self {
        Self::new(vec![Op::text(text)]).normalized()
    }

    /// Returns a copy that ends with a newline, without empty text inserts
    /// and with adjacent equally formatted text inserts merged.
    pub fn normalized(&self) -> Self {
        let mut doc = self.clone();
        doc.normalize();
        doc
    }

    fn normalize(&mut self) {
        let mut merged: Vec<Op> = Vec::with_capacity(self.ops.len());
        for op in self.ops.drain(..) {
            push_merged(&mut merged, op);
        }

        let ends_with_newline = matches!(
            merged.last(),
            Some(Op { insert: Insert::Text(text), .. }) if text.ends_with('\n')
        );
        if !ends_with_newline {
            push_merged(&mut merged, Op::text("\n"));
        }
        self.ops = merged;
    }

    /// Plain text of the document; embeds contribute nothing.
    pub fn plain_text(&self) -> String {
        self.ops
            .iter()
            .filter_map(|op| match &op.insert {
                Insert::Text(text) => Some(text.as_str()),
                Insert::Embed(_) => None,
            })
            .collect()
    }

    /// Trimmed text preceding the first line break.
    pub fn title(&self) -> String {
        derive_title(&self.plain_text())
    }

    pub fn lines(&self) -> Vec<Line> {
        let mut lines = Vec::new();
        let mut current = String::new();

        for op in &self.ops {
            let text = match &op.insert {
                Insert::Text(text) => text,
                Insert::Embed(_) => continue,
            };
            let mut segments = text.split('\n').peekable();
            while let Some(segment) = segments.next() {
                current.push_str(segment);
                if segments.peek().is_some() {
                    lines.push(Line {
                        index: lines.len(),
                        text: std::mem::take(&mut current),
                        formats: op.attributes.line_formats(),
                    });
                }
            }
        }

        if !current.is_empty() || lines.is_empty() {
            lines.push(Line {
                index: lines.len(),
                text: current,
                formats: AttributeSet::new(),
            });
        }
        lines
    }

    pub fn line_count(&self) -> usize {
        self.lines().len()
    }

    pub fn line(&self, index: usize) -> Option<Line> {
        self.lines().into_iter().nth(index)
    }

    /// Applies a line format to line `index`.
    ///
    /// The format lands on the newline terminating the line; a missing
    /// terminator is appended. Competing block kinds are replaced.
    ///
    /// # Errors
    /// - `NotALineFormat` for inline attributes.
    /// - `LineOutOfRange` when `index` is past the last line.
    pub fn format_line(&mut self, index: usize, attribute: Attribute) -> DocumentResult<()> {
        if !attribute.kind().is_line_format() {
            return Err(DocumentError::NotALineFormat(attribute.kind()));
        }
        let line_count = self.line_count();
        if index >= line_count {
            return Err(DocumentError::LineOutOfRange { index, line_count });
        }

        match self.locate_newline(index) {
            Some((op_index, byte_offset)) => {
                self.split_newline(op_index, byte_offset, attribute);
            }
            None => {
                let mut formats = AttributeSet::new();
                formats.apply_line_format(attribute);
                self.ops.push(Op::formatted("\n", formats));
            }
        }
        self.normalize();
        Ok(())
    }

    /// Inserts `text` at the end of the last line, as typing would.
    ///
    /// The last line keeps its formats; lines opened by newlines inside
    /// `text` start unformatted.
    pub fn append_text(&mut self, text: &str) {
        self.normalize();
        let Some(last) = self.ops.pop() else {
            return;
        };
        let attributes = last.attributes;
        if let Insert::Text(mut body) = last.insert {
            body.pop();
            self.ops.push(Op::formatted(body, attributes.clone()));
        }
        match text.split_once('\n') {
            Some((head, tail)) => {
                self.ops.push(Op::text(head));
                self.ops.push(Op::formatted("\n", attributes));
                self.ops.push(Op::text(tail));
                self.ops.push(Op::text("\n"));
            }
            None => {
                self.ops.push(Op::text(text));
                self.ops.push(Op::formatted("\n", attributes));
            }
        }
        self.normalize();
    }

    /// Finds the op and byte offset of the newline ending line `index`.
    fn locate_newline(&self, index: usize) -> Option<(usize, usize)> {
        let mut seen = 0;
        for (op_index, op) in self.ops.iter().enumerate() {
            if let Insert::Text(text) = &op.insert {
                for (byte_offset, _) in text.match_indices('\n') {
                    if seen == index {
                        return Some((op_index, byte_offset));
                    }
                    seen += 1;
                }
            }
        }
        None
    }

    fn split_newline(&mut self, op_index: usize, byte_offset: usize, attribute: Attribute) {
        let Insert::Text(text) = &self.ops[op_index].insert else {
            return;
        };
        let before = text[..byte_offset].to_string();
        let after = text[byte_offset + 1..].to_string();
        let attributes = self.ops[op_index].attributes.clone();

        let mut newline_formats = attributes.clone();
        newline_formats.apply_line_format(attribute);

        let replacement = [
            Op::formatted(before, attributes.clone()),
            Op::formatted("\n", newline_formats),
            Op::formatted(after, attributes),
        ];
        self.ops.splice(op_index..=op_index, replacement);
    }
}

/// Appends `op`, skipping empty text and merging into an equally formatted
/// text predecessor.
fn push_merged(ops: &mut Vec<Op>, op: Op) {
    if let Insert::Text(text) = &op.insert {
        if text.is_empty() {
            return;
        }
        if let Some(Op {
            insert: Insert::Text(previous),
            attributes,
        }) = ops.last_mut()
        {
            if *attributes == op.attributes {
                previous.push_str(text);
                return;
            }
        }
    }
    ops.push(op);
}

/// Derives a note title from plain text: the trimmed first line.
pub fn derive_title(plain_text: &str) -> String {
    plain_text
        .split('\n')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::{derive_title, Attribute, Document, HeadingLevel, Op};

    #[test]
    fn derive_title_takes_trimmed_first_line() {
        assert_eq!(derive_title("  Groceries \nmilk\n"), "Groceries");
        assert_eq!(derive_title("single line"), "single line");
        assert_eq!(derive_title(""), "");
    }

    #[test]
    fn normalize_merges_adjacent_plain_text_and_appends_newline() {
        let doc = Document::new(vec![Op::text("Hel"), Op::text(""), Op::text("lo")]).normalized();
        assert_eq!(doc.ops, vec![Op::text("Hello\n")]);
    }

    #[test]
    fn format_line_splits_the_terminating_newline() {
        let mut doc = Document::from_text("Hello\nWorld\n");
        doc.format_line(1, Attribute::Header(HeadingLevel::H2))
            .expect("line 1 exists");

        let lines = doc.lines();
        assert_eq!(lines[0].formats.header(), None);
        assert_eq!(lines[1].formats.header(), Some(HeadingLevel::H2));
        assert_eq!(doc.plain_text(), "Hello\nWorld\n");
    }
}
