//! In-memory model of a folder document: ordered, style-tagged blocks.
//!
//! The aggregator only ever builds this model; turning it into a container
//! file is the job of a [`crate::DocumentSink`].

use chrono::{DateTime, Local};

/// Background fill used behind code blocks.
pub const CODE_SHADING: &str = "F2F2F2";

/// Background tint of a block, as an RGB hex string without `#`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shading {
    pub fill: String,
}

impl Shading {
    pub fn fill(hex: impl Into<String>) -> Self {
        Self { fill: hex.into() }
    }
}

/// One styled unit of document content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Centered cover title.
    Title(String),
    /// Centered generation stamp and source line under the title.
    CoverInfo { generated_on: String, source: String },
    /// Section heading (file name).
    Heading(String),
    /// Small grey italic line under a heading.
    Caption(String),
    /// Fixed-width text, optionally tinted.
    Code {
        text: String,
        shading: Option<Shading>,
    },
    PageBreak,
}

/// One rendered file: heading, path caption, and the raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSection {
    pub name: String,
    pub path: String,
    pub content: String,
}

impl FileSection {
    fn into_blocks(self) -> [Block; 4] {
        [
            Block::Heading(self.name),
            Block::Caption(format!("Full Path: {}", self.path)),
            Block::Code {
                text: clean_text(&self.content),
                shading: Some(Shading::fill(CODE_SHADING)),
            },
            Block::PageBreak,
        ]
    }
}

/// A document under construction for one folder (or one single report).
#[derive(Debug, Clone)]
pub struct FolderDocument {
    name: String,
    blocks: Vec<Block>,
    sections: Vec<String>,
}

impl FolderDocument {
    /// Start a document with its cover: title, generation time, source address.
    pub fn new(name: impl Into<String>, source_url: &str, generated_at: DateTime<Local>) -> Self {
        let name = name.into();
        let blocks = vec![
            Block::Title(name.clone()),
            Block::CoverInfo {
                generated_on: format!("Generated on: {}", generated_at.format("%Y-%m-%d %H:%M")),
                source: format!("Source: {source_url}"),
            },
            Block::PageBreak,
        ];
        Self {
            name,
            blocks,
            sections: Vec::new(),
        }
    }

    /// Append a file section; sections are never edited afterwards.
    pub fn push_section(&mut self, section: FileSection) {
        self.sections.push(section.name.clone());
        self.blocks.extend(section.into_blocks());
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Headings of the appended sections, in order.
    pub fn section_headings(&self) -> &[String] {
        &self.sections
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }
}

/// Normalize line endings and drop control characters a document cannot hold.
pub fn clean_text(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .chars()
        .filter(|c| *c == '\n' || *c == '\t' || !c.is_control())
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn stamp() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap()
    }

    #[test]
    fn new_document_has_cover_only() {
        let doc = FolderDocument::new("util", "https://github.com/acme/widgets", stamp());
        assert_eq!(doc.section_count(), 0);
        assert_eq!(
            doc.blocks(),
            &[
                Block::Title("util".into()),
                Block::CoverInfo {
                    generated_on: "Generated on: 2024-03-09 14:05".into(),
                    source: "Source: https://github.com/acme/widgets".into(),
                },
                Block::PageBreak,
            ]
        );
    }

    #[test]
    fn sections_append_heading_caption_code_break() {
        let mut doc = FolderDocument::new("src", "u", stamp());
        doc.push_section(FileSection {
            name: "main.cpp".into(),
            path: "src/main.cpp".into(),
            content: "int main() {}\r\n".into(),
        });

        assert_eq!(doc.section_headings(), &["main.cpp".to_string()]);
        let tail = &doc.blocks()[3..];
        assert_eq!(tail[0], Block::Heading("main.cpp".into()));
        assert_eq!(tail[1], Block::Caption("Full Path: src/main.cpp".into()));
        assert_eq!(
            tail[2],
            Block::Code {
                text: "int main() {}\n".into(),
                shading: Some(Shading::fill(CODE_SHADING)),
            }
        );
        assert_eq!(tail[3], Block::PageBreak);
    }

    #[test]
    fn clean_text_strips_control_characters() {
        assert_eq!(clean_text("a\u{0}b\u{c}\tc\r\nd\re"), "ab\tc\nd\ne");
    }
}
