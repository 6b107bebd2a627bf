//! `.docx` output via `docx-rs`.

use std::fs::File;
use std::path::Path;

use docx_rs::{
    AlignmentType, BreakType, Docx, Paragraph, Run, RunFonts, Shading as DocxShading, Style,
    StyleType,
};
use tracing::{debug, instrument};

use gitdocx_shared::{GitDocxError, Result};

use crate::document::{Block, FolderDocument};
use crate::sink::DocumentSink;

const BODY_FONT: &str = "Segoe UI";
const CODE_FONT: &str = "Consolas";

// Sizes are in half-points.
const BODY_SIZE: usize = 21;
const HEADING_SIZE: usize = 28;
const TITLE_SIZE: usize = 52;
const CAPTION_SIZE: usize = 16;
const CODE_SIZE: usize = 19;

const HEADING_COLOR: &str = "1F4E79";
const TITLE_COLOR: &str = "10365C";
const CAPTION_COLOR: &str = "808080";
const CODE_COLOR: &str = "000000";

/// [`DocumentSink`] producing Office Open XML word-processing files.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxSink;

impl DocxSink {
    pub fn new() -> Self {
        Self
    }

    fn build(&self, doc: &FolderDocument) -> Docx {
        let mut docx = Docx::new()
            .default_fonts(fonts(BODY_FONT))
            .default_size(BODY_SIZE)
            .add_style(
                Style::new("Title", StyleType::Paragraph)
                    .name("Title")
                    .size(TITLE_SIZE)
                    .color(TITLE_COLOR),
            )
            .add_style(
                Style::new("Heading1", StyleType::Paragraph)
                    .name("Heading 1")
                    .size(HEADING_SIZE)
                    .bold()
                    .color(HEADING_COLOR),
            );

        for block in doc.blocks() {
            docx = docx.add_paragraph(paragraph(block));
        }
        docx
    }
}

impl DocumentSink for DocxSink {
    fn extension(&self) -> &str {
        "docx"
    }

    #[instrument(skip_all, fields(document = %doc.name(), path = %path.display()))]
    fn finalize(&self, doc: &FolderDocument, path: &Path) -> Result<()> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| GitDocxError::sink(path, "output path has no file name"))?;
        let temp = path.with_file_name(format!(".{file_name}.tmp"));

        let file = File::create(&temp).map_err(|e| GitDocxError::io(&temp, e))?;
        self.build(doc)
            .build()
            .pack(file)
            .map_err(|e| GitDocxError::sink(path, e.to_string()))?;

        std::fs::rename(&temp, path).map_err(|e| GitDocxError::io(path, e))?;

        debug!(sections = doc.section_count(), "wrote docx");
        Ok(())
    }
}

fn fonts(name: &str) -> RunFonts {
    RunFonts::new().ascii(name).hi_ansi(name).cs(name)
}

fn paragraph(block: &Block) -> Paragraph {
    match block {
        Block::Title(text) => Paragraph::new()
            .style("Title")
            .align(AlignmentType::Center)
            .add_run(Run::new().add_text(text).fonts(fonts(BODY_FONT))),
        Block::CoverInfo {
            generated_on,
            source,
        } => Paragraph::new()
            .align(AlignmentType::Center)
            .add_run(
                Run::new()
                    .add_text(generated_on)
                    .bold()
                    .add_break(BreakType::TextWrapping),
            )
            .add_run(Run::new().add_text(source)),
        Block::Heading(text) => Paragraph::new()
            .style("Heading1")
            .add_run(Run::new().add_text(text)),
        Block::Caption(text) => Paragraph::new().add_run(
            Run::new()
                .add_text(text)
                .italic()
                .size(CAPTION_SIZE)
                .color(CAPTION_COLOR)
                .fonts(fonts(BODY_FONT)),
        ),
        Block::Code { text, shading } => {
            let mut run = Run::new()
                .fonts(fonts(CODE_FONT))
                .size(CODE_SIZE)
                .color(CODE_COLOR);
            if let Some(shading) = shading {
                run = run.shading(DocxShading::new().fill(shading.fill.as_str()));
            }
            Paragraph::new().add_run(code_run(run, text))
        }
        Block::PageBreak => Paragraph::new().add_run(Run::new().add_break(BreakType::Page)),
    }
}

/// Lay out `text` line by line inside one run, keeping tabs as tab stops.
fn code_run(mut run: Run, text: &str) -> Run {
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        for (j, piece) in line.split('\t').enumerate() {
            if j > 0 {
                run = run.add_tab();
            }
            if !piece.is_empty() {
                run = run.add_text(piece);
            }
        }
    }
    run
}
