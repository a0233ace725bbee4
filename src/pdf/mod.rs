//! PDF Export
//!
//! Renders a finished markdown report into a simple paginated PDF: a title
//! line, `#`/`##`/`###` headings, bullet items, and justified-enough body
//! text in the built-in Helvetica faces. Inline markdown emphasis is
//! stripped rather than styled; the PDF is a download artifact, not a
//! typesetting feature.

use crate::types::{AppError, AppResult};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 72.0;
const BODY_SIZE: f32 = 11.0;
const TITLE_SIZE: f32 = 24.0;

/// Average glyph width as a fraction of the font size, good enough for
/// wrapping Helvetica without embedding metrics.
const GLYPH_WIDTH_RATIO: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
enum BlockKind {
    Title,
    Heading1,
    Heading2,
    Heading3,
    Bullet,
    Body,
}

impl BlockKind {
    fn font_size(self) -> f32 {
        match self {
            BlockKind::Title => TITLE_SIZE,
            BlockKind::Heading1 => 18.0,
            BlockKind::Heading2 => 16.0,
            BlockKind::Heading3 => 13.0,
            BlockKind::Bullet | BlockKind::Body => BODY_SIZE,
        }
    }

    fn bold(self) -> bool {
        matches!(
            self,
            BlockKind::Title | BlockKind::Heading1 | BlockKind::Heading2 | BlockKind::Heading3
        )
    }

    fn indent(self) -> f32 {
        if self == BlockKind::Bullet {
            14.0
        } else {
            0.0
        }
    }

    fn space_before(self) -> f32 {
        match self {
            BlockKind::Title => 0.0,
            BlockKind::Heading1 | BlockKind::Heading2 => 14.0,
            BlockKind::Heading3 => 10.0,
            BlockKind::Bullet => 2.0,
            BlockKind::Body => 6.0,
        }
    }
}

#[derive(Debug)]
struct Block {
    kind: BlockKind,
    text: String,
}

/// Convert markdown text to PDF bytes.
pub fn markdown_to_pdf(markdown: &str, title: &str) -> AppResult<Vec<u8>> {
    let mut blocks = vec![Block {
        kind: BlockKind::Title,
        text: title.to_string(),
    }];
    blocks.extend(parse_blocks(markdown));

    let pages = layout(&blocks);
    build_document(&pages)
}

/// Split markdown into typed blocks. Tables and code fences degrade to
/// plain body lines.
fn parse_blocks(markdown: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut paragraph = String::new();

    let mut flush = |paragraph: &mut String, blocks: &mut Vec<Block>| {
        if !paragraph.trim().is_empty() {
            blocks.push(Block {
                kind: BlockKind::Body,
                text: strip_inline_markup(paragraph.trim()),
            });
        }
        paragraph.clear();
    };

    for line in markdown.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            flush(&mut paragraph, &mut blocks);
        } else if let Some(text) = trimmed.strip_prefix("### ") {
            flush(&mut paragraph, &mut blocks);
            blocks.push(Block {
                kind: BlockKind::Heading3,
                text: strip_inline_markup(text),
            });
        } else if let Some(text) = trimmed.strip_prefix("## ") {
            flush(&mut paragraph, &mut blocks);
            blocks.push(Block {
                kind: BlockKind::Heading2,
                text: strip_inline_markup(text),
            });
        } else if let Some(text) = trimmed.strip_prefix("# ") {
            flush(&mut paragraph, &mut blocks);
            blocks.push(Block {
                kind: BlockKind::Heading1,
                text: strip_inline_markup(text),
            });
        } else if let Some(text) = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "))
        {
            flush(&mut paragraph, &mut blocks);
            blocks.push(Block {
                kind: BlockKind::Bullet,
                text: format!("\u{2022} {}", strip_inline_markup(text)),
            });
        } else {
            if !paragraph.is_empty() {
                paragraph.push(' ');
            }
            paragraph.push_str(trimmed);
        }
    }
    flush(&mut paragraph, &mut blocks);
    blocks
}

/// Drop emphasis and code markers; replace characters outside Latin-1,
/// which the built-in fonts cannot show, with '?'.
fn strip_inline_markup(text: &str) -> String {
    text.replace("**", "")
        .replace('`', "")
        .replace("\\$", "$")
        .chars()
        .map(|c| if (c as u32) < 256 { c } else { '?' })
        .collect()
}

struct Line {
    text: String,
    kind: BlockKind,
}

/// Wrap blocks into lines and lines into pages.
fn layout(blocks: &[Block]) -> Vec<Vec<(Line, f32)>> {
    let usable_width = PAGE_WIDTH - 2.0 * MARGIN;
    let mut pages: Vec<Vec<(Line, f32)>> = Vec::new();
    let mut current: Vec<(Line, f32)> = Vec::new();
    let mut y = PAGE_HEIGHT - MARGIN;

    for block in blocks {
        let size = block.kind.font_size();
        let line_height = size * 1.4;
        let max_chars =
            ((usable_width - block.kind.indent()) / (size * GLYPH_WIDTH_RATIO)).max(8.0) as usize;

        y -= block.kind.space_before();
        for wrapped in wrap_text(&block.text, max_chars) {
            if y - line_height < MARGIN {
                pages.push(std::mem::take(&mut current));
                y = PAGE_HEIGHT - MARGIN;
            }
            y -= line_height;
            current.push((
                Line {
                    text: wrapped,
                    kind: block.kind,
                },
                y,
            ));
        }
    }

    if !current.is_empty() || pages.is_empty() {
        pages.push(current);
    }
    pages
}

fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > max_chars {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn build_document(pages: &[Vec<(Line, f32)>]) -> AppResult<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let font_bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_regular,
            "F2" => font_bold,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for page in pages {
        let mut operations = Vec::new();
        for (line, y) in page {
            if line.text.is_empty() {
                continue;
            }
            let font = if line.kind.bold() { "F2" } else { "F1" };
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec![font.into(), line.kind.font_size().into()],
            ));
            operations.push(Operation::new(
                "Td",
                vec![(MARGIN + line.kind.indent()).into(), (*y).into()],
            ));
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal(line.text.clone())],
            ));
            operations.push(Operation::new("ET", vec![]));
        }

        let encoded = Content { operations }
            .encode()
            .map_err(|e| AppError::Internal(format!("PDF content encoding: {}", e)))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| AppError::Internal(format!("PDF serialization: {}", e)))?;
    Ok(buffer)
}
