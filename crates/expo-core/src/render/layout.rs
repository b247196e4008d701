//! # Document Layout
//!
//! Places every piece of an invoice on A4 pages as positioned text runs and
//! horizontal rules. No fonts are loaded here; widths use an average
//! Helvetica glyph width, which is enough for alignment and wrapping.
//!
//! ## Page Geometry (mm, origin bottom-left)
//! ```text
//! ┌──────────────────────────────── 210 ─────────────────────────────────┐
//! │                                                                      │ 297
//! │  20 ─┬─ TOP (277) ──────────────────────────────────────────── 190   │
//! │      │   INVOICE                     (centered)                      │
//! │      │   Invoice Number / Issue / Due / Status                       │
//! │      │   Bill To                                                     │
//! │      │   Description ............. Quantity ........... Amount      │
//! │      │   ───────────────────────────────────────────────────────     │
//! │      │   rows (descriptions wrap inside their column)                │
//! │      │   ───────────────────────────────────────────────────────     │
//! │      │                                          Total: INR 0.00     │
//! │      │   Notes                                                       │
//! │      │   footer (centered, small)                                    │
//! │  20 ─┴─ BOTTOM (20) ── cursor never goes below; a new page starts    │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```

use std::mem;

use crate::error::RenderError;
use crate::money::Money;
use crate::render::RenderOptions;
use crate::types::{Exhibitor, Invoice};

// =============================================================================
// Geometry
// =============================================================================

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const LEFT_MM: f32 = 20.0;
pub const RIGHT_MM: f32 = 190.0;
pub const TOP_MM: f32 = 277.0;
pub const BOTTOM_MM: f32 = 20.0;

const PT_TO_MM: f32 = 0.352_778;
/// Average Helvetica advance width, in em.
const AVG_GLYPH_EM: f32 = 0.5;
const LINE_SPACING: f32 = 1.4;
const RULE_GAP_MM: f32 = 1.5;

const QUANTITY_RIGHT_MM: f32 = 150.0;
const DESCRIPTION_WIDTH_MM: f32 = 110.0;

const TITLE_PT: f32 = 20.0;
const HEADING_PT: f32 = 12.0;
const BODY_PT: f32 = 10.0;
const FOOTER_PT: f32 = 8.0;

// =============================================================================
// Layout Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// A run of text whose baseline starts at `(x_mm, y_mm)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x_mm: f32,
    pub y_mm: f32,
    pub size_pt: f32,
    pub weight: FontWeight,
    pub text: String,
}

/// A horizontal rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub x1_mm: f32,
    pub x2_mm: f32,
    pub y_mm: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub texts: Vec<TextRun>,
    pub rules: Vec<Rule>,
}

/// A fully laid-out invoice, ready to encode.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLayout {
    pub pages: Vec<PageLayout>,
    /// Σ quantity × unit amount over all items.
    pub total: Money,
}

impl DocumentLayout {
    /// Every text run in reading order.
    pub fn texts(&self) -> impl Iterator<Item = &TextRun> {
        self.pages.iter().flat_map(|page| page.texts.iter())
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|run| run.text.contains(needle))
    }
}

// =============================================================================
// Text Metrics
// =============================================================================

fn glyph_width_mm(size_pt: f32) -> f32 {
    size_pt * PT_TO_MM * AVG_GLYPH_EM
}

/// Estimated rendered width of `text`.
pub fn text_width_mm(text: &str, size_pt: f32) -> f32 {
    text.chars().count() as f32 * glyph_width_mm(size_pt)
}

fn line_height_mm(size_pt: f32) -> f32 {
    size_pt * PT_TO_MM * LINE_SPACING
}

/// Characters that fit into `width_mm` at `size_pt`.
fn chars_per_line(width_mm: f32, size_pt: f32) -> usize {
    ((width_mm / glyph_width_mm(size_pt)).floor() as usize).max(1)
}

/// Greedy word wrap. Words longer than a line are split.
///
/// Always returns at least one (possibly empty) line; explicit newlines
/// start a new line.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();

            while word.len() > max_chars {
                if current_len > 0 {
                    lines.push(mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
            if needed > max_chars && current_len > 0 {
                lines.push(mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(word.iter());
            current_len += word.len();
        }

        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

// =============================================================================
// Composer
// =============================================================================

struct Cell<'a> {
    text: &'a str,
    x_mm: f32,
    align: Align,
    weight: FontWeight,
}

impl<'a> Cell<'a> {
    fn left(text: &'a str, x_mm: f32) -> Self {
        Cell { text, x_mm, align: Align::Left, weight: FontWeight::Regular }
    }

    fn right(text: &'a str, x_mm: f32) -> Self {
        Cell { text, x_mm, align: Align::Right, weight: FontWeight::Regular }
    }

    fn center(text: &'a str) -> Self {
        Cell { text, x_mm: PAGE_WIDTH_MM / 2.0, align: Align::Center, weight: FontWeight::Regular }
    }

    fn bold(mut self) -> Self {
        self.weight = FontWeight::Bold;
        self
    }
}

/// Moves a cursor down the page and starts a new page when content would
/// cross the bottom margin.
struct Composer {
    done: Vec<PageLayout>,
    current: PageLayout,
    cursor_mm: f32,
}

impl Composer {
    fn new() -> Self {
        Composer {
            done: Vec::new(),
            current: PageLayout::default(),
            cursor_mm: TOP_MM,
        }
    }

    fn break_page(&mut self) {
        self.done.push(mem::take(&mut self.current));
        self.cursor_mm = TOP_MM;
    }

    /// Starts a new page unless `height_mm` still fits on this one.
    fn reserve(&mut self, height_mm: f32) {
        let page_is_fresh = self.cursor_mm >= TOP_MM;
        if self.cursor_mm - height_mm < BOTTOM_MM && !page_is_fresh {
            self.break_page();
        }
    }

    fn gap(&mut self, mm: f32) {
        self.cursor_mm -= mm;
        if self.cursor_mm < BOTTOM_MM {
            self.break_page();
        }
    }

    /// Places one line of cells sharing a baseline.
    fn row(&mut self, cells: &[Cell<'_>], size_pt: f32) {
        let height = line_height_mm(size_pt);
        self.reserve(height);
        self.cursor_mm -= height;

        for cell in cells {
            let width = text_width_mm(cell.text, size_pt);
            let x_mm = match cell.align {
                Align::Left => cell.x_mm,
                Align::Center => cell.x_mm - width / 2.0,
                Align::Right => cell.x_mm - width,
            };
            self.current.texts.push(TextRun {
                x_mm,
                y_mm: self.cursor_mm,
                size_pt,
                weight: cell.weight,
                text: cell.text.to_string(),
            });
        }
    }

    fn line(&mut self, cell: Cell<'_>, size_pt: f32) {
        self.row(&[cell], size_pt);
    }

    fn rule(&mut self) {
        self.reserve(RULE_GAP_MM * 2.0);
        self.cursor_mm -= RULE_GAP_MM;
        self.current.rules.push(Rule {
            x1_mm: LEFT_MM,
            x2_mm: RIGHT_MM,
            y_mm: self.cursor_mm,
        });
        self.cursor_mm -= RULE_GAP_MM;
    }

    fn finish(mut self) -> Vec<PageLayout> {
        self.done.push(self.current);
        self.done
    }
}

// =============================================================================
// Invoice Layout
// =============================================================================

/// Lays out an invoice.
///
/// ## Errors
/// - `AmountOverflow` when an item amount or the total does not fit
/// - `DateFormat` when `options.date_format` is not a valid pattern
pub fn layout_invoice(
    invoice: &Invoice,
    exhibitor: Option<&Exhibitor>,
    options: &RenderOptions,
) -> Result<DocumentLayout, RenderError> {
    let mut rows = Vec::with_capacity(invoice.items.len());
    let mut total = Money::zero();
    for (index, item) in invoice.items.iter().enumerate() {
        let amount = item
            .line_amount()
            .ok_or(RenderError::AmountOverflow { index })?;
        total = total
            .checked_add(amount)
            .ok_or(RenderError::AmountOverflow { index })?;
        rows.push((item, amount));
    }

    let issue_date = options.format_date(invoice.issue_date)?;
    let due_date = options.format_date(invoice.due_date)?;
    let status = invoice
        .effective_status(options.generated_at)
        .as_str()
        .to_uppercase();

    let mut c = Composer::new();

    // Title
    c.line(Cell::center("INVOICE").bold(), TITLE_PT);
    if let Some(issuer) = options.issuer_name.as_deref().filter(|s| !s.trim().is_empty()) {
        c.line(Cell::center(issuer), HEADING_PT);
    }
    c.gap(6.0);

    // Metadata
    let value_x = LEFT_MM + 35.0;
    for (label, value) in [
        ("Invoice Number:", invoice.invoice_number.as_str()),
        ("Issue Date:", issue_date.as_str()),
        ("Due Date:", due_date.as_str()),
        ("Status:", status.as_str()),
    ] {
        c.row(
            &[Cell::left(label, LEFT_MM).bold(), Cell::left(value, value_x)],
            BODY_PT,
        );
    }
    c.gap(6.0);

    // Bill To
    c.line(Cell::left("Bill To:", LEFT_MM).bold(), HEADING_PT);
    c.line(Cell::left(&invoice.company, LEFT_MM), BODY_PT);
    if let Some(exhibitor) = exhibitor {
        let contact = [
            ("Contact", Some(exhibitor.contact_name.as_str())),
            ("Email", exhibitor.email.as_deref()),
            ("Phone", exhibitor.phone.as_deref()),
        ];
        for (label, value) in contact {
            if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
                let text = format!("{label}: {value}");
                c.line(Cell::left(&text, LEFT_MM), BODY_PT);
            }
        }
    }
    c.gap(6.0);

    // Items
    c.row(
        &[
            Cell::left("Description", LEFT_MM).bold(),
            Cell::right("Quantity", QUANTITY_RIGHT_MM).bold(),
            Cell::right("Amount", RIGHT_MM).bold(),
        ],
        BODY_PT,
    );
    c.rule();

    if rows.is_empty() {
        c.row(
            &[Cell::left("No items", LEFT_MM), Cell::right("0.00", RIGHT_MM)],
            BODY_PT,
        );
    }

    let desc_chars = chars_per_line(DESCRIPTION_WIDTH_MM, BODY_PT);
    let usable_mm = TOP_MM - BOTTOM_MM;
    for (item, amount) in rows {
        let lines = wrap_text(&item.description, desc_chars);
        let row_height = lines.len() as f32 * line_height_mm(BODY_PT);
        // Keep a wrapped row on one page unless it is taller than a page.
        if row_height <= usable_mm {
            c.reserve(row_height);
        }

        let quantity = item.effective_quantity().to_string();
        let amount = amount.format_amount();
        for (i, line) in lines.iter().enumerate() {
            if i == 0 {
                c.row(
                    &[
                        Cell::left(line, LEFT_MM),
                        Cell::right(&quantity, QUANTITY_RIGHT_MM),
                        Cell::right(&amount, RIGHT_MM),
                    ],
                    BODY_PT,
                );
            } else {
                c.line(Cell::left(line, LEFT_MM), BODY_PT);
            }
        }
    }
    c.rule();

    // Total
    let total_text = format!("Total: {}", total.format_with(&options.currency));
    c.line(Cell::right(&total_text, RIGHT_MM).bold(), HEADING_PT);

    // Notes
    if let Some(notes) = invoice.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        c.gap(6.0);
        c.line(Cell::left("Notes:", LEFT_MM).bold(), HEADING_PT);
        let width = chars_per_line(RIGHT_MM - LEFT_MM, BODY_PT);
        for line in wrap_text(notes.trim(), width) {
            c.line(Cell::left(&line, LEFT_MM), BODY_PT);
        }
    }

    // Footer
    c.gap(10.0);
    for line in &options.footer_lines {
        c.line(Cell::center(line), FOOTER_PT);
    }
    let generated = format!(
        "Generated on {} UTC",
        options.generated_at.format("%Y-%m-%d %H:%M:%S")
    );
    c.line(Cell::center(&generated), FOOTER_PT);

    Ok(DocumentLayout {
        pages: c.finish(),
        total,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
