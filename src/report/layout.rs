//! Page layout for the analysis report, computed in points.
//!
//! The layout is a pure plan of draw operations per page, so pagination
//! can be checked without rendering. Coordinates run top-down: `y` is the
//! text baseline measured from the top edge of the page.

use crate::prescription::PrescriptionAnalysis;

// ─── Page geometry ────────────────────────────────────────────────────────────

/// A4 portrait in points.
pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;
pub const MARGIN: f32 = 40.0;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

pub const FONT_TITLE: f32 = 20.0;
pub const FONT_SECTION_HEADER: f32 = 15.0;
pub const FONT_SUB_HEADER: f32 = 13.0;
pub const FONT_BODY: f32 = 10.0;
pub const FONT_SMALL: f32 = 9.0;
pub const FONT_VERY_SMALL: f32 = 8.0;

const LINE_HEIGHT_FACTOR: f32 = 1.3;
const RULE_OFFSET: f32 = 4.0;
const SUB_RULE_OFFSET: f32 = 3.0;
const COLUMN_GAP: f32 = 10.0;

pub const BLACK: Rgb = (0, 0, 0);
pub const THEME_PURPLE: Rgb = (0x6B, 0x21, 0xA8);

pub type Rgb = (u8, u8, u8);

pub fn line_height(size: f32) -> f32 {
    size * LINE_HEIGHT_FACTOR
}

fn space_after_title() -> f32 {
    line_height(FONT_TITLE) * 0.5
}

fn space_after_section_header() -> f32 {
    line_height(FONT_SECTION_HEADER) * 0.6
}

fn space_after_sub_header() -> f32 {
    line_height(FONT_SUB_HEADER) * 0.5
}

fn space_between_items() -> f32 {
    line_height(FONT_BODY) * 0.3
}

fn space_section_break() -> f32 {
    line_height(FONT_BODY) * 1.5
}

/// Room a section heading takes: its line plus the gap under the rule.
fn section_header_height() -> f32 {
    line_height(FONT_SECTION_HEADER) + space_after_section_header() / 2.0
}

/// Tallest wrapped block that is moved whole to the next page rather than split.
fn keep_together_limit() -> f32 {
    PAGE_HEIGHT - 2.0 * MARGIN - section_header_height()
}

// ─── Draw operations ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextOp {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub style: FontStyle,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleOp {
    pub x1: f32,
    pub x2: f32,
    pub y: f32,
    pub thickness: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text(TextOp),
    Rule(RuleOp),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageOps {
    pub ops: Vec<DrawOp>,
}

impl PageOps {
    pub fn texts(&self) -> impl Iterator<Item = &TextOp> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text(t) => Some(t),
            DrawOp::Rule(_) => None,
        })
    }
}

/// Approximate Helvetica advance width. Builtin fonts carry no metrics
/// we can query, so average glyph widths are used.
pub fn text_width(text: &str, size: f32, style: FontStyle) -> f32 {
    let em = match style {
        FontStyle::Bold => 0.56,
        FontStyle::Regular | FontStyle::Italic => 0.5,
    };
    text.chars().count() as f32 * size * em
}

/// Greedy word wrap to `max_chars` per line. Always yields at least one line.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let current_len = current.chars().count();
        if current_len + word.chars().count() + 1 > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn wrap_to_width(text: &str, width: f32, size: f32) -> Vec<String> {
    let max_chars = (width / (size * 0.5)).floor().max(1.0) as usize;
    wrap_text(text, max_chars)
}

// ─── Cursor ──────────────────────────────────────────────────────────────────

struct Cursor {
    pages: Vec<PageOps>,
    y: f32,
}

impl Cursor {
    fn new() -> Self {
        Self {
            pages: vec![PageOps::default()],
            y: MARGIN,
        }
    }

    fn add_page(&mut self) {
        self.pages.push(PageOps::default());
        self.y = MARGIN;
    }

    /// Start a new page if `required` more points would cross the bottom margin.
    fn ensure(&mut self, required: f32) {
        if self.y + required > PAGE_HEIGHT - MARGIN {
            self.add_page();
        }
    }

    fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, size: f32, style: FontStyle, color: Rgb) {
        self.push(DrawOp::Text(TextOp {
            text: text.to_string(),
            x,
            y,
            size,
            style,
            color,
        }));
    }

    fn text(&mut self, text: &str, x: f32, size: f32, style: FontStyle, color: Rgb) {
        self.ensure(line_height(size));
        let y = self.y;
        self.draw_text(text, x, y, size, style, color);
        self.y += line_height(size);
    }

    fn centered(&mut self, text: &str, size: f32, style: FontStyle, color: Rgb) {
        let x = (PAGE_WIDTH - text_width(text, size, style)) / 2.0;
        self.text(text, x.max(MARGIN), size, style, color);
    }

    /// Wrapped block kept together when it fits on a page, split line by
    /// line when it is taller than a page.
    fn wrapped(&mut self, text: &str, x: f32, width: f32, size: f32) {
        let lines = wrap_to_width(text, width, size);
        let block = lines.len() as f32 * line_height(size);
        if block <= keep_together_limit() {
            self.ensure(block);
        }
        for line in &lines {
            self.text(line, x, size, FontStyle::Regular, BLACK);
        }
    }

    /// Rule placed just under the baseline of the line above. It sits inside
    /// that line's height, so it always shares the line's page.
    fn rule_under(&mut self, size: f32, offset: f32, x2: f32, thickness: f32) {
        self.y = self.y - line_height(size) + offset;
        let y = self.y;
        self.push(DrawOp::Rule(RuleOp {
            x1: MARGIN,
            x2,
            y,
            thickness,
        }));
        self.y += thickness + 2.0;
    }

    /// Heading and rule, moved to a new page unless `keep_with` points of
    /// the following content fit under them.
    fn section_header(&mut self, title: &str, keep_with: f32) {
        self.ensure(section_header_height() + keep_with);
        self.text(title, MARGIN, FONT_SECTION_HEADER, FontStyle::Bold, BLACK);
        self.rule_under(FONT_SECTION_HEADER, RULE_OFFSET, PAGE_WIDTH - MARGIN, 1.0);
        self.y += space_after_section_header() / 2.0;
    }
}

// ─── Report plan ─────────────────────────────────────────────────────────────

/// Lay out the full report and stamp the footer on every page.
pub fn layout_analysis(analysis: &PrescriptionAnalysis) -> Vec<PageOps> {
    let mut c = Cursor::new();

    c.centered("Your Prescription", FONT_SECTION_HEADER, FontStyle::Bold, THEME_PURPLE);
    c.y += space_after_sub_header() * 0.7;
    c.centered("Analysis Report", FONT_TITLE, FontStyle::Bold, BLACK);
    c.y += space_after_title();
    c.centered(
        &format!("File: {} | Uploaded: {}", analysis.file_name, analysis.upload_date),
        FONT_SMALL,
        FontStyle::Italic,
        BLACK,
    );
    c.y += space_section_break();

    c.section_header(
        "Analysis Summary",
        lead_height(&analysis.summary, CONTENT_WIDTH, FONT_BODY),
    );
    c.wrapped(&analysis.summary, MARGIN, CONTENT_WIDTH, FONT_BODY);
    c.y += space_section_break();

    if !analysis.overall_risk_level.is_empty() {
        risk_line(&mut c, analysis);
    }

    let bullets: Vec<String> = analysis
        .recommendations
        .iter()
        .map(|rec| format!("• {rec}"))
        .collect();
    let recommendations_lead = bullets
        .first()
        .map_or(0.0, |first| lead_height(first, CONTENT_WIDTH - MARGIN, FONT_BODY));

    // With no medicines the next thing under this heading is the next heading.
    let medicine_block = line_height(FONT_SUB_HEADER) * 5.0;
    let count = analysis.medicines.len();
    c.section_header(
        "Medication Details",
        if count > 0 {
            medicine_block
        } else {
            section_header_height() + recommendations_lead
        },
    );
    for (index, med) in analysis.medicines.iter().enumerate() {
        c.ensure(medicine_block);
        c.text(
            &format!("{} ({})", med.name, med.kind),
            MARGIN,
            FONT_SUB_HEADER,
            FontStyle::Bold,
            BLACK,
        );
        c.rule_under(
            FONT_SUB_HEADER,
            SUB_RULE_OFFSET,
            CONTENT_WIDTH * 0.75 + MARGIN,
            0.5,
        );
        c.y += space_after_sub_header() / 2.0;

        c.wrapped(&med.description, MARGIN, CONTENT_WIDTH, FONT_BODY);
        c.y += space_between_items();

        dosage_and_frequency(&mut c, &med.dosage, &med.frequency);
        c.y += space_between_items() * 2.0;

        list_columns(
            &mut c,
            [
                ("Side Effects", med.side_effects.as_slice()),
                ("Warnings", med.warnings.as_slice()),
                ("Interactions", med.interactions.as_slice()),
            ],
        );

        if index + 1 < count {
            c.y += space_section_break();
        }
    }

    c.section_header("Key Recommendations", recommendations_lead);
    for bullet in &bullets {
        c.wrapped(bullet, MARGIN, CONTENT_WIDTH - MARGIN, FONT_BODY);
        c.y += space_between_items();
    }

    stamp_footers(&mut c.pages);
    c.pages
}

/// Height of the part of a wrapped block that must follow its heading.
fn lead_height(text: &str, width: f32, size: f32) -> f32 {
    let block = wrap_to_width(text, width, size).len() as f32 * line_height(size);
    if block <= keep_together_limit() {
        block
    } else {
        line_height(size)
    }
}

fn risk_line(c: &mut Cursor, analysis: &PrescriptionAnalysis) {
    c.ensure(line_height(FONT_SUB_HEADER) * 2.0);
    let label = "Overall Potential Risk Level:";
    let y = c.y;
    c.draw_text(label, MARGIN, y, FONT_SUB_HEADER, FontStyle::Bold, BLACK);
    let x = MARGIN + text_width(label, FONT_SUB_HEADER, FontStyle::Bold) + 8.0;
    c.draw_text(
        &analysis.overall_risk_level,
        x,
        y,
        FONT_SUB_HEADER,
        FontStyle::Bold,
        analysis.risk_level().rgb(),
    );
    c.y += line_height(FONT_SUB_HEADER) + space_section_break();
}

fn dosage_and_frequency(c: &mut Cursor, dosage: &str, frequency: &str) {
    const DOSAGE: &str = "Dosage:";
    const FREQUENCY: &str = "Frequency:";

    c.ensure(line_height(FONT_BODY) * 2.0);
    let y = c.y;
    c.draw_text(DOSAGE, MARGIN, y, FONT_BODY, FontStyle::Bold, BLACK);
    let dosage_x = MARGIN + text_width(DOSAGE, FONT_BODY, FontStyle::Bold) + 5.0;
    c.draw_text(dosage, dosage_x, y, FONT_BODY, FontStyle::Regular, BLACK);

    let freq_x = MARGIN + CONTENT_WIDTH / 2.0 + 20.0;
    let combined = format!("{FREQUENCY}{frequency}");
    let (x, y) = if freq_x + text_width(&combined, FONT_BODY, FontStyle::Regular)
        < PAGE_WIDTH - MARGIN
    {
        (freq_x, y)
    } else {
        (MARGIN, y + line_height(FONT_BODY))
    };
    c.draw_text(FREQUENCY, x, y, FONT_BODY, FontStyle::Bold, BLACK);
    let value_x = x + text_width(FREQUENCY, FONT_BODY, FontStyle::Bold) + 5.0;
    c.draw_text(frequency, value_x, y, FONT_BODY, FontStyle::Regular, BLACK);
    c.y = y + line_height(FONT_BODY);
}

/// Three side-by-side bullet lists. Only the first column may move the
/// section to a new page; later columns drop items that would overflow.
fn list_columns(c: &mut Cursor, columns: [(&str, &[String]); 3]) {
    let col_width = (CONTENT_WIDTH - 20.0) / 3.0;
    let limit = PAGE_HEIGHT - MARGIN - line_height(FONT_VERY_SMALL);

    c.ensure(line_height(FONT_SMALL) * 3.0);
    let mut top = c.y;
    let mut max_y = c.y;

    for (i, (title, items)) in columns.iter().enumerate() {
        let x = MARGIN + i as f32 * (col_width + COLUMN_GAP);
        c.draw_text(title, x, top, FONT_SMALL, FontStyle::Bold, BLACK);
        let mut y = top + line_height(FONT_SMALL) + space_between_items() / 2.0;

        for item in items.iter() {
            let lines = wrap_to_width(&format!("• {item}"), col_width - 5.0, FONT_VERY_SMALL);
            let block = lines.len() as f32 * line_height(FONT_VERY_SMALL);
            if y + block > limit {
                if i > 0 {
                    break;
                }
                c.add_page();
                top = MARGIN;
                max_y = MARGIN;
                c.draw_text(title, x, top, FONT_SMALL, FontStyle::Bold, BLACK);
                y = top + line_height(FONT_SMALL) + space_between_items() / 2.0;
            }
            for (k, line) in lines.iter().enumerate() {
                let line_y = y + k as f32 * line_height(FONT_VERY_SMALL);
                c.draw_text(line, x, line_y, FONT_VERY_SMALL, FontStyle::Regular, BLACK);
            }
            y += block + space_between_items() / 2.0;
        }
        max_y = max_y.max(y);
    }
    c.y = max_y + space_between_items();
}

pub fn footer_text(page: usize, total: usize) -> String {
    format!("Page {page} of {total} - MedASK AI Report")
}

fn stamp_footers(pages: &mut [PageOps]) {
    let total = pages.len();
    for (i, page) in pages.iter_mut().enumerate() {
        let text = footer_text(i + 1, total);
        let x = (PAGE_WIDTH - text_width(&text, FONT_VERY_SMALL, FontStyle::Italic)) / 2.0;
        page.ops.push(DrawOp::Text(TextOp {
            text,
            x,
            y: PAGE_HEIGHT - MARGIN / 1.5,
            size: FONT_VERY_SMALL,
            style: FontStyle::Italic,
            color: BLACK,
        }));
    }
}
