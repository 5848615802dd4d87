//! printpdf rendering of a laid-out report.

use std::io::BufWriter;

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point,
};

use super::layout::{DrawOp, FontStyle, PageOps, RuleOp, TextOp, PAGE_HEIGHT, PAGE_WIDTH};
use super::ReportError;

fn pt_to_mm(pt: f32) -> Mm {
    Mm(pt * 25.4 / 72.0)
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference) -> Result<Self, ReportError> {
        let font = |f: BuiltinFont| {
            doc.add_builtin_font(f)
                .map_err(|e| ReportError::Font(e.to_string()))
        };
        Ok(Self {
            regular: font(BuiltinFont::Helvetica)?,
            bold: font(BuiltinFont::HelveticaBold)?,
            italic: font(BuiltinFont::HelveticaOblique)?,
        })
    }

    fn get(&self, style: FontStyle) -> &IndirectFontRef {
        match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
            FontStyle::Italic => &self.italic,
        }
    }
}

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(printpdf::Rgb::new(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        None,
    ))
}

fn draw_text(layer: &PdfLayerReference, fonts: &Fonts, op: &TextOp) {
    layer.set_fill_color(rgb(op.color));
    layer.use_text(
        op.text.as_str(),
        op.size,
        pt_to_mm(op.x),
        pt_to_mm(PAGE_HEIGHT - op.y),
        fonts.get(op.style),
    );
}

fn draw_rule(layer: &PdfLayerReference, op: &RuleOp) {
    let y = pt_to_mm(PAGE_HEIGHT - op.y);
    layer.set_outline_thickness(op.thickness);
    layer.add_line(Line {
        points: vec![
            (Point::new(pt_to_mm(op.x1), y), false),
            (Point::new(pt_to_mm(op.x2), y), false),
        ],
        is_closed: false,
    });
}

/// Render laid-out pages into PDF bytes.
pub fn render_pages(title: &str, pages: &[PageOps]) -> Result<Vec<u8>, ReportError> {
    let width = pt_to_mm(PAGE_WIDTH);
    let height = pt_to_mm(PAGE_HEIGHT);
    let (doc, first_page, first_layer) = PdfDocument::new(title, width, height, "Layer 1");
    let fonts = Fonts::load(&doc)?;

    for (i, page) in pages.iter().enumerate() {
        let layer = if i == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (p, l) = doc.add_page(width, height, "Layer 1");
            doc.get_page(p).get_layer(l)
        };
        for op in &page.ops {
            match op {
                DrawOp::Text(t) => draw_text(&layer, &fonts, t),
                DrawOp::Rule(r) => draw_rule(&layer, r),
            }
        }
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ReportError::Save(e.to_string()))?;
    buf.into_inner()
        .map_err(|e| ReportError::Save(e.to_string()))
}
