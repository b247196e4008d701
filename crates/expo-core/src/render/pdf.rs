//! PDF encoding of a [`DocumentLayout`] with printpdf's builtin Helvetica.

use std::io::BufWriter;

use printpdf::{BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point};

use crate::error::RenderError;
use crate::render::layout::{DocumentLayout, FontWeight, PageLayout, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};

fn encoding_error(err: impl std::fmt::Display) -> RenderError {
    RenderError::Encoding(err.to_string())
}

/// Encodes every laid-out page into a PDF held in memory.
pub fn encode(document: &DocumentLayout, title: &str) -> Result<Vec<u8>, RenderError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Page 1");

    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(encoding_error)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(encoding_error)?;

    for (index, page) in document.pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_ref, layer_ref) = doc.add_page(
                Mm(PAGE_WIDTH_MM),
                Mm(PAGE_HEIGHT_MM),
                format!("Page {}", index + 1),
            );
            doc.get_page(page_ref).get_layer(layer_ref)
        };
        draw_page(&layer, page, &regular, &bold);
    }

    let mut writer = BufWriter::new(Vec::<u8>::new());
    doc.save(&mut writer).map_err(encoding_error)?;
    writer.into_inner().map_err(encoding_error)
}

fn draw_page(
    layer: &PdfLayerReference,
    page: &PageLayout,
    regular: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    for run in &page.texts {
        let font = match run.weight {
            FontWeight::Regular => regular,
            FontWeight::Bold => bold,
        };
        layer.use_text(run.text.as_str(), run.size_pt, Mm(run.x_mm), Mm(run.y_mm), font);
    }

    for rule in &page.rules {
        layer.add_line(Line {
            points: vec![
                (Point::new(Mm(rule.x1_mm), Mm(rule.y_mm)), false),
                (Point::new(Mm(rule.x2_mm), Mm(rule.y_mm)), false),
            ],
            is_closed: false,
        });
    }
}
