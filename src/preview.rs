//! Overview documents showing every rendered tape in place.

use base64::Engine;

use crate::RenderedTape;
use crate::document::{Document, Element, NodeId};
use crate::types::ViewBox;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PreviewStyle {
    /// Only the tape images.
    #[default]
    Preview,
    /// Tape images plus an outline and a number for each tape.
    Assembly,
}

/// Build an Inkscape-friendly overview on the source page.
///
/// Each tape image is stretched over its segment's footprint, so the result
/// shows what the printed tapes will look like once stuck down.
pub fn compose_preview(view_box: ViewBox, tapes: &[RenderedTape], style: PreviewStyle) -> Document {
    let page = page_box(view_box);
    let mut doc = Document::new(
        Element::new("svg")
            .with_attribute("width", format!("{}mm", page.width))
            .with_attribute("height", format!("{}mm", page.height))
            .with_attribute("viewBox", page.to_string())
            .with_attribute("style", "background-color:white")
            .with_attribute("xmlns", "http://www.w3.org/2000/svg")
            .with_attribute("xmlns:xlink", "http://www.w3.org/1999/xlink")
            .with_attribute(
                "xmlns:sodipodi",
                "http://sodipodi.sourceforge.net/DTD/sodipodi-0.dtd",
            )
            .with_attribute("xmlns:inkscape", "http://www.inkscape.org/namespaces/inkscape"),
    );
    let root = doc.root();
    doc.append_element(
        root,
        Element::new("sodipodi:namedview")
            .with_attribute("id", "namedview1")
            .with_attribute("pagecolor", "white")
            .with_attribute("inkscape:document-units", "mm"),
    );
    let layer = doc.append_element(
        root,
        Element::new("g")
            .with_attribute("inkscape:label", "Preview")
            .with_attribute("inkscape:groupmode", "layer")
            .with_attribute("id", "layer_preview"),
    );

    let images = doc.append_element(layer, Element::new("g").with_attribute("id", "preview_images"));
    for tape in tapes {
        append_image(&mut doc, images, tape);
    }

    if style == PreviewStyle::Assembly {
        let labels = doc.append_element(
            layer,
            Element::new("g").with_attribute("id", "assembly_instructions"),
        );
        for tape in tapes {
            append_label(&mut doc, labels, tape);
        }
    }

    doc
}

fn page_box(view_box: ViewBox) -> ViewBox {
    let nonzero = |v: f64| if v.abs() < 1e-9 { 1.0 } else { v };
    ViewBox::new(
        view_box.min_x,
        view_box.min_y,
        nonzero(view_box.width),
        nonzero(view_box.height),
    )
}

fn append_image(doc: &mut Document, parent: NodeId, tape: &RenderedTape) {
    let placement = &tape.placement;
    let data = base64::engine::general_purpose::STANDARD.encode(&tape.image.png);
    doc.append_element(
        parent,
        Element::new("image")
            .with_attribute("width", placement.length.to_string())
            .with_attribute("height", placement.width.to_string())
            .with_attribute("preserveAspectRatio", "none")
            .with_attribute("id", format!("preview_image_{}", tape.index))
            .with_attribute("x", "0")
            .with_attribute("y", "0")
            .with_attribute("transform", placement.transform().to_string())
            .with_attribute("xlink:href", format!("data:image/png;base64,{data}")),
    );
}

fn append_label(doc: &mut Document, parent: NodeId, tape: &RenderedTape) {
    let placement = &tape.placement;
    let (length, width) = (placement.length, placement.width);
    let transform = placement.transform().to_string();

    doc.append_element(
        parent,
        Element::new("path")
            .with_attribute("fill", "none")
            .with_attribute("stroke-width", "0.2px")
            .with_attribute("stroke", "red")
            .with_attribute("transform", transform.as_str())
            .with_attribute("d", format!("M 0 0 h {length} v {width} h {} Z", -length)),
    );
    let text = doc.append_element(
        parent,
        Element::new("text")
            .with_attribute("fill", "red")
            .with_attribute("stroke", "none")
            .with_attribute("font-size", format!("{}px", width * 0.8))
            .with_attribute("transform", transform)
            .with_attribute("x", "2px")
            .with_attribute("y", format!("{}px", width * 0.9)),
    );
    doc.append_text(text, tape.index.to_string());
}
