//! Export sanitizer: strips editor-only presentation state from markup.
//!
//! The editing surface decorates the document while the user works:
//! inline sizing from resize drags, `selected` classes, resize handles and
//! wrapper spans around a selected image. [`ExportSanitizer::clean`] removes
//! all of it from a detached copy and freezes the rendered image sizes into
//! plain `width`/`height` attributes so the exported HTML lays out the same
//! without the editor's styles.
//!
//! Rendered sizes come from a [`LayoutProbe`]. A browser host would answer
//! from live layout; [`StyleLayout`] derives them from the markup itself.

use std::collections::HashMap;

use crate::document::{Document, Element, NodeId};
use crate::markup::{
    CAPTION_TAG, FIGURE_TAG, IMAGE_TAG, RESIZER_CLASS, RESIZE_WRAPPER_CLASS, SELECTED_CLASS,
};
use crate::style::parse_px;

/// Default pixel height of one caption line.
pub const DEFAULT_CAPTION_LINE_HEIGHT: u32 = 20;

/// Rendered size of an element in pixels. Zero means "not rendered / unknown".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderedSize {
    pub width: u32,
    pub height: u32,
}

/// Answers layout questions the sanitizer cannot derive from structure.
pub trait LayoutProbe {
    /// Rendered size of an image.
    fn image_size(&self, img: &Element) -> RenderedSize;

    /// Rendered height of a caption element.
    fn caption_height(&self, doc: &Document, caption: NodeId) -> u32;
}

/// Layout derived from inline styles and size attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleLayout {
    pub caption_line_height: u32,
}

impl Default for StyleLayout {
    fn default() -> Self {
        Self {
            caption_line_height: DEFAULT_CAPTION_LINE_HEIGHT,
        }
    }
}

impl LayoutProbe for StyleLayout {
    fn image_size(&self, img: &Element) -> RenderedSize {
        let attr_w = img.attr("width").and_then(parse_px);
        let attr_h = img.attr("height").and_then(parse_px);
        let style_w = img.style_property("width").as_deref().and_then(parse_px);
        let style_h = img.style_property("height").as_deref().and_then(parse_px);

        let width = style_w.or(attr_w).unwrap_or(0);
        let height = match (style_h, style_w, attr_w, attr_h) {
            (Some(h), ..) => h,
            // Only the width was dragged: the browser keeps the aspect ratio.
            (None, Some(sw), Some(aw), Some(ah)) if aw > 0 => {
                (f64::from(sw) * f64::from(ah) / f64::from(aw)).round() as u32
            }
            (None, _, _, Some(ah)) => ah,
            _ => 0,
        };
        RenderedSize { width, height }
    }

    fn caption_height(&self, doc: &Document, caption: NodeId) -> u32 {
        let text = doc.text_content(caption);
        let lines = text.lines().filter(|l| !l.trim().is_empty()).count() as u32;
        lines.saturating_mul(self.caption_line_height)
    }
}

/// Produces portable HTML from an editable document.
#[derive(Debug, Clone)]
pub struct ExportSanitizer<L = StyleLayout> {
    layout: L,
}

impl Default for ExportSanitizer<StyleLayout> {
    fn default() -> Self {
        Self::new(StyleLayout::default())
    }
}

impl ExportSanitizer<StyleLayout> {
    /// Sanitizer using [`StyleLayout`] with the given caption line height.
    pub fn with_caption_line_height(caption_line_height: u32) -> Self {
        Self::new(StyleLayout {
            caption_line_height,
        })
    }
}

impl<L: LayoutProbe> ExportSanitizer<L> {
    pub fn new(layout: L) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &L {
        &self.layout
    }

    /// Parses `html` and returns its cleaned form.
    pub fn clean_html(&self, html: &str) -> String {
        self.clean(&Document::parse(html))
    }

    /// Returns the cleaned markup of `doc`. `doc` itself is not modified.
    ///
    /// Idempotent: cleaning already-clean markup returns it unchanged.
    pub fn clean(&self, doc: &Document) -> String {
        self.clean_document(doc).to_html()
    }

    /// Like [`clean`](Self::clean) but returns the cleaned tree.
    pub fn clean_document(&self, doc: &Document) -> Document {
        let mut copy = doc.clone();
        let root = copy.root();

        // Measure before any styling is removed.
        let image_sizes: HashMap<NodeId, RenderedSize> = copy
            .find_all(root, |e| e.is(IMAGE_TAG))
            .into_iter()
            .filter_map(|img| Some((img, self.layout.image_size(copy.element(img)?))))
            .collect();

        for handle in copy.find_all(root, |e| e.has_class(RESIZER_CLASS)) {
            copy.detach(handle);
        }

        for wrapper in copy.find_all(root, |e| e.has_class(RESIZE_WRAPPER_CLASS)) {
            if !copy.is_attached(wrapper) {
                continue;
            }
            match copy.find_first(wrapper, |e| e.is(IMAGE_TAG)) {
                Some(img) => {
                    copy.insert_before(img, wrapper);
                    copy.detach(wrapper);
                }
                None => copy.unwrap(wrapper),
            }
        }

        for node in copy.descendants(root) {
            if let Some(el) = copy.element_mut(node) {
                el.remove_class(SELECTED_CLASS);
                el.remove_attr("style");
            }
        }

        for img in copy.find_all(root, |e| e.is(IMAGE_TAG)) {
            let Some(&size) = image_sizes.get(&img) else {
                continue;
            };
            let Some(el) = copy.element_mut(img) else {
                continue;
            };
            if size.width > 0 {
                el.set_attr("width", size.width.to_string());
            }
            if size.height > 0 {
                el.set_attr("height", size.height.to_string());
            }
        }

        for figure in copy.find_all(root, |e| e.is(FIGURE_TAG)) {
            self.size_figure(&mut copy, figure, &image_sizes);
        }

        copy
    }

    /// Sizes a figure from its image plus its caption.
    fn size_figure(
        &self,
        doc: &mut Document,
        figure: NodeId,
        image_sizes: &HashMap<NodeId, RenderedSize>,
    ) {
        let Some(img) = doc.find_first(figure, |e| e.is(IMAGE_TAG)) else {
            return;
        };
        let measured = image_sizes.get(&img).copied().unwrap_or_default();
        let img_el = doc.element(img);
        let width = img_el
            .and_then(|e| e.attr("width"))
            .and_then(parse_px)
            .unwrap_or(measured.width);
        let img_height = img_el
            .and_then(|e| e.attr("height"))
            .and_then(parse_px)
            .unwrap_or(measured.height);
        let caption_height = doc
            .find_first(figure, |e| e.is(CAPTION_TAG))
            .map_or(0, |caption| self.layout.caption_height(doc, caption));

        if let Some(el) = doc.element_mut(figure) {
            el.set_attr("width", width.to_string());
            el.set_attr("height", img_height.saturating_add(caption_height).to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(html: &str) -> String {
        ExportSanitizer::new(StyleLayout::default()).clean_html(html)
    }

    #[test]
    fn test_style_stripped_and_width_frozen() {
        let out = clean("<p><img src=\"a.png\" style=\"width:200px\"></p>");
        assert_eq!(out, "<p><img src=\"a.png\" width=\"200\"></p>");
    }

    #[test]
    fn test_style_height_frozen_alone() {
        let out = clean("<img src=\"a.png\" style=\"height: 80px\">");
        assert_eq!(out, "<img src=\"a.png\" height=\"80\">");
    }

    #[test]
    fn test_unmeasurable_image_only_loses_style() {
        let out = clean("<img src=\"a.png\" style=\"width: 50%\" class=\"selected\">");
        assert_eq!(out, "<img src=\"a.png\">");
    }

    #[test]
    fn test_style_width_scales_height_by_aspect_ratio() {
        let out = clean(
            "<img src=\"a.png\" width=\"400\" height=\"300\" style=\"width: 200px; height: auto\">",
        );
        assert_eq!(out, "<img src=\"a.png\" width=\"200\" height=\"150\">");
    }

    #[test]
    fn test_style_height_wins() {
        let out = clean(
            "<img src=\"a.png\" width=\"400\" height=\"300\" style=\"width: 100px; height: 90px\">",
        );
        assert_eq!(out, "<img src=\"a.png\" width=\"100\" height=\"90\">");
    }

    #[test]
    fn test_resize_wrapper_unwrapped_in_place() {
        let out = clean(
            "<p>before<span class=\"resizer-wrapper float-left\">\
             <img src=\"a.png\" class=\"selected float-left\" width=\"10\" height=\"20\">\
             <div class=\"resizer nw\"></div><div class=\"resizer se\"></div>\
             </span>after</p>",
        );
        assert_eq!(
            out,
            "<p>before<img src=\"a.png\" class=\"float-left\" width=\"10\" height=\"20\">after</p>"
        );
    }

    #[test]
    fn test_wrapper_without_image_keeps_children() {
        let out = clean("<span class=\"resizer-wrapper\">text<div class=\"resizer\"></div></span>");
        assert_eq!(out, "text");
    }

    #[test]
    fn test_selected_figure_cleaned_and_sized() {
        let out = clean(
            "<figure class=\"selected\" style=\"outline: 2px solid blue; width: 300px\">\
             <img src=\"a.png\" class=\"selected\" width=\"300\" height=\"200\">\
             <figcaption>A caption</figcaption>\
             <div class=\"resizer ne\"></div></figure>",
        );
        assert_eq!(
            out,
            "<figure width=\"300\" height=\"220\">\
             <img src=\"a.png\" width=\"300\" height=\"200\">\
             <figcaption>A caption</figcaption></figure>"
        );
    }

    #[test]
    fn test_figure_without_caption() {
        let out = clean("<figure><img src=\"a.png\" width=\"50\" height=\"40\"></figure>");
        assert_eq!(
            out,
            "<figure width=\"50\" height=\"40\"><img src=\"a.png\" width=\"50\" height=\"40\"></figure>"
        );
    }

    #[test]
    fn test_huge_figure_height_saturates() {
        let out = clean(
            "<figure><img src=\"a.png\" width=\"10\" height=\"4294967295\">\
             <figcaption>c</figcaption></figure>",
        );
        assert!(out.starts_with("<figure width=\"10\" height=\"4294967295\">"));

        let tall_lines = ExportSanitizer::with_caption_line_height(u32::MAX).clean_html(
            "<figure><img src=\"a.png\" width=\"1\" height=\"1\">\
             <figcaption>one\ntwo</figcaption></figure>",
        );
        assert!(tall_lines.starts_with("<figure width=\"1\" height=\"4294967295\">"));
    }

    #[test]
    fn test_figure_without_image_untouched_except_style() {
        let out = clean("<figure style=\"margin: 15px auto\"><figcaption>x</figcaption></figure>");
        assert_eq!(out, "<figure><figcaption>x</figcaption></figure>");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "<p><img src=\"a.png\" style=\"width:200px;height:100px\"></p>",
            "<figure class=\"float-right selected\" style=\"width:120px\">\
             <img src=\"b.png\" width=\"240\" height=\"120\" style=\"width:120px\">\
             <figcaption>two\nlines</figcaption></figure>",
            "<span class=\"resizer-wrapper\"><img src=\"c.png\" style=\"width:10px;height:10px\">\
             <div class=\"resizer sw\"></div></span>",
            "<p>plain <b>text</b></p>",
        ];
        let sanitizer = ExportSanitizer::new(StyleLayout::default());
        for input in inputs {
            let once = sanitizer.clean_html(input);
            let twice = sanitizer.clean_html(&once);
            assert_eq!(once, twice, "not idempotent for {input}");
        }
    }

    #[test]
    fn test_clean_does_not_mutate_input() {
        let doc = Document::parse("<img src=\"a.png\" class=\"selected\" style=\"width:5px\">");
        let before = doc.to_html();
        let _ = ExportSanitizer::new(StyleLayout::default()).clean(&doc);
        assert_eq!(doc.to_html(), before);
    }

    #[test]
    fn test_caption_line_height_is_configurable() {
        let sanitizer = ExportSanitizer::with_caption_line_height(0);
        let out = sanitizer.clean_html(
            "<figure><img src=\"a.png\" width=\"5\" height=\"5\"><figcaption>c</figcaption></figure>",
        );
        assert!(out.starts_with("<figure width=\"5\" height=\"5\">"));
    }

    struct FixedLayout;

    impl LayoutProbe for FixedLayout {
        fn image_size(&self, _img: &Element) -> RenderedSize {
            RenderedSize {
                width: 640,
                height: 480,
            }
        }

        fn caption_height(&self, _doc: &Document, _caption: NodeId) -> u32 {
            32
        }
    }

    #[test]
    fn test_custom_layout_probe() {
        let out = ExportSanitizer::new(FixedLayout)
            .clean_html("<figure><img src=\"a.png\"><figcaption>c</figcaption></figure>");
        assert_eq!(
            out,
            "<figure width=\"640\" height=\"512\"><img src=\"a.png\" width=\"640\" height=\"480\">\
             <figcaption>c</figcaption></figure>"
        );
    }
}
