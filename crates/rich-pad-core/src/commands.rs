/// Editing commands that build fragments or rework image markup.
///
/// Fragment builders return markup for the host to insert. The image
/// functions operate directly on a [`Document`]: selection decoration
/// (wrapper span, `selected` class, corner handles), resize finalization,
/// caption/alignment options and deletion.
use serde::{Deserialize, Serialize};

use crate::document::{Document, Element, NodeId};
use crate::error::EditorError;
use crate::markup::{
    CAPTION_TAG, FIGURE_TAG, FLOAT_LEFT_CLASS, FLOAT_RIGHT_CLASS, IMAGE_TAG, RESIZER_CLASS,
    RESIZER_CORNERS, RESIZE_WRAPPER_CLASS, SELECTED_CLASS,
};
use crate::sanitize::{LayoutProbe, StyleLayout};
use crate::text::escape_html;

/// Placeholder used when a code block is inserted without selected text.
pub const DEFAULT_CODE_PLACEHOLDER: &str = "Your code here";
/// Alt text given to freshly inserted images.
pub const DEFAULT_IMAGE_ALT: &str = "Inserted image";
/// Inserted images wider than this are scaled down.
pub const DEFAULT_MAX_IMAGE_WIDTH: u32 = 1200;

/// Margin applied to unaligned images and figures so they center.
const CENTERED_MARGIN: &str = "15px auto";
/// Outline drawn around a selected figure.
const SELECTED_OUTLINE: &str = "2px solid var(--primary-color)";

// ── Fragments ──────────────────────────────────────────────────────────

/// `<pre><code>` block holding `selection`, or `placeholder` if it is empty.
pub fn code_block_fragment(selection: &str, placeholder: &str) -> String {
    let content = if selection.is_empty() {
        placeholder
    } else {
        selection
    };
    format!("<pre><code>{}</code></pre>", escape_html(content))
}

/// A link the user asked to insert.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkRequest {
    pub text: String,
    pub url: String,
}

impl LinkRequest {
    pub fn new(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: url.into(),
        }
    }

    /// Builds the anchor markup. Empty text falls back to the URL.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::MissingLinkTarget`] when the URL is blank.
    pub fn fragment(&self) -> Result<String, EditorError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(EditorError::MissingLinkTarget);
        }
        let text = match self.text.trim() {
            "" => url,
            t => t,
        };
        Ok(format!(
            "<a href=\"{}\" target=\"_blank\">{}</a>",
            escape_html(url),
            escape_html(text)
        ))
    }
}

/// Scales `(width, height)` down to `max_width`, keeping the aspect ratio.
/// Never scales up.
pub fn fit_image(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width || width == 0 {
        return (width, height);
    }
    let scaled = (f64::from(height) * f64::from(max_width) / f64::from(width)).round() as u32;
    (max_width, scaled)
}

/// `<img>` markup for an inserted image.
pub fn image_fragment(src: &str, width: u32, height: u32, alt: &str) -> String {
    format!(
        "<img src=\"{}\" alt=\"{}\" width=\"{width}\" height=\"{height}\">",
        escape_html(src),
        escape_html(alt)
    )
}

// ── Image selection ────────────────────────────────────────────────────

/// Checks that `img` is a live image of `doc`.
pub(crate) fn ensure_image(doc: &Document, img: NodeId) -> Result<(), EditorError> {
    if !doc.contains(img) {
        return Err(EditorError::Detached);
    }
    if !doc.is_element(img, IMAGE_TAG) {
        return Err(EditorError::NotAnImage);
    }
    if !doc.is_attached(img) {
        return Err(EditorError::Detached);
    }
    Ok(())
}

fn enclosing_figure(doc: &Document, img: NodeId) -> Option<NodeId> {
    doc.closest(img, |e| e.is(FIGURE_TAG))
}

fn enclosing_wrapper(doc: &Document, img: NodeId) -> Option<NodeId> {
    doc.parent(img)
        .filter(|&p| doc.element(p).is_some_and(|e| e.has_class(RESIZE_WRAPPER_CLASS)))
}

fn remove_handles(doc: &mut Document, host: NodeId) {
    for handle in doc.find_all(host, |e| e.has_class(RESIZER_CLASS)) {
        doc.detach(handle);
    }
}

fn float_class(el: &Element) -> Option<&'static str> {
    if el.has_class(FLOAT_LEFT_CLASS) {
        Some(FLOAT_LEFT_CLASS)
    } else if el.has_class(FLOAT_RIGHT_CLASS) {
        Some(FLOAT_RIGHT_CLASS)
    } else {
        None
    }
}

/// Decorates `img` as selected.
///
/// A bare image is wrapped in a `span.resizer-wrapper` that mirrors the
/// image's float class; an image inside a figure marks the figure instead.
/// Four corner handles are appended to whichever element hosts them.
pub fn select_image(doc: &mut Document, img: NodeId) -> Result<(), EditorError> {
    ensure_image(doc, img)?;
    if let Some(el) = doc.element_mut(img) {
        el.add_class(SELECTED_CLASS);
    }

    let host = match enclosing_figure(doc, img) {
        Some(figure) => {
            if let Some(el) = doc.element_mut(figure) {
                el.add_class(SELECTED_CLASS);
                el.set_style_property("outline", SELECTED_OUTLINE);
            }
            figure
        }
        None => {
            let wrapper = match enclosing_wrapper(doc, img) {
                Some(w) => w,
                None => {
                    let mut span = Element::new("span");
                    span.add_class(RESIZE_WRAPPER_CLASS);
                    let span = doc.create_element(span);
                    doc.wrap(img, span);
                    span
                }
            };
            let float = doc.element(img).and_then(float_class);
            if let Some(el) = doc.element_mut(wrapper) {
                el.remove_class(FLOAT_LEFT_CLASS);
                el.remove_class(FLOAT_RIGHT_CLASS);
                if let Some(class) = float {
                    el.add_class(class);
                }
            }
            wrapper
        }
    };

    remove_handles(doc, host);
    for corner in RESIZER_CORNERS {
        let mut handle = Element::new("div");
        handle.set_attr("class", format!("{RESIZER_CLASS} {corner}"));
        let handle = doc.create_element(handle);
        doc.append_child(host, handle);
    }
    tracing::debug!(?img, "Selected image");
    Ok(())
}

/// Removes every trace of [`select_image`] from around `img`.
pub fn deselect_image(doc: &mut Document, img: NodeId) {
    if let Some(el) = doc.element_mut(img) {
        el.remove_class(SELECTED_CLASS);
    }

    if let Some(figure) = enclosing_figure(doc, img) {
        remove_handles(doc, figure);
        if let Some(el) = doc.element_mut(figure) {
            el.remove_class(SELECTED_CLASS);
            el.remove_style_property("outline");
        }
    } else if let Some(wrapper) = enclosing_wrapper(doc, img) {
        remove_handles(doc, wrapper);
        doc.insert_before(img, wrapper);
        doc.detach(wrapper);
    }
    tracing::debug!(?img, "Deselected image");
}

/// Freezes the final size of a resize drag into `width`/`height` attributes
/// and clears the transient inline sizing on the image and its container.
pub fn finish_resize(
    doc: &mut Document,
    img: NodeId,
    width: u32,
    height: u32,
) -> Result<(), EditorError> {
    ensure_image(doc, img)?;
    let container = enclosing_figure(doc, img).or_else(|| enclosing_wrapper(doc, img));
    if let Some(el) = doc.element_mut(img) {
        el.set_attr("width", width.to_string());
        el.set_attr("height", height.to_string());
        el.remove_style_property("width");
        el.remove_style_property("height");
    }
    if let Some(el) = container.and_then(|c| doc.element_mut(c)) {
        el.remove_style_property("width");
        el.remove_style_property("height");
    }
    Ok(())
}

/// Removes the image, together with its figure or selection wrapper.
pub fn delete_image(doc: &mut Document, img: NodeId) -> Result<(), EditorError> {
    ensure_image(doc, img)?;
    let target = enclosing_figure(doc, img)
        .or_else(|| enclosing_wrapper(doc, img))
        .unwrap_or(img);
    doc.detach(target);
    Ok(())
}

// ── Image options ──────────────────────────────────────────────────────

/// Horizontal placement of an image or figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    None,
    Left,
    Right,
}

impl Alignment {
    fn class(self) -> Option<&'static str> {
        match self {
            Alignment::None => None,
            Alignment::Left => Some(FLOAT_LEFT_CLASS),
            Alignment::Right => Some(FLOAT_RIGHT_CLASS),
        }
    }

    /// Reads the alignment an image currently has.
    pub fn of(doc: &Document, img: NodeId) -> Self {
        let target = enclosing_figure(doc, img).unwrap_or(img);
        match doc.element(target).and_then(float_class) {
            Some(FLOAT_LEFT_CLASS) => Alignment::Left,
            Some(FLOAT_RIGHT_CLASS) => Alignment::Right,
            _ => Alignment::None,
        }
    }
}

/// Alt text, caption and alignment for one image.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageOptions {
    pub alt: String,
    pub caption: String,
    pub alignment: Alignment,
}

impl ImageOptions {
    /// Reads the options currently applied to `img`.
    pub fn read(doc: &Document, img: NodeId) -> Self {
        let alt = doc
            .element(img)
            .and_then(|e| e.attr("alt"))
            .unwrap_or("")
            .to_string();
        let caption = enclosing_figure(doc, img)
            .and_then(|f| doc.find_first(f, |e| e.is(CAPTION_TAG)))
            .map(|c| doc.text_content(c))
            .unwrap_or_default();
        Self {
            alt,
            caption,
            alignment: Alignment::of(doc, img),
        }
    }
}

/// Applies alt text, caption and alignment to an unselected image.
///
/// A non-empty caption puts the image in a `figure` with a `figcaption`;
/// an empty caption removes the caption and dissolves a figure that holds
/// nothing else. Alignment lands on the figure when there is one.
pub fn apply_image_options(
    doc: &mut Document,
    img: NodeId,
    options: &ImageOptions,
) -> Result<(), EditorError> {
    ensure_image(doc, img)?;
    let caption = options.caption.trim();

    if let Some(el) = doc.element_mut(img) {
        el.set_attr("alt", options.alt.trim());
    }

    let mut figure = enclosing_figure(doc, img);
    if !caption.is_empty() {
        let fig = match figure {
            Some(f) => f,
            None => {
                // The figure starts at the image's rendered size.
                let size = doc
                    .element(img)
                    .map(|e| StyleLayout::default().image_size(e))
                    .unwrap_or_default();
                let mut el = Element::new(FIGURE_TAG);
                if size.width > 0 {
                    el.set_attr("width", size.width.to_string());
                }
                if size.height > 0 {
                    el.set_attr("height", size.height.to_string());
                }
                let f = doc.create_element(el);
                doc.wrap(img, f);
                f
            }
        };
        let figcaption = match doc.find_first(fig, |e| e.is(CAPTION_TAG)) {
            Some(c) => c,
            None => {
                let c = doc.create_element(Element::new(CAPTION_TAG));
                doc.append_child(fig, c);
                c
            }
        };
        doc.set_text_content(figcaption, caption);
        figure = Some(fig);
    } else if let Some(fig) = figure {
        if let Some(c) = doc.find_first(fig, |e| e.is(CAPTION_TAG)) {
            doc.detach(c);
            let has_other = doc.child_elements(fig).any(|child| child != img);
            if !has_other {
                doc.insert_before(img, fig);
                doc.detach(fig);
                figure = None;
            }
        }
    }

    if let Some(el) = doc.element_mut(img) {
        el.remove_class(FLOAT_LEFT_CLASS);
        el.remove_class(FLOAT_RIGHT_CLASS);
    }
    let target = figure.unwrap_or(img);
    if let Some(el) = doc.element_mut(target) {
        el.remove_class(FLOAT_LEFT_CLASS);
        el.remove_class(FLOAT_RIGHT_CLASS);
        el.set_style_property("float", "none");
        if let Some(class) = options.alignment.class() {
            el.add_class(class);
        }
        match options.alignment {
            Alignment::None => el.set_style_property("margin", CENTERED_MARGIN),
            _ => el.remove_style_property("margin"),
        }
    }
    Ok(())
}
