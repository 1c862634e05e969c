//! Editing session controller.
//!
//! An [`EditorSession`] owns everything one open editor needs: the host
//! surface, the snapshot history, the currently selected image and the
//! export sanitizer. UI callbacks are turned into [`EditorEvent`]s and fed
//! to [`EditorSession::dispatch`], which applies the edit, records exactly
//! one snapshot for content-changing events and keeps the hidden export
//! field current.

use rich_pad_mod_history::{HistoryConfig, HistoryManager};

use crate::commands::{
    self, ImageOptions, LinkRequest, DEFAULT_CODE_PLACEHOLDER, DEFAULT_IMAGE_ALT,
    DEFAULT_MAX_IMAGE_WIDTH,
};
use crate::document::{Document, NodeId};
use crate::error::EditorError;
use crate::host::{EditingHost, FormatKind, TreeHost};
use crate::markup::IMAGE_TAG;
use crate::sanitize::{ExportSanitizer, LayoutProbe, StyleLayout};
use crate::text::WordCount;

/// Something that happened on the editing surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// The document finished loading; records the initial state.
    Loaded,
    /// The surface content changed to the given markup (typing, paste).
    ContentChanged(String),
    /// The surface lost focus.
    Blurred,
    /// The host selection moved.
    SelectionChanged(Option<NodeId>),
    FormatApplied(FormatKind),
    /// Insert a code block around the selected text.
    CodeBlockRequested,
    LinkRequested(LinkRequest),
    /// An image finished loading and decoding.
    ImageInserted {
        src: String,
        width: u32,
        height: u32,
    },
    /// An image could not be read or decoded.
    ImageLoadFailed(String),
    ImageClicked(NodeId),
    /// A click landed outside any image.
    BackgroundClicked,
    /// Delete/Backspace while an image is selected.
    DeleteRequested,
    /// A resize drag was released with this final size.
    ImageResized { width: u32, height: u32 },
    ImageOptionsApplied(ImageOptions),
    UndoRequested,
    RedoRequested,
    /// The surrounding form is being submitted.
    Submitted,
}

impl EditorEvent {
    /// Maps a key press to its history event: Ctrl/Cmd+Z undoes, Ctrl/Cmd+Y redoes.
    pub fn from_shortcut(key: &str, ctrl_or_meta: bool) -> Option<Self> {
        if !ctrl_or_meta {
            return None;
        }
        match key {
            "z" | "Z" => Some(EditorEvent::UndoRequested),
            "y" | "Y" => Some(EditorEvent::RedoRequested),
            _ => None,
        }
    }
}

/// Enabled state of the undo/redo controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Affordances {
    pub can_undo: bool,
    pub can_redo: bool,
}

/// Receives the sanitized export markup (a hidden form field in a browser).
pub trait HiddenField {
    fn write(&mut self, html: &str);
}

/// Hidden field kept in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryField {
    value: String,
    writes: usize,
}

impl MemoryField {
    pub fn value(&self) -> &str {
        &self.value
    }

    /// How many times the field has been written.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl HiddenField for MemoryField {
    fn write(&mut self, html: &str) {
        self.value.clear();
        self.value.push_str(html);
        self.writes += 1;
    }
}

/// Tunables for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub history: HistoryConfig,
    pub max_image_width: u32,
    pub code_placeholder: String,
    pub inserted_image_alt: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            history: HistoryConfig::default(),
            max_image_width: DEFAULT_MAX_IMAGE_WIDTH,
            code_placeholder: DEFAULT_CODE_PLACEHOLDER.to_string(),
            inserted_image_alt: DEFAULT_IMAGE_ALT.to_string(),
        }
    }
}

/// One open editor: host surface, history, selection and export.
pub struct EditorSession<H = TreeHost, F = MemoryField, L = StyleLayout> {
    host: H,
    field: F,
    sanitizer: ExportSanitizer<L>,
    history: HistoryManager,
    active_image: Option<NodeId>,
    options: SessionOptions,
}

impl<H, F, L> std::fmt::Debug for EditorSession<H, F, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("history", &self.history)
            .field("active_image", &self.active_image)
            .finish()
    }
}

impl<H: EditingHost, F: HiddenField> EditorSession<H, F, StyleLayout> {
    /// Creates a session using the markup-derived layout.
    pub fn new(host: H, field: F, options: SessionOptions) -> Self {
        Self::with_sanitizer(host, field, options, ExportSanitizer::default())
    }
}

impl EditorSession {
    /// In-memory session over `html` with default options.
    pub fn in_memory(html: &str) -> Self {
        Self::new(
            TreeHost::new(html),
            MemoryField::default(),
            SessionOptions::default(),
        )
    }
}

impl<H: EditingHost, F: HiddenField, L: LayoutProbe> EditorSession<H, F, L> {
    pub fn with_sanitizer(
        host: H,
        field: F,
        options: SessionOptions,
        sanitizer: ExportSanitizer<L>,
    ) -> Self {
        Self {
            host,
            field,
            sanitizer,
            history: HistoryManager::new(options.history),
            active_image: None,
            options,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn document(&self) -> &Document {
        self.host.document()
    }

    pub fn field(&self) -> &F {
        &self.field
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn active_image(&self) -> Option<NodeId> {
        self.active_image
    }

    pub fn affordances(&self) -> Affordances {
        Affordances {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        }
    }

    /// Word and character counts of the live document.
    pub fn word_count(&self) -> WordCount {
        let doc = self.host.document();
        WordCount::of(&doc.text_content(doc.root()))
    }

    /// Sanitized markup of the live document.
    pub fn preview(&self) -> String {
        self.sanitizer.clean(self.host.document())
    }

    /// Handles one event and returns the resulting control state.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::MissingLinkTarget`] for a link without a URL
    /// and [`EditorError::NotAnImage`] when a click targets a non-image
    /// node. Nothing is committed in either case.
    pub fn dispatch(&mut self, event: EditorEvent) -> Result<Affordances, EditorError> {
        tracing::trace!(?event, "Dispatching editor event");
        match event {
            EditorEvent::Loaded | EditorEvent::Blurred => self.commit(),
            EditorEvent::ContentChanged(html) => {
                self.active_image = None;
                self.host.replace_content(&html);
                self.commit();
            }
            EditorEvent::SelectionChanged(node) => self.host.set_selection(node),
            EditorEvent::FormatApplied(kind) => {
                if self.host.apply_format(kind) {
                    self.commit();
                }
            }
            EditorEvent::CodeBlockRequested => {
                let selection = self.host.selection_text();
                let fragment =
                    commands::code_block_fragment(&selection, &self.options.code_placeholder);
                self.host.insert_fragment(&fragment);
                self.commit();
            }
            EditorEvent::LinkRequested(mut request) => {
                if request.text.trim().is_empty() {
                    request.text = self.host.selection_text();
                }
                let fragment = request.fragment()?;
                self.host.insert_fragment(&fragment);
                self.commit();
            }
            EditorEvent::ImageInserted { src, width, height } => {
                self.insert_image(&src, width, height)?;
            }
            EditorEvent::ImageLoadFailed(reason) => {
                tracing::warn!("Image could not be inserted: {reason}");
            }
            EditorEvent::ImageClicked(img) => self.select(img)?,
            EditorEvent::BackgroundClicked => self.deselect(),
            EditorEvent::DeleteRequested => {
                if let Some(img) = self.active_image.take() {
                    commands::delete_image(self.host.document_mut(), img)?;
                    self.commit();
                }
            }
            EditorEvent::ImageResized { width, height } => {
                if let Some(img) = self.active_image {
                    commands::finish_resize(self.host.document_mut(), img, width, height)?;
                    self.commit();
                }
            }
            EditorEvent::ImageOptionsApplied(options) => {
                if let Some(img) = self.active_image {
                    self.deselect();
                    commands::apply_image_options(self.host.document_mut(), img, &options)?;
                    self.select(img)?;
                    self.commit();
                }
            }
            EditorEvent::UndoRequested => {
                if let Some(snapshot) = self.history.undo() {
                    self.restore(snapshot.as_str());
                }
            }
            EditorEvent::RedoRequested => {
                if let Some(snapshot) = self.history.redo() {
                    self.restore(snapshot.as_str());
                }
            }
            EditorEvent::Submitted => {
                self.deselect();
                self.refresh_field();
            }
        }
        Ok(self.affordances())
    }

    /// Records the live content. Duplicate states are skipped.
    fn commit(&mut self) {
        if self.history.commit(self.host.content()) {
            self.refresh_field();
        }
    }

    fn refresh_field(&mut self) {
        let html = self.sanitizer.clean(self.host.document());
        self.field.write(&html);
    }

    fn restore(&mut self, html: &str) {
        self.active_image = None;
        self.host.replace_content(html);
        self.refresh_field();
    }

    fn select(&mut self, img: NodeId) -> Result<(), EditorError> {
        if self.active_image == Some(img) {
            return commands::select_image(self.host.document_mut(), img);
        }
        commands::ensure_image(self.document(), img)?;
        self.deselect();
        commands::select_image(self.host.document_mut(), img)?;
        self.active_image = Some(img);
        Ok(())
    }

    fn deselect(&mut self) {
        if let Some(img) = self.active_image.take() {
            commands::deselect_image(self.host.document_mut(), img);
        }
    }

    /// Inserts a loaded image at the selection, selects it and commits.
    fn insert_image(&mut self, src: &str, width: u32, height: u32) -> Result<(), EditorError> {
        let (width, height) = commands::fit_image(width, height, self.options.max_image_width);
        let fragment =
            commands::image_fragment(src, width, height, &self.options.inserted_image_alt);
        self.deselect();
        let inserted = self.host.insert_fragment(&fragment);
        let img = inserted
            .into_iter()
            .find(|&n| self.host.document().is_element(n, IMAGE_TAG));
        if let Some(img) = img {
            self.select(img)?;
        }
        tracing::debug!(width, height, "Inserted image");
        self.commit();
        Ok(())
    }
}
