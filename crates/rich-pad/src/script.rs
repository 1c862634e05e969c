/// Scripted editing sessions.
///
/// A script is a JSON array of steps, each tagged with `"event"`. Steps that
/// point at content (`select_text`, `click_image`) are resolved against the
/// live document right before they run, so earlier edits are visible to
/// later steps.
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use rich_pad_core::{
    Alignment, Document, EditingHost, EditorEvent, EditorSession, FormatKind, HiddenField,
    ImageOptions, LayoutProbe, LinkRequest, NodeId,
};

/// One user action in a script.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScriptStep {
    Load,
    /// Replaces the surface content, as typing or pasting would.
    Type {
        html: String,
    },
    Blur,
    /// Selects the first text node containing `text`.
    SelectText {
        text: String,
    },
    ClearSelection,
    Format {
        format: FormatKind,
    },
    CodeBlock,
    Link {
        #[serde(default)]
        text: String,
        #[serde(default)]
        url: String,
    },
    InsertImage {
        src: String,
        width: u32,
        height: u32,
    },
    ImageLoadFailed {
        reason: String,
    },
    /// Clicks the `nth` image of the document (zero-based).
    ClickImage {
        #[serde(default)]
        nth: usize,
    },
    ClickBackground,
    Delete,
    Resize {
        width: u32,
        height: u32,
    },
    ImageOptions {
        #[serde(default)]
        alt: String,
        #[serde(default)]
        caption: String,
        #[serde(default)]
        alignment: Alignment,
    },
    /// A key press; only the history shortcuts do anything.
    Shortcut {
        key: String,
        #[serde(default)]
        ctrl: bool,
    },
    Undo,
    Redo,
    Submit,
}

impl ScriptStep {
    /// Turns the step into an editor event against the current document.
    ///
    /// Returns `Ok(None)` for key presses that are not bound.
    pub fn resolve(&self, doc: &Document) -> Result<Option<EditorEvent>> {
        let event = match self {
            ScriptStep::Load => EditorEvent::Loaded,
            ScriptStep::Type { html } => EditorEvent::ContentChanged(html.clone()),
            ScriptStep::Blur => EditorEvent::Blurred,
            ScriptStep::SelectText { text } => {
                let Some(node) = find_text(doc, text) else {
                    bail!("No text node contains {text:?}");
                };
                EditorEvent::SelectionChanged(Some(node))
            }
            ScriptStep::ClearSelection => EditorEvent::SelectionChanged(None),
            ScriptStep::Format { format } => EditorEvent::FormatApplied(*format),
            ScriptStep::CodeBlock => EditorEvent::CodeBlockRequested,
            ScriptStep::Link { text, url } => {
                EditorEvent::LinkRequested(LinkRequest::new(text.as_str(), url.as_str()))
            }
            ScriptStep::InsertImage { src, width, height } => EditorEvent::ImageInserted {
                src: src.clone(),
                width: *width,
                height: *height,
            },
            ScriptStep::ImageLoadFailed { reason } => EditorEvent::ImageLoadFailed(reason.clone()),
            ScriptStep::ClickImage { nth } => {
                let images = doc.find_all(doc.root(), |e| e.is("img"));
                let Some(&img) = images.get(*nth) else {
                    bail!("Image #{nth} not found ({} in document)", images.len());
                };
                EditorEvent::ImageClicked(img)
            }
            ScriptStep::ClickBackground => EditorEvent::BackgroundClicked,
            ScriptStep::Delete => EditorEvent::DeleteRequested,
            ScriptStep::Resize { width, height } => EditorEvent::ImageResized {
                width: *width,
                height: *height,
            },
            ScriptStep::ImageOptions {
                alt,
                caption,
                alignment,
            } => EditorEvent::ImageOptionsApplied(ImageOptions {
                alt: alt.clone(),
                caption: caption.clone(),
                alignment: *alignment,
            }),
            ScriptStep::Shortcut { key, ctrl } => {
                return Ok(EditorEvent::from_shortcut(key, *ctrl));
            }
            ScriptStep::Undo => EditorEvent::UndoRequested,
            ScriptStep::Redo => EditorEvent::RedoRequested,
            ScriptStep::Submit => EditorEvent::Submitted,
        };
        Ok(Some(event))
    }
}

fn find_text(doc: &Document, needle: &str) -> Option<NodeId> {
    doc.descendants(doc.root())
        .into_iter()
        .find(|&n| doc.text(n).is_some_and(|t| t.contains(needle)))
}

/// Parses a script from JSON.
pub fn parse_script(json: &str) -> Result<Vec<ScriptStep>> {
    serde_json::from_str(json).context("Failed to parse editing script")
}

/// Reads and parses the script at `path`.
pub fn load_script(path: &Path) -> Result<Vec<ScriptStep>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script: {}", path.display()))?;
    parse_script(&json)
}

/// Runs every step against `session`.
///
/// Editor errors (a link without URL, a click on a non-image) are what the
/// user would see as an alert: they are logged and the replay goes on.
/// A step that cannot be resolved aborts the replay.
pub fn replay<H, F, L>(session: &mut EditorSession<H, F, L>, steps: &[ScriptStep]) -> Result<()>
where
    H: EditingHost,
    F: HiddenField,
    L: LayoutProbe,
{
    for (index, step) in steps.iter().enumerate() {
        let Some(event) = step
            .resolve(session.document())
            .with_context(|| format!("Script step {} ({step:?})", index + 1))?
        else {
            tracing::debug!(step = index + 1, "Unbound key press ignored");
            continue;
        };
        match session.dispatch(event) {
            Ok(state) => tracing::debug!(
                step = index + 1,
                can_undo = state.can_undo,
                can_redo = state.can_redo,
                "Step applied"
            ),
            Err(e) => tracing::warn!("Step {}: {e}", index + 1),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tagged_steps() {
        let steps = parse_script(
            r#"[
                {"event": "load"},
                {"event": "type", "html": "<p>hi</p>"},
                {"event": "format", "format": {"heading": 2}},
                {"event": "format", "format": "bold"},
                {"event": "click_image"},
                {"event": "image_options", "caption": "c", "alignment": "left"},
                {"event": "shortcut", "key": "z", "ctrl": true}
            ]"#,
        )
        .unwrap();
        assert_eq!(steps.len(), 7);
        assert_eq!(
            steps[2],
            ScriptStep::Format {
                format: FormatKind::Heading(2)
            }
        );
        assert_eq!(steps[4], ScriptStep::ClickImage { nth: 0 });
        assert_eq!(
            steps[5],
            ScriptStep::ImageOptions {
                alt: String::new(),
                caption: "c".to_string(),
                alignment: Alignment::Left,
            }
        );
    }

    #[test]
    fn test_parse_rejects_unknown_event() {
        assert!(parse_script(r#"[{"event": "explode"}]"#).is_err());
    }

    #[test]
    fn test_resolve_against_document() {
        let doc = Document::parse("<p>one</p><p>two <img src=\"a.png\"></p>");
        let select = ScriptStep::SelectText {
            text: "tw".to_string(),
        };
        let Some(EditorEvent::SelectionChanged(Some(node))) = select.resolve(&doc).unwrap() else {
            panic!("expected a selection");
        };
        assert_eq!(doc.text(node), Some("two "));

        let click = ScriptStep::ClickImage { nth: 0 };
        assert!(matches!(
            click.resolve(&doc).unwrap(),
            Some(EditorEvent::ImageClicked(_))
        ));
        assert!(ScriptStep::ClickImage { nth: 1 }.resolve(&doc).is_err());
        assert!(ScriptStep::SelectText {
            text: "missing".to_string()
        }
        .resolve(&doc)
        .is_err());
    }

    #[test]
    fn test_unbound_shortcut_resolves_to_nothing() {
        let doc = Document::new();
        let step = ScriptStep::Shortcut {
            key: "b".to_string(),
            ctrl: true,
        };
        assert_eq!(step.resolve(&doc).unwrap(), None);
    }

    #[test]
    fn test_replay_session() {
        let steps = parse_script(
            r#"[
                {"event": "load"},
                {"event": "type", "html": "<p>hello</p>"},
                {"event": "select_text", "text": "hello"},
                {"event": "format", "format": "bold"},
                {"event": "link", "text": "site"},
                {"event": "shortcut", "key": "z", "ctrl": true},
                {"event": "submit"}
            ]"#,
        )
        .unwrap();
        let mut session = EditorSession::in_memory("");
        replay(&mut session, &steps).unwrap();

        // The URL-less link is rejected and not recorded.
        assert_eq!(session.history().len(), 3);
        assert_eq!(session.field().value(), "<p>hello</p>");
        assert!(session.affordances().can_redo);
    }

    #[test]
    fn test_replay_reports_unresolvable_step() {
        let steps = vec![ScriptStep::ClickImage { nth: 3 }];
        let mut session = EditorSession::in_memory("<p>no images</p>");
        let err = replay(&mut session, &steps).unwrap_err();
        assert!(format!("{err:#}").contains("Script step 1"));
    }
}
