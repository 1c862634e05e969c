/// Tag and class names shared by the editing commands and the sanitizer.

pub const IMAGE_TAG: &str = "img";
pub const FIGURE_TAG: &str = "figure";
pub const CAPTION_TAG: &str = "figcaption";

/// Marks the selected image (and its figure) while editing.
pub const SELECTED_CLASS: &str = "selected";
/// Inline wrapper placed around a bare image while it is selected.
pub const RESIZE_WRAPPER_CLASS: &str = "resizer-wrapper";
/// Corner drag handle inside the wrapper or figure.
pub const RESIZER_CLASS: &str = "resizer";

pub const FLOAT_LEFT_CLASS: &str = "float-left";
pub const FLOAT_RIGHT_CLASS: &str = "float-right";

/// Handle positions, one per corner.
pub const RESIZER_CORNERS: [&str; 4] = ["nw", "ne", "sw", "se"];
