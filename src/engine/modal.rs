//! Modal lifecycle and placement.
//!
//! The engine tracks which modal is open and where it should be anchored;
//! drawing is the presentation layer's job. Placement flips around the
//! pointer so the modal never leaves the viewport.

/// Which modal dialog is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalKind {
    Create,
    View,
    Edit,
    Swap,
    Delete,
}

/// An open modal: its kind, anchor position, and any inline error from the
/// last failed submit. The modal stays open while an error is shown.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveModal {
    pub kind: ModalKind,
    /// Top-left corner in viewport coordinates, already placement-flipped.
    pub pos: (f32, f32),
    pub error: Option<String>,
}

impl ActiveModal {
    pub fn open(kind: ModalKind, pointer: (f32, f32), size: (f32, f32), viewport: (f32, f32)) -> Self {
        Self {
            kind,
            pos: place(pointer, size, viewport),
            error: None,
        }
    }
}

/// Position a modal of `size` near `pointer` inside `viewport`.
///
/// Preferred placement is below-right of the pointer; each axis flips to
/// the other side when it would overflow, then clamps at the viewport edge
/// for modals bigger than the remaining space.
pub fn place(pointer: (f32, f32), size: (f32, f32), viewport: (f32, f32)) -> (f32, f32) {
    let x = if pointer.0 + size.0 <= viewport.0 {
        pointer.0
    } else {
        (pointer.0 - size.0).max(0.0)
    };
    let y = if pointer.1 + size.1 <= viewport.1 {
        pointer.1
    } else {
        (pointer.1 - size.1).max(0.0)
    };
    (x, y)
}
