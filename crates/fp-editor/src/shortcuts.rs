//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. Lives in Rust
//! so the WASM bridge and native tests resolve keys the same way.

use crate::input::Modifiers;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    /// Owner: flip add-stand mode.
    ToggleAddStand,
    /// Close the placement form or clear the selection.
    Cancel,

    // ── View ──
    ZoomIn,
    ZoomOut,
    ZoomToFit,
}

/// Resolves key events into shortcut actions.
///
/// On macOS `meta` is ⌘; elsewhere `ctrl` plays the same role. Browser zoom
/// (⌘+/⌘-) is left to the browser.
pub struct ShortcutMap;

impl ShortcutMap {
    /// `key` is the `KeyboardEvent.key` value (e.g. `"a"`, `"Escape"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        if modifiers.ctrl || modifiers.meta || modifiers.alt {
            return None;
        }

        match key {
            "a" | "A" if !modifiers.shift => Some(ShortcutAction::ToggleAddStand),
            "Escape" => Some(ShortcutAction::Cancel),
            // `+` arrives shifted on most layouts.
            "=" | "+" => Some(ShortcutAction::ZoomIn),
            "-" | "_" => Some(ShortcutAction::ZoomOut),
            "0" => Some(ShortcutAction::ZoomToFit),
            _ => None,
        }
    }
}
