//! Keyboard shortcut map and documentation.

/// A key as reported by the host, modifiers aside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable key, compared case-insensitively.
    Char(char),
    Delete,
    Backspace,
    Escape,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
}

/// A key press with modifiers. `ctrl` covers both Ctrl and Cmd.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub key: Key,
    pub ctrl: bool,
    pub shift: bool,
}

impl KeyChord {
    pub const fn new(key: Key, ctrl: bool, shift: bool) -> Self {
        Self { key, ctrl, shift }
    }

    pub const fn plain(key: Key) -> Self {
        Self::new(key, false, false)
    }

    pub const fn ctrl(c: char) -> Self {
        Self::new(Key::Char(c), true, false)
    }

    pub const fn ctrl_shift(c: char) -> Self {
        Self::new(Key::Char(c), true, true)
    }
}

/// What a shortcut asks the editor (or its host) to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    DeleteSelection,
    Undo,
    Redo,
    Copy,
    Paste,
    Duplicate,
    Group,
    Ungroup,
    /// Handled by the host (project persistence).
    Save,
    /// Handled by the host (project persistence).
    Open,
    ScaleUp,
    ScaleDown,
    /// Unit direction; `large` selects the Shift step.
    Nudge { dx: i8, dy: i8, large: bool },
    /// Host closes its topmost dialog first; otherwise clears the selection.
    Escape,
}

/// Resolve a key chord to an editor action.
pub fn action_for(chord: KeyChord) -> Option<EditorAction> {
    use EditorAction::*;

    let nudge = |dx, dy| Nudge {
        dx,
        dy,
        large: chord.shift,
    };
    match chord.key {
        Key::Delete | Key::Backspace => return Some(DeleteSelection),
        Key::Escape => return Some(Escape),
        Key::ArrowUp => return Some(nudge(0, -1)),
        Key::ArrowDown => return Some(nudge(0, 1)),
        Key::ArrowLeft => return Some(nudge(-1, 0)),
        Key::ArrowRight => return Some(nudge(1, 0)),
        Key::Char(_) => {}
    }
    if !chord.ctrl {
        return None;
    }
    let Key::Char(c) = chord.key else {
        return None;
    };
    let action = match (c.to_ascii_lowercase(), chord.shift) {
        ('z', false) => Undo,
        ('z', true) | ('y', _) => Redo,
        ('c', false) => Copy,
        ('v', false) => Paste,
        ('d', false) => Duplicate,
        ('g', false) => Group,
        ('g', true) => Ungroup,
        ('s', false) => Save,
        ('o', false) => Open,
        // '+' is Shift+'=' on most layouts
        ('+', _) | ('=', _) => ScaleUp,
        ('-', _) | ('_', _) => ScaleDown,
        _ => return None,
    };
    Some(action)
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        ctrl: bool,
        shift: bool,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            ctrl,
            shift,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+S").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl/Cmd");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("Delete", false, false, "Delete selected elements"),
            Shortcut::new("Backspace", false, false, "Delete selected elements"),
            Shortcut::new("Z", true, false, "Undo"),
            Shortcut::new("Z", true, true, "Redo"),
            Shortcut::new("Y", true, false, "Redo"),
            Shortcut::new("C", true, false, "Copy element"),
            Shortcut::new("V", true, false, "Paste element"),
            Shortcut::new("D", true, false, "Duplicate element"),
            Shortcut::new("G", true, false, "Group selected elements"),
            Shortcut::new("G", true, true, "Ungroup selected group"),
            Shortcut::new("S", true, false, "Save project"),
            Shortcut::new("O", true, false, "Open project"),
            Shortcut::new("Plus", true, false, "Scale selection up (x1.1)"),
            Shortcut::new("Minus", true, false, "Scale selection down (x0.9)"),
            Shortcut::new("Arrows", false, false, "Nudge selection 1px"),
            Shortcut::new("Arrows", false, true, "Nudge selection 10px"),
            Shortcut::new("Escape", false, false, "Close dialog or clear selection"),
        ]
    }

    /// Render the table as aligned lines.
    pub fn table() -> String {
        Self::all()
            .iter()
            .map(|s| format!("  {:20} {}", s.format(), s.description))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::editor::Editor;
    use crate::id::SeededIds;
    use crate::shapes::ShapeType;

    #[test]
    fn test_keyboard_surface() {
        assert_eq!(action_for(KeyChord::ctrl('z')), Some(EditorAction::Undo));
        assert_eq!(action_for(KeyChord::ctrl('Z')), Some(EditorAction::Undo));
        assert_eq!(action_for(KeyChord::ctrl_shift('z')), Some(EditorAction::Redo));
        assert_eq!(action_for(KeyChord::ctrl('y')), Some(EditorAction::Redo));
        assert_eq!(action_for(KeyChord::ctrl('g')), Some(EditorAction::Group));
        assert_eq!(action_for(KeyChord::ctrl_shift('g')), Some(EditorAction::Ungroup));
        assert_eq!(action_for(KeyChord::ctrl('=')), Some(EditorAction::ScaleUp));
        assert_eq!(action_for(KeyChord::ctrl_shift('+')), Some(EditorAction::ScaleUp));
        assert_eq!(action_for(KeyChord::ctrl('-')), Some(EditorAction::ScaleDown));
        assert_eq!(
            action_for(KeyChord::plain(Key::Backspace)),
            Some(EditorAction::DeleteSelection)
        );
        assert_eq!(action_for(KeyChord::plain(Key::Char('z'))), None);
        assert_eq!(action_for(KeyChord::ctrl('q')), None);
    }

    #[test]
    fn test_arrow_nudges() {
        assert_eq!(
            action_for(KeyChord::new(Key::ArrowLeft, false, true)),
            Some(EditorAction::Nudge {
                dx: -1,
                dy: 0,
                large: true
            })
        );
    }

    #[test]
    fn test_actions_drive_editor() {
        let mut ed = Editor::with_ids(EditorConfig::default(), Box::new(SeededIds::new(8)));
        let id = ed.add_shape(ShapeType::Rectangle);
        ed.select(id);
        let start = ed.get(id).unwrap().position();

        let shift_right = action_for(KeyChord::new(Key::ArrowRight, false, true)).unwrap();
        assert!(ed.apply_action(shift_right));
        assert_eq!(ed.get(id).unwrap().position().x, start.x + 10.0);

        assert!(ed.apply_action(action_for(KeyChord::ctrl('d')).unwrap()));
        assert_eq!(ed.document().len(), 2);

        assert!(ed.apply_action(action_for(KeyChord::plain(Key::Delete)).unwrap()));
        assert_eq!(ed.document().len(), 1);

        assert!(ed.apply_action(action_for(KeyChord::ctrl('z')).unwrap()));
        assert_eq!(ed.document().len(), 2);
    }

    #[test]
    fn test_registry_lists_bindings() {
        let table = ShortcutRegistry::table();
        assert!(table.contains("Ctrl/Cmd+Shift+G"));
        assert_eq!(ShortcutRegistry::all().len(), 17);
    }
}
