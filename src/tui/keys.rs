use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Key binding configuration
#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub keys: Vec<(KeyCode, KeyModifiers)>,
    pub description: String,
}

impl KeyBinding {
    pub fn new(keys: &[(KeyCode, KeyModifiers)], description: &str) -> Self {
        Self {
            keys: keys.to_vec(),
            description: description.to_string(),
        }
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        self.keys
            .iter()
            .any(|(code, modifiers)| *code == event.code && *modifiers == event.modifiers)
    }
}

/// Action bound to a key in the feed viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    Help,
    Down,
    Up,
    PageDown,
    PageUp,
    Top,
    Bottom,
    ShowMore,
    Reload,
}

/// Feed viewer key mappings
#[derive(Debug, Clone)]
pub struct KeyMap {
    bindings: Vec<(KeyAction, KeyBinding)>,
}

impl Default for KeyMap {
    fn default() -> Self {
        let none = KeyModifiers::NONE;
        Self {
            bindings: vec![
                (
                    KeyAction::Quit,
                    KeyBinding::new(
                        &[
                            (KeyCode::Char('c'), KeyModifiers::CONTROL),
                            (KeyCode::Char('q'), none),
                            (KeyCode::Esc, none),
                        ],
                        "q / Esc      Quit",
                    ),
                ),
                (
                    KeyAction::Help,
                    KeyBinding::new(&[(KeyCode::Char('?'), none), (KeyCode::Char('?'), KeyModifiers::SHIFT)], "?            Show/hide help"),
                ),
                (
                    KeyAction::Down,
                    KeyBinding::new(&[(KeyCode::Down, none), (KeyCode::Char('j'), none)], "↓ / j        Next review"),
                ),
                (
                    KeyAction::Up,
                    KeyBinding::new(&[(KeyCode::Up, none), (KeyCode::Char('k'), none)], "↑ / k        Previous review"),
                ),
                (
                    KeyAction::PageDown,
                    KeyBinding::new(&[(KeyCode::PageDown, none), (KeyCode::Char(' '), none)], "PgDn / Space Page down"),
                ),
                (
                    KeyAction::PageUp,
                    KeyBinding::new(&[(KeyCode::PageUp, none)], "PgUp         Page up"),
                ),
                (
                    KeyAction::Top,
                    KeyBinding::new(&[(KeyCode::Home, none), (KeyCode::Char('g'), none)], "Home / g     First review"),
                ),
                (
                    KeyAction::Bottom,
                    KeyBinding::new(
                        &[
                            (KeyCode::End, none),
                            (KeyCode::Char('G'), none),
                            (KeyCode::Char('G'), KeyModifiers::SHIFT),
                        ],
                        "End / G      Last loaded review",
                    ),
                ),
                (
                    KeyAction::ShowMore,
                    KeyBinding::new(&[(KeyCode::Enter, none)], "Enter        Show full review"),
                ),
                (
                    KeyAction::Reload,
                    KeyBinding::new(&[(KeyCode::Char('r'), none)], "r            Reload from the first page"),
                ),
            ],
        }
    }
}

impl KeyMap {
    /// Action bound to the event, if any
    pub fn action(&self, event: &KeyEvent) -> Option<KeyAction> {
        self.bindings
            .iter()
            .find(|(_, binding)| binding.matches(event))
            .map(|(action, _)| *action)
    }

    /// Get help text for all key bindings
    pub fn help_text(&self) -> String {
        self.bindings
            .iter()
            .map(|(_, binding)| binding.description.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
