use egui::{Event, Key, Modifiers};
use pdfview_core::{Command, FitMode};

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Command(Command),
    Open,
    OpenGotoDialog,
    FocusSearch,
    Scroll { dx: f32, dy: f32 },
    Quit,
    None,
}

/// Translates keyboard input into viewer actions.
#[derive(Debug, Clone)]
pub struct EventMapper {
    scroll_step: f32,
}

impl Default for EventMapper {
    fn default() -> Self {
        Self::new(40.0)
    }
}

impl EventMapper {
    pub fn new(scroll_step: f32) -> Self {
        Self {
            scroll_step: scroll_step.max(1.0),
        }
    }

    pub fn map_event(&self, event: &Event) -> UiEvent {
        match event {
            Event::Key {
                key,
                pressed: true,
                modifiers,
                ..
            } => self.map_key(*key, *modifiers),
            _ => UiEvent::None,
        }
    }

    pub fn map_events<'a>(&self, events: impl IntoIterator<Item = &'a Event>) -> Vec<UiEvent> {
        events
            .into_iter()
            .map(|event| self.map_event(event))
            .filter(|event| !matches!(event, UiEvent::None))
            .collect()
    }

    fn map_key(&self, key: Key, modifiers: Modifiers) -> UiEvent {
        let command = modifiers.command || modifiers.ctrl;
        let step = self.scroll_step;
        match (key, command) {
            (Key::PageDown, false) => UiEvent::Command(Command::NextPage),
            (Key::PageUp, false) => UiEvent::Command(Command::PrevPage),
            (Key::Home, true) => UiEvent::Command(Command::FirstPage),
            (Key::End, true) => UiEvent::Command(Command::LastPage),
            (Key::G, true) => UiEvent::OpenGotoDialog,
            (Key::Plus | Key::Equals, true) => UiEvent::Command(Command::ZoomIn),
            (Key::Minus, true) => UiEvent::Command(Command::ZoomOut),
            (Key::Num0, true) => UiEvent::Command(Command::ResetZoom),
            (Key::Num1, true) => fit(FitMode::FitWidth),
            (Key::Num2, true) => fit(FitMode::FitHeight),
            (Key::Num3, true) => fit(FitMode::FitPage),
            (Key::R, true) => UiEvent::Command(Command::Rotate),
            (Key::F, true) => UiEvent::FocusSearch,
            (Key::F3, false) if modifiers.shift => UiEvent::Command(Command::SearchPrev),
            (Key::F3, false) => UiEvent::Command(Command::SearchNext),
            (Key::O, true) => UiEvent::Open,
            (Key::W, true) => UiEvent::Command(Command::Close),
            (Key::Q, true) => UiEvent::Quit,
            (Key::ArrowDown, false) => UiEvent::Scroll { dx: 0.0, dy: step },
            (Key::ArrowUp, false) => UiEvent::Scroll { dx: 0.0, dy: -step },
            (Key::ArrowRight, false) => UiEvent::Scroll { dx: step, dy: 0.0 },
            (Key::ArrowLeft, false) => UiEvent::Scroll { dx: -step, dy: 0.0 },
            _ => UiEvent::None,
        }
    }
}

fn fit(mode: FitMode) -> UiEvent {
    UiEvent::Command(Command::SetFitMode { mode })
}
