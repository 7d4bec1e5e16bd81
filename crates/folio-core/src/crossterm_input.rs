//! Conversions from crossterm events.
use crate::input::KeyModifiers;
use crate::input::MouseButton;
use crate::input::MouseEvent;
use crate::input::MouseEventKind;

/// Converts a crossterm mouse event. Scrolls and drags have no folio counterpart.
pub fn mouse_event_from_crossterm(m: crossterm::event::MouseEvent) -> Option<MouseEvent> {
    let kind = match m.kind {
        crossterm::event::MouseEventKind::Down(b) => MouseEventKind::Down(mouse_button_from_crossterm(b)),
        crossterm::event::MouseEventKind::Up(b) => MouseEventKind::Up(mouse_button_from_crossterm(b)),
        crossterm::event::MouseEventKind::Moved => MouseEventKind::Moved,
        _ => return None,
    };

    Some(MouseEvent {
        x: m.column,
        y: m.row,
        kind,
        modifiers: modifiers_from_crossterm(m.modifiers),
    })
}

fn modifiers_from_crossterm(m: crossterm::event::KeyModifiers) -> KeyModifiers {
    KeyModifiers {
        shift: m.contains(crossterm::event::KeyModifiers::SHIFT),
        ctrl: m.contains(crossterm::event::KeyModifiers::CONTROL),
        alt: m.contains(crossterm::event::KeyModifiers::ALT),
    }
}

fn mouse_button_from_crossterm(b: crossterm::event::MouseButton) -> MouseButton {
    match b {
        crossterm::event::MouseButton::Left => MouseButton::Left,
        crossterm::event::MouseButton::Right => MouseButton::Right,
        crossterm::event::MouseButton::Middle => MouseButton::Middle,
    }
}
