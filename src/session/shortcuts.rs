use crate::screenshot::Session;
use crate::session::messages::{Key, KeyPress, Msg};

/// Map a key press to a session message
///
/// While a text edit is open the text field owns the keyboard, so only
/// Escape and Enter are interpreted here.
pub fn handle_key_event(session: &Session, press: KeyPress) -> Option<Msg> {
    let editing_text = session.annotations.text_edit.is_some();

    match press.key {
        Key::Escape => Some(Msg::cancel()),
        Key::Enter if editing_text && !press.shift => Some(Msg::text_submit()),
        _ if editing_text => None,
        Key::Char(c) if c.eq_ignore_ascii_case(&'z') && press.command() => Some(Msg::undo()),
        Key::Delete | Key::Backspace => Some(Msg::delete_selected()),
        _ => None,
    }
}
