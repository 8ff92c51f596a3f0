#![forbid(unsafe_code)]

//! Keymaps: event patterns bound to operator calls.
//!
//! A [`KeyMapItem`] matches an event by type, value, modifier state and the
//! optional key-modifier. A matching item invokes its operator with the
//! item's properties. Keymaps are registered on the window manager by name
//! and referenced from keymap handlers.

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use kwm_core::event::{Event, EventType, KeyValue, ModState};
use kwm_core::keys::Key;

use crate::context::Context;
use crate::properties::{Properties, PropertyValue};

/// Modifier requirement of a keymap item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ModMatch {
    /// Held or not, either way.
    Any,
    /// Must not be held.
    #[default]
    Off,
    /// Must be held.
    On,
}

impl ModMatch {
    fn accepts(self, state: ModState) -> bool {
        match self {
            Self::Any => true,
            Self::Off => !state.is_held(),
            Self::On => state.is_held(),
        }
    }
}

/// Event value a keymap item reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemValue {
    /// Every value except click-drag.
    Any,
    Exact(KeyValue),
}

/// One binding.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyMapItem {
    pub idname: String,
    /// `None` matches any event type.
    pub kind: Option<EventType>,
    pub value: ItemValue,
    pub shift: ModMatch,
    pub ctrl: ModMatch,
    pub alt: ModMatch,
    pub oskey: ModMatch,
    pub keymodifier: Option<Key>,
    pub properties: Properties,
    pub active: bool,
}

impl KeyMapItem {
    #[must_use]
    pub fn new(idname: impl Into<String>, kind: EventType, value: KeyValue) -> Self {
        Self {
            idname: idname.into(),
            kind: Some(kind),
            value: ItemValue::Exact(value),
            shift: ModMatch::Off,
            ctrl: ModMatch::Off,
            alt: ModMatch::Off,
            oskey: ModMatch::Off,
            keymodifier: None,
            properties: Properties::new(),
            active: true,
        }
    }

    #[must_use]
    pub fn any_value(mut self) -> Self {
        self.value = ItemValue::Any;
        self
    }

    #[must_use]
    pub fn shift(mut self, m: ModMatch) -> Self {
        self.shift = m;
        self
    }

    #[must_use]
    pub fn ctrl(mut self, m: ModMatch) -> Self {
        self.ctrl = m;
        self
    }

    #[must_use]
    pub fn alt(mut self, m: ModMatch) -> Self {
        self.alt = m;
        self
    }

    #[must_use]
    pub fn oskey(mut self, m: ModMatch) -> Self {
        self.oskey = m;
        self
    }

    /// Accept any modifier state.
    #[must_use]
    pub fn any_modifier(self) -> Self {
        self.shift(ModMatch::Any)
            .ctrl(ModMatch::Any)
            .alt(ModMatch::Any)
            .oskey(ModMatch::Any)
    }

    #[must_use]
    pub fn with_keymodifier(mut self, key: Key) -> Self {
        self.keymodifier = Some(key);
        self
    }

    #[must_use]
    pub fn with_property(mut self, name: &str, value: impl Into<PropertyValue>) -> Self {
        self.properties.set(name, value);
        self
    }

    /// Whether `event` triggers this item.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        if !self.active || event.kind == EventType::InbetweenMouseMove {
            return false;
        }
        if let Some(kind) = self.kind
            && kind != event.kind
        {
            return false;
        }
        let value_ok = match self.value {
            ItemValue::Any => event.value != KeyValue::ClickDrag,
            ItemValue::Exact(v) => v == event.value,
        };
        if !value_ok {
            return false;
        }
        if !(self.shift.accepts(event.shift)
            && self.ctrl.accepts(event.ctrl)
            && self.alt.accepts(event.alt)
            && self.oskey.accepts(event.oskey))
        {
            return false;
        }
        match self.keymodifier {
            Some(key) => event.keymodifier == Some(key),
            None => true,
        }
    }
}

/// Human-readable name of an event type, as shown in menus.
#[must_use]
pub fn event_type_name(kind: EventType) -> Cow<'static, str> {
    let name = match kind {
        EventType::Key(key) => return key_name(key),
        EventType::None => "",
        EventType::LeftMouse => "LMB",
        EventType::MiddleMouse => "MMB",
        EventType::RightMouse => "RMB",
        EventType::Button4Mouse => "Mouse4",
        EventType::Button5Mouse => "Mouse5",
        EventType::Button6Mouse => "Mouse6",
        EventType::Button7Mouse => "Mouse7",
        EventType::MouseMove | EventType::InbetweenMouseMove => "Mouse Move",
        EventType::TrackpadPan => "Trackpad Pan",
        EventType::TrackpadZoom => "Trackpad Zoom",
        EventType::TrackpadRotate => "Trackpad Rotate",
        EventType::TrackpadSmartZoom => "Trackpad Smart Zoom",
        EventType::WheelUp => "Wheel Up",
        EventType::WheelDown => "Wheel Down",
        EventType::WheelIn => "Wheel In",
        EventType::WheelOut => "Wheel Out",
        EventType::Timer => "Timer",
        EventType::WindowDeactivate => "Window Deactivate",
        EventType::UiCancel => "UI Cancel",
        EventType::Drop => "Drop",
    };
    Cow::Borrowed(name)
}

fn key_name(key: Key) -> Cow<'static, str> {
    let name = match key {
        Key::Letter(c) => return Cow::Owned(char::from(c).to_string()),
        Key::Digit(d) => return Cow::Owned(d.to_string()),
        Key::Numpad(d) => return Cow::Owned(format!("Numpad {d}")),
        Key::F(n) => return Cow::Owned(format!("F{n}")),
        Key::PadPeriod => "Numpad .",
        Key::PadEnter => "Numpad Enter",
        Key::PadPlus => "Numpad +",
        Key::PadMinus => "Numpad -",
        Key::PadAsterisk => "Numpad *",
        Key::PadSlash => "Numpad /",
        Key::Backspace => "Backspace",
        Key::Tab => "Tab",
        Key::Linefeed => "Linefeed",
        Key::Enter => "Return",
        Key::Esc => "Esc",
        Key::Space => "Space",
        Key::Quote => "'",
        Key::Comma => ",",
        Key::Minus => "-",
        Key::Plus => "+",
        Key::Period => ".",
        Key::Slash => "/",
        Key::Semicolon => ";",
        Key::Equal => "=",
        Key::LeftBracket => "[",
        Key::RightBracket => "]",
        Key::Backslash => "\\",
        Key::AccentGrave => "`",
        Key::LeftShift | Key::RightShift => "Shift",
        Key::LeftCtrl | Key::RightCtrl => "Ctrl",
        Key::LeftAlt | Key::RightAlt => "Alt",
        Key::OsKey => "OS",
        Key::GrLess => "Grless",
        Key::App => "App",
        Key::CapsLock => "Caps Lock",
        Key::LeftArrow => "Left",
        Key::RightArrow => "Right",
        Key::UpArrow => "Up",
        Key::DownArrow => "Down",
        Key::Pause => "Pause",
        Key::Insert => "Insert",
        Key::Delete => "Delete",
        Key::Home => "Home",
        Key::End => "End",
        Key::PageUp => "Page Up",
        Key::PageDown => "Page Down",
        Key::MediaPlay => "Media Play",
        Key::MediaStop => "Media Stop",
        Key::MediaFirst => "Media First",
        Key::MediaLast => "Media Last",
        Key::Unknown => "Unknown",
    };
    Cow::Borrowed(name)
}

impl fmt::Display for KeyMapItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<Cow<'static, str>> = Vec::new();
        for (state, name) in [
            (self.ctrl, "Ctrl"),
            (self.alt, "Alt"),
            (self.shift, "Shift"),
            (self.oskey, "OS"),
        ] {
            if state == ModMatch::On {
                parts.push(Cow::Borrowed(name));
            }
        }
        if let Some(key) = self.keymodifier {
            parts.push(key_name(key));
        }
        match self.kind {
            Some(kind) => parts.push(event_type_name(kind)),
            None => parts.push(Cow::Borrowed("Any")),
        }
        f.write_str(&parts.join(" "))
    }
}

pub type KeyMapPollFn = Rc<dyn Fn(&Context<'_>) -> bool>;

/// Named, ordered list of bindings.
#[derive(Clone)]
pub struct KeyMap {
    pub name: String,
    items: Vec<KeyMapItem>,
    poll: Option<KeyMapPollFn>,
}

impl fmt::Debug for KeyMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMap")
            .field("name", &self.name)
            .field("items", &self.items)
            .field("poll", &self.poll.is_some())
            .finish()
    }
}

impl KeyMap {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
            poll: None,
        }
    }

    /// Only consult this keymap when `poll` passes.
    #[must_use]
    pub fn with_poll(mut self, poll: impl Fn(&Context<'_>) -> bool + 'static) -> Self {
        self.poll = Some(Rc::new(poll));
        self
    }

    #[must_use]
    pub fn with_item(mut self, item: KeyMapItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn add_item(&mut self, item: KeyMapItem) -> &mut KeyMapItem {
        let idx = self.items.len();
        self.items.push(item);
        &mut self.items[idx]
    }

    #[must_use]
    pub fn items(&self) -> &[KeyMapItem] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [KeyMapItem] {
        &mut self.items
    }

    #[must_use]
    pub fn poll(&self, ctx: &Context<'_>) -> bool {
        self.poll.as_ref().is_none_or(|p| p(ctx))
    }

    /// First active item calling `idname` whose properties include every
    /// entry of `properties`.
    #[must_use]
    pub fn find_item(&self, idname: &str, properties: Option<&Properties>) -> Option<&KeyMapItem> {
        self.items.iter().find(|item| {
            item.active
                && item.idname == idname
                && properties.is_none_or(|p| item.properties.contains_all(p))
        })
    }

    /// Items matching `event`, in order.
    pub fn matching<'a>(&'a self, event: &'a Event) -> impl Iterator<Item = &'a KeyMapItem> + 'a {
        self.items.iter().filter(move |item| item.matches(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(c: u8, value: KeyValue) -> Event {
        Event::new(EventType::Key(Key::Letter(c)), value)
    }

    #[test]
    fn exact_value_and_modifiers() {
        let item = KeyMapItem::new("OBJECT_OT_delete", EventType::Key(Key::Letter(b'X')), KeyValue::Press);
        assert!(item.matches(&key(b'X', KeyValue::Press)));
        assert!(!item.matches(&key(b'X', KeyValue::Release)));
        assert!(!item.matches(&key(b'Y', KeyValue::Press)));
        assert!(!item.matches(&key(b'X', KeyValue::Press).with_ctrl()));

        let ctrl = item.clone().ctrl(ModMatch::On);
        assert!(ctrl.matches(&key(b'X', KeyValue::Press).with_ctrl()));
        assert!(!ctrl.matches(&key(b'X', KeyValue::Press)));

        let any = item.any_modifier();
        assert!(any.matches(&key(b'X', KeyValue::Press).with_ctrl().with_shift()));
    }

    #[test]
    fn any_value_excludes_click_drag() {
        let item = KeyMapItem::new("VIEW3D_OT_select", EventType::LeftMouse, KeyValue::Press).any_value();
        for v in [KeyValue::Press, KeyValue::Release, KeyValue::Click, KeyValue::DoubleClick] {
            assert!(item.matches(&Event::new(EventType::LeftMouse, v)));
        }
        assert!(!item.matches(&Event::new(EventType::LeftMouse, KeyValue::ClickDrag)));
    }

    #[test]
    fn double_click_items_only_match_double_clicks() {
        let item = KeyMapItem::new("A_OT_a", EventType::LeftMouse, KeyValue::DoubleClick);
        assert!(item.matches(&Event::new(EventType::LeftMouse, KeyValue::DoubleClick)));
        assert!(!item.matches(&Event::new(EventType::LeftMouse, KeyValue::Press)));
    }

    #[test]
    fn inbetween_moves_never_match() {
        let mut item = KeyMapItem::new("A_OT_a", EventType::MouseMove, KeyValue::Nothing).any_value();
        item.kind = None;
        assert!(item.matches(&Event::new(EventType::MouseMove, KeyValue::Nothing)));
        assert!(!item.matches(&Event::new(EventType::InbetweenMouseMove, KeyValue::Nothing)));
    }

    #[test]
    fn keymodifier_is_only_checked_when_set() {
        let plain = KeyMapItem::new("A_OT_a", EventType::LeftMouse, KeyValue::Press);
        let mut e = Event::new(EventType::LeftMouse, KeyValue::Press);
        e.keymodifier = Some(Key::Letter(b'G'));
        assert!(plain.matches(&e));
        let with = plain.with_keymodifier(Key::Letter(b'R'));
        assert!(!with.matches(&e));
        e.keymodifier = Some(Key::Letter(b'R'));
        assert!(with.matches(&e));
    }

    #[test]
    fn inactive_items_are_skipped() {
        let mut item = KeyMapItem::new("A_OT_a", EventType::Key(Key::Esc), KeyValue::Press);
        item.active = false;
        assert!(!item.matches(&Event::new(EventType::Key(Key::Esc), KeyValue::Press)));
    }

    #[test]
    fn find_item_by_properties() {
        let map = KeyMap::new("Object Mode")
            .with_item(
                KeyMapItem::new("OBJECT_OT_select_all", EventType::Key(Key::Letter(b'A')), KeyValue::Press)
                    .with_property("action", "SELECT"),
            )
            .with_item(
                KeyMapItem::new("OBJECT_OT_select_all", EventType::Key(Key::Letter(b'A')), KeyValue::Press)
                    .alt(ModMatch::On)
                    .with_property("action", "DESELECT"),
            );
        let want = Properties::new().with("action", "DESELECT");
        let found = map.find_item("OBJECT_OT_select_all", Some(&want));
        assert_eq!(found.map(|i| i.alt), Some(ModMatch::On));
        assert!(map.find_item("OBJECT_OT_select_all", None).is_some());
        assert!(map.find_item("OBJECT_OT_delete", None).is_none());
    }

    #[test]
    fn display_names() {
        let item = KeyMapItem::new("A_OT_a", EventType::Key(Key::Letter(b'A')), KeyValue::Press)
            .ctrl(ModMatch::On)
            .shift(ModMatch::On);
        assert_eq!(item.to_string(), "Ctrl Shift A");
        let f = KeyMapItem::new("A_OT_a", EventType::Key(Key::F(3)), KeyValue::Press);
        assert_eq!(f.to_string(), "F3");
        let m = KeyMapItem::new("A_OT_a", EventType::RightMouse, KeyValue::Click).alt(ModMatch::On);
        assert_eq!(m.to_string(), "Alt RMB");
    }
}
