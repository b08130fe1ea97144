use crate::{
    rect::Rect,
    tree::{Atom, WindowId},
};

bitflags! {
    /// Event selection of one display on one window.
    EventMask: u32;
    KEY_PRESS = 1 << 0,
    KEY_RELEASE = 1 << 1,
    BUTTON_PRESS = 1 << 2,
    BUTTON_RELEASE = 1 << 3,
    ENTER_WINDOW = 1 << 4,
    LEAVE_WINDOW = 1 << 5,
    POINTER_MOTION = 1 << 6,
    BUTTON_MOTION = 1 << 13,
    EXPOSURE = 1 << 15,
    STRUCTURE_NOTIFY = 1 << 17,
    SUBSTRUCTURE_NOTIFY = 1 << 19,
    FOCUS_CHANGE = 1 << 21,
    PROPERTY_CHANGE = 1 << 22,
}

bitflags! {
    /// Keyboard modifiers and pointer buttons held during an input event.
    ModifierState: u16;
    SHIFT = 1 << 0,
    LOCK = 1 << 1,
    CONTROL = 1 << 2,
    MOD1 = 1 << 3,
    MOD2 = 1 << 4,
    MOD3 = 1 << 5,
    MOD4 = 1 << 6,
    MOD5 = 1 << 7,
    BUTTON1 = 1 << 8,
    BUTTON2 = 1 << 9,
    BUTTON3 = 1 << 10,
    BUTTON4 = 1 << 11,
    BUTTON5 = 1 << 12,
}

impl ModifierState {
    pub fn buttons() -> Self {
        Self::BUTTON1 | Self::BUTTON2 | Self::BUTTON3 | Self::BUTTON4 | Self::BUTTON5
    }

    pub fn button(button: u8) -> Self {
        match button {
            1..=5 => Self(1 << (7 + button as u16)),
            _ => Self::NONE,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PropertyState {
    NewValue,
    Deleted,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FocusMode {
    Normal,
    /// Focus moved because the focus window became unviewable.
    Revert,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CrossingMode {
    Normal,
    Grab,
    Ungrab,
}

/// Pointer and keyboard payload shared by key, button, motion and crossing
/// events.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct InputInfo {
    pub root: WindowId,
    /// The deepest window containing the pointer.
    pub subwindow: Option<WindowId>,
    pub time: u32,
    pub x: i32,
    pub y: i32,
    pub x_root: i32,
    pub y_root: i32,
    pub state: ModifierState,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EventKind {
    CreateNotify {
        parent: WindowId,
        window: WindowId,
        rect: Rect,
        border_width: i32,
        override_redirect: bool,
    },
    DestroyNotify {
        window: WindowId,
    },
    MapNotify {
        window: WindowId,
        override_redirect: bool,
    },
    UnmapNotify {
        window: WindowId,
    },
    ReparentNotify {
        window: WindowId,
        parent: WindowId,
        x: i32,
        y: i32,
        override_redirect: bool,
    },
    ConfigureNotify {
        window: WindowId,
        rect: Rect,
        border_width: i32,
        above_sibling: Option<WindowId>,
        override_redirect: bool,
    },
    Expose {
        rect: Rect,
        count: u32,
    },
    KeyPress {
        info: InputInfo,
        keycode: u32,
        keysym: u32,
    },
    KeyRelease {
        info: InputInfo,
        keycode: u32,
        keysym: u32,
    },
    ButtonPress {
        info: InputInfo,
        button: u8,
    },
    ButtonRelease {
        info: InputInfo,
        button: u8,
    },
    MotionNotify {
        info: InputInfo,
    },
    EnterNotify {
        info: InputInfo,
        mode: CrossingMode,
    },
    LeaveNotify {
        info: InputInfo,
        mode: CrossingMode,
    },
    FocusIn {
        mode: FocusMode,
    },
    FocusOut {
        mode: FocusMode,
    },
    PropertyNotify {
        atom: Atom,
        state: PropertyState,
        time: u32,
    },
    ClientMessage {
        message_type: Atom,
        data: [u32; 5],
    },
}

impl EventKind {
    pub fn expose_count(&self) -> Option<u32> {
        match self {
            EventKind::Expose { count, .. } => Some(*count),
            _ => None,
        }
    }
}

/// A protocol-style event as seen by a display.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Event {
    /// The receiving display's request counter at enqueue time.
    pub serial: u64,
    /// Whether the event was produced by `send_event` instead of the server.
    pub send_event: bool,
    /// The window the event is reported relative to.
    pub window: WindowId,
    pub kind: EventKind,
}
