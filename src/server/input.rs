use {
    crate::{
        event::{CrossingMode, EventKind, EventMask, InputInfo, ModifierState},
        input::NativeInput,
        server::ServerState,
        tree::{Atom, FrameHit, Notification, WindowId},
    },
    smallvec::SmallVec,
};

#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct PointerState {
    pub x: i32,
    pub y: i32,
    /// The deepest viewable window under the pointer, if the pointer is
    /// inside the screen.
    pub window: Option<WindowId>,
    pub state: ModifierState,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum GrabKind {
    Move,
    Resize(FrameHit),
}

/// An interactive move or resize of a frame.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Grab {
    pub frame: WindowId,
    pub kind: GrabKind,
}

impl ServerState {
    pub fn handle_input(&mut self, input: NativeInput) {
        match input {
            NativeInput::Key {
                keycode,
                keysym,
                pressed,
                state,
            } => self.handle_key(keycode, keysym, pressed, state),
            NativeInput::Button {
                button,
                pressed,
                x,
                y,
                state,
            } => {
                self.handle_motion(x, y, state);
                self.handle_button(button, pressed);
            }
            NativeInput::Motion { x, y, state } => self.handle_motion(x, y, state),
            NativeInput::PointerLeave => {
                if let Some(old) = self.pointer.window.take() {
                    self.crossing(old, false, CrossingMode::Normal);
                }
            }
            NativeInput::Resize { width, height } => self.resize_screen(width, height),
            NativeInput::Quit => {}
        }
    }

    fn info(&self, x: i32, y: i32, subwindow: Option<WindowId>) -> InputInfo {
        InputInfo {
            root: self.tree.root(),
            subwindow,
            time: self.tree.time(),
            x,
            y,
            x_root: self.pointer.x,
            y_root: self.pointer.y,
            state: self.pointer.state,
        }
    }

    /// Delivers an input event to the first window, starting at `start` and
    /// walking up the tree, on which some display selected `mask`.
    /// Coordinates are translated to that window.
    fn propagate(&mut self, start: WindowId, mask: EventMask, make: impl Fn(InputInfo) -> EventKind) {
        let ancestors = self.tree.ancestors(start);
        let mut child = None;
        for window in ancestors {
            let displays: SmallVec<[_; 1]> = self.tree.selecting(window, mask);
            if displays.is_empty() {
                child = Some(window);
                continue;
            }
            let (ox, oy) = self.tree.origin(window).unwrap_or_default();
            let kind = make(self.info(self.pointer.x - ox, self.pointer.y - oy, child));
            for display in displays {
                self.tree.push_notification(Notification {
                    display,
                    window,
                    send_event: false,
                    kind: kind.clone(),
                });
            }
            return;
        }
    }

    fn crossing(&mut self, window: WindowId, enter: bool, mode: CrossingMode) {
        let (mask, name) = match enter {
            true => (EventMask::ENTER_WINDOW, "enter"),
            false => (EventMask::LEAVE_WINDOW, "leave"),
        };
        let Some((ox, oy)) = self.tree.origin(window) else {
            return;
        };
        log::trace!("Pointer {} {}", name, window);
        let info = self.info(self.pointer.x - ox, self.pointer.y - oy, None);
        let kind = match enter {
            true => EventKind::EnterNotify { info, mode },
            false => EventKind::LeaveNotify { info, mode },
        };
        for display in self.tree.selecting(window, mask) {
            self.tree.push_notification(Notification {
                display,
                window,
                send_event: false,
                kind: kind.clone(),
            });
        }
    }

    fn handle_motion(&mut self, x: i32, y: i32, state: ModifierState) {
        let (dx, dy) = (x - self.pointer.x, y - self.pointer.y);
        self.pointer.x = x;
        self.pointer.y = y;
        self.pointer.state = state | (self.pointer.state & ModifierState::buttons());
        if let Some(Grab { frame, kind }) = self.grab {
            match kind {
                GrabKind::Move => self.tree.move_frame(frame, dx, dy),
                GrabKind::Resize(hit) => {
                    let (dw, dh, left) = match hit {
                        FrameHit::Left => (-dx, 0, true),
                        FrameHit::Right => (dx, 0, false),
                        FrameHit::Bottom => (0, dy, false),
                        FrameHit::BottomLeft => (-dx, dy, true),
                        FrameHit::BottomRight => (dx, dy, false),
                        FrameHit::Title | FrameHit::Close => (0, 0, false),
                    };
                    self.tree.resize_frame(frame, dw, dh, left);
                }
            }
            return;
        }
        let window = self.tree.window_at(x, y);
        if self.pointer.window != Some(window) {
            let mode = CrossingMode::Normal;
            if let Some(old) = self.pointer.window.replace(window) {
                self.crossing(old, false, mode);
            }
            self.crossing(window, true, mode);
        }
        if dx == 0 && dy == 0 {
            return;
        }
        let mut mask = EventMask::POINTER_MOTION;
        if self.pointer.state.intersects(ModifierState::buttons()) {
            mask |= EventMask::BUTTON_MOTION;
        }
        self.propagate(window, mask, |info| EventKind::MotionNotify { info });
    }

    fn handle_button(&mut self, button: u8, pressed: bool) {
        let bit = ModifierState::button(button);
        let window = self.tree.window_at(self.pointer.x, self.pointer.y);
        if !pressed {
            if button == 1 {
                if let Some(grab) = self.grab.take() {
                    log::debug!("Ending interactive {:?} of {}", grab.kind, grab.frame);
                    self.end_grab(window);
                    self.pointer.state = self.pointer.state & !bit;
                    return;
                }
            }
            self.propagate(window, EventMask::BUTTON_RELEASE, |info| EventKind::ButtonRelease {
                info,
                button,
            });
            self.pointer.state = self.pointer.state & !bit;
            return;
        }
        if self.tree.is_frame(window) {
            self.frame_button(window, button);
        } else {
            self.click_to_focus(window);
            self.propagate(window, EventMask::BUTTON_PRESS, |info| EventKind::ButtonPress {
                info,
                button,
            });
        }
        self.pointer.state |= bit;
    }

    /// Raises the top-level containing `window` and focuses its wrapper.
    fn click_to_focus(&mut self, window: WindowId) {
        let ancestors = self.tree.ancestors(window);
        let Some(&top) = ancestors.iter().rev().nth(1) else {
            return;
        };
        let focus = self.tree.wrapper_of_frame(top).unwrap_or(top);
        self.tree.raise_window(top);
        if !self.tree.is_ancestor(focus, self.tree.focus()) {
            self.tree.set_input_focus(focus);
        }
    }

    fn frame_button(&mut self, frame: WindowId, button: u8) {
        let Some((ox, oy)) = self.tree.origin(frame) else {
            return;
        };
        let Some(hit) = self.tree.frame_hit(frame, self.pointer.x - ox, self.pointer.y - oy) else {
            return;
        };
        self.click_to_focus(frame);
        if button != 1 {
            return;
        }
        let kind = match hit {
            FrameHit::Close => {
                self.send_delete_window(frame);
                return;
            }
            FrameHit::Title => GrabKind::Move,
            hit => GrabKind::Resize(hit),
        };
        log::debug!("Starting interactive {:?} of {}", kind, frame);
        self.grab = Some(Grab { frame, kind });
        if let Some(old) = self.pointer.window {
            self.crossing(old, false, CrossingMode::Grab);
        }
    }

    fn end_grab(&mut self, window: WindowId) {
        self.pointer.window = Some(window);
        self.crossing(window, true, CrossingMode::Ungrab);
    }

    /// Asks the client owning the framed window to close it.
    fn send_delete_window(&mut self, frame: WindowId) {
        let Some(wrapper) = self.tree.wrapper_of_frame(frame) else {
            return;
        };
        let Some(display) = self.tree.owner(wrapper) else {
            log::debug!("Close requested for {} which has no owner", wrapper);
            return;
        };
        let time = self.tree.time();
        log::debug!("Sending WM_DELETE_WINDOW to {}", wrapper);
        self.tree.push_notification(Notification {
            display,
            window: wrapper,
            send_event: true,
            kind: EventKind::ClientMessage {
                message_type: Atom::WM_PROTOCOLS,
                data: [Atom::WM_DELETE_WINDOW.raw(), time, 0, 0, 0],
            },
        });
    }

    fn handle_key(&mut self, keycode: u32, keysym: u32, pressed: bool, state: ModifierState) {
        self.pointer.state = state | (self.pointer.state & ModifierState::buttons());
        let focus = self.tree.focus();
        let start = match self.pointer.window {
            Some(w) if self.tree.is_ancestor(focus, w) => w,
            _ => focus,
        };
        let (mask, kind): (_, fn(InputInfo, u32, u32) -> EventKind) = match pressed {
            true => (EventMask::KEY_PRESS, |info, keycode, keysym| EventKind::KeyPress {
                info,
                keycode,
                keysym,
            }),
            false => (EventMask::KEY_RELEASE, |info, keycode, keysym| {
                EventKind::KeyRelease {
                    info,
                    keycode,
                    keysym,
                }
            }),
        };
        self.propagate(start, mask, |info| kind(info, keycode, keysym));
    }
}
