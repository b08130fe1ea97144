use crate::{
    event::{EventKind, EventMask},
    tree::{Notification, Window, WindowChanges, WindowId, WindowTree, clamp_size},
};

/// Decoration state of a wrapper window. The payload is the slot of the
/// frame window.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum FrameState {
    NoFrame,
    /// The frame exists but the wrapper has not been moved into it yet.
    Pending(u32),
    Framed(u32),
}

/// The part of a frame under the pointer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FrameHit {
    Title,
    Close,
    Left,
    Right,
    Bottom,
    BottomLeft,
    BottomRight,
}

impl WindowTree {
    pub(super) fn wants_frame(&self, idx: u32) -> bool {
        let w = self.w(idx);
        self.frames_enabled
            && w.wrapper
            && !w.override_redirect
            && !w.is_frame
            && w.parent == Some(self.root)
            && w.frame == FrameState::NoFrame
    }

    /// Wraps `idx` in a new frame window that takes over its position and
    /// stacking slot, then maps both.
    pub(super) fn synthesize_frame(&mut self, idx: u32) {
        let fw = self.frame_width;
        let th = self.title_height;
        let (outer, title) = {
            let w = self.w(idx);
            (w.outer_rect(), w.title.clone())
        };
        let mut frame = Window::new(
            outer.x1(),
            outer.y1(),
            outer.width() + 2 * fw,
            outer.height() + fw + th,
            0,
            &mut self.pool,
        );
        frame.is_frame = true;
        frame.frame_of = Some(idx);
        frame.title = title;
        let frame_idx = self.alloc(frame);
        self.w_mut(idx).frame = FrameState::Pending(frame_idx);
        self.link_above(idx, frame_idx);
        let frame_id = self.id_of(frame_idx);
        let kind = EventKind::CreateNotify {
            parent: self.id_of(self.root),
            window: frame_id,
            rect: self.w(frame_idx).outer_rect(),
            border_width: 0,
            override_redirect: false,
        };
        self.deliver(self.root, EventMask::SUBSTRUCTURE_NOTIFY, &kind);
        self.move_into(idx, frame_idx, fw, th);
        self.w_mut(idx).frame = FrameState::Framed(frame_idx);
        log::debug!("Framed window {} in {}", self.id_of(idx), frame_id);
        self.map_raw(idx);
        self.map_raw(frame_idx);
    }

    /// Applies a configure request of a framed wrapper. Positions move the
    /// frame, sizes resize the wrapper and the frame, stacking restacks the
    /// frame.
    pub(super) fn configure_framed(&mut self, idx: u32, frame: u32, changes: &WindowChanges) {
        let inner = WindowChanges {
            width: changes.width,
            height: changes.height,
            border_width: changes.border_width,
            ..Default::default()
        };
        self.configure_idx(idx, &inner);
        let sibling = changes
            .sibling
            .map(|s| self.frame_window_of(s).unwrap_or(s));
        let outer = WindowChanges {
            x: changes.x,
            y: changes.y,
            sibling,
            stack_mode: changes.stack_mode,
            ..Default::default()
        };
        let moved = self.configure_idx(frame, &outer);
        self.sync_frame_size(frame);
        if moved {
            self.send_synthetic_configure(idx);
        }
    }

    /// Resizes the frame to fit its wrapper.
    pub(super) fn sync_frame_size(&mut self, frame: u32) {
        let Some(wrapper) = self.w(frame).frame_of else {
            return;
        };
        if self.w(frame).fullscreen {
            return;
        }
        let outer = self.w(wrapper).outer_rect();
        let changes = WindowChanges {
            width: Some(outer.width() + 2 * self.frame_width),
            height: Some(outer.height() + self.frame_width + self.title_height),
            ..Default::default()
        };
        self.configure_idx(frame, &changes);
    }

    /// Tells the wrapper's listeners where the wrapper now is in root
    /// coordinates after its frame moved.
    fn send_synthetic_configure(&mut self, idx: u32) {
        let (x, y) = self.interior_origin(idx);
        let id = self.id_of(idx);
        let w = self.w(idx);
        let bw = w.border_width;
        let kind = EventKind::ConfigureNotify {
            window: id,
            rect: w.outer_rect().move_(x - bw - w.x, y - bw - w.y),
            border_width: bw,
            above_sibling: None,
            override_redirect: w.override_redirect,
        };
        let displays: Vec<_> = w
            .listeners
            .iter()
            .filter(|(_, m)| m.contains(EventMask::STRUCTURE_NOTIFY))
            .map(|(d, _)| *d)
            .collect();
        for display in displays {
            self.push_notification(Notification {
                display,
                window: id,
                send_event: true,
                kind: kind.clone(),
            });
        }
    }

    /// Classifies frame-local interior coordinates.
    pub fn frame_hit(&self, frame: WindowId, x: i32, y: i32) -> Option<FrameHit> {
        let idx = self.idx(frame)?;
        let w = self.w(idx);
        if !w.is_frame || x < 0 || y < 0 || x >= w.width || y >= w.height {
            return None;
        }
        let fw = self.frame_width;
        let th = self.title_height;
        let corner = fw.max(th);
        let bottom = y >= w.height - fw;
        let hit = if y < th {
            if x >= w.width - fw - th && x < w.width - fw {
                FrameHit::Close
            } else {
                FrameHit::Title
            }
        } else if (x < fw && y >= w.height - corner) || (bottom && x < corner) {
            FrameHit::BottomLeft
        } else if (x >= w.width - fw && y >= w.height - corner) || (bottom && x >= w.width - corner) {
            FrameHit::BottomRight
        } else if x < fw {
            FrameHit::Left
        } else if x >= w.width - fw {
            FrameHit::Right
        } else if bottom {
            FrameHit::Bottom
        } else {
            return None;
        };
        Some(hit)
    }

    pub fn is_frame(&self, id: WindowId) -> bool {
        self.window(id).is_some_and(|w| w.is_frame)
    }

    pub(super) fn set_title_idx(&mut self, idx: u32, title: &[u8]) {
        self.w_mut(idx).title = title.into();
        if let FrameState::Framed(frame) = self.w(idx).frame {
            self.w_mut(frame).title = title.into();
            self.expose_all(frame);
        }
    }

    /// Moves a frame by `(dx, dy)` as part of an interactive move.
    pub fn move_frame(&mut self, frame: WindowId, dx: i32, dy: i32) {
        let Some(idx) = self.idx(frame) else {
            return;
        };
        let Some(wrapper) = self.w(idx).frame_of else {
            return;
        };
        let (x, y) = {
            let w = self.w(idx);
            (w.x.saturating_add(dx), w.y.saturating_add(dy))
        };
        let changes = WindowChanges {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        };
        if self.configure_idx(idx, &changes) {
            self.send_synthetic_configure(wrapper);
        }
    }

    /// Resizes the wrapper of a frame as part of an interactive resize.
    /// `left` moves the left edge instead of the right one.
    pub fn resize_frame(&mut self, frame: WindowId, dw: i32, dh: i32, left: bool) {
        let Some(idx) = self.idx(frame) else {
            return;
        };
        let Some(wrapper) = self.w(idx).frame_of else {
            return;
        };
        let (width, height) = {
            let w = self.w(wrapper);
            (
                clamp_size(w.width.saturating_add(dw)),
                clamp_size(w.height.saturating_add(dh)),
            )
        };
        let applied = width - self.w(wrapper).width;
        let changes = WindowChanges {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        };
        self.configure_idx(wrapper, &changes);
        if left && applied != 0 {
            let x = self.w(idx).x - applied;
            self.configure_idx(
                idx,
                &WindowChanges {
                    x: Some(x),
                    ..Default::default()
                },
            );
        }
        self.sync_frame_size(idx);
    }
}
