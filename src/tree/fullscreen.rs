use crate::tree::{FrameState, SavedGeometry, StackMode, WindowChanges, WindowId, WindowTree};

impl WindowTree {
    /// Makes a top-level window cover the whole screen or restores its
    /// previous geometry.
    ///
    /// For framed windows the frame is moved so that its decorations lie
    /// outside of the screen.
    pub fn set_fullscreen(&mut self, id: WindowId, fullscreen: bool) {
        let Some(mut idx) = self.idx(id) else {
            return;
        };
        if let Some(wrapper) = self.w(idx).frame_of {
            idx = wrapper;
        }
        if self.w(idx).fullscreen == fullscreen {
            return;
        }
        let frame = match self.w(idx).frame {
            FrameState::Framed(frame) => Some(frame),
            _ => None,
        };
        let top = frame.unwrap_or(idx);
        if self.w(top).parent != Some(self.root) {
            log::debug!("set_fullscreen: {} is not a top-level window", id);
            return;
        }
        if fullscreen {
            for i in [Some(idx), frame].into_iter().flatten() {
                let w = self.w_mut(i);
                w.saved_geometry = Some(SavedGeometry {
                    x: w.x,
                    y: w.y,
                    width: w.width,
                    height: w.height,
                    border_width: w.border_width,
                });
                w.fullscreen = true;
            }
            self.apply_fullscreen(idx);
            log::debug!("{} is now fullscreen", id);
        } else {
            for i in [Some(idx), frame].into_iter().flatten() {
                let w = self.w_mut(i);
                w.fullscreen = false;
                if let Some(saved) = w.saved_geometry.take() {
                    let changes = WindowChanges {
                        x: Some(saved.x),
                        y: Some(saved.y),
                        width: Some(saved.width),
                        height: Some(saved.height),
                        border_width: Some(saved.border_width),
                        ..Default::default()
                    };
                    self.configure_idx(i, &changes);
                }
            }
            log::debug!("{} is no longer fullscreen", id);
        }
    }

    pub fn is_fullscreen(&self, id: WindowId) -> bool {
        self.window(id).is_some_and(|w| w.fullscreen)
    }

    /// Moves the fullscreen window `idx` (and its frame) to cover the screen
    /// and raises it.
    fn apply_fullscreen(&mut self, idx: u32) {
        let screen = self.screen_rect();
        let (width, height) = (screen.width(), screen.height());
        let fw = self.frame_width;
        let th = self.title_height;
        match self.w(idx).frame {
            FrameState::Framed(frame) => {
                let inner = WindowChanges {
                    x: Some(fw),
                    y: Some(th),
                    width: Some(width),
                    height: Some(height),
                    border_width: Some(0),
                    ..Default::default()
                };
                self.configure_idx(idx, &inner);
                let outer = WindowChanges {
                    x: Some(-fw),
                    y: Some(-th),
                    width: Some(width + 2 * fw),
                    height: Some(height + fw + th),
                    stack_mode: Some(StackMode::Above),
                    ..Default::default()
                };
                self.configure_idx(frame, &outer);
            }
            _ => {
                let changes = WindowChanges {
                    x: Some(0),
                    y: Some(0),
                    width: Some(width),
                    height: Some(height),
                    border_width: Some(0),
                    stack_mode: Some(StackMode::Above),
                    ..Default::default()
                };
                self.configure_idx(idx, &changes);
            }
        }
    }

    /// Re-applies the fullscreen geometry of every flagged window, for
    /// example after the root window changed size.
    pub(super) fn refullscreen_all(&mut self) {
        let flagged: Vec<u32> = self
            .children(self.root)
            .map(|c| self.w(c).frame_of.unwrap_or(c))
            .filter(|&c| self.w(c).fullscreen)
            .collect();
        for idx in flagged {
            self.apply_fullscreen(idx);
        }
    }
}
