use {
    crate::event::ModifierState,
    parking_lot::{Condvar, Mutex},
    std::{collections::VecDeque, sync::Arc, time::Duration},
};

/// Input as delivered by the platform, in root coordinates.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NativeInput {
    Key {
        keycode: u32,
        keysym: u32,
        pressed: bool,
        state: ModifierState,
    },
    Button {
        button: u8,
        pressed: bool,
        x: i32,
        y: i32,
        state: ModifierState,
    },
    Motion {
        x: i32,
        y: i32,
        state: ModifierState,
    },
    /// The pointer left the platform window.
    PointerLeave,
    Resize {
        width: i32,
        height: i32,
    },
    Quit,
}

/// A platform event source polled by the server thread.
pub trait InputSource: Send + Sync {
    /// Waits up to `timeout` for input and appends everything available to
    /// `out`. Returns early when [`InputSource::wake`] is called.
    fn wait(&self, timeout: Duration, out: &mut Vec<NativeInput>);

    /// Interrupts a concurrent or the next call to `wait`.
    fn wake(&self);
}

#[derive(Default)]
struct ChannelState {
    queue: VecDeque<NativeInput>,
    woken: bool,
}

#[derive(Default)]
struct ChannelShared {
    state: Mutex<ChannelState>,
    cond: Condvar,
}

/// An in-process input source fed through [`InputSender`]s.
#[derive(Default)]
pub struct ChannelInput {
    shared: Arc<ChannelShared>,
}

/// Feeds a [`ChannelInput`]. Can be cloned and sent to other threads.
#[derive(Clone)]
pub struct InputSender {
    shared: Arc<ChannelShared>,
}

impl ChannelInput {
    pub fn new() -> (Self, InputSender) {
        let slf = Self::default();
        let sender = InputSender {
            shared: slf.shared.clone(),
        };
        (slf, sender)
    }
}

impl InputSender {
    pub fn send(&self, input: NativeInput) {
        self.shared.state.lock().queue.push_back(input);
        self.shared.cond.notify_all();
    }
}

impl InputSource for ChannelInput {
    fn wait(&self, timeout: Duration, out: &mut Vec<NativeInput>) {
        let mut state = self.shared.state.lock();
        if state.queue.is_empty() && !state.woken {
            self.shared.cond.wait_for(&mut state, timeout);
        }
        state.woken = false;
        out.extend(state.queue.drain(..));
    }

    fn wake(&self) {
        self.shared.state.lock().woken = true;
        self.shared.cond.notify_all();
    }
}
