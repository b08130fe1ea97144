#[cfg(test)]
mod tests;

use {
    crate::{
        event::{Event, EventKind},
        server::Shared,
        tree::{Notification, WindowId},
    },
    parking_lot::{Condvar, Mutex},
    std::{
        collections::VecDeque,
        sync::{
            Arc,
            atomic::{AtomicU64, Ordering::Relaxed},
        },
    },
};

linear_ids!(DisplayIds, DisplayId, u64);

/// Geometry of the composited surface as seen by a display.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Screen {
    pub root: WindowId,
    pub width: i32,
    pub height: i32,
    pub width_mm: i32,
    pub height_mm: i32,
    pub depth: u8,
}

impl Screen {
    pub(crate) fn new(root: WindowId, width: i32, height: i32, depth: u8, dpi: u32) -> Self {
        let mm = |px: i32| (px as i64 * 254 / (dpi.max(1) as i64 * 10)) as i32;
        Self {
            root,
            width,
            height,
            width_mm: mm(width),
            height_mm: mm(height),
            depth,
        }
    }
}

#[derive(Default)]
struct QueueState {
    events: VecDeque<Event>,
    /// The consumer has been signaled and has not waited since.
    wake_pending: bool,
    since_wake: usize,
    signals: u64,
    closed: bool,
}

/// The event FIFO of one display.
///
/// Producers append under the queue's own lock, which may be taken while the
/// server's global lock is held. The consumer never needs the global lock to
/// dequeue.
pub(crate) struct EventQueue {
    pub id: DisplayId,
    state: Mutex<QueueState>,
    wake: Condvar,
    requests: AtomicU64,
    wake_batch: usize,
}

impl EventQueue {
    pub fn new(id: DisplayId, wake_batch: usize) -> Self {
        Self {
            id,
            state: Default::default(),
            wake: Condvar::new(),
            requests: AtomicU64::new(0),
            wake_batch: wake_batch.max(1),
        }
    }

    /// Increments the request counter and returns the new value.
    pub fn bump_request(&self) -> u64 {
        self.requests.fetch_add(1, Relaxed) + 1
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Relaxed)
    }

    pub fn enqueue(&self, notification: Notification) {
        let event = Event {
            serial: self.requests(),
            send_event: notification.send_event,
            window: notification.window,
            kind: notification.kind,
        };
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        let batching = matches!(event.kind, EventKind::Expose { count, .. } if count > 0);
        state.events.push_back(event);
        state.since_wake += 1;
        if batching {
            return;
        }
        if !state.wake_pending || state.since_wake >= self.wake_batch {
            state.wake_pending = true;
            state.since_wake = 0;
            state.signals += 1;
            self.wake.notify_all();
        }
    }

    pub fn poll(&self) -> Option<Event> {
        self.state.lock().events.pop_front()
    }

    pub fn peek(&self) -> Option<Event> {
        self.state.lock().events.front().cloned()
    }

    pub fn pending(&self) -> usize {
        self.state.lock().events.len()
    }

    /// Blocks until an event is available or the queue is closed and
    /// drained. `nudge` is called before every wait.
    pub fn next(&self, nudge: impl Fn()) -> Option<Event> {
        let mut state = self.state.lock();
        loop {
            if let Some(event) = state.events.pop_front() {
                return Some(event);
            }
            if state.closed {
                return None;
            }
            state.wake_pending = false;
            state.since_wake = 0;
            nudge();
            self.wake.wait(&mut state);
        }
    }

    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        self.wake.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    #[cfg(test)]
    pub fn signals(&self) -> u64 {
        self.state.lock().signals
    }
}

/// One client connection to the server.
///
/// Requests take the server's global lock internally. Events are read with
/// [`Display::next_event`] and friends, which only take the display's own
/// lock.
pub struct Display {
    pub(crate) server: Arc<Shared>,
    pub(crate) queue: Arc<EventQueue>,
    screen: Screen,
}

impl Display {
    pub(crate) fn new(server: Arc<Shared>, queue: Arc<EventQueue>, screen: Screen) -> Self {
        Self {
            server,
            queue,
            screen,
        }
    }

    pub fn id(&self) -> DisplayId {
        self.queue.id
    }

    /// The screen as it was when the display was opened.
    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn root(&self) -> WindowId {
        self.screen.root
    }

    /// The number of requests made through this display.
    pub fn request_count(&self) -> u64 {
        self.queue.requests()
    }

    /// Blocks until an event arrives. Returns `None` once the display has
    /// been closed and all queued events have been consumed.
    pub fn next_event(&self) -> Option<Event> {
        self.queue.next(|| self.server.request_pump())
    }

    pub fn poll_event(&self) -> Option<Event> {
        self.queue.poll()
    }

    pub fn peek_event(&self) -> Option<Event> {
        self.queue.peek()
    }

    pub fn pending(&self) -> usize {
        self.queue.pending()
    }

    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }
}

impl Drop for Display {
    fn drop(&mut self) {
        self.server.close_display(self.queue.id);
    }
}
