use {
    crate::{
        config::ServerConfig,
        display::{DisplayId, EventQueue, Screen},
        event::EventKind,
        rect::Rect,
        tree::{Notification, WindowId, WindowTree},
    },
    std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering::Relaxed},
        },
        thread,
        time::Duration,
    },
};

fn root() -> WindowId {
    WindowTree::new(&ServerConfig::default()).root()
}

fn notification(window: WindowId, kind: EventKind) -> Notification {
    Notification {
        display: DisplayId::from_raw(1),
        window,
        send_event: false,
        kind,
    }
}

fn map(window: WindowId) -> Notification {
    notification(
        window,
        EventKind::MapNotify {
            window,
            override_redirect: false,
        },
    )
}

fn expose(window: WindowId, count: u32) -> Notification {
    notification(
        window,
        EventKind::Expose {
            rect: Rect::new_sized(0, 0, 1, 1),
            count,
        },
    )
}

#[test]
fn fifo_with_serials() {
    let root = root();
    let queue = EventQueue::new(DisplayId::from_raw(1), 64);
    queue.enqueue(map(root));
    assert_eq!(queue.bump_request(), 1);
    assert_eq!(queue.bump_request(), 2);
    queue.enqueue(expose(root, 0));
    assert_eq!(queue.pending(), 2);
    let peeked = queue.peek().unwrap();
    let first = queue.poll().unwrap();
    assert_eq!(peeked, first);
    assert_eq!(first.serial, 0);
    assert!(matches!(first.kind, EventKind::MapNotify { .. }));
    let second = queue.poll().unwrap();
    assert_eq!(second.serial, 2);
    assert_eq!(second.kind.expose_count(), Some(0));
    assert!(queue.poll().is_none());
}

#[test]
fn expose_batches_signal_once() {
    let root = root();
    let queue = EventQueue::new(DisplayId::from_raw(1), 64);
    queue.enqueue(expose(root, 2));
    queue.enqueue(expose(root, 1));
    assert_eq!(queue.signals(), 0);
    queue.enqueue(expose(root, 0));
    assert_eq!(queue.signals(), 1);
    assert_eq!(queue.pending(), 3);
}

#[test]
fn wakes_are_coalesced() {
    let root = root();
    let queue = EventQueue::new(DisplayId::from_raw(1), 64);
    for _ in 0..10 {
        queue.enqueue(map(root));
    }
    assert_eq!(queue.signals(), 1);

    let queue = EventQueue::new(DisplayId::from_raw(1), 2);
    for _ in 0..3 {
        queue.enqueue(map(root));
    }
    assert_eq!(queue.signals(), 2);
}

#[test]
fn closed_queue_drains_then_ends() {
    let root = root();
    let queue = EventQueue::new(DisplayId::from_raw(1), 64);
    queue.enqueue(map(root));
    queue.close();
    queue.enqueue(map(root));
    assert!(queue.is_closed());
    assert!(queue.next(|| ()).is_some());
    assert!(queue.next(|| ()).is_none());
}

#[test]
fn next_blocks_until_enqueue() {
    let root = root();
    let queue = Arc::new(EventQueue::new(DisplayId::from_raw(1), 64));
    let nudges = Arc::new(AtomicUsize::new(0));
    let consumer = thread::spawn({
        let queue = queue.clone();
        let nudges = nudges.clone();
        move || {
            queue.next(|| {
                nudges.fetch_add(1, Relaxed);
            })
        }
    });
    while nudges.load(Relaxed) == 0 {
        thread::sleep(Duration::from_millis(1));
    }
    queue.enqueue(map(root));
    let event = consumer.join().unwrap().unwrap();
    assert_eq!(event.window, root);
}

#[test]
fn screen_size_in_millimeters() {
    let screen = Screen::new(root(), 960, 480, 24, 96);
    assert_eq!((screen.width_mm, screen.height_mm), (254, 127));
}
