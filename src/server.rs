//! The server: global state, the background thread and the lock discipline.
//!
//! All window-tree, GC, pixmap and surface state lives in one
//! [`ServerState`] behind a single mutex. Every request is a scoped critical
//! section: the lock is taken, the state is mutated, the resulting
//! exposures are painted, notifications are queued on the displays (taking
//! their locks while the global lock is held) and the lock is released.

mod draw;
mod input;
mod requests;

pub use draw::DrawError;
use {
    crate::{
        config::{ConfigError, ServerConfig},
        display::{Display, DisplayId, DisplayIds, EventQueue, Screen},
        drawable::{Pixmap, PixmapId, PixmapIds},
        gc::{Gc, GcId, GcIds},
        input::{InputSource, NativeInput},
        render::{BoxFont, FontService, Presenter, Rasterizer, SoftRasterizer, Surface},
        server::input::{Grab, PointerState},
        timer::FrameTimer,
        tree::WindowTree,
        utils::errorfmt::ErrorFmt,
    },
    ahash::AHashMap,
    parking_lot::{Condvar, Mutex, MutexGuard},
    std::{
        io,
        sync::{
            Arc,
            atomic::{AtomicBool, Ordering::Relaxed},
        },
        thread::{self, JoinHandle},
        time::Instant,
    },
    thiserror::Error,
};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not spawn the server thread")]
    Spawn(#[source] io::Error),
    #[error("The configuration is invalid")]
    Config(#[from] ConfigError),
    #[error("The server has been shut down")]
    Shutdown,
}

/// The external collaborators of the server.
pub struct Backends {
    pub rasterizer: Box<dyn Rasterizer>,
    pub fonts: Box<dyn FontService>,
    pub presenter: Box<dyn Presenter>,
    pub input: Arc<dyn InputSource>,
}

impl Backends {
    /// Software rendering, box glyphs and no presentation.
    pub fn headless(input: Arc<dyn InputSource>) -> Self {
        Self {
            rasterizer: Box::new(SoftRasterizer),
            fonts: Box::new(BoxFont),
            presenter: Box::new(|_: &Surface, _: &crate::rect::Region| ()),
            input,
        }
    }
}

pub(crate) struct ServerState {
    pub tree: WindowTree,
    pub gcs: AHashMap<GcId, Gc>,
    pub gc_ids: GcIds,
    pub pixmaps: AHashMap<PixmapId, Pixmap>,
    pub pixmap_ids: PixmapIds,
    pub surface: Surface,
    pub displays: AHashMap<DisplayId, Arc<EventQueue>>,
    pub rasterizer: Box<dyn Rasterizer>,
    pub fonts: Box<dyn FontService>,
    presenter: Box<dyn Presenter>,
    pub pointer: PointerState,
    pub grab: Option<Grab>,
    pub config: ServerConfig,
    timer: FrameTimer,
    start: Instant,
    /// Completed iterations of the server thread.
    cycles: u64,
    running: bool,
}

impl ServerState {
    fn update_time(&mut self) {
        let ms = self.start.elapsed().as_millis() as u32;
        self.tree.set_time(ms);
    }

    /// Paints pending exposures and hands queued notifications to their
    /// displays.
    pub fn flush(&mut self) {
        for exposure in self.tree.take_exposures() {
            self.paint_exposure(exposure.window, &exposure.region);
            self.tree.pool.release(exposure.region);
        }
        for notification in self.tree.take_notifications() {
            match self.displays.get(&notification.display) {
                Some(queue) => queue.enqueue(notification),
                None => log::trace!("Dropping event for closed display {}", notification.display),
            }
        }
    }

    fn present(&mut self) {
        if !self.surface.is_damaged() {
            return;
        }
        let damage = self.surface.take_damage(&mut self.tree.pool);
        self.presenter.present(&self.surface, &damage);
        self.tree.pool.release(damage);
    }

    pub fn resize_screen(&mut self, width: i32, height: i32) {
        log::info!("Resizing the screen to {}x{}", width, height);
        self.surface.resize(&mut self.tree.pool, width, height);
        self.tree.resize_root(width, height);
    }

    fn close_displays(&mut self) {
        for (_, queue) in self.displays.drain() {
            queue.close();
        }
    }
}

pub(crate) struct Shared {
    state: Mutex<ServerState>,
    cond: Condvar,
    input: Arc<dyn InputSource>,
    stop: AtomicBool,
    display_ids: DisplayIds,
}

impl Shared {
    pub fn lock(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock()
    }

    /// Runs `f` under the global lock and flushes its side effects before
    /// the lock is released.
    pub fn with_state<T>(&self, f: impl FnOnce(&mut ServerState) -> T) -> T {
        let mut state = self.lock();
        state.update_time();
        let res = f(&mut state);
        state.flush();
        res
    }

    /// Asks the server thread to process pending native input now.
    pub fn request_pump(&self) {
        self.input.wake();
    }

    /// Blocks until the server thread has completed one iteration after
    /// this call, so that input sent before the call has been translated.
    pub fn sync(&self) {
        let mut state = self.lock();
        let cycles = state.cycles;
        self.request_pump();
        while state.running && state.cycles <= cycles + 1 {
            self.cond.wait(&mut state);
        }
    }

    pub fn close_display(&self, id: DisplayId) {
        let mut state = self.lock();
        if let Some(queue) = state.displays.remove(&id) {
            queue.close();
            log::debug!("Display {} closed", id);
        }
        state.tree.forget_display(id);
    }
}

/// An in-process window server.
pub struct Server {
    shared: Arc<Shared>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Server {
    pub fn new(config: ServerConfig, backends: Backends) -> Result<Self, ServerError> {
        config.validate()?;
        let now = Instant::now();
        let mut tree = WindowTree::new(&config);
        let surface = Surface::new(&mut tree.pool, config.width, config.height);
        let mut state = ServerState {
            tree,
            gcs: Default::default(),
            gc_ids: Default::default(),
            pixmaps: Default::default(),
            pixmap_ids: Default::default(),
            surface,
            displays: Default::default(),
            rasterizer: backends.rasterizer,
            fonts: backends.fonts,
            presenter: backends.presenter,
            pointer: Default::default(),
            grab: None,
            timer: FrameTimer::new(config.refresh_interval(), now),
            config,
            start: now,
            cycles: 0,
            running: true,
        };
        state.flush();
        let shared = Arc::new(Shared {
            state: Mutex::new(state),
            cond: Condvar::new(),
            input: backends.input,
            stop: AtomicBool::new(false),
            display_ids: Default::default(),
        });
        let thread = thread::Builder::new()
            .name("xvirt-server".to_string())
            .spawn({
                let shared = shared.clone();
                move || run(shared)
            })
            .map_err(ServerError::Spawn)?;
        log::info!("Server started");
        Ok(Self {
            shared,
            thread: Mutex::new(Some(thread)),
        })
    }

    /// Opens a new client connection.
    pub fn open_display(&self) -> Result<Display, ServerError> {
        let mut state = self.shared.lock();
        if !state.running {
            return Err(ServerError::Shutdown);
        }
        let id = self.shared.display_ids.next();
        let queue = Arc::new(EventQueue::new(id, state.config.wake_batch));
        state.displays.insert(id, queue.clone());
        let screen = Screen::new(
            state.tree.root(),
            state.surface.width(),
            state.surface.height(),
            state.config.depth,
            state.config.dpi,
        );
        log::debug!("Display {} opened", id);
        drop(state);
        Ok(Display::new(self.shared.clone(), queue, screen))
    }

    /// Resizes the root window and the surface and re-applies fullscreen
    /// geometry.
    pub fn resize_screen(&self, width: i32, height: i32) {
        self.shared.with_state(|s| s.resize_screen(width, height));
    }

    /// Runs `f` with the composited surface while holding the global lock.
    pub fn with_surface<T>(&self, f: impl FnOnce(&Surface) -> T) -> T {
        let state = self.shared.lock();
        f(&state.surface)
    }

    /// Waits until the server thread has processed all input sent before
    /// this call.
    pub fn sync(&self) {
        self.shared.sync();
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock().running
    }

    /// Stops the server thread and closes every display. Consumers blocked
    /// in [`Display::next_event`] return `None` once their queues are
    /// drained.
    pub fn shutdown(&self) {
        self.shared.stop.store(true, Relaxed);
        self.shared.input.wake();
        {
            let mut state = self.shared.lock();
            state.running = false;
            state.close_displays();
            self.shared.cond.notify_all();
        }
        if let Some(thread) = self.thread.lock().take() {
            if thread.join().is_err() {
                log::error!("The server thread panicked");
            }
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run(shared: Arc<Shared>) {
    let mut inputs = vec![];
    while !shared.stop.load(Relaxed) {
        let timeout = shared.lock().timer.timeout(Instant::now());
        shared.input.wait(timeout, &mut inputs);
        if shared.stop.load(Relaxed) {
            break;
        }
        let mut state = shared.lock();
        state.update_time();
        for input in inputs.drain(..) {
            if input == NativeInput::Quit {
                log::info!("Received quit request");
                shared.stop.store(true, Relaxed);
                break;
            }
            state.handle_input(input);
        }
        if state.timer.poll(Instant::now()) {
            state.present();
        }
        state.flush();
        state.cycles += 1;
        shared.cond.notify_all();
    }
    let mut state = shared.lock();
    state.running = false;
    state.close_displays();
    shared.cond.notify_all();
    log::info!("Server thread stopped");
}

pub(crate) fn log_draw_error(e: &DrawError) {
    log::debug!("Draw request failed: {}", ErrorFmt(e));
}
