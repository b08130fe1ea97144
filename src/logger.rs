#[cfg(test)]
mod tests;

use {
    backtrace::Backtrace,
    log::{Level, Log, Metadata, Record},
    parking_lot::Mutex,
    std::{
        cell::RefCell,
        io::Write,
        sync::{
            Arc, OnceLock,
            atomic::{AtomicU32, Ordering::Relaxed},
        },
        time::SystemTime,
    },
};

thread_local! {
    static BUFFER: RefCell<Vec<u8>> = const { RefCell::new(Vec::new()) };
}

static LOGGER: OnceLock<Arc<Logger>> = OnceLock::new();

pub struct Logger {
    level: AtomicU32,
    sink: Mutex<Box<dyn Write + Send>>,
}

impl Logger {
    /// Installs a logger that writes to stderr.
    ///
    /// If a logger has already been installed by this module, it is returned
    /// unchanged apart from its level.
    pub fn install_stderr(level: Level) -> Arc<Self> {
        Self::install(level, Box::new(std::io::stderr()))
    }

    pub fn install(level: Level, sink: Box<dyn Write + Send>) -> Arc<Self> {
        let mut created = false;
        let slf = LOGGER
            .get_or_init(|| {
                created = true;
                Arc::new(Self {
                    level: AtomicU32::new(level as _),
                    sink: Mutex::new(sink),
                })
            })
            .clone();
        if created {
            let res = log::set_boxed_logger(Box::new(LogWrapper {
                logger: slf.clone(),
            }));
            if res.is_err() {
                eprintln!("Another logger has already been installed");
            }
        }
        slf.set_level(level);
        slf
    }

    /// Routes panics through the logger, including a backtrace.
    pub fn install_panic_hook() {
        std::panic::set_hook(Box::new(|p| {
            let thread = std::thread::current();
            let name = thread.name().unwrap_or("<unnamed>");
            if let Some(loc) = p.location() {
                log::error!(
                    "Panic in thread {} at {} line {} column {}",
                    name,
                    loc.file(),
                    loc.line(),
                    loc.column()
                );
            } else {
                log::error!("Panic in thread {} at unknown location", name);
            }
            if let Some(msg) = p.payload().downcast_ref::<&str>() {
                log::error!("Message: {}", msg);
            }
            if let Some(msg) = p.payload().downcast_ref::<String>() {
                log::error!("Message: {}", msg);
            }
            log::error!("Backtrace:\n{:?}", Backtrace::new());
        }));
    }

    pub fn set_level(&self, level: Level) {
        self.level.store(level as _, Relaxed);
        log::set_max_level(level.to_level_filter());
    }
}

struct LogWrapper {
    logger: Arc<Logger>,
}

impl Log for LogWrapper {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() as u32 <= self.logger.level.load(Relaxed)
    }

    fn log(&self, record: &Record) {
        if record.level() as u32 > self.logger.level.load(Relaxed) {
            return;
        }
        BUFFER.with_borrow_mut(|buffer| {
            buffer.clear();
            let now = SystemTime::now();
            let _ = if let Some(mp) = record.module_path() {
                writeln!(
                    buffer,
                    "[{} {:5} {}] {}",
                    humantime::format_rfc3339_millis(now),
                    record.level(),
                    mp,
                    record.args(),
                )
            } else {
                writeln!(
                    buffer,
                    "[{} {:5}] {}",
                    humantime::format_rfc3339_millis(now),
                    record.level(),
                    record.args(),
                )
            };
            let _ = self.logger.sink.lock().write_all(buffer);
        });
    }

    fn flush(&self) {
        let _ = self.logger.sink.lock().flush();
    }
}
