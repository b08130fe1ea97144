use {
    crate::logger::{LogWrapper, Logger},
    log::{Level, Log, Metadata, Record},
    parking_lot::Mutex,
    std::{
        io::{self, Write},
        sync::{Arc, atomic::AtomicU32},
    },
};

#[derive(Clone, Default)]
struct Sink(Arc<Mutex<Vec<u8>>>);

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn wrapper(level: Level) -> (LogWrapper, Sink) {
    let sink = Sink::default();
    let logger = Arc::new(Logger {
        level: AtomicU32::new(level as _),
        sink: Mutex::new(Box::new(sink.clone())),
    });
    (LogWrapper { logger }, sink)
}

#[test]
fn records_are_prefixed() {
    let (wrapper, sink) = wrapper(Level::Info);
    wrapper.log(
        &Record::builder()
            .args(format_args!("mapped {}", 3))
            .level(Level::Info)
            .module_path(Some("xvirt::tree"))
            .build(),
    );
    let out = String::from_utf8(sink.0.lock().clone()).unwrap();
    assert!(out.starts_with('['));
    assert!(out.ends_with("INFO  xvirt::tree] mapped 3\n"), "{out}");
}

#[test]
fn records_below_the_level_are_dropped() {
    let (wrapper, sink) = wrapper(Level::Info);
    assert!(!wrapper.enabled(&Metadata::builder().level(Level::Debug).build()));
    wrapper.log(&Record::builder().args(format_args!("noise")).level(Level::Debug).build());
    assert!(sink.0.lock().is_empty());
    wrapper.logger.set_level(Level::Trace);
    wrapper.log(&Record::builder().args(format_args!("noise")).level(Level::Debug).build());
    let out = String::from_utf8(sink.0.lock().clone()).unwrap();
    assert!(out.ends_with("DEBUG] noise\n"), "{out}");
}
