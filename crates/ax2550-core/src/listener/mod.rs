//! Serial listener
//!
//! Reads the controller's byte stream on a background thread, splits it
//! into `\r`-terminated tokens and hands each token to every live filter
//! whose matcher accepts it.

mod filter;
mod matcher;

pub use filter::{BufferedFilter, CallbackFilter};
pub use matcher::TokenMatcher;

use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::protocol::{Ax2550Error, Transport, TERMINATOR};
use filter::{lock, TokenSink};

type FilterList = Arc<Mutex<Vec<Weak<dyn TokenSink>>>>;

/// Splits raw bytes into tokens
#[derive(Debug, Default)]
pub(crate) struct Tokenizer {
    pending: Vec<u8>,
}

impl Tokenizer {
    /// Feed bytes and collect every completed, non-empty token
    pub(crate) fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut tokens = Vec::new();
        for &byte in bytes {
            match byte {
                b'\n' => {}
                b if b == TERMINATOR as u8 => {
                    if !self.pending.is_empty() {
                        tokens.push(String::from_utf8_lossy(&self.pending).into_owned());
                        self.pending.clear();
                    }
                }
                b => self.pending.push(b),
            }
        }
        tokens
    }
}

/// Background token reader with pattern subscriptions
pub struct SerialListener {
    filters: FilterList,
    running: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl SerialListener {
    pub fn new() -> Self {
        Self {
            filters: Arc::new(Mutex::new(Vec::new())),
            running: Arc::new(AtomicBool::new(false)),
            reader: None,
        }
    }

    /// Subscribe a queue to tokens accepted by `matcher`
    pub fn buffered_filter(&self, matcher: TokenMatcher) -> BufferedFilter {
        let filter = BufferedFilter::new(matcher);
        self.register(filter.sink());
        filter
    }

    /// Subscribe a callback to tokens accepted by `matcher`.
    ///
    /// The callback runs on the reader thread.
    pub fn callback_filter<F>(&self, matcher: TokenMatcher, callback: F) -> CallbackFilter
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let filter = CallbackFilter::new(matcher, callback);
        self.register(filter.sink());
        filter
    }

    fn register(&self, sink: Arc<dyn TokenSink>) {
        let mut filters = lock(&self.filters);
        filters.retain(|f| f.strong_count() > 0);
        filters.push(Arc::downgrade(&sink));
    }

    /// Number of filters whose handles are still alive
    pub fn filter_count(&self) -> usize {
        lock(&self.filters)
            .iter()
            .filter(|f| f.strong_count() > 0)
            .count()
    }

    pub fn is_listening(&self) -> bool {
        self.reader.is_some()
    }

    /// Start reading tokens from `transport` on a background thread
    pub fn start(&mut self, transport: Box<dyn Transport>) -> Result<(), Ax2550Error> {
        if self.reader.is_some() {
            return Err(Ax2550Error::Connection(
                "listener is already running".to_string(),
            ));
        }

        self.running.store(true, Ordering::Release);
        let filters = self.filters.clone();
        let running = self.running.clone();
        let handle = thread::Builder::new()
            .name("ax2550-listener".to_string())
            .spawn(move || read_loop(transport, filters, running))?;
        self.reader = Some(handle);

        Ok(())
    }

    /// Stop the reader thread and drop every subscription. Idempotent.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.reader.take() {
            if handle.join().is_err() {
                tracing::warn!("listener thread panicked");
            }
        }
        lock(&self.filters).clear();
    }

    #[cfg(test)]
    pub(crate) fn dispatch_for_test(&self, token: &str) {
        dispatch(&self.filters, token);
    }
}

impl Default for SerialListener {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SerialListener {
    fn drop(&mut self) {
        self.stop();
    }
}

fn dispatch(filters: &FilterList, token: &str) {
    // Snapshot so callbacks can subscribe without deadlocking
    let live: Vec<Arc<dyn TokenSink>> = {
        let mut filters = lock(filters);
        filters.retain(|f| f.strong_count() > 0);
        filters.iter().filter_map(|f| f.upgrade()).collect()
    };

    let mut matched = false;
    for sink in live {
        matched |= sink.offer(token);
    }

    if matched {
        tracing::debug!(token, "token dispatched");
    } else {
        tracing::trace!(token, "unmatched token discarded");
    }
}

fn read_loop(mut transport: Box<dyn Transport>, filters: FilterList, running: Arc<AtomicBool>) {
    let mut tokenizer = Tokenizer::default();
    let mut buffer = [0u8; 64];

    while running.load(Ordering::Acquire) {
        match transport.read(&mut buffer) {
            Ok(0) => thread::sleep(Duration::from_millis(1)),
            Ok(n) => {
                for token in tokenizer.feed(&buffer[..n]) {
                    dispatch(&filters, &token);
                }
            }
            Err(ref e)
                if matches!(
                    e.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) => {}
            Err(e) => {
                tracing::warn!("listener read error, stopping: {}", e);
                break;
            }
        }
    }
    tracing::debug!("listener thread exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::{self, Read, Write};
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_tokenizer_splits_on_carriage_return() {
        let mut t = Tokenizer::default();
        assert_eq!(t.feed(b"!A7F\r+\r"), vec!["!A7F", "+"]);
        assert_eq!(t.feed(b"FF"), Vec::<String>::new());
        assert_eq!(t.feed(b"80\r\n\r"), vec!["FF80"]);
    }

    #[test]
    fn test_dispatch_reaches_every_matching_filter() {
        let listener = SerialListener::new();
        let hex = listener.buffered_filter(TokenMatcher::HexLeading);
        let exact = listener.buffered_filter(TokenMatcher::exactly("A1"));
        let other = listener.buffered_filter(TokenMatcher::exactly("OK"));

        listener.dispatch_for_test("A1");

        assert_eq!(hex.count(), 1);
        assert_eq!(exact.count(), 1);
        assert_eq!(other.count(), 0);
    }

    #[test]
    fn test_dropped_filter_is_deregistered() {
        let listener = SerialListener::new();
        let keep = listener.buffered_filter(TokenMatcher::exactly("OK"));
        {
            let _echo = listener.buffered_filter(TokenMatcher::exactly("?q0"));
            assert_eq!(listener.filter_count(), 2);
        }
        assert_eq!(listener.filter_count(), 1);
        listener.dispatch_for_test("OK");
        assert_eq!(keep.count(), 1);
    }

    #[test]
    fn test_callback_may_subscribe_from_dispatch() {
        let listener = Arc::new(SerialListener::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let l = Arc::downgrade(&listener);
        let h = hits.clone();
        let _cb = listener.callback_filter(TokenMatcher::exactly("W"), move |_| {
            h.fetch_add(1, Ordering::SeqCst);
            if let Some(l) = l.upgrade() {
                drop(l.buffered_filter(TokenMatcher::exactly("x")));
            }
        });
        listener.dispatch_for_test("W");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    /// Replays a fixed byte script, then times out
    struct Scripted {
        data: Arc<Mutex<Vec<u8>>>,
    }

    impl Read for Scripted {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let mut data = lock(&self.data);
            if data.is_empty() {
                drop(data);
                thread::sleep(Duration::from_millis(5));
                return Err(io::Error::new(ErrorKind::TimedOut, "timeout"));
            }
            let n = buf.len().min(data.len());
            buf[..n].copy_from_slice(&data[..n]);
            data.drain(..n);
            Ok(n)
        }
    }

    impl Write for Scripted {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Transport for Scripted {
        fn try_clone_box(&self) -> io::Result<Box<dyn Transport>> {
            Ok(Box::new(Scripted {
                data: self.data.clone(),
            }))
        }
    }

    #[test]
    fn test_reader_thread_delivers_and_stops() {
        let mut listener = SerialListener::new();
        let ok = listener.buffered_filter(TokenMatcher::exactly("OK"));
        let transport = Scripted {
            data: Arc::new(Mutex::new(b"noise\rOK\r".to_vec())),
        };

        listener.start(Box::new(transport)).unwrap();
        assert!(listener.is_listening());
        assert_eq!(ok.wait(Duration::from_secs(2)).as_deref(), Some("OK"));

        listener.stop();
        listener.stop();
        assert!(!listener.is_listening());
        assert_eq!(listener.filter_count(), 0);
    }
}
