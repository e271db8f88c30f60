//! Terminal caption output

use std::collections::HashSet;
use std::io::Write;
use std::sync::{Arc, Mutex};

use atc_core::{Caption, CaptionSink};
use tracing::debug;

/// Prints captions to a writer, one line each
///
/// A repeating broadcast is printed once, until its source clears it. Clones
/// share the writer and the broadcast set.
#[derive(Clone)]
pub struct TerminalCaptions {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
    showing: Arc<Mutex<HashSet<String>>>,
}

impl TerminalCaptions {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Arc::new(Mutex::new(out)),
            showing: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    fn write_line(&self, line: &str) {
        if let Ok(mut out) = self.out.lock() {
            if let Err(e) = writeln!(out, "{}", line) {
                debug!("Caption write failed: {}", e);
            }
        }
    }
}

impl CaptionSink for TerminalCaptions {
    fn show(&mut self, caption: &Caption) {
        if caption.repeating {
            let key = format!("{}:{}", caption.source, caption.text);
            let fresh = self
                .showing
                .lock()
                .map(|mut showing| showing.insert(key))
                .unwrap_or(true);
            if !fresh {
                return;
            }
            self.write_line(&format!("[{} broadcast] {}", caption.source, caption.text));
        } else {
            self.write_line(&format!("[{}] {}", caption.source, caption.text));
        }
    }

    fn clear(&mut self, source: &str) {
        if let Ok(mut showing) = self.showing.lock() {
            let prefix = format!("{}:", source);
            showing.retain(|key| !key.starts_with(&prefix));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Writer that appends into shared memory
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn caption(text: &str, repeating: bool) -> Caption {
        Caption {
            source: "KSFO".into(),
            text: text.into(),
            repeating,
        }
    }

    #[test]
    fn test_dialogue_printed_every_time() {
        let buf = SharedBuf::default();
        let mut sink = TerminalCaptions::new(Box::new(buf.clone()));
        sink.show(&caption("roger", false));
        sink.show(&caption("roger", false));
        assert_eq!(buf.text(), "[KSFO] roger\n[KSFO] roger\n");
    }

    #[test]
    fn test_broadcast_printed_until_cleared() {
        let buf = SharedBuf::default();
        let mut sink = TerminalCaptions::new(Box::new(buf.clone()));
        sink.show(&caption("information Alpha", true));
        sink.show(&caption("information Alpha", true));
        sink.show(&caption("information Bravo", true));
        sink.clear("KSFO");
        sink.show(&caption("information Bravo", true));
        assert_eq!(
            buf.text(),
            "[KSFO broadcast] information Alpha\n\
             [KSFO broadcast] information Bravo\n\
             [KSFO broadcast] information Bravo\n"
        );
    }
}
