use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::Mutex;

use crate::trace::trace::RoundTraceEvent;

/// JSONL sink for round events. `None` means tracing is off, either because
/// no path was configured or because the file could not be opened.
pub struct TraceLogger {
    sink: Option<(String, Mutex<File>)>,
}

impl TraceLogger {
    /// Open `path` for appending. A failure to open only warns.
    pub fn new(path: Option<&str>) -> Self {
        let sink = path.and_then(|p| match OpenOptions::new().create(true).append(true).open(p) {
            Ok(file) => Some((p.to_string(), Mutex::new(file))),
            Err(e) => {
                eprintln!("Warning: could not open trace file '{}': {}", p, e);
                None
            }
        });
        TraceLogger { sink }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Append one event. Write problems are reported, never returned.
    pub fn log(&self, event: &RoundTraceEvent) {
        let Some((path, file)) = &self.sink else {
            return;
        };

        let result = match file.lock() {
            Ok(mut file) => serde_json::to_writer(&mut *file, event)
                .map_err(|e| e.to_string())
                .and_then(|_| writeln!(file).map_err(|e| e.to_string())),
            Err(e) => Err(format!("lock poisoned: {}", e)),
        };

        if let Err(e) = result {
            eprintln!("Warning: dropped round {} trace event for '{}': {}", event.round, path, e);
        }
    }
}
