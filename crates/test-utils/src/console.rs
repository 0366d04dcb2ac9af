use std::sync::{Arc, Mutex};

use rigdeploy::exec::ConsoleSink;

/// Console that keeps every emitted line in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryConsole {
    lines: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl MemoryConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw emitted lines, newline included.
    pub fn raw_lines(&self) -> Vec<Vec<u8>> {
        self.lines.lock().unwrap().clone()
    }

    /// Emitted lines as strings, trailing newline stripped.
    pub fn lines(&self) -> Vec<String> {
        self.raw_lines()
            .iter()
            .map(|l| {
                let s = String::from_utf8_lossy(l);
                s.strip_suffix('\n').unwrap_or(&*s).to_string()
            })
            .collect()
    }

    /// Lines carrying `prefix`, with the prefix removed.
    pub fn lines_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter_map(|l| l.strip_prefix(prefix).map(str::to_string))
            .collect()
    }
}

impl ConsoleSink for MemoryConsole {
    fn emit(&self, line: &[u8]) {
        self.lines.lock().unwrap().push(line.to_vec());
    }
}
