use std::collections::VecDeque;

pub const DEFAULT_CAPACITY: usize = 100;

/// Bounded log of recent command reports, oldest dropped first.
#[derive(Debug, Clone)]
pub struct OutputBuffer {
    entries: VecDeque<String>,
    capacity: usize,
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl OutputBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    pub fn write(&mut self, entry: impl Into<String>) {
        self.entries.push_back(entry.into());
        self.trim();
    }

    /// Every entry, each followed by a blank line.
    pub fn read(&self) -> String {
        self.entries.iter().map(|e| format!("{e}\n\n")).collect()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.trim();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn trim(&mut self) {
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_the_newest_entries() {
        let mut buf = OutputBuffer::with_capacity(2);
        buf.write("a");
        buf.write("b");
        buf.write("c");
        assert_eq!(buf.read(), "b\n\nc\n\n");
    }

    #[test]
    fn shrinking_drops_oldest() {
        let mut buf = OutputBuffer::default();
        assert_eq!(buf.capacity(), DEFAULT_CAPACITY);
        for i in 0..5 {
            buf.write(i.to_string());
        }
        buf.set_capacity(1);
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.read(), "4\n\n");
    }
}
