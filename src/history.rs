/// Browser history seam. The URL is the single source of truth for
/// navigation state: the current scene and sub-section are derived from
/// `path()`/`hash()` on every read, never cached beside them.
pub trait History {
    fn path(&self) -> String;
    fn hash(&self) -> String;
    /// Push a new entry without reloading (History API `pushState`).
    fn push(&mut self, path: &str, hash: &str);
}

/// In-memory history with a back stack, used headless and in tests to
/// simulate `popstate`.
#[derive(Clone, Debug)]
pub struct MemoryHistory {
    entries: Vec<(String, String)>,
    cursor: usize,
}

impl MemoryHistory {
    pub fn new(path: &str, hash: &str) -> Self {
        Self {
            entries: vec![(path.to_string(), hash.to_string())],
            cursor: 0,
        }
    }

    /// Step back one entry, like the browser back button. Returns false at
    /// the start of the stack.
    pub fn back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    /// Step forward after `back`. Returns false at the end of the stack.
    pub fn forward(&mut self) -> bool {
        if self.cursor + 1 >= self.entries.len() {
            return false;
        }
        self.cursor += 1;
        true
    }
}

impl History for MemoryHistory {
    fn path(&self) -> String {
        self.entries[self.cursor].0.clone()
    }

    fn hash(&self) -> String {
        self.entries[self.cursor].1.clone()
    }

    fn push(&mut self, path: &str, hash: &str) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push((path.to_string(), hash.to_string()));
        self.cursor += 1;
    }
}
