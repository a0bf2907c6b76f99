use std::ops::Range;

/// Cursor and scroll origin for a list pane.
///
/// For a non-empty list of `len` rows the viewport keeps
/// `cursor < len` and `origin <= cursor < origin + height`. An empty list
/// pins both to zero. A height of zero (pane not drawn yet) behaves as one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    origin: usize,
    cursor: usize,
    height: usize,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Viewport {
    pub fn new(height: usize) -> Self {
        Self {
            origin: 0,
            cursor: 0,
            height: height.max(1),
        }
    }

    pub fn origin(&self) -> usize {
        self.origin
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn reset(&mut self) {
        self.origin = 0;
        self.cursor = 0;
    }

    /// Moves the cursor to `index` clamped to the list. Returns whether it moved.
    pub fn set_cursor(&mut self, index: usize, len: usize) -> bool {
        let previous = self.cursor;
        self.cursor = if len == 0 { 0 } else { index.min(len - 1) };
        self.scroll_to_cursor(len);
        self.cursor != previous
    }

    pub fn move_by(&mut self, delta: isize, len: usize) -> bool {
        let target = if delta.is_negative() {
            self.cursor.saturating_sub(delta.unsigned_abs())
        } else {
            self.cursor.saturating_add(delta as usize)
        };
        self.set_cursor(target, len)
    }

    /// Applies a new pane height and re-establishes cursor visibility.
    pub fn set_height(&mut self, height: usize, len: usize) {
        self.height = height.max(1);
        self.set_cursor(self.cursor, len);
    }

    /// Row indices currently on screen.
    pub fn visible_range(&self, len: usize) -> Range<usize> {
        let start = self.origin.min(len);
        let end = self.origin.saturating_add(self.height).min(len);
        start..end
    }

    fn scroll_to_cursor(&mut self, len: usize) {
        if len == 0 {
            self.origin = 0;
            return;
        }
        if self.cursor < self.origin {
            self.origin = self.cursor;
        } else if self.cursor >= self.origin + self.height {
            self.origin = self.cursor + 1 - self.height;
        }
        let max_origin = len.saturating_sub(self.height);
        self.origin = self.origin.min(max_origin);
    }
}
