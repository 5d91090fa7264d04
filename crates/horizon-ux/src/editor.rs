//! Text buffer behind a widget's inline editor.
//!
//! [`EditorState`] models an `<input>`-like single line editor: text, a
//! selection (anchor + caret) and focus. Offsets are counted in `char`s;
//! deletion and caret movement step over whole grapheme clusters.

use unicode_segmentation::UnicodeSegmentation;

/// Single-line editor state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorState {
    text: String,
    /// Selection anchor (char offset).
    anchor: usize,
    /// Caret position (char offset). Equal to `anchor` when collapsed.
    caret: usize,
    focused: bool,
}

impl EditorState {
    /// Create an empty, unfocused editor.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the text is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Length of the text in chars.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Replace the text; the caret moves to the end.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        let end = self.char_len();
        self.anchor = end;
        self.caret = end;
    }

    /// Remove all text.
    pub fn clear(&mut self) {
        self.set_text(String::new());
    }

    /// The selected range as `(start, end)` char offsets, `start <= end`.
    pub fn selection(&self) -> (usize, usize) {
        (self.anchor.min(self.caret), self.anchor.max(self.caret))
    }

    /// The caret position.
    pub fn caret(&self) -> usize {
        self.caret
    }

    /// Whether a non-empty range is selected.
    pub fn has_selection(&self) -> bool {
        self.anchor != self.caret
    }

    /// Select `start..end` (clamped to the text).
    pub fn set_selection_range(&mut self, start: usize, end: usize) {
        let len = self.char_len();
        self.anchor = start.min(len);
        self.caret = end.min(len);
    }

    /// Select the whole text.
    pub fn select_all(&mut self) {
        self.anchor = 0;
        self.caret = self.char_len();
    }

    /// The text in front of the selection (or caret).
    pub fn text_left_of_selection(&self) -> String {
        let (start, _) = self.selection();
        self.text.chars().take(start).collect()
    }

    /// The selected text.
    pub fn selected_text(&self) -> String {
        let (start, end) = self.selection();
        self.text.chars().skip(start).take(end - start).collect()
    }

    /// Insert `input` at the caret, replacing the selection.
    pub fn insert_text(&mut self, input: &str) {
        let (start, end) = self.selection();
        self.replace_range(start, end, input);
        let caret = start + input.chars().count();
        self.anchor = caret;
        self.caret = caret;
    }

    /// Backspace: remove the selection, or the grapheme before the caret.
    pub fn delete_backward(&mut self) {
        if self.delete_selection() {
            return;
        }
        if let Some(previous) = self.previous_boundary(self.caret) {
            let caret = self.caret;
            self.replace_range(previous, caret, "");
            self.anchor = previous;
            self.caret = previous;
        }
    }

    /// Delete: remove the selection, or the grapheme after the caret.
    pub fn delete_forward(&mut self) {
        if self.delete_selection() {
            return;
        }
        if let Some(next) = self.next_boundary(self.caret) {
            let caret = self.caret;
            self.replace_range(caret, next, "");
        }
    }

    /// Move the caret one grapheme left, collapsing any selection to its start.
    pub fn move_left(&mut self) {
        let (start, _) = self.selection();
        let target = if self.has_selection() {
            start
        } else {
            self.previous_boundary(self.caret).unwrap_or(0)
        };
        self.anchor = target;
        self.caret = target;
    }

    /// Move the caret one grapheme right, collapsing any selection to its end.
    pub fn move_right(&mut self) {
        let (_, end) = self.selection();
        let target = if self.has_selection() {
            end
        } else {
            self.next_boundary(self.caret).unwrap_or(self.caret)
        };
        self.anchor = target;
        self.caret = target;
    }

    /// Move the caret to the start of the text.
    pub fn move_home(&mut self) {
        self.anchor = 0;
        self.caret = 0;
    }

    /// Move the caret to the end of the text.
    pub fn move_end(&mut self) {
        let end = self.char_len();
        self.anchor = end;
        self.caret = end;
    }

    /// Whether the editor holds input focus.
    pub fn has_focus(&self) -> bool {
        self.focused
    }

    /// Record a focus change.
    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn delete_selection(&mut self) -> bool {
        if !self.has_selection() {
            return false;
        }
        let (start, end) = self.selection();
        self.replace_range(start, end, "");
        self.anchor = start;
        self.caret = start;
        true
    }

    fn replace_range(&mut self, start: usize, end: usize, replacement: &str) {
        let start_byte = byte_offset(&self.text, start);
        let end_byte = byte_offset(&self.text, end);
        self.text.replace_range(start_byte..end_byte, replacement);
    }

    /// Grapheme boundaries as char offsets, including 0 and the text length.
    fn boundaries(&self) -> Vec<usize> {
        let mut boundaries = vec![0];
        let mut offset = 0;
        for grapheme in self.text.graphemes(true) {
            offset += grapheme.chars().count();
            boundaries.push(offset);
        }
        boundaries
    }

    fn previous_boundary(&self, position: usize) -> Option<usize> {
        self.boundaries().into_iter().rev().find(|&b| b < position)
    }

    fn next_boundary(&self, position: usize) -> Option<usize> {
        self.boundaries().into_iter().find(|&b| b > position)
    }
}

/// Byte offset of the char at `char_index` (or the text length past the end).
fn byte_offset(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map_or(text.len(), |(byte, _)| byte)
}
