/// Line-oriented edit buffer behind the name field, the simple fields and the config editor.
///
/// The cursor is a `(row, column)` pair counted in characters, so multi-byte input never
/// splits a code point.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    lines: Vec<String>,
    row: usize,
    col: usize,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextBuffer {
    pub fn new() -> Self {
        Self {
            lines: vec![String::new()],
            row: 0,
            col: 0,
        }
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Replace the contents and park the cursor after the last character.
    pub fn set<T: AsRef<str>>(&mut self, value: T) {
        let value = value.as_ref().replace("\r\n", "\n");
        self.lines = value.split('\n').map(str::to_string).collect();
        self.row = self.lines.len() - 1;
        self.col = self.current().chars().count();
    }

    pub fn insert_char(&mut self, ch: char) {
        match ch {
            '\r' => {}
            '\n' => self.insert_newline(),
            _ => {
                let idx = byte_index(self.current(), self.col);
                self.lines[self.row].insert(idx, ch);
                self.col += 1;
            }
        }
    }

    pub fn insert_str(&mut self, text: &str) {
        for ch in text.chars() {
            self.insert_char(ch);
        }
    }

    pub fn insert_newline(&mut self) {
        let idx = byte_index(self.current(), self.col);
        let rest = self.lines[self.row].split_off(idx);
        self.lines.insert(self.row + 1, rest);
        self.row += 1;
        self.col = 0;
    }

    pub fn backspace(&mut self) {
        if self.col > 0 {
            let idx = byte_index(self.current(), self.col - 1);
            self.lines[self.row].remove(idx);
            self.col -= 1;
        } else if self.row > 0 {
            let line = self.lines.remove(self.row);
            self.row -= 1;
            self.col = self.current().chars().count();
            self.lines[self.row].push_str(&line);
        }
    }

    pub fn delete(&mut self) {
        if self.col < self.current().chars().count() {
            let idx = byte_index(self.current(), self.col);
            self.lines[self.row].remove(idx);
        } else if self.row + 1 < self.lines.len() {
            let next = self.lines.remove(self.row + 1);
            self.lines[self.row].push_str(&next);
        }
    }

    pub fn move_left(&mut self) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = self.current().chars().count();
        }
    }

    pub fn move_right(&mut self) {
        if self.col < self.current().chars().count() {
            self.col += 1;
        } else if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = 0;
        }
    }

    pub fn move_up(&mut self) {
        if self.row > 0 {
            self.row -= 1;
            self.clamp_col();
        }
    }

    pub fn move_down(&mut self) {
        if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.clamp_col();
        }
    }

    pub fn move_home(&mut self) {
        self.col = 0;
    }

    pub fn move_end(&mut self) {
        self.col = self.current().chars().count();
    }

    fn current(&self) -> &str {
        &self.lines[self.row]
    }

    fn clamp_col(&mut self) {
        self.col = self.col.min(self.current().chars().count());
    }
}

fn byte_index(line: &str, col: usize) -> usize {
    line.char_indices()
        .nth(col)
        .map(|(idx, _)| idx)
        .unwrap_or(line.len())
}
