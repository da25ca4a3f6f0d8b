//! Whole-file view of a filter list.
//!
//! Lines keep their own terminator so an untouched list regenerates
//! byte-for-byte, including mixed `\n`/`\r\n` endings and a missing final
//! newline.

/// One physical line of a filter list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListLine {
    pub text: String,
    /// `"\n"`, `"\r\n"` or `""` for a last line without terminator.
    pub eol: String,
}

/// Ordered lines of one filter-list file. Line numbers are 1-based.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterList {
    lines: Vec<ListLine>,
}

impl FilterList {
    pub fn parse(content: &str) -> Self {
        let lines = content
            .split_inclusive('\n')
            .map(|line| {
                let (text, eol) = if let Some(text) = line.strip_suffix("\r\n") {
                    (text, "\r\n")
                } else if let Some(text) = line.strip_suffix('\n') {
                    (text, "\n")
                } else {
                    (line, "")
                };
                ListLine {
                    text: text.to_string(),
                    eol: eol.to_string(),
                }
            })
            .collect();
        Self { lines }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[ListLine] {
        &self.lines
    }

    /// Iterate `(line_number, text)` pairs.
    pub fn numbered(&self) -> impl Iterator<Item = (usize, &str)> {
        self.lines
            .iter()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line.text.as_str()))
    }

    pub fn get(&self, line_number: usize) -> Option<&ListLine> {
        line_number
            .checked_sub(1)
            .and_then(|idx| self.lines.get(idx))
    }

    /// Delete a line. Later lines shift up by one.
    pub fn remove(&mut self, line_number: usize) -> Option<ListLine> {
        let idx = line_number.checked_sub(1)?;
        (idx < self.lines.len()).then(|| self.lines.remove(idx))
    }

    /// Replace a line's text, keeping its terminator. Returns `false` when the
    /// line does not exist.
    pub fn replace(&mut self, line_number: usize, text: impl Into<String>) -> bool {
        match line_number
            .checked_sub(1)
            .and_then(|idx| self.lines.get_mut(idx))
        {
            Some(line) => {
                line.text = text.into();
                true
            },
            None => false,
        }
    }

    /// Render the list back to file contents.
    pub fn generate(&self) -> String {
        let capacity = self
            .lines
            .iter()
            .map(|l| l.text.len() + l.eol.len())
            .sum();
        let mut out = String::with_capacity(capacity);
        for line in &self.lines {
            out.push_str(&line.text);
            out.push_str(&line.eol);
        }
        out
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_line_endings() {
        for content in [
            "",
            "a",
            "a\n",
            "a\nb",
            "a\r\nb\n\nc",
            "\n\n",
            "||example.org^\r\n! comment\r\n",
        ] {
            assert_eq!(FilterList::parse(content).generate(), content, "{content:?}");
        }
    }

    #[test]
    fn numbered_is_one_based() {
        let list = FilterList::parse("a\nb\nc\n");
        let numbered: Vec<_> = list.numbered().collect();
        assert_eq!(numbered, vec![(1, "a"), (2, "b"), (3, "c")]);
        assert_eq!(list.get(2).unwrap().text, "b");
        assert!(list.get(0).is_none());
        assert!(list.get(4).is_none());
    }

    #[test]
    fn remove_and_replace() {
        let mut list = FilterList::parse("a\r\nb\r\nc\r\n");
        assert!(list.replace(3, "z"));
        assert_eq!(list.remove(1).unwrap().text, "a");
        assert!(list.remove(0).is_none());
        assert!(list.remove(9).is_none());
        assert!(!list.replace(9, "x"));
        assert_eq!(list.generate(), "b\r\nz\r\n");
    }
}
