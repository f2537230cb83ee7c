//! ALS line and word tokenizer.
//!
//! The format is line oriented: each non-blank line is split into words
//! on unescaped spaces. Words borrow from the input.

use std::iter::{Enumerate, Peekable};
use std::str::{CharIndices, Split};

/// One non-blank input line split into words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line<'t> {
    /// Line number in the input (1-indexed).
    pub number: usize,
    /// Words in order.
    pub words: Vec<&'t str>,
}

/// Iterator over the non-blank lines of an ALS text.
///
/// A trailing `\r` is stripped from every line.
pub struct Tokenizer<'t> {
    lines: Enumerate<Split<'t, char>>,
}

impl<'t> Tokenizer<'t> {
    /// Create a tokenizer over `input`.
    pub fn new(input: &'t str) -> Self {
        Self {
            lines: input.split('\n').enumerate(),
        }
    }
}

impl<'t> Iterator for Tokenizer<'t> {
    type Item = Line<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        for (index, raw) in self.lines.by_ref() {
            let text = raw.strip_suffix('\r').unwrap_or(raw);
            let words = split_words(text);
            if !words.is_empty() {
                return Some(Line {
                    number: index + 1,
                    words,
                });
            }
        }
        None
    }
}

/// Split a line into words on unescaped spaces.
///
/// Runs of spaces count as one separator.
pub fn split_words(line: &str) -> Vec<&str> {
    WordSplitter {
        line,
        chars: line.char_indices().peekable(),
    }
    .collect()
}

struct WordSplitter<'t> {
    line: &'t str,
    chars: Peekable<CharIndices<'t>>,
}

impl<'t> Iterator for WordSplitter<'t> {
    type Item = &'t str;

    fn next(&mut self) -> Option<Self::Item> {
        while self.chars.next_if(|&(_, c)| c == ' ').is_some() {}
        let (start, _) = *self.chars.peek()?;

        let mut end = self.line.len();
        while let Some((i, c)) = self.chars.next() {
            match c {
                '\\' => {
                    self.chars.next();
                }
                ' ' => {
                    end = i;
                    break;
                }
                _ => {}
            }
        }
        Some(&self.line[start..end])
    }
}
