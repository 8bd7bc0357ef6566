//! Reference answers for each lab, computed straight from the sample text.

use anyhow::{Context, Result};
use std::borrow::Cow;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Oracle {
    /// Index-prefixed tokens of a space-separated line.
    Strsplit,
    /// Newline count followed by the file name.
    Wc,
    /// Longest token separated by spaces or newlines.
    Longest,
}

/// What the subject is expected to print for one sample.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expected {
    Output(String),
    /// The sample could not be found; holds the subject's own wording.
    NotFound(String),
}

impl Expected {
    pub fn text(&self) -> &str {
        match self {
            Expected::Output(text) | Expected::NotFound(text) => text,
        }
    }
}

impl Oracle {
    /// Program name the subject uses as the prefix of its not-found message.
    pub fn tool_name(self) -> &'static str {
        match self {
            Oracle::Strsplit => "stringtest",
            Oracle::Wc => "wc",
            Oracle::Longest => "longest",
        }
    }

    /// Computes the answer for `sample`, opened relative to `workdir` and
    /// rendered exactly as the subject receives it on its command line.
    pub fn expected(self, workdir: &Path, sample: &Path) -> Result<Expected> {
        let location = workdir.join(sample);
        let text = match fs::read_to_string(&location) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(Expected::NotFound(self.not_found_message(sample)));
            }
            Err(e) => {
                return Err(e).with_context(|| format!("reading sample {}", location.display()))
            }
        };
        Ok(Expected::Output(self.render(&text, sample)))
    }

    pub fn render(self, text: &str, sample: &Path) -> String {
        let text = universal_newlines(text);
        match self {
            Oracle::Strsplit => split_tokens(&text),
            Oracle::Wc => count_lines(&text, sample),
            Oracle::Longest => longest_token(&text).to_string(),
        }
    }

    pub fn not_found_message(self, sample: &Path) -> String {
        format!(
            "{}: {}: No such file or directory\n",
            self.tool_name(),
            sample.display()
        )
    }
}

/// Reads `\r\n` and lone `\r` as `\n`, the way text-mode readers do.
pub fn universal_newlines(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Drops the final character (the line terminator), splits on single spaces
/// and numbers every non-empty token from zero.
pub fn split_tokens(text: &str) -> String {
    let body = match text.char_indices().next_back() {
        Some((last, _)) => &text[..last],
        None => "",
    };
    body.split(' ')
        .filter(|token| !token.is_empty())
        .enumerate()
        .map(|(i, token)| format!("{i}: \"{token}\"\n"))
        .collect()
}

pub fn count_lines(text: &str, sample: &Path) -> String {
    let lines = text.bytes().filter(|&b| b == b'\n').count();
    format!("{lines} {}", sample.display())
}

/// Ties keep the earliest token; empty tokens count as length zero.
pub fn longest_token(text: &str) -> &str {
    let mut best = "";
    let mut best_len = 0usize;
    for token in text.split(|c| c == ' ' || c == '\n') {
        let len = token.chars().count();
        if len > best_len {
            best = token;
            best_len = len;
        }
    }
    best
}
