//! # Route Post-Formatter
//!
//! Turns raw route document text into its canonical layout. The raw text comes straight
//! out of the templates: indentation is arbitrary and type declarations lack the `struct`
//! keyword a Go formatter needs.
//!
//! ## Passes
//!
//! 1. The [`RouteValidator`] checks the raw text. A rejection aborts the document.
//! 2. A single line-oriented pass:
//!    - `type X {` / `type (` lines at indentation zero open a type block. Block lines are
//!      buffered with `struct` inserted before member braces; once the brace/paren depth is
//!      back to zero the buffer goes through the [`SourceFormatter`] and the inserted
//!      keyword is removed again.
//!    - Every other line is re-indented with tabs from a running depth: a trailing `(` or
//!      `{` indents the following lines, a line that is only `)` or `}` de-indents itself.
//!    - Runs of blank lines collapse to one and a line following a lone `}` is separated
//!      by a blank line.
//!
//! ```rust
//! use grom::format::{format_api, DelimiterValidator, Verbatim};
//!
//! let raw = "service user {\n@handler Get\n  get /user (Req) returns (Resp)\n}\n";
//! let formatted = format_api(raw, &DelimiterValidator, &Verbatim).unwrap();
//! assert_eq!(formatted, "service user {\n\t@handler Get\n\tget /user (Req) returns (Resp)\n}");
//! ```

mod source;
mod validate;

pub use source::{Gofmt, SourceFormatter, Verbatim};
pub use validate::{ApiFormatError, DelimiterValidator, RouteValidator};

const LEFT_PAREN: &str = "(";
const RIGHT_PAREN: &str = ")";
const LEFT_BRACE: &str = "{";
const RIGHT_BRACE: &str = "}";

/// Validate and post-format a route document.
pub fn format_api(
    raw: &str,
    validator: &dyn RouteValidator,
    formatter: &dyn SourceFormatter,
) -> Result<String, ApiFormatError> {
    validator.validate(raw)?;
    post_format(raw, formatter)
}

/// The formatting pass of [`format_api`] without validation.
///
/// Extra closers never drive the indentation below zero; they are logged and clamped.
pub fn post_format(raw: &str, formatter: &dyn SourceFormatter) -> Result<String, ApiFormatError> {
    let mut state = PostFormatter::new(formatter);
    for line in raw.lines() {
        state.feed(line)?;
    }
    state.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    /// Buffering `type X {`; closes when its brace does.
    InsideTypeBlock,
    /// Buffering `type (`; closes when the group's paren does.
    AwaitingGroupClose,
}

struct PostFormatter<'a> {
    formatter: &'a dyn SourceFormatter,
    state: State,
    out: String,
    indent: usize,
    blank_run: usize,
    previous: String,
    block: String,
    block_depth: i64,
}

impl<'a> PostFormatter<'a> {
    fn new(formatter: &'a dyn SourceFormatter) -> Self {
        Self {
            formatter,
            state: State::Normal,
            out: String::new(),
            indent: 0,
            blank_run: 0,
            previous: String::new(),
            block: String::new(),
            block_depth: 0,
        }
    }

    fn feed(&mut self, raw_line: &str) -> Result<(), ApiFormatError> {
        if self.state != State::Normal {
            return self.feed_block(raw_line);
        }

        let line = raw_line.trim();
        if line.is_empty() {
            if self.blank_run > 0 {
                return Ok(());
            }
            self.blank_run += 1;
        } else {
            if self.previous == RIGHT_BRACE {
                self.out.push('\n');
            }
            self.blank_run = 0;
        }

        let code = strip_comment(line);
        if self.indent == 0 && code.starts_with("type") {
            if code.ends_with(LEFT_BRACE) {
                self.state = State::InsideTypeBlock;
            } else if code.ends_with(LEFT_PAREN) {
                self.state = State::AwaitingGroupClose;
            }
            if self.state != State::Normal {
                self.block.clear();
                self.block_depth = 0;
                return self.feed_block(line);
            }
        }

        if code == RIGHT_PAREN || code == RIGHT_BRACE {
            if self.indent == 0 {
                tracing::warn!(line, "closing delimiter without an opener, indentation clamped at zero");
            }
            self.indent = self.indent.saturating_sub(1);
        }
        if !line.is_empty() {
            self.out.push_str(&"\t".repeat(self.indent));
        }
        self.out.push_str(line);
        self.out.push('\n');
        if code.ends_with(LEFT_PAREN) || code.ends_with(LEFT_BRACE) {
            self.indent += 1;
        }
        self.previous = line.to_string();
        Ok(())
    }

    fn feed_block(&mut self, raw_line: &str) -> Result<(), ApiFormatError> {
        let line = insert_struct_keyword(raw_line, &mut self.block_depth);
        self.block.push_str(&line);
        self.block.push('\n');

        let code = strip_comment(raw_line);
        if code == RIGHT_BRACE || code == RIGHT_PAREN {
            self.block_depth -= 1;
        }
        if self.block_depth <= 0 {
            self.flush_block()?;
        }
        Ok(())
    }

    fn flush_block(&mut self) -> Result<(), ApiFormatError> {
        let buffer = std::mem::take(&mut self.block);
        let formatted = self
            .formatter
            .format_source(&buffer)
            .map_err(|e| ApiFormatError::Source {
                message: format!("{e:#}"),
                buffer: buffer.clone(),
            })?;
        let formatted = formatted
            .replace(" struct ", " ")
            .replace(" struct{}", " {}")
            .replace("type ()", "");
        tracing::trace!(kind = ?self.state, lines = buffer.lines().count(), "formatted type block");
        self.out.push_str(&formatted);
        if !formatted.ends_with('\n') {
            self.out.push('\n');
        }
        self.state = State::Normal;
        self.block_depth = 0;
        Ok(())
    }

    fn finish(mut self) -> Result<String, ApiFormatError> {
        if self.state != State::Normal {
            tracing::warn!(state = ?self.state, "route document ended inside a type block");
            self.flush_block()?;
        }
        Ok(self.out.trim().to_string())
    }
}

/// Code part of a line: everything before a `//` that is outside quotes and backticks.
fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut prev = '\0';
    for (idx, c) in line.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '`' => quote = Some(c),
                '/' if prev == '/' => return line[..idx - 1].trim(),
                _ => {}
            },
        }
        prev = c;
    }
    line.trim()
}

/// Insert `struct` before the brace of a member declaration and track block depth.
///
/// Field lines (those carrying a backtick tag) are trimmed and get an upper-case first
/// letter, since route documents accept lower-case member names that Go would not export.
fn insert_struct_keyword(line: &str, depth: &mut i64) -> String {
    let with_struct = || {
        if line.contains(" struct") {
            return line.to_string();
        }
        match line.find(LEFT_BRACE) {
            Some(idx) => format!("{} struct {}", line[..idx].trim_end(), &line[idx..]),
            None => line.to_string(),
        }
    };

    let code = strip_comment(line);
    if code.ends_with(LEFT_BRACE) {
        *depth += 1;
        return with_struct();
    }
    if let Some(body) = code.strip_suffix(RIGHT_BRACE) {
        if body.trim_end().ends_with(LEFT_BRACE) {
            return with_struct();
        }
    }
    if code.ends_with(LEFT_PAREN) {
        *depth += 1;
    }
    if code.contains('`') {
        return upper_first(line.trim());
    }
    line.to_string()
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests;
