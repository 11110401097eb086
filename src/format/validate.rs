use std::fmt;

/// Failure while formatting a route document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiFormatError {
    /// The structural validator rejected the raw document
    Validation {
        /// 1-based line of the offending token
        line: usize,
        /// 1-based column (in characters) of the offending token
        column: usize,
        /// What the validator found
        message: String,
    },
    /// The source formatter rejected a type block
    Source {
        /// Formatter diagnostic
        message: String,
        /// The unformatted block as it was handed to the formatter
        buffer: String,
    },
}

impl fmt::Display for ApiFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiFormatError::Validation { line, column, message } => {
                write!(f, "route document rejected at {line}:{column}: {message}")
            }
            ApiFormatError::Source { message, buffer } => {
                write!(f, "error formatting type block: {message}\n{buffer}")
            }
        }
    }
}

impl std::error::Error for ApiFormatError {}

/// Structural check run on a route document before it is post-formatted.
pub trait RouteValidator {
    fn validate(&self, document: &str) -> Result<(), ApiFormatError>;
}

impl<F> RouteValidator for F
where
    F: Fn(&str) -> Result<(), ApiFormatError>,
{
    fn validate(&self, document: &str) -> Result<(), ApiFormatError> {
        self(document)
    }
}

/// Checks that `()` and `{}` pair up outside string literals, backtick tags and `//`
/// comments. Reports the first stray closer, mismatched closer or unclosed opener.
#[derive(Debug, Clone, Copy, Default)]
pub struct DelimiterValidator;

impl RouteValidator for DelimiterValidator {
    fn validate(&self, document: &str) -> Result<(), ApiFormatError> {
        let mut open: Vec<(char, usize, usize)> = Vec::new();
        let mut in_tag = false;

        for (idx, text) in document.lines().enumerate() {
            let line = idx + 1;
            let mut in_string = false;
            let mut prev = '\0';
            for (col, c) in text.chars().enumerate() {
                let column = col + 1;
                if in_tag {
                    in_tag = c != '`';
                } else if in_string {
                    if c == '"' && prev != '\\' {
                        in_string = false;
                    }
                } else {
                    match c {
                        '`' => in_tag = true,
                        '"' => in_string = true,
                        '/' if prev == '/' => break,
                        '(' | '{' => open.push((c, line, column)),
                        ')' | '}' => {
                            let expected = if c == ')' { '(' } else { '{' };
                            match open.pop() {
                                Some((opener, _, _)) if opener == expected => {}
                                Some((opener, l, col)) => {
                                    return Err(ApiFormatError::Validation {
                                        line,
                                        column,
                                        message: format!("`{c}` does not close `{opener}` opened at {l}:{col}"),
                                    })
                                }
                                None => {
                                    return Err(ApiFormatError::Validation {
                                        line,
                                        column,
                                        message: format!("unexpected `{c}`"),
                                    })
                                }
                            }
                        }
                        _ => {}
                    }
                }
                prev = c;
            }
        }

        match open.pop() {
            Some((opener, line, column)) => Err(ApiFormatError::Validation {
                line,
                column,
                message: format!("`{opener}` is never closed"),
            }),
            None => Ok(()),
        }
    }
}
