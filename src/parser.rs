//! Async incremental parser for a top-level JSON array.
//!
//! This module provides a streaming parser for PQL query responses, whose body
//! is a single JSON array. Elements are returned one at a time as soon as their
//! closing byte arrives, so only the element currently being read is held in
//! memory regardless of how large the whole response is.

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{trace, warn};

use crate::error::{Error, Result};
use crate::value::Value;

/// Default size of the read buffer.
pub const DEFAULT_READ_BUFFER: usize = 8 * 1024;

/// Position of the scanner within the array document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScanState {
    /// Before the opening `[`.
    AwaitArrayStart,
    /// After `[` (`first`) or after a `,`.
    AwaitElement { first: bool },
    /// Inside an element. `depth` counts open brackets; a depth of 0 outside
    /// a string means a bare scalar such as `42` or `true`.
    InElement {
        depth: usize,
        in_string: bool,
        escaped: bool,
    },
    /// After a complete element, expecting `,` or `]`.
    AwaitSeparator,
    /// After the closing `]`; only whitespace may follow.
    Done,
}

/// Raw bytes of one array element and where it started in the body.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct RawElement {
    pub(crate) offset: usize,
    pub(crate) bytes: Vec<u8>,
}

/// Byte-at-a-time state machine that cuts a JSON array into its elements.
///
/// The scanner only tracks structure (brackets, strings, escapes, separators);
/// validating an element's contents is left to `serde_json` once it is cut.
#[derive(Debug)]
pub(crate) struct ArrayScanner {
    state: ScanState,
    element: Vec<u8>,
    element_start: usize,
    offset: usize,
}

impl ArrayScanner {
    pub(crate) fn new() -> Self {
        Self {
            state: ScanState::AwaitArrayStart,
            element: Vec::new(),
            element_start: 0,
            offset: 0,
        }
    }

    /// Number of bytes consumed so far.
    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    /// True once the closing `]` has been seen.
    pub(crate) fn is_done(&self) -> bool {
        self.state == ScanState::Done
    }

    /// Feeds one byte. Returns an element when `byte` completes one.
    pub(crate) fn push(&mut self, byte: u8) -> Result<Option<RawElement>> {
        let offset = self.offset;
        self.offset += 1;

        match self.state {
            ScanState::AwaitArrayStart => match byte {
                b if is_whitespace(b) => Ok(None),
                b'[' => {
                    self.state = ScanState::AwaitElement { first: true };
                    Ok(None)
                }
                _ => Err(unexpected(offset, byte, "expected '[' at start of document")),
            },

            ScanState::AwaitElement { first } => match byte {
                b if is_whitespace(b) => Ok(None),
                b']' if first => {
                    self.state = ScanState::Done;
                    Ok(None)
                }
                b']' | b',' | b'}' | b':' => Err(unexpected(offset, byte, "expected a value")),
                _ => {
                    self.begin_element(offset, byte);
                    Ok(None)
                }
            },

            ScanState::InElement {
                depth,
                in_string,
                escaped,
            } => {
                if in_string {
                    self.element.push(byte);
                    self.state = if escaped {
                        ScanState::InElement {
                            depth,
                            in_string: true,
                            escaped: false,
                        }
                    } else if byte == b'\\' {
                        ScanState::InElement {
                            depth,
                            in_string: true,
                            escaped: true,
                        }
                    } else if byte == b'"' {
                        if depth == 0 {
                            return Ok(Some(self.finish(ScanState::AwaitSeparator)));
                        }
                        ScanState::InElement {
                            depth,
                            in_string: false,
                            escaped: false,
                        }
                    } else {
                        self.state
                    };
                    return Ok(None);
                }

                if depth == 0 {
                    // bare scalar, ends at the first delimiter
                    return match byte {
                        b if is_whitespace(b) => Ok(Some(self.finish(ScanState::AwaitSeparator))),
                        b',' => Ok(Some(self.finish(ScanState::AwaitElement { first: false }))),
                        b']' => Ok(Some(self.finish(ScanState::Done))),
                        b'{' | b'[' | b'}' | b'"' | b':' => {
                            Err(unexpected(offset, byte, "malformed scalar value"))
                        }
                        _ => {
                            self.element.push(byte);
                            Ok(None)
                        }
                    };
                }

                self.element.push(byte);
                match byte {
                    b'"' => {
                        self.state = ScanState::InElement {
                            depth,
                            in_string: true,
                            escaped: false,
                        };
                    }
                    b'{' | b'[' => {
                        self.state = ScanState::InElement {
                            depth: depth + 1,
                            in_string: false,
                            escaped: false,
                        };
                    }
                    b'}' | b']' if depth == 1 => {
                        return Ok(Some(self.finish(ScanState::AwaitSeparator)));
                    }
                    b'}' | b']' => {
                        self.state = ScanState::InElement {
                            depth: depth - 1,
                            in_string: false,
                            escaped: false,
                        };
                    }
                    _ => {}
                }
                Ok(None)
            }

            ScanState::AwaitSeparator => match byte {
                b if is_whitespace(b) => Ok(None),
                b',' => {
                    self.state = ScanState::AwaitElement { first: false };
                    Ok(None)
                }
                b']' => {
                    self.state = ScanState::Done;
                    Ok(None)
                }
                _ => Err(unexpected(offset, byte, "expected ',' or ']' after array element")),
            },

            ScanState::Done => match byte {
                b if is_whitespace(b) => Ok(None),
                _ => Err(unexpected(offset, byte, "trailing characters after closing ']'")),
            },
        }
    }

    fn begin_element(&mut self, offset: usize, byte: u8) {
        self.element.clear();
        self.element.push(byte);
        self.element_start = offset;
        self.state = match byte {
            b'{' | b'[' => ScanState::InElement {
                depth: 1,
                in_string: false,
                escaped: false,
            },
            b'"' => ScanState::InElement {
                depth: 0,
                in_string: true,
                escaped: false,
            },
            _ => ScanState::InElement {
                depth: 0,
                in_string: false,
                escaped: false,
            },
        };
    }

    fn finish(&mut self, next: ScanState) -> RawElement {
        self.state = next;
        RawElement {
            offset: self.element_start,
            bytes: std::mem::take(&mut self.element),
        }
    }
}

fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r')
}

fn unexpected(offset: usize, byte: u8, expectation: &str) -> Error {
    Error::Parse {
        offset,
        message: format!("unexpected {:?}: {}", char::from(byte), expectation),
    }
}

/// Failure recorded by [`JsonArrayParser`] and replayed on later pulls.
#[derive(Clone, Debug)]
enum Failure {
    Parse { offset: usize, message: String },
    Io(std::io::ErrorKind, String),
}

impl Failure {
    fn record(error: &Error, offset: usize) -> Self {
        match error {
            Error::Parse { offset, message } => Failure::Parse {
                offset: *offset,
                message: message.clone(),
            },
            Error::Io(e) => Failure::Io(e.kind(), e.to_string()),
            other => Failure::Parse {
                offset,
                message: other.to_string(),
            },
        }
    }

    fn replay(&self) -> Error {
        match self {
            Failure::Parse { offset, message } => Error::Parse {
                offset: *offset,
                message: message.clone(),
            },
            Failure::Io(kind, message) => Error::Io(std::io::Error::new(*kind, message.clone())),
        }
    }
}

/// Async streaming parser for a JSON array body.
///
/// Reads an async byte stream and yields each top-level array element as a
/// [`Value`], without waiting for the rest of the document.
///
/// Once `next()` has failed, every later call fails with the same error
/// (same variant, and for I/O failures the same [`std::io::ErrorKind`]);
/// values returned before the failure are unaffected.
///
/// # Example
///
/// ```ignore
/// use pql_stream::JsonArrayParser;
///
/// let mut parser = JsonArrayParser::new(&br#"[{"name": "alice"}, {"name": "bob"}]"#[..]);
/// while let Some(record) = parser.next().await? {
///     println!("{}", record);
/// }
/// ```
pub struct JsonArrayParser<R> {
    reader: R,
    buf: Box<[u8]>,
    pos: usize,
    filled: usize,
    scanner: ArrayScanner,
    emitted: usize,
    failure: Option<Failure>,
}

impl<R: AsyncRead + Unpin> JsonArrayParser<R> {
    /// Create a new parser from an async reader.
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, DEFAULT_READ_BUFFER)
    }

    /// Create a parser that reads at most `capacity` bytes per read call.
    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self {
            reader,
            buf: vec![0; capacity.max(1)].into_boxed_slice(),
            pos: 0,
            filled: 0,
            scanner: ArrayScanner::new(),
            emitted: 0,
            failure: None,
        }
    }

    /// Number of elements returned so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Number of body bytes consumed so far.
    pub fn offset(&self) -> usize {
        self.scanner.offset()
    }

    /// Parse and return the next array element.
    ///
    /// Returns:
    /// - `Ok(Some(value))` - the next element
    /// - `Ok(None)` - the array is closed and the body is exhausted
    /// - `Err(e)` - malformed or truncated body, or an I/O failure
    pub async fn next(&mut self) -> Result<Option<Value>> {
        if let Some(failure) = &self.failure {
            return Err(failure.replay());
        }

        match self.advance().await {
            Err(e) => {
                let offset = self.scanner.offset();
                warn!(offset, emitted = self.emitted, error = %e, "JSON array stream failed");
                self.failure = Some(Failure::record(&e, offset));
                Err(e)
            }
            ok => ok,
        }
    }

    async fn advance(&mut self) -> Result<Option<Value>> {
        loop {
            while self.pos < self.filled {
                let byte = self.buf[self.pos];
                self.pos += 1;

                if let Some(raw) = self.scanner.push(byte)? {
                    let value = decode(&raw)?;
                    self.emitted += 1;
                    trace!(element = self.emitted, offset = raw.offset, "Parsed array element");
                    return Ok(Some(value));
                }
            }

            let n = self.reader.read(&mut self.buf).await?;
            if n == 0 {
                if self.scanner.is_done() {
                    return Ok(None);
                }
                return Err(Error::Parse {
                    offset: self.scanner.offset(),
                    message: "truncated stream".to_string(),
                });
            }
            self.pos = 0;
            self.filled = n;
        }
    }
}

/// Decode the bytes of one element.
fn decode(raw: &RawElement) -> Result<Value> {
    serde_json::from_slice::<serde_json::Value>(&raw.bytes)
        .map(Value::from)
        .map_err(|e| Error::Parse {
            offset: raw.offset,
            message: format!("invalid array element: {}", e),
        })
}
