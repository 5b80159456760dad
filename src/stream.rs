// WireCL Character Streams
//
// One-character-lookahead input over in-memory strings and byte readers.

use std::io::{self, Read};

use crate::reader::ReaderError;

enum Source {
    Text { chars: Vec<char>, position: usize },
    Bytes { input: Box<dyn Read> },
}

/// An input stream with exactly one character of pushback.
///
/// `old` holds the most recently delivered character and is cleared on
/// exhaustion; `unread_char` moves it to `new`, where the next read picks
/// it up before touching the source again.
pub struct Stream {
    source: Source,
    old: Option<char>,
    new: Option<char>,
}

impl Stream {
    /// Stream over an in-memory string
    pub fn from_string(text: &str) -> Self {
        Self {
            source: Source::Text {
                chars: text.chars().collect(),
                position: 0,
            },
            old: None,
            new: None,
        }
    }

    /// Stream over a byte reader (socket, pipe, file), decoded as UTF-8
    pub fn from_reader<R: Read + 'static>(input: R) -> Self {
        Self {
            source: Source::Bytes {
                input: Box::new(input),
            },
            old: None,
            new: None,
        }
    }

    /// Read one character, failing with `EndOfInput` on exhaustion
    pub fn read_char(&mut self) -> Result<char, ReaderError> {
        self.try_read_char()?.ok_or(ReaderError::EndOfInput)
    }

    /// Read one character, returning None on exhaustion
    pub fn try_read_char(&mut self) -> Result<Option<char>, ReaderError> {
        if let Some(c) = self.new.take() {
            self.old = Some(c);
            return Ok(Some(c));
        }
        let c = self.source.next_char()?;
        self.old = c;
        Ok(c)
    }

    /// Push the most recently read character back onto the stream.
    ///
    /// Lookahead depth is exactly one: a second unread without an
    /// intervening successful read fails with `DuplicatePushback`, as does
    /// unreading before any read or after exhaustion.
    pub fn unread_char(&mut self) -> Result<(), ReaderError> {
        match self.old.take() {
            Some(c) => {
                self.new = Some(c);
                Ok(())
            }
            None => Err(ReaderError::DuplicatePushback),
        }
    }
}

impl Source {
    fn next_char(&mut self) -> Result<Option<char>, ReaderError> {
        match self {
            Source::Text { chars, position } => {
                let c = chars.get(*position).copied();
                if c.is_some() {
                    *position += 1;
                }
                Ok(c)
            }
            Source::Bytes { input } => {
                let mut first = [0u8; 1];
                if input.read(&mut first)? == 0 {
                    return Ok(None);
                }
                let len = match utf8_sequence_len(first[0]) {
                    Some(len) => len,
                    None => return Err(invalid_utf8()),
                };
                if len == 1 {
                    return Ok(Some(first[0] as char));
                }
                let mut buf = [0u8; 4];
                buf[0] = first[0];
                input.read_exact(&mut buf[1..len])?;
                match std::str::from_utf8(&buf[..len]) {
                    Ok(s) => Ok(s.chars().next()),
                    Err(_) => Err(invalid_utf8()),
                }
            }
        }
    }
}

fn utf8_sequence_len(byte: u8) -> Option<usize> {
    match byte {
        0x00..=0x7f => Some(1),
        0xc0..=0xdf => Some(2),
        0xe0..=0xef => Some(3),
        0xf0..=0xf7 => Some(4),
        _ => None,
    }
}

fn invalid_utf8() -> ReaderError {
    ReaderError::Io(io::Error::new(
        io::ErrorKind::InvalidData,
        "invalid UTF-8 in input",
    ))
}
