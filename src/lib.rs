// WireCL: S-Expression Wire Format Reader
// Decodes the textual interchange format spoken between a host process and
// a Lisp peer: pushback streams, readtable, reader and pairing printer.

pub mod types;
pub mod symbol;
pub mod stream;
pub mod readtable;
pub mod reader;
pub mod printer;
