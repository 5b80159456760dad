// WireCL Reader - S-Expression Parser
//
// Readtable-driven reader over pushback character streams.

use std::io;
use std::rc::Rc;

use crate::readtable::{MacroOutcome, MacroResult, Readtable, SyntaxType};
use crate::stream::Stream;
use crate::symbol::SymbolTable;
use crate::types::{parse_atom, Object};

/// Reader error types
#[derive(Debug)]
pub enum ReaderError {
    EndOfInput,
    UnmatchedClosingDelimiter(char),
    DuplicatePushback,
    MalformedDottedPair,
    UnboundMacroCharacter(char),
    UnboundDispatchMacroCharacter(char, char),
    InvalidCharacterName(String),
    InvalidNumber(String),
    NestingTooDeep,
    Io(io::Error),
}

impl std::fmt::Display for ReaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EndOfInput => write!(f, "Unexpected end of input"),
            Self::UnmatchedClosingDelimiter(c) => {
                write!(f, "Unmatched closing delimiter: '{}'", c)
            }
            Self::DuplicatePushback => write!(f, "Duplicate pushback without intervening read"),
            Self::MalformedDottedPair => write!(f, "Malformed dotted pair"),
            Self::UnboundMacroCharacter(c) => write!(f, "No macro function bound to '{}'", c),
            Self::UnboundDispatchMacroCharacter(disp, sub) => {
                write!(f, "No dispatch macro function bound to '{}{}'", disp, sub)
            }
            Self::InvalidCharacterName(name) => write!(f, "Invalid character name: {}", name),
            Self::InvalidNumber(s) => write!(f, "Invalid number: {}", s),
            Self::NestingTooDeep => write!(f, "Nesting depth limit exceeded"),
            Self::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ReaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ReaderError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

pub type ReaderResult = Result<Object, ReaderError>;

pub struct ReaderOptions {
    /// Maximum nesting depth for recursive forms
    pub max_depth: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self { max_depth: 256 }
    }
}

/// The WireCL Reader
pub struct Reader<'a> {
    stream: &'a mut Stream,
    symbols: &'a mut SymbolTable,
    readtable: &'a Readtable,
    depth: usize,
    max_depth: usize,
}

impl<'a> Reader<'a> {
    pub fn new(
        stream: &'a mut Stream,
        symbols: &'a mut SymbolTable,
        readtable: &'a Readtable,
    ) -> Self {
        Self::new_with_options(stream, symbols, readtable, ReaderOptions::default())
    }

    pub fn new_with_options(
        stream: &'a mut Stream,
        symbols: &'a mut SymbolTable,
        readtable: &'a Readtable,
        options: ReaderOptions,
    ) -> Self {
        Self {
            stream,
            symbols,
            readtable,
            depth: 0,
            max_depth: options.max_depth,
        }
    }

    /// The underlying character stream, for macro handlers
    pub fn stream(&mut self) -> &mut Stream {
        self.stream
    }

    /// The symbol table values are interned into, for macro handlers
    pub fn symbols(&mut self) -> &mut SymbolTable {
        self.symbols
    }

    /// Read a single expression
    pub fn read(&mut self) -> ReaderResult {
        match self.try_read()? {
            Some(value) => Ok(value),
            None => Err(ReaderError::EndOfInput),
        }
    }

    /// Read a single expression, or None once the input holds no further forms
    pub fn try_read(&mut self) -> Result<Option<Object>, ReaderError> {
        if self.depth >= self.max_depth {
            return Err(ReaderError::NestingTooDeep);
        }
        self.depth += 1;
        let result = self.read_form();
        self.depth -= 1;
        result
    }

    fn read_form(&mut self) -> Result<Option<Object>, ReaderError> {
        loop {
            let c = match self.stream.try_read_char()? {
                Some(c) => c,
                None => return Ok(None),
            };
            match self.readtable.get_syntax_type(c) {
                SyntaxType::Whitespace => continue,
                SyntaxType::TerminatingMacro | SyntaxType::NonTerminatingMacro => {
                    let handler = self
                        .readtable
                        .get_macro_character(c)
                        .ok_or(ReaderError::UnboundMacroCharacter(c))?;
                    match handler(self, c)? {
                        MacroOutcome::Value(value) => return Ok(Some(value)),
                        MacroOutcome::Skip => continue,
                    }
                }
                SyntaxType::SingleEscape => {
                    let escaped = self.stream.read_char()?;
                    let mut token = String::new();
                    token.push(escaped);
                    return self.read_token(token, false).map(Some);
                }
                SyntaxType::MultiEscape => {
                    return self.read_token(String::new(), true).map(Some);
                }
                SyntaxType::Constituent => {
                    let mut token = String::new();
                    token.extend(c.to_uppercase());
                    return self.read_token(token, false).map(Some);
                }
            }
        }
    }

    /// Accumulate the rest of a token seeded by `read_form`.
    ///
    /// Unescaped constituents are upper-cased; escaped text is taken
    /// verbatim and is never treated as macro or whitespace syntax. End
    /// of input simply ends the token, even inside a multi-escape region.
    fn read_token(&mut self, mut token: String, mut escape: bool) -> ReaderResult {
        loop {
            let c = match self.stream.try_read_char()? {
                Some(c) => c,
                None => break,
            };
            if escape {
                match self.readtable.get_syntax_type(c) {
                    SyntaxType::SingleEscape => token.push(self.stream.read_char()?),
                    SyntaxType::MultiEscape => escape = false,
                    _ => token.push(c),
                }
            } else {
                match self.readtable.get_syntax_type(c) {
                    SyntaxType::SingleEscape => token.push(self.stream.read_char()?),
                    SyntaxType::MultiEscape => escape = true,
                    SyntaxType::TerminatingMacro | SyntaxType::Whitespace => {
                        self.stream.unread_char()?;
                        break;
                    }
                    _ => token.extend(c.to_uppercase()),
                }
            }
        }
        parse_atom(&token, self.symbols)
    }

    /// Read forms up to a closing delimiter, building a list.
    ///
    /// A lone `.` at element position makes the next form the tail of the
    /// list; only the delimiter may follow it.
    pub fn read_delimited_list(&mut self, delim: char) -> ReaderResult {
        let mut elements = Vec::new();
        let mut tail = Object::Nil;
        loop {
            let c = self.skip_whitespace()?;
            if c == delim {
                break;
            }
            if c == '.' {
                tail = self.read()?;
                let after = self.skip_whitespace()?;
                if after != delim {
                    return Err(ReaderError::MalformedDottedPair);
                }
                break;
            }
            self.stream.unread_char()?;
            elements.push(self.read()?);
        }
        Ok(Object::list_with_tail(elements, tail))
    }

    /// Skip whitespace, returning the first non-whitespace character
    fn skip_whitespace(&mut self) -> Result<char, ReaderError> {
        loop {
            let c = self.stream.read_char()?;
            if !self.readtable.is_whitespace(c) {
                return Ok(c);
            }
        }
    }

    /// Read a quoted expression: 'x -> (QUOTE x)
    pub(crate) fn read_quote(&mut self) -> ReaderResult {
        let expr = self.read()?;
        let quote = Object::Symbol(self.symbols.intern("QUOTE"));
        Ok(Object::from_vec(vec![quote, expr]))
    }

    /// Read a string literal: "hello".
    /// A single escape passes the next character through verbatim.
    pub(crate) fn read_string_literal(&mut self) -> ReaderResult {
        let mut text = String::new();
        loop {
            match self.stream.read_char()? {
                '"' => break,
                '\\' => text.push(self.stream.read_char()?),
                c => text.push(c),
            }
        }
        Ok(Object::String(text))
    }

    /// Skip a line comment, consuming the terminating newline
    pub(crate) fn skip_line_comment(&mut self) -> Result<(), ReaderError> {
        loop {
            if self.stream.read_char()? == '\n' {
                return Ok(());
            }
        }
    }

    /// Read a dispatch macro: #...
    ///
    /// Digits between the dispatch character and the sub-character form a
    /// numeric infix argument, defaulting to zero. The sub-character reaches
    /// the handler ASCII upper-cased.
    pub(crate) fn read_dispatch(&mut self, disp: char) -> MacroResult {
        let mut digits = String::new();
        let mut c = self.stream.read_char()?;
        while c.is_ascii_digit() {
            digits.push(c);
            c = self.stream.read_char()?;
        }
        let arg = if digits.is_empty() {
            0
        } else {
            digits
                .parse()
                .map_err(|_| ReaderError::InvalidNumber(digits.clone()))?
        };
        let handler = self
            .readtable
            .get_dispatch_macro_character(disp, c)
            .ok_or(ReaderError::UnboundDispatchMacroCharacter(disp, c))?;
        handler(self, c.to_ascii_uppercase(), arg)
    }

    /// Read a character literal: #\x or #\Space
    pub(crate) fn read_character(&mut self) -> ReaderResult {
        let first = self.stream.read_char()?;
        let mut name = String::new();
        name.push(first);
        loop {
            match self.stream.try_read_char()? {
                None => break,
                Some(c) => {
                    if self.readtable.get_syntax_type(c) == SyntaxType::Constituent {
                        name.push(c);
                    } else {
                        self.stream.unread_char()?;
                        break;
                    }
                }
            }
        }

        if name.chars().count() == 1 {
            return Ok(Object::Char(first));
        }

        let ch = match name.to_uppercase().as_str() {
            "SPACE" => ' ',
            "NEWLINE" => '\n',
            "TAB" => '\t',
            "RETURN" => '\r',
            "LINEFEED" => '\n',
            "PAGE" => '\x0c',
            "RUBOUT" => '\x7f',
            "BACKSPACE" => '\x08',
            "NULL" => '\0',
            _ => return Err(ReaderError::InvalidCharacterName(name)),
        };
        Ok(Object::Char(ch))
    }

    /// Read a vector literal: #(1 2 3)
    pub(crate) fn read_vector(&mut self) -> ReaderResult {
        let list = self.read_delimited_list(')')?;
        match list.proper_list_elements() {
            Some(elements) => Ok(Object::Vector(Rc::new(elements))),
            None => Err(ReaderError::MalformedDottedPair),
        }
    }
}

/// Read one expression from a stream
pub fn read(
    stream: &mut Stream,
    symbols: &mut SymbolTable,
    readtable: &Readtable,
) -> ReaderResult {
    Reader::new(stream, symbols, readtable).read()
}

/// Convenience function to read from string
pub fn read_from_string(
    input: &str,
    symbols: &mut SymbolTable,
    readtable: &Readtable,
) -> ReaderResult {
    let mut stream = Stream::from_string(input);
    Reader::new(&mut stream, symbols, readtable).read()
}

/// Read all expressions from a string
pub fn read_all(
    input: &str,
    symbols: &mut SymbolTable,
    readtable: &Readtable,
) -> Result<Vec<Object>, ReaderError> {
    let mut stream = Stream::from_string(input);
    let mut reader = Reader::new(&mut stream, symbols, readtable);
    let mut results = Vec::new();
    while let Some(value) = reader.try_read()? {
        results.push(value);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    fn read_str(input: &str) -> ReaderResult {
        let mut symbols = SymbolTable::new();
        let rt = Readtable::new();
        read_from_string(input, &mut symbols, &rt)
    }

    fn read_symbol_name(input: &str) -> String {
        let mut symbols = SymbolTable::new();
        let rt = Readtable::new();
        match read_from_string(input, &mut symbols, &rt).unwrap() {
            Object::Symbol(id) => symbols.symbol_name(id).unwrap().to_string(),
            other => panic!("expected symbol, got {:?}", other),
        }
    }

    #[test]
    fn test_read_integer() {
        assert_eq!(read_str("42").unwrap(), Object::Integer(42));
        assert_eq!(read_str("-7").unwrap(), Object::Integer(-7));
        assert_eq!(read_str("  13  ").unwrap(), Object::Integer(13));
    }

    #[test]
    fn test_read_float() {
        assert_eq!(read_str("3.14").unwrap(), Object::Float(3.14));
        assert_eq!(read_str("-1.5e2").unwrap(), Object::Float(-150.0));
    }

    #[test]
    fn test_read_ratio() {
        assert_eq!(
            read_str("2/4").unwrap(),
            Object::Ratio(BigInt::from(1), BigInt::from(2))
        );
    }

    #[test]
    fn test_read_nil() {
        assert_eq!(read_str("NIL").unwrap(), Object::Nil);
        // Unescaped constituents are upper-cased before atom parsing
        assert_eq!(read_str("nil").unwrap(), Object::Nil);
        assert_eq!(read_str("()").unwrap(), Object::Nil);
    }

    #[test]
    fn test_read_symbol_upcased() {
        assert_eq!(read_symbol_name("foo"), "FOO");
        assert_eq!(read_symbol_name("hello-world"), "HELLO-WORLD");
    }

    #[test]
    fn test_read_keyword() {
        let mut symbols = SymbolTable::new();
        let rt = Readtable::new();
        match read_from_string(":test", &mut symbols, &rt).unwrap() {
            Object::Symbol(id) => {
                assert_eq!(symbols.symbol_name(id), Some("TEST"));
                assert!(symbols.get_symbol(id).unwrap().is_keyword());
            }
            other => panic!("expected keyword, got {:?}", other),
        }
    }

    #[test]
    fn test_read_string() {
        assert_eq!(
            read_str("\"hello\"").unwrap(),
            Object::String("hello".to_string())
        );
        // Backslash passes the next character through unchanged
        assert_eq!(
            read_str("\"a\\\"b\\\\c\"").unwrap(),
            Object::String("a\"b\\c".to_string())
        );
        assert_eq!(
            read_str("\"Mixed Case stays\"").unwrap(),
            Object::String("Mixed Case stays".to_string())
        );
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(read_str("\"abc"), Err(ReaderError::EndOfInput)));
    }

    #[test]
    fn test_read_list() {
        let list = read_str("(1 2 3)").unwrap();
        let elements = list.proper_list_elements().unwrap();
        assert_eq!(
            elements,
            vec![Object::Integer(1), Object::Integer(2), Object::Integer(3)]
        );
    }

    #[test]
    fn test_read_nested_list() {
        let list = read_str("(1 (2 3) 4)").unwrap();
        let elements = list.proper_list_elements().unwrap();
        assert_eq!(elements.len(), 3);
        let inner = elements[1].proper_list_elements().unwrap();
        assert_eq!(inner, vec![Object::Integer(2), Object::Integer(3)]);
    }

    #[test]
    fn test_read_dotted_pair() {
        let pair = read_str("(1 . 2)").unwrap();
        assert_eq!(pair.car(), Some(&Object::Integer(1)));
        assert_eq!(pair.cdr(), Some(&Object::Integer(2)));
        assert!(pair.proper_list_elements().is_none());
    }

    #[test]
    fn test_dotted_list_tail() {
        let list = read_str("(1 2 . (3 4))").unwrap();
        let elements = list.proper_list_elements().unwrap();
        assert_eq!(elements.len(), 4);
    }

    #[test]
    fn test_dot_at_element_position() {
        // A bare dot always starts dotted-tail processing, so the tail
        // becomes the whole result when no elements precede it
        assert_eq!(read_str("( . 2)").unwrap(), Object::Integer(2));
        assert_eq!(read_str("(.5)").unwrap(), Object::Integer(5));
        let pair = read_str("(1 .5)").unwrap();
        assert_eq!(pair.cdr(), Some(&Object::Integer(5)));
    }

    #[test]
    fn test_malformed_dotted_pair() {
        assert!(matches!(
            read_str("(1 . 2 3)"),
            Err(ReaderError::MalformedDottedPair)
        ));
    }

    #[test]
    fn test_dot_before_close() {
        // The tail read itself runs into the closing delimiter
        assert!(matches!(
            read_str("(1 .)"),
            Err(ReaderError::UnmatchedClosingDelimiter(')'))
        ));
    }

    #[test]
    fn test_dot_alone_is_a_symbol() {
        assert_eq!(read_symbol_name("."), ".");
    }

    #[test]
    fn test_unmatched_close() {
        assert!(matches!(
            read_str(")"),
            Err(ReaderError::UnmatchedClosingDelimiter(')'))
        ));
    }

    #[test]
    fn test_unterminated_list() {
        assert!(matches!(read_str("(1 2"), Err(ReaderError::EndOfInput)));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(read_str(""), Err(ReaderError::EndOfInput)));
        assert!(matches!(read_str("   \n\t"), Err(ReaderError::EndOfInput)));
    }

    #[test]
    fn test_read_quote() {
        let mut symbols = SymbolTable::new();
        let rt = Readtable::new();
        let form = read_from_string("'foo", &mut symbols, &rt).unwrap();
        let elements = form.proper_list_elements().unwrap();
        assert_eq!(elements.len(), 2);
        match &elements[0] {
            Object::Symbol(id) => assert_eq!(symbols.symbol_name(*id), Some("QUOTE")),
            other => panic!("expected QUOTE, got {:?}", other),
        }
        match &elements[1] {
            Object::Symbol(id) => assert_eq!(symbols.symbol_name(*id), Some("FOO")),
            other => panic!("expected FOO, got {:?}", other),
        }
    }

    #[test]
    fn test_line_comments() {
        assert_eq!(read_str("; note\n42").unwrap(), Object::Integer(42));
        assert_eq!(read_str("; a\n; b\n7").unwrap(), Object::Integer(7));
        let list = read_str("(1 ; inline\n 2)").unwrap();
        assert_eq!(list.proper_list_elements().unwrap().len(), 2);
    }

    #[test]
    fn test_comment_at_end_of_input() {
        // Nothing follows the comment, so the read itself has no form
        assert!(matches!(read_str("; only\n"), Err(ReaderError::EndOfInput)));
    }

    #[test]
    fn test_multi_escape_preserves_case() {
        assert_eq!(read_symbol_name("|abc|"), "abc");
        assert_eq!(read_symbol_name("|Hello World|"), "Hello World");
        assert_eq!(read_symbol_name("|a(b)c|"), "a(b)c");
        assert_eq!(read_symbol_name("foo|Bar|baz"), "FOOBarBAZ");
    }

    #[test]
    fn test_multi_escape_digits_still_parse() {
        // Escapes affect case folding only; the finished token is handed
        // to the atom parser without distinction
        assert_eq!(read_str("|123|").unwrap(), Object::Integer(123));
    }

    #[test]
    fn test_unterminated_multi_escape() {
        // End of input ends the token without error
        assert_eq!(read_symbol_name("|abc"), "abc");
    }

    #[test]
    fn test_single_escape() {
        assert_eq!(read_symbol_name("\\abc"), "aBC");
        assert_eq!(read_symbol_name("a\\bc"), "AbC");
        assert_eq!(read_symbol_name("\\(x"), "(X");
        assert!(matches!(read_str("foo\\"), Err(ReaderError::EndOfInput)));
    }

    #[test]
    fn test_character_literals() {
        assert_eq!(read_str("#\\a").unwrap(), Object::Char('a'));
        assert_eq!(read_str("#\\A").unwrap(), Object::Char('A'));
        assert_eq!(read_str("#\\(").unwrap(), Object::Char('('));
        assert_eq!(read_str("#\\5").unwrap(), Object::Char('5'));
        assert_eq!(read_str("#\\space").unwrap(), Object::Char(' '));
        assert_eq!(read_str("#\\Newline").unwrap(), Object::Char('\n'));
        assert_eq!(read_str("#\\TAB").unwrap(), Object::Char('\t'));
        assert_eq!(read_str("#\\Rubout").unwrap(), Object::Char('\x7f'));
    }

    #[test]
    fn test_invalid_character_name() {
        assert!(matches!(
            read_str("#\\bogus"),
            Err(ReaderError::InvalidCharacterName(_))
        ));
    }

    #[test]
    fn test_read_vector() {
        let vector = read_str("#(1 2 3)").unwrap();
        match vector {
            Object::Vector(elements) => {
                assert_eq!(elements.len(), 3);
                assert_eq!(elements[0], Object::Integer(1));
            }
            other => panic!("expected vector, got {:?}", other),
        }
        assert_eq!(read_str("#()").unwrap(), Object::Vector(Rc::new(Vec::new())));
    }

    #[test]
    fn test_vector_ignores_infix_argument() {
        let vector = read_str("#5(1 2)").unwrap();
        match vector {
            Object::Vector(elements) => assert_eq!(elements.len(), 2),
            other => panic!("expected vector, got {:?}", other),
        }
    }

    #[test]
    fn test_vector_rejects_dotted_tail() {
        assert!(matches!(
            read_str("#(1 . 2)"),
            Err(ReaderError::MalformedDottedPair)
        ));
    }

    #[test]
    fn test_unbound_dispatch() {
        assert!(matches!(
            read_str("#z"),
            Err(ReaderError::UnboundDispatchMacroCharacter('#', 'z'))
        ));
        assert!(matches!(read_str("#"), Err(ReaderError::EndOfInput)));
    }

    #[test]
    fn test_depth_limit() {
        let mut symbols = SymbolTable::new();
        let rt = Readtable::new();
        let mut stream = Stream::from_string("(((1)))");
        let mut reader = Reader::new_with_options(
            &mut stream,
            &mut symbols,
            &rt,
            ReaderOptions { max_depth: 4 },
        );
        assert!(reader.read().is_ok());

        let mut stream = Stream::from_string("((((1))))");
        let mut reader = Reader::new_with_options(
            &mut stream,
            &mut symbols,
            &rt,
            ReaderOptions { max_depth: 4 },
        );
        assert!(matches!(reader.read(), Err(ReaderError::NestingTooDeep)));
    }

    #[test]
    fn test_default_depth_handles_ordinary_nesting() {
        let input = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert!(read_str(&input).is_ok());
    }

    #[test]
    fn test_read_all() {
        let mut symbols = SymbolTable::new();
        let rt = Readtable::new();
        let values = read_all("1 2 3", &mut symbols, &rt).unwrap();
        assert_eq!(
            values,
            vec![Object::Integer(1), Object::Integer(2), Object::Integer(3)]
        );

        assert!(read_all("", &mut symbols, &rt).unwrap().is_empty());
        assert_eq!(read_all("1 ; trailing\n", &mut symbols, &rt).unwrap().len(), 1);
        // A truncated form still surfaces as an error
        assert!(matches!(
            read_all("1 (2", &mut symbols, &rt),
            Err(ReaderError::EndOfInput)
        ));
    }

    #[test]
    fn test_read_from_byte_stream() {
        let mut symbols = SymbolTable::new();
        let rt = Readtable::new();
        let mut stream = Stream::from_reader(std::io::Cursor::new(b"(:status 200)".to_vec()));
        let value = read(&mut stream, &mut symbols, &rt).unwrap();
        assert_eq!(value.proper_list_elements().unwrap().len(), 2);
    }

    #[test]
    fn test_sequential_reads_share_stream() {
        let mut symbols = SymbolTable::new();
        let rt = Readtable::new();
        let mut stream = Stream::from_string("42 foo");
        assert_eq!(
            read(&mut stream, &mut symbols, &rt).unwrap(),
            Object::Integer(42)
        );
        match read(&mut stream, &mut symbols, &rt).unwrap() {
            Object::Symbol(id) => assert_eq!(symbols.symbol_name(id), Some("FOO")),
            other => panic!("expected symbol, got {:?}", other),
        }
        assert!(matches!(
            read(&mut stream, &mut symbols, &rt),
            Err(ReaderError::EndOfInput)
        ));
    }
}
