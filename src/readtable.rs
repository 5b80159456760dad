// WireCL Readtable
//
// Syntactic character types and macro handler dispatch tables.

use std::collections::HashMap;

use crate::reader::{Reader, ReaderError};
use crate::types::Object;

/// Character Syntax Types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxType {
    Constituent,
    Whitespace,
    TerminatingMacro,
    NonTerminatingMacro,
    SingleEscape, // \
    MultiEscape,  // |
}

/// What a macro handler produced
#[derive(Debug, Clone, PartialEq)]
pub enum MacroOutcome {
    /// A complete value, returned from the enclosing read
    Value(Object),
    /// No value: comments and other ignorable constructs
    Skip,
}

pub type MacroResult = Result<MacroOutcome, ReaderError>;

/// Reader Macro Function Signature
/// Takes the Reader and the triggering character.
pub type ReaderMacroFn = fn(&mut Reader<'_>, char) -> MacroResult;

/// Dispatch Macro Function Signature
/// Takes the Reader, the sub-character and the numeric infix argument.
pub type DispatchMacroFn = fn(&mut Reader<'_>, char, u64) -> MacroResult;

/// The Readtable.
///
/// Built once, then passed by shared reference into every reader that
/// should speak its dialect. All registration happens before the first
/// reader borrows it.
#[derive(Clone)]
pub struct Readtable {
    syntax_types: HashMap<char, SyntaxType>,
    macro_functions: HashMap<char, ReaderMacroFn>,
    dispatch_tables: HashMap<char, HashMap<char, DispatchMacroFn>>,
    default_syntax: SyntaxType,
}

impl Readtable {
    pub fn new() -> Self {
        let mut rt = Self {
            syntax_types: HashMap::new(),
            macro_functions: HashMap::new(),
            dispatch_tables: HashMap::new(),
            default_syntax: SyntaxType::Constituent,
        };
        rt.initialize_standard();
        rt
    }

    fn initialize_standard(&mut self) {
        // Whitespace
        for c in [' ', '\t', '\n', '\r', '\x0c'] {
            self.set_syntax_type(c, SyntaxType::Whitespace);
        }

        // Macros (Terminating)
        self.set_syntax_type('(', SyntaxType::TerminatingMacro);
        self.set_syntax_type(')', SyntaxType::TerminatingMacro);
        self.set_syntax_type('"', SyntaxType::TerminatingMacro);
        self.set_syntax_type('\'', SyntaxType::TerminatingMacro);
        self.set_syntax_type(';', SyntaxType::TerminatingMacro);

        // Macros (Non-Terminating)
        self.set_syntax_type('#', SyntaxType::NonTerminatingMacro);

        // Escapes
        self.set_syntax_type('\\', SyntaxType::SingleEscape);
        self.set_syntax_type('|', SyntaxType::MultiEscape);

        // Standard macro functions
        self.set_macro_character('(', Some(macro_left_paren));
        self.set_macro_character(')', Some(macro_right_paren));
        self.set_macro_character('"', Some(macro_string));
        self.set_macro_character('\'', Some(macro_quote));
        self.set_macro_character(';', Some(macro_comment));
        self.set_macro_character('#', Some(macro_dispatch));

        // Dispatch macro table
        self.make_dispatch_macro_character('#');
        self.set_dispatch_macro_character('#', '\\', Some(dispatch_character));
        self.set_dispatch_macro_character('#', '(', Some(dispatch_vector));
    }

    pub fn get_syntax_type(&self, c: char) -> SyntaxType {
        *self.syntax_types.get(&c).unwrap_or(&self.default_syntax)
    }

    pub fn set_syntax_type(&mut self, c: char, syntax: SyntaxType) {
        self.syntax_types.insert(c, syntax);
    }

    pub fn get_macro_character(&self, c: char) -> Option<ReaderMacroFn> {
        self.macro_functions.get(&c).copied()
    }

    pub fn set_macro_character(&mut self, c: char, func: Option<ReaderMacroFn>) {
        if let Some(f) = func {
            self.macro_functions.insert(c, f);
        } else {
            self.macro_functions.remove(&c);
        }
    }

    pub fn make_dispatch_macro_character(&mut self, c: char) {
        self.dispatch_tables.entry(c).or_insert_with(HashMap::new);
    }

    pub fn is_dispatch_macro_character(&self, c: char) -> bool {
        self.dispatch_tables.contains_key(&c)
    }

    /// Sub-characters are case-insensitive: stored and looked up uppercased
    pub fn set_dispatch_macro_character(
        &mut self,
        disp: char,
        sub: char,
        func: Option<DispatchMacroFn>,
    ) {
        let table = self.dispatch_tables.entry(disp).or_insert_with(HashMap::new);
        let sub = sub.to_ascii_uppercase();
        if let Some(f) = func {
            table.insert(sub, f);
        } else {
            table.remove(&sub);
        }
    }

    pub fn get_dispatch_macro_character(&self, disp: char, sub: char) -> Option<DispatchMacroFn> {
        self.dispatch_tables
            .get(&disp)
            .and_then(|t| t.get(&sub.to_ascii_uppercase()))
            .copied()
    }

    pub fn is_whitespace(&self, c: char) -> bool {
        self.get_syntax_type(c) == SyntaxType::Whitespace
    }
}

impl Default for Readtable {
    fn default() -> Self {
        Self::new()
    }
}

fn macro_left_paren(reader: &mut Reader, _c: char) -> MacroResult {
    let list = reader.read_delimited_list(')')?;
    Ok(MacroOutcome::Value(list))
}

fn macro_right_paren(_reader: &mut Reader, c: char) -> MacroResult {
    Err(ReaderError::UnmatchedClosingDelimiter(c))
}

fn macro_string(reader: &mut Reader, _c: char) -> MacroResult {
    Ok(MacroOutcome::Value(reader.read_string_literal()?))
}

fn macro_quote(reader: &mut Reader, _c: char) -> MacroResult {
    Ok(MacroOutcome::Value(reader.read_quote()?))
}

fn macro_comment(reader: &mut Reader, _c: char) -> MacroResult {
    reader.skip_line_comment()?;
    Ok(MacroOutcome::Skip)
}

fn macro_dispatch(reader: &mut Reader, c: char) -> MacroResult {
    reader.read_dispatch(c)
}

fn dispatch_character(reader: &mut Reader, _sub: char, _arg: u64) -> MacroResult {
    Ok(MacroOutcome::Value(reader.read_character()?))
}

fn dispatch_vector(reader: &mut Reader, _sub: char, _arg: u64) -> MacroResult {
    Ok(MacroOutcome::Value(reader.read_vector()?))
}
