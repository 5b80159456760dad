// WireCL Printer - Expression Output
//
// Renders objects back into text the reader accepts.

use crate::symbol::{SymbolId, SymbolTable};
use crate::types::{numeric_token, Cons, Object};

/// Print options
#[derive(Debug, Clone)]
pub struct PrintOptions {
    /// Print readably (escape special chars)
    pub escape: bool,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self { escape: true }
    }
}

impl PrintOptions {
    /// For prin1 (readable)
    pub fn prin1() -> Self {
        Self::default()
    }

    /// For princ (human-readable)
    pub fn princ() -> Self {
        Self { escape: false }
    }
}

/// The WireCL Printer
pub struct Printer<'a> {
    symbols: &'a SymbolTable,
    output: String,
    options: PrintOptions,
}

impl<'a> Printer<'a> {
    pub fn new(symbols: &'a SymbolTable, options: PrintOptions) -> Self {
        Self {
            symbols,
            output: String::new(),
            options,
        }
    }

    /// Print an expression to string
    pub fn print(&mut self, value: &Object) -> &str {
        self.print_object(value);
        &self.output
    }

    fn print_object(&mut self, value: &Object) {
        match value {
            Object::Nil => self.output.push_str("NIL"),
            Object::Integer(n) => self.output.push_str(&n.to_string()),
            Object::BigInt(n) => self.output.push_str(&n.to_string()),
            Object::Ratio(num, den) => {
                self.output.push_str(&num.to_string());
                self.output.push('/');
                self.output.push_str(&den.to_string());
            }
            Object::Float(f) => self.print_float(*f),
            Object::Char(c) => self.print_char(*c),
            Object::String(s) => self.print_string(s),
            Object::Symbol(id) => self.print_symbol(*id),
            Object::Cons(cell) => self.print_list(cell),
            Object::Vector(elements) => {
                self.output.push_str("#(");
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        self.output.push(' ');
                    }
                    self.print_object(element);
                }
                self.output.push(')');
            }
        }
    }

    fn print_float(&mut self, f: f64) {
        if f.is_nan() {
            self.output.push_str("NaN");
        } else if f.is_infinite() {
            if f.is_sign_positive() {
                self.output.push_str("+Inf");
            } else {
                self.output.push_str("-Inf");
            }
        } else {
            // Debug formatting keeps a decimal point or exponent, so the
            // text reads back as a float
            self.output.push_str(&format!("{:?}", f));
        }
    }

    fn print_char(&mut self, c: char) {
        if !self.options.escape {
            self.output.push(c);
            return;
        }
        self.output.push_str("#\\");
        match c {
            ' ' => self.output.push_str("Space"),
            '\n' => self.output.push_str("Newline"),
            '\t' => self.output.push_str("Tab"),
            '\r' => self.output.push_str("Return"),
            '\x0c' => self.output.push_str("Page"),
            '\x7f' => self.output.push_str("Rubout"),
            '\x08' => self.output.push_str("Backspace"),
            '\0' => self.output.push_str("Null"),
            _ => self.output.push(c),
        }
    }

    fn print_string(&mut self, s: &str) {
        if self.options.escape {
            self.output.push('"');
            for c in s.chars() {
                if c == '"' || c == '\\' {
                    self.output.push('\\');
                }
                self.output.push(c);
            }
            self.output.push('"');
        } else {
            self.output.push_str(s);
        }
    }

    fn print_symbol(&mut self, id: SymbolId) {
        let sym = match self.symbols.get_symbol(id) {
            Some(sym) => sym,
            None => {
                self.output.push_str(&format!("#<symbol:{}>", id.0));
                return;
            }
        };

        if !self.options.escape {
            self.output.push_str(&sym.name);
            return;
        }

        if sym.is_keyword() {
            self.output.push(':');
            self.push_symbol_name(&sym.name);
            return;
        }

        if let Some(pkg) = self.symbols.get_package(sym.package) {
            if pkg.name != "COMMON-LISP" {
                self.output.push_str(&pkg.name);
                self.output.push(':');
            }
        }
        self.push_symbol_name(&sym.name);
    }

    /// Names the reader would not hand back unchanged get pipe-quoted
    fn push_symbol_name(&mut self, name: &str) {
        if !symbol_name_needs_escape(name) {
            self.output.push_str(name);
            return;
        }
        self.output.push('|');
        for c in name.chars() {
            if c == '|' || c == '\\' {
                self.output.push('\\');
            }
            self.output.push(c);
        }
        self.output.push('|');
    }

    fn print_list(&mut self, cell: &Cons) {
        self.output.push('(');
        self.print_object(&cell.car);
        let mut current = &cell.cdr;
        loop {
            match current {
                Object::Nil => break,
                Object::Cons(next) => {
                    self.output.push(' ');
                    self.print_object(&next.car);
                    current = &next.cdr;
                }
                other => {
                    self.output.push_str(" . ");
                    self.print_object(other);
                    break;
                }
            }
        }
        self.output.push(')');
    }
}

fn symbol_name_needs_escape(name: &str) -> bool {
    // NIL and numeric spellings read back as non-symbols; a leading dot
    // would start dotted-tail processing inside a list
    if name.is_empty() || name == "NIL" || name.starts_with('.') {
        return true;
    }
    if numeric_token(name) {
        return true;
    }
    name.chars().any(|c| {
        c.is_lowercase()
            || c.is_whitespace()
            || matches!(c, '(' | ')' | '"' | '\'' | ';' | '#' | '\\' | '|' | ':')
    })
}

/// Print expression to string (like prin1-to-string)
pub fn print_to_string(symbols: &SymbolTable, value: &Object) -> String {
    let mut printer = Printer::new(symbols, PrintOptions::prin1());
    printer.print(value).to_string()
}

/// Print expression without escapes (like princ-to-string)
pub fn princ_to_string(symbols: &SymbolTable, value: &Object) -> String {
    let mut printer = Printer::new(symbols, PrintOptions::princ());
    printer.print(value).to_string()
}
