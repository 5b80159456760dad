// WireCL Object Representation
//
// Values produced by the reader: numbers, characters, strings, symbols,
// conses and vectors, plus the token-to-atom parser.

use std::rc::Rc;
use std::sync::OnceLock;

use num_bigint::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};
use regex::Regex;

use crate::reader::ReaderError;
use crate::symbol::{SymbolId, SymbolTable};

/// A value read from the wire
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Nil,
    /// Fixnum-sized integer
    Integer(i64),
    /// Integer outside i64 range
    BigInt(BigInt),
    /// Exact ratio, normalized: lowest terms, positive denominator
    Ratio(BigInt, BigInt),
    Float(f64),
    Char(char),
    String(String),
    Symbol(SymbolId),
    Cons(Rc<Cons>),
    Vector(Rc<Vec<Object>>),
}

/// A cons cell
#[derive(Debug, Clone, PartialEq)]
pub struct Cons {
    pub car: Object,
    pub cdr: Object,
}

impl Object {
    /// Construct a cons cell
    pub fn cons(car: Object, cdr: Object) -> Object {
        Object::Cons(Rc::new(Cons { car, cdr }))
    }

    /// Build a proper list from elements
    pub fn from_vec(elements: Vec<Object>) -> Object {
        elements
            .into_iter()
            .rev()
            .fold(Object::Nil, |tail, head| Object::cons(head, tail))
    }

    /// Build a list ending in an arbitrary tail
    pub fn list_with_tail(elements: Vec<Object>, tail: Object) -> Object {
        elements
            .into_iter()
            .rev()
            .fold(tail, |tail, head| Object::cons(head, tail))
    }

    /// First element, if this is a cons
    pub fn car(&self) -> Option<&Object> {
        match self {
            Object::Cons(cell) => Some(&cell.car),
            _ => None,
        }
    }

    /// Rest of the list, if this is a cons
    pub fn cdr(&self) -> Option<&Object> {
        match self {
            Object::Cons(cell) => Some(&cell.cdr),
            _ => None,
        }
    }

    /// Collect the elements of a nil-terminated list.
    /// Returns None for improper lists and non-lists.
    pub fn proper_list_elements(&self) -> Option<Vec<Object>> {
        let mut elements = Vec::new();
        let mut current = self;
        loop {
            match current {
                Object::Nil => return Some(elements),
                Object::Cons(cell) => {
                    elements.push(cell.car.clone());
                    current = &cell.cdr;
                }
                _ => return None,
            }
        }
    }
}

fn integer_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?[0-9]+\.?$").expect("could not compile regex for integer")
    })
}

fn ratio_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([+-]?[0-9]+)/([0-9]+)$").expect("could not compile regex for ratio")
    })
}

fn float_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([+-]?[0-9]*\.[0-9]+)(?:[esfdlESFDL]([+-]?[0-9]+))?$")
            .expect("could not compile regex for float")
    })
}

fn exponent_float_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([+-]?[0-9]+)[esfdlESFDL]([+-]?[0-9]+)$")
            .expect("could not compile regex for exponent float")
    })
}

/// True when a token would parse as a number rather than a symbol
pub(crate) fn numeric_token(token: &str) -> bool {
    integer_regex().is_match(token)
        || ratio_regex().is_match(token)
        || float_regex().is_match(token)
        || exponent_float_regex().is_match(token)
}

/// Parse an accumulated token into an atom.
///
/// Numbers are tried first (integer, ratio, float), everything else
/// becomes a symbol. The token `NIL` reads as the empty list.
pub fn parse_atom(token: &str, symbols: &mut SymbolTable) -> Result<Object, ReaderError> {
    if token == "NIL" {
        return Ok(Object::Nil);
    }
    if integer_regex().is_match(token) {
        let digits = token.strip_suffix('.').unwrap_or(token);
        return parse_integer(digits);
    }
    if let Some(caps) = ratio_regex().captures(token) {
        return parse_ratio(&caps[1], &caps[2]);
    }
    if let Some(caps) = float_regex().captures(token) {
        // Exponent markers e/s/f/d/l all map onto f64
        let text = match caps.get(2) {
            Some(exp) => format!("{}e{}", &caps[1], exp.as_str()),
            None => caps[1].to_string(),
        };
        return parse_float(&text, token);
    }
    if let Some(caps) = exponent_float_regex().captures(token) {
        let text = format!("{}e{}", &caps[1], &caps[2]);
        return parse_float(&text, token);
    }
    Ok(parse_symbol(token, symbols))
}

/// Integers parse through BigInt and demote to i64 when they fit
fn parse_integer(digits: &str) -> Result<Object, ReaderError> {
    let n: BigInt = digits
        .parse()
        .map_err(|_| ReaderError::InvalidNumber(digits.to_string()))?;
    Ok(bigint_object(n))
}

fn parse_ratio(num: &str, den: &str) -> Result<Object, ReaderError> {
    let mut numerator: BigInt = num
        .parse()
        .map_err(|_| ReaderError::InvalidNumber(num.to_string()))?;
    let mut denominator: BigInt = den
        .parse()
        .map_err(|_| ReaderError::InvalidNumber(den.to_string()))?;

    if denominator.is_zero() {
        return Err(ReaderError::InvalidNumber(format!("{}/{}", num, den)));
    }

    let g = gcd(numerator.abs(), denominator.clone());
    if !g.is_one() {
        numerator /= &g;
        denominator /= &g;
    }
    if denominator.is_one() {
        return Ok(bigint_object(numerator));
    }
    Ok(Object::Ratio(numerator, denominator))
}

fn parse_float(text: &str, token: &str) -> Result<Object, ReaderError> {
    let value: f64 = text
        .parse()
        .map_err(|_| ReaderError::InvalidNumber(token.to_string()))?;
    Ok(Object::Float(value))
}

fn parse_symbol(token: &str, symbols: &mut SymbolTable) -> Object {
    if let Some(name) = token.strip_prefix(':') {
        return Object::Symbol(symbols.intern_keyword(name));
    }
    if let Some(idx) = token.find(':') {
        let pkg_name = &token[..idx];
        let rest = &token[idx + 1..];
        // PKG::NAME and PKG:NAME reach the same symbol here
        let name = rest.strip_prefix(':').unwrap_or(rest);
        let pkg = symbols.ensure_package(pkg_name);
        return Object::Symbol(symbols.intern_in(name, pkg));
    }
    Object::Symbol(symbols.intern(token))
}

fn bigint_object(n: BigInt) -> Object {
    match n.to_i64() {
        Some(small) => Object::Integer(small),
        None => Object::BigInt(n),
    }
}

fn gcd(mut a: BigInt, mut b: BigInt) -> BigInt {
    while !b.is_zero() {
        let r = &a % &b;
        a = b;
        b = r;
    }
    a
}
