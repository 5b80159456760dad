// WireCL Symbol Table and Packages
//
// Interned symbols with O(1) identity comparison.

use std::collections::HashMap;

/// Unique identifier for a symbol (index into symbol table)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(pub u32);

/// Unique identifier for a package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackageId(pub u32);

/// An interned symbol.
///
/// Names arrive from the reader already case-normalized; the table stores
/// them untouched, so `ABC` and `abc` are distinct symbols.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    /// The home package
    pub package: PackageId,
}

impl Symbol {
    /// Check if symbol is a keyword
    pub fn is_keyword(&self) -> bool {
        self.package == PackageId(0) // KEYWORD is package 0
    }
}

/// A package: a named symbol namespace
#[derive(Debug, Clone)]
pub struct Package {
    pub name: String,
    pub nicknames: Vec<String>,
    symbols: HashMap<String, SymbolId>,
}

impl Package {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            nicknames: Vec::new(),
            symbols: HashMap::new(),
        }
    }

    /// Find a symbol by exact name
    pub fn find_symbol(&self, name: &str) -> Option<SymbolId> {
        self.symbols.get(name).copied()
    }
}

/// The symbol table
#[derive(Debug)]
pub struct SymbolTable {
    /// All symbols indexed by SymbolId
    symbols: Vec<Symbol>,
    /// All packages indexed by PackageId
    packages: Vec<Package>,
    /// Package name or nickname -> PackageId lookup
    package_names: HashMap<String, PackageId>,
    /// Where unqualified symbols are interned
    default_package: PackageId,
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut table = Self {
            symbols: Vec::new(),
            packages: Vec::new(),
            package_names: HashMap::new(),
            default_package: PackageId(1),
        };

        table.create_package("KEYWORD"); // PackageId(0)
        table.create_package("COMMON-LISP"); // PackageId(1)

        table
    }

    /// Create a new package
    pub fn create_package(&mut self, name: &str) -> PackageId {
        let id = PackageId(self.packages.len() as u32);
        let mut pkg = Package::new(name);

        if name == "COMMON-LISP" {
            pkg.nicknames.push("CL".to_string());
        }

        self.package_names.insert(pkg.name.clone(), id);
        for nick in &pkg.nicknames {
            self.package_names.insert(nick.clone(), id);
        }

        self.packages.push(pkg);
        id
    }

    /// Find a package by name or nickname
    pub fn find_package(&self, name: &str) -> Option<PackageId> {
        self.package_names.get(name).copied()
    }

    /// Find a package, creating it on first mention
    pub fn ensure_package(&mut self, name: &str) -> PackageId {
        match self.find_package(name) {
            Some(id) => id,
            None => self.create_package(name),
        }
    }

    /// The package unqualified symbols are interned in
    pub fn default_package(&self) -> PackageId {
        self.default_package
    }

    /// Get a package by ID
    pub fn get_package(&self, id: PackageId) -> Option<&Package> {
        self.packages.get(id.0 as usize)
    }

    /// Get a symbol by ID
    pub fn get_symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.0 as usize)
    }

    /// Intern a symbol in the default package
    pub fn intern(&mut self, name: &str) -> SymbolId {
        self.intern_in(name, self.default_package)
    }

    /// Intern a symbol in a specific package
    pub fn intern_in(&mut self, name: &str, pkg_id: PackageId) -> SymbolId {
        if let Some(pkg) = self.packages.get(pkg_id.0 as usize) {
            if let Some(sym) = pkg.find_symbol(name) {
                return sym;
            }
        }

        let sym_id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(Symbol {
            name: name.to_string(),
            package: pkg_id,
        });

        if let Some(pkg) = self.packages.get_mut(pkg_id.0 as usize) {
            pkg.symbols.insert(name.to_string(), sym_id);
        }

        sym_id
    }

    /// Intern a keyword (in KEYWORD package)
    pub fn intern_keyword(&mut self, name: &str) -> SymbolId {
        self.intern_in(name, PackageId(0))
    }

    /// Get the name of a symbol
    pub fn symbol_name(&self, id: SymbolId) -> Option<&str> {
        self.get_symbol(id).map(|s| s.name.as_str())
    }

    /// Get the package of a symbol
    pub fn symbol_package(&self, id: SymbolId) -> Option<PackageId> {
        self.get_symbol(id).map(|s| s.package)
    }

    /// Get the name of a package
    pub fn package_name(&self, id: PackageId) -> Option<&str> {
        self.get_package(id).map(|p| p.name.as_str())
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
