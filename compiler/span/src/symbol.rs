use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

/// An interned identifier. Two `Symbol`s compare equal iff their underlying
/// strings are equal, in O(1), since source identifiers are reused constantly
/// across a scope chain (parameter names, loop variables, repeated calls).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(u32);

struct Interner {
    strings: Vec<&'static str>,
    lookup: HashMap<&'static str, u32>,
}

impl Interner {
    fn new() -> Self {
        Self { strings: Vec::new(), lookup: HashMap::new() }
    }

    fn intern(&mut self, s: &str) -> Symbol {
        if let Some(&id) = self.lookup.get(s) {
            return Symbol(id);
        }
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let id = self.strings.len() as u32;
        self.strings.push(leaked);
        self.lookup.insert(leaked, id);
        Symbol(id)
    }

    fn resolve(&self, id: u32) -> &'static str {
        self.strings[id as usize]
    }
}

static INTERNER: Lazy<Mutex<Interner>> = Lazy::new(|| Mutex::new(Interner::new()));

impl Symbol {
    pub fn intern(s: &str) -> Self {
        INTERNER.lock().unwrap().intern(s)
    }

    pub fn as_str(&self) -> &'static str {
        INTERNER.lock().unwrap().resolve(self.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::intern(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Symbol::intern(&s)
    }
}

/// Case-insensitively matches `word` against a reserved keyword, comparing
/// against the reserved-word table below.
pub mod keywords {
    /// The closed set of reserved words, upper-cased.
    pub const RESERVED: &[&str] = &[
        "MODULE", "BEGIN", "END", "CONST", "VAR", "PROCEDURE", "IF", "THEN", "ELSE", "WHILE", "DO", "FOR", "TO",
        "RETURN", "INTEGER", "REAL", "STRING", "ARRAY", "OF", "DIV", "MOD", "AND", "OR",
    ];

    pub fn is_reserved(word: &str) -> bool {
        let upper = word.to_ascii_uppercase();
        RESERVED.contains(&upper.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_pointer_stable_for_equal_strings() {
        let a = Symbol::intern("foo");
        let b = Symbol::intern("foo");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "foo");
    }

    #[test]
    fn distinct_strings_intern_distinctly() {
        assert_ne!(Symbol::intern("foo"), Symbol::intern("bar"));
    }

    #[test]
    fn keyword_matching_is_case_insensitive() {
        assert!(keywords::is_reserved("begin"));
        assert!(keywords::is_reserved("BEGIN"));
        assert!(keywords::is_reserved("BeGiN"));
        assert!(!keywords::is_reserved("result"));
    }
}
