//! Interned strings and the pool that canonicalizes them
//!
//! Every string the compiler or VM materializes goes through
//! [`Strings::intern`], which returns the one canonical [`FiString`] for
//! a given byte content. Two interned strings are byte-equal exactly
//! when they are the same allocation, so equality is a pointer
//! comparison and strings can key the globals map by identity.
//!
//! The pool itself is a [`Hashmap`] whose keys are the interned strings
//! and whose values are all `Nil`: the key set is the data. Interned
//! strings live until the pool is dropped; there is no collection.

use crate::hashmap::{Hashmap, fnv1a};
use crate::value::Value;
use std::fmt;
use std::rc::Rc;

struct StrData {
    hash: u32,
    chars: Box<str>,
}

/// Shared handle to a pool-managed string. Carries the precomputed
/// FNV-1a hash of its bytes.
#[derive(Clone)]
pub struct FiString {
    data: Rc<StrData>,
}

impl FiString {
    fn new(chars: &str, hash: u32) -> Self {
        FiString {
            data: Rc::new(StrData {
                hash,
                chars: chars.into(),
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.data.chars
    }

    pub fn hash(&self) -> u32 {
        self.data.hash
    }

    pub fn len(&self) -> usize {
        self.data.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.chars.is_empty()
    }
}

// Identity comparison. Interning guarantees byte-equal strings share an
// allocation, so this is also content equality for pooled strings.
impl PartialEq for FiString {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

impl Eq for FiString {}

impl fmt::Debug for FiString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FiString({:?})", self.as_str())
    }
}

impl fmt::Display for FiString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The string pool. Owned by the VM and shared with the compiler while a
/// chunk is being built, so name constants intern into the same pool the
/// runtime concatenates into.
pub struct Strings {
    pool: Hashmap,
}

impl Strings {
    pub fn new() -> Self {
        Strings {
            pool: Hashmap::new(),
        }
    }

    /// Return the canonical string for `chars`, creating it on first
    /// sight.
    pub fn intern(&mut self, chars: &str) -> FiString {
        let hash = fnv1a(chars.as_bytes());
        if let Some(existing) = self.pool.find_string(chars, hash) {
            return existing;
        }

        let string = FiString::new(chars, hash);
        self.pool.insert(Value::Str(string.clone()), Value::Nil);
        string
    }

    /// Concatenate two strings and intern the result.
    pub fn concat(&mut self, a: &FiString, b: &FiString) -> FiString {
        let mut joined = String::with_capacity(a.len() + b.len());
        joined.push_str(a.as_str());
        joined.push_str(b.as_str());
        self.intern(&joined)
    }

    /// Number of distinct strings in the pool.
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.len() == 0
    }
}

impl Default for Strings {
    fn default() -> Self {
        Strings::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning_is_identity() {
        let mut strings = Strings::new();
        let a = strings.intern("hello");
        let b = strings.intern("hello");
        let c = strings.intern("world");

        assert_eq!(a, b);
        assert!(Rc::ptr_eq(&a.data, &b.data));
        assert_ne!(a, c);
        assert_eq!(strings.len(), 2);
    }

    #[test]
    fn test_intern_empty_string() {
        let mut strings = Strings::new();
        let a = strings.intern("");
        let b = strings.intern("");
        assert_eq!(a, b);
        assert!(a.is_empty());
    }

    #[test]
    fn test_concat_interns() {
        let mut strings = Strings::new();
        let hi = strings.intern("hi");
        let two = strings.intern("2");
        let joined = strings.concat(&hi, &two);
        assert_eq!(joined.as_str(), "hi2");

        // concatenating again hits the pooled copy
        let again = strings.concat(&hi, &two);
        assert_eq!(joined, again);
    }

    #[test]
    fn test_hash_is_cached_fnv1a() {
        let mut strings = Strings::new();
        let s = strings.intern("abc");
        assert_eq!(s.hash(), fnv1a(b"abc"));
    }

    #[test]
    fn test_many_strings_survive_growth() {
        let mut strings = Strings::new();
        let mut first_batch = Vec::new();
        for i in 0..64 {
            first_batch.push(strings.intern(&format!("s{}", i)));
        }
        // the pool has grown several times by now; earlier handles must
        // still be canonical
        for (i, s) in first_batch.iter().enumerate() {
            assert_eq!(*s, strings.intern(&format!("s{}", i)));
        }
    }
}
