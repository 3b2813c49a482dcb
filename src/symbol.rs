use std::{fmt, str::FromStr};

use fxhash::FxBuildHasher;
use indexmap::{map::Entry, IndexMap};

/// Marks a label token, both where it is defined and where it is referenced.
pub const LABEL_MARKER: char = ':';

// Tag table of label (marker included) -> (target index, defining line)
type FxMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// One of the 16 general purpose registers, or an I/O register index.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Register(u8);

impl Register {
    pub const COUNT: usize = 16;

    pub const R0: Register = Register(0);
    /// Left-hand side of every `BEQ`/`BGT` comparison.
    pub const R15: Register = Register(15);

    pub fn new(index: u8) -> Option<Self> {
        (usize::from(index) < Self::COUNT).then_some(Register(index))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Returns true if the token refers to or defines a label.
pub fn is_label(token: &str) -> bool {
    token.contains(LABEL_MARKER)
}

/// What a label resolves to.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub enum TagIndexing {
    /// Index of the raw source line holding the label, counting blank and comment lines.
    #[default]
    RawLine,
    /// Index of the next instruction emitted at or after the label.
    Emitted,
}

impl FromStr for TagIndexing {
    type Err = String;
    fn from_str(string: &str) -> Result<Self, Self::Err> {
        match string.trim() {
            "raw" | "line" => Ok(TagIndexing::RawLine),
            "emitted" | "instruction" => Ok(TagIndexing::Emitted),
            other => Err(format!(
                "Unknown tag indexing '{}', expected 'raw' or 'emitted'",
                other
            )),
        }
    }
}

impl fmt::Display for TagIndexing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagIndexing::RawLine => write!(f, "raw"),
            TagIndexing::Emitted => write!(f, "emitted"),
        }
    }
}

/// Labels defined during a single assembly run.
#[derive(Clone, Default, Debug)]
pub struct TagTable {
    table: FxMap<String, (usize, usize)>,
}

impl TagTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a label defined on `line`. If the label already existed, returns the line of its
    /// first definition and leaves the table untouched.
    pub fn define(&mut self, label: &str, target: usize, line: usize) -> Result<(), usize> {
        match self.table.entry(label.to_owned()) {
            Entry::Occupied(entry) => Err(entry.get().1),
            Entry::Vacant(entry) => {
                entry.insert((target, line));
                Ok(())
            }
        }
    }

    pub fn get(&self, label: &str) -> Option<usize> {
        self.table.get(label).map(|&(target, _)| target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_bounds() {
        assert_eq!(Register::new(0), Some(Register::R0));
        assert_eq!(Register::new(15), Some(Register::R15));
        assert_eq!(Register::new(16), None);
        assert_eq!(Register::R15.to_string(), "r15");
    }

    #[test]
    fn tag_table_rejects_redefinition() {
        let mut tags = TagTable::new();
        assert_eq!(tags.define("loop:", 3, 4), Ok(()));
        assert_eq!(tags.define("end:", 9, 12), Ok(()));
        // Reports where the label was first defined, not what it points at
        assert_eq!(tags.define("loop:", 7, 10), Err(4));
        assert_eq!(tags.get("loop:"), Some(3));
        assert_eq!(tags.get("loop"), None);
        assert_eq!(tags.get("end:"), Some(9));
    }

    #[test]
    fn tag_indexing_from_str() {
        assert_eq!("raw".parse(), Ok(TagIndexing::RawLine));
        assert_eq!("emitted".parse(), Ok(TagIndexing::Emitted));
        assert!("both".parse::<TagIndexing>().is_err());
        assert_eq!(TagIndexing::default(), TagIndexing::RawLine);
    }
}
