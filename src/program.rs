use crate::isa::Record;

/// Largest program the 8-bit program counter can address.
pub const PROGRAM_MAX: usize = 256;

/// Assembled machine program: instruction records, each optionally tagged with the raw source
/// line it came from.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct Program {
    records: Vec<Record>,
    lines: Vec<Option<usize>>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: Record, line: usize) {
        self.records.push(record);
        self.lines.push(Some(line));
    }

    pub fn get(&self, idx: usize) -> Option<&Record> {
        self.records.get(idx)
    }

    /// 0-based raw source line of the record at `idx`, if known.
    pub fn line(&self, idx: usize) -> Option<usize> {
        self.lines.get(idx).copied().flatten()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Record, Option<usize>)> {
        self.records.iter().zip(self.lines.iter().copied())
    }
}

/// Program built directly from records, without source lines.
impl From<Vec<Record>> for Program {
    fn from(records: Vec<Record>) -> Self {
        let lines = vec![None; records.len()];
        Program { records, lines }
    }
}
