use std::ops::Range;

use miette::SourceSpan;

/// Byte position relative to start of source.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct Idx(pub u32);

/// Holds a view into a source.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash, Debug)]
pub struct Span {
    start: Idx,
    len: u32,
}

impl Span {
    pub fn new(start: Idx, len: u32) -> Self {
        Span { start, len }
    }

    /// Span covering `start..end` byte offsets.
    pub fn between(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span must not end before it starts");
        Span::new(Idx(start as u32), (end - start) as u32)
    }

    pub fn start(&self) -> usize {
        self.start.0 as usize
    }

    pub fn end(&self) -> usize {
        self.start() + self.len()
    }

    fn len(&self) -> usize {
        self.len as usize
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start()..self.end()
    }
}

impl From<Span> for SourceSpan {
    fn from(value: Span) -> Self {
        SourceSpan::new(value.start().into(), value.len())
    }
}
