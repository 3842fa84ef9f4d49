use derive_more::Display;

/// A position in a list of [`Instruction`](super::Instruction)s that jumps and exception
/// handlers refer to.
///
/// Labels read from a class file are named after the offset of the instruction they mark.
/// Labels created by a [`CodeBuilder`](super::CodeBuilder) are numbered in creation order.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[display("L{_0}")]
pub struct Label(pub(crate) u32);

impl Label {
    /// Creates a label with the given id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the id of the label.
    #[must_use]
    pub const fn id(self) -> u32 {
        self.0
    }
}
