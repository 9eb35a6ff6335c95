//! Entries of an instruction stream.
//!
//! Besides instructions, a stream carries markers that describe structure without
//! executing anything: branch targets, the boundaries of protected regions, the start of
//! exception handlers and source positions. Control flow analysis reads these markers to
//! place block boundaries and exception edges.

use std::{fmt, sync::Arc};

use crate::ir::Instruction;

/// A branch target name, allocated by [`crate::ir::InstructionStream::new_label`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label(pub(crate) u32);

impl Label {
    /// Returns the raw index of this label.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Identifies one protected region and its handler.
///
/// Every exception table entry of a method becomes its own region, so two entries with
/// the same range but different handlers are separate regions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegionId(pub(crate) u32);

impl RegionId {
    /// Returns the raw index of this region.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// Whether a [`TryMarker`] opens or closes its region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TryKind {
    /// Entries after this marker are protected
    Start,
    /// Entries after this marker are no longer protected
    End,
}

/// Boundary of a protected region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TryMarker {
    /// Start or end
    pub kind: TryKind,
    /// The region this marker bounds
    pub region: RegionId,
}

/// Start of the handler code for a protected region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CatchMarker {
    /// The region whose exceptions land here
    pub region: RegionId,
    /// Constant pool index of the caught class, `None` for catch-all and `finally`
    pub catch_type: Option<u16>,
}

/// A source position.
///
/// Positions form a chain through `parent` when code was inlined from another method:
/// the innermost position is the entry itself and each parent is the call site it was
/// inlined into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    /// Source line number
    pub line: u32,
    /// Source file name, if known
    pub file: Option<Arc<str>>,
    /// The position this one was inlined into
    pub parent: Option<Arc<Position>>,
}

impl Position {
    /// Creates a top-level position.
    #[must_use]
    pub fn new(line: u32, file: Option<Arc<str>>) -> Self {
        Position {
            line,
            file,
            parent: None,
        }
    }

    /// Creates a position nested inside `parent`.
    #[must_use]
    pub fn with_parent(line: u32, file: Option<Arc<str>>, parent: Arc<Position>) -> Self {
        Position {
            line,
            file,
            parent: Some(parent),
        }
    }

    /// Returns this position followed by each enclosing parent, innermost first.
    #[must_use]
    pub fn stack(&self) -> Vec<&Position> {
        let mut stack = vec![self];
        let mut current = self.parent.as_deref();
        while let Some(parent) = current {
            stack.push(parent);
            current = parent.parent.as_deref();
        }
        stack
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}", file, self.line),
            None => write!(f, "<unknown>:{}", self.line),
        }
    }
}

/// One element of an instruction stream.
#[derive(Clone, Debug, PartialEq)]
pub enum Entry {
    /// An executable instruction
    Instruction(Instruction),
    /// Marks the position a label refers to
    Target(Label),
    /// Start or end of a protected region
    Try(TryMarker),
    /// Start of an exception handler
    Catch(CatchMarker),
    /// Source position of the following instructions
    Position(Arc<Position>),
}

impl Entry {
    /// Shorthand for a [`TryKind::Start`] marker.
    #[must_use]
    pub fn try_start(region: RegionId) -> Self {
        Entry::Try(TryMarker {
            kind: TryKind::Start,
            region,
        })
    }

    /// Shorthand for a [`TryKind::End`] marker.
    #[must_use]
    pub fn try_end(region: RegionId) -> Self {
        Entry::Try(TryMarker {
            kind: TryKind::End,
            region,
        })
    }

    /// Shorthand for a handler marker.
    #[must_use]
    pub fn catch(region: RegionId, catch_type: Option<u16>) -> Self {
        Entry::Catch(CatchMarker { region, catch_type })
    }

    /// Returns the instruction if this entry is one.
    #[must_use]
    pub fn as_instruction(&self) -> Option<&Instruction> {
        match self {
            Entry::Instruction(instruction) => Some(instruction),
            _ => None,
        }
    }

    /// Returns `true` for instruction entries.
    #[must_use]
    pub fn is_instruction(&self) -> bool {
        matches!(self, Entry::Instruction(_))
    }

    /// Returns `true` for `goto` and `goto_w` instructions.
    #[must_use]
    pub fn is_goto(&self) -> bool {
        self.as_instruction().is_some_and(Instruction::is_goto)
    }

    /// Returns `true` for try and catch markers.
    #[must_use]
    pub fn is_exception_marker(&self) -> bool {
        matches!(self, Entry::Try(_) | Entry::Catch(_))
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Instruction(instruction) => write!(f, "{}", instruction),
            Entry::Target(label) => write!(f, "{}:", label),
            Entry::Try(TryMarker {
                kind: TryKind::Start,
                region,
            }) => write!(f, ".try_start {}", region),
            Entry::Try(TryMarker {
                kind: TryKind::End,
                region,
            }) => write!(f, ".try_end {}", region),
            Entry::Catch(CatchMarker {
                region,
                catch_type: Some(index),
            }) => write!(f, ".catch {} #{}", region, index),
            Entry::Catch(CatchMarker {
                region,
                catch_type: None,
            }) => write!(f, ".catch {} any", region),
            Entry::Position(position) => write!(f, ".line {}", position),
        }
    }
}
