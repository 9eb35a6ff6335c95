//! Mutable instruction stream with stable entry handles.
//!
//! [`InstructionStream`] stores the entries of one method body as a doubly-linked list
//! laid out in an arena. An [`EntryId`] is the arena slot of an entry; slots are never
//! reused, so a handle stays valid across any edit that does not erase its own entry,
//! and an erased handle is detected instead of silently aliasing a newer entry.
//!
//! Every mutation bumps the stream's generation counter. Control flow graphs record the
//! generation they were built from, which is how a graph notices that it went stale.
//!
//! # Examples
//!
//! ```rust
//! use jarscope::ir::{Entry, Instruction, InstructionStream, Opcode};
//!
//! let mut stream = InstructionStream::new();
//! let exit = stream.new_label();
//!
//! let jump = stream.push_back(Entry::Instruction(Instruction::goto(exit)));
//! stream.push_back(Entry::Target(exit));
//! stream.push_back(Entry::Instruction(Instruction::simple(Opcode::Return)));
//!
//! let nop = stream.insert_before(jump, Entry::Instruction(Instruction::simple(Opcode::Nop)))?;
//! assert_eq!(stream.first(), Some(nop));
//! assert_eq!(stream.count_instructions(), 3);
//!
//! stream.erase(jump)?;
//! assert!(stream.erase(jump).is_err());
//! # Ok::<(), jarscope::Error>(())
//! ```

use std::fmt;

use crate::{
    ir::{Entry, Label, RegionId},
    Error, Result,
};

/// Stable handle to one entry of an [`InstructionStream`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(pub(crate) usize);

impl EntryId {
    /// Returns the raw arena index of this handle.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

#[derive(Clone, Debug)]
struct Node {
    /// `None` once the entry has been erased
    entry: Option<Entry>,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Ordered, mutable sequence of [`Entry`] values.
#[derive(Clone, Debug, Default)]
pub struct InstructionStream {
    nodes: Vec<Node>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
    instructions: usize,
    generation: u64,
    next_label: u32,
    next_region: u32,
}

impl InstructionStream {
    /// Creates an empty stream.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the stream holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of live instruction entries. Markers are not counted.
    #[must_use]
    pub fn count_instructions(&self) -> usize {
        self.instructions
    }

    /// Modification counter, incremented by every mutation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Allocates a fresh label.
    ///
    /// The label is not placed anywhere; push an [`Entry::Target`] for it.
    pub fn new_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    /// Allocates a fresh protected region id.
    pub fn new_region(&mut self) -> RegionId {
        let region = RegionId(self.next_region);
        self.next_region += 1;
        region
    }

    /// Handle of the first entry.
    #[must_use]
    pub fn first(&self) -> Option<EntryId> {
        self.head.map(EntryId)
    }

    /// Handle of the last entry.
    #[must_use]
    pub fn last(&self) -> Option<EntryId> {
        self.tail.map(EntryId)
    }

    /// Returns `true` if `position` refers to a live entry.
    #[must_use]
    pub fn contains(&self, position: EntryId) -> bool {
        self.nodes
            .get(position.0)
            .is_some_and(|node| node.entry.is_some())
    }

    fn node(&self, position: EntryId) -> Result<&Node> {
        match self.nodes.get(position.0) {
            Some(node) if node.entry.is_some() => Ok(node),
            _ => Err(Error::InvalidPosition(position)),
        }
    }

    fn check(&self, position: EntryId) -> Result<()> {
        self.node(position).map(|_| ())
    }

    /// The entry at `position`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidPosition`] if `position` is not a live entry.
    pub fn get(&self, position: EntryId) -> Result<&Entry> {
        match self.nodes.get(position.0).and_then(|node| node.entry.as_ref()) {
            Some(entry) => Ok(entry),
            None => Err(Error::InvalidPosition(position)),
        }
    }

    /// The entry following `position`, or `None` at the end of the stream.
    ///
    /// # Errors
    /// Returns [`Error::InvalidPosition`] if `position` is not a live entry.
    pub fn next(&self, position: EntryId) -> Result<Option<EntryId>> {
        Ok(self.node(position)?.next.map(EntryId))
    }

    /// The entry preceding `position`, or `None` at the start of the stream.
    ///
    /// # Errors
    /// Returns [`Error::InvalidPosition`] if `position` is not a live entry.
    pub fn prev(&self, position: EntryId) -> Result<Option<EntryId>> {
        Ok(self.node(position)?.prev.map(EntryId))
    }

    fn allocate(&mut self, entry: Entry, prev: Option<usize>, next: Option<usize>) -> usize {
        if entry.is_instruction() {
            self.instructions += 1;
        }
        self.len += 1;
        self.generation += 1;

        let index = self.nodes.len();
        self.nodes.push(Node {
            entry: Some(entry),
            prev,
            next,
        });

        match prev {
            Some(prev) => self.nodes[prev].next = Some(index),
            None => self.head = Some(index),
        }
        match next {
            Some(next) => self.nodes[next].prev = Some(index),
            None => self.tail = Some(index),
        }

        index
    }

    /// Appends an entry at the end of the stream.
    pub fn push_back(&mut self, entry: Entry) -> EntryId {
        EntryId(self.allocate(entry, self.tail, None))
    }

    /// Prepends an entry at the start of the stream.
    pub fn push_front(&mut self, entry: Entry) -> EntryId {
        EntryId(self.allocate(entry, None, self.head))
    }

    /// Inserts `entry` immediately after `position`.
    ///
    /// Existing handles, including `position`, stay valid.
    ///
    /// # Errors
    /// Returns [`Error::InvalidPosition`] if `position` is not a live entry.
    pub fn insert_after(&mut self, position: EntryId, entry: Entry) -> Result<EntryId> {
        let next = self.node(position)?.next;
        Ok(EntryId(self.allocate(entry, Some(position.0), next)))
    }

    /// Inserts `entry` immediately before `position`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidPosition`] if `position` is not a live entry.
    pub fn insert_before(&mut self, position: EntryId, entry: Entry) -> Result<EntryId> {
        let prev = self.node(position)?.prev;
        Ok(EntryId(self.allocate(entry, prev, Some(position.0))))
    }

    /// Replaces the entry at `position`, returning the previous one.
    ///
    /// # Errors
    /// Returns [`Error::InvalidPosition`] if `position` is not a live entry.
    pub fn replace(&mut self, position: EntryId, entry: Entry) -> Result<Entry> {
        self.check(position)?;

        if entry.is_instruction() {
            self.instructions += 1;
        }
        self.generation += 1;

        let slot = &mut self.nodes[position.0].entry;
        let old = slot.replace(entry).ok_or(Error::InvalidPosition(position))?;
        if old.is_instruction() {
            self.instructions -= 1;
        }
        Ok(old)
    }

    /// Removes the entry at `position` and hands it back.
    ///
    /// Returns the removed entry together with the handle of the entry that followed it,
    /// or `None` if it was the last one. The handle `position` becomes invalid.
    ///
    /// # Errors
    /// Returns [`Error::InvalidPosition`] if `position` is not a live entry.
    pub fn remove(&mut self, position: EntryId) -> Result<(Entry, Option<EntryId>)> {
        self.check(position)?;

        let node = &mut self.nodes[position.0];
        let entry = node.entry.take().ok_or(Error::InvalidPosition(position))?;
        let (prev, next) = (node.prev.take(), node.next.take());

        match prev {
            Some(prev) => self.nodes[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.nodes[next].prev = prev,
            None => self.tail = prev,
        }

        if entry.is_instruction() {
            self.instructions -= 1;
        }
        self.len -= 1;
        self.generation += 1;

        Ok((entry, next.map(EntryId)))
    }

    /// Erases the entry at `position`.
    ///
    /// Returns the handle of the following entry, or `None` at the end of the stream.
    ///
    /// # Errors
    /// Returns [`Error::InvalidPosition`] if `position` was already erased or never
    /// belonged to this stream.
    pub fn erase(&mut self, position: EntryId) -> Result<Option<EntryId>> {
        self.remove(position).map(|(_, next)| next)
    }

    /// Iterates over all live entries in order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            stream: self,
            current: self.head,
            last: None,
        }
    }

    /// Iterates from `first` through `last`, both inclusive.
    ///
    /// If `last` does not follow `first`, iteration runs to the end of the stream.
    ///
    /// # Errors
    /// Returns [`Error::InvalidPosition`] if either handle is not a live entry.
    pub fn iter_range(&self, first: EntryId, last: EntryId) -> Result<Iter<'_>> {
        self.check(first)?;
        self.check(last)?;

        Ok(Iter {
            stream: self,
            current: Some(first.0),
            last: Some(last.0),
        })
    }

    /// Finds the [`Entry::Target`] marker of `label`.
    #[must_use]
    pub fn find_label(&self, label: Label) -> Option<EntryId> {
        self.iter()
            .find(|(_, entry)| matches!(entry, Entry::Target(l) if *l == label))
            .map(|(id, _)| id)
    }
}

impl FromIterator<Entry> for InstructionStream {
    fn from_iter<T: IntoIterator<Item = Entry>>(iter: T) -> Self {
        let mut stream = InstructionStream::new();
        for entry in iter {
            stream.push_back(entry);
        }
        stream
    }
}

impl fmt::Display for InstructionStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (_, entry) in self.iter() {
            match entry {
                Entry::Instruction(_) => writeln!(f, "    {}", entry)?,
                _ => writeln!(f, "  {}", entry)?,
            }
        }
        Ok(())
    }
}

/// Iterator over `(handle, entry)` pairs of a stream.
pub struct Iter<'a> {
    stream: &'a InstructionStream,
    current: Option<usize>,
    last: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (EntryId, &'a Entry);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.current?;
        let node = &self.stream.nodes[index];

        self.current = if self.last == Some(index) {
            None
        } else {
            node.next
        };

        node.entry.as_ref().map(|entry| (EntryId(index), entry))
    }
}
