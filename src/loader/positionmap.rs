//! Reader for serialized position maps.
//!
//! A position map records where each line-number slot of an optimized method came
//! from, including the call sites of inlined code. The layout is little-endian:
//!
//! ```text
//! u32 magic (0xFACEB000)  u32 version (1)
//! u32 string count        { u32 length, length bytes UTF-8 }*
//! u32 position count      { u32 file, u32 line, u32 parent }*
//! ```
//!
//! `file` indexes the string pool. `parent` is the index of the enclosing position
//! plus one, or zero for a top-level position.

use std::{path::Path, sync::Arc};

use crate::{
    file::{parser::Parser, File},
    ir::Position,
    Error, Result,
};

const MAGIC: u32 = 0xFACE_B000;
const VERSION: u32 = 1;
const ITEM_SIZE: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PositionItem {
    file: u32,
    line: u32,
    parent: u32,
}

/// A parsed position map.
#[derive(Debug, Clone, Default)]
pub struct PositionMap {
    strings: Vec<Arc<str>>,
    items: Vec<PositionItem>,
}

impl PositionMap {
    /// Reads the position map at `path`.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened, and any error
    /// of [`PositionMap::parse`].
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::from_file(path)?;
        Self::parse(file.data())
    }

    /// Parses a serialized position map.
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] for empty input, [`crate::Error::Malformed`] for
    /// a bad header, invalid UTF-8, dangling file or parent references and trailing
    /// bytes, and [`crate::Error::OutOfBounds`] for truncated input.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::Empty);
        }

        let mut parser = Parser::new(data);
        let magic = parser.read_le::<u32>()?;
        if magic != MAGIC {
            return Err(malformed_error!("Bad position map magic 0x{:08X}", magic));
        }
        let version = parser.read_le::<u32>()?;
        if version != VERSION {
            return Err(malformed_error!("Unknown position map version {}", version));
        }

        let string_count = parser.read_le::<u32>()? as usize;
        // every string takes at least its length prefix
        parser.ensure_remaining(string_count.saturating_mul(4))?;
        let mut strings: Vec<Arc<str>> = Vec::with_capacity(string_count);
        for index in 0..string_count {
            let len = parser.read_le::<u32>()? as usize;
            let bytes = parser.read_bytes(len)?;
            let string = std::str::from_utf8(bytes)
                .map_err(|_| malformed_error!("String {} is not valid UTF-8", index))?;
            strings.push(Arc::from(string));
        }

        let count = parser.read_le::<u32>()? as usize;
        parser.ensure_remaining(count.saturating_mul(ITEM_SIZE))?;
        let mut items = Vec::with_capacity(count);
        for index in 0..count {
            let item = PositionItem {
                file: parser.read_le::<u32>()?,
                line: parser.read_le::<u32>()?,
                parent: parser.read_le::<u32>()?,
            };
            if item.file as usize >= strings.len() {
                return Err(malformed_error!(
                    "Position {} names file {} of {}",
                    index,
                    item.file,
                    strings.len()
                ));
            }
            if item.parent as usize > count {
                return Err(malformed_error!(
                    "Position {} has parent {} of {}",
                    index,
                    item.parent,
                    count
                ));
            }
            items.push(item);
        }

        if parser.has_more_data() {
            return Err(malformed_error!(
                "{} trailing bytes after position map",
                parser.remaining()
            ));
        }

        Ok(PositionMap { strings, items })
    }

    /// Number of positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the map holds no positions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The file name pool.
    #[must_use]
    pub fn strings(&self) -> &[Arc<str>] {
        &self.strings
    }

    /// Indices of `index` and each of its parents, innermost first.
    fn chain(&self, index: usize) -> Result<Vec<usize>> {
        if index >= self.items.len() {
            return Err(out_of_bounds_error!());
        }

        let mut chain = vec![index];
        let mut parent = self.items[index].parent as usize;
        while parent != 0 {
            if chain.len() > self.items.len() {
                return Err(malformed_error!("Position {} has a cyclic parent chain", index));
            }
            chain.push(parent - 1);
            parent = self.items[parent - 1].parent as usize;
        }
        Ok(chain)
    }

    /// The unwound stack of position `index`: the position itself followed by each call
    /// site it was inlined into. Returned positions carry no parent link.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] for an unknown index and
    /// [`crate::Error::Malformed`] for a cyclic parent chain.
    pub fn stack(&self, index: usize) -> Result<Vec<Position>> {
        Ok(self
            .chain(index)?
            .into_iter()
            .map(|i| {
                let item = self.items[i];
                Position::new(item.line, Some(self.strings[item.file as usize].clone()))
            })
            .collect())
    }

    /// Position `index` with its parents linked, ready to go into an instruction stream.
    ///
    /// # Errors
    /// Same as [`PositionMap::stack`].
    pub fn position(&self, index: usize) -> Result<Arc<Position>> {
        let mut linked: Option<Arc<Position>> = None;
        for i in self.chain(index)?.into_iter().rev() {
            let item = self.items[i];
            let file = Some(self.strings[item.file as usize].clone());
            linked = Some(Arc::new(match linked {
                Some(parent) => Position::with_parent(item.line, file, parent),
                None => Position::new(item.line, file),
            }));
        }
        linked.ok_or_else(|| out_of_bounds_error!())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(strings: &[&str], items: &[(u32, u32, u32)]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC.to_le_bytes());
        out.extend_from_slice(&VERSION.to_le_bytes());
        out.extend_from_slice(&(strings.len() as u32).to_le_bytes());
        for string in strings {
            out.extend_from_slice(&(string.len() as u32).to_le_bytes());
            out.extend_from_slice(string.as_bytes());
        }
        out.extend_from_slice(&(items.len() as u32).to_le_bytes());
        for (file, line, parent) in items {
            for value in [file, line, parent] {
                out.extend_from_slice(&value.to_le_bytes());
            }
        }
        out
    }

    #[test]
    fn inlined_stack() {
        // 0: Caller.java:10
        // 1: Callee.java:3, inlined at 0
        // 2: Leaf.java:7, inlined at 1
        let data = map(
            &["Caller.java", "Callee.java", "Leaf.java"],
            &[(0, 10, 0), (1, 3, 1), (2, 7, 2)],
        );
        let map = PositionMap::parse(&data).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.strings().len(), 3);

        let stack: Vec<String> = map
            .stack(2)
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(stack, ["Leaf.java:7", "Callee.java:3", "Caller.java:10"]);
        assert_eq!(map.stack(0).unwrap().len(), 1);

        let position = map.position(2).unwrap();
        let linked: Vec<u32> = position.stack().iter().map(|p| p.line).collect();
        assert_eq!(linked, [7, 3, 10]);

        assert!(matches!(map.stack(3), Err(Error::OutOfBounds)));
    }

    #[test]
    fn cyclic_parents() {
        let data = map(&["A.java"], &[(0, 1, 2), (0, 2, 1)]);
        let map = PositionMap::parse(&data).unwrap();
        assert!(matches!(map.stack(0), Err(Error::Malformed { .. })));
        assert!(matches!(map.position(1), Err(Error::Malformed { .. })));
    }

    #[test]
    fn damaged_maps() {
        assert!(matches!(PositionMap::parse(&[]), Err(Error::Empty)));

        let good = map(&["A.java"], &[(0, 1, 0)]);
        let mut magic = good.clone();
        magic[0] ^= 0xFF;
        assert!(matches!(
            PositionMap::parse(&magic),
            Err(Error::Malformed { .. })
        ));

        assert!(PositionMap::parse(&good[..good.len() - 1]).is_err());

        let mut trailing = good.clone();
        trailing.push(0);
        assert!(matches!(
            PositionMap::parse(&trailing),
            Err(Error::Malformed { .. })
        ));

        let dangling_file = map(&["A.java"], &[(1, 1, 0)]);
        assert!(matches!(
            PositionMap::parse(&dangling_file),
            Err(Error::Malformed { .. })
        ));
        let dangling_parent = map(&["A.java"], &[(0, 1, 5)]);
        assert!(matches!(
            PositionMap::parse(&dangling_parent),
            Err(Error::Malformed { .. })
        ));

        // a huge count must fail on the bounds check, not on allocation
        let mut huge = map(&[], &[]);
        huge[8..12].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(PositionMap::parse(&huge), Err(Error::OutOfBounds)));
    }
}
