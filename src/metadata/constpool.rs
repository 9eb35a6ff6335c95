//! The class file constant pool.
//!
//! Entries are addressed by their 1-based index as stored in the class file. Slot 0 and
//! the slot following every `Long` or `Double` hold [`Constant::Unusable`].

use crate::{file::parser::Parser, Result};

/// One constant pool entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Placeholder for slot 0 and the upper half of 8-byte constants
    Unusable,
    /// Decoded modified UTF-8 text
    Utf8(String),
    /// `CONSTANT_Integer`
    Integer(i32),
    /// `CONSTANT_Float`
    Float(f32),
    /// `CONSTANT_Long`
    Long(i64),
    /// `CONSTANT_Double`
    Double(f64),
    /// `CONSTANT_Class`
    Class {
        /// Utf8 entry holding the internal name
        name_index: u16,
    },
    /// `CONSTANT_String`
    String {
        /// Utf8 entry holding the value
        string_index: u16,
    },
    /// `CONSTANT_Fieldref`
    FieldRef {
        /// Owning class
        class_index: u16,
        /// Name and descriptor
        name_and_type_index: u16,
    },
    /// `CONSTANT_Methodref`
    MethodRef {
        /// Owning class
        class_index: u16,
        /// Name and descriptor
        name_and_type_index: u16,
    },
    /// `CONSTANT_InterfaceMethodref`
    InterfaceMethodRef {
        /// Owning interface
        class_index: u16,
        /// Name and descriptor
        name_and_type_index: u16,
    },
    /// `CONSTANT_NameAndType`
    NameAndType {
        /// Utf8 name
        name_index: u16,
        /// Utf8 descriptor
        descriptor_index: u16,
    },
    /// `CONSTANT_MethodHandle`
    MethodHandle {
        /// Kind of the handle, 1 to 9
        reference_kind: u8,
        /// Referenced field or method
        reference_index: u16,
    },
    /// `CONSTANT_MethodType`
    MethodType {
        /// Utf8 method descriptor
        descriptor_index: u16,
    },
    /// `CONSTANT_Dynamic`
    Dynamic {
        /// Index into the `BootstrapMethods` attribute
        bootstrap_method_attr_index: u16,
        /// Name and descriptor
        name_and_type_index: u16,
    },
    /// `CONSTANT_InvokeDynamic`
    InvokeDynamic {
        /// Index into the `BootstrapMethods` attribute
        bootstrap_method_attr_index: u16,
        /// Name and descriptor
        name_and_type_index: u16,
    },
    /// `CONSTANT_Module`
    Module {
        /// Utf8 module name
        name_index: u16,
    },
    /// `CONSTANT_Package`
    Package {
        /// Utf8 package name
        name_index: u16,
    },
}

impl Constant {
    /// Returns `true` for `Long` and `Double`, which occupy two pool slots.
    #[must_use]
    pub const fn is_wide(&self) -> bool {
        matches!(self, Constant::Long(_) | Constant::Double(_))
    }
}

/// A parsed constant pool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    /// Parses `constant_pool_count` followed by the pool entries.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for unknown tags, invalid modified UTF-8 or a
    /// zero count, and [`crate::Error::OutOfBounds`] for truncated input.
    pub fn parse(parser: &mut Parser) -> Result<Self> {
        let count = usize::from(parser.read_be::<u16>()?);
        if count == 0 {
            return Err(malformed_error!("Constant pool count must be at least 1"));
        }

        let mut entries = Vec::with_capacity(count);
        entries.push(Constant::Unusable);

        while entries.len() < count {
            let index = entries.len();
            let tag = parser.read_be::<u8>()?;
            let constant = match tag {
                1 => {
                    let len = usize::from(parser.read_be::<u16>()?);
                    Constant::Utf8(decode_modified_utf8(parser.read_bytes(len)?)?)
                }
                3 => Constant::Integer(parser.read_be::<i32>()?),
                4 => Constant::Float(parser.read_be::<f32>()?),
                5 => Constant::Long(parser.read_be::<i64>()?),
                6 => Constant::Double(parser.read_be::<f64>()?),
                7 => Constant::Class {
                    name_index: parser.read_be::<u16>()?,
                },
                8 => Constant::String {
                    string_index: parser.read_be::<u16>()?,
                },
                9 => Constant::FieldRef {
                    class_index: parser.read_be::<u16>()?,
                    name_and_type_index: parser.read_be::<u16>()?,
                },
                10 => Constant::MethodRef {
                    class_index: parser.read_be::<u16>()?,
                    name_and_type_index: parser.read_be::<u16>()?,
                },
                11 => Constant::InterfaceMethodRef {
                    class_index: parser.read_be::<u16>()?,
                    name_and_type_index: parser.read_be::<u16>()?,
                },
                12 => Constant::NameAndType {
                    name_index: parser.read_be::<u16>()?,
                    descriptor_index: parser.read_be::<u16>()?,
                },
                15 => Constant::MethodHandle {
                    reference_kind: parser.read_be::<u8>()?,
                    reference_index: parser.read_be::<u16>()?,
                },
                16 => Constant::MethodType {
                    descriptor_index: parser.read_be::<u16>()?,
                },
                17 => Constant::Dynamic {
                    bootstrap_method_attr_index: parser.read_be::<u16>()?,
                    name_and_type_index: parser.read_be::<u16>()?,
                },
                18 => Constant::InvokeDynamic {
                    bootstrap_method_attr_index: parser.read_be::<u16>()?,
                    name_and_type_index: parser.read_be::<u16>()?,
                },
                19 => Constant::Module {
                    name_index: parser.read_be::<u16>()?,
                },
                20 => Constant::Package {
                    name_index: parser.read_be::<u16>()?,
                },
                _ => {
                    return Err(malformed_error!(
                        "Unknown constant pool tag {} at index {}",
                        tag,
                        index
                    ))
                }
            };

            let wide = constant.is_wide();
            entries.push(constant);
            if wide {
                if entries.len() >= count {
                    return Err(malformed_error!(
                        "8-byte constant at index {} overruns the pool",
                        index
                    ));
                }
                entries.push(Constant::Unusable);
            }
        }

        Ok(ConstantPool { entries })
    }

    /// Number of slots including slot 0, the class file's `constant_pool_count`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the pool has no slots at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry at `index`, `None` past the end.
    #[must_use]
    pub fn get(&self, index: u16) -> Option<&Constant> {
        self.entries.get(usize::from(index))
    }

    /// The text of the `Utf8` entry at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `index` does not name a `Utf8` entry.
    pub fn utf8(&self, index: u16) -> Result<&str> {
        match self.get(index) {
            Some(Constant::Utf8(text)) => Ok(text),
            _ => Err(malformed_error!("Constant {} is not a Utf8 entry", index)),
        }
    }

    /// The internal name referenced by the `Class` entry at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if `index` does not name a `Class` entry
    /// whose name is a `Utf8` entry.
    pub fn class_name(&self, index: u16) -> Result<&str> {
        match self.get(index) {
            Some(Constant::Class { name_index }) => self.utf8(*name_index),
            _ => Err(malformed_error!("Constant {} is not a Class entry", index)),
        }
    }

    /// Iterates over `(index, constant)` for every usable slot.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Constant)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, c)| !matches!(c, Constant::Unusable))
            .filter_map(|(i, c)| u16::try_from(i).ok().map(|i| (i, c)))
    }
}

/// Decodes the modified UTF-8 used by class files.
///
/// NUL is encoded as `C0 80` and supplementary characters as surrogate pairs of two
/// 3-byte sequences. Unpaired surrogates are replaced with U+FFFD.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] for a raw zero byte, 4-byte forms or truncated
/// sequences.
pub fn decode_modified_utf8(bytes: &[u8]) -> Result<String> {
    if bytes.is_ascii() && !bytes.contains(&0) {
        return Ok(bytes.iter().map(|&b| char::from(b)).collect());
    }

    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        let (unit, width) = match b {
            0x01..=0x7F => (u16::from(b), 1),
            0xC0..=0xDF => {
                let b2 = continuation(bytes, i + 1)?;
                ((u16::from(b & 0x1F) << 6) | b2, 2)
            }
            0xE0..=0xEF => {
                let b2 = continuation(bytes, i + 1)?;
                let b3 = continuation(bytes, i + 2)?;
                ((u16::from(b & 0x0F) << 12) | (b2 << 6) | b3, 3)
            }
            _ => {
                return Err(malformed_error!(
                    "Invalid modified UTF-8 byte 0x{:02X} at offset {}",
                    b,
                    i
                ))
            }
        };
        units.push(unit);
        i += width;
    }

    Ok(String::from_utf16_lossy(&units))
}

fn continuation(bytes: &[u8], offset: usize) -> Result<u16> {
    match bytes.get(offset) {
        Some(&b) if b & 0xC0 == 0x80 => Ok(u16::from(b & 0x3F)),
        _ => Err(malformed_error!(
            "Truncated modified UTF-8 sequence at offset {}",
            offset
        )),
    }
}
