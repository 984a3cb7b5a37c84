use crate::error::ClassParseError;
use crate::reader::ClassReader;

/// One constant pool entry. Only the operands the extractor needs are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constant {
    Utf8(String),
    Integer,
    Float,
    Long,
    Double,
    Class { name_index: u16 },
    String { string_index: u16 },
    FieldRef { class_index: u16, name_and_type_index: u16 },
    MethodRef { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodRef { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { kind: u8, reference_index: u16 },
    MethodType { descriptor_index: u16 },
    Dynamic { bootstrap_index: u16, name_and_type_index: u16 },
    InvokeDynamic { bootstrap_index: u16, name_and_type_index: u16 },
    Module { name_index: u16 },
    Package { name_index: u16 },
    /// Index 0 and the second slot of long/double entries.
    Unusable,
}

/// Reference to a field or method: owner internal name, member name, descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberRef<'a> {
    pub owner: &'a str,
    pub name: &'a str,
    pub descriptor: &'a str,
    pub interface: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    pub(crate) fn parse(reader: &mut ClassReader<'_>) -> Result<Self, ClassParseError> {
        let count = reader.read_u2()? as usize;
        let mut entries = Vec::with_capacity(count);
        entries.push(Constant::Unusable);

        let mut index = 1;
        while index < count {
            let tag = reader.read_u1()?;
            let entry = match tag {
                1 => {
                    let length = reader.read_u2()? as usize;
                    let bytes = reader.read_slice(length)?;
                    Constant::Utf8(decode_modified_utf8(bytes)?)
                }
                3 => {
                    reader.skip(4)?;
                    Constant::Integer
                }
                4 => {
                    reader.skip(4)?;
                    Constant::Float
                }
                5 | 6 => {
                    reader.skip(8)?;
                    let wide = if tag == 5 {
                        Constant::Long
                    } else {
                        Constant::Double
                    };
                    entries.push(wide);
                    index += 1;
                    Constant::Unusable
                }
                7 => Constant::Class {
                    name_index: reader.read_u2()?,
                },
                8 => Constant::String {
                    string_index: reader.read_u2()?,
                },
                9 | 10 | 11 => {
                    let class_index = reader.read_u2()?;
                    let name_and_type_index = reader.read_u2()?;
                    match tag {
                        9 => Constant::FieldRef {
                            class_index,
                            name_and_type_index,
                        },
                        10 => Constant::MethodRef {
                            class_index,
                            name_and_type_index,
                        },
                        _ => Constant::InterfaceMethodRef {
                            class_index,
                            name_and_type_index,
                        },
                    }
                }
                12 => Constant::NameAndType {
                    name_index: reader.read_u2()?,
                    descriptor_index: reader.read_u2()?,
                },
                15 => Constant::MethodHandle {
                    kind: reader.read_u1()?,
                    reference_index: reader.read_u2()?,
                },
                16 => Constant::MethodType {
                    descriptor_index: reader.read_u2()?,
                },
                17 | 18 => {
                    let bootstrap_index = reader.read_u2()?;
                    let name_and_type_index = reader.read_u2()?;
                    if tag == 17 {
                        Constant::Dynamic {
                            bootstrap_index,
                            name_and_type_index,
                        }
                    } else {
                        Constant::InvokeDynamic {
                            bootstrap_index,
                            name_and_type_index,
                        }
                    }
                }
                19 => Constant::Module {
                    name_index: reader.read_u2()?,
                },
                20 => Constant::Package {
                    name_index: reader.read_u2()?,
                },
                other => return Err(ClassParseError::UnsupportedConstant { tag: other }),
            };

            entries.push(entry);
            index += 1;
        }

        // A trailing long/double may have pushed one slot past `count`.
        entries.truncate(count.max(1));
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    pub fn get(&self, index: u16) -> Result<&Constant, ClassParseError> {
        match self.entries.get(index as usize) {
            Some(Constant::Unusable) | None => Err(ClassParseError::InvalidConstantIndex { index }),
            Some(entry) => Ok(entry),
        }
    }

    pub fn utf8(&self, index: u16) -> Result<&str, ClassParseError> {
        match self.get(index)? {
            Constant::Utf8(value) => Ok(value.as_str()),
            _ => Err(ClassParseError::UnexpectedConstant {
                index,
                expected: "Utf8",
            }),
        }
    }

    pub fn optional_utf8(&self, index: u16) -> Result<Option<&str>, ClassParseError> {
        if index == 0 {
            return Ok(None);
        }
        self.utf8(index).map(Some)
    }

    /// Internal name (or array descriptor) of a `Class` entry.
    pub fn class_name(&self, index: u16) -> Result<&str, ClassParseError> {
        match self.get(index)? {
            Constant::Class { name_index } => self.utf8(*name_index),
            _ => Err(ClassParseError::UnexpectedConstant {
                index,
                expected: "Class",
            }),
        }
    }

    /// Like [`class_name`](Self::class_name), index 0 meaning "absent".
    pub fn optional_class_name(&self, index: u16) -> Result<Option<&str>, ClassParseError> {
        if index == 0 {
            return Ok(None);
        }
        self.class_name(index).map(Some)
    }

    pub fn name_and_type(&self, index: u16) -> Result<(&str, &str), ClassParseError> {
        match self.get(index)? {
            Constant::NameAndType {
                name_index,
                descriptor_index,
            } => Ok((self.utf8(*name_index)?, self.utf8(*descriptor_index)?)),
            _ => Err(ClassParseError::UnexpectedConstant {
                index,
                expected: "NameAndType",
            }),
        }
    }

    pub fn member_ref(&self, index: u16) -> Result<MemberRef<'_>, ClassParseError> {
        let (class_index, name_and_type_index, interface) = match self.get(index)? {
            Constant::FieldRef {
                class_index,
                name_and_type_index,
            }
            | Constant::MethodRef {
                class_index,
                name_and_type_index,
            } => (*class_index, *name_and_type_index, false),
            Constant::InterfaceMethodRef {
                class_index,
                name_and_type_index,
            } => (*class_index, *name_and_type_index, true),
            _ => {
                return Err(ClassParseError::UnexpectedConstant {
                    index,
                    expected: "member reference",
                })
            }
        };
        let owner = self.class_name(class_index)?;
        let (name, descriptor) = self.name_and_type(name_and_type_index)?;
        Ok(MemberRef {
            owner,
            name,
            descriptor,
            interface,
        })
    }

    /// Name and descriptor of an `InvokeDynamic` call site.
    pub fn invoke_dynamic(&self, index: u16) -> Result<(&str, &str), ClassParseError> {
        match self.get(index)? {
            Constant::InvokeDynamic {
                name_and_type_index,
                ..
            } => self.name_and_type(*name_and_type_index),
            _ => Err(ClassParseError::UnexpectedConstant {
                index,
                expected: "InvokeDynamic",
            }),
        }
    }
}

/// Decodes the "modified UTF-8" used by class files: NUL is encoded on two
/// bytes and supplementary characters as surrogate pairs.
fn decode_modified_utf8(bytes: &[u8]) -> Result<String, ClassParseError> {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(text.to_string());
    }

    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut iter = bytes.iter().copied();
    while let Some(first) = iter.next() {
        let unit = if first & 0x80 == 0 {
            u16::from(first)
        } else if first & 0xE0 == 0xC0 {
            let second = continuation(iter.next())?;
            (u16::from(first & 0x1F) << 6) | second
        } else if first & 0xF0 == 0xE0 {
            let second = continuation(iter.next())?;
            let third = continuation(iter.next())?;
            (u16::from(first & 0x0F) << 12) | (second << 6) | third
        } else {
            return Err(ClassParseError::InvalidUtf8);
        };
        units.push(unit);
    }

    String::from_utf16(&units).map_err(|_| ClassParseError::InvalidUtf8)
}

fn continuation(byte: Option<u8>) -> Result<u16, ClassParseError> {
    match byte {
        Some(byte) if byte & 0xC0 == 0x80 => Ok(u16::from(byte & 0x3F)),
        _ => Err(ClassParseError::InvalidUtf8),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modified_utf8_encodes_nul_on_two_bytes() {
        assert_eq!(decode_modified_utf8(&[b'a', 0xC0, 0x80, b'b']).unwrap(), "a\0b");
    }

    #[test]
    fn modified_utf8_joins_surrogate_pairs() {
        // U+1F600 as two three-byte surrogates.
        let bytes = [0xED, 0xA0, 0xBD, 0xED, 0xB8, 0x80];
        assert_eq!(decode_modified_utf8(&bytes).unwrap(), "\u{1F600}");
    }

    #[test]
    fn long_entries_take_two_slots() {
        let bytes = [
            0x00, 0x04, // count
            0x05, 0, 0, 0, 0, 0, 0, 0, 1, // #1 Long, #2 unusable
            0x01, 0x00, 0x01, b'x', // #3 Utf8
        ];
        let pool = ConstantPool::parse(&mut ClassReader::new(&bytes)).unwrap();
        assert_eq!(pool.len(), 4);
        assert_eq!(pool.get(1).unwrap(), &Constant::Long);
        assert!(pool.get(2).is_err());
        assert_eq!(pool.utf8(3).unwrap(), "x");
    }
}
