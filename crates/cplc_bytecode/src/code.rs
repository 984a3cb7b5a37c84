use crate::constant_pool::{Constant, ConstantPool};
use crate::error::ClassParseError;
use crate::reader::ClassReader;

pub mod opcodes {
    pub const LDC: u8 = 0x12;
    pub const LDC_W: u8 = 0x13;
    pub const TABLESWITCH: u8 = 0xaa;
    pub const LOOKUPSWITCH: u8 = 0xab;
    pub const GETSTATIC: u8 = 0xb2;
    pub const PUTSTATIC: u8 = 0xb3;
    pub const GETFIELD: u8 = 0xb4;
    pub const PUTFIELD: u8 = 0xb5;
    pub const INVOKEVIRTUAL: u8 = 0xb6;
    pub const INVOKESPECIAL: u8 = 0xb7;
    pub const INVOKESTATIC: u8 = 0xb8;
    pub const INVOKEINTERFACE: u8 = 0xb9;
    pub const INVOKEDYNAMIC: u8 = 0xba;
    pub const NEW: u8 = 0xbb;
    pub const ANEWARRAY: u8 = 0xbd;
    pub const CHECKCAST: u8 = 0xc0;
    pub const INSTANCEOF: u8 = 0xc1;
    pub const WIDE: u8 = 0xc4;
    pub const MULTIANEWARRAY: u8 = 0xc5;
    pub const IINC: u8 = 0x84;
}

/// An instruction whose operands name a type, a member or a call site.
/// Everything else in a method body is skipped by the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// `new`, `anewarray`, `checkcast`, `instanceof`.
    Type { opcode: u8, class: String },
    MultiANewArray { class: String, dimensions: u8 },
    Field {
        opcode: u8,
        owner: String,
        name: String,
        descriptor: String,
    },
    Method {
        opcode: u8,
        owner: String,
        name: String,
        descriptor: String,
        interface: bool,
    },
    InvokeDynamic { name: String, descriptor: String },
    /// `ldc`/`ldc_w` of a class literal.
    LoadClass(String),
    /// `ldc`/`ldc_w` of a method type.
    LoadMethodType(String),
}

pub(crate) fn decode_instructions(
    code: &[u8],
    pool: &ConstantPool,
) -> Result<Vec<Instruction>, ClassParseError> {
    use opcodes::*;

    let mut reader = ClassReader::new(code);
    let mut instructions = Vec::new();

    while reader.remaining() > 0 {
        let offset = reader.position();
        let opcode = reader.read_u1()?;
        match opcode {
            LDC | LDC_W => {
                let index = if opcode == LDC {
                    u16::from(reader.read_u1()?)
                } else {
                    reader.read_u2()?
                };
                match pool.get(index)? {
                    Constant::Class { name_index } => {
                        instructions.push(Instruction::LoadClass(pool.utf8(*name_index)?.to_string()))
                    }
                    Constant::MethodType { descriptor_index } => instructions.push(
                        Instruction::LoadMethodType(pool.utf8(*descriptor_index)?.to_string()),
                    ),
                    _ => {}
                }
            }
            GETSTATIC | PUTSTATIC | GETFIELD | PUTFIELD => {
                let member = pool.member_ref(reader.read_u2()?)?;
                instructions.push(Instruction::Field {
                    opcode,
                    owner: member.owner.to_string(),
                    name: member.name.to_string(),
                    descriptor: member.descriptor.to_string(),
                });
            }
            INVOKEVIRTUAL | INVOKESPECIAL | INVOKESTATIC | INVOKEINTERFACE => {
                let member = pool.member_ref(reader.read_u2()?)?;
                if opcode == INVOKEINTERFACE {
                    reader.skip(2)?; // count, 0
                }
                instructions.push(Instruction::Method {
                    opcode,
                    owner: member.owner.to_string(),
                    name: member.name.to_string(),
                    descriptor: member.descriptor.to_string(),
                    interface: member.interface,
                });
            }
            INVOKEDYNAMIC => {
                let (name, descriptor) = pool.invoke_dynamic(reader.read_u2()?)?;
                instructions.push(Instruction::InvokeDynamic {
                    name: name.to_string(),
                    descriptor: descriptor.to_string(),
                });
                reader.skip(2)?;
            }
            NEW | ANEWARRAY | CHECKCAST | INSTANCEOF => {
                let class = pool.class_name(reader.read_u2()?)?.to_string();
                instructions.push(Instruction::Type { opcode, class });
            }
            MULTIANEWARRAY => {
                let class = pool.class_name(reader.read_u2()?)?.to_string();
                let dimensions = reader.read_u1()?;
                instructions.push(Instruction::MultiANewArray { class, dimensions });
            }
            TABLESWITCH => {
                skip_padding(&mut reader, offset)?;
                reader.skip(4)?; // default
                let low = reader.read_i4()?;
                let high = reader.read_i4()?;
                if high < low {
                    return Err(ClassParseError::InvalidOpcode { opcode, offset });
                }
                let entries = (i64::from(high) - i64::from(low) + 1) as usize;
                reader.skip(entries.saturating_mul(4))?;
            }
            LOOKUPSWITCH => {
                skip_padding(&mut reader, offset)?;
                reader.skip(4)?; // default
                let pairs = reader.read_i4()?;
                if pairs < 0 {
                    return Err(ClassParseError::InvalidOpcode { opcode, offset });
                }
                reader.skip((pairs as usize).saturating_mul(8))?;
            }
            WIDE => {
                let widened = reader.read_u1()?;
                reader.skip(if widened == IINC { 4 } else { 2 })?;
            }
            other => {
                let operands = operand_length(other).ok_or(ClassParseError::InvalidOpcode {
                    opcode: other,
                    offset,
                })?;
                reader.skip(operands)?;
            }
        }
    }

    Ok(instructions)
}

/// Switch operands start at the next offset that is a multiple of four.
fn skip_padding(reader: &mut ClassReader<'_>, opcode_offset: usize) -> Result<(), ClassParseError> {
    let padding = (4 - (opcode_offset + 1) % 4) % 4;
    reader.skip(padding)
}

/// Operand byte count of fixed-length opcodes.
fn operand_length(opcode: u8) -> Option<usize> {
    let length = match opcode {
        0x00..=0x0f => 0,
        0x10 => 1,        // bipush
        0x11 => 2,        // sipush
        0x14 => 2,        // ldc2_w
        0x15..=0x19 => 1, // xload
        0x1a..=0x35 => 0,
        0x36..=0x3a => 1, // xstore
        0x3b..=0x83 => 0,
        0x84 => 2, // iinc
        0x85..=0x98 => 0,
        0x99..=0xa8 => 2, // branches, goto, jsr
        0xa9 => 1,        // ret
        0xac..=0xb1 => 0, // returns
        0xbc => 1,        // newarray
        0xbe | 0xbf => 0,
        0xc2 | 0xc3 => 0,
        0xc6 | 0xc7 => 2,
        0xc8 | 0xc9 => 4,
        _ => return None,
    };
    Some(length)
}
