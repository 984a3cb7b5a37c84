use cplc_api::TypeIdentifier;
use thiserror::Error;

/// Reasons a byte sequence is not a well-formed class file.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClassParseError {
    #[error("unexpected end of class file")]
    UnexpectedEof,
    #[error("invalid class file magic header")]
    InvalidMagic,
    #[error("unsupported constant pool tag {tag}")]
    UnsupportedConstant { tag: u8 },
    #[error("invalid constant pool index {index}")]
    InvalidConstantIndex { index: u16 },
    #[error("constant pool entry {index} is not a {expected}")]
    UnexpectedConstant { index: u16, expected: &'static str },
    #[error("invalid modified UTF-8 string in constant pool")]
    InvalidUtf8,
    #[error("malformed descriptor or signature: {0}")]
    InvalidDescriptor(String),
    #[error("invalid opcode {opcode:#04x} at code offset {offset}")]
    InvalidOpcode { opcode: u8, offset: usize },
    #[error("malformed {name} attribute: {reason}")]
    MalformedAttribute { name: String, reason: String },
    #[error("{count} trailing bytes after the class file")]
    TrailingBytes { count: usize },
}

/// Failures while walking a nest group through a provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NestError {
    #[error("no bytecode available for {identifier}")]
    MissingBytecode { identifier: TypeIdentifier },
    #[error("malformed bytecode for {identifier}: {source}")]
    MalformedBytecode {
        identifier: TypeIdentifier,
        #[source]
        source: ClassParseError,
    },
}
