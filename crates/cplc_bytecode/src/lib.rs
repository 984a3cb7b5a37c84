//! Class-file parsing for the classpathless compiler.
//!
//! [`ClassFile::parse`] decodes one class into an owned structure; the
//! extractor ([`extract_type_names`]) and the nest resolver ([`nest`]) are
//! separate passes over it.

mod classfile;
mod code;
mod constant_pool;
mod descriptor;
mod error;
mod extract;
pub mod nest;
mod reader;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixture;

pub use classfile::{
    Annotation, Attribute, ClassFile, Code, ElementValue, ExceptionHandler, InnerClassEntry,
    LocalVariable, Member, RecordComponent, TypeAnnotation, ACC_INTERFACE,
};
pub use code::{opcodes, Instruction};
pub use constant_pool::{Constant, ConstantPool, MemberRef};
pub use descriptor::{class_operand_types, referenced_types, return_descriptor_types};
pub use error::{ClassParseError, NestError};
pub use extract::{collect_type_names, extract_type_names};
pub use nest::{direct_nested_of, full_nest_group, outer_of};
