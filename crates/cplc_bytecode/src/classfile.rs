//! Structured, fully owned representation of one class file.
//!
//! A class file is parsed once into [`ClassFile`]; the extractor and the
//! nest resolver are independent passes over that structure. Only the parts
//! carrying symbolic type information are decoded, everything else is
//! validated for length and skipped.

use crate::code::{decode_instructions, Instruction};
use crate::constant_pool::ConstantPool;
use crate::error::ClassParseError;
use crate::reader::ClassReader;
use cplc_api::TypeIdentifier;

pub const ACC_INTERFACE: u16 = 0x0200;

#[derive(Debug, Clone)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub access_flags: u16,
    /// Internal name, e.g. `java/util/Map$Entry`.
    pub this_class: String,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<Member>,
    pub methods: Vec<Member>,
    pub attributes: Vec<Attribute>,
    pub constant_pool: ConstantPool,
}

/// A field or a method.
#[derive(Debug, Clone)]
pub struct Member {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone)]
pub enum Attribute {
    Signature(String),
    /// Checked exceptions declared by a method, as internal names.
    Exceptions(Vec<String>),
    Code(Code),
    InnerClasses(Vec<InnerClassEntry>),
    EnclosingMethod {
        class: String,
        method: Option<(String, String)>,
    },
    Annotations {
        visible: bool,
        annotations: Vec<Annotation>,
    },
    ParameterAnnotations {
        visible: bool,
        parameters: Vec<Vec<Annotation>>,
    },
    TypeAnnotations {
        visible: bool,
        annotations: Vec<TypeAnnotation>,
    },
    AnnotationDefault(ElementValue),
    LocalVariables(Vec<LocalVariable>),
    LocalVariableTypes(Vec<LocalVariable>),
    Record(Vec<RecordComponent>),
    Other { name: String, length: usize },
}

#[derive(Debug, Clone)]
pub struct Code {
    pub max_stack: u16,
    pub max_locals: u16,
    /// Instructions with symbolic operands, in code order.
    pub instructions: Vec<Instruction>,
    pub exception_handlers: Vec<ExceptionHandler>,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionHandler {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    /// `None` for `finally` handlers.
    pub catch_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerClassEntry {
    pub inner_class: String,
    pub outer_class: Option<String>,
    pub inner_name: Option<String>,
    pub access_flags: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariable {
    pub name: String,
    /// Descriptor in a `LocalVariableTable`, signature in a `LocalVariableTypeTable`.
    pub descriptor: String,
    pub index: u16,
}

#[derive(Debug, Clone)]
pub struct RecordComponent {
    pub name: String,
    pub descriptor: String,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Field descriptor of the annotation interface.
    pub type_descriptor: String,
    pub elements: Vec<(String, ElementValue)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeAnnotation {
    pub target_type: u8,
    pub annotation: Annotation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    Const { tag: u8 },
    Enum {
        type_descriptor: String,
        const_name: String,
    },
    /// Return descriptor of a class literal, `V` for `void.class`.
    Class(String),
    Annotation(Annotation),
    Array(Vec<ElementValue>),
}

impl ClassFile {
    pub fn parse(bytes: &[u8]) -> Result<Self, ClassParseError> {
        let mut reader = ClassReader::new(bytes);
        reader.expect_magic()?;
        let minor_version = reader.read_u2()?;
        let major_version = reader.read_u2()?;
        let pool = ConstantPool::parse(&mut reader)?;

        let access_flags = reader.read_u2()?;
        let this_class = pool.class_name(reader.read_u2()?)?.to_string();
        let super_class = pool
            .optional_class_name(reader.read_u2()?)?
            .map(str::to_string);

        let interfaces_count = reader.read_u2()?;
        let mut interfaces = Vec::with_capacity(interfaces_count as usize);
        for _ in 0..interfaces_count {
            interfaces.push(pool.class_name(reader.read_u2()?)?.to_string());
        }

        let fields = parse_members(&mut reader, &pool)?;
        let methods = parse_members(&mut reader, &pool)?;
        let attributes = parse_attributes(&mut reader, &pool, 0)?;

        if reader.remaining() != 0 {
            return Err(ClassParseError::TrailingBytes {
                count: reader.remaining(),
            });
        }

        Ok(Self {
            minor_version,
            major_version,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
            constant_pool: pool,
        })
    }

    pub fn identifier(&self) -> TypeIdentifier {
        TypeIdentifier::from_internal(&self.this_class)
    }

    /// Super class, absent only for the root object type (and module-info).
    pub fn super_class_identifier(&self) -> Option<TypeIdentifier> {
        self.super_class.as_deref().map(TypeIdentifier::from_internal)
    }

    pub fn interface_identifiers(&self) -> Vec<TypeIdentifier> {
        self.interfaces
            .iter()
            .map(|name| TypeIdentifier::from_internal(name))
            .collect()
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.name.as_str()).collect()
    }

    pub fn method_names(&self) -> Vec<&str> {
        self.methods.iter().map(|method| method.name.as_str()).collect()
    }

    pub fn is_interface(&self) -> bool {
        self.access_flags & ACC_INTERFACE != 0
    }

    pub fn inner_classes(&self) -> impl Iterator<Item = &InnerClassEntry> {
        self.attributes
            .iter()
            .filter_map(|attribute| match attribute {
                Attribute::InnerClasses(entries) => Some(entries.iter()),
                _ => None,
            })
            .flatten()
    }

    /// Owner class of the `EnclosingMethod` record, if any.
    pub fn enclosing_class(&self) -> Option<&str> {
        self.attributes.iter().find_map(|attribute| match attribute {
            Attribute::EnclosingMethod { class, .. } => Some(class.as_str()),
            _ => None,
        })
    }
}

fn parse_members(
    reader: &mut ClassReader<'_>,
    pool: &ConstantPool,
) -> Result<Vec<Member>, ClassParseError> {
    let count = reader.read_u2()?;
    let mut members = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let access_flags = reader.read_u2()?;
        let name = pool.utf8(reader.read_u2()?)?.to_string();
        let descriptor = pool.utf8(reader.read_u2()?)?.to_string();
        let attributes = parse_attributes(reader, pool, 0)?;
        members.push(Member {
            access_flags,
            name,
            descriptor,
            attributes,
        });
    }
    Ok(members)
}

/// Upper bound on attributes nested inside `Code` and `Record` attributes.
const MAX_ATTRIBUTE_DEPTH: usize = 4;

fn parse_attributes(
    reader: &mut ClassReader<'_>,
    pool: &ConstantPool,
    depth: usize,
) -> Result<Vec<Attribute>, ClassParseError> {
    let count = reader.read_u2()?;
    let mut attributes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name = pool.utf8(reader.read_u2()?)?;
        let length = reader.read_u4()? as usize;
        let body = reader.read_slice(length)?;
        attributes.push(parse_attribute(name, body, pool, depth)?);
    }
    Ok(attributes)
}

fn parse_attribute(
    name: &str,
    body: &[u8],
    pool: &ConstantPool,
    depth: usize,
) -> Result<Attribute, ClassParseError> {
    if depth > MAX_ATTRIBUTE_DEPTH {
        return Err(ClassParseError::MalformedAttribute {
            name: name.to_string(),
            reason: format!("attributes nested deeper than {MAX_ATTRIBUTE_DEPTH}"),
        });
    }
    let mut reader = ClassReader::new(body);
    let attribute = match name {
        "Signature" => Attribute::Signature(pool.utf8(reader.read_u2()?)?.to_string()),
        "Exceptions" => {
            let count = reader.read_u2()?;
            let mut exceptions = Vec::with_capacity(count as usize);
            for _ in 0..count {
                exceptions.push(pool.class_name(reader.read_u2()?)?.to_string());
            }
            Attribute::Exceptions(exceptions)
        }
        "Code" => Attribute::Code(parse_code(&mut reader, pool, depth)?),
        "InnerClasses" => {
            let count = reader.read_u2()?;
            let mut entries = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let inner_class = pool.class_name(reader.read_u2()?)?.to_string();
                let outer_class = pool
                    .optional_class_name(reader.read_u2()?)?
                    .map(str::to_string);
                let inner_name = pool.optional_utf8(reader.read_u2()?)?.map(str::to_string);
                let access_flags = reader.read_u2()?;
                entries.push(InnerClassEntry {
                    inner_class,
                    outer_class,
                    inner_name,
                    access_flags,
                });
            }
            Attribute::InnerClasses(entries)
        }
        "EnclosingMethod" => {
            let class = pool.class_name(reader.read_u2()?)?.to_string();
            let method_index = reader.read_u2()?;
            let method = if method_index == 0 {
                None
            } else {
                let (name, descriptor) = pool.name_and_type(method_index)?;
                Some((name.to_string(), descriptor.to_string()))
            };
            Attribute::EnclosingMethod { class, method }
        }
        "RuntimeVisibleAnnotations" | "RuntimeInvisibleAnnotations" => Attribute::Annotations {
            visible: name == "RuntimeVisibleAnnotations",
            annotations: parse_annotations(&mut reader, pool)?,
        },
        "RuntimeVisibleParameterAnnotations" | "RuntimeInvisibleParameterAnnotations" => {
            let count = reader.read_u1()?;
            let mut parameters = Vec::with_capacity(count as usize);
            for _ in 0..count {
                parameters.push(parse_annotations(&mut reader, pool)?);
            }
            Attribute::ParameterAnnotations {
                visible: name == "RuntimeVisibleParameterAnnotations",
                parameters,
            }
        }
        "RuntimeVisibleTypeAnnotations" | "RuntimeInvisibleTypeAnnotations" => {
            let count = reader.read_u2()?;
            let mut annotations = Vec::with_capacity(count as usize);
            for _ in 0..count {
                annotations.push(parse_type_annotation(&mut reader, pool)?);
            }
            Attribute::TypeAnnotations {
                visible: name == "RuntimeVisibleTypeAnnotations",
                annotations,
            }
        }
        "AnnotationDefault" => Attribute::AnnotationDefault(parse_element_value(&mut reader, pool, 0)?),
        "LocalVariableTable" => Attribute::LocalVariables(parse_local_variables(&mut reader, pool)?),
        "LocalVariableTypeTable" => {
            Attribute::LocalVariableTypes(parse_local_variables(&mut reader, pool)?)
        }
        "Record" => {
            let count = reader.read_u2()?;
            let mut components = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let name = pool.utf8(reader.read_u2()?)?.to_string();
                let descriptor = pool.utf8(reader.read_u2()?)?.to_string();
                let attributes = parse_attributes(&mut reader, pool, depth + 1)?;
                components.push(RecordComponent {
                    name,
                    descriptor,
                    attributes,
                });
            }
            Attribute::Record(components)
        }
        _ => {
            return Ok(Attribute::Other {
                name: name.to_string(),
                length: body.len(),
            })
        }
    };

    if reader.remaining() != 0 {
        return Err(ClassParseError::MalformedAttribute {
            name: name.to_string(),
            reason: format!("{} unread bytes", reader.remaining()),
        });
    }
    Ok(attribute)
}

fn parse_code(
    reader: &mut ClassReader<'_>,
    pool: &ConstantPool,
    depth: usize,
) -> Result<Code, ClassParseError> {
    let max_stack = reader.read_u2()?;
    let max_locals = reader.read_u2()?;
    let code_length = reader.read_u4()? as usize;
    let code = reader.read_slice(code_length)?;
    let instructions = decode_instructions(code, pool)?;

    let handler_count = reader.read_u2()?;
    let mut exception_handlers = Vec::with_capacity(handler_count as usize);
    for _ in 0..handler_count {
        let start_pc = reader.read_u2()?;
        let end_pc = reader.read_u2()?;
        let handler_pc = reader.read_u2()?;
        let catch_type = pool
            .optional_class_name(reader.read_u2()?)?
            .map(str::to_string);
        exception_handlers.push(ExceptionHandler {
            start_pc,
            end_pc,
            handler_pc,
            catch_type,
        });
    }

    let attributes = parse_attributes(reader, pool, depth + 1)?;
    Ok(Code {
        max_stack,
        max_locals,
        instructions,
        exception_handlers,
        attributes,
    })
}

fn parse_local_variables(
    reader: &mut ClassReader<'_>,
    pool: &ConstantPool,
) -> Result<Vec<LocalVariable>, ClassParseError> {
    let count = reader.read_u2()?;
    let mut variables = Vec::with_capacity(count as usize);
    for _ in 0..count {
        reader.skip(4)?; // start_pc, length
        let name = pool.utf8(reader.read_u2()?)?.to_string();
        let descriptor = pool.utf8(reader.read_u2()?)?.to_string();
        let index = reader.read_u2()?;
        variables.push(LocalVariable {
            name,
            descriptor,
            index,
        });
    }
    Ok(variables)
}

/// Upper bound on annotation and element-value nesting.
pub const MAX_ELEMENT_VALUE_DEPTH: usize = 64;

fn parse_annotations(
    reader: &mut ClassReader<'_>,
    pool: &ConstantPool,
) -> Result<Vec<Annotation>, ClassParseError> {
    let count = reader.read_u2()?;
    let mut annotations = Vec::with_capacity(count as usize);
    for _ in 0..count {
        annotations.push(parse_annotation(reader, pool, 0)?);
    }
    Ok(annotations)
}

fn parse_annotation(
    reader: &mut ClassReader<'_>,
    pool: &ConstantPool,
    depth: usize,
) -> Result<Annotation, ClassParseError> {
    let type_descriptor = pool.utf8(reader.read_u2()?)?.to_string();
    let pairs = reader.read_u2()?;
    let mut elements = Vec::with_capacity(pairs as usize);
    for _ in 0..pairs {
        let name = pool.utf8(reader.read_u2()?)?.to_string();
        let value = parse_element_value(reader, pool, depth + 1)?;
        elements.push((name, value));
    }
    Ok(Annotation {
        type_descriptor,
        elements,
    })
}

fn parse_element_value(
    reader: &mut ClassReader<'_>,
    pool: &ConstantPool,
    depth: usize,
) -> Result<ElementValue, ClassParseError> {
    if depth > MAX_ELEMENT_VALUE_DEPTH {
        return Err(ClassParseError::MalformedAttribute {
            name: "annotation".to_string(),
            reason: format!("element values nested deeper than {MAX_ELEMENT_VALUE_DEPTH}"),
        });
    }
    let tag = reader.read_u1()?;
    let value = match tag {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' => {
            pool.get(reader.read_u2()?)?;
            ElementValue::Const { tag }
        }
        b'e' => ElementValue::Enum {
            type_descriptor: pool.utf8(reader.read_u2()?)?.to_string(),
            const_name: pool.utf8(reader.read_u2()?)?.to_string(),
        },
        b'c' => ElementValue::Class(pool.utf8(reader.read_u2()?)?.to_string()),
        b'@' => ElementValue::Annotation(parse_annotation(reader, pool, depth)?),
        b'[' => {
            let count = reader.read_u2()?;
            let mut values = Vec::with_capacity(count as usize);
            for _ in 0..count {
                values.push(parse_element_value(reader, pool, depth + 1)?);
            }
            ElementValue::Array(values)
        }
        other => {
            return Err(ClassParseError::MalformedAttribute {
                name: "annotation".to_string(),
                reason: format!("unknown element value tag {:?}", other as char),
            })
        }
    };
    Ok(value)
}

fn parse_type_annotation(
    reader: &mut ClassReader<'_>,
    pool: &ConstantPool,
) -> Result<TypeAnnotation, ClassParseError> {
    let target_type = reader.read_u1()?;
    let target_info_len = match target_type {
        0x00 | 0x01 => 1,
        0x10 => 2,
        0x11 | 0x12 => 2,
        0x13..=0x15 => 0,
        0x16 => 1,
        0x17 => 2,
        0x40 | 0x41 => {
            let table_length = reader.read_u2()? as usize;
            table_length * 6
        }
        0x42 => 2,
        0x43..=0x46 => 2,
        0x47..=0x4B => 3,
        other => {
            return Err(ClassParseError::MalformedAttribute {
                name: "type annotation".to_string(),
                reason: format!("unknown target type {other:#04x}"),
            })
        }
    };
    reader.skip(target_info_len)?;
    let path_length = reader.read_u1()? as usize;
    reader.skip(path_length * 2)?;
    let annotation = parse_annotation(reader, pool, 0)?;
    Ok(TypeAnnotation {
        target_type,
        annotation,
    })
}
