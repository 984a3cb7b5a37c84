//! Writer for small but valid synthetic class files.
//!
//! Only what the parser and the extractor look at is emitted; the output is
//! not verifiable by a JVM (no stack maps, no bootstrap methods).

use crate::code::opcodes;
use std::collections::HashMap;

const MAJOR_VERSION: u16 = 61;
const ACC_PUBLIC: u16 = 0x0001;
const ACC_SUPER: u16 = 0x0020;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PoolEntry {
    Utf8(String),
    Integer(i32),
    Long(i64),
    Class(u16),
    String(u16),
    FieldRef(u16, u16),
    MethodRef(u16, u16),
    InterfaceMethodRef(u16, u16),
    NameAndType(u16, u16),
    MethodType(u16),
    InvokeDynamic(u16, u16),
}

#[derive(Debug, Default)]
struct PoolWriter {
    entries: Vec<PoolEntry>,
    indices: HashMap<PoolEntry, u16>,
    next_index: u16,
}

impl PoolWriter {
    fn new() -> Self {
        Self {
            next_index: 1,
            ..Self::default()
        }
    }

    fn add(&mut self, entry: PoolEntry) -> u16 {
        if let Some(index) = self.indices.get(&entry) {
            return *index;
        }
        let index = self.next_index;
        self.next_index += if matches!(entry, PoolEntry::Long(_)) { 2 } else { 1 };
        self.indices.insert(entry.clone(), index);
        self.entries.push(entry);
        index
    }

    fn utf8(&mut self, value: &str) -> u16 {
        self.add(PoolEntry::Utf8(value.to_string()))
    }

    fn class(&mut self, internal_name: &str) -> u16 {
        let name = self.utf8(internal_name);
        self.add(PoolEntry::Class(name))
    }

    fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        self.add(PoolEntry::NameAndType(name, descriptor))
    }

    fn write(&self, out: &mut Vec<u8>) {
        put_u2(out, self.next_index);
        for entry in &self.entries {
            match entry {
                PoolEntry::Utf8(value) => {
                    out.push(1);
                    put_u2(out, value.len() as u16);
                    out.extend_from_slice(value.as_bytes());
                }
                PoolEntry::Integer(value) => {
                    out.push(3);
                    out.extend_from_slice(&value.to_be_bytes());
                }
                PoolEntry::Long(value) => {
                    out.push(5);
                    out.extend_from_slice(&value.to_be_bytes());
                }
                PoolEntry::Class(name) => {
                    out.push(7);
                    put_u2(out, *name);
                }
                PoolEntry::String(value) => {
                    out.push(8);
                    put_u2(out, *value);
                }
                PoolEntry::FieldRef(class, nat)
                | PoolEntry::MethodRef(class, nat)
                | PoolEntry::InterfaceMethodRef(class, nat) => {
                    out.push(match entry {
                        PoolEntry::FieldRef(..) => 9,
                        PoolEntry::MethodRef(..) => 10,
                        _ => 11,
                    });
                    put_u2(out, *class);
                    put_u2(out, *nat);
                }
                PoolEntry::NameAndType(name, descriptor) => {
                    out.push(12);
                    put_u2(out, *name);
                    put_u2(out, *descriptor);
                }
                PoolEntry::MethodType(descriptor) => {
                    out.push(16);
                    put_u2(out, *descriptor);
                }
                PoolEntry::InvokeDynamic(bootstrap, nat) => {
                    out.push(18);
                    put_u2(out, *bootstrap);
                    put_u2(out, *nat);
                }
            }
        }
    }
}

fn put_u2(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn put_u4(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn attribute(pool: &mut PoolWriter, name: &str, body: &[u8], out: &mut Vec<u8>) {
    put_u2(out, pool.utf8(name));
    put_u4(out, body.len() as u32);
    out.extend_from_slice(body);
}

/// Value of an annotation element.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementSpec {
    Int(i32),
    Str(String),
    Enum {
        type_descriptor: String,
        const_name: String,
    },
    /// Return descriptor of a class literal.
    Class(String),
    Annotation(AnnotationSpec),
    Array(Vec<ElementSpec>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationSpec {
    pub type_descriptor: String,
    pub elements: Vec<(String, ElementSpec)>,
}

impl AnnotationSpec {
    pub fn new(type_descriptor: impl Into<String>) -> Self {
        Self {
            type_descriptor: type_descriptor.into(),
            elements: Vec::new(),
        }
    }

    pub fn element(mut self, name: impl Into<String>, value: ElementSpec) -> Self {
        self.elements.push((name.into(), value));
        self
    }

    fn write(&self, pool: &mut PoolWriter, out: &mut Vec<u8>) {
        put_u2(out, pool.utf8(&self.type_descriptor));
        put_u2(out, self.elements.len() as u16);
        for (name, value) in &self.elements {
            put_u2(out, pool.utf8(name));
            value.write(pool, out);
        }
    }
}

impl ElementSpec {
    fn write(&self, pool: &mut PoolWriter, out: &mut Vec<u8>) {
        match self {
            ElementSpec::Int(value) => {
                out.push(b'I');
                put_u2(out, pool.add(PoolEntry::Integer(*value)));
            }
            ElementSpec::Str(value) => {
                out.push(b's');
                put_u2(out, pool.utf8(value));
            }
            ElementSpec::Enum {
                type_descriptor,
                const_name,
            } => {
                out.push(b'e');
                put_u2(out, pool.utf8(type_descriptor));
                put_u2(out, pool.utf8(const_name));
            }
            ElementSpec::Class(descriptor) => {
                out.push(b'c');
                put_u2(out, pool.utf8(descriptor));
            }
            ElementSpec::Annotation(annotation) => {
                out.push(b'@');
                annotation.write(pool, out);
            }
            ElementSpec::Array(values) => {
                out.push(b'[');
                put_u2(out, values.len() as u16);
                for value in values {
                    value.write(pool, out);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
struct AnnotationSet {
    visible: Vec<AnnotationSpec>,
    type_annotations: Vec<(u8, AnnotationSpec)>,
}

impl AnnotationSet {
    fn write(&self, pool: &mut PoolWriter, count: &mut u16, out: &mut Vec<u8>) {
        if !self.visible.is_empty() {
            let mut body = Vec::new();
            put_u2(&mut body, self.visible.len() as u16);
            for annotation in &self.visible {
                annotation.write(pool, &mut body);
            }
            attribute(pool, "RuntimeVisibleAnnotations", &body, out);
            *count += 1;
        }
        if !self.type_annotations.is_empty() {
            let mut body = Vec::new();
            put_u2(&mut body, self.type_annotations.len() as u16);
            for (target_type, annotation) in &self.type_annotations {
                body.push(*target_type);
                match target_type {
                    0x40 | 0x41 => put_u2(&mut body, 0),
                    other => body.extend(std::iter::repeat(0).take(target_info_len(*other))),
                }
                body.push(0); // empty type path
                annotation.write(pool, &mut body);
            }
            attribute(pool, "RuntimeInvisibleTypeAnnotations", &body, out);
            *count += 1;
        }
    }
}

fn target_info_len(target_type: u8) -> usize {
    match target_type {
        0x00 | 0x01 | 0x16 => 1,
        0x13..=0x15 => 0,
        0x47..=0x4B => 3,
        _ => 2,
    }
}

/// One instruction of a synthetic method body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    New(String),
    ANewArray(String),
    CheckCast(String),
    InstanceOf(String),
    MultiANewArray(String, u8),
    GetField {
        owner: String,
        name: String,
        descriptor: String,
    },
    PutStatic {
        owner: String,
        name: String,
        descriptor: String,
    },
    InvokeVirtual {
        owner: String,
        name: String,
        descriptor: String,
    },
    InvokeInterface {
        owner: String,
        name: String,
        descriptor: String,
    },
    InvokeDynamic {
        name: String,
        descriptor: String,
    },
    LdcClass(String),
    LdcMethodType(String),
    LdcString(String),
    LdcLong(i64),
    TableSwitch { low: i32, high: i32 },
    LookupSwitch { pairs: u32 },
    /// Arbitrary bytes, copied verbatim.
    Raw(Vec<u8>),
}

impl Op {
    pub fn invoke_virtual(owner: &str, name: &str, descriptor: &str) -> Self {
        Op::InvokeVirtual {
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        }
    }

    pub fn get_field(owner: &str, name: &str, descriptor: &str) -> Self {
        Op::GetField {
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        }
    }

    fn write(&self, pool: &mut PoolWriter, code: &mut Vec<u8>) {
        let type_insn = |code: &mut Vec<u8>, pool: &mut PoolWriter, opcode: u8, class: &str| {
            code.push(opcode);
            put_u2(code, pool.class(class));
        };
        match self {
            Op::New(class) => type_insn(code, pool, opcodes::NEW, class),
            Op::ANewArray(class) => type_insn(code, pool, opcodes::ANEWARRAY, class),
            Op::CheckCast(class) => type_insn(code, pool, opcodes::CHECKCAST, class),
            Op::InstanceOf(class) => type_insn(code, pool, opcodes::INSTANCEOF, class),
            Op::MultiANewArray(class, dimensions) => {
                type_insn(code, pool, opcodes::MULTIANEWARRAY, class);
                code.push(*dimensions);
            }
            Op::GetField {
                owner,
                name,
                descriptor,
            }
            | Op::PutStatic {
                owner,
                name,
                descriptor,
            } => {
                let class = pool.class(owner);
                let nat = pool.name_and_type(name, descriptor);
                let opcode = if matches!(self, Op::GetField { .. }) {
                    opcodes::GETFIELD
                } else {
                    opcodes::PUTSTATIC
                };
                code.push(opcode);
                put_u2(code, pool.add(PoolEntry::FieldRef(class, nat)));
            }
            Op::InvokeVirtual {
                owner,
                name,
                descriptor,
            } => {
                let class = pool.class(owner);
                let nat = pool.name_and_type(name, descriptor);
                code.push(opcodes::INVOKEVIRTUAL);
                put_u2(code, pool.add(PoolEntry::MethodRef(class, nat)));
            }
            Op::InvokeInterface {
                owner,
                name,
                descriptor,
            } => {
                let class = pool.class(owner);
                let nat = pool.name_and_type(name, descriptor);
                code.push(opcodes::INVOKEINTERFACE);
                put_u2(code, pool.add(PoolEntry::InterfaceMethodRef(class, nat)));
                code.extend_from_slice(&[1, 0]);
            }
            Op::InvokeDynamic { name, descriptor } => {
                let nat = pool.name_and_type(name, descriptor);
                code.push(opcodes::INVOKEDYNAMIC);
                put_u2(code, pool.add(PoolEntry::InvokeDynamic(0, nat)));
                code.extend_from_slice(&[0, 0]);
            }
            Op::LdcClass(class) => type_insn(code, pool, opcodes::LDC_W, class),
            Op::LdcMethodType(descriptor) => {
                let descriptor = pool.utf8(descriptor);
                code.push(opcodes::LDC_W);
                put_u2(code, pool.add(PoolEntry::MethodType(descriptor)));
            }
            Op::LdcString(value) => {
                let value = pool.utf8(value);
                code.push(opcodes::LDC_W);
                put_u2(code, pool.add(PoolEntry::String(value)));
            }
            Op::LdcLong(value) => {
                code.push(0x14);
                put_u2(code, pool.add(PoolEntry::Long(*value)));
            }
            Op::TableSwitch { low, high } => {
                let offset = code.len();
                code.push(opcodes::TABLESWITCH);
                code.extend(std::iter::repeat(0).take((4 - (offset + 1) % 4) % 4));
                code.extend_from_slice(&0i32.to_be_bytes());
                code.extend_from_slice(&low.to_be_bytes());
                code.extend_from_slice(&high.to_be_bytes());
                let entries = (i64::from(*high) - i64::from(*low) + 1).max(0) as usize;
                code.extend(std::iter::repeat(0).take(entries * 4));
            }
            Op::LookupSwitch { pairs } => {
                let offset = code.len();
                code.push(opcodes::LOOKUPSWITCH);
                code.extend(std::iter::repeat(0).take((4 - (offset + 1) % 4) % 4));
                code.extend_from_slice(&0i32.to_be_bytes());
                code.extend_from_slice(&pairs.to_be_bytes());
                code.extend(std::iter::repeat(0).take(*pairs as usize * 8));
            }
            Op::Raw(bytes) => code.extend_from_slice(bytes),
        }
    }
}

/// A method body. A trailing `return` is always appended.
#[derive(Debug, Clone, Default)]
pub struct CodeSpec {
    ops: Vec<Op>,
    handlers: Vec<Option<String>>,
    locals: Vec<(String, String)>,
    local_types: Vec<(String, String)>,
    type_annotations: Vec<(u8, AnnotationSpec)>,
}

impl CodeSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn op(mut self, op: Op) -> Self {
        self.ops.push(op);
        self
    }

    /// Adds an exception handler covering the whole body; `None` is `finally`.
    pub fn handler(mut self, catch_type: Option<&str>) -> Self {
        self.handlers.push(catch_type.map(str::to_string));
        self
    }

    pub fn local(mut self, name: &str, descriptor: &str) -> Self {
        self.locals.push((name.to_string(), descriptor.to_string()));
        self
    }

    pub fn local_type(mut self, name: &str, signature: &str) -> Self {
        self.local_types.push((name.to_string(), signature.to_string()));
        self
    }

    pub fn type_annotation(mut self, target_type: u8, annotation: AnnotationSpec) -> Self {
        self.type_annotations.push((target_type, annotation));
        self
    }

    fn write(&self, pool: &mut PoolWriter) -> Vec<u8> {
        let mut code = Vec::new();
        for op in &self.ops {
            op.write(pool, &mut code);
        }
        code.push(0xb1);

        let mut body = Vec::new();
        put_u2(&mut body, 8);
        put_u2(&mut body, 8);
        put_u4(&mut body, code.len() as u32);
        body.extend_from_slice(&code);

        put_u2(&mut body, self.handlers.len() as u16);
        for catch_type in &self.handlers {
            put_u2(&mut body, 0);
            put_u2(&mut body, code.len() as u16 - 1);
            put_u2(&mut body, 0);
            put_u2(&mut body, catch_type.as_deref().map_or(0, |name| pool.class(name)));
        }

        let mut attributes = Vec::new();
        let mut count = 0;
        for (name, table) in [
            ("LocalVariableTable", &self.locals),
            ("LocalVariableTypeTable", &self.local_types),
        ] {
            if table.is_empty() {
                continue;
            }
            let mut entries = Vec::new();
            put_u2(&mut entries, table.len() as u16);
            for (slot, (local, descriptor)) in table.iter().enumerate() {
                put_u2(&mut entries, 0);
                put_u2(&mut entries, code.len() as u16);
                put_u2(&mut entries, pool.utf8(local));
                put_u2(&mut entries, pool.utf8(descriptor));
                put_u2(&mut entries, slot as u16);
            }
            attribute(pool, name, &entries, &mut attributes);
            count += 1;
        }
        let annotations = AnnotationSet {
            visible: Vec::new(),
            type_annotations: self.type_annotations.clone(),
        };
        annotations.write(pool, &mut count, &mut attributes);

        put_u2(&mut body, count);
        body.extend_from_slice(&attributes);
        body
    }
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    descriptor: String,
    signature: Option<String>,
    annotations: AnnotationSet,
}

impl FieldSpec {
    pub fn new(name: &str, descriptor: &str) -> Self {
        Self {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            signature: None,
            annotations: AnnotationSet::default(),
        }
    }

    pub fn signature(mut self, signature: &str) -> Self {
        self.signature = Some(signature.to_string());
        self
    }

    pub fn annotation(mut self, annotation: AnnotationSpec) -> Self {
        self.annotations.visible.push(annotation);
        self
    }

    pub fn type_annotation(mut self, target_type: u8, annotation: AnnotationSpec) -> Self {
        self.annotations.type_annotations.push((target_type, annotation));
        self
    }
}

#[derive(Debug, Clone)]
pub struct MethodSpec {
    name: String,
    descriptor: String,
    signature: Option<String>,
    exceptions: Vec<String>,
    code: Option<CodeSpec>,
    annotations: AnnotationSet,
    parameter_annotations: Vec<Vec<AnnotationSpec>>,
    annotation_default: Option<ElementSpec>,
}

impl MethodSpec {
    pub fn new(name: &str, descriptor: &str) -> Self {
        Self {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            signature: None,
            exceptions: Vec::new(),
            code: None,
            annotations: AnnotationSet::default(),
            parameter_annotations: Vec::new(),
            annotation_default: None,
        }
    }

    pub fn signature(mut self, signature: &str) -> Self {
        self.signature = Some(signature.to_string());
        self
    }

    pub fn throws(mut self, exception: &str) -> Self {
        self.exceptions.push(exception.to_string());
        self
    }

    pub fn code(mut self, code: CodeSpec) -> Self {
        self.code = Some(code);
        self
    }

    pub fn annotation(mut self, annotation: AnnotationSpec) -> Self {
        self.annotations.visible.push(annotation);
        self
    }

    pub fn parameter_annotation(mut self, parameter: usize, annotation: AnnotationSpec) -> Self {
        if self.parameter_annotations.len() <= parameter {
            self.parameter_annotations.resize(parameter + 1, Vec::new());
        }
        self.parameter_annotations[parameter].push(annotation);
        self
    }

    pub fn annotation_default(mut self, value: ElementSpec) -> Self {
        self.annotation_default = Some(value);
        self
    }
}

#[derive(Debug, Clone)]
struct InnerClassSpec {
    inner: String,
    outer: Option<String>,
    simple_name: Option<String>,
    flags: u16,
}

/// Builds one class file. Names are internal names (`pkg/Outer$Inner`).
#[derive(Debug, Clone)]
pub struct ClassFileBuilder {
    name: String,
    super_class: Option<String>,
    interfaces: Vec<String>,
    access_flags: u16,
    signature: Option<String>,
    fields: Vec<FieldSpec>,
    methods: Vec<MethodSpec>,
    inner_classes: Vec<InnerClassSpec>,
    enclosing_method: Option<(String, Option<(String, String)>)>,
    annotations: AnnotationSet,
    trailing: Vec<(String, Vec<u8>)>,
}

impl ClassFileBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            super_class: Some("java/lang/Object".to_string()),
            interfaces: Vec::new(),
            access_flags: ACC_PUBLIC | ACC_SUPER,
            signature: None,
            fields: Vec::new(),
            methods: Vec::new(),
            inner_classes: Vec::new(),
            enclosing_method: None,
            annotations: AnnotationSet::default(),
            trailing: Vec::new(),
        }
    }

    pub fn super_class(mut self, name: Option<&str>) -> Self {
        self.super_class = name.map(str::to_string);
        self
    }

    pub fn interface(mut self, name: &str) -> Self {
        self.interfaces.push(name.to_string());
        self
    }

    pub fn access_flags(mut self, flags: u16) -> Self {
        self.access_flags = flags;
        self
    }

    pub fn signature(mut self, signature: &str) -> Self {
        self.signature = Some(signature.to_string());
        self
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: MethodSpec) -> Self {
        self.methods.push(method);
        self
    }

    pub fn inner_class(
        mut self,
        inner: &str,
        outer: Option<&str>,
        simple_name: Option<&str>,
        flags: u16,
    ) -> Self {
        self.inner_classes.push(InnerClassSpec {
            inner: inner.to_string(),
            outer: outer.map(str::to_string),
            simple_name: simple_name.map(str::to_string),
            flags,
        });
        self
    }

    /// Records `self` as a member of `outer` (and `outer` as its enclosing class).
    pub fn member_of(self, outer: &str) -> Self {
        let simple = self
            .name
            .rsplit_once('$')
            .map(|(_, simple)| simple.to_string());
        let name = self.name.clone();
        self.inner_class(&name, Some(outer), simple.as_deref(), ACC_PUBLIC)
    }

    pub fn enclosing_method(mut self, class: &str, method: Option<(&str, &str)>) -> Self {
        self.enclosing_method = Some((
            class.to_string(),
            method.map(|(name, descriptor)| (name.to_string(), descriptor.to_string())),
        ));
        self
    }

    pub fn annotation(mut self, annotation: AnnotationSpec) -> Self {
        self.annotations.visible.push(annotation);
        self
    }

    pub fn type_annotation(mut self, target_type: u8, annotation: AnnotationSpec) -> Self {
        self.annotations.type_annotations.push((target_type, annotation));
        self
    }

    /// Appends an attribute with an arbitrary name and body.
    pub fn raw_attribute(mut self, name: &str, body: Vec<u8>) -> Self {
        self.trailing.push((name.to_string(), body));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut pool = PoolWriter::new();
        let mut body = Vec::new();

        put_u2(&mut body, self.access_flags);
        put_u2(&mut body, pool.class(&self.name));
        put_u2(
            &mut body,
            self.super_class.as_deref().map_or(0, |name| pool.class(name)),
        );
        put_u2(&mut body, self.interfaces.len() as u16);
        for interface in &self.interfaces {
            put_u2(&mut body, pool.class(interface));
        }

        put_u2(&mut body, self.fields.len() as u16);
        for field in &self.fields {
            put_u2(&mut body, ACC_PUBLIC);
            put_u2(&mut body, pool.utf8(&field.name));
            put_u2(&mut body, pool.utf8(&field.descriptor));
            let mut attributes = Vec::new();
            let mut count = 0;
            if let Some(signature) = &field.signature {
                let index = pool.utf8(signature);
                attribute(&mut pool, "Signature", &index.to_be_bytes(), &mut attributes);
                count += 1;
            }
            field.annotations.write(&mut pool, &mut count, &mut attributes);
            put_u2(&mut body, count);
            body.extend_from_slice(&attributes);
        }

        put_u2(&mut body, self.methods.len() as u16);
        for method in &self.methods {
            self.write_method(method, &mut pool, &mut body);
        }

        let mut attributes = Vec::new();
        let mut count = 0;
        if let Some(signature) = &self.signature {
            let index = pool.utf8(signature);
            attribute(&mut pool, "Signature", &index.to_be_bytes(), &mut attributes);
            count += 1;
        }
        if !self.inner_classes.is_empty() {
            let mut table = Vec::new();
            put_u2(&mut table, self.inner_classes.len() as u16);
            for entry in &self.inner_classes {
                put_u2(&mut table, pool.class(&entry.inner));
                put_u2(&mut table, entry.outer.as_deref().map_or(0, |name| pool.class(name)));
                put_u2(
                    &mut table,
                    entry.simple_name.as_deref().map_or(0, |name| pool.utf8(name)),
                );
                put_u2(&mut table, entry.flags);
            }
            attribute(&mut pool, "InnerClasses", &table, &mut attributes);
            count += 1;
        }
        if let Some((class, method)) = &self.enclosing_method {
            let mut record = Vec::new();
            put_u2(&mut record, pool.class(class));
            put_u2(
                &mut record,
                method
                    .as_ref()
                    .map_or(0, |(name, descriptor)| pool.name_and_type(name, descriptor)),
            );
            attribute(&mut pool, "EnclosingMethod", &record, &mut attributes);
            count += 1;
        }
        self.annotations.write(&mut pool, &mut count, &mut attributes);
        for (name, raw) in &self.trailing {
            attribute(&mut pool, name, raw, &mut attributes);
            count += 1;
        }
        put_u2(&mut body, count);
        body.extend_from_slice(&attributes);

        let mut out = Vec::with_capacity(body.len() + 64);
        put_u4(&mut out, 0xCAFEBABE);
        put_u2(&mut out, 0);
        put_u2(&mut out, MAJOR_VERSION);
        pool.write(&mut out);
        out.extend_from_slice(&body);
        out
    }

    fn write_method(&self, method: &MethodSpec, pool: &mut PoolWriter, out: &mut Vec<u8>) {
        put_u2(out, ACC_PUBLIC);
        put_u2(out, pool.utf8(&method.name));
        put_u2(out, pool.utf8(&method.descriptor));

        let mut attributes = Vec::new();
        let mut count = 0;
        if let Some(signature) = &method.signature {
            let index = pool.utf8(signature);
            attribute(pool, "Signature", &index.to_be_bytes(), &mut attributes);
            count += 1;
        }
        if !method.exceptions.is_empty() {
            let mut table = Vec::new();
            put_u2(&mut table, method.exceptions.len() as u16);
            for exception in &method.exceptions {
                put_u2(&mut table, pool.class(exception));
            }
            attribute(pool, "Exceptions", &table, &mut attributes);
            count += 1;
        }
        if let Some(code) = &method.code {
            let body = code.write(pool);
            attribute(pool, "Code", &body, &mut attributes);
            count += 1;
        }
        method.annotations.write(pool, &mut count, &mut attributes);
        if !method.parameter_annotations.is_empty() {
            let mut table = vec![method.parameter_annotations.len() as u8];
            for parameter in &method.parameter_annotations {
                put_u2(&mut table, parameter.len() as u16);
                for annotation in parameter {
                    annotation.write(pool, &mut table);
                }
            }
            attribute(pool, "RuntimeVisibleParameterAnnotations", &table, &mut attributes);
            count += 1;
        }
        if let Some(value) = &method.annotation_default {
            let mut encoded = Vec::new();
            value.write(pool, &mut encoded);
            attribute(pool, "AnnotationDefault", &encoded, &mut attributes);
            count += 1;
        }
        put_u2(out, count);
        out.extend_from_slice(&attributes);
    }
}
