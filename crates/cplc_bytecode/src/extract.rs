//! Binary type-reference extraction.

use crate::classfile::{Annotation, Attribute, ClassFile, ElementValue, Member};
use crate::code::Instruction;
use crate::descriptor::{class_operand_types, referenced_types, return_descriptor_types};
use crate::error::ClassParseError;
use cplc_api::TypeIdentifier;
use std::collections::BTreeSet;

const PRIMITIVE_NAMES: [&str; 9] = [
    "void", "boolean", "byte", "char", "short", "int", "long", "float", "double",
];

/// Every type name the class at `bytes` structurally references, its own
/// name included.
pub fn extract_type_names(bytes: &[u8]) -> Result<BTreeSet<TypeIdentifier>, ClassParseError> {
    let class = ClassFile::parse(bytes)?;
    collect_type_names(&class)
}

pub fn collect_type_names(class: &ClassFile) -> Result<BTreeSet<TypeIdentifier>, ClassParseError> {
    let mut collector = TypeCollector::default();
    collector.visit_class(class)?;
    tracing::trace!(
        class = %class.this_class,
        references = collector.names.len(),
        "collected type references"
    );
    Ok(collector.finish())
}

#[derive(Default)]
struct TypeCollector {
    names: BTreeSet<String>,
}

impl TypeCollector {
    fn finish(self) -> BTreeSet<TypeIdentifier> {
        self.names
            .into_iter()
            .filter(|name| is_type_name(name))
            .map(TypeIdentifier::new)
            .collect()
    }

    fn add_all(&mut self, names: Vec<String>) {
        self.names.extend(names);
    }

    fn class_operand(&mut self, name: &str) -> Result<(), ClassParseError> {
        self.add_all(class_operand_types(name)?);
        Ok(())
    }

    fn descriptor(&mut self, descriptor: &str) -> Result<(), ClassParseError> {
        self.add_all(referenced_types(descriptor)?);
        Ok(())
    }

    fn visit_class(&mut self, class: &ClassFile) -> Result<(), ClassParseError> {
        self.class_operand(&class.this_class)?;
        if let Some(super_class) = &class.super_class {
            self.class_operand(super_class)?;
        }
        for interface in &class.interfaces {
            self.class_operand(interface)?;
        }
        for member in class.fields.iter().chain(&class.methods) {
            self.visit_member(member)?;
        }
        self.visit_attributes(&class.attributes)
    }

    fn visit_member(&mut self, member: &Member) -> Result<(), ClassParseError> {
        self.descriptor(&member.descriptor)?;
        self.visit_attributes(&member.attributes)
    }

    fn visit_attributes(&mut self, attributes: &[Attribute]) -> Result<(), ClassParseError> {
        for attribute in attributes {
            self.visit_attribute(attribute)?;
        }
        Ok(())
    }

    fn visit_attribute(&mut self, attribute: &Attribute) -> Result<(), ClassParseError> {
        match attribute {
            Attribute::Signature(signature) => self.descriptor(signature)?,
            Attribute::Exceptions(exceptions) => {
                for exception in exceptions {
                    self.class_operand(exception)?;
                }
            }
            Attribute::Code(code) => {
                for instruction in &code.instructions {
                    self.visit_instruction(instruction)?;
                }
                for handler in &code.exception_handlers {
                    if let Some(catch_type) = &handler.catch_type {
                        self.class_operand(catch_type)?;
                    }
                }
                self.visit_attributes(&code.attributes)?;
            }
            Attribute::InnerClasses(entries) => {
                for entry in entries {
                    self.class_operand(&entry.inner_class)?;
                    if let Some(outer) = &entry.outer_class {
                        self.class_operand(outer)?;
                    }
                }
            }
            Attribute::EnclosingMethod { class, method } => {
                self.class_operand(class)?;
                if let Some((_, descriptor)) = method {
                    self.descriptor(descriptor)?;
                }
            }
            Attribute::Annotations { annotations, .. } => {
                for annotation in annotations {
                    self.visit_annotation(annotation)?;
                }
            }
            Attribute::ParameterAnnotations { parameters, .. } => {
                for annotation in parameters.iter().flatten() {
                    self.visit_annotation(annotation)?;
                }
            }
            Attribute::TypeAnnotations { annotations, .. } => {
                for type_annotation in annotations {
                    self.visit_annotation(&type_annotation.annotation)?;
                }
            }
            Attribute::AnnotationDefault(value) => self.visit_element_value(value)?,
            Attribute::LocalVariables(variables) | Attribute::LocalVariableTypes(variables) => {
                for variable in variables {
                    self.descriptor(&variable.descriptor)?;
                }
            }
            Attribute::Record(components) => {
                for component in components {
                    self.descriptor(&component.descriptor)?;
                    self.visit_attributes(&component.attributes)?;
                }
            }
            Attribute::Other { .. } => {}
        }
        Ok(())
    }

    fn visit_instruction(&mut self, instruction: &Instruction) -> Result<(), ClassParseError> {
        match instruction {
            Instruction::Type { class, .. }
            | Instruction::MultiANewArray { class, .. }
            | Instruction::LoadClass(class) => self.class_operand(class),
            Instruction::Field {
                owner, descriptor, ..
            }
            | Instruction::Method {
                owner, descriptor, ..
            } => {
                self.class_operand(owner)?;
                self.descriptor(descriptor)
            }
            Instruction::InvokeDynamic { descriptor, .. }
            | Instruction::LoadMethodType(descriptor) => self.descriptor(descriptor),
        }
    }

    fn visit_annotation(&mut self, annotation: &Annotation) -> Result<(), ClassParseError> {
        self.descriptor(&annotation.type_descriptor)?;
        for (_, value) in &annotation.elements {
            self.visit_element_value(value)?;
        }
        Ok(())
    }

    fn visit_element_value(&mut self, value: &ElementValue) -> Result<(), ClassParseError> {
        match value {
            ElementValue::Const { .. } => Ok(()),
            ElementValue::Enum {
                type_descriptor, ..
            } => self.descriptor(type_descriptor),
            ElementValue::Class(descriptor) => {
                self.add_all(return_descriptor_types(descriptor)?);
                Ok(())
            }
            ElementValue::Annotation(annotation) => self.visit_annotation(annotation),
            ElementValue::Array(values) => {
                for value in values {
                    self.visit_element_value(value)?;
                }
                Ok(())
            }
        }
    }
}

fn is_type_name(name: &str) -> bool {
    !name.is_empty()
        && !PRIMITIVE_NAMES.contains(&name)
        && !name.ends_with("[]")
        && !name.contains(|ch| matches!(ch, ';' | '<' | '>' | '/' | '['))
}
