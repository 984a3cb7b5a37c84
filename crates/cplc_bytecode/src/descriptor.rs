//! Type names referenced by descriptors and generic signatures.
//!
//! Field and method descriptors are a subset of the signature grammar, so a
//! single scanner serves both. It walks the whole input: every class type,
//! including nested type arguments and inner-class suffixes,
//! is reported; primitives, `void`, type variables and wildcards are not.

use crate::error::ClassParseError;

/// Upper bound on array dimensions in a descriptor.
pub const MAX_ARRAY_DIMENSIONS: usize = 255;

/// Upper bound on type-argument nesting in a signature.
const MAX_TYPE_ARGUMENT_DEPTH: usize = 255;

/// Collects the dotted names of every class type in a descriptor or signature.
pub fn referenced_types(signature: &str) -> Result<Vec<String>, ClassParseError> {
    let mut names = Vec::new();
    SignatureScanner::new(signature, &mut names).scan()?;
    Ok(names)
}

/// Names referenced by a `Class` constant operand. Array classes appear as
/// descriptors (`[Ljava/lang/String;`, `[I`), plain classes as internal names.
pub fn class_operand_types(name: &str) -> Result<Vec<String>, ClassParseError> {
    if name.starts_with('[') {
        return referenced_types(name);
    }
    validate_internal_name(name, name)?;
    Ok(vec![name.replace('/', ".")])
}

/// Names referenced by an annotation `class_info` element, which is a return
/// descriptor and may therefore be `V`.
pub fn return_descriptor_types(descriptor: &str) -> Result<Vec<String>, ClassParseError> {
    if descriptor == "V" {
        return Ok(Vec::new());
    }
    referenced_types(descriptor)
}

fn validate_internal_name(name: &str, context: &str) -> Result<(), ClassParseError> {
    let invalid = name.is_empty()
        || name.starts_with('/')
        || name.ends_with('/')
        || name.contains("//")
        || name
            .chars()
            .any(|ch| matches!(ch, '.' | ';' | '[' | '<' | '>' | ':'));
    if invalid {
        return Err(ClassParseError::InvalidDescriptor(context.to_string()));
    }
    Ok(())
}

struct SignatureScanner<'a, 'o> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
    out: &'o mut Vec<String>,
}

impl<'a, 'o> SignatureScanner<'a, 'o> {
    fn new(text: &'a str, out: &'o mut Vec<String>) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            depth: 0,
            out,
        }
    }

    fn error(&self) -> ClassParseError {
        ClassParseError::InvalidDescriptor(self.text.to_string())
    }

    fn peek(&self) -> Result<u8, ClassParseError> {
        self.bytes.get(self.pos).copied().ok_or_else(|| self.error())
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn expect(&mut self, byte: u8) -> Result<(), ClassParseError> {
        if self.peek()? != byte {
            return Err(self.error());
        }
        self.pos += 1;
        Ok(())
    }

    fn scan(mut self) -> Result<(), ClassParseError> {
        if self.at_end() {
            return Err(self.error());
        }
        if self.peek()? == b'<' {
            self.formal_type_parameters()?;
        }

        if !self.at_end() && self.peek()? == b'(' {
            self.pos += 1;
            while self.peek()? != b')' {
                self.type_signature()?;
            }
            self.pos += 1;
            if self.peek()? == b'V' {
                self.pos += 1;
            } else {
                self.type_signature()?;
            }
            while !self.at_end() {
                self.expect(b'^')?;
                self.type_signature()?;
            }
        } else {
            // Field descriptor, field signature or class signature (super
            // class followed by interfaces).
            if self.at_end() {
                return Err(self.error());
            }
            while !self.at_end() {
                self.type_signature()?;
            }
        }
        Ok(())
    }

    fn formal_type_parameters(&mut self) -> Result<(), ClassParseError> {
        self.expect(b'<')?;
        while self.peek()? != b'>' {
            let start = self.pos;
            while self.peek()? != b':' {
                self.pos += 1;
            }
            if self.pos == start {
                return Err(self.error());
            }
            while !self.at_end() && self.peek()? == b':' {
                self.pos += 1;
                if matches!(self.peek()?, b'L' | b'T' | b'[') {
                    self.type_signature()?;
                }
            }
        }
        self.pos += 1;
        Ok(())
    }

    fn type_signature(&mut self) -> Result<(), ClassParseError> {
        let mut dimensions = 0;
        while self.peek()? == b'[' {
            dimensions += 1;
            if dimensions > MAX_ARRAY_DIMENSIONS {
                return Err(self.error());
            }
            self.pos += 1;
        }
        match self.peek()? {
            b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' => {
                self.pos += 1;
                Ok(())
            }
            b'T' => {
                self.pos += 1;
                let start = self.pos;
                while self.peek()? != b';' {
                    self.pos += 1;
                }
                if self.pos == start {
                    return Err(self.error());
                }
                self.pos += 1;
                Ok(())
            }
            b'L' => self.class_type_signature(),
            _ => Err(self.error()),
        }
    }

    fn class_type_signature(&mut self) -> Result<(), ClassParseError> {
        self.expect(b'L')?;
        let mut name = self.identifier()?;
        validate_internal_name(&name, self.text)?;
        name = name.replace('/', ".");
        self.out.push(name.clone());

        loop {
            match self.peek()? {
                b'<' => self.type_arguments()?,
                b'.' => {
                    self.pos += 1;
                    let simple = self.identifier()?;
                    if simple.contains('/') {
                        return Err(self.error());
                    }
                    validate_internal_name(&simple, self.text)?;
                    name = format!("{name}${simple}");
                    self.out.push(name.clone());
                }
                b';' => {
                    self.pos += 1;
                    return Ok(());
                }
                _ => return Err(self.error()),
            }
        }
    }

    fn identifier(&mut self) -> Result<String, ClassParseError> {
        let start = self.pos;
        while !matches!(self.peek()?, b'<' | b'.' | b';') {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error());
        }
        Ok(self.text[start..self.pos].to_string())
    }

    fn type_arguments(&mut self) -> Result<(), ClassParseError> {
        self.expect(b'<')?;
        if self.peek()? == b'>' || self.depth == MAX_TYPE_ARGUMENT_DEPTH {
            return Err(self.error());
        }
        self.depth += 1;
        while self.peek()? != b'>' {
            match self.peek()? {
                b'*' => self.pos += 1,
                b'+' | b'-' => {
                    self.pos += 1;
                    self.type_signature()?;
                }
                _ => self.type_signature()?,
            }
        }
        self.pos += 1;
        self.depth -= 1;
        Ok(())
    }
}
