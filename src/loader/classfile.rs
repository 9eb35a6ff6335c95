//! Class file parsing.
//!
//! Bodies are decoded only after the class attributes are read, so that position
//! markers can carry the `SourceFile` name.

use std::sync::Arc;

use log::{debug, trace};

use crate::{
    file::{
        io::{read16, read32},
        parser::Parser,
    },
    ir::decoder::{decode_body, ExceptionHandler, LineNumber, RawCode},
    loader::{AttributeHook, FieldOrMethod},
    metadata::{
        ClassAccess, ClassDef, ClassVersion, ConstantPool, FieldAccess, FieldDef, MethodAccess,
        MethodDef,
    },
    Result,
};

const MAGIC: u32 = 0xCAFE_BABE;

const FIELD_ATTRIBUTES: &[&str] = &[
    "ConstantValue",
    "Synthetic",
    "Deprecated",
    "Signature",
    "RuntimeVisibleAnnotations",
    "RuntimeInvisibleAnnotations",
    "RuntimeVisibleTypeAnnotations",
    "RuntimeInvisibleTypeAnnotations",
];

const METHOD_ATTRIBUTES: &[&str] = &[
    "Code",
    "Exceptions",
    "Synthetic",
    "Deprecated",
    "Signature",
    "RuntimeVisibleAnnotations",
    "RuntimeInvisibleAnnotations",
    "RuntimeVisibleTypeAnnotations",
    "RuntimeInvisibleTypeAnnotations",
    "RuntimeVisibleParameterAnnotations",
    "RuntimeInvisibleParameterAnnotations",
    "AnnotationDefault",
    "MethodParameters",
];

struct Attribute<'a> {
    name: String,
    payload: &'a [u8],
}

struct RawMember<'a> {
    access: u16,
    name: String,
    descriptor: String,
    attributes: Vec<Attribute<'a>>,
}

impl<'a> RawMember<'a> {
    fn parse(parser: &mut Parser<'a>, pool: &ConstantPool) -> Result<Self> {
        let access = parser.read_be::<u16>()?;
        let name = pool.utf8(parser.read_be::<u16>()?)?.to_string();
        let descriptor = pool.utf8(parser.read_be::<u16>()?)?.to_string();
        let attributes = parse_attributes(parser, pool)?;
        Ok(RawMember {
            access,
            name,
            descriptor,
            attributes,
        })
    }

    fn attribute(&self, name: &str) -> Option<&'a [u8]> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.payload)
    }

    fn nonstandard<'s>(&'s self, standard: &'s [&str]) -> impl Iterator<Item = &'s Attribute<'a>> {
        self.attributes
            .iter()
            .filter(move |a| !standard.contains(&a.name.as_str()))
    }
}

fn parse_attributes<'a>(parser: &mut Parser<'a>, pool: &ConstantPool) -> Result<Vec<Attribute<'a>>> {
    let count = parser.read_be::<u16>()?;
    let mut attributes = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        let name = pool.utf8(parser.read_be::<u16>()?)?.to_string();
        let len = parser.read_be::<u32>()? as usize;
        let payload = parser.read_bytes(len)?;
        attributes.push(Attribute { name, payload });
    }
    Ok(attributes)
}

/// Parses one class file, calling `hook` for every non-standard member attribute.
pub(crate) fn parse_class(
    data: &[u8],
    mut hook: Option<&mut AttributeHook<'_>>,
) -> Result<ClassDef> {
    let mut parser = Parser::new(data);

    let magic = parser.read_be::<u32>()?;
    if magic != MAGIC {
        return Err(malformed_error!("Invalid class file magic 0x{:08X}", magic));
    }
    let minor = parser.read_be::<u16>()?;
    let major = parser.read_be::<u16>()?;

    let constant_pool = ConstantPool::parse(&mut parser)?;
    let pool = &constant_pool;

    let access = ClassAccess::from_bits_retain(parser.read_be::<u16>()?);
    let name: Arc<str> = Arc::from(pool.class_name(parser.read_be::<u16>()?)?);
    let super_index = parser.read_be::<u16>()?;
    let super_class = match super_index {
        0 => None,
        index => Some(pool.class_name(index)?.to_string()),
    };

    let interface_count = parser.read_be::<u16>()?;
    let mut interfaces = Vec::with_capacity(usize::from(interface_count));
    for _ in 0..interface_count {
        interfaces.push(pool.class_name(parser.read_be::<u16>()?)?.to_string());
    }

    let field_count = parser.read_be::<u16>()?;
    let mut raw_fields = Vec::with_capacity(usize::from(field_count));
    for _ in 0..field_count {
        raw_fields.push(RawMember::parse(&mut parser, pool)?);
    }

    let method_count = parser.read_be::<u16>()?;
    let mut raw_methods = Vec::with_capacity(usize::from(method_count));
    for _ in 0..method_count {
        raw_methods.push(RawMember::parse(&mut parser, pool)?);
    }

    let mut source_file = None;
    for attribute in parse_attributes(&mut parser, pool)? {
        if attribute.name == "SourceFile" {
            let mut payload = Parser::new(attribute.payload);
            source_file = Some(Arc::from(pool.utf8(payload.read_be::<u16>()?)?));
        }
    }

    if parser.has_more_data() {
        return Err(malformed_error!(
            "{} trailing bytes after class {}",
            parser.remaining(),
            name
        ));
    }

    let mut fields = Vec::with_capacity(raw_fields.len());
    for raw in &raw_fields {
        let constant_value = match raw.attribute("ConstantValue") {
            Some(payload) => Some(Parser::new(payload).read_be::<u16>()?),
            None => None,
        };
        let field = FieldDef {
            owner: name.clone(),
            name: raw.name.clone(),
            descriptor: raw.descriptor.clone(),
            access: FieldAccess::from_bits_retain(raw.access),
            constant_value,
        };

        if let Some(hook) = hook.as_deref_mut() {
            for attribute in raw.nonstandard(FIELD_ATTRIBUTES) {
                trace!("Attribute {} on field {}", attribute.name, field);
                hook(FieldOrMethod::Field(&field), &attribute.name, attribute.payload);
            }
        }
        fields.push(field);
    }

    let mut methods = Vec::with_capacity(raw_methods.len());
    for raw in &raw_methods {
        let body = match raw.attribute("Code") {
            Some(payload) => {
                let code = parse_code(payload, pool)?;
                Some(decode_body(&code, source_file.clone())?)
            }
            None => None,
        };
        let method = MethodDef {
            owner: name.clone(),
            name: raw.name.clone(),
            descriptor: raw.descriptor.clone(),
            access: MethodAccess::from_bits_retain(raw.access),
            body,
        };

        if let Some(hook) = hook.as_deref_mut() {
            for attribute in raw.nonstandard(METHOD_ATTRIBUTES) {
                trace!("Attribute {} on method {}", attribute.name, method);
                hook(FieldOrMethod::Method(&method), &attribute.name, attribute.payload);
            }
        }
        methods.push(method);
    }

    debug!(
        "Parsed class {} (version {}.{}, {} fields, {} methods)",
        name,
        major,
        minor,
        fields.len(),
        methods.len()
    );

    Ok(ClassDef {
        name,
        super_class,
        interfaces,
        access,
        version: ClassVersion { major, minor },
        source_file,
        constant_pool,
        fields,
        methods,
    })
}

fn ensure(cursor: &[u8], count: usize) -> Result<()> {
    Parser::new(cursor).ensure_remaining(count)
}

/// Splits a `Code` attribute into its parts. Nested attributes other than
/// `LineNumberTable` are dropped.
#[allow(clippy::cast_possible_truncation)]
fn parse_code<'a>(payload: &'a [u8], pool: &ConstantPool) -> Result<RawCode<'a>> {
    let mut cursor = payload;

    ensure(cursor, 8)?;
    let max_stack = read16(&mut cursor) as u16;
    let max_locals = read16(&mut cursor) as u16;
    let code_len = read32(&mut cursor) as usize;
    if code_len == 0 {
        return Err(malformed_error!("Code attribute with empty bytecode"));
    }
    ensure(cursor, code_len)?;
    let (code, rest) = cursor.split_at(code_len);
    cursor = rest;

    ensure(cursor, 2)?;
    let table_len = read16(&mut cursor) as usize;
    ensure(cursor, table_len * 8 + 2)?;
    let mut exception_table = Vec::with_capacity(table_len);
    for _ in 0..table_len {
        exception_table.push(ExceptionHandler {
            start_pc: read16(&mut cursor) as u16,
            end_pc: read16(&mut cursor) as u16,
            handler_pc: read16(&mut cursor) as u16,
            catch_type: read16(&mut cursor) as u16,
        });
    }

    let mut line_numbers = Vec::new();
    let attribute_count = read16(&mut cursor);
    for _ in 0..attribute_count {
        ensure(cursor, 6)?;
        let name_index = read16(&mut cursor) as u16;
        let len = read32(&mut cursor) as usize;
        ensure(cursor, len)?;
        let (mut attribute, rest) = cursor.split_at(len);
        cursor = rest;

        if pool.utf8(name_index)? != "LineNumberTable" {
            continue;
        }
        ensure(attribute, 2)?;
        let count = read16(&mut attribute) as usize;
        ensure(attribute, count * 4)?;
        for _ in 0..count {
            line_numbers.push(LineNumber {
                start_pc: read16(&mut attribute) as u16,
                line: read16(&mut attribute) as u16,
            });
        }
    }

    Ok(RawCode {
        max_stack,
        max_locals,
        code,
        exception_table,
        line_numbers,
    })
}
