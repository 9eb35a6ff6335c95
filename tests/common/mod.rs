//! Writers for class files and JAR archives used by the integration tests.
#![allow(dead_code)]

use std::{collections::HashMap, io::Write};

use flate2::{write::DeflateEncoder, Compression, Crc};

/// Routes library log output through the test harness.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A `Code` attribute.
#[derive(Default, Clone)]
pub struct Code {
    pub max_stack: u16,
    pub max_locals: u16,
    pub bytecode: Vec<u8>,
    /// `(start_pc, end_pc, handler_pc, catch_type)`
    pub exceptions: Vec<(u16, u16, u16, u16)>,
    /// `(start_pc, line)`
    pub lines: Vec<(u16, u16)>,
}

impl Code {
    pub fn new(bytecode: &[u8]) -> Self {
        Code {
            max_stack: 2,
            max_locals: 2,
            bytecode: bytecode.to_vec(),
            ..Code::default()
        }
    }
}

struct Member {
    access: u16,
    name: String,
    descriptor: String,
    code: Option<Code>,
    attributes: Vec<(String, Vec<u8>)>,
}

/// Builds a class file with version 52.0.
pub struct ClassFile {
    name: String,
    super_class: Option<String>,
    interfaces: Vec<String>,
    source_file: Option<String>,
    fields: Vec<Member>,
    methods: Vec<Member>,
    pool: Vec<u8>,
    pool_count: u16,
    utf8: HashMap<String, u16>,
}

impl ClassFile {
    pub fn new(name: &str) -> Self {
        ClassFile {
            name: name.to_string(),
            super_class: Some("java/lang/Object".to_string()),
            interfaces: Vec::new(),
            source_file: None,
            fields: Vec::new(),
            methods: Vec::new(),
            pool: Vec::new(),
            pool_count: 1,
            utf8: HashMap::new(),
        }
    }

    pub fn interface(mut self, name: &str) -> Self {
        self.interfaces.push(name.to_string());
        self
    }

    pub fn source_file(mut self, name: &str) -> Self {
        self.source_file = Some(name.to_string());
        self
    }

    pub fn field(mut self, access: u16, name: &str, descriptor: &str) -> Self {
        self.fields.push(Member {
            access,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            code: None,
            attributes: Vec::new(),
        });
        self
    }

    pub fn method(mut self, access: u16, name: &str, descriptor: &str, code: Option<Code>) -> Self {
        self.methods.push(Member {
            access,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            code,
            attributes: Vec::new(),
        });
        self
    }

    /// Adds an attribute to the most recently added field.
    pub fn field_attribute(mut self, name: &str, payload: &[u8]) -> Self {
        let field = self.fields.last_mut().expect("no field");
        field.attributes.push((name.to_string(), payload.to_vec()));
        self
    }

    /// Adds an attribute to the most recently added method.
    pub fn method_attribute(mut self, name: &str, payload: &[u8]) -> Self {
        let method = self.methods.last_mut().expect("no method");
        method.attributes.push((name.to_string(), payload.to_vec()));
        self
    }

    fn utf8(&mut self, value: &str) -> u16 {
        if let Some(index) = self.utf8.get(value) {
            return *index;
        }
        self.pool.push(1);
        self.pool
            .extend_from_slice(&(value.len() as u16).to_be_bytes());
        self.pool.extend_from_slice(value.as_bytes());
        let index = self.pool_count;
        self.pool_count += 1;
        self.utf8.insert(value.to_string(), index);
        index
    }

    fn class(&mut self, name: &str) -> u16 {
        let name = self.utf8(name);
        self.pool.push(7);
        self.pool.extend_from_slice(&name.to_be_bytes());
        let index = self.pool_count;
        self.pool_count += 1;
        index
    }

    fn attribute(&mut self, out: &mut Vec<u8>, name: &str, payload: &[u8]) {
        let name = self.utf8(name);
        out.extend_from_slice(&name.to_be_bytes());
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(payload);
    }

    fn code(&mut self, code: &Code) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&code.max_stack.to_be_bytes());
        out.extend_from_slice(&code.max_locals.to_be_bytes());
        out.extend_from_slice(&(code.bytecode.len() as u32).to_be_bytes());
        out.extend_from_slice(&code.bytecode);
        out.extend_from_slice(&(code.exceptions.len() as u16).to_be_bytes());
        for (start, end, handler, catch_type) in &code.exceptions {
            for value in [start, end, handler, catch_type] {
                out.extend_from_slice(&value.to_be_bytes());
            }
        }
        if code.lines.is_empty() {
            out.extend_from_slice(&0u16.to_be_bytes());
        } else {
            out.extend_from_slice(&1u16.to_be_bytes());
            let mut table = (code.lines.len() as u16).to_be_bytes().to_vec();
            for (pc, line) in &code.lines {
                table.extend_from_slice(&pc.to_be_bytes());
                table.extend_from_slice(&line.to_be_bytes());
            }
            self.attribute(&mut out, "LineNumberTable", &table);
        }
        out
    }

    fn members(&mut self, members: &[Member]) -> Vec<u8> {
        let mut out = (members.len() as u16).to_be_bytes().to_vec();
        for member in members {
            out.extend_from_slice(&member.access.to_be_bytes());
            let name = self.utf8(&member.name);
            let descriptor = self.utf8(&member.descriptor);
            out.extend_from_slice(&name.to_be_bytes());
            out.extend_from_slice(&descriptor.to_be_bytes());

            let count = member.attributes.len() + usize::from(member.code.is_some());
            out.extend_from_slice(&(count as u16).to_be_bytes());
            if let Some(code) = &member.code {
                let payload = self.code(code);
                self.attribute(&mut out, "Code", &payload);
            }
            for (name, payload) in &member.attributes {
                self.attribute(&mut out, name, payload);
            }
        }
        out
    }

    pub fn build(mut self) -> Vec<u8> {
        let this_class = self.class(&self.name.clone());
        let super_class = match self.super_class.clone() {
            Some(name) => self.class(&name),
            None => 0,
        };
        let mut interfaces = Vec::new();
        for name in self.interfaces.clone() {
            interfaces.push(self.class(&name));
        }

        let fields = std::mem::take(&mut self.fields);
        let methods = std::mem::take(&mut self.methods);
        let fields = self.members(&fields);
        let methods = self.members(&methods);

        let mut attributes = Vec::new();
        if let Some(source) = self.source_file.clone() {
            let index = self.utf8(&source);
            attributes.extend_from_slice(&1u16.to_be_bytes());
            self.attribute(&mut attributes, "SourceFile", &index.to_be_bytes());
        } else {
            attributes.extend_from_slice(&0u16.to_be_bytes());
        }

        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&52u16.to_be_bytes());
        out.extend_from_slice(&self.pool_count.to_be_bytes());
        out.extend_from_slice(&self.pool);
        out.extend_from_slice(&0x0021u16.to_be_bytes());
        out.extend_from_slice(&this_class.to_be_bytes());
        out.extend_from_slice(&super_class.to_be_bytes());
        out.extend_from_slice(&(interfaces.len() as u16).to_be_bytes());
        for index in interfaces {
            out.extend_from_slice(&index.to_be_bytes());
        }
        out.extend_from_slice(&fields);
        out.extend_from_slice(&methods);
        out.extend_from_slice(&attributes);
        out
    }
}

/// One archive entry: name, content and whether to deflate it.
pub type ZipFile<'a> = (&'a str, &'a [u8], bool);

fn crc(data: &[u8]) -> u32 {
    let mut crc = Crc::new();
    crc.update(data);
    crc.sum()
}

/// Builds a ZIP archive holding `files` in order.
pub fn zip(files: &[ZipFile<'_>]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut central = Vec::new();

    for (name, data, deflate) in files {
        let (method, stored) = if *deflate {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data).unwrap();
            (8u16, encoder.finish().unwrap())
        } else {
            (0u16, data.to_vec())
        };
        let offset = out.len() as u32;

        out.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
        out.extend_from_slice(&[20, 0, 0, 0]);
        out.extend_from_slice(&method.to_le_bytes());
        out.extend_from_slice(&[0; 4]);
        out.extend_from_slice(&crc(data).to_le_bytes());
        out.extend_from_slice(&(stored.len() as u32).to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&[0, 0]);
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(&stored);

        central.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
        central.extend_from_slice(&[20, 0, 20, 0, 0, 0]);
        central.extend_from_slice(&method.to_le_bytes());
        central.extend_from_slice(&[0; 4]);
        central.extend_from_slice(&crc(data).to_le_bytes());
        central.extend_from_slice(&(stored.len() as u32).to_le_bytes());
        central.extend_from_slice(&(data.len() as u32).to_le_bytes());
        central.extend_from_slice(&(name.len() as u16).to_le_bytes());
        central.extend_from_slice(&[0; 12]);
        central.extend_from_slice(&offset.to_le_bytes());
        central.extend_from_slice(name.as_bytes());
    }

    let cd_offset = out.len() as u32;
    out.extend_from_slice(&central);
    out.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
    out.extend_from_slice(&[0; 4]);
    out.extend_from_slice(&(files.len() as u16).to_le_bytes());
    out.extend_from_slice(&(files.len() as u16).to_le_bytes());
    out.extend_from_slice(&(central.len() as u32).to_le_bytes());
    out.extend_from_slice(&cd_offset.to_le_bytes());
    out.extend_from_slice(&[0, 0]);
    out
}
