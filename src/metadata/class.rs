use std::{fmt, sync::Arc};

use crate::{
    ir::MethodBody,
    metadata::{ClassAccess, ConstantPool, FieldAccess, MethodAccess},
};

/// Class file format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ClassVersion {
    /// Major version, 45 for JDK 1.1 through 69 for Java 25
    pub major: u16,
    /// Minor version, `0xFFFF` marks preview features
    pub minor: u16,
}

impl fmt::Display for ClassVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A loaded class or interface.
#[derive(Debug)]
pub struct ClassDef {
    /// Internal name, e.g. `java/lang/Object`
    pub name: Arc<str>,
    /// Internal name of the superclass, `None` only for `java/lang/Object` and modules
    pub super_class: Option<String>,
    /// Internal names of the direct superinterfaces
    pub interfaces: Vec<String>,
    /// Access flags
    pub access: ClassAccess,
    /// Class file version
    pub version: ClassVersion,
    /// Value of the `SourceFile` attribute
    pub source_file: Option<Arc<str>>,
    /// The constant pool the class was decoded with
    pub constant_pool: ConstantPool,
    /// Declared fields in class file order
    pub fields: Vec<FieldDef>,
    /// Declared methods in class file order
    pub methods: Vec<MethodDef>,
}

impl ClassDef {
    /// Creates an empty class named `name`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        ClassDef {
            name: Arc::from(name),
            super_class: None,
            interfaces: Vec::new(),
            access: ClassAccess::empty(),
            version: ClassVersion::default(),
            source_file: None,
            constant_pool: ConstantPool::default(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Looks up a method by name and descriptor.
    #[must_use]
    pub fn method(&self, name: &str, descriptor: &str) -> Option<&MethodDef> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.descriptor == descriptor)
    }

    /// Looks up a method by name and descriptor for modification.
    pub fn method_mut(&mut self, name: &str, descriptor: &str) -> Option<&mut MethodDef> {
        self.methods
            .iter_mut()
            .find(|m| m.name == name && m.descriptor == descriptor)
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns `true` if the class is an interface.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.access.contains(ClassAccess::INTERFACE)
    }
}

/// A field declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// Internal name of the declaring class
    pub owner: Arc<str>,
    /// Simple name
    pub name: String,
    /// Field descriptor, e.g. `I` or `Ljava/lang/String;`
    pub descriptor: String,
    /// Access flags
    pub access: FieldAccess,
    /// Constant pool index from the `ConstantValue` attribute
    pub constant_value: Option<u16>,
}

impl fmt::Display for FieldDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}:{}", self.owner, self.name, self.descriptor)
    }
}

/// A method declaration with its optional body.
#[derive(Debug)]
pub struct MethodDef {
    /// Internal name of the declaring class
    pub owner: Arc<str>,
    /// Simple name, `<init>` and `<clinit>` for initializers
    pub name: String,
    /// Method descriptor, e.g. `(I)V`
    pub descriptor: String,
    /// Access flags
    pub access: MethodAccess,
    /// Decoded code, `None` for abstract and native methods
    pub body: Option<MethodBody>,
}

impl MethodDef {
    /// Returns `true` if the method carries code.
    #[must_use]
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }
}

impl fmt::Display for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.owner, self.name, self.descriptor)
    }
}
