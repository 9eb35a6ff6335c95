//! Access flags of classes, fields and methods.
//!
//! Unknown bits are retained so a declaration round-trips whatever the class file
//! carried.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Access and property flags of a class or interface
    pub struct ClassAccess: u16 {
        /// Declared public
        const PUBLIC = 0x0001;
        /// Declared final, no subclasses allowed
        const FINAL = 0x0010;
        /// Treat superclass methods specially when invoked by `invokespecial`
        const SUPER = 0x0020;
        /// Is an interface, not a class
        const INTERFACE = 0x0200;
        /// Declared abstract
        const ABSTRACT = 0x0400;
        /// Not present in source code
        const SYNTHETIC = 0x1000;
        /// Declared as an annotation interface
        const ANNOTATION = 0x2000;
        /// Declared as an enum class
        const ENUM = 0x4000;
        /// Is a module, not a class or interface
        const MODULE = 0x8000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Access and property flags of a field
    pub struct FieldAccess: u16 {
        /// Declared public
        const PUBLIC = 0x0001;
        /// Declared private
        const PRIVATE = 0x0002;
        /// Declared protected
        const PROTECTED = 0x0004;
        /// Declared static
        const STATIC = 0x0008;
        /// Never directly assigned after construction
        const FINAL = 0x0010;
        /// Declared volatile, cannot be cached
        const VOLATILE = 0x0040;
        /// Not written or read by a persistent object manager
        const TRANSIENT = 0x0080;
        /// Not present in source code
        const SYNTHETIC = 0x1000;
        /// Element of an enum class
        const ENUM = 0x4000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Access and property flags of a method
    pub struct MethodAccess: u16 {
        /// Declared public
        const PUBLIC = 0x0001;
        /// Declared private
        const PRIVATE = 0x0002;
        /// Declared protected
        const PROTECTED = 0x0004;
        /// Declared static
        const STATIC = 0x0008;
        /// Declared final, must not be overridden
        const FINAL = 0x0010;
        /// Invocation is wrapped by a monitor use
        const SYNCHRONIZED = 0x0020;
        /// Bridge method generated by the compiler
        const BRIDGE = 0x0040;
        /// Declared with a variable number of arguments
        const VARARGS = 0x0080;
        /// Implemented in a language other than Java
        const NATIVE = 0x0100;
        /// Declared abstract, no implementation provided
        const ABSTRACT = 0x0400;
        /// Floating-point mode is FP-strict
        const STRICT = 0x0800;
        /// Not present in source code
        const SYNTHETIC = 0x1000;
    }
}

impl MethodAccess {
    /// Returns `true` if a method with these flags cannot carry a `Code` attribute.
    #[must_use]
    pub fn is_bodiless(self) -> bool {
        self.intersects(MethodAccess::ABSTRACT | MethodAccess::NATIVE)
    }
}
