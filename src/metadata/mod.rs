//! Declarations of loaded classes and the program scope.
//!
//! A [`Scope`] is the ordered list of [`ClassDef`]s handed to the pass pipeline. Each
//! class owns its [`ConstantPool`], its [`FieldDef`]s and its [`MethodDef`]s, and every
//! method with code owns its [`crate::ir::MethodBody`] exclusively.
//!
//! # Examples
//!
//! ```rust
//! use jarscope::metadata::{ClassDef, MethodAccess, MethodDef, Scope};
//!
//! let mut class = ClassDef::new("demo/Main");
//! class.methods.push(MethodDef {
//!     owner: class.name.clone(),
//!     name: "run".to_string(),
//!     descriptor: "()V".to_string(),
//!     access: MethodAccess::PUBLIC | MethodAccess::ABSTRACT,
//!     body: None,
//! });
//!
//! let mut scope = Scope::new();
//! scope.push(class);
//! assert_eq!(scope.methods().count(), 1);
//! assert_eq!(scope.count_bodies(), 0);
//! ```

mod class;
mod constpool;
mod flags;
mod scope;

pub use class::{ClassDef, ClassVersion, FieldDef, MethodDef};
pub use constpool::{decode_modified_utf8, Constant, ConstantPool};
pub use flags::{ClassAccess, FieldAccess, MethodAccess};
pub use scope::Scope;
