//! Structural metadata of analyzed classes and methods.
//!
//! These types describe what the bytecode reader knows about a class and its methods besides
//! the instruction stream. Filters use them to recognize compiler generated code, the session
//! uses the method metadata to key prior-run snapshots.

use bitflags::bitflags;

use crate::analysis::MethodEvent;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Access flags of a class member
    pub struct AccessFlags: u32 {
        /// Accessible from everywhere
        const PUBLIC = 0x0001;
        /// Accessible only within the declaring class
        const PRIVATE = 0x0002;
        /// Accessible within subclasses
        const PROTECTED = 0x0004;
        /// Not bound to an instance
        const STATIC = 0x0008;
        /// Cannot be overridden
        const FINAL = 0x0010;
        /// Invocation is wrapped by a monitor
        const SYNCHRONIZED = 0x0020;
        /// Bridge method generated by the compiler
        const BRIDGE = 0x0040;
        /// Declared with variable number of arguments
        const VARARGS = 0x0080;
        /// Implemented in native code
        const NATIVE = 0x0100;
        /// No implementation
        const ABSTRACT = 0x0400;
        /// Strict floating point
        const STRICT = 0x0800;
        /// Not present in the source code
        const SYNTHETIC = 0x1000;
    }
}

/// Declaration of a method as reported by the begin-method event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MethodDescriptor {
    /// Access flags
    pub access: AccessFlags,
    /// Method name
    pub name: String,
    /// Method descriptor, e.g. `(I)V`
    pub desc: String,
    /// Generic signature, if any
    pub signature: Option<String>,
    /// Internal names of declared exceptions
    pub exceptions: Vec<String>,
    /// Descriptors of annotations on the method
    pub annotations: Vec<String>,
}

impl MethodDescriptor {
    /// Creates a descriptor without generic signature, exceptions or annotations.
    #[must_use]
    pub fn new(access: AccessFlags, name: impl Into<String>, desc: impl Into<String>) -> Self {
        Self {
            access,
            name: name.into(),
            desc: desc.into(),
            ..Self::default()
        }
    }

    /// Key identifying this method across analysis runs.
    ///
    /// Concatenates access flags, name, descriptor, generic signature and declared exceptions.
    /// Only equality of keys is meaningful.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use covscope::analysis::{AccessFlags, MethodDescriptor};
    ///
    /// let m = MethodDescriptor::new(AccessFlags::PUBLIC, "run", "()V");
    /// assert_eq!(m.merge_key(), "1run()Vnull");
    /// ```
    #[must_use]
    pub fn merge_key(&self) -> String {
        let mut key = format!(
            "{}{}{}{}",
            self.access.bits(),
            self.name,
            self.desc,
            self.signature.as_deref().unwrap_or("null")
        );
        for exception in &self.exceptions {
            key.push_str(exception);
        }
        key
    }

    /// Returns `true` if the method cannot have a body.
    #[must_use]
    pub fn is_bodiless(&self) -> bool {
        self.access
            .intersects(AccessFlags::ABSTRACT | AccessFlags::NATIVE)
    }
}

/// A method declaration together with its instruction stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodBody {
    /// Method declaration
    pub descriptor: MethodDescriptor,
    /// Events in original order, terminated by [`MethodEvent::EndMethod`]
    pub events: Vec<MethodEvent>,
}

impl MethodBody {
    /// Creates a method body from its declaration and events.
    #[must_use]
    pub fn new(descriptor: MethodDescriptor, events: Vec<MethodEvent>) -> Self {
        Self { descriptor, events }
    }
}

/// Class level metadata as reported by the bytecode reader.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassDescriptor {
    /// VM name of the class, e.g. `com/example/Foo`
    pub name: String,
    /// Generic signature, if any
    pub signature: Option<String>,
    /// VM name of the superclass
    pub super_name: Option<String>,
    /// VM names of implemented interfaces
    pub interfaces: Vec<String>,
    /// Descriptors of annotations on the class
    pub annotations: Vec<String>,
    /// Types of non-standard attributes
    pub attributes: Vec<String>,
    /// Name of the source file
    pub source_file: Option<String>,
    /// Embedded source debug information (SMAP)
    pub source_debug_extension: Option<String>,
}

impl ClassDescriptor {
    /// Creates a descriptor holding only the class name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}
