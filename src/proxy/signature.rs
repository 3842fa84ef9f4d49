use std::{fmt, sync::Arc};

use itertools::Itertools;

use super::{ErrorKind, type_descriptor::TypeDescriptor};
use crate::{
    jvm::{Annotation, Class, Method, method},
    types::{
        Descriptor, method_descriptor::MethodDescriptor, signature::GenericMethodSignature,
    },
};

/// An argument of a method and the local variable slot it occupies.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    /// The type of the argument.
    pub type_descriptor: TypeDescriptor,
    /// The local variable slot of the argument.
    pub offset: u16,
}

/// A method of a target class, as seen by pointcuts and by the weaver.
#[derive(Debug, Clone)]
pub struct MethodSignature {
    declaring_class: Arc<Class>,
    method_index: usize,
    class_name: String,
    class_annotations: Arc<[Annotation]>,
    arguments: Vec<Argument>,
    return_type: TypeDescriptor,
    declaration: String,
    is_top_level: bool,
}

impl MethodSignature {
    /// Decodes the `method_index`-th method of `declaring_class`, found while scanning the
    /// hierarchy of `class_name`.
    ///
    /// # Errors
    /// [`ErrorKind::MalformedSignature`] if the generic signature of the method cannot be
    /// parsed.
    pub fn decode(
        declaring_class: &Arc<Class>,
        method_index: usize,
        class_name: &str,
        class_annotations: Arc<[Annotation]>,
    ) -> Result<Self, ErrorKind> {
        let method = declaring_class.methods.get(method_index).ok_or_else(|| {
            ErrorKind::MalformedSignature(format!(
                "{} has no method #{method_index}",
                declaring_class.binary_name
            ))
        })?;
        let generic = method
            .signature
            .as_deref()
            .map(str::parse::<GenericMethodSignature>)
            .transpose()
            .map_err(|e| ErrorKind::MalformedSignature(e.to_string()))?;
        let descriptor = &method.descriptor;
        // Synthetic parameters such as the outer instance of inner class constructors are
        // absent from generic signatures.
        let generic_parameters = generic
            .as_ref()
            .filter(|it| it.parameters.len() == descriptor.parameters_types.len())
            .map(|it| it.parameters.as_slice());

        let is_static = method.access_flags.contains(method::AccessFlags::STATIC);
        let mut offset = u16::from(!is_static);
        let mut arguments = Vec::with_capacity(descriptor.parameters_types.len());
        for (i, param) in descriptor.parameters_types.iter().enumerate() {
            let type_name = generic_parameters
                .and_then(|it| it.get(i))
                .cloned()
                .unwrap_or_else(|| param.to_string());
            let annotations = method
                .runtime_visible_parameter_annotations
                .get(i)
                .into_iter()
                .chain(method.runtime_invisible_parameter_annotations.get(i))
                .flatten()
                .cloned()
                .collect();
            arguments.push(Argument {
                type_descriptor: TypeDescriptor::new(param.clone(), type_name, annotations),
                offset,
            });
            offset += param.words();
        }

        let return_name = generic
            .as_ref()
            .map_or_else(|| descriptor.return_type.to_string(), |it| it.return_type.clone());
        let return_type = TypeDescriptor::of_return_type(&descriptor.return_type, return_name);

        let exceptions = match &generic {
            Some(it) if !it.exceptions.is_empty() => it.exceptions.clone(),
            _ => method.exceptions.iter().map(|it| it.java_name()).collect(),
        };
        let mut declaration = format!(
            "{} {}({})",
            return_type.type_name(),
            method.name,
            arguments
                .iter()
                .map(|it| it.type_descriptor.type_name())
                .join(", ")
        );
        if !exceptions.is_empty() {
            declaration.push_str(" throws ");
            declaration.push_str(&exceptions.join(", "));
        }

        Ok(Self {
            declaring_class: Arc::clone(declaring_class),
            method_index,
            class_name: class_name.to_owned(),
            class_annotations,
            arguments,
            return_type,
            declaration,
            is_top_level: declaring_class.binary_name == class_name,
        })
    }

    /// Returns the method as declared in its class.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.declaring_class.methods[self.method_index]
    }

    /// Returns the name of the method.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.method().name
    }

    /// Returns the access flags of the method.
    #[must_use]
    pub fn access_flags(&self) -> method::AccessFlags {
        self.method().access_flags
    }

    /// Returns the descriptor of the method.
    #[must_use]
    pub fn descriptor(&self) -> &MethodDescriptor {
        &self.method().descriptor
    }

    /// Returns the descriptor as it appears in class files, e.g., `(I)Ljava/lang/String;`.
    #[must_use]
    pub fn raw_descriptor(&self) -> String {
        self.descriptor().descriptor()
    }

    /// Returns the generic signature of the method, if it has one.
    #[must_use]
    pub fn generic_signature(&self) -> Option<&str> {
        self.method().signature.as_deref()
    }

    /// Returns the binary name of the class declaring the method.
    #[must_use]
    pub fn declaring_class_name(&self) -> &str {
        &self.declaring_class.binary_name
    }

    /// Returns the binary name of the target class whose hierarchy contains the method.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Returns the arguments, not counting `this`.
    #[must_use]
    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    /// Returns the argument at the 1-based `index`.
    #[must_use]
    pub fn argument(&self, index: usize) -> Option<&Argument> {
        index.checked_sub(1).and_then(|i| self.arguments.get(i))
    }

    /// Returns the number of arguments.
    #[must_use]
    pub fn arguments_count(&self) -> usize {
        self.arguments.len()
    }

    /// Returns the number of local variable slots taken by the arguments, not counting `this`.
    #[must_use]
    pub fn arguments_words(&self) -> u16 {
        self.descriptor().parameters_words()
    }

    /// Returns the return type.
    #[must_use]
    pub const fn return_type(&self) -> &TypeDescriptor {
        &self.return_type
    }

    /// Returns the annotations of the method.
    pub fn annotations(&self) -> impl Iterator<Item = &Annotation> {
        self.method().annotations()
    }

    /// Returns the annotations of the target class.
    #[must_use]
    pub fn class_annotations(&self) -> &[Annotation] {
        &self.class_annotations
    }

    /// Returns `true` if the method is `static`.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.access_flags().contains(method::AccessFlags::STATIC)
    }

    /// Returns `true` if the method is `final`.
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.access_flags().contains(method::AccessFlags::FINAL)
    }

    /// Returns `true` if the method is `abstract`.
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.access_flags().contains(method::AccessFlags::ABSTRACT)
    }

    /// Returns `true` if the method is declared in an interface.
    #[must_use]
    pub fn is_interface_context(&self) -> bool {
        self.declaring_class.is_interface()
    }

    /// Returns `true` if the method is declared in the target class itself rather than
    /// inherited.
    #[must_use]
    pub const fn is_top_level_method(&self) -> bool {
        self.is_top_level
    }

    /// Returns the method as it would be declared in Java, e.g.,
    /// `java.util.List<java.lang.String> find(int) throws java.io.IOException`.
    #[must_use]
    pub fn declaration(&self) -> &str {
        &self.declaration
    }

    /// Returns `name#descriptor`, which identifies the method among the methods it overrides.
    #[must_use]
    pub fn clean_signature(&self) -> String {
        format!("{}#{}", self.name(), self.raw_descriptor())
    }

    /// Returns the key of the method in a [`ClassModel`](super::class_model::ClassModel).
    #[must_use]
    pub fn key(&self) -> String {
        signature_key(
            self.access_flags(),
            self.name(),
            &self.raw_descriptor(),
            self.declaring_class_name(),
        )
    }

    /// Returns `true` if the method is `public`.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.access_flags().contains(method::AccessFlags::PUBLIC)
    }

    /// Returns `true` if the method is declared in `java.lang.Object`.
    #[must_use]
    pub fn is_root_method(&self) -> bool {
        self.declaring_class_name() == "java/lang/Object"
    }

    /// Returns `true` for constructors and static initializers.
    #[must_use]
    pub fn is_special_method(&self) -> bool {
        let method = self.method();
        method.is_constructor() || method.is_static_initializer_block()
    }

    /// Returns `true` if the method takes no arguments.
    #[must_use]
    pub fn has_no_arguments(&self) -> bool {
        self.arguments.is_empty()
    }

    /// Returns `true` if the method takes exactly one argument.
    #[must_use]
    pub fn has_one_argument(&self) -> bool {
        self.arguments.len() == 1
    }

    /// Returns `true` if the method returns a value.
    #[must_use]
    pub fn has_return_value(&self) -> bool {
        !self.return_type.is_void()
    }

    /// Returns `true` if the method returns `void`.
    #[must_use]
    pub fn has_no_return_value(&self) -> bool {
        self.return_type.is_void()
    }

    /// Returns the annotation of the method with the given type, named by its binary or
    /// Java name.
    #[must_use]
    pub fn get_annotation(&self, type_name: &str) -> Option<&Annotation> {
        self.annotations().find(|it| it.is_of_type(type_name))
    }

    /// Returns `true` if the method has an annotation of the given type.
    #[must_use]
    pub fn has_annotation(&self, type_name: &str) -> bool {
        self.get_annotation(type_name).is_some()
    }

    /// Returns the annotation of the target class with the given type.
    #[must_use]
    pub fn get_class_annotation(&self, type_name: &str) -> Option<&Annotation> {
        self.class_annotations
            .iter()
            .find(|it| it.is_of_type(type_name))
    }

    /// Returns `true` if the target class has an annotation of the given type.
    #[must_use]
    pub fn has_class_annotation(&self, type_name: &str) -> bool {
        self.get_class_annotation(type_name).is_some()
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.declaring_class_name(), self.declaration)
    }
}

/// Builds the key identifying a method in a class hierarchy.
pub(crate) fn signature_key(
    access_flags: method::AccessFlags,
    name: &str,
    descriptor: &str,
    class_name: &str,
) -> String {
    format!(
        "{}:{descriptor}_{class_name}#{name}",
        access_flags.bits()
    )
}
