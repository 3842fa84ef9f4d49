use std::collections::HashSet;

use crate::{
    jvm::{
        Class, Field, Method, class,
        code::{
            CodeBuilder, MethodBody,
            opcodes::{
                ALOAD, GETFIELD, INVOKEINTERFACE, INVOKESPECIAL, INVOKESTATIC, INVOKEVIRTUAL,
                RETURN,
            },
        },
        method,
        references::{ClassRef, FieldRef, MethodRef},
    },
    types::{field_type::FieldType, method_descriptor::MethodDescriptor},
};

use super::{ErrorKind, class_model::ClassModel, config::ProxyNames};

/// The field of a wrapper holding the target.
#[derive(Debug, Clone)]
pub(crate) struct WrapperField {
    pub name: String,
    pub target: ClassRef,
    pub target_is_interface: bool,
}

impl WrapperField {
    pub(crate) fn field_type(&self) -> FieldType {
        FieldType::Object(self.target.clone())
    }

    pub(crate) fn field_ref(&self, proxy: ClassRef) -> FieldRef {
        FieldRef {
            owner: proxy,
            name: self.name.clone(),
            field_type: self.field_type(),
        }
    }

    /// Pushes the target held by the wrapper.
    pub(crate) fn load(&self, proxy: ClassRef, code: &mut CodeBuilder) {
        code.var(ALOAD, 0).field(GETFIELD, self.field_ref(proxy));
    }

    /// Invokes a method on the target, whose arguments are on the stack.
    pub(crate) fn invoke(&self, code: &mut CodeBuilder, name: &str, descriptor: MethodDescriptor) {
        let opcode = if self.target_is_interface {
            INVOKEINTERFACE
        } else {
            INVOKEVIRTUAL
        };
        let method = MethodRef {
            is_interface: self.target_is_interface,
            ..MethodRef::new(self.target.binary_name.clone(), name, descriptor)
        };
        code.invoke(opcode, method);
    }
}

/// The state of one proxy request, accumulating the members of the proxy class.
#[derive(Debug)]
pub(crate) struct WeavingContext<'a> {
    pub model: &'a ClassModel,
    pub names: &'a ProxyNames,
    pub proxy_name: String,
    /// The class whose methods are invoked at the end of the chains, i.e., the target.
    pub super_reference: String,
    pub wrapper: Option<WrapperField>,
    pub static_init_methods: Vec<String>,
    pub init_methods: Vec<String>,
    pub any_method_woven: bool,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
}

impl<'a> WeavingContext<'a> {
    pub(crate) fn new(
        model: &'a ClassModel,
        names: &'a ProxyNames,
        proxy_name: String,
        wrapper: Option<WrapperField>,
    ) -> Self {
        Self {
            model,
            names,
            proxy_name,
            super_reference: model.name().to_owned(),
            wrapper,
            static_init_methods: Vec::new(),
            init_methods: Vec::new(),
            any_method_woven: false,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub(crate) fn proxy_ref(&self) -> ClassRef {
        ClassRef::new(&self.proxy_name)
    }

    /// A reference to a method declared in the proxy.
    pub(crate) fn own_method(&self, name: impl Into<String>, descriptor: MethodDescriptor) -> MethodRef {
        MethodRef::new(&self.proxy_name, name, descriptor)
    }

    /// Creates a method of the proxy without annotations or generic signature.
    pub(crate) fn new_method(
        &self,
        access_flags: method::AccessFlags,
        name: impl Into<String>,
        descriptor: MethodDescriptor,
        body: Option<MethodBody>,
    ) -> Method {
        Method {
            access_flags,
            name: name.into(),
            descriptor,
            owner: self.proxy_ref(),
            body,
            exceptions: Vec::new(),
            signature: None,
            runtime_visible_annotations: Vec::new(),
            runtime_invisible_annotations: Vec::new(),
            runtime_visible_parameter_annotations: Vec::new(),
            runtime_invisible_parameter_annotations: Vec::new(),
            annotation_default: None,
        }
    }

    /// Adds the method called by every constructor to run the copied advice constructors, and
    /// the static initializer running the copied advice static initializers if there are any.
    pub(crate) fn add_initializers(&mut self) -> Result<(), ErrorKind> {
        let mut code = CodeBuilder::new();
        for name in &self.init_methods {
            code.var(ALOAD, 0)
                .invoke(INVOKESPECIAL, self.own_method(name, MethodDescriptor::void()));
        }
        code.simple(RETURN);
        let init = self.new_method(
            method::AccessFlags::PRIVATE | method::AccessFlags::FINAL,
            self.names.init_method.clone(),
            MethodDescriptor::void(),
            Some(code.build(1)?),
        );
        self.methods.push(init);

        if !self.static_init_methods.is_empty() {
            let mut code = CodeBuilder::new();
            for name in &self.static_init_methods {
                code.invoke(INVOKESTATIC, self.own_method(name, MethodDescriptor::void()));
            }
            code.simple(RETURN);
            let clinit = self.new_method(
                method::AccessFlags::STATIC,
                Method::CLASS_INITIALIZER_NAME,
                MethodDescriptor::void(),
                Some(code.build(0)?),
            );
            self.methods.push(clinit);
        }
        Ok(())
    }

    /// Calls the method adding the advice constructors, from a constructor.
    pub(crate) fn call_init(&self, code: &mut CodeBuilder) {
        code.var(ALOAD, 0).invoke(
            INVOKESPECIAL,
            self.own_method(self.names.init_method.clone(), MethodDescriptor::void()),
        );
    }

    /// Fails if two fields share a name or two methods share a name and a descriptor.
    pub(crate) fn check_members(&self) -> Result<(), ErrorKind> {
        let mut fields = HashSet::new();
        if let Some(field) = self.fields.iter().find(|it| !fields.insert(&it.name)) {
            return Err(ErrorKind::InvalidAdvice(format!(
                "field `{}` is declared twice in the proxy",
                field.name
            )));
        }
        let mut methods = HashSet::new();
        if let Some(method) = self
            .methods
            .iter()
            .find(|it| !methods.insert((&it.name, &it.descriptor)))
        {
            return Err(ErrorKind::InvalidAdvice(format!(
                "method `{}{}` is declared twice in the proxy",
                method.name, method.descriptor
            )));
        }
        Ok(())
    }

    pub(crate) fn into_class(
        self,
        access_flags: class::AccessFlags,
        super_class: ClassRef,
        interfaces: Vec<ClassRef>,
    ) -> Class {
        let target = self.model.target();
        Class {
            version: class::Version::JDK5,
            access_flags,
            binary_name: self.proxy_name,
            super_class: Some(super_class),
            interfaces,
            fields: self.fields,
            methods: self.methods,
            source_file: None,
            inner_classes: Vec::new(),
            signature: None,
            runtime_visible_annotations: target.runtime_visible_annotations.clone(),
            runtime_invisible_annotations: target.runtime_invisible_annotations.clone(),
        }
    }
}
