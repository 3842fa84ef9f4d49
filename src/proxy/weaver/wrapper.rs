#[allow(clippy::enum_glob_use)]
use crate::jvm::code::opcodes::*;
use crate::{
    jvm::{
        Field, Method, class,
        code::CodeBuilder,
        field, method,
        references::{ClassRef, MethodRef},
    },
    types::method_descriptor::MethodDescriptor,
};

use super::{
    super::{
        Error, ErrorKind,
        asm_util::{self, OBJECT},
        aspect::AspectBinding,
        context::WeavingContext,
        errors::{ErrorContext, WeavingErrorContext},
    },
    copy_advice_members, matching_aspects, overriding_method, subclass::ClassHeader,
    weave_method,
};

/// Options of a wrapper.
#[derive(Debug, Clone, Default)]
pub(in crate::proxy) struct WrapperOptions {
    /// The interface implemented by a wrapper of a class.
    pub interface: Option<String>,
    pub create_target: bool,
}

/// Weaves a class that holds the target in a field and forwards calls to it.
pub(in crate::proxy) fn weave(
    context: &mut WeavingContext<'_>,
    bindings: &[AspectBinding<'_>],
    options: &WrapperOptions,
) -> Result<ClassHeader, Error> {
    let model = context.model;
    let Some(wrapper) = context.wrapper.clone() else {
        return Err(ErrorKind::InvalidTarget("missing wrapper field".to_owned()))
            .for_target(model.name());
    };
    if options.create_target && wrapper.target_is_interface {
        return Err(ErrorKind::InvalidTarget(
            "an interface cannot be created by the wrapper constructor".to_owned(),
        ))
        .for_target(model.name());
    }

    let field_access = if options.create_target {
        field::AccessFlags::PRIVATE | field::AccessFlags::FINAL
    } else {
        field::AccessFlags::PUBLIC
    };
    let proxy = context.proxy_ref();
    context.fields.push(Field {
        access_flags: field_access,
        name: wrapper.name.clone(),
        owner: proxy.clone(),
        field_type: wrapper.field_type(),
        constant_value: None,
        signature: None,
        runtime_visible_annotations: Vec::new(),
        runtime_invisible_annotations: Vec::new(),
    });

    copy_advice_members(context, bindings)?;

    for signature in model.methods() {
        if signature.is_static() {
            continue;
        }
        let matched = matching_aspects(signature, bindings);
        if !matched.is_empty() {
            weave_method(context, signature, &matched)?;
        } else if !signature.is_root_method() {
            let mut code = CodeBuilder::new();
            wrapper.load(proxy.clone(), &mut code);
            asm_util::load_arguments(&mut code, signature);
            wrapper.invoke(&mut code, signature.name(), signature.descriptor().clone());
            asm_util::return_value(&mut code, signature.return_type(), false);
            let forward = overriding_method(context, signature, code)
                .for_target(model.name())
                .in_method(signature)?;
            context.methods.push(forward);
        }
    }

    let mut code = CodeBuilder::new();
    code.var(ALOAD, 0).invoke(
        INVOKESPECIAL,
        MethodRef::new(OBJECT, Method::CONSTRUCTOR_NAME, MethodDescriptor::void()),
    );
    if options.create_target {
        let target = wrapper.target.binary_name.clone();
        code.var(ALOAD, 0)
            .type_insn(NEW, target.clone())
            .simple(DUP)
            .invoke(
                INVOKESPECIAL,
                MethodRef::new(target, Method::CONSTRUCTOR_NAME, MethodDescriptor::void()),
            )
            .field(PUTFIELD, wrapper.field_ref(proxy));
    }
    context.call_init(&mut code);
    code.simple(RETURN);
    let body = code.build(1).map_err(ErrorKind::from).for_target(model.name())?;
    let constructor = context.new_method(
        method::AccessFlags::PUBLIC,
        Method::CONSTRUCTOR_NAME,
        MethodDescriptor::void(),
        Some(body),
    );
    context.methods.push(constructor);
    context.add_initializers().for_target(model.name())?;

    let interfaces = if wrapper.target_is_interface {
        vec![wrapper.target.clone()]
    } else {
        options.interface.iter().map(ClassRef::new).collect()
    };
    Ok(ClassHeader {
        access_flags: class::AccessFlags::PUBLIC | class::AccessFlags::SUPER,
        super_class: ClassRef::new(OBJECT),
        interfaces,
    })
}
