use crate::jvm::{
    Method, class,
    code::{
        CodeBuilder,
        opcodes::{INVOKESPECIAL, RETURN},
    },
    references::{ClassRef, MethodRef},
};

use super::{
    super::{
        Error, ErrorKind, asm_util,
        aspect::AspectBinding,
        context::WeavingContext,
        errors::{ErrorContext, WeavingErrorContext},
    },
    copy_advice_members, matching_aspects, overriding_method, weave_method,
};

/// The header of the produced class.
#[derive(Debug)]
pub(in crate::proxy) struct ClassHeader {
    pub access_flags: class::AccessFlags,
    pub super_class: ClassRef,
    pub interfaces: Vec<ClassRef>,
}

/// Weaves a subclass of the target, overriding every matched method.
pub(in crate::proxy) fn weave(
    context: &mut WeavingContext<'_>,
    bindings: &[AspectBinding<'_>],
) -> Result<ClassHeader, Error> {
    let model = context.model;
    let target = model.target();
    if target.is_interface() {
        return Err(ErrorKind::InvalidTarget(
            "interfaces can only be proxied by wrappers".to_owned(),
        ))
        .for_target(model.name());
    }
    if target.is_final() {
        return Err(ErrorKind::InvalidTarget("final classes cannot be subclassed".to_owned()))
            .for_target(model.name());
    }

    copy_advice_members(context, bindings)?;

    for signature in model.methods() {
        let matched = matching_aspects(signature, bindings);
        if matched.is_empty() {
            continue;
        }
        if signature.is_final() {
            return Err(ErrorKind::FinalMethodConflict)
                .for_target(model.name())
                .in_method(signature);
        }
        if signature.is_abstract() {
            return Err(ErrorKind::AbstractMethod)
                .for_target(model.name())
                .in_method(signature);
        }
        weave_method(context, signature, &matched)?;
    }

    for constructor in model.constructors() {
        let mut code = CodeBuilder::new();
        asm_util::load_this_and_arguments(&mut code, constructor);
        code.invoke(
            INVOKESPECIAL,
            MethodRef::new(
                model.name(),
                Method::CONSTRUCTOR_NAME,
                constructor.descriptor().clone(),
            ),
        );
        context.call_init(&mut code);
        code.simple(RETURN);
        let method = overriding_method(context, constructor, code)
            .for_target(model.name())
            .in_method(constructor)?;
        context.methods.push(method);
    }
    context.add_initializers().for_target(model.name())?;

    Ok(ClassHeader {
        access_flags: (target.access_flags - class::AccessFlags::ABSTRACT)
            | class::AccessFlags::SUPER,
        super_class: ClassRef::new(model.name()),
        interfaces: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        jvm::{Class, code::opcodes::*, method},
        proxy::{
            advice::AdviceData, aspect::Aspect, class_model::ClassModel, config::ProxyNames,
            pointcut,
        },
        tests::{method_stub, test_loader},
    };

    fn service(run_flags: method::AccessFlags) -> Class {
        let mut access_flags = class::AccessFlags::PUBLIC | class::AccessFlags::SUPER;
        if run_flags.contains(method::AccessFlags::ABSTRACT) {
            access_flags |= class::AccessFlags::ABSTRACT;
        }
        Class {
            binary_name: "org/pkg/Service".to_owned(),
            access_flags,
            methods: vec![
                method_stub("org/pkg/Service", "<init>", "(I)V", method::AccessFlags::PUBLIC),
                method_stub("org/pkg/Service", "run", "(J)I", run_flags),
            ],
            ..Class::default()
        }
    }

    fn pass_through() -> Class {
        let mut execute = method_stub(
            "org/pkg/PassThrough",
            "execute",
            "()Ljava/lang/Object;",
            method::AccessFlags::PUBLIC,
        );
        let mut code = CodeBuilder::new();
        code.invoke(
            INVOKESTATIC,
            MethodRef::new(
                "org/proxetta/ProxyTarget",
                "invoke",
                "()Ljava/lang/Object;".parse().unwrap(),
            ),
        )
        .simple(ARETURN);
        execute.body = Some(code.build(1).unwrap());
        Class {
            binary_name: "org/pkg/PassThrough".to_owned(),
            methods: vec![execute],
            ..Class::default()
        }
    }

    fn weave_service(run_flags: method::AccessFlags) -> Result<(Vec<Method>, ClassHeader), Error> {
        let loader = test_loader([service(run_flags)]);
        let model = ClassModel::build("org/pkg/Service", &loader).unwrap();
        let names = ProxyNames::default();
        let aspect = Aspect::new("org/pkg/PassThrough", pointcut::match_method_name("run"));
        let bindings = vec![AspectBinding {
            aspect: &aspect,
            advice: AdviceData::new(Arc::new(pass_through()), 0, &names).unwrap(),
        }];
        let mut context =
            WeavingContext::new(&model, &names, "org/pkg/Service$$Proxetta".to_owned(), None);
        let header = weave(&mut context, &bindings)?;
        Ok((context.methods, header))
    }

    #[test]
    fn overrides_and_chains() {
        let (methods, header) = weave_service(method::AccessFlags::PUBLIC).unwrap();
        assert_eq!(header.super_class.binary_name, "org/pkg/Service");
        let names: Vec<_> = methods.iter().map(|it| it.name.as_str()).collect();
        assert_eq!(names, ["run", "run$0", "<init>", "$__init"]);

        let chain = &methods[1];
        assert!(chain.access_flags.contains(method::AccessFlags::PRIVATE | method::AccessFlags::FINAL));
        let listing: Vec<_> = chain
            .body
            .as_ref()
            .unwrap()
            .opcodes()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            listing,
            [
                "aload 0",
                "lload 1",
                "invokespecial org/pkg/Service::run(J)I",
                "invokestatic java/lang/Integer::valueOf(I)Ljava/lang/Integer;",
                "dup",
                "ifnonnull L0",
                "pop",
                "iconst_0",
                "ireturn",
                "checkcast java/lang/Number",
                "invokevirtual java/lang/Number::intValue()I",
                "ireturn",
            ]
        );
        assert_eq!(chain.body.as_ref().unwrap().max_locals, 3);

        let constructor = &methods[2];
        let listing: Vec<_> = constructor
            .body
            .as_ref()
            .unwrap()
            .opcodes()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            listing,
            [
                "aload 0",
                "iload 1",
                "invokespecial org/pkg/Service::<init>(I)V",
                "aload 0",
                "invokespecial org/pkg/Service$$Proxetta::$__init()V",
                "return",
            ]
        );
    }

    #[test]
    fn final_methods_are_rejected() {
        let err = weave_service(method::AccessFlags::PUBLIC | method::AccessFlags::FINAL)
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::FinalMethodConflict));
        assert_eq!(err.target(), "org/pkg/Service");
        assert_eq!(err.method(), Some("org/pkg/Service#int run(long)"));
    }

    #[test]
    fn abstract_methods_are_rejected() {
        let err = weave_service(method::AccessFlags::PUBLIC | method::AccessFlags::ABSTRACT)
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::AbstractMethod));
        assert_eq!(err.method(), Some("org/pkg/Service#int run(long)"));
    }
}
