//! Emission of the methods of a proxy.

use log::trace;

#[allow(clippy::enum_glob_use)]
use crate::jvm::code::opcodes::*;
use crate::jvm::{Method, code::CodeBuilder, method};

use super::{
    Error, ErrorKind,
    aspect::AspectBinding,
    asm_util,
    errors::{ErrorContext, WeavingErrorContext},
    context::WeavingContext,
    rewriter::{ChainLink, rewrite_execute},
    signature::MethodSignature,
};

pub(super) mod subclass;
pub(super) mod wrapper;

/// The aspects applying to `signature`, in the order they were added.
pub(super) fn matching_aspects<'b, 'c>(
    signature: &MethodSignature,
    bindings: &'b [AspectBinding<'c>],
) -> Vec<&'b AspectBinding<'c>> {
    bindings
        .iter()
        .filter(|it| it.aspect.pointcut().apply(signature))
        .collect()
}

/// Copies the members of every advice into the proxy.
pub(super) fn copy_advice_members(
    context: &mut WeavingContext<'_>,
    bindings: &[AspectBinding<'_>],
) -> Result<(), Error> {
    let target = context.model.name().to_owned();
    for binding in bindings {
        binding
            .advice
            .copy_members(context)
            .for_target(&target)
            .in_advice(binding.advice.name())?;
    }
    Ok(())
}

/// Creates a proxy method overriding or forwarding to `signature`, keeping its metadata.
pub(super) fn overriding_method(
    context: &WeavingContext<'_>,
    signature: &MethodSignature,
    code: CodeBuilder,
) -> Result<Method, ErrorKind> {
    let original = signature.method();
    let argument_words = signature.arguments_words() + u16::from(!signature.is_static());
    Ok(Method {
        access_flags: original.access_flags
            - method::AccessFlags::NATIVE
            - method::AccessFlags::ABSTRACT,
        owner: context.proxy_ref(),
        body: Some(code.build(argument_words)?),
        ..original.clone()
    })
}

/// Replaces `signature` by a method calling the first link of a chain of advices, followed by
/// one private method per advice.
pub(super) fn weave_method(
    context: &mut WeavingContext<'_>,
    signature: &MethodSignature,
    bindings: &[&AspectBinding<'_>],
) -> Result<(), Error> {
    let target = context.model.name().to_owned();
    let names: Vec<String> = bindings
        .iter()
        .map(|it| {
            context
                .names
                .method_name(signature.name(), it.advice.aspect_index)
        })
        .collect();
    let Some(first) = names.first() else {
        return Ok(());
    };
    trace!("weaving {signature} with {} advice(s)", bindings.len());

    let mut code = CodeBuilder::new();
    asm_util::load_this_and_arguments(&mut code, signature);
    let opcode = if signature.is_static() {
        INVOKESTATIC
    } else {
        INVOKESPECIAL
    };
    code.invoke(
        opcode,
        context.own_method(first.clone(), signature.descriptor().clone()),
    );
    asm_util::return_value(&mut code, signature.return_type(), false);
    let delegate = overriding_method(context, signature, code)
        .for_target(&target)
        .in_method(signature)?;
    context.methods.push(delegate);

    let mut access_flags = method::AccessFlags::from_bits_truncate(
        (signature.access_flags() - method::AccessFlags::NATIVE - method::AccessFlags::ABSTRACT)
            .bits()
            & 0xFFF0,
    ) | method::AccessFlags::PRIVATE
        | method::AccessFlags::FINAL;
    if signature.is_static() {
        access_flags |= method::AccessFlags::STATIC;
    }
    for (i, binding) in bindings.iter().enumerate() {
        let link = ChainLink {
            signature,
            advice: &binding.advice,
            next: names.get(i + 1).cloned(),
        };
        trace!("  {} -> {}", names[i], binding.advice.name());
        let body = rewrite_execute(context, &link)
            .for_target(&target)
            .in_method(signature)
            .in_advice(binding.advice.name())?;
        let chain = context.new_method(
            access_flags,
            names[i].clone(),
            signature.descriptor().clone(),
            Some(body),
        );
        context.methods.push(chain);
    }
    context.any_method_woven = true;
    Ok(())
}
