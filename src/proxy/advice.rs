//! Loading and validating advice classes.

use std::{
    collections::HashMap,
    sync::{Arc, OnceLock, PoisonError, RwLock},
};

use log::trace;

use crate::{
    jvm::{
        Class, Field, Method,
        code::{
            Instruction, MethodBody,
            opcodes::{ALOAD, INVOKESPECIAL},
        },
        method,
    },
    types::{field_type::FieldType, method_descriptor::ReturnType},
};

use super::{
    ErrorKind, asm_util::OBJECT, config::ProxyNames, context::WeavingContext,
    rewriter::AdviceRemapper,
};

/// Advice classes shared between [`Proxetta`](super::Proxetta) instances, so that each advice
/// is parsed once however many targets it is woven into.
#[derive(Debug, Default)]
pub struct AdviceCache {
    classes: RwLock<HashMap<String, Arc<Class>>>,
}

impl AdviceCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache used by every [`Proxetta`](super::Proxetta) unless another one is given.
    /// It lives until the process exits.
    #[must_use]
    pub fn global() -> &'static Self {
        static GLOBAL: OnceLock<AdviceCache> = OnceLock::new();
        GLOBAL.get_or_init(Self::new)
    }

    /// Returns the cached advice, or caches the one returned by `load`.
    ///
    /// # Errors
    /// Any error returned by `load`. Nothing is cached in that case.
    pub fn get_or_try_insert_with<E>(
        &self,
        name: &str,
        load: impl FnOnce() -> Result<Arc<Class>, E>,
    ) -> Result<Arc<Class>, E> {
        let cached = self
            .classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned();
        if let Some(advice) = cached {
            return Ok(advice);
        }
        let advice = load()?;
        trace!("caching advice {name}");
        let mut classes = self
            .classes
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(classes.entry(name.to_owned()).or_insert(advice)))
    }

    /// Returns `true` if the advice has been cached.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Number of cached advices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if no advice is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A validated advice, bound to its position among the aspects of a proxy.
#[derive(Debug)]
pub(crate) struct AdviceData {
    advice: Arc<Class>,
    pub aspect_index: usize,
    execute: usize,
}

impl AdviceData {
    /// Checks that `advice` can be woven.
    ///
    /// An advice is a concrete class extending `java.lang.Object`, with no nested classes, a
    /// no-argument constructor only, and an instance method `Object execute()`.
    pub(crate) fn new(
        advice: Arc<Class>,
        aspect_index: usize,
        names: &ProxyNames,
    ) -> Result<Self, ErrorKind> {
        let invalid = |reason: &str| Err(ErrorKind::InvalidAdvice(reason.to_owned()));
        if advice.is_interface() || advice.is_abstract() {
            return invalid("advice must be a concrete class");
        }
        if advice
            .super_class
            .as_ref()
            .is_some_and(|it| it.binary_name != OBJECT)
        {
            return invalid("advice must extend java.lang.Object");
        }
        let nested_prefix = format!("{}$", advice.binary_name);
        if advice
            .inner_classes
            .iter()
            .any(|it| it.inner_class.binary_name.starts_with(&nested_prefix))
        {
            return invalid("advice must not declare nested or anonymous classes");
        }
        if advice
            .methods
            .iter()
            .any(|it| it.is_constructor() && !it.descriptor.parameters_types.is_empty())
        {
            return invalid("advice must only have a default constructor");
        }
        let execute = advice
            .methods
            .iter()
            .position(|it| {
                it.name == names.execute_method
                    && it.descriptor.parameters_types.is_empty()
                    && matches!(
                        &it.descriptor.return_type,
                        ReturnType::Some(FieldType::Object(class)) if class.binary_name == OBJECT
                    )
            })
            .ok_or_else(|| {
                ErrorKind::InvalidAdvice(format!(
                    "method `Object {}()` not found",
                    names.execute_method
                ))
            })?;
        if advice.methods[execute].is_static() || advice.methods[execute].body.is_none() {
            return invalid("execute() must be a concrete instance method");
        }
        Ok(Self {
            advice,
            aspect_index,
            execute,
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.advice.binary_name
    }

    pub(crate) fn execute(&self) -> &Method {
        &self.advice.methods[self.execute]
    }

    /// Copies the fields and methods of the advice except `execute` to the proxy.
    ///
    /// The advice constructor and static initializer are copied as private methods, to be
    /// called from the constructors and the static initializer of the proxy.
    pub(crate) fn copy_members(&self, context: &mut WeavingContext<'_>) -> Result<(), ErrorKind> {
        let names = context.names;
        let index = self.aspect_index;
        let proxy_name = context.proxy_name.clone();
        let owner = context.proxy_ref();
        let remapper = AdviceRemapper::new(self.name(), &proxy_name, index, names);

        for field in &self.advice.fields {
            context.fields.push(Field {
                name: names.field_name(&field.name, index),
                owner: owner.clone(),
                ..field.clone()
            });
        }

        for (method_index, method) in self.advice.methods.iter().enumerate() {
            if method_index == self.execute {
                continue;
            }
            let Some(body) = &method.body else {
                return Err(ErrorKind::InvalidAdvice(format!(
                    "method `{}` has no code",
                    method.name
                )));
            };
            let argument_words =
                method.descriptor.parameters_words() + u16::from(!method.is_static());
            let (name, access_flags, skip) = if method.is_constructor() {
                let name = names.advice_init_name(index);
                context.init_methods.push(name.clone());
                let access = method::AccessFlags::from_bits_truncate(
                    method.access_flags.bits() & 0xFFF0,
                ) | method::AccessFlags::PRIVATE
                    | method::AccessFlags::FINAL;
                (name, access, self.super_constructor_call(body))
            } else if method.is_static_initializer_block() {
                let name = names.advice_clinit_name(index);
                context.static_init_methods.push(name.clone());
                let access = method.access_flags
                    | method::AccessFlags::PRIVATE
                    | method::AccessFlags::FINAL;
                (name, access, Vec::new())
            } else {
                (
                    names.advice_method_name(&method.name, index),
                    method.access_flags,
                    Vec::new(),
                )
            };
            let body = remapper.copy_body(body, argument_words, &skip)?;
            context.methods.push(Method {
                access_flags,
                name,
                owner: owner.clone(),
                body: Some(body),
                ..method.clone()
            });
        }
        Ok(())
    }

    /// Finds the call to the super constructor and the `aload_0` before it.
    fn super_constructor_call(&self, body: &MethodBody) -> Vec<usize> {
        let super_class = self
            .advice
            .super_class
            .as_ref()
            .map_or(OBJECT, |it| it.binary_name.as_str());
        let Some(call) = body.instructions.iter().position(|it| {
            matches!(
                it,
                Instruction::Method { opcode: INVOKESPECIAL, method }
                    if method.is_constructor() && method.owner.binary_name == super_class
            )
        }) else {
            return Vec::new();
        };
        let receiver = body.instructions[..call]
            .iter()
            .rposition(|it| !matches!(it, Instruction::Label(_)))
            .filter(|it| {
                matches!(
                    body.instructions[*it],
                    Instruction::Var {
                        opcode: ALOAD,
                        slot: 0
                    }
                )
            });
        receiver.into_iter().chain(Some(call)).collect()
    }
}
