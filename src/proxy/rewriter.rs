//! Rewriting advice code into proxy methods.

use std::collections::HashMap;

#[allow(clippy::enum_glob_use)]
use crate::jvm::code::opcodes::*;
use crate::{
    jvm::{
        ConstantValue, JavaString, Method,
        annotation::ElementValue,
        code::{CodeBuilder, ExceptionHandler, Instruction, Label, MethodBody},
        references::{ClassRef, FieldRef, MethodRef},
    },
    types::{
        field_type::{FieldType, PrimitiveType},
        method_descriptor::ReturnType,
    },
};

use super::{
    ErrorKind,
    advice::AdviceData,
    asm_util::{self, CLASS, OBJECT},
    config::ProxyNames,
    context::WeavingContext,
    intrinsics::{Intrinsic, PROXY_TARGET},
    signature::MethodSignature,
};

/// Redirects the references an advice makes to its own members to the copies of those
/// members in the proxy.
#[derive(Debug)]
pub(crate) struct AdviceRemapper<'a> {
    advice: &'a str,
    proxy: &'a str,
    aspect_index: usize,
    names: &'a ProxyNames,
}

impl<'a> AdviceRemapper<'a> {
    pub(crate) fn new(
        advice: &'a str,
        proxy: &'a str,
        aspect_index: usize,
        names: &'a ProxyNames,
    ) -> Self {
        Self {
            advice,
            proxy,
            aspect_index,
            names,
        }
    }

    fn field(&self, field: FieldRef) -> FieldRef {
        if field.owner.binary_name == self.advice {
            FieldRef {
                owner: ClassRef::new(self.proxy),
                name: self.names.field_name(&field.name, self.aspect_index),
                field_type: field.field_type,
            }
        } else {
            field
        }
    }

    fn method(&self, method: MethodRef) -> MethodRef {
        if method.owner.binary_name == self.advice {
            MethodRef {
                owner: ClassRef::new(self.proxy),
                name: self.names.advice_method_name(&method.name, self.aspect_index),
                descriptor: method.descriptor,
                is_interface: false,
            }
        } else {
            method
        }
    }

    /// Rewrites an instruction copied from the advice into the proxy.
    ///
    /// # Errors
    /// - [`ErrorKind::UnsupportedSuperCall`] for a non-constructor `invokespecial` on another
    ///   class.
    /// - [`ErrorKind::InvalidAdvice`] for instructions that class files of version 49 cannot
    ///   carry.
    pub(crate) fn instruction(&self, instruction: Instruction) -> Result<Instruction, ErrorKind> {
        let rewritten = match instruction {
            Instruction::Field { opcode, field } => Instruction::Field {
                opcode,
                field: self.field(field),
            },
            Instruction::Method {
                opcode: INVOKESPECIAL,
                method,
            } if method.owner.binary_name != self.advice
                && method.name != Method::CONSTRUCTOR_NAME =>
            {
                return Err(ErrorKind::UnsupportedSuperCall(method.to_string()));
            }
            Instruction::Method { opcode, method } => Instruction::Method {
                opcode,
                method: self.method(method),
            },
            Instruction::InvokeDynamic { name, .. } => {
                return Err(ErrorKind::InvalidAdvice(format!(
                    "invokedynamic `{name}` is not supported"
                )));
            }
            Instruction::Ldc(
                value @ (ConstantValue::Handle(_)
                | ConstantValue::MethodType(_)
                | ConstantValue::Dynamic { .. }),
            ) => {
                return Err(ErrorKind::InvalidAdvice(format!(
                    "constant {value} is not supported"
                )));
            }
            other => other,
        };
        Ok(rewritten)
    }

    /// Copies the body of an advice method other than `execute`.
    pub(crate) fn copy_body(
        &self,
        body: &MethodBody,
        argument_words: u16,
        skip: &[usize],
    ) -> Result<MethodBody, ErrorKind> {
        let mut code = CodeBuilder::new();
        for (idx, instruction) in body.instructions.iter().enumerate() {
            if !skip.contains(&idx) {
                code.push(self.instruction(instruction.clone())?);
            }
        }
        for handler in &body.exception_table {
            code.try_catch(handler.clone());
        }
        Ok(code.build(argument_words)?)
    }
}

/// Tracks the constants pushed just before an instruction, for intrinsics taking constant
/// arguments.
#[derive(Debug, Default)]
struct History {
    int_constant: Option<i32>,
    strings: [Option<String>; 2],
}

impl History {
    fn record(&mut self, instruction: &Instruction) {
        self.int_constant = match instruction {
            Instruction::Simple(opcode @ ICONST_M1..=ICONST_5) => {
                Some(i32::from(*opcode) - i32::from(ICONST_0))
            }
            Instruction::Int {
                opcode: BIPUSH | SIPUSH,
                operand,
            } => Some(*operand),
            Instruction::Ldc(ConstantValue::Integer(value)) => Some(*value),
            _ => None,
        };
        self.strings = match instruction {
            Instruction::Ldc(ConstantValue::String(JavaString::Utf8(value))) => {
                [self.strings[1].take(), Some(value.clone())]
            }
            _ => [None, None],
        };
    }
}

/// One link of the chain of methods woven around a target method.
#[derive(Debug)]
pub(crate) struct ChainLink<'a> {
    pub signature: &'a MethodSignature,
    pub advice: &'a AdviceData,
    /// The chain method called by `invoke`, `None` for the last link, which calls the target.
    pub next: Option<String>,
}

/// Rewrites the `execute` method of the advice of `link` into the body of a chain method.
pub(crate) fn rewrite_execute(
    context: &WeavingContext<'_>,
    link: &ChainLink<'_>,
) -> Result<MethodBody, ErrorKind> {
    let execute = link.advice.execute();
    let body = execute
        .body
        .as_ref()
        .ok_or_else(|| ErrorKind::InvalidAdvice("execute() has no code".to_owned()))?;
    let mut rewriter = Rewriter {
        context,
        link,
        remapper: AdviceRemapper::new(
            link.advice.name(),
            &context.proxy_name,
            link.advice.aspect_index,
            context.names,
        ),
        code: CodeBuilder::new(),
        labels: HashMap::new(),
        history: History::default(),
        pending_return_value: false,
    };
    for instruction in &body.instructions {
        rewriter.visit(instruction)?;
    }
    rewriter.flush();
    for handler in &body.exception_table {
        let handler = ExceptionHandler {
            start: rewriter.label(handler.start),
            end: rewriter.label(handler.end),
            handler: rewriter.label(handler.handler),
            catch_type: handler.catch_type.clone(),
        };
        rewriter.code.try_catch(handler);
    }
    let signature = link.signature;
    let argument_words = signature.arguments_words() + u16::from(!signature.is_static());
    Ok(rewriter.code.build(argument_words)?)
}

struct Rewriter<'a, 'b> {
    context: &'a WeavingContext<'b>,
    link: &'a ChainLink<'a>,
    remapper: AdviceRemapper<'a>,
    code: CodeBuilder,
    labels: HashMap<Label, Label>,
    history: History,
    /// The value returned by the target is on the stack and has not been boxed yet.
    pending_return_value: bool,
}

impl Rewriter<'_, '_> {
    fn label(&mut self, label: Label) -> Label {
        *self
            .labels
            .entry(label)
            .or_insert_with(|| self.code.new_label())
    }

    fn signature(&self) -> &MethodSignature {
        self.link.signature
    }

    /// Boxes the pending return value of the target.
    fn flush(&mut self) {
        if self.pending_return_value {
            self.pending_return_value = false;
            asm_util::box_return_value(&mut self.code, self.link.signature.return_type());
        }
    }

    fn shift(&self, slot: u16) -> Result<u16, ErrorKind> {
        if slot != 0 {
            return Ok(slot + self.signature().arguments_words());
        }
        if self.signature().is_static() {
            return Err(ErrorKind::StaticContext);
        }
        Ok(0)
    }

    fn visit(&mut self, instruction: &Instruction) -> Result<(), ErrorKind> {
        if let Instruction::Label(label) = instruction {
            self.flush();
            let label = self.label(*label);
            self.code.mark(label);
            return Ok(());
        }
        if self.pending_return_value {
            if let Instruction::Simple(POP | POP2) = instruction {
                // The advice discards the result of `invoke`, so it is never boxed.
                self.pending_return_value = false;
                let pop = if self.signature().return_type().words() == 2 {
                    POP2
                } else {
                    POP
                };
                self.code.simple(pop);
                self.history.record(instruction);
                return Ok(());
            }
            self.flush();
        }

        match instruction {
            Instruction::Var { opcode, slot } => {
                let slot = self.shift(*slot)?;
                self.code.var(*opcode, slot);
            }
            Instruction::Iinc { slot, increment } => {
                let slot = self.shift(*slot)?;
                self.code.push(Instruction::Iinc {
                    slot,
                    increment: *increment,
                });
            }
            Instruction::Simple(ARETURN) => {
                asm_util::return_value(&mut self.code, self.link.signature.return_type(), true);
            }
            Instruction::Method {
                opcode: INVOKESTATIC,
                method,
            } if method.owner.simple_name() == PROXY_TARGET => match Intrinsic::resolve(method) {
                Some(intrinsic) => self.intrinsic(&intrinsic)?,
                None => {
                    self.code.push(instruction.clone());
                }
            },
            Instruction::Jump { opcode, target } => {
                let target = self.label(*target);
                self.code.jump(*opcode, target);
            }
            Instruction::TableSwitch {
                low,
                default,
                targets,
            } => {
                let default = self.label(*default);
                let targets = targets.iter().map(|it| self.label(*it)).collect();
                self.code.push(Instruction::TableSwitch {
                    low: *low,
                    default,
                    targets,
                });
            }
            Instruction::LookupSwitch { default, pairs } => {
                let default = self.label(*default);
                let pairs = pairs
                    .iter()
                    .map(|(key, target)| (*key, self.label(*target)))
                    .collect();
                self.code
                    .push(Instruction::LookupSwitch { default, pairs });
            }
            other => {
                let rewritten = self.remapper.instruction(other.clone())?;
                self.code.push(rewritten);
            }
        }
        self.history.record(instruction);
        Ok(())
    }

    fn argument_index(&self, intrinsic: &Intrinsic) -> Result<usize, ErrorKind> {
        let index = self
            .history
            .int_constant
            .ok_or(ErrorKind::UnresolvedArgumentIndex(intrinsic.name()))?;
        let count = self.signature().arguments_count();
        usize::try_from(index)
            .ok()
            .filter(|it| (1..=count).contains(it))
            .ok_or(ErrorKind::InvalidArgumentIndex { index, count })
    }

    fn annotation_lookup(&self, intrinsic: &Intrinsic) -> Result<(String, String), ErrorKind> {
        match &self.history.strings {
            [Some(annotation), Some(element)] => Ok((annotation.clone(), element.clone())),
            _ => Err(ErrorKind::UnresolvedAnnotationLookup(intrinsic.name())),
        }
    }

    fn intrinsic(&mut self, intrinsic: &Intrinsic) -> Result<(), ErrorKind> {
        let signature = self.link.signature;
        match intrinsic {
            Intrinsic::Invoke => self.invoke(),
            Intrinsic::ArgumentType | Intrinsic::Argument | Intrinsic::SetArgument => {
                let index = self.argument_index(intrinsic)?;
                let Some(argument) = signature.argument(index) else {
                    return Ok(());
                };
                self.code.simple(POP);
                match intrinsic {
                    Intrinsic::ArgumentType => {
                        asm_util::load_class(&mut self.code, &argument.type_descriptor);
                    }
                    Intrinsic::Argument => {
                        asm_util::load_argument_as_object(&mut self.code, argument);
                    }
                    _ => asm_util::store_argument_from_object(&mut self.code, argument),
                }
            }
            Intrinsic::TargetMethodAnnotation | Intrinsic::TargetClassAnnotation => {
                let (annotation_type, element) = self.annotation_lookup(intrinsic)?;
                self.code.simple(POP).simple(POP);
                let annotation = if *intrinsic == Intrinsic::TargetMethodAnnotation {
                    signature.get_annotation(&annotation_type)
                } else {
                    signature.get_class_annotation(&annotation_type)
                };
                match annotation.and_then(|it| it.get_element_value(&element)) {
                    Some(value) => load_element_value(&mut self.code, value, &element)?,
                    None => {
                        self.code.simple(ACONST_NULL);
                    }
                }
            }
            Intrinsic::Info(info_class) => self.info(info_class),
            _ => self.value(intrinsic),
        }
        Ok(())
    }

    /// Pushes the value of an intrinsic that depends only on the target method.
    fn value(&mut self, intrinsic: &Intrinsic) {
        let signature = self.link.signature;
        let code = &mut self.code;
        match intrinsic {
            Intrinsic::ArgumentsCount => {
                code.int(count_as_i32(signature.arguments_count()));
            }
            Intrinsic::CreateArgumentsArray | Intrinsic::CreateArgumentsClassArray => {
                let of_classes = *intrinsic == Intrinsic::CreateArgumentsClassArray;
                code.int(count_as_i32(signature.arguments_count()))
                    .type_insn(ANEWARRAY, if of_classes { CLASS } else { OBJECT });
                for (i, argument) in signature.arguments().iter().enumerate() {
                    code.simple(DUP).int(count_as_i32(i));
                    if of_classes {
                        asm_util::load_class(code, &argument.type_descriptor);
                    } else {
                        asm_util::load_argument_as_object(code, argument);
                    }
                    code.simple(AASTORE);
                }
            }
            Intrinsic::Target => {
                if signature.is_static() {
                    code.simple(ACONST_NULL);
                } else {
                    code.var(ALOAD, 0);
                }
            }
            Intrinsic::TargetClass => {
                code.ldc(ConstantValue::Class(ClassRef::new(
                    &self.context.super_reference,
                )));
            }
            Intrinsic::TargetMethodName => {
                code.ldc(ConstantValue::String(signature.name().into()));
            }
            Intrinsic::TargetMethodSignature => {
                code.ldc(ConstantValue::String(signature.declaration().into()));
            }
            Intrinsic::TargetMethodDescription => {
                code.ldc(ConstantValue::String(signature.raw_descriptor().into()));
            }
            Intrinsic::ReturnType => asm_util::load_class(code, signature.return_type()),
            Intrinsic::ReturnValue => asm_util::cast_to_return_type(code, signature.return_type()),
            Intrinsic::Invoke
            | Intrinsic::ArgumentType
            | Intrinsic::Argument
            | Intrinsic::SetArgument
            | Intrinsic::Info(_)
            | Intrinsic::TargetMethodAnnotation
            | Intrinsic::TargetClassAnnotation => {}
        }
    }

    /// Creates a `ProxyTargetInfo` and fills its public fields.
    fn info(&mut self, info_class: &ClassRef) {
        let fields = [
            ("argumentCount", FieldType::Base(PrimitiveType::Int), Intrinsic::ArgumentsCount),
            (
                "argumentTypes",
                FieldType::object(CLASS).into_array_type(),
                Intrinsic::CreateArgumentsClassArray,
            ),
            (
                "arguments",
                FieldType::object(OBJECT).into_array_type(),
                Intrinsic::CreateArgumentsArray,
            ),
            ("returnType", FieldType::object(CLASS), Intrinsic::ReturnType),
            ("targetClass", FieldType::object(CLASS), Intrinsic::TargetClass),
            ("target", FieldType::object(OBJECT), Intrinsic::Target),
            (
                "targetMethodName",
                FieldType::object("java/lang/String"),
                Intrinsic::TargetMethodName,
            ),
            (
                "targetMethodSignature",
                FieldType::object("java/lang/String"),
                Intrinsic::TargetMethodSignature,
            ),
            (
                "targetMethodDescription",
                FieldType::object("java/lang/String"),
                Intrinsic::TargetMethodDescription,
            ),
        ];
        self.code
            .type_insn(NEW, info_class.binary_name.clone())
            .simple(DUP)
            .invoke(
                INVOKESPECIAL,
                asm_util::method_ref(
                    &info_class.binary_name,
                    Method::CONSTRUCTOR_NAME,
                    Vec::new(),
                    ReturnType::Void,
                ),
            );
        for (name, field_type, intrinsic) in fields {
            self.code.simple(DUP);
            self.value(&intrinsic);
            self.code.field(
                PUTFIELD,
                FieldRef {
                    owner: info_class.clone(),
                    name: name.to_owned(),
                    field_type,
                },
            );
        }
    }

    fn invoke(&mut self) {
        let signature = self.link.signature;
        let context = self.context;
        let code = &mut self.code;
        let opcode = if signature.is_static() {
            INVOKESTATIC
        } else {
            INVOKESPECIAL
        };
        let Some(next) = &self.link.next else {
            match &context.wrapper {
                Some(wrapper) => {
                    wrapper.load(context.proxy_ref(), code);
                    asm_util::load_arguments(code, signature);
                    wrapper.invoke(code, signature.name(), signature.descriptor().clone());
                }
                None => {
                    asm_util::load_this_and_arguments(code, signature);
                    code.invoke(
                        opcode,
                        MethodRef::new(
                            &context.super_reference,
                            signature.name(),
                            signature.descriptor().clone(),
                        ),
                    );
                }
            }
            if signature.return_type().is_void() {
                code.simple(ACONST_NULL);
            } else {
                self.pending_return_value = true;
            }
            return;
        };
        asm_util::load_this_and_arguments(code, signature);
        code.invoke(
            opcode,
            context.own_method(next.clone(), signature.descriptor().clone()),
        );
        asm_util::return_value(code, signature.return_type(), false);
    }
}

fn count_as_i32(count: usize) -> i32 {
    // Methods have at most 255 arguments.
    i32::try_from(count).unwrap_or(i32::MAX)
}

/// Pushes an annotation element value as an object.
fn load_element_value(
    code: &mut CodeBuilder,
    value: &ElementValue,
    element: &str,
) -> Result<(), ErrorKind> {
    match value {
        ElementValue::Primitive(primitive, constant) => {
            match constant {
                ConstantValue::Integer(value) => {
                    code.int(*value);
                }
                other => {
                    code.ldc(other.clone());
                }
            }
            asm_util::box_primitive(code, *primitive);
        }
        ElementValue::String(value) => {
            code.ldc(ConstantValue::String(value.clone()));
        }
        ElementValue::EnumConstant {
            enum_type_name,
            const_name,
        } => {
            let enum_type: FieldType = enum_type_name
                .parse()
                .map_err(|_| ErrorKind::UnsupportedAnnotationValue(element.to_owned()))?;
            let Some(owner) = enum_type.class_ref() else {
                return Err(ErrorKind::UnsupportedAnnotationValue(element.to_owned()));
            };
            code.field(
                GETSTATIC,
                FieldRef {
                    owner,
                    name: const_name.clone(),
                    field_type: enum_type,
                },
            );
        }
        ElementValue::Class { return_descriptor } => {
            asm_util::load_return_class(code, return_descriptor);
        }
        ElementValue::AnnotationInterface(_) | ElementValue::Array(_) => {
            return Err(ErrorKind::UnsupportedAnnotationValue(element.to_owned()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        jvm::{Class, class, method},
        proxy::class_model::ClassModel,
        tests::{method_stub, test_loader},
    };

    fn proxy_target(name: &str, descriptor: &str) -> MethodRef {
        MethodRef::new("org/proxetta/ProxyTarget", name, descriptor.parse().unwrap())
    }

    /// Weaves an advice whose `execute` is written by `execute` into `run` of a service, as the
    /// last link of the chain.
    fn rewrite(
        run_descriptor: &str,
        execute: impl FnOnce(&mut CodeBuilder),
    ) -> Result<MethodBody, ErrorKind> {
        let service = Class {
            binary_name: "org/pkg/Service".to_owned(),
            access_flags: class::AccessFlags::PUBLIC | class::AccessFlags::SUPER,
            super_class: Some(ClassRef::new(OBJECT)),
            methods: vec![method_stub(
                "org/pkg/Service",
                "run",
                run_descriptor,
                method::AccessFlags::PUBLIC,
            )],
            ..Class::default()
        };
        let loader = test_loader([service]);
        let model = ClassModel::build("org/pkg/Service", &loader).unwrap();
        let signature = model.methods().iter().find(|it| it.name() == "run").unwrap();

        let mut method = method_stub(
            "org/pkg/Advice",
            "execute",
            "()Ljava/lang/Object;",
            method::AccessFlags::PUBLIC,
        );
        let mut code = CodeBuilder::new();
        execute(&mut code);
        method.body = Some(code.build(1).unwrap());
        let advice = Class {
            binary_name: "org/pkg/Advice".to_owned(),
            super_class: Some(ClassRef::new(OBJECT)),
            methods: vec![method],
            ..Class::default()
        };
        let names = ProxyNames::default();
        let advice = AdviceData::new(Arc::new(advice), 0, &names).unwrap();
        let context =
            WeavingContext::new(&model, &names, "org/pkg/Service$$Proxetta".to_owned(), None);
        let link = ChainLink {
            signature,
            advice: &advice,
            next: None,
        };
        rewrite_execute(&context, &link)
    }

    #[test]
    fn argument_index_must_be_constant() {
        let result = rewrite("(I)V", |code| {
            code.simple(ICONST_1)
                .var(ISTORE, 1)
                .var(ILOAD, 1)
                .invoke(INVOKESTATIC, proxy_target("argument", "(I)Ljava/lang/Object;"))
                .simple(ARETURN);
        });
        assert!(matches!(result, Err(ErrorKind::UnresolvedArgumentIndex("argument"))));

        let result = rewrite("(I)V", |code| {
            code.simple(ACONST_NULL)
                .var(ILOAD, 1)
                .invoke(INVOKESTATIC, proxy_target("setArgument", "(Ljava/lang/Object;I)V"))
                .simple(ACONST_NULL)
                .simple(ARETURN);
        });
        assert!(matches!(result, Err(ErrorKind::UnresolvedArgumentIndex("setArgument"))));
    }

    #[test]
    fn annotation_lookup_must_use_string_constants() {
        let result = rewrite("()V", |code| {
            code.ldc(ConstantValue::String("org.pkg.Traced".into()))
                .var(ALOAD, 0)
                .invoke(
                    INVOKEVIRTUAL,
                    MethodRef::new(OBJECT, "toString", "()Ljava/lang/String;".parse().unwrap()),
                )
                .invoke(
                    INVOKESTATIC,
                    proxy_target(
                        "targetMethodAnnotation",
                        "(Ljava/lang/String;Ljava/lang/String;)Ljava/lang/Object;",
                    ),
                )
                .simple(ARETURN);
        });
        assert!(matches!(
            result,
            Err(ErrorKind::UnresolvedAnnotationLookup("targetMethodAnnotation"))
        ));
    }

    #[test]
    fn discarded_wide_results_are_popped_whole() {
        for (descriptor, call) in [
            ("()J", "invokespecial org/pkg/Service::run()J"),
            ("()D", "invokespecial org/pkg/Service::run()D"),
        ] {
            let body = rewrite(descriptor, |code| {
                code.invoke(INVOKESTATIC, proxy_target("invoke", "()Ljava/lang/Object;"))
                    .simple(POP)
                    .simple(ACONST_NULL)
                    .simple(ARETURN);
            })
            .unwrap();
            let listing: Vec<_> = body.opcodes().map(ToString::to_string).collect();
            assert_eq!(listing[..4], ["aload 0", call, "pop2", "aconst_null"]);
            assert!(!listing.iter().any(|it| it.contains("valueOf")), "{listing:?}");
        }
    }

    #[test]
    fn history_tracks_constants() {
        let mut history = History::default();
        history.record(&Instruction::Simple(ICONST_3));
        assert_eq!(history.int_constant, Some(3));
        history.record(&Instruction::Int {
            opcode: SIPUSH,
            operand: 300,
        });
        assert_eq!(history.int_constant, Some(300));
        history.record(&Instruction::Ldc(ConstantValue::String("org.pkg.Tx".into())));
        assert_eq!(history.int_constant, None);
        history.record(&Instruction::Ldc(ConstantValue::String("value".into())));
        assert_eq!(
            history.strings,
            [Some("org.pkg.Tx".to_owned()), Some("value".to_owned())]
        );
        history.record(&Instruction::Simple(POP));
        assert_eq!(history.strings, [None, None]);
    }

    #[test]
    fn remapper_redirects_advice_members() {
        let names = ProxyNames::default();
        let remapper = AdviceRemapper::new("org/pkg/Counter", "org/pkg/A$$Proxetta", 1, &names);
        let field = remapper
            .instruction(Instruction::Field {
                opcode: GETFIELD,
                field: FieldRef {
                    owner: ClassRef::new("org/pkg/Counter"),
                    name: "count".to_owned(),
                    field_type: FieldType::Base(PrimitiveType::Int),
                },
            })
            .unwrap();
        assert_eq!(
            field.to_string(),
            "getfield org/pkg/A$$Proxetta.$__count$1"
        );
        let call = remapper
            .instruction(Instruction::Method {
                opcode: INVOKEVIRTUAL,
                method: MethodRef::new("org/pkg/Counter", "log", "()V".parse().unwrap()),
            })
            .unwrap();
        assert_eq!(call.to_string(), "invokevirtual org/pkg/A$$Proxetta::$__log$1()V");
        let untouched = Instruction::Method {
            opcode: INVOKEVIRTUAL,
            method: MethodRef::new("java/io/PrintStream", "println", "()V".parse().unwrap()),
        };
        assert_eq!(remapper.instruction(untouched.clone()).unwrap(), untouched);
    }

    #[test]
    fn super_calls_are_rejected() {
        let names = ProxyNames::default();
        let remapper = AdviceRemapper::new("org/pkg/Counter", "org/pkg/A$$Proxetta", 0, &names);
        let super_call = Instruction::Method {
            opcode: INVOKESPECIAL,
            method: MethodRef::new("java/lang/Object", "toString", "()Ljava/lang/String;".parse().unwrap()),
        };
        assert!(matches!(
            remapper.instruction(super_call),
            Err(ErrorKind::UnsupportedSuperCall(_))
        ));
        let new_object = Instruction::Method {
            opcode: INVOKESPECIAL,
            method: MethodRef::new("java/lang/StringBuilder", "<init>", "()V".parse().unwrap()),
        };
        assert!(remapper.instruction(new_object).is_ok());
        assert!(matches!(
            remapper.instruction(Instruction::Ldc(ConstantValue::MethodType("()V".parse().unwrap()))),
            Err(ErrorKind::InvalidAdvice(_))
        ));
    }
}
