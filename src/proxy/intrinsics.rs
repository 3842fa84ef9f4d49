//! Placeholder calls that advices make on `ProxyTarget`, replaced while weaving.

use crate::{
    jvm::references::{ClassRef, MethodRef},
    types::{Descriptor, field_type::FieldType, method_descriptor::ReturnType},
};

/// Simple name of the class declaring the intrinsics. Any package is accepted.
pub const PROXY_TARGET: &str = "ProxyTarget";

/// Simple name of the class materialized by the `info` intrinsic, expected in the package of
/// `ProxyTarget`.
pub const PROXY_TARGET_INFO: &str = "ProxyTargetInfo";

/// A call to `ProxyTarget` recognized in an advice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Intrinsic {
    Invoke,
    ArgumentsCount,
    ArgumentType,
    Argument,
    SetArgument,
    CreateArgumentsArray,
    CreateArgumentsClassArray,
    Target,
    TargetClass,
    TargetMethodName,
    TargetMethodSignature,
    TargetMethodDescription,
    ReturnType,
    ReturnValue,
    Info(ClassRef),
    TargetMethodAnnotation,
    TargetClassAnnotation,
}

impl Intrinsic {
    /// Recognizes an `invokestatic` target. Calls to other methods of `ProxyTarget` are not
    /// intrinsics.
    pub(crate) fn resolve(method: &MethodRef) -> Option<Self> {
        if method.owner.simple_name() != PROXY_TARGET {
            return None;
        }
        let intrinsic = match (method.name.as_str(), method.descriptor.descriptor().as_str()) {
            ("invoke", "()Ljava/lang/Object;") => Self::Invoke,
            ("argumentsCount", "()I") => Self::ArgumentsCount,
            ("argumentType", "(I)Ljava/lang/Class;") => Self::ArgumentType,
            ("argument", "(I)Ljava/lang/Object;") => Self::Argument,
            ("setArgument", "(Ljava/lang/Object;I)V") => Self::SetArgument,
            ("createArgumentsArray", "()[Ljava/lang/Object;") => Self::CreateArgumentsArray,
            ("createArgumentsClassArray", "()[Ljava/lang/Class;") => {
                Self::CreateArgumentsClassArray
            }
            ("target", "()Ljava/lang/Object;") => Self::Target,
            ("targetClass", "()Ljava/lang/Class;") => Self::TargetClass,
            ("targetMethodName", "()Ljava/lang/String;") => Self::TargetMethodName,
            ("targetMethodSignature", "()Ljava/lang/String;") => Self::TargetMethodSignature,
            ("targetMethodDescription", "()Ljava/lang/String;") => Self::TargetMethodDescription,
            ("returnType", "()Ljava/lang/Class;") => Self::ReturnType,
            ("returnValue", "(Ljava/lang/Object;)Ljava/lang/Object;") => Self::ReturnValue,
            ("targetMethodAnnotation", "(Ljava/lang/String;Ljava/lang/String;)Ljava/lang/Object;") => {
                Self::TargetMethodAnnotation
            }
            ("targetClassAnnotation", "(Ljava/lang/String;Ljava/lang/String;)Ljava/lang/Object;") => {
                Self::TargetClassAnnotation
            }
            ("info", _) if method.descriptor.parameters_types.is_empty() => {
                match &method.descriptor.return_type {
                    ReturnType::Some(FieldType::Object(class))
                        if class.simple_name() == PROXY_TARGET_INFO =>
                    {
                        Self::Info(class.clone())
                    }
                    _ => return None,
                }
            }
            _ => return None,
        };
        Some(intrinsic)
    }

    /// The name of the `ProxyTarget` method.
    pub(crate) const fn name(&self) -> &'static str {
        match self {
            Self::Invoke => "invoke",
            Self::ArgumentsCount => "argumentsCount",
            Self::ArgumentType => "argumentType",
            Self::Argument => "argument",
            Self::SetArgument => "setArgument",
            Self::CreateArgumentsArray => "createArgumentsArray",
            Self::CreateArgumentsClassArray => "createArgumentsClassArray",
            Self::Target => "target",
            Self::TargetClass => "targetClass",
            Self::TargetMethodName => "targetMethodName",
            Self::TargetMethodSignature => "targetMethodSignature",
            Self::TargetMethodDescription => "targetMethodDescription",
            Self::ReturnType => "returnType",
            Self::ReturnValue => "returnValue",
            Self::Info(_) => "info",
            Self::TargetMethodAnnotation => "targetMethodAnnotation",
            Self::TargetClassAnnotation => "targetClassAnnotation",
        }
    }
}
