use std::fmt;

use crate::jvm::{bytecode::GenerationError, class_loader};

/// An error that aborts a proxy request.
///
/// Carries the target class of the request, and, when known, the method being woven and the
/// advice being applied to it.
#[derive(Debug)]
pub struct Error {
    target: String,
    method: Option<String>,
    advice: Option<String>,
    kind: ErrorKind,
}

/// The cause of an [`Error`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A descriptor or generic signature could not be decoded.
    #[error("Malformed signature: {0}")]
    MalformedSignature(String),
    /// A class referenced by the request could not be loaded.
    #[error("Unable to resolve class {name}: {source}")]
    ClassResolution {
        /// The binary name of the class.
        name: String,
        /// The cause reported by the class loader.
        #[source]
        source: class_loader::Error,
    },
    /// An intrinsic taking an argument index was not preceded by an integer constant.
    #[error("Argument index of `{0}` must be an integer constant")]
    UnresolvedArgumentIndex(&'static str),
    /// An intrinsic refers to an argument that the target method does not have.
    #[error("Argument index {index} is out of range, the method has {count} argument(s)")]
    InvalidArgumentIndex {
        /// The 1-based index used by the advice.
        index: i32,
        /// The number of arguments of the target method.
        count: usize,
    },
    /// The advice calls a method of its super class.
    #[error("Super call to {0} is not supported in advices")]
    UnsupportedSuperCall(String),
    /// A pointcut matched a method that cannot be overridden.
    #[error("Unable to proxy final method, remove the final modifier or change the pointcut")]
    FinalMethodConflict,
    /// A pointcut matched an abstract method of a subclassed target.
    #[error("Unable to proxy abstract method")]
    AbstractMethod,
    /// The advice class cannot be woven.
    #[error("Invalid advice: {0}")]
    InvalidAdvice(String),
    /// The target class cannot be proxied in the requested mode.
    #[error("Invalid target: {0}")]
    InvalidTarget(String),
    /// An annotation intrinsic was not preceded by two string constants.
    #[error("Annotation type and element of `{0}` must be string constants")]
    UnresolvedAnnotationLookup(&'static str),
    /// An annotation element value cannot be loaded as a constant.
    #[error("Unsupported value of annotation element {0}")]
    UnsupportedAnnotationValue(String),
    /// The advice uses `this` in a static method.
    #[error("Advice uses `this` while woven into a static method")]
    StaticContext,
    /// The proxy class could not be written.
    #[error("Unable to generate the proxy class: {0}")]
    Generation(#[from] GenerationError),
}

impl Error {
    /// Creates an error for a request on `target`.
    #[must_use]
    pub fn new(target: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            target: target.into(),
            method: None,
            advice: None,
            kind,
        }
    }

    /// Returns the binary name of the target class.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns the method being woven when the error occurred.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// Returns the advice being applied when the error occurred.
    #[must_use]
    pub fn advice(&self) -> Option<&str> {
        self.advice.as_deref()
    }

    /// Returns the cause of the error.
    #[must_use]
    pub const fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Consumes the error and returns its cause.
    #[must_use]
    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to proxy {}", self.target)?;
        if let Some(method) = &self.method {
            write!(f, ", method {method}")?;
        }
        if let Some(advice) = &self.advice {
            write!(f, ", advice {advice}")?;
        }
        write!(f, ": {}", self.kind)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

/// Attaches request context to errors raised while weaving.
pub(crate) trait ErrorContext<T> {
    fn for_target(self, target: &str) -> Result<T, Error>;
}

impl<T> ErrorContext<T> for Result<T, ErrorKind> {
    fn for_target(self, target: &str) -> Result<T, Error> {
        self.map_err(|kind| Error::new(target, kind))
    }
}

/// Attaches the method and advice being processed to an [`Error`] that does not know them yet.
pub(crate) trait WeavingErrorContext<T> {
    fn in_method(self, method: impl fmt::Display) -> Result<T, Error>;

    fn in_advice(self, advice: &str) -> Result<T, Error>;
}

impl<T> WeavingErrorContext<T> for Result<T, Error> {
    fn in_method(self, method: impl fmt::Display) -> Result<T, Error> {
        self.map_err(|mut err| {
            if err.method.is_none() {
                err.method = Some(method.to_string());
            }
            err
        })
    }

    fn in_advice(self, advice: &str) -> Result<T, Error> {
        self.map_err(|mut err| {
            if err.advice.is_none() {
                err.advice = Some(advice.to_owned());
            }
            err
        })
    }
}

impl ErrorKind {
    pub(crate) fn class_resolution(name: impl Into<String>, source: class_loader::Error) -> Self {
        Self::ClassResolution {
            name: name.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err: Result<(), Error> =
            Err(ErrorKind::FinalMethodConflict).for_target("org/pkg/Service");
        let err = err
            .in_method("int run()")
            .in_advice("org/pkg/LogAdvice")
            .in_method("ignored")
            .unwrap_err();
        assert_eq!(err.target(), "org/pkg/Service");
        assert_eq!(err.method(), Some("int run()"));
        assert_eq!(err.advice(), Some("org/pkg/LogAdvice"));
        assert_eq!(
            err.to_string(),
            "Failed to proxy org/pkg/Service, method int run(), advice org/pkg/LogAdvice: \
             Unable to proxy final method, remove the final modifier or change the pointcut"
        );
    }

    #[test]
    fn source_is_the_kind() {
        let err = Error::new(
            "org/pkg/A",
            ErrorKind::class_resolution(
                "org/pkg/Base",
                class_loader::Error::NotFound("org/pkg/Base".to_owned()),
            ),
        );
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(
            source.to_string(),
            "Unable to resolve class org/pkg/Base: Class not found: org/pkg/Base"
        );
        assert!(matches!(err.into_kind(), ErrorKind::ClassResolution { .. }));
    }
}
