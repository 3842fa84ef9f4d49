//! Predicates selecting the methods an aspect applies to.

use std::fmt;

use glob::{MatchOptions, Pattern};

use super::signature::MethodSignature;

/// Decides whether an aspect applies to a method.
///
/// Any `Fn(&MethodSignature) -> bool` is a pointcut.
/// ```
/// use proxetta::proxy::pointcut::{self, Pointcut, PointcutExt};
///
/// let getters = pointcut::match_method_name("get*")
///     .and(|it: &proxetta::proxy::MethodSignature| it.has_no_arguments())
///     .and(pointcut::all_public_methods());
/// # let _ = getters;
/// ```
pub trait Pointcut: Send + Sync {
    /// Returns `true` if the aspect applies to the method.
    fn apply(&self, signature: &MethodSignature) -> bool;
}

impl<F> Pointcut for F
where
    F: Fn(&MethodSignature) -> bool + Send + Sync,
{
    fn apply(&self, signature: &MethodSignature) -> bool {
        self(signature)
    }
}

impl fmt::Debug for dyn Pointcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pointcut")
    }
}

/// Combinators for [`Pointcut`]s.
pub trait PointcutExt: Pointcut + Sized {
    /// Matches the methods matched by both pointcuts.
    fn and<P: Pointcut>(self, other: P) -> And<Self, P> {
        And(self, other)
    }

    /// Matches the methods matched by either pointcut.
    fn or<P: Pointcut>(self, other: P) -> Or<Self, P> {
        Or(self, other)
    }

    /// Matches the methods not matched by this pointcut.
    fn not(self) -> Not<Self> {
        Not(self)
    }
}

impl<P: Pointcut> PointcutExt for P {}

/// See [`PointcutExt::and`].
#[derive(Debug, Clone, Copy)]
pub struct And<A, B>(A, B);

impl<A: Pointcut, B: Pointcut> Pointcut for And<A, B> {
    fn apply(&self, signature: &MethodSignature) -> bool {
        self.0.apply(signature) && self.1.apply(signature)
    }
}

/// See [`PointcutExt::or`].
#[derive(Debug, Clone, Copy)]
pub struct Or<A, B>(A, B);

impl<A: Pointcut, B: Pointcut> Pointcut for Or<A, B> {
    fn apply(&self, signature: &MethodSignature) -> bool {
        self.0.apply(signature) || self.1.apply(signature)
    }
}

/// See [`PointcutExt::not`].
#[derive(Debug, Clone, Copy)]
pub struct Not<A>(A);

impl<A: Pointcut> Pointcut for Not<A> {
    fn apply(&self, signature: &MethodSignature) -> bool {
        !self.0.apply(signature)
    }
}

/// Matches public methods declared in the target or in its super classes and interfaces,
/// except those of `java.lang.Object`.
#[must_use]
pub fn all_public_methods() -> impl Pointcut + Clone + use<> {
    |it: &MethodSignature| it.is_public() && !it.is_root_method()
}

/// Matches every method.
#[must_use]
pub fn all_methods() -> impl Pointcut + Clone + use<> {
    |_: &MethodSignature| true
}

/// Matches methods annotated with the given type, named by its binary or Java name.
#[must_use]
pub fn annotated_with(type_name: &str) -> impl Pointcut + Clone + use<> {
    let type_name = type_name.to_owned();
    move |it: &MethodSignature| it.has_annotation(&type_name)
}

/// Matches methods of target classes annotated with the given type.
#[must_use]
pub fn in_class_annotated_with(type_name: &str) -> impl Pointcut + Clone + use<> {
    let type_name = type_name.to_owned();
    move |it: &MethodSignature| it.has_class_annotation(&type_name)
}

/// Matches method names against a wildcard pattern, where `*` matches any sequence and `?`
/// any single character. An invalid pattern matches nothing.
#[must_use]
pub fn match_method_name(wildcard: &str) -> impl Pointcut + Clone + use<> {
    let pattern = Pattern::new(wildcard).ok();
    move |it: &MethodSignature| {
        pattern
            .as_ref()
            .is_some_and(|p| p.matches_with(it.name(), WILDCARD_OPTIONS))
    }
}

/// Matches the Java name of the target class, e.g., `org.pkg.*Service`, against a wildcard
/// pattern.
#[must_use]
pub fn match_class_name(wildcard: &str) -> impl Pointcut + Clone + use<> {
    let pattern = Pattern::new(wildcard).ok();
    move |it: &MethodSignature| {
        pattern.as_ref().is_some_and(|p| {
            p.matches_with(&it.class_name().replace('/', "."), WILDCARD_OPTIONS)
        })
    }
}

const WILDCARD_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        jvm::{Annotation, Class, method::AccessFlags},
        tests::method_stub,
        types::field_type::FieldType,
    };

    fn signature(declaring: &str, name: &str, access: AccessFlags) -> MethodSignature {
        let mut method = method_stub(declaring, name, "()V", access);
        method.runtime_visible_annotations = vec![Annotation {
            annotation_type: FieldType::object("org/pkg/Logged"),
            element_value_pairs: Vec::new(),
        }];
        let class = Arc::new(Class {
            binary_name: declaring.to_owned(),
            methods: vec![method],
            ..Class::default()
        });
        MethodSignature::decode(&class, 0, "org/pkg/UserService", Arc::from(Vec::new())).unwrap()
    }

    #[test]
    fn public_methods_exclude_object() {
        let pointcut = all_public_methods();
        assert!(pointcut.apply(&signature("org/pkg/UserService", "save", AccessFlags::PUBLIC)));
        assert!(!pointcut.apply(&signature("org/pkg/UserService", "save", AccessFlags::PROTECTED)));
        assert!(!pointcut.apply(&signature("java/lang/Object", "toString", AccessFlags::PUBLIC)));
    }

    #[test]
    fn wildcards() {
        let getters = match_method_name("get*");
        assert!(getters.apply(&signature("org/pkg/UserService", "getName", AccessFlags::PUBLIC)));
        assert!(!getters.apply(&signature("org/pkg/UserService", "setName", AccessFlags::PUBLIC)));
        assert!(match_method_name("s?ve").apply(&signature(
            "org/pkg/UserService",
            "save",
            AccessFlags::PUBLIC
        )));
        assert!(match_class_name("org.pkg.*Service").apply(&signature(
            "org/pkg/Base",
            "save",
            AccessFlags::PUBLIC
        )));
        assert!(!match_class_name("org.other.*").apply(&signature(
            "org/pkg/Base",
            "save",
            AccessFlags::PUBLIC
        )));
    }

    #[test]
    fn combinators() {
        let save = signature("org/pkg/UserService", "save", AccessFlags::PUBLIC);
        let logged = annotated_with("org.pkg.Logged");
        assert!(logged.clone().and(match_method_name("save")).apply(&save));
        assert!(!logged.clone().and(match_method_name("load")).apply(&save));
        assert!(match_method_name("load").or(logged.clone()).apply(&save));
        assert!(!logged.not().apply(&save));
        assert!(!in_class_annotated_with("org.pkg.Logged").apply(&save));
        assert!(all_methods().apply(&save));
    }

    #[test]
    fn pointcuts_outlive_their_patterns() {
        let aspect = {
            let name = String::from("sa*");
            crate::proxy::Aspect::new("org/pkg/LogAdvice", match_method_name(&name))
        };
        let save = signature("org/pkg/UserService", "save", AccessFlags::PUBLIC);
        assert!(aspect.pointcut().apply(&save));
        let logged = {
            let type_name = String::from("org.pkg.Logged");
            annotated_with(&type_name)
        };
        assert!(logged.apply(&save));
    }
}
