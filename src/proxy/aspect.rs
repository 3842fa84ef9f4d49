use std::sync::Arc;

use super::{advice::AdviceData, pointcut::Pointcut};

/// An advice together with the pointcut selecting the methods it is woven into.
///
/// Aspects are applied in the order they are added to a [`Proxetta`](super::Proxetta): the
/// advice of the first aspect runs outermost.
#[derive(Debug, Clone)]
pub struct Aspect {
    advice: String,
    pointcut: Arc<dyn Pointcut>,
}

impl Aspect {
    /// Creates an aspect from the binary name of an advice class, e.g., `org/pkg/LogAdvice`.
    /// Java names such as `org.pkg.LogAdvice` are accepted too.
    pub fn new(advice: impl Into<String>, pointcut: impl Pointcut + 'static) -> Self {
        Self {
            advice: advice.into().replace('.', "/"),
            pointcut: Arc::new(pointcut),
        }
    }

    /// Returns the binary name of the advice class.
    #[must_use]
    pub fn advice(&self) -> &str {
        &self.advice
    }

    /// Returns the pointcut.
    #[must_use]
    pub fn pointcut(&self) -> &dyn Pointcut {
        self.pointcut.as_ref()
    }
}

/// An aspect with its advice loaded for one proxy.
#[derive(Debug)]
pub(crate) struct AspectBinding<'a> {
    pub aspect: &'a Aspect,
    pub advice: AdviceData,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::pointcut;

    #[test]
    fn java_names_are_normalized() {
        let aspect = Aspect::new("org.pkg.LogAdvice", pointcut::all_methods());
        assert_eq!(aspect.advice(), "org/pkg/LogAdvice");
        let copy = aspect.clone();
        assert!(std::ptr::addr_eq(
            Arc::as_ptr(&copy.pointcut),
            Arc::as_ptr(&aspect.pointcut)
        ));
    }
}
