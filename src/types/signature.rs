//! Generic method signatures, rendered the way Java source code spells the types.
//!
//! See the [JVM Specification §4.7.9.1](https://docs.oracle.com/javase/specs/jvms/se21/html/jvms-4.html#jvms-4.7.9.1) for more information.

use std::str::FromStr;

use super::field_type::PrimitiveType;

/// A generic method signature with each type rendered as Java source, e.g.,
/// `java.util.List<? extends java.lang.Number>`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct GenericMethodSignature {
    /// The names of the formal type parameters.
    pub type_parameters: Vec<String>,
    /// The parameter types.
    pub parameters: Vec<String>,
    /// The return type, `void` included.
    pub return_type: String,
    /// The types listed in the `throws` clause. Empty when the signature does not carry them.
    pub exceptions: Vec<String>,
}

/// An error indicating that a generic signature is malformed.
#[derive(Debug, PartialEq, Eq, Clone, thiserror::Error)]
#[error("Invalid generic signature: {0}")]
pub struct InvalidSignature(pub String);

impl FromStr for GenericMethodSignature {
    type Err = InvalidSignature;

    fn from_str(signature: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser::new(signature);
        let type_parameters = if parser.peek() == Some('<') {
            parser.type_parameters()?
        } else {
            Vec::new()
        };
        parser.expect('(')?;
        let mut parameters = Vec::new();
        while parser.peek() != Some(')') {
            let param = parser.java_type()?;
            if param == "void" {
                return Err(parser.error());
            }
            parameters.push(param);
        }
        parser.expect(')')?;
        let return_type = parser.java_type()?;
        let mut exceptions = Vec::new();
        while parser.peek() == Some('^') {
            parser.bump();
            exceptions.push(parser.java_type()?);
        }
        if !parser.rest.is_empty() {
            return Err(parser.error());
        }
        Ok(Self {
            type_parameters,
            parameters,
            return_type,
            exceptions,
        })
    }
}

struct Parser<'a> {
    source: &'a str,
    rest: &'a str,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            rest: source,
        }
    }

    fn error(&self) -> InvalidSignature {
        InvalidSignature(self.source.to_owned())
    }

    fn peek(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.rest = &self.rest[c.len_utf8()..];
        Some(c)
    }

    fn expect(&mut self, expected: char) -> Result<(), InvalidSignature> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            _ => Err(self.error()),
        }
    }

    /// Consumes an identifier up to (excluding) any of the `stops`.
    fn identifier(&mut self, stops: &[char]) -> Result<&'a str, InvalidSignature> {
        let end = self.rest.find(stops).ok_or_else(|| self.error())?;
        if end == 0 {
            return Err(self.error());
        }
        let (ident, rest) = self.rest.split_at(end);
        self.rest = rest;
        Ok(ident)
    }

    fn type_parameters(&mut self) -> Result<Vec<String>, InvalidSignature> {
        self.expect('<')?;
        let mut names = Vec::new();
        while self.peek() != Some('>') {
            let name = self.identifier(&[':'])?;
            names.push(name.to_owned());
            while self.peek() == Some(':') {
                self.bump();
                if matches!(self.peek(), Some('L' | 'T' | '[')) {
                    self.java_type()?;
                }
            }
        }
        self.expect('>')?;
        Ok(names)
    }

    fn java_type(&mut self) -> Result<String, InvalidSignature> {
        match self.bump() {
            Some('V') => Ok("void".to_owned()),
            Some('L') => self.class_type(),
            Some('T') => {
                let name = self.identifier(&[';'])?.to_owned();
                self.expect(';')?;
                Ok(name)
            }
            Some('[') => Ok(format!("{}[]", self.java_type()?)),
            Some(c) => PrimitiveType::try_from(c)
                .map(|it| it.to_string())
                .map_err(|_| self.error()),
            None => Err(self.error()),
        }
    }

    fn class_type(&mut self) -> Result<String, InvalidSignature> {
        const STOPS: &[char] = &[';', '<', '.'];
        let mut rendered = self.identifier(STOPS)?.replace('/', ".");
        loop {
            if self.peek() == Some('<') {
                rendered.push_str(&self.type_arguments()?);
            }
            match self.bump() {
                Some(';') => break Ok(rendered),
                Some('.') => {
                    rendered.push('.');
                    rendered.push_str(self.identifier(STOPS)?);
                }
                _ => break Err(self.error()),
            }
        }
    }

    fn type_arguments(&mut self) -> Result<String, InvalidSignature> {
        self.expect('<')?;
        let mut arguments = Vec::new();
        while self.peek() != Some('>') {
            let argument = match self.peek() {
                Some('*') => {
                    self.bump();
                    "?".to_owned()
                }
                Some('+') => {
                    self.bump();
                    format!("? extends {}", self.java_type()?)
                }
                Some('-') => {
                    self.bump();
                    format!("? super {}", self.java_type()?)
                }
                Some(_) => self.java_type()?,
                None => return Err(self.error()),
            };
            arguments.push(argument);
        }
        self.expect('>')?;
        Ok(format!("<{}>", arguments.join(", ")))
    }
}
