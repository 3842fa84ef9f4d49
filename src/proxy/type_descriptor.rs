use crate::{
    jvm::Annotation,
    types::{
        Descriptor,
        field_type::{FieldType, PrimitiveType},
        method_descriptor::ReturnType,
    },
};

/// The category of a type as far as instruction selection is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum OpcodeTag {
    /// `void`, only for return types.
    #[display("V")]
    Void,
    /// `byte`.
    #[display("B")]
    Byte,
    /// `char`.
    #[display("C")]
    Char,
    /// `short`.
    #[display("S")]
    Short,
    /// `int`.
    #[display("I")]
    Int,
    /// `boolean`.
    #[display("Z")]
    Boolean,
    /// `long`.
    #[display("J")]
    Long,
    /// `float`.
    #[display("F")]
    Float,
    /// `double`.
    #[display("D")]
    Double,
    /// A class or interface type.
    #[display("L")]
    Object,
    /// An array type.
    #[display("[")]
    Array,
}

impl OpcodeTag {
    fn of(field_type: &FieldType) -> Self {
        match field_type {
            FieldType::Base(PrimitiveType::Byte) => Self::Byte,
            FieldType::Base(PrimitiveType::Char) => Self::Char,
            FieldType::Base(PrimitiveType::Short) => Self::Short,
            FieldType::Base(PrimitiveType::Int) => Self::Int,
            FieldType::Base(PrimitiveType::Boolean) => Self::Boolean,
            FieldType::Base(PrimitiveType::Long) => Self::Long,
            FieldType::Base(PrimitiveType::Float) => Self::Float,
            FieldType::Base(PrimitiveType::Double) => Self::Double,
            FieldType::Object(_) => Self::Object,
            FieldType::Array(_) => Self::Array,
        }
    }

    /// Returns `true` for [`OpcodeTag::Object`] and [`OpcodeTag::Array`].
    #[must_use]
    pub const fn is_reference(self) -> bool {
        matches!(self, Self::Object | Self::Array)
    }
}

/// The static type of an argument or of a return value of a method.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    opcode_tag: OpcodeTag,
    type_name: String,
    field_type: Option<FieldType>,
    annotations: Vec<Annotation>,
}

impl TypeDescriptor {
    /// Creates the descriptor of an argument or a non-void return value.
    /// `type_name` is the Java spelling of the type, with type arguments when known.
    #[must_use]
    pub fn new(
        field_type: FieldType,
        type_name: impl Into<String>,
        annotations: Vec<Annotation>,
    ) -> Self {
        Self {
            opcode_tag: OpcodeTag::of(&field_type),
            type_name: type_name.into(),
            field_type: Some(field_type),
            annotations,
        }
    }

    /// Creates the descriptor of a return type.
    #[must_use]
    pub fn of_return_type(return_type: &ReturnType, type_name: impl Into<String>) -> Self {
        match return_type {
            ReturnType::Some(field_type) => Self::new(field_type.clone(), type_name, Vec::new()),
            ReturnType::Void => Self {
                opcode_tag: OpcodeTag::Void,
                type_name: type_name.into(),
                field_type: None,
                annotations: Vec::new(),
            },
        }
    }

    /// Returns the opcode tag.
    #[must_use]
    pub const fn opcode_tag(&self) -> OpcodeTag {
        self.opcode_tag
    }

    /// Returns the Java spelling of the type, e.g., `java.util.List<java.lang.String>`.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns the descriptor, e.g., `Ljava/util/List;`.
    #[must_use]
    pub fn raw_descriptor(&self) -> String {
        self.field_type
            .as_ref()
            .map_or_else(|| "V".to_owned(), Descriptor::descriptor)
    }

    /// Returns the type, `None` for `void`.
    #[must_use]
    pub const fn field_type(&self) -> Option<&FieldType> {
        self.field_type.as_ref()
    }

    /// Returns the primitive type, if the type is primitive.
    #[must_use]
    pub const fn primitive(&self) -> Option<PrimitiveType> {
        match self.field_type {
            Some(FieldType::Base(primitive)) => Some(primitive),
            _ => None,
        }
    }

    /// Returns the name used by `checkcast` and class literals, `None` for primitives and
    /// `void`.
    #[must_use]
    pub fn internal_name(&self) -> Option<String> {
        self.field_type.as_ref().and_then(FieldType::internal_name)
    }

    /// Returns the annotations, i.e., parameter annotations for arguments.
    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Returns the number of local variable slots the value occupies, `0` for `void`.
    #[must_use]
    pub fn words(&self) -> u16 {
        self.field_type.as_ref().map_or(0, FieldType::words)
    }

    /// Returns `true` if the type is `void`.
    #[must_use]
    pub fn is_void(&self) -> bool {
        self.opcode_tag == OpcodeTag::Void
    }
}
