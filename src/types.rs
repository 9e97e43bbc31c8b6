// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::error::{Error, ErrorCode, Property, Result};
use crate::options::EvaluationOptions;
use crate::parser::TypeParser;
use crate::registry::TypeRegistry;
use crate::value::Kind;
use crate::Rc;

use core::fmt;

/// Storage width of an integer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    /// 16-bit `SMALLINT`.
    Small,
    /// 32-bit `INT4`.
    Int4,
    /// 64-bit `INT`/`BIGINT`.
    Int8,
}

impl IntWidth {
    pub const fn range(self) -> (i64, i64) {
        match self {
            IntWidth::Small => (i16::MIN as i64, i16::MAX as i64),
            IntWidth::Int4 => (i32::MIN as i64, i32::MAX as i64),
            IntWidth::Int8 => (i64::MIN, i64::MAX),
        }
    }

    pub const fn size_in_bytes(self) -> u32 {
        match self {
            IntWidth::Small => 2,
            IntWidth::Int4 => 4,
            IntWidth::Int8 => 8,
        }
    }

    pub fn contains(self, value: i64) -> bool {
        let (min, max) = self.range();
        (min..=max).contains(&value)
    }
}

/// Length constraint of a character string type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringBound {
    Unbounded,
    /// `CHAR(n)`: exactly `n` code points.
    Fixed(u32),
    /// `VARCHAR(n)`: at most `n` code points.
    Varying(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecimalParams {
    pub precision: u32,
    pub scale: u32,
}

/// A named type registered in a [`TypeRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomType {
    name: Rc<str>,
    target: TypeDescriptor,
}

impl CustomType {
    pub fn new(name: &str, target: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            target,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &TypeDescriptor {
        &self.target
    }
}

/// A flattened, duplicate-free set of member types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnyOf {
    members: Rc<[TypeDescriptor]>,
}

impl AnyOf {
    pub fn new(members: Vec<TypeDescriptor>) -> Result<Self> {
        if members.is_empty() {
            return Err(Error::new(
                ErrorCode::SemanticUnionTypeInvalid,
                "a union needs at least one member",
            ));
        }
        for (i, member) in members.iter().enumerate() {
            if matches!(member.resolve(), TypeDescriptor::Union(_)) {
                return Err(Error::new(
                    ErrorCode::SemanticUnionTypeInvalid,
                    format!("union member {member} is itself a union"),
                )
                .with_property(Property::TypeName, member.to_string()));
            }
            if members[..i].iter().any(|m| m.resolve() == member.resolve()) {
                return Err(Error::new(
                    ErrorCode::SemanticUnionTypeInvalid,
                    format!("union member {member} appears more than once"),
                )
                .with_property(Property::TypeName, member.to_string()));
            }
        }
        Ok(Self {
            members: members.into(),
        })
    }

    pub fn members(&self) -> &[TypeDescriptor] {
        &self.members
    }
}

/// Target of `CAST`, `CAN_CAST`, `CAN_LOSSLESS_CAST` and `IS`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    Any,
    Missing,
    Null,
    Bool,
    Int(IntWidth),
    Float,
    Decimal(Option<DecimalParams>),
    Date,
    Time {
        precision: Option<u8>,
        with_time_zone: bool,
    },
    Timestamp,
    String(StringBound),
    Symbol,
    Clob,
    Blob,
    List,
    Sexp,
    Struct,
    Bag,
    Union(AnyOf),
    Custom(Rc<CustomType>),
}

/// Type names the grammar knows without a registry, upper-cased.
pub const BUILTIN_TYPE_NAMES: &[&str] = &[
    "ANY", "MISSING", "NULL", "BOOL", "BOOLEAN", "SMALLINT", "INT2", "INTEGER2", "INT4",
    "INTEGER4", "INT", "INTEGER", "BIGINT", "INT8", "INTEGER8", "FLOAT", "REAL", "DOUBLE",
    "DECIMAL", "DEC", "NUMERIC", "DATE", "TIME", "TIMESTAMP", "CHAR", "CHARACTER", "VARCHAR",
    "STRING", "SYMBOL", "CLOB", "BLOB", "LIST", "SEXP", "STRUCT", "TUPLE", "BAG",
];

impl TypeDescriptor {
    /// Parse type text such as `DECIMAL(5,2)`, `TIME(3) WITH TIME ZONE` or a
    /// registered custom type name.
    pub fn parse(text: &str, registry: Option<&TypeRegistry>) -> Result<TypeDescriptor> {
        TypeParser::new(text, registry)?.parse_complete()
    }

    pub fn union(members: Vec<TypeDescriptor>) -> Result<TypeDescriptor> {
        Ok(TypeDescriptor::Union(AnyOf::new(members)?))
    }

    /// The descriptor a custom type stands for; other descriptors resolve to themselves.
    pub fn resolve(&self) -> &TypeDescriptor {
        let mut current = self;
        while let TypeDescriptor::Custom(c) = current {
            current = &c.target;
        }
        current
    }

    /// Checks that depend on the cast mode.
    pub fn validate(&self, options: &EvaluationOptions) -> Result<()> {
        match self {
            TypeDescriptor::Decimal(Some(DecimalParams { precision, scale }))
                if options.honors_parameters() && scale > precision =>
            {
                Err(Error::new(
                    ErrorCode::SemanticInvalidDecimalArguments,
                    format!("scale {scale} exceeds precision {precision}"),
                )
                .with_property(Property::Precision, *precision)
                .with_property(Property::Scale, *scale))
            }
            TypeDescriptor::Union(any_of) => any_of
                .members()
                .iter()
                .try_for_each(|m| m.validate(options)),
            TypeDescriptor::Custom(c) => c.target.validate(options),
            _ => Ok(()),
        }
    }

    /// The kind of value this descriptor produces, when it names a single kind.
    pub fn runtime_kind(&self) -> Option<Kind> {
        Some(match self.resolve() {
            TypeDescriptor::Missing => Kind::Missing,
            TypeDescriptor::Null => Kind::Null,
            TypeDescriptor::Bool => Kind::Bool,
            TypeDescriptor::Int(_) => Kind::Int,
            TypeDescriptor::Float => Kind::Float,
            TypeDescriptor::Decimal(_) => Kind::Decimal,
            TypeDescriptor::Date => Kind::Date,
            TypeDescriptor::Time { .. } => Kind::Time,
            TypeDescriptor::Timestamp => Kind::Timestamp,
            TypeDescriptor::String(_) => Kind::String,
            TypeDescriptor::Symbol => Kind::Symbol,
            TypeDescriptor::Clob => Kind::Clob,
            TypeDescriptor::Blob => Kind::Blob,
            TypeDescriptor::List => Kind::List,
            TypeDescriptor::Sexp => Kind::Sexp,
            TypeDescriptor::Struct => Kind::Struct,
            TypeDescriptor::Bag => Kind::Bag,
            TypeDescriptor::Any | TypeDescriptor::Union(_) | TypeDescriptor::Custom(_) => {
                return None
            }
        })
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Any => f.write_str("ANY"),
            TypeDescriptor::Missing => f.write_str("MISSING"),
            TypeDescriptor::Null => f.write_str("NULL"),
            TypeDescriptor::Bool => f.write_str("BOOL"),
            TypeDescriptor::Int(IntWidth::Small) => f.write_str("SMALLINT"),
            TypeDescriptor::Int(IntWidth::Int4) => f.write_str("INT4"),
            TypeDescriptor::Int(IntWidth::Int8) => f.write_str("INT"),
            TypeDescriptor::Float => f.write_str("FLOAT"),
            TypeDescriptor::Decimal(None) => f.write_str("DECIMAL"),
            TypeDescriptor::Decimal(Some(DecimalParams { precision, scale })) => {
                write!(f, "DECIMAL({precision},{scale})")
            }
            TypeDescriptor::Date => f.write_str("DATE"),
            TypeDescriptor::Time {
                precision,
                with_time_zone,
            } => {
                f.write_str("TIME")?;
                if let Some(p) = precision {
                    write!(f, "({p})")?;
                }
                if *with_time_zone {
                    f.write_str(" WITH TIME ZONE")?;
                }
                Ok(())
            }
            TypeDescriptor::Timestamp => f.write_str("TIMESTAMP"),
            TypeDescriptor::String(StringBound::Unbounded) => f.write_str("STRING"),
            TypeDescriptor::String(StringBound::Fixed(n)) => write!(f, "CHAR({n})"),
            TypeDescriptor::String(StringBound::Varying(n)) => write!(f, "VARCHAR({n})"),
            TypeDescriptor::Symbol => f.write_str("SYMBOL"),
            TypeDescriptor::Clob => f.write_str("CLOB"),
            TypeDescriptor::Blob => f.write_str("BLOB"),
            TypeDescriptor::List => f.write_str("LIST"),
            TypeDescriptor::Sexp => f.write_str("SEXP"),
            TypeDescriptor::Struct => f.write_str("STRUCT"),
            TypeDescriptor::Bag => f.write_str("BAG"),
            TypeDescriptor::Union(any_of) => {
                f.write_str("ANY_OF(")?;
                for (i, m) in any_of.members().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{m}")?;
                }
                f.write_str(")")
            }
            TypeDescriptor::Custom(c) => f.write_str(c.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::CastMode;

    #[test]
    fn unions_reject_nesting_and_duplicates() {
        let u = TypeDescriptor::union(vec![TypeDescriptor::Bool, TypeDescriptor::Float]).unwrap();
        let err = TypeDescriptor::union(vec![u, TypeDescriptor::Date]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::SemanticUnionTypeInvalid);

        let err = TypeDescriptor::union(vec![TypeDescriptor::Date, TypeDescriptor::Date])
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::SemanticUnionTypeInvalid);
    }

    #[test]
    fn decimal_arguments_are_mode_dependent() {
        let t = TypeDescriptor::Decimal(Some(DecimalParams {
            precision: 2,
            scale: 5,
        }));
        assert!(t.validate(&EvaluationOptions::default()).is_ok());
        let err = t
            .validate(&EvaluationOptions::default().with_cast_mode(CastMode::Honored))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::SemanticInvalidDecimalArguments);
    }

    #[test]
    fn display_names() {
        let t = TypeDescriptor::Time {
            precision: Some(3),
            with_time_zone: true,
        };
        assert_eq!(t.to_string(), "TIME(3) WITH TIME ZONE");
        assert_eq!(TypeDescriptor::String(StringBound::Fixed(1)).to_string(), "CHAR(1)");
        assert_eq!(IntWidth::Small.range(), (-32768, 32767));
    }
}
