// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Programmatic expression tree.
//!
//! Every node records where it came from so that evaluation failures can be
//! reported with a line and column.

use crate::builtins::{self, Builtin};
use crate::error::{Error, ErrorCode, Result};
use crate::lexer::SourceLocation;
use crate::operators::{ArithOp, CmpOp, LikeMatcher};
use crate::types::TypeDescriptor;
use crate::value::Value;
use crate::Rc;

use core::{cmp, fmt, ops::Deref};

pub struct NodeRef<T> {
    r: Rc<T>,
}

impl<T> Clone for NodeRef<T> {
    fn clone(&self) -> Self {
        Self { r: self.r.clone() }
    }
}

impl<T: fmt::Debug> fmt::Debug for NodeRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.r.as_ref().fmt(f)
    }
}

impl<T> cmp::PartialEq for NodeRef<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::as_ptr(&self.r).eq(&Rc::as_ptr(&other.r))
    }
}

impl<T> cmp::Eq for NodeRef<T> {}

impl<T> Deref for NodeRef<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.r
    }
}

impl<T> AsRef<T> for NodeRef<T> {
    fn as_ref(&self) -> &T {
        self.deref()
    }
}

impl<T> NodeRef<T> {
    pub fn new(t: T) -> Self {
        Self { r: Rc::new(t) }
    }
}

pub type Ref<T> = NodeRef<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastOp {
    Cast,
    CanCast,
    CanLosslessCast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    List,
    Sexp,
    Bag,
}

#[derive(Debug)]
pub enum Expr {
    Literal {
        loc: SourceLocation,
        value: Value,
    },

    Var {
        loc: SourceLocation,
        name: Rc<str>,
    },

    /// `base.name`. Yields `MISSING` when `base` is not a struct with that field.
    Field {
        loc: SourceLocation,
        base: Ref<Expr>,
        name: Rc<str>,
    },

    /// `base[index]`. Yields `MISSING` when there is no such element.
    Index {
        loc: SourceLocation,
        base: Ref<Expr>,
        index: Ref<Expr>,
    },

    Unary {
        loc: SourceLocation,
        op: UnaryOp,
        operand: Ref<Expr>,
    },

    Arith {
        loc: SourceLocation,
        op: ArithOp,
        lhs: Ref<Expr>,
        rhs: Ref<Expr>,
    },

    Cmp {
        loc: SourceLocation,
        op: CmpOp,
        lhs: Ref<Expr>,
        rhs: Ref<Expr>,
    },

    Concat {
        loc: SourceLocation,
        lhs: Ref<Expr>,
        rhs: Ref<Expr>,
    },

    And {
        loc: SourceLocation,
        lhs: Ref<Expr>,
        rhs: Ref<Expr>,
    },

    Or {
        loc: SourceLocation,
        lhs: Ref<Expr>,
        rhs: Ref<Expr>,
    },

    Between {
        loc: SourceLocation,
        value: Ref<Expr>,
        low: Ref<Expr>,
        high: Ref<Expr>,
        negated: bool,
    },

    In {
        loc: SourceLocation,
        value: Ref<Expr>,
        collection: Ref<Expr>,
        negated: bool,
    },

    Like {
        loc: SourceLocation,
        value: Ref<Expr>,
        pattern: Ref<Expr>,
        escape: Option<Ref<Expr>>,
        // Present when pattern and escape are literals.
        matcher: Option<LikeMatcher>,
        negated: bool,
    },

    Cast {
        loc: SourceLocation,
        op: CastOp,
        value: Ref<Expr>,
        target: TypeDescriptor,
    },

    IsType {
        loc: SourceLocation,
        value: Ref<Expr>,
        target: TypeDescriptor,
        negated: bool,
    },

    IsNull {
        loc: SourceLocation,
        value: Ref<Expr>,
        negated: bool,
    },

    IsMissing {
        loc: SourceLocation,
        value: Ref<Expr>,
        negated: bool,
    },

    Call {
        loc: SourceLocation,
        builtin: &'static Builtin,
        args: Vec<Ref<Expr>>,
    },

    Collection {
        loc: SourceLocation,
        kind: CollectionKind,
        items: Vec<Ref<Expr>>,
    },

    /// Fields whose value evaluates to `MISSING` are left out.
    Struct {
        loc: SourceLocation,
        fields: Vec<(Rc<str>, Ref<Expr>)>,
        ordered: bool,
    },
}

impl Expr {
    pub fn loc(&self) -> SourceLocation {
        match self {
            Self::Literal { loc, .. }
            | Self::Var { loc, .. }
            | Self::Field { loc, .. }
            | Self::Index { loc, .. }
            | Self::Unary { loc, .. }
            | Self::Arith { loc, .. }
            | Self::Cmp { loc, .. }
            | Self::Concat { loc, .. }
            | Self::And { loc, .. }
            | Self::Or { loc, .. }
            | Self::Between { loc, .. }
            | Self::In { loc, .. }
            | Self::Like { loc, .. }
            | Self::Cast { loc, .. }
            | Self::IsType { loc, .. }
            | Self::IsNull { loc, .. }
            | Self::IsMissing { loc, .. }
            | Self::Call { loc, .. }
            | Self::Collection { loc, .. }
            | Self::Struct { loc, .. } => *loc,
        }
    }

    pub fn literal(loc: SourceLocation, value: impl Into<Value>) -> Ref<Expr> {
        Ref::new(Expr::Literal {
            loc,
            value: value.into(),
        })
    }

    pub fn var(loc: SourceLocation, name: &str) -> Ref<Expr> {
        Ref::new(Expr::Var {
            loc,
            name: name.into(),
        })
    }

    pub fn field(loc: SourceLocation, base: Ref<Expr>, name: &str) -> Ref<Expr> {
        Ref::new(Expr::Field {
            loc,
            base,
            name: name.into(),
        })
    }

    pub fn index(loc: SourceLocation, base: Ref<Expr>, index: Ref<Expr>) -> Ref<Expr> {
        Ref::new(Expr::Index { loc, base, index })
    }

    pub fn unary(loc: SourceLocation, op: UnaryOp, operand: Ref<Expr>) -> Ref<Expr> {
        Ref::new(Expr::Unary { loc, op, operand })
    }

    pub fn arith(loc: SourceLocation, op: ArithOp, lhs: Ref<Expr>, rhs: Ref<Expr>) -> Ref<Expr> {
        Ref::new(Expr::Arith { loc, op, lhs, rhs })
    }

    pub fn cmp(loc: SourceLocation, op: CmpOp, lhs: Ref<Expr>, rhs: Ref<Expr>) -> Ref<Expr> {
        Ref::new(Expr::Cmp { loc, op, lhs, rhs })
    }

    pub fn concat(loc: SourceLocation, lhs: Ref<Expr>, rhs: Ref<Expr>) -> Ref<Expr> {
        Ref::new(Expr::Concat { loc, lhs, rhs })
    }

    pub fn and(loc: SourceLocation, lhs: Ref<Expr>, rhs: Ref<Expr>) -> Ref<Expr> {
        Ref::new(Expr::And { loc, lhs, rhs })
    }

    pub fn or(loc: SourceLocation, lhs: Ref<Expr>, rhs: Ref<Expr>) -> Ref<Expr> {
        Ref::new(Expr::Or { loc, lhs, rhs })
    }

    pub fn between(
        loc: SourceLocation,
        value: Ref<Expr>,
        low: Ref<Expr>,
        high: Ref<Expr>,
        negated: bool,
    ) -> Ref<Expr> {
        Ref::new(Expr::Between {
            loc,
            value,
            low,
            high,
            negated,
        })
    }

    pub fn in_collection(
        loc: SourceLocation,
        value: Ref<Expr>,
        collection: Ref<Expr>,
        negated: bool,
    ) -> Ref<Expr> {
        Ref::new(Expr::In {
            loc,
            value,
            collection,
            negated,
        })
    }

    /// `value [NOT] LIKE pattern [ESCAPE escape]`.
    ///
    /// Literal text patterns compile here, so a malformed escape sequence is
    /// reported before any row is evaluated.
    pub fn like(
        loc: SourceLocation,
        value: Ref<Expr>,
        pattern: Ref<Expr>,
        escape: Option<Ref<Expr>>,
        negated: bool,
    ) -> Result<Ref<Expr>> {
        let literal_text = |e: &Expr| match e {
            Expr::Literal { value, .. } => value.as_text().map(str::to_string),
            _ => None,
        };
        let matcher = match (literal_text(&*pattern), escape.as_deref()) {
            (Some(p), None) => Some(LikeMatcher::new(&p, None)),
            (Some(p), Some(e)) => literal_text(e).map(|e| LikeMatcher::new(&p, Some(&e))),
            (None, _) => None,
        }
        .transpose()
        .map_err(|e| e.at(loc))?;
        Ok(Ref::new(Expr::Like {
            loc,
            value,
            pattern,
            escape,
            matcher,
            negated,
        }))
    }

    pub fn cast(loc: SourceLocation, op: CastOp, value: Ref<Expr>, target: TypeDescriptor) -> Ref<Expr> {
        Ref::new(Expr::Cast {
            loc,
            op,
            value,
            target,
        })
    }

    pub fn is_type(
        loc: SourceLocation,
        value: Ref<Expr>,
        target: TypeDescriptor,
        negated: bool,
    ) -> Ref<Expr> {
        Ref::new(Expr::IsType {
            loc,
            value,
            target,
            negated,
        })
    }

    pub fn is_null(loc: SourceLocation, value: Ref<Expr>, negated: bool) -> Ref<Expr> {
        Ref::new(Expr::IsNull {
            loc,
            value,
            negated,
        })
    }

    pub fn is_missing(loc: SourceLocation, value: Ref<Expr>, negated: bool) -> Ref<Expr> {
        Ref::new(Expr::IsMissing {
            loc,
            value,
            negated,
        })
    }

    /// A call to a builtin function. Unknown names and wrong arities fail here.
    pub fn call(loc: SourceLocation, name: &str, args: Vec<Ref<Expr>>) -> Result<Ref<Expr>> {
        let builtin = builtins::lookup(name).map_err(|e| e.at(loc))?;
        builtin.check_arity(args.len()).map_err(|e| e.at(loc))?;
        Ok(Ref::new(Expr::Call { loc, builtin, args }))
    }

    pub fn collection(loc: SourceLocation, kind: CollectionKind, items: Vec<Ref<Expr>>) -> Ref<Expr> {
        Ref::new(Expr::Collection { loc, kind, items })
    }

    pub fn struct_of(loc: SourceLocation, fields: Vec<(&str, Ref<Expr>)>, ordered: bool) -> Ref<Expr> {
        Ref::new(Expr::Struct {
            loc,
            fields: fields.into_iter().map(|(n, e)| (n.into(), e)).collect(),
            ordered,
        })
    }

    /// Literal integer text. Values beyond 64 bits are rejected.
    pub fn int_literal(loc: SourceLocation, text: &str) -> Result<Ref<Expr>> {
        let value = text.trim().parse::<i64>().map_err(|_| {
            Error::new(
                ErrorCode::SemanticLiteralIntOverflow,
                format!("integer literal {text} does not fit in 64 bits"),
            )
            .at(loc)
        })?;
        Ok(Expr::literal(loc, value))
    }
}
