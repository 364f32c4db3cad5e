//! Diagnostics.
//!
//! One flat enum for every error kind the analyzer can raise: a handful of
//! named variants carrying a `Cow<'static, str>` message and a position,
//! rather than a hierarchy of boxed trait objects.

use std::{borrow::Cow, fmt};

use crate::span::Span;

/// A single analyzer diagnostic.
#[derive(Debug, Clone)]
pub struct SemaError {
    pub kind: SemaErrorKind,
    pub span: Span,
}

impl SemaError {
    #[must_use]
    pub fn new(kind: SemaErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// True for the one error kind that callers one frame up are expected to
    /// catch and re-render: caught at the var-decl / func-decl-init handler
    /// and converted into a localized user message.
    #[must_use]
    pub fn is_can_not_use_local(&self) -> bool {
        matches!(self.kind, SemaErrorKind::CanNotUseLocal { .. })
    }
}

impl fmt::Display for SemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for SemaError {}

/// Every diagnosable condition described in #[derive(Debug, Clone)]
pub enum SemaErrorKind {
    // --- Lookup / resolution ---
    /// A function parameter's declared type could not be resolved to a sym.
    UnresolvedParamType { param: Cow<'static, str> },
    /// A non-func reference hit an overloaded function sym, or a func
    /// reference hit a `symToManyFuncs` module entry.
    AmbiguousSym { name: Cow<'static, str> },
    /// No sym, symref, builtin type, or module member matched the name.
    MissingSymbol { name: Cow<'static, str> },
    /// The resolved sym exists but is not exported and the query is cross-chunk.
    NotExported { name: Cow<'static, str> },
    /// A local variable's value was used as a callee but does not resolve to
    /// a callable local or sym ("Can not use `name` as a function reference").
    NotAFunctionReference { name: Cow<'static, str> },

    // --- Declaration conflict ---
    DuplicateLocalVar { name: Cow<'static, str> },
    DuplicateObjectType { name: Cow<'static, str> },
    /// Includes alias collisions: a top-level name already bound to a sym or a type alias.
    DuplicateTopLevelSym { name: Cow<'static, str> },
    /// Same func sym + same resolved func sig registered twice.
    OverloadCollision { name: Cow<'static, str> },

    // --- Scope discipline ---
    /// A static-var/static-func initializer referenced a local variable.
    /// Carries enough identity to let the caller (one frame up) render the
    /// localized "initializer can not reference local ..." message.
    CanNotUseLocal {
        local: Cow<'static, str>,
        enclosing_sym: Cow<'static, str>,
    },
    /// An inner function captured an outer local, but the inner function is
    /// a `static` function, not a lambda/closure.
    CaptureFromStaticFunction { local: Cow<'static, str> },
    /// Assignment to a captured/static name without the `capture`/`static` modifier.
    AssignWithoutModifier { name: Cow<'static, str> },
    /// A type alias's rhs sym never resolved.
    UnresolvedAliasTarget { name: Cow<'static, str> },

    // --- Syntax-level rejections ---
    UnsupportedAssignmentLhs,
    UnsupportedExportSubject,
    UnsupportedNamedArgs,
    UnsupportedTypeAliasRhs,
    StaticVarLhsNotIdentifier,

    // --- Import ---
    ImportPathNotFound { spec: Cow<'static, str> },
    NotSupportedInWasm { what: Cow<'static, str> },
    UnsupportedModuleSymKind { kind: Cow<'static, str> },

    // --- Resource limits [AMBIENT] ---
    LimitExceeded { what: Cow<'static, str> },
}

impl fmt::Display for SemaErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedParamType { param } => write!(f, "Cannot resolve param type `{param}`"),
            Self::AmbiguousSym { name } => write!(f, "`{name}` is ambiguous"),
            Self::MissingSymbol { name } => write!(f, "Can not find symbol `{name}`"),
            Self::NotExported { name } => write!(f, "`{name}` is not exported"),
            Self::NotAFunctionReference { name } => write!(f, "Can not use `{name}` as a function reference"),
            Self::DuplicateLocalVar { name } => write!(f, "Variable `{name}` is already declared"),
            Self::DuplicateObjectType { name } => write!(f, "Object type `{name}` is already declared"),
            Self::DuplicateTopLevelSym { name } => write!(f, "`{name}` is already declared at the top level"),
            Self::OverloadCollision { name } => write!(f, "`{name}` has a duplicate overload with this signature"),
            Self::CanNotUseLocal { local, enclosing_sym } => write!(
                f,
                "initializer of `{enclosing_sym}` can not reference local `{local}`"
            ),
            Self::CaptureFromStaticFunction { local } => write!(
                f,
                "static function can not capture `{local}` from an enclosing scope; use a lambda instead"
            ),
            Self::AssignWithoutModifier { name } => {
                write!(f, "`{name}` must be declared with `static` before assigning")
            }
            Self::UnresolvedAliasTarget { name } => write!(f, "type alias `{name}` targets an unresolved symbol"),
            Self::UnsupportedAssignmentLhs => {
                write!(f, "Assignment to the left hand side is not allowed")
            }
            Self::UnsupportedExportSubject => write!(f, "Unsupported export subject"),
            Self::UnsupportedNamedArgs => write!(f, "Unsupported named args"),
            Self::UnsupportedTypeAliasRhs => write!(f, "Unsupported type alias right hand side"),
            Self::StaticVarLhsNotIdentifier => write!(f, "Static variable left hand side must be an identifier"),
            Self::ImportPathNotFound { spec } => write!(f, "Import path does not exist: `{spec}`"),
            Self::NotSupportedInWasm { what } => write!(f, "`{what}` is not supported in wasm"),
            Self::UnsupportedModuleSymKind { kind } => write!(f, "Unsupported module sym kind `{kind}`"),
            Self::LimitExceeded { what } => write!(f, "analysis limit exceeded: {what}"),
        }
    }
}

pub type SemaResult<T> = Result<T, SemaError>;
