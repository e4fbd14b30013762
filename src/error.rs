use thiserror::Error;

/// Top-level error type for the CombLayer cell-algebra core.
///
/// Every variant is fatal to the current model build. Nothing inside the
/// crate catches and recovers from these; they propagate to the driver.
#[derive(Debug, Error)]
pub enum CombLayerError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error(transparent)]
    AbsMethod(#[from] AbsMethodError),

    #[error(transparent)]
    Zone(#[from] ZoneError),

    #[error(transparent)]
    Variable(#[from] VariableError),
}

/// Errors related to geometric primitives.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,
}

/// A requested key, name, cell or surface does not exist (or already does).
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("{kind} already registered: {key}")]
    Duplicate { kind: &'static str, key: String },
}

impl LookupError {
    pub(crate) fn not_found(kind: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    pub(crate) fn duplicate(kind: &'static str, key: impl ToString) -> Self {
        Self::Duplicate {
            kind,
            key: key.to_string(),
        }
    }
}

/// A numeric index fell outside its valid range.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("{what} index {index} out of range [0, {size})")]
    OutOfRange {
        what: &'static str,
        index: i64,
        size: usize,
    },
}

impl IndexError {
    pub(crate) fn out_of_range(what: &'static str, index: impl Into<i64>, size: usize) -> Self {
        Self::OutOfRange {
            what,
            index: index.into(),
            size,
        }
    }
}

/// Errors raised while reading rule expressions.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("unexpected token `{token}` at position {position}")]
    BadToken { token: String, position: usize },

    #[error("unbalanced parenthesis at position {position}")]
    Unbalanced { position: usize },

    #[error("operator `{op}` at position {position} has no operand")]
    DanglingOperator { op: char, position: usize },

    #[error("surface number 0 is not a valid half-space")]
    ZeroSurface,
}

/// A component capability was requested but never implemented.
#[derive(Debug, Error)]
pub enum AbsMethodError {
    #[error("{method} is not implemented for component {component}")]
    NotImplemented {
        component: String,
        method: &'static str,
    },
}

/// Build-zone state-machine violations.
#[derive(Debug, Error)]
pub enum ZoneError {
    #[error("build zone {zone}: {missing} has not been set")]
    NotReady { zone: String, missing: &'static str },

    #[error("build zone {zone} is closed")]
    Closed { zone: String },
}

/// Errors reading typed values out of the variable table.
#[derive(Debug, Error)]
pub enum VariableError {
    #[error("variable {key} cannot be read as {expected}")]
    TypeMismatch { key: String, expected: &'static str },
}

/// Convenience type alias for results using [`CombLayerError`].
pub type Result<T> = std::result::Result<T, CombLayerError>;
