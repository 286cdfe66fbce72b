use std::fmt;

/// A type as the binder understands it. Intentionally coarser than
/// `go/types`' own model: enough to drive plugin decisions (is this a
/// `Result`/`Option` monomorphization, does this selector reach a known
/// field) without reimplementing Go's full type algebra.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// A predeclared basic type: `int`, `string`, `bool`, `float64`, ...
    Basic(String),
    /// A named type declared in this package or another, e.g. `Shape`,
    /// `os.FileInfo`.
    Named(String),
    Pointer(Box<Type>),
    Slice(Box<Type>),
    Array(Box<Type>),
    Map { key: Box<Type>, value: Box<Type> },
    Chan(Box<Type>),
    Func { params: Vec<Type>, results: Vec<Type> },
    Struct { fields: Vec<(String, Type)> },
    Interface,
    /// The result of an expression list with more than one value, e.g.
    /// `f()` where `f` returns `(int, error)`.
    Tuple(Vec<Type>),
    /// A package identifier bound by an import, e.g. `fmt`.
    Package(String),
    /// The predeclared `error` interface.
    Error,
}

impl Type {
    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error) || matches!(self, Type::Named(n) if n == "error")
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Basic(b) => write!(f, "{b}"),
            Type::Named(n) => write!(f, "{n}"),
            Type::Pointer(t) => write!(f, "*{t}"),
            Type::Slice(t) => write!(f, "[]{t}"),
            Type::Array(t) => write!(f, "[...]{t}"),
            Type::Map { key, value } => write!(f, "map[{key}]{value}"),
            Type::Chan(t) => write!(f, "chan {t}"),
            Type::Func { params, results } => {
                let p: Vec<String> = params.iter().map(|t| t.to_string()).collect();
                let r: Vec<String> = results.iter().map(|t| t.to_string()).collect();
                write!(f, "func({}) ({})", p.join(", "), r.join(", "))
            }
            Type::Struct { .. } => write!(f, "struct{{...}}"),
            Type::Interface => write!(f, "interface{{}}"),
            Type::Tuple(ts) => {
                let parts: Vec<String> = ts.iter().map(|t| t.to_string()).collect();
                write!(f, "({})", parts.join(", "))
            }
            Type::Package(name) => write!(f, "package {name}"),
            Type::Error => write!(f, "error"),
        }
    }
}

pub const BASIC_TYPE_NAMES: &[&str] = &[
    "bool", "string", "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16",
    "uint32", "uint64", "uintptr", "byte", "rune", "float32", "float64", "complex64",
    "complex128", "any",
];

pub fn is_basic_type_name(name: &str) -> bool {
    BASIC_TYPE_NAMES.contains(&name)
}
