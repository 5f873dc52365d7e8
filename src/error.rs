use go125_parser::walk::StructuralError;
use go125_parser::{ParseFailure, PrintError};
use thiserror::Error;

/// A type mapping string that cannot be used.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MappingError {
    #[error("invalid mapping {pair:?}, expected Type=ConcreteType")]
    Malformed { pair: String },
    #[error("invalid mapping {pair:?}, {name:?} is not a valid identifier")]
    Placeholder { pair: String, name: String },
    #[error("duplicate mapping for template type {name}")]
    Duplicate { name: String },
    #[error("in mapping {pair:?}: {source}")]
    Concrete {
        pair: String,
        #[source]
        source: ConcreteTypeError,
    },
}

/// A concrete type specification that does not follow the grammar.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConcreteTypeError {
    #[error("invalid type: {name:?} (at {at})")]
    TypeName { name: String, at: usize },
    #[error("invalid package name: {name:?} (at {at})")]
    PackageName { name: String, at: usize },
    #[error("invalid type specification {spec:?}: missing closing \")")]
    Unclosed { spec: String },
    #[error("invalid type specification {spec:?}: empty import path")]
    EmptyPath { spec: String },
}

/// Failure while organizing the imports of generated code.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("generated code does not parse: {0}")]
    Parse(#[from] ParseFailure),
    #[error("could not unquote import path {0}")]
    Path(String),
}

/// Failure of one specialization run. No output is produced on any of these.
#[derive(Debug, Error)]
pub enum SpecializeError {
    #[error("parsing file failed: {0}")]
    Parse(#[from] ParseFailure),
    #[error("could not unquote import path {0}")]
    ImportPath(String),
    #[error("rewriting the syntax tree failed: {0}")]
    Structural(#[from] StructuralError),
    #[error("printing file failed: {0}")]
    Print(#[from] PrintError),
    #[error("formatting file failed: {0}")]
    Imports(#[from] ImportError),
}
