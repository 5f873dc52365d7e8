//! Specializes Go source written against placeholder types.
//!
//! A template file declares placeholder types (`type T interface{}`) and
//! code that uses them. Given a mapping such as `T=*os.File`, [`specialize`]
//! keeps only the declarations that depend on a placeholder, renames them and
//! their references for the concrete types, fixes up the imports and prints
//! the result as formatted Go source.
//!
//! ```
//! use goreify::{specialize, SpecializeOptions, TypeMapping};
//!
//! let src = "package p\n\ntype Number int\n\nfunc AddNumber(a, b Number) Number { return a + b }\n";
//! let mapping: TypeMapping = "Number=int64".parse().unwrap();
//! let out = specialize(src, "number.go", &mapping, &SpecializeOptions::default()).unwrap();
//! assert_eq!(out, "package p\n\nfunc AddInt64(a, b int64) int64 {\n\treturn a + b\n}\n");
//! ```

pub mod analyze;
pub mod context;
pub mod error;
pub mod imports;
pub mod mapping;
pub mod order;
pub mod rename;
pub mod specialize;

pub use error::{ConcreteTypeError, ImportError, MappingError, SpecializeError};
pub use imports::organize_imports;
pub use mapping::{ConcreteType, TypeMapping};
pub use specialize::{specialize, SpecializeOptions, GENERATED_HEADER};
