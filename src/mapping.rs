//! Type-mapping strings: `Placeholder=ConcreteSpec,...`.
//!
//! A concrete spec is one of
//!
//! ```text
//! Name                       same package
//! import/path.Name           package name taken from the last path element
//! ("import/path")alias.Name  explicit package name
//! ```
//!
//! and any of them may be prefixed with `*` to substitute a pointer.

use std::fmt;
use std::str::FromStr;

use crate::error::{ConcreteTypeError, MappingError};

/// The type that replaces one placeholder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConcreteType {
    /// Import path of the defining package, empty for the current package.
    pub import_path: String,
    /// Name the package is referred to by in generated code.
    pub package_alias: String,
    pub type_name: String,
    pub is_pointer: bool,
    /// The alias was spelled out with the `("path")alias.Name` form.
    pub is_aliased_import: bool,
}

impl ConcreteType {
    /// A type from the current package.
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            type_name: name.into(),
            ..Self::default()
        }
    }

    pub fn has_import(&self) -> bool {
        !self.import_path.is_empty()
    }
}

impl FromStr for ConcreteType {
    type Err = ConcreteTypeError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let (is_pointer, s) = match spec.strip_prefix('*') {
            Some(rest) => (true, rest),
            None => (false, spec),
        };

        let Some(dot) = s.rfind('.') else {
            return validate(ConcreteType {
                type_name: s.to_owned(),
                is_pointer,
                ..ConcreteType::default()
            });
        };
        let package_part = &s[..dot];
        let type_name = &s[dot + 1..];

        let (import_path, package_alias, is_aliased_import) =
            if let Some(quoted) = package_part.strip_prefix("(\"") {
                let Some(close) = quoted.rfind("\")") else {
                    return Err(ConcreteTypeError::Unclosed {
                        spec: spec.to_owned(),
                    });
                };
                (&quoted[..close], &quoted[close + 2..], true)
            } else {
                let alias = match package_part.rfind('/') {
                    Some(slash) => &package_part[slash + 1..],
                    None => package_part,
                };
                (package_part, alias, false)
            };
        if import_path.is_empty() {
            return Err(ConcreteTypeError::EmptyPath {
                spec: spec.to_owned(),
            });
        }

        validate(ConcreteType {
            import_path: import_path.to_owned(),
            package_alias: package_alias.to_owned(),
            type_name: type_name.to_owned(),
            is_pointer,
            is_aliased_import,
        })
    }
}

fn validate(t: ConcreteType) -> Result<ConcreteType, ConcreteTypeError> {
    if let Err(at) = check_identifier(&t.type_name) {
        return Err(ConcreteTypeError::TypeName {
            name: t.type_name,
            at,
        });
    }
    if !t.package_alias.is_empty() {
        if let Err(at) = check_identifier(&t.package_alias) {
            return Err(ConcreteTypeError::PackageName {
                name: t.package_alias,
                at,
            });
        }
    }
    Ok(t)
}

impl fmt::Display for ConcreteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_pointer {
            f.write_str("*")?;
        }
        if self.is_aliased_import {
            write!(f, "(\"{}\"){}.", self.import_path, self.package_alias)?;
        } else if self.has_import() {
            write!(f, "{}.", self.import_path)?;
        }
        f.write_str(&self.type_name)
    }
}

/// Checks `s` against Go's identifier grammar: a letter or `_`, then
/// letters, digits and `_`. On failure returns the byte offset of the first
/// offending character (0 for an empty string).
pub fn check_identifier(s: &str) -> Result<(), usize> {
    let mut chars = s.char_indices();
    match chars.next() {
        None => return Err(0),
        Some((_, c)) if c == '_' || unicode_ident::is_xid_start(c) => {}
        Some(_) => return Err(0),
    }
    match chars.find(|&(_, c)| !unicode_ident::is_xid_continue(c)) {
        Some((at, _)) => Err(at),
        None => Ok(()),
    }
}

pub fn is_identifier(s: &str) -> bool {
    check_identifier(s).is_ok()
}

/// Placeholder names and their concrete types, in the order given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeMapping {
    entries: Vec<(String, ConcreteType)>,
}

impl TypeMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a comma separated list of `Placeholder=ConcreteSpec` pairs.
    pub fn parse(s: &str) -> Result<Self, MappingError> {
        let mut mapping = Self::new();
        for pair in s.split(',') {
            let pair = pair.trim();
            let Some((name, spec)) = pair.split_once('=') else {
                return Err(MappingError::Malformed {
                    pair: pair.to_owned(),
                });
            };
            if !is_identifier(name) {
                return Err(MappingError::Placeholder {
                    pair: pair.to_owned(),
                    name: name.to_owned(),
                });
            }
            let concrete = spec.parse().map_err(|source| MappingError::Concrete {
                pair: pair.to_owned(),
                source,
            })?;
            mapping.insert(name, concrete)?;
        }
        Ok(mapping)
    }

    /// Adds one placeholder. A placeholder may be mapped once.
    pub fn insert(
        &mut self,
        placeholder: impl Into<String>,
        concrete: ConcreteType,
    ) -> Result<(), MappingError> {
        let placeholder = placeholder.into();
        if self.get(&placeholder).is_some() {
            return Err(MappingError::Duplicate { name: placeholder });
        }
        self.entries.push((placeholder, concrete));
        Ok(())
    }

    pub fn get(&self, placeholder: &str) -> Option<&ConcreteType> {
        self.entries
            .iter()
            .find(|(name, _)| name == placeholder)
            .map(|(_, t)| t)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConcreteType)> {
        self.entries.iter().map(|(name, t)| (name.as_str(), t))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromStr for TypeMapping {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn concrete(path: &str, alias: &str, name: &str) -> ConcreteType {
        ConcreteType {
            import_path: path.to_owned(),
            package_alias: alias.to_owned(),
            type_name: name.to_owned(),
            ..ConcreteType::default()
        }
    }

    #[test]
    fn identifiers() {
        for ok in ["Type", "a", "_x9", "ThisVariableIsExported", "αβ"] {
            assert_eq!(check_identifier(ok), Ok(()), "{ok}");
        }
        assert_eq!(check_identifier("(foo)"), Err(0));
        assert_eq!(check_identifier("12foo"), Err(0));
        assert_eq!(check_identifier(""), Err(0));
        assert_eq!(check_identifier("foo."), Err(3));
        assert_eq!(check_identifier("go-test"), Err(2));
    }

    #[test]
    fn concrete_forms() {
        assert_eq!("Concrete".parse::<ConcreteType>(), Ok(ConcreteType::local("Concrete")));
        assert_eq!("pkg.Concrete".parse::<ConcreteType>(), Ok(concrete("pkg", "pkg", "Concrete")));
        assert_eq!(
            "github.com/user/pkg/subpkg.Concrete".parse::<ConcreteType>(),
            Ok(concrete("github.com/user/pkg/subpkg", "subpkg", "Concrete"))
        );
        assert_eq!(
            r#"("github.com/user/pkg/go-subpkg")subpkg.Concrete"#.parse::<ConcreteType>(),
            Ok(ConcreteType {
                is_aliased_import: true,
                ..concrete("github.com/user/pkg/go-subpkg", "subpkg", "Concrete")
            })
        );
        assert_eq!(
            "*os.File".parse::<ConcreteType>(),
            Ok(ConcreteType {
                is_pointer: true,
                ..concrete("os", "os", "File")
            })
        );
        assert_eq!(
            "*int64".parse::<ConcreteType>(),
            Ok(ConcreteType {
                is_pointer: true,
                ..ConcreteType::local("int64")
            })
        );
    }

    #[test]
    fn malformed_concrete_forms() {
        for bad in [
            "1Concrete",
            "(github.com/user/pkg/go-subpkg)subpkg.Concrete",
            r#""github.com/user/pkg/go-subpkg"subpkg.Concrete"#,
            r#"("github.com/user/pkg/go-subpkg)subpkg.Concrete"#,
            r#"("")pkg.Concrete"#,
            "github.com/user/pkgConcrete",
            "pkg.",
        ] {
            assert!(bad.parse::<ConcreteType>().is_err(), "{bad}");
        }
        assert_eq!(
            r#"("a/b)x.T"#.parse::<ConcreteType>(),
            Err(ConcreteTypeError::Unclosed {
                spec: r#"("a/b)x.T"#.to_owned()
            })
        );
    }

    #[test]
    fn mappings() {
        let m = TypeMapping::parse(
            r#"Type1=github.com/user/pkg.Concrete,Type2=foo/bar.Concrete,Type3=("github.com/user/go-pkg")pkg.Concrete"#,
        )
        .unwrap();
        assert_eq!(m.len(), 3);
        assert_eq!(m.get("Type1"), Some(&concrete("github.com/user/pkg", "pkg", "Concrete")));
        assert_eq!(m.get("Type2"), Some(&concrete("foo/bar", "bar", "Concrete")));
        assert_eq!(m.get("Type3").map(|t| t.package_alias.as_str()), Some("pkg"));
        let names: Vec<_> = m.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["Type1", "Type2", "Type3"]);
    }

    #[test]
    fn rejected_mappings() {
        assert_eq!(
            TypeMapping::parse("Type=Concrete1,Type=Concrete2"),
            Err(MappingError::Duplicate {
                name: "Type".to_owned()
            })
        );
        assert!(matches!(
            TypeMapping::parse("Type->Concrete"),
            Err(MappingError::Malformed { .. })
        ));
        assert!(matches!(
            TypeMapping::parse("1Type=Concrete"),
            Err(MappingError::Placeholder { .. })
        ));
        assert!(matches!(
            TypeMapping::parse("Type=github.com/user/pkgConcrete"),
            Err(MappingError::Concrete { .. })
        ));
        assert!(TypeMapping::parse("").is_err());
    }

    #[test]
    fn error_messages_name_the_pair() {
        let err = TypeMapping::parse("A=B,C=1D").unwrap_err();
        assert_eq!(err.to_string(), "in mapping \"C=1D\": invalid type: \"1D\" (at 0)");
    }

    fn ident() -> impl Strategy<Value = String> {
        "[A-Za-z_][A-Za-z0-9_]{0,8}"
    }

    fn concrete_type() -> impl Strategy<Value = ConcreteType> {
        let path = prop::collection::vec("[a-z][a-z0-9.-]{0,6}", 1..4);
        (ident(), prop::option::of((path, ident())), any::<bool>(), any::<bool>()).prop_map(
            |(name, pkg, is_pointer, aliased)| match pkg {
                None => ConcreteType {
                    is_pointer,
                    ..ConcreteType::local(name)
                },
                Some((segments, alias)) => {
                    let import_path = segments.join("/");
                    let inferred = segments.last().cloned().unwrap_or_default();
                    let aliased = aliased || !is_identifier(&inferred);
                    ConcreteType {
                        package_alias: if aliased { alias } else { inferred },
                        import_path,
                        type_name: name,
                        is_pointer,
                        is_aliased_import: aliased,
                    }
                }
            },
        )
    }

    proptest! {
        #[test]
        fn display_parses_back(t in concrete_type()) {
            let text = t.to_string();
            prop_assert_eq!(text.parse::<ConcreteType>(), Ok(t));
        }

        #[test]
        fn single_pairs_parse(name in ident(), t in concrete_type()) {
            let m = TypeMapping::parse(&format!("{name}={t}")).unwrap();
            prop_assert_eq!(m.get(&name), Some(&t));
        }
    }
}
