//! Per-run analysis state.

use std::collections::{HashMap, HashSet};

use go125_parser::DeclKey;

/// Category of a top-level declaration. Output is emitted in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeclKind {
    Type,
    Const,
    Var,
    Func,
}

/// What references to a retained declaration are rewritten to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replacement {
    /// A plain identifier in the current package.
    Ident(String),
    /// The concrete type standing in for a placeholder.
    Concrete {
        /// Package name to qualify with; `None` for local, builtin or dot-imported types.
        qualifier: Option<String>,
        name: String,
        pointer: bool,
    },
}

impl Replacement {
    /// Name written at a defining occurrence.
    pub fn name(&self) -> &str {
        match self {
            Replacement::Ident(name) | Replacement::Concrete { name, .. } => name,
        }
    }

    /// True when the replacement is a bare identifier and can take the
    /// place of a name without changing the surrounding node.
    pub fn is_ident(&self) -> bool {
        match self {
            Replacement::Ident(_) => true,
            Replacement::Concrete {
                qualifier, pointer, ..
            } => qualifier.is_none() && !pointer,
        }
    }
}

/// Literal substring replacement over a fixed list of `(old, new)` pairs.
///
/// Scans left to right; at each position the first pair in registration
/// order whose `old` matches is applied and scanning resumes after it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Replacer {
    pairs: Vec<(String, String)>,
}

impl Replacer {
    pub fn push(&mut self, old: impl Into<String>, new: impl Into<String>) {
        let old = old.into();
        if !old.is_empty() {
            self.pairs.push((old, new.into()));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn replace(&self, s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        let mut rest = s;
        'scan: while let Some(c) = rest.chars().next() {
            for (old, new) in &self.pairs {
                if let Some(after) = rest.strip_prefix(old.as_str()) {
                    out.push_str(new);
                    rest = after;
                    continue 'scan;
                }
            }
            out.push(c);
            rest = &rest[c.len_utf8()..];
        }
        out
    }
}

pub fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Mutable state of one specialization run.
///
/// Declarations are identified by the position of their defining
/// identifier; value specs by the first of their names.
#[derive(Debug, Default)]
pub struct GenericContext {
    retained: HashMap<DeclKey, DeclKind>,
    placeholders: HashSet<DeclKey>,
    renames: HashMap<DeclKey, Replacement>,
    visited: HashSet<DeclKey>,
    replacer: Replacer,
}

impl GenericContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a placeholder type. It is retained so that references to it
    /// make their declarations dependants, and is visited so the closure
    /// never adds it again.
    pub fn add_placeholder(
        &mut self,
        key: DeclKey,
        placeholder: &str,
        replacement: Replacement,
    ) {
        self.replacer
            .push(lower_first(placeholder), lower_first(replacement.name()));
        self.replacer
            .push(upper_first(placeholder), upper_first(replacement.name()));
        self.retained.insert(key, DeclKind::Type);
        self.placeholders.insert(key);
        self.renames.insert(key, replacement);
        self.visited.insert(key);
    }

    /// Retains a declaration without giving it a new name (methods).
    pub fn retain(&mut self, key: DeclKey, kind: DeclKind) {
        self.retained.insert(key, kind);
        self.visited.insert(key);
    }

    /// Retains a declaration and schedules `names` for renaming through the replacer.
    pub fn retain_renamed<'a>(
        &mut self,
        key: DeclKey,
        kind: DeclKind,
        names: impl IntoIterator<Item = (DeclKey, &'a str)>,
    ) {
        self.retain(key, kind);
        for (name_key, name) in names {
            let renamed = self.replacer.replace(name);
            self.renames.insert(name_key, Replacement::Ident(renamed));
        }
    }

    /// Drops the placeholders from the retained set once renaming is done.
    pub fn prune_placeholders(&mut self) {
        let placeholders = &self.placeholders;
        self.retained.retain(|key, _| !placeholders.contains(key));
    }

    pub fn is_retained(&self, key: DeclKey) -> bool {
        self.retained.contains_key(&key)
    }

    pub fn is_placeholder(&self, key: DeclKey) -> bool {
        self.placeholders.contains(&key)
    }

    pub fn is_visited(&self, key: DeclKey) -> bool {
        self.visited.contains(&key)
    }

    pub fn rename_of(&self, key: DeclKey) -> Option<&Replacement> {
        self.renames.get(&key)
    }

    pub fn replacer(&self) -> &Replacer {
        &self.replacer
    }

    /// Retained declarations of one kind, unordered.
    pub fn retained_of(&self, kind: DeclKind) -> impl Iterator<Item = DeclKey> + '_ {
        self.retained
            .iter()
            .filter(move |&(_, &k)| k == kind)
            .map(|(&key, _)| key)
    }

    pub fn retained_len(&self) -> usize {
        self.retained.len()
    }

    pub fn placeholder_count(&self) -> usize {
        self.placeholders.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replacer(pairs: &[(&str, &str)]) -> Replacer {
        let mut r = Replacer::default();
        for (old, new) in pairs {
            r.push(*old, *new);
        }
        r
    }

    #[test]
    fn first_registered_pair_wins() {
        let r = replacer(&[("type", "concrete"), ("Type", "Concrete")]);
        assert_eq!(r.replace("barType"), "barConcrete");
        assert_eq!(r.replace("typeOfType"), "concreteOfConcrete");
        assert_eq!(
            r.replace("// zeroType is the zero value of Type"),
            "// zeroConcrete is the zero value of Concrete"
        );

        let r = replacer(&[("a", "1"), ("ab", "2")]);
        assert_eq!(r.replace("abab"), "1b1b");
        let r = replacer(&[("ab", "2"), ("a", "1")]);
        assert_eq!(r.replace("abab"), "22");
    }

    #[test]
    fn replacements_do_not_overlap_or_rescan() {
        let r = replacer(&[("number", "int64"), ("Number", "Int64")]);
        assert_eq!(r.replace("ZeroNumber"), "ZeroInt64");
        let r = replacer(&[("aa", "a")]);
        assert_eq!(r.replace("aaaa"), "aa");
        assert_eq!(r.replace("αaaβ"), "αaβ");
    }

    #[test]
    fn case_helpers() {
        assert_eq!(lower_first("Type"), "type");
        assert_eq!(upper_first("int64"), "Int64");
        assert_eq!(upper_first("ärger"), "Ärger");
        assert_eq!(lower_first(""), "");
    }

    #[test]
    fn placeholders_feed_the_replacer_and_leave_on_prune() {
        let mut ctx = GenericContext::new();
        let key = DeclKey(10);
        ctx.add_placeholder(
            key,
            "Reader",
            Replacement::Concrete {
                qualifier: Some("os".to_owned()),
                name: "File".to_owned(),
                pointer: true,
            },
        );
        ctx.retain_renamed(DeclKey(40), DeclKind::Func, [(DeclKey(40), "ReadAllFromReader")]);
        assert_eq!(
            ctx.rename_of(DeclKey(40)),
            Some(&Replacement::Ident("ReadAllFromFile".to_owned()))
        );
        assert!(ctx.is_retained(key) && ctx.is_visited(key));
        ctx.prune_placeholders();
        assert!(!ctx.is_retained(key));
        assert!(ctx.is_placeholder(key));
        assert_eq!(ctx.retained_of(DeclKind::Func).collect::<Vec<_>>(), [DeclKey(40)]);
    }
}
