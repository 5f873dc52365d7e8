//! # Go Syntax Tree
//!
//! Arena-allocated syntax tree for Go source files.
//!
//! ## Architecture
//!
//! - **Nodes**: every statement, expression, type, field and declaration lives in a
//!   typed arena (`SpannedArena<T>`) and is referred to by a typed `Id<T>`
//! - **Lists**: child lists are slices of centralized buffers (`ExtraData`) addressed
//!   by `ListRef<T>`; an element of such a buffer can itself be addressed by `Id<T>`
//! - **Spans**: byte offsets into the source; `Span::NONE` marks a cleared position
//! - **Symbols**: identifiers, literal text and comment text are interned
//!
//! Every position-bearing node derives `ClearSpans` so that the position pass in
//! [`crate::positions`] can sweep the arena without a hand-written visitor.
//!
//! The tree models Go syntax only. Nothing here knows about types or scopes;
//! identifier resolution lives in [`crate::resolve`].

use ast_derive::ClearSpans;
use core::marker::PhantomData;
use core::ops::{Index, IndexMut};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::hash::{BuildHasher, BuildHasherDefault, Hasher, RandomState};

// =============================================================================
// Core Foundation Types
// =============================================================================

/// Byte range in the source text.
///
/// Offsets are `u32`, limiting inputs to 4GiB. Valid positions start at 1 for
/// synthesized trees and at 0 for parsed ones; `end == 0` always means "no position".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// The absent position. Printers lay such nodes out canonically.
    pub const NONE: Span = Span { start: 0, end: 0 };

    /// Creates a new span from usize positions.
    ///
    /// # Panics
    /// In debug builds, panics if positions exceed `u32::MAX`.
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= u32::MAX as usize);
        debug_assert!(end <= u32::MAX as usize);
        Self {
            start: start as u32,
            end: end as u32,
        }
    }

    /// Zero-width span at `pos`.
    #[inline]
    pub fn empty_at(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    #[inline]
    pub const fn is_none(&self) -> bool {
        self.end == 0
    }

    #[inline]
    pub const fn is_valid(&self) -> bool {
        !self.is_none()
    }

    /// Returns the length of the span.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Checks if the span is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest span covering both. A cleared side is ignored.
    #[inline]
    pub fn to(self, other: Span) -> Span {
        match (self.is_none(), other.is_none()) {
            (true, _) => other,
            (_, true) => self,
            _ => Span {
                start: self.start.min(other.start),
                end: self.end.max(other.end),
            },
        }
    }
}

/// Type-safe identifier for arena-allocated nodes and list-buffer elements.
///
/// The phantom marker ensures type safety at compile time.
#[repr(transparent)]
pub struct Id<T> {
    raw: u32,
    _marker: PhantomData<fn() -> T>,
}

// `T` is only a marker, so none of these impls bound it.
impl<T> Copy for Id<T> {}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<T> core::hash::Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> core::fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Id({})", self.raw)
    }
}

impl<T> Id<T> {
    /// Creates an ID from a raw u32 value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    /// Converts the ID to usize for indexing.
    #[inline]
    pub const fn to_usize(&self) -> usize {
        self.raw as usize
    }

    /// Returns the raw u32 value.
    #[inline]
    pub const fn raw(&self) -> u32 {
        self.raw
    }
}

/// Typed reference into a centralized list buffer.
///
/// Lists are stored in `AstArena::extras` to avoid per-node allocations.
/// Each `ListRef` points to a contiguous slice in the appropriate buffer.
pub struct ListRef<T> {
    start: u32,
    len: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Copy for ListRef<T> {}

impl<T> PartialEq for ListRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.len == other.len
    }
}

impl<T> Eq for ListRef<T> {}

impl<T> core::fmt::Debug for ListRef<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ListRef({}..{})", self.start, self.end())
    }
}

impl<T> Clone for ListRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Default for ListRef<T> {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl<T> ListRef<T> {
    /// Empty list constant.
    pub const EMPTY: Self = Self {
        start: 0,
        len: 0,
        _marker: PhantomData,
    };

    /// Creates a new list reference.
    #[inline]
    pub const fn new(start: u32, len: u32) -> Self {
        Self {
            start,
            len,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub const fn start(&self) -> u32 {
        self.start
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.len
    }

    /// Returns the end index (exclusive).
    #[inline]
    pub const fn end(&self) -> u32 {
        self.start + self.len
    }

    /// Absolute handle of the `i`th element, usable after the list is re-read.
    #[inline]
    pub fn id(&self, i: usize) -> Id<T> {
        debug_assert!(i < self.len as usize);
        Id::from_raw(self.start + i as u32)
    }

    /// Absolute handles of every element, in order.
    pub fn ids(&self) -> impl Iterator<Item = Id<T>> + '_ {
        (self.start..self.end()).map(Id::from_raw)
    }
}

// =============================================================================
// Symbol Interning System
// =============================================================================

/// Interned string symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Symbol(u32);

/// Type alias for identifier symbols.
pub type Ident = Symbol;

impl Symbol {
    /// Creates a symbol from a raw u32 value.
    #[inline]
    pub const fn from_raw(v: u32) -> Self {
        Self(v)
    }

    /// Returns the raw u32 value.
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

/// Identifier occurrence (interned symbol + source position).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub struct IdentName {
    pub sym: Ident,
    pub pos: Span,
}

impl IdentName {
    #[inline]
    pub const fn new(sym: Ident, pos: Span) -> Self {
        Self { sym, pos }
    }

    /// An identifier with no source position.
    #[inline]
    pub const fn synthetic(sym: Ident) -> Self {
        Self {
            sym,
            pos: Span::NONE,
        }
    }
}

/// Identity hasher for u64 values (used for symbol hash buckets).
#[derive(Default)]
struct U64IdentityHasher(u64);

impl Hasher for U64IdentityHasher {
    fn write(&mut self, _b: &[u8]) {
        unreachable!("U64IdentityHasher only supports write_u64")
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.0 = i;
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }
}

type U64IdentityBuild = BuildHasherDefault<U64IdentityHasher>;

/// String interner for identifiers, literal text and comment text.
#[derive(Debug, Default)]
pub struct Interner {
    strings: Vec<Box<str>>,
    buckets: HashMap<u64, SmallVec<[Symbol; 1]>, U64IdentityBuild>,
    state: RandomState,
}

impl Interner {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a string and returns its symbol.
    ///
    /// If the string already exists, returns the existing symbol.
    pub fn intern(&mut self, s: &str) -> Symbol {
        let h = self.state.hash_one(s);
        let entry = self.buckets.entry(h).or_default();

        for &sym in entry.iter() {
            if self.strings[sym.0 as usize].as_ref() == s {
                return sym;
            }
        }

        let sym = Symbol(self.strings.len() as u32);
        self.strings.push(s.into());
        entry.push(sym);
        sym
    }

    /// Looks a string up without interning it.
    pub fn get(&self, s: &str) -> Option<Symbol> {
        let h = self.state.hash_one(s);
        self.buckets
            .get(&h)?
            .iter()
            .copied()
            .find(|sym| self.strings[sym.0 as usize].as_ref() == s)
    }

    /// Resolves a symbol back to its string.
    ///
    /// Symbols are only handed out by `intern`, so an unknown symbol resolves to "".
    #[inline]
    pub fn resolve(&self, sym: Symbol) -> &str {
        debug_assert!((sym.0 as usize) < self.strings.len());
        self.strings.get(sym.0 as usize).map_or("", |s| s.as_ref())
    }
}

// =============================================================================
// Arena Allocation
// =============================================================================

/// Arena for nodes with associated spans.
///
/// Stores nodes and their spans in parallel vectors for cache efficiency.
#[derive(Debug)]
pub struct SpannedArena<T> {
    data: Vec<T>,
    spans: Vec<Span>,
}

impl<T> Default for SpannedArena<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            spans: Vec::new(),
        }
    }
}

impl<T> SpannedArena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a node with its span and returns an ID.
    #[inline]
    pub fn alloc(&mut self, node: T, span: Span) -> Id<T> {
        let id = Id::from_raw(self.data.len() as u32);
        self.data.push(node);
        self.spans.push(span);
        id
    }

    #[inline]
    pub fn get(&self, id: Id<T>) -> &T {
        &self.data[id.to_usize()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: Id<T>) -> &mut T {
        &mut self.data[id.to_usize()]
    }

    /// Gets the span for a node.
    #[inline]
    pub fn span(&self, id: Id<T>) -> Span {
        self.spans[id.to_usize()]
    }

    #[inline]
    pub fn set_span(&mut self, id: Id<T>, span: Span) {
        self.spans[id.to_usize()] = span;
    }

    /// Every node, in allocation order.
    pub fn nodes_mut(&mut self) -> core::slice::IterMut<'_, T> {
        self.data.iter_mut()
    }

    /// Resets the side table to `Span::NONE`.
    pub fn clear_spans(&mut self) {
        self.spans.fill(Span::NONE);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T> Index<Id<T>> for SpannedArena<T> {
    type Output = T;
    fn index(&self, id: Id<T>) -> &T {
        self.get(id)
    }
}

impl<T> IndexMut<Id<T>> for SpannedArena<T> {
    fn index_mut(&mut self, id: Id<T>) -> &mut T {
        self.get_mut(id)
    }
}

// =============================================================================
// Type Aliases for Node IDs
// =============================================================================

pub type DeclId = Id<GenDecl>;
pub type StmtId = Id<Stmt>;
pub type SimpleStmtId = Id<SimpleStmt>;
pub type ExprId = Id<Expr>;
pub type TypeId = Id<Type>;
pub type FieldId = Id<Field>;
pub type SignatureId = Id<Signature>;
pub type FuncDeclId = Id<FuncDecl>;
pub type SwitchClauseId = Id<SwitchClause>;
pub type CommClauseId = Id<CommClause>;
pub type TypeParamsId = Id<TypeParams>;
pub type TypeParamDeclId = Id<TypeParamDecl>;
pub type CommentId = Id<Comment>;
pub type CommentGroupId = Id<CommentGroup>;

/// Absolute handle of a spec inside `ExtraData::specs`.
pub type SpecId = Id<Spec>;
/// Absolute handle of a composite-literal element inside `ExtraData::keyed_elems`.
pub type ElementId = Id<KeyedElement>;
/// Absolute handle of an interface element inside `ExtraData::interface_elems`.
pub type InterfaceElemId = Id<InterfaceElem>;

// =============================================================================
// Centralized List Storage
// =============================================================================

/// Extra data storage for all list types.
///
/// This structure holds all the centralized buffers that `ListRef<T>` points into.
#[derive(Debug, Default)]
pub struct ExtraData {
    pub ident_names: Vec<IdentName>,
    pub exprs: Vec<ExprId>,
    pub stmts: Vec<StmtId>,
    pub types: Vec<TypeId>,
    pub fields: Vec<FieldId>,
    pub specs: Vec<Spec>,
    pub keyed_elems: Vec<KeyedElement>,
    pub top_decls: Vec<TopLevelDecl>,
    pub switch_clause_ids: Vec<SwitchClauseId>,
    pub comm_clause_ids: Vec<CommClauseId>,
    pub type_case_elems: Vec<TypeCaseElem>,
    pub type_terms: Vec<TypeTerm>,
    pub interface_elems: Vec<InterfaceElem>,
    pub type_param_decl_ids: Vec<TypeParamDeclId>,
    pub comment_ids: Vec<CommentId>,
    pub comment_group_ids: Vec<CommentGroupId>,
    pub expr_or_types: Vec<ExprOrType>,
}

// =============================================================================
// Main AST Arena
// =============================================================================

/// Central arena holding all AST nodes and list buffers.
#[derive(Debug, Default)]
pub struct AstArena {
    pub decls: SpannedArena<GenDecl>,
    pub stmts: SpannedArena<Stmt>,
    pub simple_stmts: SpannedArena<SimpleStmt>,
    pub exprs: SpannedArena<Expr>,
    pub types: SpannedArena<Type>,
    pub signatures: SpannedArena<Signature>,
    pub funcs: SpannedArena<FuncDecl>,
    pub fields: SpannedArena<Field>,
    pub switch_clauses: SpannedArena<SwitchClause>,
    pub comm_clauses: SpannedArena<CommClause>,
    pub type_params: SpannedArena<TypeParams>,
    pub type_param_decls: SpannedArena<TypeParamDecl>,
    pub comments: SpannedArena<Comment>,
    pub comment_groups: SpannedArena<CommentGroup>,
    pub extras: ExtraData,
}

macro_rules! list_buffers {
    ($($buf:ident: $elem:ty => $build:ident, $get:ident, $get_mut:ident;)*) => {
        impl AstArena {
            $(
                pub fn $build(&mut self, i: impl IntoIterator<Item = $elem>) -> ListRef<$elem> {
                    Self::push_list(&mut self.extras.$buf, i)
                }

                pub fn $get(&self, r: ListRef<$elem>) -> &[$elem] {
                    Self::slice(&self.extras.$buf, r)
                }

                pub fn $get_mut(&mut self, r: ListRef<$elem>) -> &mut [$elem] {
                    Self::slice_mut(&mut self.extras.$buf, r)
                }
            )*
        }
    };
}

list_buffers! {
    ident_names: IdentName => list_ident_names, ident_names, ident_names_mut;
    exprs: ExprId => list_exprs, exprs_list, exprs_list_mut;
    stmts: StmtId => list_stmts, stmts_list, stmts_list_mut;
    types: TypeId => list_types, types_list, types_list_mut;
    fields: FieldId => list_fields, fields_list, fields_list_mut;
    specs: Spec => list_specs, specs_list, specs_list_mut;
    keyed_elems: KeyedElement => list_keyed_elems, keyed_elems_list, keyed_elems_list_mut;
    top_decls: TopLevelDecl => list_top_decls, top_decls, top_decls_mut;
    switch_clause_ids: SwitchClauseId => list_switch_clause_ids, switch_clause_ids, switch_clause_ids_mut;
    comm_clause_ids: CommClauseId => list_comm_clause_ids, comm_clause_ids, comm_clause_ids_mut;
    type_case_elems: TypeCaseElem => list_type_cases, type_case_elems, type_case_elems_mut;
    type_terms: TypeTerm => list_type_terms, type_terms, type_terms_mut;
    interface_elems: InterfaceElem => list_interface_elems, interface_elems, interface_elems_mut;
    type_param_decl_ids: TypeParamDeclId => list_type_param_decl_ids, type_param_decl_ids, type_param_decl_ids_mut;
    comment_ids: CommentId => list_comment_ids, comment_ids, comment_ids_mut;
    comment_group_ids: CommentGroupId => list_comment_group_ids, comment_group_ids, comment_group_ids_mut;
    expr_or_types: ExprOrType => list_expr_or_types, expr_or_types, expr_or_types_mut;
}

impl AstArena {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn push_list<T>(buf: &mut Vec<T>, items: impl IntoIterator<Item = T>) -> ListRef<T> {
        let start = buf.len();
        buf.extend(items);
        let len = buf.len() - start;
        debug_assert!(start <= u32::MAX as usize);
        debug_assert!(len <= u32::MAX as usize);
        ListRef::new(start as u32, len as u32)
    }

    #[inline]
    fn slice<T>(buf: &[T], r: ListRef<T>) -> &[T] {
        &buf[r.start() as usize..r.end() as usize]
    }

    #[inline]
    fn slice_mut<T>(buf: &mut [T], r: ListRef<T>) -> &mut [T] {
        &mut buf[r.start() as usize..r.end() as usize]
    }

    // Element handles into list buffers

    pub fn spec(&self, id: SpecId) -> &Spec {
        &self.extras.specs[id.to_usize()]
    }

    pub fn spec_mut(&mut self, id: SpecId) -> &mut Spec {
        &mut self.extras.specs[id.to_usize()]
    }

    pub fn element(&self, id: ElementId) -> &KeyedElement {
        &self.extras.keyed_elems[id.to_usize()]
    }

    pub fn element_mut(&mut self, id: ElementId) -> &mut KeyedElement {
        &mut self.extras.keyed_elems[id.to_usize()]
    }

    pub fn interface_elem(&self, id: InterfaceElemId) -> &InterfaceElem {
        &self.extras.interface_elems[id.to_usize()]
    }

    pub fn interface_elem_mut(&mut self, id: InterfaceElemId) -> &mut InterfaceElem {
        &mut self.extras.interface_elems[id.to_usize()]
    }

    /// Concatenated text of a comment group, one comment per line.
    pub fn comment_group_text(&self, interner: &Interner, id: CommentGroupId) -> String {
        let group = self.comment_groups[id];
        let mut out = String::new();
        for (i, &c) in self.comment_ids(group.comments).iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(interner.resolve(self.comments[c].text));
        }
        out
    }
}

// =============================================================================
// Comments
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    Line,
    Block,
}

/// One comment, including its `//` or `/* */` markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub struct Comment {
    pub kind: CommentKind,
    pub text: Symbol,
}

/// Run of comments with no blank line or token between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub struct CommentGroup {
    pub comments: ListRef<CommentId>,
}

// =============================================================================
// Source File / Top-Level Declarations
// =============================================================================

/// Root of a parsed (or synthesized) file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub struct SourceFile {
    pub doc: Option<CommentGroupId>,
    pub package_pos: Span,
    pub name: IdentName,
    pub decls: ListRef<TopLevelDecl>,
    /// Every comment group in the file, in source order.
    pub comments: ListRef<CommentGroupId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub enum TopLevelDecl {
    Decl(DeclId),
    Func(FuncDeclId),
}

/// `import`, `const`, `type` or `var` declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub struct GenDecl {
    pub doc: Option<CommentGroupId>,
    pub kw_pos: Span,
    pub kind: GenDeclKind,
    /// Present iff the specs are parenthesized.
    pub l_paren: Option<Span>,
    pub specs: ListRef<Spec>,
    pub r_paren: Option<Span>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenDeclKind {
    Import,
    Const,
    Type,
    Var,
}

impl GenDeclKind {
    pub const fn keyword(self) -> &'static str {
        match self {
            GenDeclKind::Import => "import",
            GenDeclKind::Const => "const",
            GenDeclKind::Type => "type",
            GenDeclKind::Var => "var",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub enum Spec {
    Import(ImportSpec),
    Value(ValueSpec),
    Type(TypeSpec),
}

impl Spec {
    pub fn doc(&self) -> Option<CommentGroupId> {
        match self {
            Spec::Import(s) => s.doc,
            Spec::Value(s) => s.doc,
            Spec::Type(s) => s.doc,
        }
    }

    pub fn set_doc(&mut self, doc: Option<CommentGroupId>) {
        match self {
            Spec::Import(s) => s.doc = doc,
            Spec::Value(s) => s.doc = doc,
            Spec::Type(s) => s.doc = doc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub struct ImportSpec {
    pub doc: Option<CommentGroupId>,
    pub name: Option<ImportName>,
    pub path: StringLit,
    pub comment: Option<CommentGroupId>,
}

/// Local name of an import: `.`, `_` or an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub enum ImportName {
    Dot(Span),
    Blank(Span),
    Name(IdentName),
}

/// `const` / `var` spec: `a, b T = x, y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub struct ValueSpec {
    pub doc: Option<CommentGroupId>,
    pub names: ListRef<IdentName>,
    pub typ: Option<TypeId>,
    pub assign_pos: Option<Span>,
    pub values: ListRef<ExprId>,
    pub comment: Option<CommentGroupId>,
}

/// `Name[TypeParams] Type` or, when `assign_pos` is set, `Name = Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub struct TypeSpec {
    pub doc: Option<CommentGroupId>,
    pub name: IdentName,
    pub type_params: Option<TypeParamsId>,
    pub assign_pos: Option<Span>,
    pub typ: TypeId,
    pub comment: Option<CommentGroupId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub struct FuncDecl {
    pub doc: Option<CommentGroupId>,
    pub func_pos: Span,
    pub recv: Option<Receiver>,
    pub name: IdentName,
    pub type_params: Option<TypeParamsId>,
    pub signature: SignatureId,
    pub body: Option<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub struct TypeParams {
    pub l_brack: Span,
    pub params: ListRef<TypeParamDeclId>,
    pub r_brack: Span,
}

/// `K, V Constraint` inside a type parameter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub struct TypeParamDecl {
    pub names: ListRef<IdentName>,
    pub constraint: TypeId,
}

/// Method receiver. A generic receiver carries its parameters as `Type::Named` args.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub struct Receiver {
    pub l_paren: Span,
    pub name: Option<IdentName>,
    pub typ: TypeId,
    pub r_paren: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub struct Signature {
    pub params: FieldList,
    pub results: Option<Results>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub enum Results {
    Params(FieldList),
    Type(TypeId),
}

/// Parenthesized parameter list, or the braces of a struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub struct FieldList {
    pub open: Span,
    pub fields: ListRef<FieldId>,
    pub close: Span,
}

/// Struct field or parameter. No names means embedded field / unnamed parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub struct Field {
    pub doc: Option<CommentGroupId>,
    pub names: ListRef<IdentName>,
    pub ellipsis_pos: Option<Span>,
    pub typ: TypeId,
    pub tag: Option<StringLit>,
    pub comment: Option<CommentGroupId>,
}

// =============================================================================
// Statements
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub enum SimpleStmt {
    Expr(ExprId),
    Send {
        chan: ExprId,
        arrow_pos: Span,
        value: ExprId,
    },
    IncDec {
        expr: ExprId,
        op: IncDecOp,
        op_pos: Span,
    },
    Assign {
        lhs: ListRef<ExprId>,
        op: AssignOp,
        op_pos: Span,
        rhs: ListRef<ExprId>,
    },
    ShortVarDecl {
        names: ListRef<IdentName>,
        op_pos: Span,
        values: ListRef<ExprId>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub enum Stmt {
    Empty(Span),
    Simple(SimpleStmtId),
    Decl(DeclId),
    Labeled {
        label: IdentName,
        colon_pos: Span,
        stmt: StmtId,
    },
    Go {
        go_pos: Span,
        call: ExprId,
    },
    Defer {
        defer_pos: Span,
        call: ExprId,
    },
    Return {
        return_pos: Span,
        results: ListRef<ExprId>,
    },
    Branch(BranchStmt),
    Block(Block),
    If {
        if_pos: Span,
        init: Option<SimpleStmtId>,
        cond: ExprId,
        then_block: Block,
        else_stmt: Option<StmtId>,
    },
    For {
        for_pos: Span,
        kind: ForKind,
        body: Block,
    },
    Switch {
        switch_pos: Span,
        init: Option<SimpleStmtId>,
        tag: Option<ExprId>,
        l_brace: Span,
        clauses: ListRef<SwitchClauseId>,
        r_brace: Span,
    },
    TypeSwitch {
        switch_pos: Span,
        init: Option<SimpleStmtId>,
        guard: TypeSwitchGuard,
        l_brace: Span,
        clauses: ListRef<SwitchClauseId>,
        r_brace: Span,
    },
    Select {
        select_pos: Span,
        l_brace: Span,
        clauses: ListRef<CommClauseId>,
        r_brace: Span,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub enum ForKind {
    Infinite,
    Cond(ExprId),
    Clause {
        init: Option<SimpleStmtId>,
        cond: Option<ExprId>,
        post: Option<SimpleStmtId>,
    },
    Range {
        lhs: Option<RangeLhs>,
        range_pos: Span,
        expr: ExprId,
    },
}

/// Left side of `range` or of a receive in a `select` case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub enum RangeLhs {
    Define {
        names: ListRef<IdentName>,
        op_pos: Span,
    },
    Assign {
        exprs: ListRef<ExprId>,
        op_pos: Span,
    },
}

/// `case` clause of an expression or type switch. Empty `items` is `default:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub enum SwitchClause {
    Expr {
        case_pos: Span,
        items: ListRef<ExprId>,
        colon_pos: Span,
        stmts: ListRef<StmtId>,
    },
    Type {
        case_pos: Span,
        items: ListRef<TypeCaseElem>,
        colon_pos: Span,
        stmts: ListRef<StmtId>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub enum CommClause {
    Case {
        case_pos: Span,
        comm: CommStmt,
        colon_pos: Span,
        stmts: ListRef<StmtId>,
    },
    Default {
        default_pos: Span,
        colon_pos: Span,
        stmts: ListRef<StmtId>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub enum CommStmt {
    Send {
        chan: ExprId,
        arrow_pos: Span,
        value: ExprId,
    },
    Recv {
        lhs: Option<RangeLhs>,
        expr: ExprId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    Break,
    Continue,
    Goto,
    Fallthrough,
}

impl BranchKind {
    pub const fn keyword(self) -> &'static str {
        match self {
            BranchKind::Break => "break",
            BranchKind::Continue => "continue",
            BranchKind::Goto => "goto",
            BranchKind::Fallthrough => "fallthrough",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub struct BranchStmt {
    pub kind: BranchKind,
    pub pos: Span,
    pub label: Option<IdentName>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub struct Block {
    pub l_brace: Span,
    pub stmts: ListRef<StmtId>,
    pub r_brace: Span,
}

/// `[bind :=] x.(type)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub struct TypeSwitchGuard {
    pub bind: Option<IdentName>,
    pub define_pos: Option<Span>,
    pub expr: ExprId,
    pub dot_pos: Span,
    pub l_paren: Span,
    pub r_paren: Span,
}

// =============================================================================
// Composite Literals
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub struct LiteralValue {
    pub l_brace: Span,
    pub elements: ListRef<KeyedElement>,
    pub r_brace: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub struct KeyedElement {
    pub key: Option<Key>,
    pub colon_pos: Option<Span>,
    pub value: Element,
}

/// Element key. A struct field name parses as `Key::Expr(Expr::Ident)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub enum Key {
    Expr(ExprId),
    Literal(LiteralValue),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub enum Element {
    Expr(ExprId),
    Literal(LiteralValue),
}

// =============================================================================
// Expressions
// =============================================================================

/// Call argument or index operand, which may syntactically be a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub enum ExprOrType {
    Expr(ExprId),
    Type(TypeId),
}

/// A callee is a type for conversions such as `[]byte(s)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub enum CallCallee {
    Expr(ExprId),
    Type(TypeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub enum Expr {
    Ident(IdentName),
    BasicLit(BasicLit),
    FuncLit {
        func_pos: Span,
        sig: SignatureId,
        body: Block,
    },
    CompositeLit {
        typ: TypeId,
        lit: LiteralValue,
    },
    /// `a[i]` or an instantiation `f[int, string]`.
    Index {
        expr: ExprId,
        l_brack: Span,
        args: ListRef<ExprOrType>,
        r_brack: Span,
    },
    Paren {
        l_paren: Span,
        expr: ExprId,
        r_paren: Span,
    },
    Selector {
        expr: ExprId,
        dot_pos: Span,
        sel: IdentName,
    },
    Slice {
        expr: ExprId,
        l_brack: Span,
        lo: Option<ExprId>,
        hi: Option<ExprId>,
        max: Option<ExprId>,
        r_brack: Span,
    },
    /// `x.(T)`; `typ == None` is `x.(type)` inside a type switch.
    TypeAssert {
        expr: ExprId,
        dot_pos: Span,
        l_paren: Span,
        typ: Option<TypeId>,
        r_paren: Span,
    },
    Call {
        callee: CallCallee,
        l_paren: Span,
        args: ListRef<ExprOrType>,
        ellipsis: Option<Span>,
        r_paren: Span,
    },
    Unary {
        op: UnaryOp,
        op_pos: Span,
        expr: ExprId,
    },
    Binary {
        left: ExprId,
        op: BinaryOp,
        op_pos: Span,
        right: ExprId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub struct BasicLit {
    pub kind: BasicLitKind,
    /// Literal text exactly as written, quotes included.
    pub value: Symbol,
    pub pos: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicLitKind {
    Int,
    Float,
    Imag,
    Rune,
    String,
}

/// String literal in an import path or struct tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub struct StringLit {
    pub value: Symbol,
    pub pos: Span,
}

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub enum Type {
    /// `T`, `pkg.T`, `T[int]`.
    Named {
        pkg: Option<IdentName>,
        name: IdentName,
        l_brack: Option<Span>,
        args: ListRef<TypeId>,
        r_brack: Option<Span>,
    },
    Pointer {
        star_pos: Span,
        elem: TypeId,
    },
    Array {
        l_brack: Span,
        len: ArrayLen,
        r_brack: Span,
        elem: TypeId,
    },
    Slice {
        l_brack: Span,
        r_brack: Span,
        elem: TypeId,
    },
    Map {
        map_pos: Span,
        l_brack: Span,
        key: TypeId,
        r_brack: Span,
        value: TypeId,
    },
    Chan {
        dir: ChanDir,
        chan_pos: Span,
        arrow_pos: Option<Span>,
        elem: TypeId,
    },
    Struct {
        struct_pos: Span,
        fields: FieldList,
    },
    Interface {
        interface_pos: Span,
        l_brace: Span,
        elems: ListRef<InterfaceElem>,
        r_brace: Span,
    },
    Func {
        func_pos: Span,
        sig: SignatureId,
    },
    Paren {
        l_paren: Span,
        typ: TypeId,
        r_paren: Span,
    },
    /// Constraint union `~int | string`, also used for a lone `~T`.
    Union {
        terms: ListRef<TypeTerm>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub enum ArrayLen {
    Expr(ExprId),
    Ellipsis(Span),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub enum TypeCaseElem {
    Type(TypeId),
    Nil(Span),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub struct TypeTerm {
    pub tilde: Option<Span>,
    pub typ: TypeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ClearSpans)]
pub enum InterfaceElem {
    Method {
        name: IdentName,
        sig: SignatureId,
    },
    /// Embedded interface or type-set element.
    Embed(TypeId),
}

// =============================================================================
// Operators
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    Xor,
    Deref,
    Addr,
    Recv,
}

impl UnaryOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "!",
            UnaryOp::Xor => "^",
            UnaryOp::Deref => "*",
            UnaryOp::Addr => "&",
            UnaryOp::Recv => "<-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    LOr,
    LAnd,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Or,
    Xor,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    And,
    AndNot,
}

impl BinaryOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            BinaryOp::LOr => "||",
            BinaryOp::LAnd => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::And => "&",
            BinaryOp::AndNot => "&^",
        }
    }

    /// Go operator precedence, 1 (`||`) through 5 (`*`).
    pub const fn precedence(self) -> u8 {
        match self {
            BinaryOp::LOr => 1,
            BinaryOp::LAnd => 2,
            BinaryOp::Eq
            | BinaryOp::NotEq
            | BinaryOp::Lt
            | BinaryOp::LtEq
            | BinaryOp::Gt
            | BinaryOp::GtEq => 3,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Or | BinaryOp::Xor => 4,
            BinaryOp::Mul
            | BinaryOp::Div
            | BinaryOp::Rem
            | BinaryOp::Shl
            | BinaryOp::Shr
            | BinaryOp::And
            | BinaryOp::AndNot => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    RemAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    ShlAssign,
    ShrAssign,
    AndNotAssign,
}

impl AssignOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
            AssignOp::MulAssign => "*=",
            AssignOp::DivAssign => "/=",
            AssignOp::RemAssign => "%=",
            AssignOp::AndAssign => "&=",
            AssignOp::OrAssign => "|=",
            AssignOp::XorAssign => "^=",
            AssignOp::ShlAssign => "<<=",
            AssignOp::ShrAssign => ">>=",
            AssignOp::AndNotAssign => "&^=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncDecOp {
    Inc,
    Dec,
}

impl IncDecOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            IncDecOp::Inc => "++",
            IncDecOp::Dec => "--",
        }
    }
}

/// Output of [`crate::parse_file`]: the tree plus everything needed to read it.
#[derive(Debug)]
pub struct ParsedFile {
    pub arena: AstArena,
    pub interner: Interner,
    pub file: SourceFile,
    pub lines: crate::error::LineIndex,
}

impl ParsedFile {
    /// Text of an interned symbol.
    #[inline]
    pub fn text(&self, sym: Symbol) -> &str {
        self.interner.resolve(sym)
    }
}
