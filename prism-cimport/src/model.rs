//! Intermediate model — the bridge between the C front-end's AST dump and
//! the emitted Prism source.
//!
//! Types live in an arena owned by [`ImportContext`] and are addressed by
//! [`TypeId`]. Self-referential records (`struct node { struct node *next; }`)
//! never hold direct references to each other; they go through
//! [`Type::Incomplete`] plus the tag table and are resolved by name at emit
//! time.

use std::collections::HashMap;

use crate::platform::Platform;
use crate::prelude;

/// Index of a type in the [`ImportContext`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(u32);

/// A C type as the importer models it.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Void,
    /// The `...` marker of a variadic signature.
    Varargs,
    /// The compiler-builtin `__va_list_tag` record.
    VaList,
    /// Canonical integer name (`char`, `ushort`, `int64`, ...), or an
    /// opaque builtin that renders under its own name.
    Integer(String),
    /// Canonical float name (`float`, `double`, `float80`).
    Float(String),
    Pointer(TypeId),
    /// A missing length means the array decays to a pointer.
    Array { element: TypeId, len: Option<u64> },
    /// A function signature; a trailing [`Type::Varargs`] marks it variadic.
    Function { args: Vec<TypeId>, ret: TypeId },
    Record(Record),
    Enum(EnumDef),
    /// Forward reference to a tagged type, resolved against the tag table at
    /// emit time.
    Incomplete(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Struct,
    Union,
}

/// A struct or union definition.
///
/// An empty field list is a forward declaration. A record with neither tag
/// nor typedef name is anonymous and is only ever rendered inline.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub kind: RecordKind,
    pub tag: Option<String>,
    pub typedef: Option<String>,
    pub fields: Vec<Field>,
}

/// A single record field. Unnamed bitfields keep an empty name.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: TypeId,
    /// Bit width when this is a bitfield.
    pub bitfield: Option<u64>,
}

/// A C enum definition. Member values are kept as the textual constant
/// expressions written in the source, when present.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    pub tag: Option<String>,
    pub typedef: Option<String>,
    pub members: Vec<(String, Option<String>)>,
}

/// A global declaration destined for the output files.
#[derive(Debug, Clone)]
pub enum Declaration {
    Const {
        name: String,
        ty: TypeId,
        value: String,
    },
    Var {
        name: String,
        ty: TypeId,
        dllimport: bool,
    },
    Function {
        name: String,
        ret: TypeId,
        args: Vec<(String, TypeId)>,
        variadic: bool,
        dllimport: bool,
    },
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Const { name, .. }
            | Declaration::Var { name, .. }
            | Declaration::Function { name, .. } => name,
        }
    }
}

/// Prism reserved words that C identifiers may collide with.
pub fn escape_name(name: &str) -> String {
    match name {
        "type" => "type_".to_string(),
        "in" => "in_".to_string(),
        "from" => "from_".to_string(),
        _ => name.to_string(),
    }
}

/// Insertion-ordered name → value map.
///
/// Re-inserting an existing key replaces the value but keeps the original
/// position, matching the declaration-order semantics of the output files.
#[derive(Debug, Default)]
pub struct OrderedMap<T> {
    entries: Vec<(String, T)>,
    index: HashMap<String, usize>,
}

impl<T> OrderedMap<T> {
    pub fn new() -> Self {
        OrderedMap {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: T) {
        let name = name.into();
        match self.index.get(&name) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, value));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// Per-module import state: the type arena plus the declaration and type
/// tables the walker fills in and the emitter reads back.
#[derive(Debug)]
pub struct ImportContext {
    types: Vec<Type>,
    /// Global declarations in source order.
    pub globals: OrderedMap<Declaration>,
    /// Typedef name → referent type.
    pub typedefs: OrderedMap<TypeId>,
    /// Tag name → the canonical record/enum behind `struct X`/`union X`/
    /// `enum X` references.
    pub tagged: OrderedMap<TypeId>,
    /// Front-end node id → the record/enum built from that node; binds a
    /// typedef to the tag declaration it owns.
    pub struct_ids: HashMap<String, TypeId>,
    /// Record most recently completed by the walker; referent of
    /// anonymous-aggregate sentinels in type strings.
    pub last_record: Option<TypeId>,
    /// Number of typedef entries seeded by the host prelude. These resolve
    /// during the walk but are not printed.
    prelude_typedefs: usize,
}

impl ImportContext {
    pub fn new(platform: Platform) -> Self {
        let mut ctx = ImportContext {
            types: Vec::new(),
            globals: OrderedMap::new(),
            typedefs: OrderedMap::new(),
            tagged: OrderedMap::new(),
            struct_ids: HashMap::new(),
            last_record: None,
            prelude_typedefs: 0,
        };

        let va_list = ctx.alloc(Type::VaList);
        ctx.tagged.insert("__va_list_tag", va_list);
        for (name, ty) in prelude::seeded_typedefs(platform) {
            let id = ctx.alloc(ty);
            ctx.typedefs.insert(name, id);
        }
        ctx.prelude_typedefs = ctx.typedefs.len();

        ctx
    }

    pub fn alloc(&mut self, ty: Type) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    pub fn ty(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize]
    }

    pub fn ty_mut(&mut self, id: TypeId) -> &mut Type {
        &mut self.types[id.0 as usize]
    }

    /// Typedefs registered by the walker, in source order, without the
    /// prelude seeds.
    pub fn walker_typedefs(&self) -> impl Iterator<Item = (&str, TypeId)> {
        self.typedefs
            .iter()
            .skip(self.prelude_typedefs)
            .map(|(name, &id)| (name, id))
    }
}
