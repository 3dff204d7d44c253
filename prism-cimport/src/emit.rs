//! Emitter — import context → the declarations file and the symbol table.
//!
//! Named types print exactly once, anonymous aggregates inline wherever
//! they are referenced, and tag/typedef indirection is resolved at print
//! time so forward references pick up the completed definition.

use std::collections::HashSet;
use std::io::Write;

use anyhow::{Context, Result};
use tracing::debug;

use crate::model::{
    Declaration, ImportContext, RecordKind, Type, TypeId, escape_name,
};

/// Render a single type reference.
pub fn type_string(ctx: &ImportContext, id: TypeId) -> Result<String> {
    Emitter::new(ctx).type_string(id)
}

/// Write the declarations file: constants, then the type closure, then
/// functions, then variables.
pub fn write_declarations(
    ctx: &ImportContext,
    globals: &[Declaration],
    out: &mut dyn Write,
) -> Result<()> {
    let mut emitter = Emitter::new(ctx);

    for decl in globals {
        if let Declaration::Const { name, ty, value } = decl {
            writeln!(out, "export const {name}: {} = {value}", emitter.type_string(*ty)?)?;
        }
    }

    for (name, id) in ctx.walker_typedefs() {
        emitter.print_typedef(name, id, out)?;
    }
    for (_, &id) in ctx.tagged.iter() {
        emitter.print_references(id, out)?;
    }

    for decl in globals {
        if let Declaration::Function { .. } = decl {
            writeln!(out, "{}", emitter.function_declaration(decl)?)?;
        }
    }
    for decl in globals {
        if let Declaration::Var { name, ty, dllimport } = decl {
            let dllimport = if *dllimport { "#dllimport " } else { "" };
            writeln!(
                out,
                "export import var #extern {dllimport}{name}: {}",
                emitter.type_string(*ty)?
            )?;
        }
    }

    Ok(())
}

/// Write the symbol-table file: the `__SYMBOLS` array declaration plus one
/// assignment per function, then per variable. When `filter` is present,
/// only declarations whose name it contains are materialised.
pub fn write_symbols(
    module: &str,
    globals: &[Declaration],
    filter: Option<&HashSet<String>>,
    out: &mut dyn Write,
) -> Result<()> {
    let keep = |decl: &&Declaration| filter.is_none_or(|f| f.contains(decl.name()));
    let functions: Vec<&Declaration> = globals
        .iter()
        .filter(|d| matches!(d, Declaration::Function { .. }))
        .filter(keep)
        .collect();
    let variables: Vec<&Declaration> = globals
        .iter()
        .filter(|d| matches!(d, Declaration::Var { .. }))
        .filter(keep)
        .collect();

    writeln!(out, "import {module}")?;
    writeln!(out, "import symbol")?;
    writeln!(
        out,
        "export var __SYMBOLS: [{}; symbol::Symbol]",
        functions.len() + variables.len()
    )?;

    for (n, decl) in functions.iter().chain(variables.iter()).enumerate() {
        writeln!(out, "{}", symbol_entry(decl, n))?;
    }

    debug!(
        module,
        functions = functions.len(),
        variables = variables.len(),
        "symbol table"
    );
    Ok(())
}

/// One `__SYMBOLS[n] = ...` assignment. Dll-imported entries omit the
/// address slot; the runtime loader resolves them instead.
fn symbol_entry(decl: &Declaration, n: usize) -> String {
    match decl {
        Declaration::Function { name, dllimport, .. } => {
            let address = if *dllimport {
                String::new()
            } else {
                format!(", function = *{name} !def () -> ()")
            };
            format!(
                "__SYMBOLS[{n}] = {{ kind = symbol::SymbolKind::FUNCTION, \
                 dllimport = {dllimport}, name = \"{name}\"{address}}} !symbol::Symbol"
            )
        }
        Declaration::Var { name, dllimport, .. } => {
            let address = if *dllimport {
                String::new()
            } else {
                format!(", variable = *{name} !*")
            };
            format!(
                "__SYMBOLS[{n}] = {{ kind = symbol::SymbolKind::VARIABLE, \
                 dllimport = {dllimport}, name = \"{name}\"{address}}} !symbol::Symbol"
            )
        }
        Declaration::Const { .. } => String::new(),
    }
}

struct Emitter<'a> {
    ctx: &'a ImportContext,
    printed: HashSet<TypeId>,
}

impl<'a> Emitter<'a> {
    fn new(ctx: &'a ImportContext) -> Self {
        Emitter {
            ctx,
            printed: HashSet::new(),
        }
    }

    /// Resolve tag/typedef indirection to the registered definition, so a
    /// forward reference walked before the record body picks up the
    /// completed one.
    fn canonical(&self, id: TypeId) -> Result<TypeId> {
        match self.ctx.ty(id) {
            Type::Incomplete(tag) => self
                .ctx
                .tagged
                .get(tag)
                .copied()
                .with_context(|| format!("unresolved tag `{tag}`")),
            Type::Record(r) => Ok(self.registered(r.typedef.as_deref(), r.tag.as_deref(), id)),
            Type::Enum(e) => Ok(self.registered(e.typedef.as_deref(), e.tag.as_deref(), id)),
            _ => Ok(id),
        }
    }

    fn registered(&self, typedef: Option<&str>, tag: Option<&str>, fallback: TypeId) -> TypeId {
        typedef
            .and_then(|name| self.ctx.typedefs.get(name).copied())
            .or_else(|| tag.and_then(|name| self.ctx.tagged.get(name).copied()))
            .unwrap_or(fallback)
    }

    /// The name a record/enum prints under: its typedef name, else its tag.
    fn name_of(&self, id: TypeId) -> Option<&'a str> {
        match self.ctx.ty(id) {
            Type::Record(r) => r.typedef.as_deref().or(r.tag.as_deref()),
            Type::Enum(e) => e.typedef.as_deref().or(e.tag.as_deref()),
            _ => None,
        }
    }

    fn type_string(&self, id: TypeId) -> Result<String> {
        Ok(match self.ctx.ty(id) {
            Type::Void => "void".to_string(),
            Type::Varargs => "...".to_string(),
            Type::VaList => "__va_list_tag".to_string(),
            Type::Integer(name) | Type::Float(name) => name.clone(),
            Type::Pointer(inner) => {
                if matches!(self.ctx.ty(*inner), Type::Void) {
                    "*".to_string()
                } else {
                    format!("*{}", self.type_string(*inner)?)
                }
            }
            Type::Array { element, len: Some(len) } => {
                format!("[{len}; {}]", self.type_string(*element)?)
            }
            // An unsized array decays to a pointer.
            Type::Array { element, len: None } => format!("*{}", self.type_string(*element)?),
            Type::Function { args, ret } => self.function_string(args, *ret)?,
            Type::Record(_) | Type::Enum(_) | Type::Incomplete(_) => {
                let id = self.canonical(id)?;
                match self.name_of(id) {
                    Some(name) => name.to_string(),
                    None => self.type_definition(id)?,
                }
            }
        })
    }

    fn function_string(&self, args: &[TypeId], ret: TypeId) -> Result<String> {
        let mut rendered = Vec::new();
        for &arg in args {
            if matches!(self.ctx.ty(arg), Type::Void) {
                continue;
            }
            rendered.push(self.type_string(arg)?);
        }
        let ret = if matches!(self.ctx.ty(ret), Type::Void) {
            String::new()
        } else {
            self.type_string(ret)?
        };
        Ok(format!("def ({}) -> ({ret})", rendered.join(", ")))
    }

    /// The right-hand side of an `export type` line, or the inline form of
    /// an anonymous aggregate.
    fn type_definition(&self, id: TypeId) -> Result<String> {
        match self.ctx.ty(id) {
            Type::Record(r) => {
                let keyword = match r.kind {
                    RecordKind::Struct => "struct",
                    RecordKind::Union => "struct #union",
                };
                let mut out = format!("{keyword} {{ ");
                for field in &r.fields {
                    if let Some(width) = field.bitfield {
                        out.push_str(&format!("#bits({width}) "));
                    }
                    out.push_str(&escape_name(&field.name));
                    out.push_str(": ");
                    out.push_str(&self.type_string(field.ty)?);
                    out.push_str("; ");
                }
                out.push('}');
                Ok(out)
            }
            Type::Enum(e) => {
                let mut out = "enum { ".to_string();
                for (name, value) in &e.members {
                    out.push_str(name);
                    if let Some(value) = value {
                        out.push_str(" = ");
                        out.push_str(value);
                    }
                    out.push_str("; ");
                }
                out.push('}');
                Ok(out)
            }
            Type::Incomplete(_) => self.type_definition(self.canonical(id)?),
            _ => self.type_string(id),
        }
    }

    /// Recursively print every named type reachable from `id` before the
    /// type itself, each exactly once.
    fn print_references(&mut self, id: TypeId, out: &mut dyn Write) -> Result<()> {
        let ctx = self.ctx;
        match ctx.ty(id) {
            Type::Pointer(inner) => self.print_references(*inner, out),
            Type::Array { element, .. } => self.print_references(*element, out),
            Type::Function { args, ret } => {
                for &arg in args {
                    self.print_references(arg, out)?;
                }
                self.print_references(*ret, out)
            }
            Type::Record(_) | Type::Enum(_) | Type::Incomplete(_) => {
                let id = self.canonical(id)?;
                if !self.printed.insert(id) {
                    return Ok(());
                }
                if let Type::Record(r) = ctx.ty(id) {
                    for field in &r.fields {
                        self.print_references(field.ty, out)?;
                    }
                }
                self.print_named_definition(id, out)
            }
            _ => Ok(()),
        }
    }

    /// Print a typedef entry. Records and enums print under their own name;
    /// everything else prints as an alias line.
    fn print_typedef(&mut self, name: &str, id: TypeId, out: &mut dyn Write) -> Result<()> {
        match self.ctx.ty(id) {
            Type::Record(_) | Type::Enum(_) | Type::Incomplete(_) => {
                self.print_references(id, out)
            }
            _ => {
                self.print_references(id, out)?;
                writeln!(out, "export type {name} = {}", self.type_string(id)?)?;
                Ok(())
            }
        }
    }

    fn print_named_definition(&mut self, id: TypeId, out: &mut dyn Write) -> Result<()> {
        let (name, has_body) = match self.ctx.ty(id) {
            Type::Record(r) => (
                r.typedef.as_deref().or(r.tag.as_deref()),
                !r.fields.is_empty(),
            ),
            Type::Enum(e) => (
                e.typedef.as_deref().or(e.tag.as_deref()),
                !e.members.is_empty(),
            ),
            _ => (None, false),
        };
        // Anonymous aggregates are inlined at their use sites instead.
        let Some(name) = name else { return Ok(()) };
        if has_body {
            writeln!(out, "export type {name} = {}", self.type_definition(id)?)?;
        } else {
            writeln!(out, "export type {name}")?;
        }
        Ok(())
    }

    fn function_declaration(&self, decl: &Declaration) -> Result<String> {
        let Declaration::Function { name, ret, args, variadic, dllimport } = decl else {
            unreachable!("not a function declaration");
        };
        let mut rendered = Vec::new();
        for (arg_name, ty) in args {
            rendered.push(format!("{arg_name}: {}", self.type_string(*ty)?));
        }
        if *variadic {
            rendered.push("...".to_string());
        }
        let dllimport = if *dllimport { "#dllimport " } else { "" };
        let mut line = format!(
            "export import def #extern {dllimport}{name}({})",
            rendered.join(", ")
        );
        if !matches!(self.ctx.ty(*ret), Type::Void) {
            line.push_str(" -> ");
            line.push_str(&self.type_string(*ret)?);
        }
        Ok(line)
    }
}
