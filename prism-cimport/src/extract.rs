//! Walker — front-end AST nodes → declarations and types in the import
//! context.
//!
//! One dispatch per top-level declaration kind. Node kinds the importer has
//! no use for (static asserts, pragmas, ...) are ignored.

use anyhow::{Context, Result};
use tracing::{debug, trace};

use crate::ast::{self, Node};
use crate::grammar;
use crate::model::{
    Declaration, EnumDef, Field, ImportContext, Record, RecordKind, Type, TypeId, escape_name,
};

/// Walk every top-level declaration into the context.
pub fn walk(ctx: &mut ImportContext, nodes: &[Node]) -> Result<()> {
    for node in nodes {
        walk_node(ctx, node)?;
    }
    Ok(())
}

/// Dispatch a single top-level node on its kind.
pub fn walk_node(ctx: &mut ImportContext, node: &Node) -> Result<()> {
    match node.kind() {
        "VarDecl" => walk_var(ctx, node),
        "TypedefDecl" => walk_typedef(ctx, node),
        "FunctionDecl" => walk_function(ctx, node),
        "RecordDecl" => walk_record(ctx, node).map(|_| ()),
        "EnumDecl" => walk_enum(ctx, node),
        _ => Ok(()),
    }
}

fn walk_var(ctx: &mut ImportContext, node: &Node) -> Result<()> {
    let name = node
        .name
        .clone()
        .context("variable declaration without a name")?;
    let ty = node_type(ctx, node).with_context(|| format!("variable `{name}`"))?;
    let dllimport = has_dllimport(node);
    trace!(name = %name, dllimport, "variable");
    ctx.globals
        .insert(name.clone(), Declaration::Var { name, ty, dllimport });
    Ok(())
}

fn walk_typedef(ctx: &mut ImportContext, node: &Node) -> Result<()> {
    let name = node.name.clone().context("typedef without a name")?;
    let inner = node
        .inner
        .first()
        .with_context(|| format!("typedef `{name}` has no underlying type"))?;

    if let Some(owned) = &inner.owned_tag_decl {
        // The typedef names the record/enum built from the owned tag
        // declaration, which was walked just before it.
        let id = *ctx.struct_ids.get(&owned.id).with_context(|| {
            format!("typedef `{name}` references unknown declaration {}", owned.id)
        })?;
        let tag_missing = match ctx.ty_mut(id) {
            Type::Record(r) => {
                r.typedef = Some(name.clone());
                r.tag.is_none()
            }
            Type::Enum(e) => {
                e.typedef = Some(name.clone());
                e.tag.is_none()
            }
            _ => false,
        };
        if tag_missing {
            // Untagged records take the typedef name as their tag so later
            // `struct NAME` references resolve.
            match ctx.ty_mut(id) {
                Type::Record(r) => r.tag = Some(name.clone()),
                Type::Enum(e) => e.tag = Some(name.clone()),
                _ => {}
            }
            ctx.tagged.insert(name.clone(), id);
        }
        trace!(name = %name, "typedef binds owned tag");
        ctx.typedefs.insert(name, id);
        return Ok(());
    }

    let type_string = inner.type_string()?;
    let id = if ast::is_anonymous(type_string) {
        last_record(ctx)?
    } else {
        grammar::parse_type(ctx, type_string).with_context(|| format!("typedef `{name}`"))?
    };
    trace!(name = %name, "typedef");
    ctx.typedefs.insert(name, id);
    Ok(())
}

fn walk_record(ctx: &mut ImportContext, node: &Node) -> Result<TypeId> {
    let tag = node.name.clone();
    let node_id = node.id.clone().context("record declaration without an id")?;
    let kind = match node
        .tag_used
        .as_deref()
        .context("record declaration without tagUsed")?
    {
        "union" => RecordKind::Union,
        _ => RecordKind::Struct,
    };

    let mut fields = Vec::new();
    for (i, child) in node.inner.iter().enumerate() {
        match child.kind() {
            "FieldDecl" => {
                let bitfield = if child.is_bitfield {
                    let width = child
                        .inner
                        .first()
                        .and_then(|n| n.value.as_deref())
                        .context("bitfield without a width literal")?;
                    Some(width.parse::<u64>().with_context(|| {
                        format!("bitfield width `{width}` is not an integer")
                    })?)
                } else {
                    None
                };
                let ty = field_type(ctx, child)?;
                let name = match &child.name {
                    Some(name) => name.clone(),
                    None if bitfield.is_some() => String::new(),
                    None => format!("_{i}"),
                };
                fields.push(Field { name, ty, bitfield });
            }
            "RecordDecl" => {
                // A nested aggregate; fields referencing it follow as
                // anonymous sentinels.
                walk_record(ctx, child)?;
            }
            _ => {}
        }
    }

    let id = ctx.alloc(Type::Record(Record {
        kind,
        tag: tag.clone(),
        typedef: None,
        fields,
    }));
    ctx.last_record = Some(id);
    if let Some(tag) = &tag {
        ctx.tagged.insert(tag.clone(), id);
    }
    ctx.struct_ids.insert(node_id, id);
    debug!(tag = tag.as_deref().unwrap_or("<anonymous>"), "record");
    Ok(id)
}

fn walk_enum(ctx: &mut ImportContext, node: &Node) -> Result<()> {
    let tag = node.name.clone();
    let node_id = node.id.clone().context("enum declaration without an id")?;

    let mut members = Vec::new();
    for decl in &node.inner {
        if decl.kind() != "EnumConstantDecl" {
            continue;
        }
        let member = decl.name.clone().context("enum member without a name")?;
        let value = decl
            .inner
            .first()
            .map(walk_expression)
            .filter(|v| !v.is_empty());
        members.push((member, value));
    }

    // Every member doubles as an integer constant. Members without an
    // explicit value continue the `previous + 1` chain, starting at zero.
    let int_ty = ctx.alloc(Type::Integer("int".to_string()));
    let mut default = "0".to_string();
    for (member, value) in &members {
        let value = value.clone().unwrap_or_else(|| default.clone());
        ctx.globals.insert(
            member.clone(),
            Declaration::Const {
                name: member.clone(),
                ty: int_ty,
                value,
            },
        );
        default = format!("{member} + 1");
    }

    let id = ctx.alloc(Type::Enum(EnumDef {
        tag: tag.clone(),
        typedef: None,
        members,
    }));
    if let Some(tag) = &tag {
        ctx.tagged.insert(tag.clone(), id);
    }
    ctx.struct_ids.insert(node_id, id);
    debug!(tag = tag.as_deref().unwrap_or("<anonymous>"), "enum");
    Ok(())
}

fn walk_function(ctx: &mut ImportContext, node: &Node) -> Result<()> {
    let name = node
        .name
        .clone()
        .context("function declaration without a name")?;
    if node.storage_class.as_deref() == Some("static") {
        trace!(name = %name, "skipping static function");
        return Ok(());
    }
    if node.inline {
        trace!(name = %name, "skipping inline function");
        return Ok(());
    }

    // The function's own type string starts with its return type; the
    // grammar stops at the parameter list.
    let ret = node_type(ctx, node).with_context(|| format!("function `{name}`"))?;

    let mut args = Vec::new();
    let mut dllimport = false;
    for (i, child) in node.inner.iter().enumerate() {
        match child.kind() {
            "ParmVarDecl" => {
                let arg_name = match &child.name {
                    Some(arg) => escape_name(arg),
                    None => format!("_{i}"),
                };
                let ty = node_type(ctx, child)
                    .with_context(|| format!("argument `{arg_name}` of `{name}`"))?;
                args.push((arg_name, ty));
            }
            "DLLImportAttr" => dllimport = true,
            _ => {}
        }
    }

    trace!(name = %name, args = args.len(), variadic = node.variadic, "function");
    ctx.globals.insert(
        name.clone(),
        Declaration::Function {
            name,
            ret,
            args,
            variadic: node.variadic,
            dllimport,
        },
    );
    Ok(())
}

/// Best-effort textual translation of a constant expression. Operator
/// spellings that differ in Prism are mapped (`!` → `not`, `&&` → `and`,
/// `||` → `or`); every sub-expression is parenthesised so precedence
/// survives the trip. Unknown expression kinds yield an empty string.
pub fn walk_expression(node: &Node) -> String {
    let inner = |i: usize| node.inner.get(i).map(walk_expression).unwrap_or_default();
    match node.kind() {
        "ConstantExpr" => inner(0),
        "IntegerLiteral" => node.value.clone().unwrap_or_default(),
        "UnaryOperator" => {
            let opcode = match node.opcode.as_deref() {
                Some("!") => "not",
                Some(op) => op,
                None => return String::new(),
            };
            format!("({opcode} {})", inner(0))
        }
        "BinaryOperator" => {
            let opcode = match node.opcode.as_deref() {
                Some("&&") => "and",
                Some("||") => "or",
                Some(op) => op,
                None => return String::new(),
            };
            format!("({} {opcode} {})", inner(0), inner(1))
        }
        "ParenExpr" => format!("({})", inner(0)),
        "DeclRefExpr" => node
            .referenced_decl
            .as_ref()
            .and_then(|decl| decl.name.clone())
            .unwrap_or_default(),
        "ConditionalOperator" => format!("{} if {} else {}", inner(1), inner(0), inner(2)),
        _ => String::new(),
    }
}

fn node_type(ctx: &mut ImportContext, node: &Node) -> Result<TypeId> {
    let type_string = node.type_string()?;
    if ast::is_anonymous(type_string) {
        return last_record(ctx);
    }
    grammar::parse_type(ctx, type_string)
}

fn field_type(ctx: &mut ImportContext, node: &Node) -> Result<TypeId> {
    node_type(ctx, node).with_context(|| {
        format!("field `{}`", node.name.as_deref().unwrap_or("<unnamed>"))
    })
}

fn last_record(ctx: &ImportContext) -> Result<TypeId> {
    ctx.last_record
        .context("anonymous aggregate reference with no preceding record")
}

fn has_dllimport(node: &Node) -> bool {
    node.inner.iter().any(|n| n.kind() == "DLLImportAttr")
}
