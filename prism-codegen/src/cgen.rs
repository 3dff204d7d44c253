//! Renderer — Prism AST → C source text.
//!
//! Every sub-expression is wrapped in parentheses so that C precedence can
//! never disagree with the tree that produced it; the system compiler
//! type-checks the result anyway.

use std::fmt::Write;

use crate::ast::{BinaryOp, Def, Expr, Program, Stmt, UnaryOp};

pub fn render_expr(expr: &Expr) -> String {
    match expr {
        Expr::Bool(value) => if *value { "true" } else { "false" }.to_string(),
        Expr::Int(value) => value.to_string(),
        Expr::Float(value) => value.to_string(),
        Expr::Str(value) => c_string(value),
        Expr::Char(value) => c_char(*value),
        Expr::Null => "NULL".to_string(),
        Expr::Ident(name) => name.clone(),
        Expr::Unary { op, operand } => {
            format!("({}{})", unary_op(*op), render_expr(operand))
        }
        Expr::Binary { op, left, right } => format!(
            "({} {} {})",
            render_expr(left),
            binary_op(*op),
            render_expr(right)
        ),
        Expr::Call { callee, args } => {
            let args: Vec<String> = args.iter().map(render_expr).collect();
            format!("{}({})", render_expr(callee), args.join(", "))
        }
        Expr::Member { value, field } => format!("({}.{field})", render_expr(value)),
        Expr::Index { value, index } => {
            format!("({}[{}])", render_expr(value), render_expr(index))
        }
        Expr::Cast { ty, value } => format!("(({ty}){})", render_expr(value)),
        Expr::SizeOf(ty) => format!("(sizeof({ty}))"),
        Expr::StructInit { ty, args } => {
            let args: Vec<String> = args
                .iter()
                .map(|(field, value)| match field {
                    Some(field) => format!(".{field} = {}", render_expr(value)),
                    None => render_expr(value),
                })
                .collect();
            format!("(({ty}){{ {} }})", args.join(", "))
        }
    }
}

fn unary_op(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Neg => "-",
        UnaryOp::Invert => "~",
        UnaryOp::Not => "!",
        UnaryOp::AddressOf => "&",
        UnaryOp::Deref => "*",
    }
}

fn binary_op(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
        BinaryOp::BitAnd => "&",
        BinaryOp::BitOr => "|",
        BinaryOp::Xor => "^",
        BinaryOp::And => "&&",
        BinaryOp::Or => "||",
        BinaryOp::Eq => "==",
        BinaryOp::Ne => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::Ge => ">=",
    }
}

fn render_stmts(stmts: &[Stmt], indent: usize, out: &mut String) {
    for stmt in stmts {
        render_stmt(stmt, indent, out);
    }
}

fn render_stmt(stmt: &Stmt, indent: usize, out: &mut String) {
    let pad = "    ".repeat(indent);
    match stmt {
        Stmt::VarDecl { ty, name, init } => match init {
            Some(init) => {
                let _ = writeln!(out, "{pad}{ty} {name} = {};", render_expr(init));
            }
            None => {
                let _ = writeln!(out, "{pad}{ty} {name};");
            }
        },
        Stmt::Assign { target, value } => {
            let _ = writeln!(out, "{pad}{} = {};", render_expr(target), render_expr(value));
        }
        Stmt::Expr(expr) => {
            let _ = writeln!(out, "{pad}{};", render_expr(expr));
        }
        Stmt::If {
            cond,
            then,
            else_ifs,
            otherwise,
        } => {
            let _ = writeln!(out, "{pad}if ({}) {{", render_expr(cond));
            render_stmts(then, indent + 1, out);
            for (cond, body) in else_ifs {
                let _ = writeln!(out, "{pad}}} else if ({}) {{", render_expr(cond));
                render_stmts(body, indent + 1, out);
            }
            if let Some(body) = otherwise {
                let _ = writeln!(out, "{pad}}} else {{");
                render_stmts(body, indent + 1, out);
            }
            let _ = writeln!(out, "{pad}}}");
        }
        Stmt::While { cond, body } => {
            let cond = cond.as_ref().map_or_else(|| "true".to_string(), render_expr);
            let _ = writeln!(out, "{pad}while ({cond}) {{");
            render_stmts(body, indent + 1, out);
            let _ = writeln!(out, "{pad}}}");
        }
        Stmt::Return(value) => match value {
            Some(value) => {
                let _ = writeln!(out, "{pad}return {};", render_expr(value));
            }
            None => {
                let _ = writeln!(out, "{pad}return;");
            }
        },
        Stmt::Break => {
            let _ = writeln!(out, "{pad}break;");
        }
        Stmt::Continue => {
            let _ = writeln!(out, "{pad}continue;");
        }
    }
}

pub fn render_def(def: &Def, out: &mut String) {
    let args: Vec<String> = def
        .args
        .iter()
        .map(|(name, ty)| format!("{ty} {name}"))
        .collect();
    let export = if def.exported { "DLL_EXPORT " } else { "" };
    let _ = writeln!(
        out,
        "{export}{} {}({}) {{",
        def.ret,
        def.name,
        args.join(", ")
    );
    render_stmts(&def.body, 1, out);
    let _ = writeln!(out, "}}");
}

/// Render a complete compilation unit, wrapped in its include guard.
pub fn render_program(program: &Program) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "#include \"prism.h\"");
    let _ = writeln!(out, "#ifndef {}", program.unit);
    let _ = writeln!(out, "#define {}", program.unit);
    for def in &program.defs {
        render_def(def, &mut out);
    }
    let _ = writeln!(out, "#endif");
    out
}

fn c_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        escape_into(c, &mut out);
    }
    out.push('"');
    out
}

fn c_char(value: char) -> String {
    let mut out = String::new();
    out.push('\'');
    escape_into(value, &mut out);
    out.push('\'');
    out
}

fn escape_into(c: char, out: &mut String) {
    match c {
        '"' => out.push_str("\\\""),
        '\'' => out.push_str("\\'"),
        '\\' => out.push_str("\\\\"),
        '\n' => out.push_str("\\n"),
        '\t' => out.push_str("\\t"),
        '\r' => out.push_str("\\r"),
        '\0' => out.push_str("\\0"),
        c => out.push(c),
    }
}
