use std::borrow::Cow;

use crate::codegen::{BinaryOperator, Expr, Program, Stmt, UnaryOperator};
use crate::runtime_value::format_number;

const INDENT: &str = "  ";

// Binding strength, loosest first.
const ASSIGN: u8 = 1;
const CONDITIONAL: u8 = 2;
const UNARY: u8 = 10;
const POSTFIX: u8 = 11;
const ATOM: u8 = 12;

/// Render a whole program, declaring its variables first.
pub fn emit_program(program: &Program) -> String {
    let mut emitter = Emitter::default();
    if !program.variables.is_empty() {
        let names: Vec<Cow<'_, str>> = program.variables.iter().map(|v| identifier(v)).collect();
        emitter.line(&format!("var {};", names.join(", ")));
        if !program.body.is_empty() {
            emitter.out.push('\n');
        }
    }
    emitter.statements(&program.body);
    emitter.out
}

pub fn emit_statements(statements: &[Stmt]) -> String {
    let mut emitter = Emitter::default();
    emitter.statements(statements);
    emitter.out
}

pub fn emit_expr(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr, ASSIGN);
    out
}

#[derive(Default)]
struct Emitter {
    out: String,
    indent: usize,
}

impl Emitter {
    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn statements(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            self.statement(stmt);
        }
    }

    fn nested(&mut self, body: &[Stmt]) {
        self.indent += 1;
        self.statements(body);
        self.indent -= 1;
    }

    fn statement(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(expr) => self.line(&format!("{};", emit_expr(expr))),
            Stmt::If { .. } => self.if_chain(stmt, ""),
            Stmt::While { condition, body } => {
                self.line(&format!("while ({}) {{", emit_expr(condition)));
                self.nested(body);
                self.line("}");
            }
            Stmt::For {
                init,
                condition,
                update,
                body,
            } => {
                self.line(&format!(
                    "for ({}; {}; {}) {{",
                    emit_expr(init),
                    emit_expr(condition),
                    emit_expr(update)
                ));
                self.nested(body);
                self.line("}");
            }
            Stmt::ForEach {
                variable,
                sequence,
                body,
            } => {
                self.line(&format!(
                    "for ({} of {}) {{",
                    identifier(variable),
                    emit_expr(sequence)
                ));
                self.nested(body);
                self.line("}");
            }
            Stmt::Break => self.line("break;"),
            Stmt::Continue => self.line("continue;"),
        }
    }

    fn if_chain(&mut self, stmt: &Stmt, prefix: &str) {
        let Stmt::If {
            condition,
            then,
            otherwise,
        } = stmt
        else {
            return;
        };
        self.line(&format!("{}if ({}) {{", prefix, emit_expr(condition)));
        self.nested(then);
        match otherwise.as_slice() {
            [] => self.line("}"),
            [nested @ Stmt::If { .. }] => self.if_chain(nested, "} else "),
            body => {
                self.line("} else {");
                self.nested(body);
                self.line("}");
            }
        }
    }
}

// Reserved words plus the globals generated code calls.
const RESERVED: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
    "if", "implements", "import", "in", "instanceof", "interface", "let", "new", "null",
    "package", "private", "protected", "public", "return", "static", "super", "switch", "this",
    "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield", "arguments",
    "eval", "undefined", "NaN", "Infinity", "Math", "String", "textToTitleCase", "listsRepeat",
];

/// The name a variable is emitted under.
///
/// Plain ASCII identifiers that are not reserved pass through. Anything
/// else gets a `$` prefix, and every character outside `[A-Za-z0-9_]` is
/// written as `$<hex code point>$`, so distinct names stay distinct.
pub fn identifier(name: &str) -> Cow<'_, str> {
    let plain = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !RESERVED.contains(&name);
    if plain {
        return Cow::Borrowed(name);
    }
    let mut out = String::with_capacity(name.len() + 1);
    out.push('$');
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        } else {
            out.push_str(&format!("${:x}$", c as u32));
        }
    }
    Cow::Owned(out)
}

fn binary_precedence(op: BinaryOperator) -> u8 {
    match op {
        BinaryOperator::Coalesce => 3,
        BinaryOperator::Or => 3,
        BinaryOperator::And => 4,
        BinaryOperator::Equal | BinaryOperator::NotEqual => 5,
        BinaryOperator::Less
        | BinaryOperator::LessOrEqual
        | BinaryOperator::Greater
        | BinaryOperator::GreaterOrEqual => 6,
        BinaryOperator::Add | BinaryOperator::Subtract => 7,
        BinaryOperator::Multiply | BinaryOperator::Divide | BinaryOperator::Modulo => 8,
        BinaryOperator::Power => 9,
    }
}

fn binary_symbol(op: BinaryOperator) -> &'static str {
    match op {
        BinaryOperator::Add => "+",
        BinaryOperator::Subtract => "-",
        BinaryOperator::Multiply => "*",
        BinaryOperator::Divide => "/",
        BinaryOperator::Modulo => "%",
        BinaryOperator::Power => "**",
        BinaryOperator::Equal => "===",
        BinaryOperator::NotEqual => "!==",
        BinaryOperator::Less => "<",
        BinaryOperator::LessOrEqual => "<=",
        BinaryOperator::Greater => ">",
        BinaryOperator::GreaterOrEqual => ">=",
        BinaryOperator::And => "&&",
        BinaryOperator::Or => "||",
        BinaryOperator::Coalesce => "??",
    }
}

fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Assign { .. } => ASSIGN,
        Expr::Conditional { .. } => CONDITIONAL,
        Expr::Binary { op, .. } => binary_precedence(*op),
        Expr::Unary { .. } => UNARY,
        Expr::Number(n) if n.is_sign_negative() && *n != 0.0 => UNARY,
        Expr::Call { .. } | Expr::Method { .. } | Expr::Member { .. } => POSTFIX,
        _ => ATOM,
    }
}

fn write_expr(out: &mut String, expr: &Expr, min_precedence: u8) {
    let wrap = precedence(expr) < min_precedence;
    if wrap {
        out.push('(');
    }
    match expr {
        Expr::Null => out.push_str("null"),
        Expr::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
        Expr::Number(n) => out.push_str(&format_number(*n)),
        Expr::Text(s) => {
            out.push_str(&serde_json::to_string(s).unwrap_or_else(|_| format!("{:?}", s)))
        }
        Expr::List(items) => {
            out.push('[');
            write_args(out, items);
            out.push(']');
        }
        Expr::Variable(name) => out.push_str(&identifier(name)),
        Expr::Assign { name, value } => {
            out.push_str(&identifier(name));
            out.push_str(" = ");
            write_expr(out, value, ASSIGN);
        }
        Expr::Unary { op, operand } => {
            out.push_str(match op {
                UnaryOperator::Negate => "-",
                UnaryOperator::Not => "!",
                UnaryOperator::TypeOf => "typeof ",
            });
            // `--x` would lex as a decrement.
            let min = if *op == UnaryOperator::Negate && starts_with_minus(operand) {
                UNARY + 1
            } else {
                UNARY
            };
            write_expr(out, operand, min);
        }
        Expr::Binary { op, left, right } => {
            let p = binary_precedence(*op);
            let (left_min, right_min) = match op {
                // `**` is right-associative and rejects a bare unary on its left.
                BinaryOperator::Power => (POSTFIX, p),
                _ => (p, p + 1),
            };
            write_expr(out, left, left_min);
            out.push(' ');
            out.push_str(binary_symbol(*op));
            out.push(' ');
            write_expr(out, right, right_min);
        }
        Expr::Conditional {
            condition,
            then,
            otherwise,
        } => {
            write_expr(out, condition, CONDITIONAL + 1);
            out.push_str(" ? ");
            write_expr(out, then, ASSIGN);
            out.push_str(" : ");
            write_expr(out, otherwise, ASSIGN);
        }
        Expr::Call { function, args } => {
            out.push_str(function);
            out.push('(');
            write_args(out, args);
            out.push(')');
        }
        Expr::Method {
            receiver,
            method,
            args,
        } => {
            write_receiver(out, receiver);
            out.push('.');
            out.push_str(method);
            out.push('(');
            write_args(out, args);
            out.push(')');
        }
        Expr::Member { object, property } => {
            write_receiver(out, object);
            out.push('.');
            out.push_str(property);
        }
    }
    if wrap {
        out.push(')');
    }
}

fn starts_with_minus(expr: &Expr) -> bool {
    match expr {
        Expr::Number(n) => n.is_sign_negative() && *n != 0.0,
        Expr::Unary { op, .. } => *op == UnaryOperator::Negate,
        _ => false,
    }
}

fn write_receiver(out: &mut String, receiver: &Expr) {
    // `5.length` does not parse; numeric receivers always get parentheses.
    let min = if matches!(receiver, Expr::Number(_)) {
        ATOM + 1
    } else {
        POSTFIX
    };
    write_expr(out, receiver, min);
}

fn write_args(out: &mut String, args: &[Expr]) {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_expr(out, arg, ASSIGN);
    }
}
