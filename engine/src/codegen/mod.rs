//! Target-language tree produced by the generation traversal.
//!
//! The tree is deliberately small: compound statement lists, if/else chains,
//! counting and iterating loops, escapes, and a handful of expression shapes.
//! `emit` renders it as JavaScript-flavoured source.

pub mod emit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Not,
    TypeOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    And,
    Or,
    /// Null-coalescing: the right side when the left is null.
    Coalesce,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Null,
    Boolean(bool),
    Number(f64),
    Text(String),
    List(Vec<Expr>),
    Variable(String),
    Assign {
        name: String,
        value: Box<Expr>,
    },
    Unary {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    /// Call of a runtime helper by name, e.g. `Math.sqrt` or `String`.
    Call {
        function: String,
        args: Vec<Expr>,
    },
    Method {
        receiver: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    Member {
        object: Box<Expr>,
        property: String,
    },
}

impl Expr {
    pub fn variable(name: impl Into<String>) -> Self {
        Expr::Variable(name.into())
    }

    pub fn assign(name: impl Into<String>, value: Expr) -> Self {
        Expr::Assign {
            name: name.into(),
            value: Box::new(value),
        }
    }

    pub fn unary(op: UnaryOperator, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOperator, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn conditional(condition: Expr, then: Expr, otherwise: Expr) -> Self {
        Expr::Conditional {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    pub fn call(function: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            function: function.into(),
            args,
        }
    }

    pub fn method(receiver: Expr, method: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Method {
            receiver: Box::new(receiver),
            method: method.into(),
            args,
        }
    }

    pub fn member(object: Expr, property: impl Into<String>) -> Self {
        Expr::Member {
            object: Box::new(object),
            property: property.into(),
        }
    }

    /// `String(expr)`: the display form used by every text kind.
    pub fn to_text(expr: Expr) -> Self {
        Expr::call("String", vec![expr])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expr(Expr),
    /// An empty `otherwise` means no else branch; a lone nested `If` renders
    /// as `else if`.
    If {
        condition: Expr,
        then: Vec<Stmt>,
        otherwise: Vec<Stmt>,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
    },
    For {
        init: Expr,
        condition: Expr,
        update: Expr,
        body: Vec<Stmt>,
    },
    ForEach {
        variable: String,
        sequence: Expr,
        body: Vec<Stmt>,
    },
    Break,
    Continue,
}

/// What a block kind produces when generated.
#[derive(Debug, Clone, PartialEq)]
pub enum Generated {
    Expression(Expr),
    Statements(Vec<Stmt>),
}

impl Generated {
    pub fn statement(stmt: Stmt) -> Self {
        Generated::Statements(vec![stmt])
    }
}

/// A generated program: the variables to declare up front, then the body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub variables: Vec<String>,
    pub body: Vec<Stmt>,
}
