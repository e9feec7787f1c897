//! Abstract Syntax Tree (AST) definitions for Monkey.
//!
//! Every node implements `Display`, rendering the canonical fully
//! parenthesised form of the source (`((-a) * b)`). Tests use it to check
//! operator precedence and the tree-walking evaluator uses it to render
//! function values.

use std::fmt;

use crate::lexer::TokenKind;

/// A complete Monkey program.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    /// The top-level statements in the program
    pub statements: Vec<Statement>,
}

/// An identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    /// The name of the identifier
    pub name: String,
}

impl Identifier {
    /// Creates a new identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A Monkey statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `let <name> = <value>;`
    Let(LetStatement),
    /// `return <value>;`
    Return(ReturnStatement),
    /// A bare expression used as a statement
    Expression(ExpressionStatement),
}

/// A `let` binding.
#[derive(Debug, Clone, PartialEq)]
pub struct LetStatement {
    /// The bound name
    pub name: Identifier,
    /// The bound value
    pub value: Expression,
}

/// A `return` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    /// The returned value
    pub value: Expression,
}

/// An expression statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStatement {
    /// The expression
    pub expression: Expression,
}

/// A brace-delimited list of statements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlockStatement {
    /// The statements in the block
    pub statements: Vec<Statement>,
}

/// A Monkey expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A name reference
    Identifier(Identifier),
    /// Integer literal
    Integer(i64),
    /// String literal
    String(String),
    /// `true` or `false`
    Boolean(bool),
    /// `!x`, `-x`
    Prefix(PrefixExpression),
    /// `a + b`, `a == b`, ...
    Infix(InfixExpression),
    /// `if (cond) { ... } else { ... }`
    If(IfExpression),
    /// `fn(a, b) { ... }`
    Function(FunctionLiteral),
    /// `f(a, b)`
    Call(CallExpression),
    /// `[a, b]`
    Array(ArrayLiteral),
    /// `a[i]`
    Index(IndexExpression),
    /// `{k: v}`
    Hash(HashLiteral),
}

/// A prefix operator applied to one operand.
#[derive(Debug, Clone, PartialEq)]
pub struct PrefixExpression {
    /// The operator token (`!` or `-` when produced by the parser)
    pub operator: TokenKind,
    /// The operand
    pub right: Box<Expression>,
}

/// A binary operator applied to two operands.
#[derive(Debug, Clone, PartialEq)]
pub struct InfixExpression {
    /// The left operand
    pub left: Box<Expression>,
    /// The operator token
    pub operator: TokenKind,
    /// The right operand
    pub right: Box<Expression>,
}

/// A conditional expression.
#[derive(Debug, Clone, PartialEq)]
pub struct IfExpression {
    /// The condition
    pub condition: Box<Expression>,
    /// The branch taken when the condition is truthy
    pub consequence: BlockStatement,
    /// The optional branch taken otherwise
    pub alternative: Option<BlockStatement>,
}

/// A function literal.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionLiteral {
    /// The name the literal is bound to, when it is the value of a `let`
    pub name: Option<String>,
    /// The parameters
    pub parameters: Vec<Identifier>,
    /// The function body
    pub body: BlockStatement,
}

/// A call expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    /// The callee
    pub function: Box<Expression>,
    /// The arguments
    pub arguments: Vec<Expression>,
}

/// An array literal.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayLiteral {
    /// The elements
    pub elements: Vec<Expression>,
}

/// An index expression.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpression {
    /// The indexed value
    pub left: Box<Expression>,
    /// The index
    pub index: Box<Expression>,
}

/// A hash literal. Pairs keep their source order.
#[derive(Debug, Clone, PartialEq)]
pub struct HashLiteral {
    /// The key/value pairs
    pub pairs: Vec<(Expression, Expression)>,
}

fn join<T: fmt::Display>(items: &[T], separator: &str) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(separator)
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for statement in &self.statements {
            write!(f, "{}", statement)?;
        }
        Ok(())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Let(stmt) => write!(f, "let {} = {};", stmt.name, stmt.value),
            Statement::Return(stmt) => write!(f, "return {};", stmt.value),
            Statement::Expression(stmt) => write!(f, "{}", stmt.expression),
        }
    }
}

impl fmt::Display for BlockStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for statement in &self.statements {
            write!(f, "{}", statement)?;
        }
        Ok(())
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Identifier(ident) => write!(f, "{}", ident),
            Expression::Integer(value) => write!(f, "{}", value),
            Expression::String(value) => write!(f, "{}", value),
            Expression::Boolean(value) => write!(f, "{}", value),
            Expression::Prefix(prefix) => write!(f, "({}{})", prefix.operator, prefix.right),
            Expression::Infix(infix) => {
                write!(f, "({} {} {})", infix.left, infix.operator, infix.right)
            }
            Expression::If(if_expr) => {
                write!(f, "if{} {}", if_expr.condition, if_expr.consequence)?;
                if let Some(alternative) = &if_expr.alternative {
                    write!(f, "else {}", alternative)?;
                }
                Ok(())
            }
            Expression::Function(func) => write!(f, "{}", func),
            Expression::Call(call) => {
                write!(f, "{}({})", call.function, join(&call.arguments, ", "))
            }
            Expression::Array(array) => write!(f, "[{}]", join(&array.elements, ", ")),
            Expression::Index(index) => write!(f, "({}[{}])", index.left, index.index),
            Expression::Hash(hash) => {
                let pairs: Vec<String> = hash
                    .pairs
                    .iter()
                    .map(|(key, value)| format!("{}:{}", key, value))
                    .collect();
                write!(f, "{{{}}}", pairs.join(", "))
            }
        }
    }
}

impl fmt::Display for FunctionLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn")?;
        if let Some(name) = &self.name {
            write!(f, "<{}>", name)?;
        }
        write!(f, "({}) {}", join(&self.parameters, ", "), self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_let_statement_display() {
        let program = Program {
            statements: vec![Statement::Let(LetStatement {
                name: Identifier::new("myVar"),
                value: Expression::Identifier(Identifier::new("anotherVar")),
            })],
        };
        assert_eq!(program.to_string(), "let myVar = anotherVar;");
    }

    #[test]
    fn test_nested_expression_display() {
        let expr = Expression::Infix(InfixExpression {
            left: Box::new(Expression::Prefix(PrefixExpression {
                operator: TokenKind::Minus,
                right: Box::new(Expression::Identifier(Identifier::new("a"))),
            })),
            operator: TokenKind::Asterisk,
            right: Box::new(Expression::Identifier(Identifier::new("b"))),
        });
        assert_eq!(expr.to_string(), "((-a) * b)");
    }

    #[test]
    fn test_named_function_display() {
        let func = FunctionLiteral {
            name: Some("add".into()),
            parameters: vec![Identifier::new("x"), Identifier::new("y")],
            body: BlockStatement::default(),
        };
        assert_eq!(func.to_string(), "fn<add>(x, y) ");
    }
}
