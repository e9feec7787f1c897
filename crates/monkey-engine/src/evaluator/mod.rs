//! Tree-walking evaluator.
//!
//! Evaluates the AST directly against an [`Environment`] chain. It shares
//! operator semantics and builtins with the VM, and serves as the reference
//! the VM's results are checked against.

use std::rc::Rc;

use tracing::trace;

use crate::ast::*;
use crate::builtins;
use crate::error::RuntimeError;
use crate::lexer::TokenKind;
use crate::runtime::environment::{Env, Environment};
use crate::runtime::function::Function;
use crate::runtime::operators::{self, BinaryOp, PrefixOp};
use crate::runtime::value::Value;
use crate::vm::MAX_FRAMES;

/// Maximum nesting of function calls before evaluation fails with
/// [`RuntimeError::StackOverflow`]. Matches the VM's frame limit.
pub const MAX_CALL_DEPTH: usize = MAX_FRAMES - 1;

/// Why evaluation of a statement stopped early.
enum Interrupt {
    /// A `return` is unwinding to the enclosing call
    Return(Value),
    /// Evaluation failed
    Error(RuntimeError),
}

impl From<RuntimeError> for Interrupt {
    fn from(error: RuntimeError) -> Self {
        Interrupt::Error(error)
    }
}

type Flow<T> = Result<T, Interrupt>;

/// Evaluates a program in `env`.
pub fn eval_program(program: &Program, env: &Env) -> Result<Value, RuntimeError> {
    Evaluator::new().eval_program(program, env)
}

/// Evaluation state.
#[derive(Debug, Default)]
pub struct Evaluator {
    depth: usize,
}

impl Evaluator {
    /// Creates a new evaluator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluates a program, returning the value of its last statement.
    ///
    /// A top-level `return` ends the program with its value; a `let` as the
    /// last statement yields null.
    pub fn eval_program(&mut self, program: &Program, env: &Env) -> Result<Value, RuntimeError> {
        let mut result = Value::Null;
        for statement in &program.statements {
            match self.eval_statement(statement, env) {
                Ok(value) => result = value,
                Err(Interrupt::Return(value)) => return Ok(value),
                Err(Interrupt::Error(error)) => return Err(error),
            }
        }
        Ok(result)
    }

    fn eval_statement(&mut self, statement: &Statement, env: &Env) -> Flow<Value> {
        match statement {
            Statement::Let(stmt) => {
                let value = self.eval_expression(&stmt.value, env)?;
                env.borrow_mut().set(stmt.name.name.clone(), value);
                Ok(Value::Null)
            }
            Statement::Return(stmt) => {
                let value = self.eval_expression(&stmt.value, env)?;
                Err(Interrupt::Return(value))
            }
            Statement::Expression(stmt) => self.eval_expression(&stmt.expression, env),
        }
    }

    fn eval_block(&mut self, block: &BlockStatement, env: &Env) -> Flow<Value> {
        let mut result = Value::Null;
        for statement in &block.statements {
            result = self.eval_statement(statement, env)?;
        }
        Ok(result)
    }

    fn eval_expression(&mut self, expression: &Expression, env: &Env) -> Flow<Value> {
        ensure_sufficient_stack(|| self.eval_expression_inner(expression, env))
    }

    fn eval_expression_inner(&mut self, expression: &Expression, env: &Env) -> Flow<Value> {
        match expression {
            Expression::Integer(n) => Ok(Value::Integer(*n)),
            Expression::String(s) => Ok(Value::string(s)),
            Expression::Boolean(b) => Ok(Value::Boolean(*b)),
            Expression::Identifier(ident) => Ok(lookup(&ident.name, env)?),
            Expression::Prefix(prefix) => {
                let right = self.eval_expression(&prefix.right, env)?;
                let op = match prefix.operator {
                    TokenKind::Bang => PrefixOp::Not,
                    TokenKind::Minus => PrefixOp::Negate,
                    ref other => {
                        return Err(RuntimeError::UnknownPrefixOperator {
                            operator: other.to_string(),
                            operand: right.type_name(),
                        }
                        .into());
                    }
                };
                Ok(operators::prefix(op, &right)?)
            }
            Expression::Infix(infix) if infix.operator == TokenKind::Lt => {
                // Same operand order and operator as the compiled form
                let right = self.eval_expression(&infix.right, env)?;
                let left = self.eval_expression(&infix.left, env)?;
                Ok(operators::binary(BinaryOp::GreaterThan, &right, &left)?)
            }
            Expression::Infix(infix) => {
                let left = self.eval_expression(&infix.left, env)?;
                let right = self.eval_expression(&infix.right, env)?;
                let op = binary_op(&infix.operator).ok_or_else(|| {
                    RuntimeError::UnknownInfixOperator {
                        left: left.type_name(),
                        operator: infix.operator.to_string(),
                        right: right.type_name(),
                    }
                })?;
                Ok(operators::binary(op, &left, &right)?)
            }
            Expression::If(if_expr) => {
                let condition = self.eval_expression(&if_expr.condition, env)?;
                if condition.is_truthy() {
                    self.eval_block(&if_expr.consequence, env)
                } else if let Some(alternative) = &if_expr.alternative {
                    self.eval_block(alternative, env)
                } else {
                    Ok(Value::Null)
                }
            }
            Expression::Function(func) => Ok(Value::Function(Rc::new(Function {
                parameters: func.parameters.clone(),
                body: func.body.clone(),
                env: Rc::clone(env),
            }))),
            Expression::Call(call) => {
                let function = self.eval_expression(&call.function, env)?;
                let mut arguments = Vec::with_capacity(call.arguments.len());
                for argument in &call.arguments {
                    arguments.push(self.eval_expression(argument, env)?);
                }
                Ok(self.apply_function(&function, arguments)?)
            }
            Expression::Array(array) => {
                let mut elements = Vec::with_capacity(array.elements.len());
                for element in &array.elements {
                    elements.push(self.eval_expression(element, env)?);
                }
                Ok(Value::array(elements))
            }
            Expression::Hash(hash) => {
                let mut pairs = Vec::with_capacity(hash.pairs.len());
                for (key, value) in &hash.pairs {
                    let key = self.eval_expression(key, env)?;
                    let value = self.eval_expression(value, env)?;
                    pairs.push((key, value));
                }
                Ok(Value::hash(pairs)?)
            }
            Expression::Index(index) => {
                let left = self.eval_expression(&index.left, env)?;
                let index = self.eval_expression(&index.index, env)?;
                Ok(operators::index(&left, &index)?)
            }
        }
    }

    fn apply_function(&mut self, function: &Value, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
        match function {
            Value::Function(func) => {
                if arguments.len() != func.arity() {
                    return Err(RuntimeError::WrongArgumentCount {
                        want: func.arity(),
                        got: arguments.len(),
                    });
                }
                if self.depth >= MAX_CALL_DEPTH {
                    return Err(RuntimeError::StackOverflow);
                }

                let call_env = Environment::new_enclosed(&func.env);
                for (parameter, argument) in func.parameters.iter().zip(arguments) {
                    call_env.borrow_mut().set(parameter.name.clone(), argument);
                }

                self.depth += 1;
                trace!(depth = self.depth, "enter function");
                let result = self.eval_block(&func.body, &call_env);
                self.depth -= 1;

                match result {
                    Ok(value) | Err(Interrupt::Return(value)) => Ok(value),
                    Err(Interrupt::Error(error)) => Err(error),
                }
            }
            Value::Builtin(builtin) => builtin.call(&arguments),
            other => Err(RuntimeError::NotCallable(other.type_name())),
        }
    }
}

/// Runs `f`, first moving to a fresh stack segment when the current one is
/// nearly exhausted. Host stack use then no longer bounds call depth.
#[inline]
fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    const RED_ZONE: usize = 128 * 1024;
    const NEW_SEGMENT: usize = 1024 * 1024;

    stacker::maybe_grow(RED_ZONE, NEW_SEGMENT, f)
}

fn lookup(name: &str, env: &Env) -> Result<Value, RuntimeError> {
    if let Some(value) = env.borrow().get(name) {
        return Ok(value);
    }
    builtins::lookup(name)
        .map(Value::Builtin)
        .ok_or_else(|| RuntimeError::IdentifierNotFound(name.to_string()))
}

fn binary_op(token: &TokenKind) -> Option<BinaryOp> {
    let op = match token {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Asterisk => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Eq => BinaryOp::Equal,
        TokenKind::NotEq => BinaryOp::NotEqual,
        TokenKind::Gt => BinaryOp::GreaterThan,
        _ => return None,
    };
    Some(op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn eval(src: &str) -> Result<Value, RuntimeError> {
        let program = Parser::new(src)
            .parse_program()
            .unwrap_or_else(|errors| panic!("parser errors for {:?}:\n{}", src, errors));
        eval_program(&program, &Environment::new())
    }

    fn check(cases: &[(&str, Value)]) {
        for (src, expected) in cases {
            match eval(src) {
                Ok(value) => assert_eq!(&value, expected, "input: {}", src),
                Err(error) => panic!("runtime error for {:?}: {}", src, error),
            }
        }
    }

    fn check_error(src: &str, message: &str) {
        match eval(src) {
            Ok(value) => panic!("expected error for {:?}, got {}", src, value),
            Err(error) => assert_eq!(error.to_string(), message, "input: {}", src),
        }
    }

    fn int(n: i64) -> Value {
        Value::Integer(n)
    }

    #[test]
    fn test_integer_and_boolean_expressions() {
        check(&[
            ("5", int(5)),
            ("-10", int(-10)),
            ("2 * (5 + 10)", int(30)),
            ("(5 + 10 * 2 + 15 / 3) * 2 + -10", int(50)),
            ("1 < 2", Value::Boolean(true)),
            ("(1 > 2) == false", Value::Boolean(true)),
            ("!!true", Value::Boolean(true)),
            ("!5", Value::Boolean(false)),
        ]);
    }

    #[test]
    fn test_if_else_expressions() {
        check(&[
            ("if (true) { 10 }", int(10)),
            ("if (false) { 10 }", Value::Null),
            ("if (1 > 2) { 10 } else { 20 }", int(20)),
            ("if (true) { let a = 1; }", Value::Null),
        ]);
    }

    #[test]
    fn test_return_statements() {
        check(&[
            ("return 10; 9;", int(10)),
            ("9; return 2 * 5; 9;", int(10)),
            ("if (10 > 1) { if (10 > 1) { return 10; } return 1; }", int(10)),
            ("let f = fn(x) { return x; x + 10; }; f(10);", int(10)),
        ]);
    }

    #[test]
    fn test_let_statements() {
        check(&[
            ("let a = 5; a;", int(5)),
            ("let a = 5; let b = a; let c = a + b + 5; c;", int(15)),
            ("let a = 5;", Value::Null),
            ("let a = 1; let a = a + 1; a", int(2)),
        ]);
    }

    #[test]
    fn test_function_application_and_closures() {
        check(&[
            ("let identity = fn(x) { x; }; identity(5);", int(5)),
            ("let add = fn(x, y) { x + y; }; add(5 + 5, add(5, 5));", int(20)),
            ("fn(x) { x; }(5)", int(5)),
            ("let addTwo = fn(x) { fn(y) { x + y } }; addTwo(2)(3);", int(5)),
            (
                "let factorial = fn(n) { if (n == 0) { 1 } else { n * factorial(n - 1) } }; factorial(5);",
                int(120),
            ),
        ]);
    }

    #[test]
    fn test_function_display() {
        let value = eval("fn(x) { x + 2; };").expect("evaluates");
        assert_eq!(value.to_string(), "fn(x) {\n(x + 2)\n}");
    }

    #[test]
    fn test_builtins_and_collections() {
        check(&[
            (r#"len("hello")"#, int(5)),
            ("rest(push([1], 2))", Value::array(vec![int(2)])),
            (r#"{"a": 1}["a"]"#, int(1)),
            ("[1, 2, 3][3]", Value::Null),
        ]);
    }

    #[test]
    fn test_error_handling() {
        check_error("5 + true;", "type mismatch: INTEGER + BOOLEAN");
        check_error("5 + true; 5;", "type mismatch: INTEGER + BOOLEAN");
        check_error("-true", "unknown operator: -BOOLEAN");
        check_error("true + false;", "unknown operator: BOOLEAN + BOOLEAN");
        check_error("if (10 > 1) { true + false; }", "unknown operator: BOOLEAN + BOOLEAN");
        check_error(r#""Hello" - "World""#, "unknown operator: STRING - STRING");
        check_error("foobar", "identifier not found: foobar");
        check_error(r#"{"name": "Monkey"}[fn(x) { x }];"#, "unusable as hash key: FUNCTION");
        check_error("fn(a) { a }()", "wrong number of arguments: want=1, got=0");
        check_error("1(2)", "not a function: INTEGER");
    }

    #[test]
    fn test_runaway_recursion_is_stack_overflow() {
        assert_eq!(eval("let f = fn(x) { f(x + 1) }; f(0);"), Err(RuntimeError::StackOverflow));
        assert_eq!(
            eval("let f = fn(a, b, c) { f(a, b, c) }; f(1, 2, 3);"),
            Err(RuntimeError::StackOverflow)
        );
    }

    #[test]
    fn test_deep_recursion_below_limit() {
        let src = "let c = fn(x) { if (x == 0) { 0 } else { c(x - 1) } }; c(1000)";
        assert_eq!(eval(src), Ok(Value::Integer(0)));
    }

    #[test]
    fn test_less_than_matches_compiled_form() {
        assert_eq!(eval("1 < 2"), Ok(Value::Boolean(true)));
        assert_eq!(eval("2 < 1"), Ok(Value::Boolean(false)));
        assert_eq!(
            eval("1 < true").map_err(|e| e.to_string()),
            Err("type mismatch: BOOLEAN > INTEGER".to_string())
        );
    }
}
