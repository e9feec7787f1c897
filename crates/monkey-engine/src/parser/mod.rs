//! Parser for Monkey source code.
//!
//! Transforms a stream of tokens into an Abstract Syntax Tree (AST).
//!
//! ## Precedence Table (lowest to highest)
//!
//! | Precedence | Operators |
//! |------------|-----------|
//! | 1 | `==` `!=` |
//! | 2 | `<` `>` |
//! | 3 | `+` `-` |
//! | 4 | `*` `/` |
//! | 5 | `!x` `-x` |
//! | 6 | `f(x)` |
//! | 7 | `a[i]` |
//!
//! ## Usage
//!
//! ```rust
//! use monkey_engine::parser::Parser;
//!
//! let mut parser = Parser::new("let x = 1 + 2;");
//! let program = parser.parse_program().expect("Should parse");
//! assert_eq!(program.to_string(), "let x = (1 + 2);");
//! ```

mod parser;


pub use parser::Parser;
