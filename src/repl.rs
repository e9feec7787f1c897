// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Interactive REPL for the Monkey engine.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use monkey_engine::{Backend, Engine, Error, Value};
use owo_colors::OwoColorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Config, Editor, Helper};
use tracing::debug;

const HISTORY_FILE: &str = ".monkey_history";
const MAX_HISTORY_SIZE: usize = 1000;

const KEYWORDS: &[&str] = &["fn", "let", "if", "else", "return"];
const LITERALS: &[&str] = &["true", "false"];
const BUILTINS: &[&str] = &["len", "puts", "first", "last", "rest", "push"];
const COMMANDS: &[&str] = &[".help", ".exit", ".clear", ".version", ".load", ".engine"];

const MONKEY_FACE: &str = r#"            __,__
   .--.  .-"     "-.  .--.
  / .. \/  .-. .-.  \/ .. \
 | |  '|  /   Y   \  |'  | |
 | \   \  \ 0 | 0 /  /   / |
  \ '- ,\.-"""""""-./, -' /
   ''-' /_   ^ ^   _\ '-''
       |  \._   _./  |
       \   \ '~' /   /
        '._ '-=-' _.'
           '-----'
"#;

/// REPL commands that can be executed with a dot prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Exit,
    Clear,
    Version,
    Load,
    Engine,
}

impl ReplCommand {
    /// Parse a REPL command from input string
    pub fn parse(input: &str) -> Option<(Self, Option<&str>)> {
        let rest = input.trim().strip_prefix('.')?;
        let mut parts = rest.splitn(2, char::is_whitespace);
        let cmd = parts.next()?.to_lowercase();
        let arg = parts.next().map(str::trim).filter(|arg| !arg.is_empty());

        let command = match cmd.as_str() {
            "help" | "h" | "?" => ReplCommand::Help,
            "exit" | "quit" | "q" => ReplCommand::Exit,
            "clear" | "cls" => ReplCommand::Clear,
            "version" | "v" => ReplCommand::Version,
            "load" | "l" => ReplCommand::Load,
            "engine" | "e" => ReplCommand::Engine,
            _ => return None,
        };
        Some((command, arg))
    }

    /// Get all available commands for help/completion
    pub fn all_commands() -> &'static [(&'static str, &'static str)] {
        &[
            (".help", "Show this help message"),
            (".exit", "Exit the REPL"),
            (".clear", "Clear the screen"),
            (".version", "Show version information"),
            (".load <file>", "Load and execute a Monkey file"),
            (".engine <vm|eval>", "Show or switch the execution backend"),
        ]
    }
}

fn parse_backend(name: &str) -> Option<Backend> {
    match name.trim().to_lowercase().as_str() {
        "vm" => Some(Backend::Vm),
        "eval" | "evaluator" | "tree" => Some(Backend::TreeWalker),
        _ => None,
    }
}

/// Completion, hints, highlighting and multi-line validation for rustyline
struct MonkeyHelper {
    words: Vec<&'static str>,
}

impl MonkeyHelper {
    fn new() -> Self {
        let words = KEYWORDS
            .iter()
            .chain(LITERALS)
            .chain(BUILTINS)
            .chain(COMMANDS)
            .copied()
            .collect();
        Self { words }
    }

    fn candidates<'a>(&'a self, word: &'a str) -> impl Iterator<Item = &'static str> + 'a {
        self.words.iter().copied().filter(move |w| w.starts_with(word))
    }
}

/// Start of the word ending at `pos`.
fn word_start(line: &str, pos: usize) -> usize {
    line[..pos]
        .rfind(|c: char| !c.is_alphanumeric() && c != '_' && c != '.')
        .map(|i| i + 1)
        .unwrap_or(0)
}

impl Completer for MonkeyHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let word = &line[word_start(line, pos)..pos];
        if word.is_empty() {
            return Ok((pos, vec![]));
        }

        let matches = self
            .candidates(word)
            .map(|w| Pair {
                display: w.to_string(),
                replacement: w[word.len()..].to_string(),
            })
            .collect();
        Ok((pos, matches))
    }
}

impl Hinter for MonkeyHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<Self::Hint> {
        if pos < line.len() {
            return None;
        }

        let word = &line[word_start(line, pos)..];
        if word.len() < 2 {
            return None;
        }

        self.candidates(word)
            .find(|w| w.len() > word.len())
            .map(|w| (&w[word.len()..]).dimmed().to_string())
    }
}

impl Highlighter for MonkeyHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.trim_start().starts_with('.') {
            return Cow::Owned(line.magenta().to_string());
        }

        let mut result = String::with_capacity(line.len() * 2);
        let mut current_word = String::new();
        let mut in_string = false;

        for c in line.chars() {
            if in_string {
                result.push_str(&c.green().to_string());
                if c == '"' {
                    in_string = false;
                }
                continue;
            }
            if c.is_alphanumeric() || c == '_' {
                current_word.push(c);
                continue;
            }
            if !current_word.is_empty() {
                result.push_str(&highlight_word(&current_word));
                current_word.clear();
            }
            let colored = match c {
                '"' => {
                    in_string = true;
                    c.green().to_string()
                }
                '(' | ')' | '[' | ']' | '{' | '}' => c.yellow().to_string(),
                '+' | '-' | '*' | '/' | '=' | '<' | '>' | '!' => c.cyan().to_string(),
                _ => c.to_string(),
            };
            result.push_str(&colored);
        }

        if !current_word.is_empty() {
            result.push_str(&highlight_word(&current_word));
        }

        Cow::Owned(result)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

fn highlight_word(word: &str) -> String {
    if KEYWORDS.contains(&word) {
        word.magenta().bold().to_string()
    } else if LITERALS.contains(&word) {
        word.blue().to_string()
    } else if BUILTINS.contains(&word) {
        word.cyan().to_string()
    } else if word.chars().all(|c| c.is_ascii_digit()) {
        word.yellow().to_string()
    } else {
        word.to_string()
    }
}

impl Validator for MonkeyHelper {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> rustyline::Result<ValidationResult> {
        let input = ctx.input();
        if input.trim_start().starts_with('.') {
            return Ok(ValidationResult::Valid(None));
        }

        if !is_balanced(input) {
            return Ok(ValidationResult::Incomplete);
        }

        let trimmed = input.trim_end();
        if trimmed.ends_with(['+', '-', '*', '/', '=', ',', '<', '>', '!']) {
            return Ok(ValidationResult::Incomplete);
        }

        Ok(ValidationResult::Valid(None))
    }
}

/// Check if brackets, braces, and parentheses are balanced
fn is_balanced(input: &str) -> bool {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escape_next = false;

    for c in input.chars() {
        if escape_next {
            escape_next = false;
            continue;
        }

        if in_string {
            match c {
                '\\' => escape_next = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '(' => stack.push(')'),
            '[' => stack.push(']'),
            '{' => stack.push('}'),
            ')' | ']' | '}' => {
                if stack.pop() != Some(c) {
                    // Let the parser report the mismatch
                    return true;
                }
            }
            _ => {}
        }
    }

    stack.is_empty() && !in_string
}

impl Helper for MonkeyHelper {}

/// The interactive REPL
pub struct Repl {
    engine: Engine,
    editor: Editor<MonkeyHelper, DefaultHistory>,
    history_path: PathBuf,
}

impl Repl {
    /// Create a REPL around an engine session
    pub fn new(engine: Engine) -> rustyline::Result<Self> {
        let config = Config::builder()
            .history_ignore_dups(true)?
            .history_ignore_space(true)
            .max_history_size(MAX_HISTORY_SIZE)?
            .auto_add_history(true)
            .build();

        let mut editor = Editor::with_config(config)?;
        editor.set_helper(Some(MonkeyHelper::new()));

        let history_path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("monkey")
            .join(HISTORY_FILE);

        if let Some(parent) = history_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if editor.load_history(&history_path).is_err() {
            debug!(path = %history_path.display(), "no history loaded");
        }

        Ok(Self {
            engine,
            editor,
            history_path,
        })
    }

    /// Run the REPL main loop
    pub fn run(&mut self) -> rustyline::Result<()> {
        self.print_banner();

        loop {
            let prompt = format!("{} ", ">>".bright_green().bold());

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    if let Some((cmd, arg)) = ReplCommand::parse(trimmed) {
                        match self.execute_command(cmd, arg) {
                            CommandResult::Continue => continue,
                            CommandResult::Exit => break,
                        }
                    }

                    self.eval_and_print(trimmed);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "^C".dimmed());
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", "^D".dimmed());
                    break;
                }
                Err(err) => {
                    eprintln!("{}: {:?}", "Error".red().bold(), err);
                    break;
                }
            }
        }

        if let Err(e) = self.editor.save_history(&self.history_path) {
            debug!(error = %e, "failed to save history");
        }
        Ok(())
    }

    fn print_banner(&self) {
        println!();
        println!(
            "  {} {} {}",
            "Monkey".bright_yellow().bold(),
            "v".dimmed(),
            env!("CARGO_PKG_VERSION").yellow()
        );
        println!(
            "  {} {}",
            "backend:".dimmed(),
            self.engine.backend().to_string().cyan()
        );
        println!(
            "  {} {} {}",
            "Type".dimmed(),
            ".help".cyan(),
            "for available commands".dimmed()
        );
        println!();
    }

    fn execute_command(&mut self, cmd: ReplCommand, arg: Option<&str>) -> CommandResult {
        match cmd {
            ReplCommand::Help => self.print_help(),
            ReplCommand::Exit => return CommandResult::Exit,
            ReplCommand::Clear => print!("\x1B[2J\x1B[H"),
            ReplCommand::Version => {
                println!("{} {}", "monkey".bright_yellow().bold(), env!("CARGO_PKG_VERSION").yellow());
            }
            ReplCommand::Load => match arg {
                Some(path) => self.load_file(Path::new(path)),
                None => eprintln!("{}: {} requires a file path", "Error".red().bold(), ".load".cyan()),
            },
            ReplCommand::Engine => match arg.map(parse_backend) {
                None => println!("{} {}", "backend:".dimmed(), self.engine.backend().to_string().cyan()),
                Some(Some(backend)) => {
                    self.engine.set_backend(backend);
                    println!("{} {}", "switched to".dimmed(), backend.to_string().cyan());
                }
                Some(None) => eprintln!(
                    "{}: unknown backend, expected {} or {}",
                    "Error".red().bold(),
                    "vm".cyan(),
                    "eval".cyan()
                ),
            },
        }
        CommandResult::Continue
    }

    fn print_help(&self) {
        println!();
        println!("{}", "REPL Commands:".white().bold());
        println!();
        for (cmd, desc) in ReplCommand::all_commands() {
            println!("  {:20} {}", cmd.cyan(), desc.dimmed());
        }
        println!();
        println!("{}", "Keyboard Shortcuts:".white().bold());
        println!();
        println!("  {:20} {}", "Ctrl+C".yellow(), "Cancel current input".dimmed());
        println!("  {:20} {}", "Ctrl+D".yellow(), "Exit REPL".dimmed());
        println!("  {:20} {}", "Tab".yellow(), "Autocomplete".dimmed());
        println!();
    }

    fn load_file(&mut self, path: &Path) {
        match std::fs::read_to_string(path) {
            Ok(source) => self.eval_and_print(&source),
            Err(e) => eprintln!("{}: {}: {}", "Error".red().bold(), path.display(), e),
        }
    }

    fn eval_and_print(&mut self, input: &str) {
        match self.engine.eval(input) {
            Ok(value) => println!("{}", format_value(&value)),
            Err(e) => print_error(&e),
        }
    }
}

/// Result of executing a REPL command
enum CommandResult {
    Continue,
    Exit,
}

/// Format a value for display with syntax coloring
fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".blue().to_string(),
        Value::Integer(_) | Value::Boolean(_) => value.yellow().to_string(),
        Value::String(s) => format!("{:?}", &**s).green().to_string(),
        Value::Function(_) | Value::Builtin(_) | Value::CompiledFunction(_) | Value::Closure(_) => {
            value.magenta().to_string()
        }
        Value::Array(_) | Value::Hash(_) => value.to_string(),
    }
}

fn print_error(error: &Error) {
    match error {
        Error::Parse(errors) => {
            eprint!("{}", MONKEY_FACE.yellow());
            eprintln!("{}", "Woops! We ran into some monkey business here!".red().bold());
            eprintln!(" parser errors:");
            for e in errors.iter() {
                eprintln!("\t{}", e);
            }
        }
        Error::Compile(errors) => {
            for e in errors.iter() {
                eprintln!("{}: {}", "Compile error".red().bold(), e);
            }
        }
        Error::Runtime(e) => eprintln!("{}: {}", "Runtime error".red().bold(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repl_command_parse() {
        assert_eq!(ReplCommand::parse(".help"), Some((ReplCommand::Help, None)));
        assert_eq!(ReplCommand::parse(" .exit "), Some((ReplCommand::Exit, None)));
        assert_eq!(
            ReplCommand::parse(".load prog.mk"),
            Some((ReplCommand::Load, Some("prog.mk")))
        );
        assert_eq!(ReplCommand::parse(".engine eval"), Some((ReplCommand::Engine, Some("eval"))));
        assert_eq!(ReplCommand::parse(".bogus"), None);
        assert_eq!(ReplCommand::parse("let a = 1;"), None);
    }

    #[test]
    fn test_parse_backend() {
        assert_eq!(parse_backend("vm"), Some(Backend::Vm));
        assert_eq!(parse_backend(" EVAL "), Some(Backend::TreeWalker));
        assert_eq!(parse_backend("jit"), None);
    }

    #[test]
    fn test_is_balanced() {
        assert!(is_balanced("(1 + 2)"));
        assert!(is_balanced(r#"{"a": [1, 2]}"#));
        assert!(is_balanced("fn(x) { x * 2 }"));
        assert!(!is_balanced("fn(x) {"));
        assert!(!is_balanced("[1, 2"));
        assert!(is_balanced(r#""string with (unbalanced""#));
        assert!(is_balanced(r#""escaped \" quote {""#));
        assert!(!is_balanced(r#""unterminated"#));
    }

    #[test]
    fn test_completion_candidates() {
        let helper = MonkeyHelper::new();
        let found: Vec<_> = helper.candidates("pu").collect();
        assert_eq!(found, vec!["puts", "push"]);
        assert_eq!(helper.candidates(".en").collect::<Vec<_>>(), vec![".engine"]);
    }

    #[test]
    fn test_format_value_text() {
        let plain = |v: &Value| {
            let colored = format_value(v);
            colored.contains(&v.to_string())
        };
        assert!(plain(&Value::Integer(5)));
        assert!(plain(&Value::array(vec![Value::Integer(1)])));
    }
}
