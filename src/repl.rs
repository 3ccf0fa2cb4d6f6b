use anyhow::{anyhow, bail, Context, Result};
use itertools::Itertools;
use std::fmt::Write as _;
use std::io::{BufRead, Write};

use crate::env;
use crate::fraction::{Fraction, MAX_DENOMINATOR, TOLERANCE};
use crate::util::is_identifier;
use crate::Calculator;

const WELCOME: &str = "
========================================
         rcalc - CLI Calculator
   Type 'help' for available commands
========================================

";

const HELP: &str = "
=== Available Commands ===
  help              - Show this help message
  history           - Show calculation history
  clear             - Clear calculation history
  precision <n>     - Set decimal precision (1-20)
  tofrac            - Convert last result to fraction
  vars              - Show all variables
  clearVars         - Clear all variables
  exit / quit       - Exit calculator

=== Operators ===
  +  -  *  /        - Basic arithmetic
  ^                 - Exponentiation (left-associative)
  %                 - Modulo (remainder)
  2(3+4), 2pi       - Implicit multiplication

=== Functions ===
  Trigonometric: sin, cos, tan, asin, acos, atan
  Logarithmic:   log, log10, ln, exp
  Other:         sqrt, abs, floor, ceil, round, pow(a, b)

=== Constants ===
  pi                - Ratio of circumference to diameter
  e                 - Euler's number
  phi               - Golden ratio

=== Variables ===
  a = 5             - Assign variable
  a * 2             - Use variable in expression
  ans               - Last calculation result

";

// A single line of input, after trimming
#[derive(Debug, PartialEq)]
enum Command<'a> {
    Empty,
    Exit,
    Help,
    History,
    ClearHistory,
    Precision(&'a str),
    ToFraction,
    Vars,
    ClearVars,
    Assign(&'a str, &'a str),
    Eval(&'a str)
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        match line {
            "" => Command::Empty,
            "exit" | "quit" => Command::Exit,
            "help" => Command::Help,
            "history" => Command::History,
            "clear" => Command::ClearHistory,
            "tofrac" => Command::ToFraction,
            "vars" => Command::Vars,
            "clearVars" => Command::ClearVars,
            _ => {
                if let Some(arg) = line.strip_prefix("precision") {
                    if arg.is_empty() || arg.starts_with(char::is_whitespace) {
                        return Command::Precision(arg.trim());
                    }
                }
                // `name = expr` is an assignment if the left side at least starts like a name
                match line.split_once('=') {
                    Some((name, expr)) if name.trim_start().starts_with(|c: char| c.is_ascii_alphabetic()) => {
                        Command::Assign(name.trim(), expr.trim())
                    },
                    _ => Command::Eval(line)
                }
            }
        }
    }
}

pub struct Repl {
    calculator: Calculator,
    history: Vec<String>,
    running: bool
}

impl Repl {
    pub fn new(calculator: Calculator) -> Self {
        Repl {
            calculator,
            history: vec![],
            running: true
        }
    }

    pub fn calculator(&self) -> &Calculator { &self.calculator }
    pub fn history(&self) -> &[String] { &self.history }
    pub fn is_running(&self) -> bool { self.running }

    // Handle one line of user input, writing whatever it prints to `out`.
    // Failed commands print an error line; only I/O failures are returned.
    pub fn process_line<W: Write>(&mut self, input: &str, out: &mut W) -> Result<()> {
        match self.execute(Command::parse(input)) {
            Ok(text) => out.write_all(text.as_bytes())?,
            Err(e) => writeln!(out, "Error: {:#}", e)?
        }
        Ok(())
    }

    // Same as process_line, collected into a string for hosts without a writer
    pub fn render_line(&mut self, input: &str) -> String {
        let mut out = Vec::new();
        match self.process_line(input, &mut out) {
            Ok(()) => String::from_utf8_lossy(&out).into_owned(),
            Err(e) => format!("Error: {:#}\n", e)
        }
    }

    fn execute(&mut self, command: Command) -> Result<String> {
        let mut out = String::new();
        match command {
            Command::Empty => (),
            Command::Exit => self.running = false,
            Command::Help => out.push_str(HELP),
            Command::History => {
                if self.history.is_empty() {
                    writeln!(out, "History is empty")?;
                } else {
                    writeln!(out, "\n=== Calculation History ===")?;
                    for (i, entry) in self.history.iter().enumerate() {
                        writeln!(out, "[{}] {}", i + 1, entry)?;
                    }
                    writeln!(out)?;
                }
            },
            Command::ClearHistory => {
                self.history.clear();
                writeln!(out, "History cleared")?;
            },
            Command::Precision(arg) => {
                if arg.is_empty() {
                    bail!("precision requires a value");
                }
                let digits: usize = arg.parse().with_context(|| format!("invalid precision value: {}", arg))?;
                self.calculator.set_precision(digits)?;
                writeln!(out, "Precision set to {} digits", digits)?;
            },
            Command::ToFraction => {
                let last = self.calculator.last_result();
                let approximation = Fraction::approximate(last, MAX_DENOMINATOR, TOLERANCE)
                    .ok_or_else(|| anyhow!("cannot convert {} to a fraction", self.calculator.format_result(last)))?;
                let fraction = approximation.fraction;
                writeln!(out, "Fraction: {}", fraction)?;
                if fraction.denominator != 1 && fraction.numerator.abs() > fraction.denominator {
                    writeln!(out, "Mixed:    {}", fraction.mixed())?;
                }
                writeln!(out, "Decimal:  {}", self.calculator.format_result(fraction.to_f64()))?;
            },
            Command::Vars => {
                writeln!(out, "ans = {}", self.calculator.format_result(self.calculator.last_result()))?;
                let vars = self.calculator.variables().sorted_by(|a, b| a.0.cmp(b.0)).collect_vec();
                if vars.is_empty() {
                    writeln!(out, "No user variables defined")?;
                }
                for (name, value) in vars {
                    writeln!(out, "{} = {}", name, self.calculator.format_result(value))?;
                }
            },
            Command::ClearVars => {
                self.calculator.clear_variables();
                writeln!(out, "Variables cleared")?;
            },
            Command::Assign(name, expr) => {
                if !is_identifier(name) {
                    bail!("invalid variable name: {}", name);
                }
                if env::is_reserved(name) {
                    bail!("cannot assign to reserved name: {}", name);
                }
                let result = self.calculator.calculate(expr)?;
                self.calculator.set_variable(name, result);
                writeln!(out, "{} = {}", name, self.calculator.format_result(result))?;
                self.history.push(format!("{} = {}", name, expr));
            },
            Command::Eval(expr) => {
                let result = self.calculator.calculate(expr)?;
                writeln!(out, "{}", self.calculator.format_result(result))?;
                self.history.push(expr.to_string());
            }
        }
        Ok(out)
    }

    // Prompt, read and process lines until input runs out or the user exits
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<()> {
        out.write_all(WELCOME.as_bytes())?;
        let mut lines = input.lines();
        while self.running {
            write!(out, "> ")?;
            out.flush()?;
            let line = match lines.next() {
                Some(line) => line.context("reading input")?,
                None => break
            };
            self.process_line(&line, out)?;
        }
        writeln!(out, "\nGoodbye!")?;
        Ok(())
    }
}
