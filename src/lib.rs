use anyhow::{Result, anyhow, bail};
use inlinable_string::InlinableString;
#[cfg(target_family="wasm")]
use std::cell::RefCell;
#[cfg(target_family="wasm")]
use wasm_bindgen::prelude::*;

#[cfg(target_family="wasm")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

pub mod env;
pub mod error;
pub mod fraction;
pub mod parse;
pub mod repl;
pub mod value;
mod util;

pub use error::{Error, ErrorKind};
pub use fraction::Fraction;
pub use parse::evaluate;

use env::{Bindings, Variables};
use value::{format_result, DEFAULT_PRECISION, MAX_PRECISION, MIN_PRECISION};

// Name under which the last result can be used in expressions
pub const ANS: &str = "ans";

// Owns everything which persists between expressions: user variables, output precision and the last result
pub struct Calculator {
    variables: Bindings,
    precision: usize,
    last_result: f64
}

impl Default for Calculator {
    fn default() -> Self {
        Calculator {
            variables: Bindings::default(),
            precision: DEFAULT_PRECISION,
            last_result: 0.0
        }
    }
}

// User variables shadow `ans`
impl Variables for Calculator {
    fn get(&self, name: &str) -> Option<f64> {
        match self.variables.get(name) {
            Some(value) => Some(*value),
            None if name == ANS => Some(self.last_result),
            None => None
        }
    }
}

impl Calculator {
    pub fn new() -> Self {
        Self::default()
    }

    // Evaluate an expression against the current variables; success updates the last result
    pub fn calculate(&mut self, expression: &str) -> Result<f64, Error> {
        let result = evaluate(expression, &*self)?;
        self.last_result = result;
        Ok(result)
    }

    pub fn precision(&self) -> usize { self.precision }

    pub fn set_precision(&mut self, digits: usize) -> Result<()> {
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&digits) {
            bail!("Precision must be between {} and {}", MIN_PRECISION, MAX_PRECISION);
        }
        self.precision = digits;
        Ok(())
    }

    pub fn set_variable(&mut self, name: &str, value: f64) {
        self.variables.insert(InlinableString::from(name), value);
    }

    pub fn variable(&self, name: &str) -> Result<f64> {
        self.variables.get(name).copied().ok_or_else(|| anyhow!("variable not defined: {}", name))
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn clear_variables(&mut self) {
        self.variables.clear();
    }

    // User variables in no particular order
    pub fn variables(&self) -> impl Iterator<Item=(&str, f64)> {
        self.variables.iter().map(|(name, value)| (&**name, *value))
    }

    pub fn last_result(&self) -> f64 { self.last_result }
    pub fn set_last_result(&mut self, value: f64) { self.last_result = value }

    pub fn format_result(&self, value: f64) -> String {
        format_result(value, self.precision)
    }
}

#[cfg(target_family="wasm")]
thread_local! {
    static JS_CONTEXT: RefCell<Option<repl::Repl>> = RefCell::new(None);
}

#[cfg(target_family="wasm")]
#[wasm_bindgen]
pub fn init_context() {
    JS_CONTEXT.with(|ctx| *ctx.borrow_mut() = Some(repl::Repl::new(Calculator::new())));
}

// Returns whatever the REPL would have printed for this line
#[cfg(target_family="wasm")]
#[wasm_bindgen]
pub fn run_line(input: &str) -> String {
    JS_CONTEXT.with(|ctx| match ctx.borrow_mut().as_mut() {
        Some(repl) => repl.render_line(input),
        None => "Error: context not initialized".to_string()
    })
}

#[cfg(target_family="wasm")]
#[wasm_bindgen]
pub fn deinit_context() {
    JS_CONTEXT.with(|ctx| ctx.borrow_mut().take());
}
