use inlinable_string::InlinableString;
use seahash::SeaHasher;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::f64::consts;
use std::hash::{BuildHasher, BuildHasherDefault, Hash};

pub type Bindings = HashMap<InlinableString, f64, BuildHasherDefault<SeaHasher>>;

// Read-only name -> value lookup consulted when the evaluator meets a variable.
pub trait Variables {
    fn get(&self, name: &str) -> Option<f64>;
}

impl<K, S> Variables for HashMap<K, f64, S>
where
    K: Borrow<str> + Hash + Eq,
    S: BuildHasher
{
    fn get(&self, name: &str) -> Option<f64> {
        HashMap::get(self, name).copied()
    }
}

impl<V: Variables + ?Sized> Variables for &V {
    fn get(&self, name: &str) -> Option<f64> {
        (**self).get(name)
    }
}

// Golden ratio, (1 + √5) / 2
pub const PHI: f64 = 1.618_033_988_749_895;

// Identifiers which lex directly to numbers
pub const CONSTANTS: &[(&str, f64)] = &[
    ("pi", consts::PI),
    ("e", consts::E),
    ("phi", PHI)
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sin, Cos, Tan,
    Asin, Acos, Atan,
    Log10, Ln, Exp,
    Sqrt, Abs,
    Floor, Ceil, Round,
    Pow
}

// Static table of function names; `log` is base 10
pub const FUNCTIONS: &[(&str, Function)] = &[
    ("sin", Function::Sin), ("cos", Function::Cos), ("tan", Function::Tan),
    ("asin", Function::Asin), ("acos", Function::Acos), ("atan", Function::Atan),
    ("log", Function::Log10), ("log10", Function::Log10), ("ln", Function::Ln),
    ("sqrt", Function::Sqrt), ("abs", Function::Abs), ("floor", Function::Floor),
    ("ceil", Function::Ceil), ("round", Function::Round), ("exp", Function::Exp),
    ("pow", Function::Pow)
];

pub fn constant(name: &str) -> Option<f64> {
    CONSTANTS.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
}

// Names which can never be bound as variables, since the lexer never emits them as such
pub fn is_reserved(name: &str) -> bool {
    constant(name).is_some() || Function::lookup(name).is_some()
}

impl Function {
    pub fn lookup(name: &str) -> Option<Function> {
        FUNCTIONS.iter().find(|(n, _)| *n == name).map(|(_, f)| *f)
    }

    pub fn arity(self) -> usize {
        match self {
            Function::Pow => 2,
            _ => 1
        }
    }

    // Apply to already-evaluated arguments. The parser only calls this with `arity()` arguments;
    // anything else is a bug in the caller.
    pub fn apply(self, args: &[f64]) -> f64 {
        match (self, args) {
            (Function::Sin, [x]) => x.sin(),
            (Function::Cos, [x]) => x.cos(),
            (Function::Tan, [x]) => x.tan(),
            (Function::Asin, [x]) => x.asin(),
            (Function::Acos, [x]) => x.acos(),
            (Function::Atan, [x]) => x.atan(),
            (Function::Log10, [x]) => x.log10(),
            (Function::Ln, [x]) => x.ln(),
            (Function::Exp, [x]) => x.exp(),
            (Function::Sqrt, [x]) => x.sqrt(),
            (Function::Abs, [x]) => x.abs(),
            (Function::Floor, [x]) => x.floor(),
            (Function::Ceil, [x]) => x.ceil(),
            (Function::Round, [x]) => x.round(),
            (Function::Pow, [a, b]) => a.powf(*b),
            (f, args) => unreachable!("{:?} applied to {} arguments", f, args.len())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn function_table() {
        assert_eq!(Function::lookup("log"), Some(Function::Log10));
        assert_eq!(Function::lookup("log10"), Some(Function::Log10));
        assert_eq!(Function::lookup("pow").map(Function::arity), Some(2));
        assert_eq!(Function::lookup("sinh"), None);
        assert_eq!(Function::Round.apply(&[2.5]), 3.0);
        assert_eq!(Function::Round.apply(&[-2.5]), -3.0);
        assert_eq!(Function::Pow.apply(&[2.0, 10.0]), 1024.0);
        assert!(Function::Asin.apply(&[2.0]).is_nan());
    }

    #[test]
    #[should_panic]
    fn wrong_arity_is_a_bug() {
        Function::Sqrt.apply(&[1.0, 2.0]);
    }

    #[test]
    fn reserved_names() {
        for name in ["pi", "e", "phi", "sin", "log", "pow"] {
            assert!(is_reserved(name), "{}", name);
        }
        assert!(!is_reserved("x"));
        assert!(!is_reserved("ans"));
    }

    #[test]
    fn lookup_through_maps() {
        let mut bindings = Bindings::default();
        bindings.insert(InlinableString::from("a"), 5.0);
        assert_eq!(Variables::get(&bindings, "a"), Some(5.0));
        assert_eq!(Variables::get(&bindings, "b"), None);

        let mut plain: HashMap<String, f64> = HashMap::new();
        plain.insert("rate".to_string(), 0.25);
        assert_eq!(Variables::get(&&plain, "rate"), Some(0.25));
    }
}
