use std::str::FromStr;
use inlinable_string::{InlinableString, StringExt};

use crate::env::{self, Function, Variables};
use crate::error::Error;
use crate::util::char_to_string;

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum TokenKind {
    Number(f64),
    Plus, Minus, Mul, Div, Pow, Mod,
    LParen, RParen,
    Function(Function),
    Variable,
    Comma, Assign,
    End
}

// Kind plus the source text it came from (used for diagnostics and variable names)
#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: InlinableString
}

impl Token {
    fn new(kind: TokenKind, lexeme: InlinableString) -> Self {
        Token { kind, lexeme }
    }
}

// lexer
// walks the input by character index; only number lexing needs to look more than one char ahead
struct Lexer {
    chars: Vec<char>,
    position: usize
}

impl Lexer {
    fn peek(&self, offset: usize) -> Option<char> { self.chars.get(self.position + offset).copied() }
    fn advance(&mut self) { self.position += 1 }

    // Consume characters while the predicate holds, appending them to `out`
    fn take_while<F: Fn(char) -> bool>(&mut self, out: &mut InlinableString, pred: F) {
        while let Some(c) = self.peek(0) {
            if !pred(c) { break }
            out.push(c);
            self.advance();
        }
    }

    // Digits and decimal points, then an exponent only if a digit follows e/E (and optional sign)
    fn number(&mut self) -> Result<Token, Error> {
        let mut lexeme = InlinableString::new();
        self.take_while(&mut lexeme, |c| c.is_ascii_digit() || c == '.');
        if let Some('e' | 'E') = self.peek(0) {
            let sign = matches!(self.peek(1), Some('+' | '-')) as usize;
            if self.peek(1 + sign).map_or(false, |c| c.is_ascii_digit()) {
                for _ in 0..=sign {
                    lexeme.push(self.chars[self.position]);
                    self.advance();
                }
                self.take_while(&mut lexeme, |c| c.is_ascii_digit());
            }
        }
        let value = f64::from_str(&lexeme).map_err(|_| Error::Lex(format!("invalid number: {}", lexeme)))?;
        Ok(Token::new(TokenKind::Number(value), lexeme))
    }

    fn identifier(&mut self) -> Token {
        let mut name = InlinableString::new();
        self.take_while(&mut name, |c| c.is_ascii_alphanumeric() || c == '_');
        let kind = match (env::constant(&name), Function::lookup(&name)) {
            (Some(value), _) => TokenKind::Number(value),
            (None, Some(function)) => TokenKind::Function(function),
            (None, None) => TokenKind::Variable
        };
        Token::new(kind, name)
    }
}

// converts input text to tokens, always terminated by an End token
pub fn lex(input: &str) -> Result<Vec<Token>, Error> {
    let mut lexer = Lexer { chars: input.chars().collect(), position: 0 };
    let mut toks = vec![];
    while let Some(c) = lexer.peek(0) {
        let token = match c {
            c if c.is_whitespace() => {
                lexer.advance();
                continue
            },
            '0'..='9' | '.' => lexer.number()?,
            c if c.is_ascii_alphabetic() => lexer.identifier(),
            _ => {
                let kind = match c {
                    '+' => TokenKind::Plus,
                    '-' => TokenKind::Minus,
                    '*' => TokenKind::Mul,
                    '/' => TokenKind::Div,
                    '^' => TokenKind::Pow,
                    '%' => TokenKind::Mod,
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    ',' => TokenKind::Comma,
                    '=' => TokenKind::Assign,
                    c => return Err(Error::Lex(format!("unknown character: '{}'", c)))
                };
                lexer.advance();
                Token::new(kind, char_to_string(c))
            }
        };
        toks.push(token);
    }
    toks.push(Token::new(TokenKind::End, InlinableString::new()));
    Ok(toks)
}

// parser: contains the sequence of tokens being evaluated and current position (index in that)
// each precedence level is one method, and values are computed directly as they are parsed
struct Parser<'a, V: ?Sized> {
    tokens: Vec<Token>,
    position: usize,
    variables: &'a V
}

fn describe(token: &Token) -> String {
    match token.kind {
        TokenKind::End => "end of expression".to_string(),
        _ => format!("'{}'", token.lexeme)
    }
}

impl<'a, V: Variables + ?Sized> Parser<'a, V> {
    // Parsing utility functions
    // Get current token. The End token is never advanced past, so this is always in bounds.
    fn current(&self) -> &Token { &self.tokens[self.position] }
    fn advance(&mut self) { self.position += 1 }

    // Match current token kind and advance, or fail with a message describing what was wanted
    fn expect(&mut self, kind: TokenKind, wanted: &str) -> Result<(), Error> {
        if self.current().kind == kind {
            self.advance();
            Ok(())
        } else {
            Err(Error::Parse(format!("expected {}, found {}", wanted, describe(self.current()))))
        }
    }

    // Expression := Term (('+' | '-') Term)*
    fn parse_expression(&mut self) -> Result<f64, Error> {
        let mut result = self.parse_term()?;
        loop {
            match self.current().kind {
                TokenKind::Plus => {
                    self.advance();
                    result += self.parse_term()?;
                },
                TokenKind::Minus => {
                    self.advance();
                    result -= self.parse_term()?;
                },
                _ => break
            }
        }
        Ok(result)
    }

    // Term := Power (('*' | '/' | '%' | implicit) Power)*
    // A function name or open bracket directly after an operand is an implicit multiplication: 2(3+4), 2sin(1)
    fn parse_term(&mut self) -> Result<f64, Error> {
        let mut result = self.parse_power()?;
        loop {
            match self.current().kind {
                TokenKind::Mul => {
                    self.advance();
                    result *= self.parse_power()?;
                },
                TokenKind::Div => {
                    self.advance();
                    let divisor = self.parse_power()?;
                    if divisor == 0.0 {
                        return Err(Error::Eval("division by zero".to_string()));
                    }
                    result /= divisor;
                },
                TokenKind::Mod => {
                    self.advance();
                    let modulus = self.parse_power()?;
                    if modulus == 0.0 {
                        return Err(Error::Eval("modulo by zero".to_string()));
                    }
                    result %= modulus;
                },
                TokenKind::Function(_) | TokenKind::LParen => {
                    result *= self.parse_power()?;
                },
                _ => break
            }
        }
        Ok(result)
    }

    // Power := Factor ('^' Factor)*
    // Left-associative, so 2^3^2 is (2^3)^2. A number or function directly after a factor multiplies: 2pi
    fn parse_power(&mut self) -> Result<f64, Error> {
        let mut result = self.parse_factor()?;
        loop {
            match self.current().kind {
                TokenKind::Pow => {
                    self.advance();
                    result = result.powf(self.parse_factor()?);
                },
                TokenKind::Number(_) | TokenKind::Function(_) => {
                    result *= self.parse_factor()?;
                },
                _ => break
            }
        }
        Ok(result)
    }

    // Parse "leaf" expression: number, variable, function call, bracketed expression, or unary sign
    fn parse_factor(&mut self) -> Result<f64, Error> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Number(value) => {
                self.advance();
                Ok(value)
            },
            TokenKind::Variable => {
                self.advance();
                self.variables.get(&token.lexeme)
                    .ok_or_else(|| Error::Eval(format!("undefined variable: {}", token.lexeme)))
            },
            TokenKind::Function(function) => {
                self.advance();
                self.parse_call(function, &token.lexeme)
            },
            TokenKind::LParen => {
                self.advance();
                let result = self.parse_expression()?;
                self.expect(TokenKind::RParen, "')' to match '('")?;
                Ok(result)
            },
            TokenKind::Minus => {
                self.advance();
                Ok(-self.parse_factor()?)
            },
            TokenKind::Plus => {
                self.advance();
                self.parse_factor()
            },
            _ => Err(Error::Parse(format!("unexpected {}", describe(&token))))
        }
    }

    // Arguments of a call, after the function name: '(' Expression (',' Expression)* ')'
    fn parse_call(&mut self, function: Function, name: &str) -> Result<f64, Error> {
        self.expect(TokenKind::LParen, &format!("'(' after function {}", name))?;
        let mut args = Vec::with_capacity(function.arity());
        args.push(self.parse_expression()?);
        while args.len() < function.arity() {
            if self.current().kind != TokenKind::Comma {
                return Err(Error::Parse(format!("{}() requires {} arguments separated by commas", name, function.arity())));
            }
            self.advance();
            args.push(self.parse_expression()?);
        }
        self.expect(TokenKind::RParen, &format!("')' after arguments of {}", name))?;
        Ok(function.apply(&args))
    }
}

// Evaluate a whole expression, consulting `variables` for any identifier which is not a constant or function
pub fn evaluate<V: Variables + ?Sized>(input: &str, variables: &V) -> Result<f64, Error> {
    let mut parser = Parser {
        tokens: lex(input)?,
        position: 0,
        variables
    };
    let result = parser.parse_expression()?;
    if parser.current().kind != TokenKind::End {
        return Err(Error::Parse(format!("unexpected token {} after expression", describe(parser.current()))));
    }
    Ok(result)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::env::Bindings;
    use crate::error::ErrorKind;
    use assert_matches::assert_matches;
    use std::collections::HashMap;
    use std::f64::consts::{E, PI};

    fn kinds(input: &str) -> Vec<TokenKind> {
        lex(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn eval(input: &str) -> Result<f64, Error> {
        evaluate(input, &Bindings::default())
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * b.abs().max(1.0)
    }

    #[test]
    fn lexes_operators_and_identifiers() {
        assert_eq!(kinds("1 + x*sin(2) ^ 3 % 4 / (5, 6) = -"), vec![
            TokenKind::Number(1.0), TokenKind::Plus, TokenKind::Variable, TokenKind::Mul,
            TokenKind::Function(Function::Sin), TokenKind::LParen, TokenKind::Number(2.0), TokenKind::RParen,
            TokenKind::Pow, TokenKind::Number(3.0), TokenKind::Mod, TokenKind::Number(4.0), TokenKind::Div,
            TokenKind::LParen, TokenKind::Number(5.0), TokenKind::Comma, TokenKind::Number(6.0), TokenKind::RParen,
            TokenKind::Assign, TokenKind::Minus, TokenKind::End
        ]);
        let toks = lex("rate_2").unwrap();
        assert_eq!(toks[0].lexeme, "rate_2");
        assert_eq!(toks[0].kind, TokenKind::Variable);
        assert_eq!(kinds(""), vec![TokenKind::End]);
        assert_eq!(kinds("pi e phi"), vec![
            TokenKind::Number(PI), TokenKind::Number(E), TokenKind::Number(env::PHI), TokenKind::End
        ]);
    }

    #[test]
    fn lexes_scientific_notation() {
        assert_eq!(kinds("1.5e-3"), vec![TokenKind::Number(0.0015), TokenKind::End]);
        assert_eq!(kinds("2E+2"), vec![TokenKind::Number(200.0), TokenKind::End]);
        assert_eq!(kinds(".5e1"), vec![TokenKind::Number(5.0), TokenKind::End]);
        // no digit after the e, so it is Euler's number
        assert_eq!(kinds("1.5e"), vec![TokenKind::Number(1.5), TokenKind::Number(E), TokenKind::End]);
        assert_eq!(kinds("2e+"), vec![TokenKind::Number(2.0), TokenKind::Number(E), TokenKind::Plus, TokenKind::End]);
        let toks = lex("3ex").unwrap();
        assert_eq!(toks[0].kind, TokenKind::Number(3.0));
        assert_eq!(toks[1].lexeme, "ex");
        assert_eq!(toks[1].kind, TokenKind::Variable);
    }

    #[test]
    fn lex_errors() {
        assert_matches!(lex("1.2.3"), Err(Error::Lex(m)) if m == "invalid number: 1.2.3");
        assert_matches!(lex("."), Err(Error::Lex(_)));
        assert_matches!(lex("2 $ 3"), Err(Error::Lex(m)) if m == "unknown character: '$'");
        assert_matches!(lex("_x"), Err(Error::Lex(_)));
        assert_matches!(lex("√4"), Err(Error::Lex(_)));
    }

    #[test]
    fn evaluates() {
        let test_cases = [
            ("3 + 5 * 2", 13.0),
            ("(3 + 5) * 2", 16.0),
            ("10 - 4 - 3", 3.0),
            ("100 / 10 / 5", 2.0),
            ("2 ^ 3 ^ 2", 64.0),
            ("2(3+4)", 14.0),
            ("(1+1)(2+2)", 8.0),
            ("2 3", 6.0),
            ("--5", 5.0),
            ("-5", -5.0),
            ("+-+5", -5.0),
            ("-2^2", 4.0),
            ("7 % 3", 1.0),
            ("-7 % 3", -1.0),
            ("5.5 % 2", 1.5),
            ("pow(2,10)", 1024.0),
            ("pow(2, 1+2)*2", 16.0),
            ("sqrt(16)", 4.0),
            ("abs(-3) + floor(2.7) + ceil(2.1) + round(2.5)", 11.0),
            ("log(1000)", 3.0),
            ("log10(100)", 2.0),
            ("ln(e)", 1.0),
            ("exp(0)", 1.0),
            ("2sqrt(9)", 6.0),
            ("1e3 + 1", 1001.0),
        ];
        for (input, expected) in test_cases {
            let result = eval(input).unwrap();
            assert!(approx(result, expected), "{} evaluated to {}; expected {}", input, result, expected);
        }
    }

    #[test]
    fn implicit_multiplication_with_constants() {
        assert!(approx(eval("2pi").unwrap(), 2.0 * PI));
        assert!(approx(eval("sin(pi/2)").unwrap(), 1.0));
        assert!(approx(eval("2pi^2").unwrap(), (2.0 * PI).powi(2)));
        assert!(approx(eval("3 2sin(0)+1").unwrap(), 1.0));
    }

    #[test]
    fn ieee_values_flow_through() {
        assert!(eval("asin(2)").unwrap().is_nan());
        assert!(eval("sqrt(-1)").unwrap().is_nan());
        assert_eq!(eval("ln(0)").unwrap(), f64::NEG_INFINITY);
        assert_eq!(eval("10^400").unwrap(), f64::INFINITY);
    }

    #[test]
    fn zero_divisors_are_errors() {
        assert_matches!(eval("5/0"), Err(Error::Eval(m)) if m == "division by zero");
        assert_matches!(eval("5%0"), Err(Error::Eval(m)) if m == "modulo by zero");
        assert_matches!(eval("1/(2-2)"), Err(Error::Eval(_)));
        assert_matches!(eval("1/-0"), Err(Error::Eval(_)));
    }

    #[test]
    fn variables() {
        let mut vars = HashMap::new();
        vars.insert("a".to_string(), 5.0);
        vars.insert("b_2".to_string(), 0.5);
        assert_eq!(evaluate("a*2", &vars).unwrap(), 10.0);
        assert_eq!(evaluate("a(b_2)", &vars).unwrap(), 2.5);
        // variables never multiply implicitly
        assert_matches!(evaluate("a b_2", &vars), Err(Error::Parse(_)));
        assert_eq!(evaluate("-a^2", &vars).unwrap(), 25.0);
        assert_eq!(evaluate("pow(a, 2)", &vars).unwrap(), 25.0);

        let empty: HashMap<String, f64> = HashMap::new();
        let err = evaluate("b+1", &empty).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Eval);
        assert_eq!(err.to_string(), "undefined variable: b");
    }

    #[test]
    fn parse_errors() {
        let error_cases = [
            "",
            "1 +",
            "(1 + 2",
            "sin 1",
            "sin(1",
            "sin(1, 2)",
            "pow(2)",
            "pow(2, 3",
            ",",
            "*3",
            "1 )",
            "a = 3",
            "()",
        ];
        let mut vars = Bindings::default();
        vars.insert("a".into(), 1.0);
        for input in error_cases {
            match evaluate(input, &vars) {
                Err(e) => assert_eq!(e.kind(), ErrorKind::Parse, "{} produced {:?}", input, e),
                Ok(v) => panic!("should have errored: {} (got {})", input, v)
            }
        }
        assert_matches!(eval("pow(2)"), Err(Error::Parse(m)) if m == "pow() requires 2 arguments separated by commas");
        assert_matches!(eval("(1"), Err(Error::Parse(m)) if m == "expected ')' to match '(', found end of expression");
        assert_matches!(eval("cos 1"), Err(Error::Parse(m)) if m == "expected '(' after function cos, found '1'");
    }

    #[test]
    fn first_error_wins() {
        // the lexer runs over the whole input before anything is evaluated
        assert_matches!(eval("1/0 + $"), Err(Error::Lex(_)));
        assert_matches!(eval("1/0 + (2"), Err(Error::Eval(_)));
    }

    #[test]
    fn deterministic() {
        for input in ["sin(1) + cos(2) * 3^0.5", "2pi e phi", "pow(1.1, 20) % 3"] {
            assert_eq!(eval(input).unwrap().to_bits(), eval(input).unwrap().to_bits());
        }
    }
}
