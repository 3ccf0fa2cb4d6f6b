use std::fmt::{self, Display};
use std::ops::{Add, Div, Mul, Sub};

// Decimal -> fraction conversion keeps this many digits after the point
const DECIMAL_SCALE: i64 = 1_000_000_000_000;

// Search bounds used by the REPL's tofrac
pub const MAX_DENOMINATOR: i64 = 10_000;
pub const TOLERANCE: f64 = 1e-9;

// Exact ratio of two 64-bit integers. Constructors and operators return reduced fractions
// with a positive denominator. A zero denominator or a result too large for 64 bits gives an
// invalid fraction, which compares unequal to everything and poisons any arithmetic it touches.
#[derive(Debug, Clone, Copy)]
pub struct Fraction {
    pub numerator: i64,
    pub denominator: i64,
    pub valid: bool
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Approximation {
    pub fraction: Fraction,
    pub error: f64
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

impl Fraction {
    pub const ZERO: Fraction = Fraction { numerator: 0, denominator: 1, valid: true };

    const INVALID: Fraction = Fraction { numerator: 0, denominator: 0, valid: false };

    pub fn new(numerator: i64, denominator: i64) -> Self {
        if denominator == 0 {
            return Fraction { numerator, denominator, valid: false };
        }
        Self::from_wide(numerator as i128, denominator as i128)
    }

    // Reduce in 128 bits, then narrow. Anything that still does not fit is invalid rather than wrapped.
    fn from_wide(numerator: i128, denominator: i128) -> Self {
        if denominator == 0 {
            return Self::INVALID;
        }
        let g = gcd(numerator.unsigned_abs(), denominator.unsigned_abs()) as i128;
        let (mut n, mut d) = (numerator / g, denominator / g);
        if d < 0 {
            n = -n;
            d = -d;
        }
        match (i64::try_from(n), i64::try_from(d)) {
            (Ok(numerator), Ok(denominator)) => Fraction { numerator, denominator, valid: true },
            _ => Self::INVALID
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid && self.denominator != 0
    }

    // Sign goes on the numerator
    pub fn reduced(self) -> Self {
        if !self.is_valid() {
            return self;
        }
        Self::from_wide(self.numerator as i128, self.denominator as i128)
    }

    pub fn is_integer(&self) -> bool {
        self.is_valid() && self.reduced().denominator == 1
    }

    pub fn to_f64(&self) -> f64 {
        if !self.is_valid() {
            return f64::NAN;
        }
        self.numerator as f64 / self.denominator as f64
    }

    // Linear scan over denominators; ties keep the smaller denominator, and the scan stops once
    // the error drops below `tolerance`. None for non-finite targets or numerators beyond i64.
    pub fn approximate(target: f64, max_denominator: i64, tolerance: f64) -> Option<Approximation> {
        if !target.is_finite() {
            return None;
        }
        let mut best: Option<(i64, i64, f64)> = None;
        for denominator in 1..=max_denominator {
            let numerator = (target * denominator as f64).round();
            if numerator.abs() >= i64::MAX as f64 {
                return None;
            }
            let numerator = numerator as i64;
            let error = (target - numerator as f64 / denominator as f64).abs();
            if best.map_or(true, |(_, _, best_error)| error < best_error) {
                best = Some((numerator, denominator, error));
            }
            if error < tolerance {
                break;
            }
        }
        best.map(|(numerator, denominator, error)| Approximation {
            fraction: Fraction::new(numerator, denominator),
            error
        })
    }

    pub fn mixed(self) -> Mixed {
        Mixed(self.reduced())
    }

    // Cross-multiply in 128 bits; None only if the intermediate products overflow
    fn combine<F>(self, other: Fraction, op: F) -> Fraction
    where F: Fn(i128, i128, i128, i128) -> Option<(i128, i128)> {
        if !self.is_valid() || !other.is_valid() {
            return Self::INVALID;
        }
        match op(self.numerator as i128, self.denominator as i128, other.numerator as i128, other.denominator as i128) {
            Some((n, d)) => Self::from_wide(n, d),
            None => Self::INVALID
        }
    }
}

impl Default for Fraction {
    fn default() -> Self {
        Self::ZERO
    }
}

// Rounds to 12 digits after the point, then reduces in 128 bits before narrowing
impl From<f64> for Fraction {
    fn from(value: f64) -> Self {
        let scaled = (value * DECIMAL_SCALE as f64).round();
        if !scaled.is_finite() || scaled.abs() >= i128::MAX as f64 {
            return Self::INVALID;
        }
        Self::from_wide(scaled as i128, DECIMAL_SCALE as i128)
    }
}

impl From<i64> for Fraction {
    fn from(value: i64) -> Self {
        Fraction::new(value, 1)
    }
}

impl Add for Fraction {
    type Output = Fraction;

    fn add(self, rhs: Fraction) -> Fraction {
        self.combine(rhs, |a, b, c, d| Some((a.checked_mul(d)?.checked_add(c.checked_mul(b)?)?, b.checked_mul(d)?)))
    }
}

impl Sub for Fraction {
    type Output = Fraction;

    fn sub(self, rhs: Fraction) -> Fraction {
        self.combine(rhs, |a, b, c, d| Some((a.checked_mul(d)?.checked_sub(c.checked_mul(b)?)?, b.checked_mul(d)?)))
    }
}

impl Mul for Fraction {
    type Output = Fraction;

    fn mul(self, rhs: Fraction) -> Fraction {
        self.combine(rhs, |a, b, c, d| Some((a.checked_mul(c)?, b.checked_mul(d)?)))
    }
}

impl Div for Fraction {
    type Output = Fraction;

    fn div(self, rhs: Fraction) -> Fraction {
        if rhs.numerator == 0 {
            return Self::INVALID;
        }
        self.combine(rhs, |a, b, c, d| Some((a.checked_mul(d)?, b.checked_mul(c)?)))
    }
}

impl PartialEq for Fraction {
    fn eq(&self, other: &Self) -> bool {
        if !self.is_valid() || !other.is_valid() {
            return false;
        }
        let (a, b) = (self.reduced(), other.reduced());
        a.numerator == b.numerator && a.denominator == b.denominator
    }
}

impl Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.reduced();
        if !r.is_valid() {
            return write!(f, "invalid");
        }
        if r.denominator == 1 {
            write!(f, "{}", r.numerator)
        } else {
            write!(f, "{}/{}", r.numerator, r.denominator)
        }
    }
}

// e.g. -3 1/2
#[derive(Debug, Clone, Copy)]
pub struct Mixed(Fraction);

impl Display for Mixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Mixed(fraction) = *self;
        if !fraction.is_valid() || fraction.denominator == 1 {
            return write!(f, "{}", fraction);
        }
        let whole = fraction.numerator / fraction.denominator;
        let remainder = (fraction.numerator % fraction.denominator).abs();
        if whole == 0 {
            write!(f, "{}", fraction)
        } else if remainder == 0 {
            write!(f, "{}", whole)
        } else {
            write!(f, "{} {}/{}", whole, remainder, fraction.denominator)
        }
    }
}
