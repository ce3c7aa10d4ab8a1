use core::fmt;
use core::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Sub, SubAssign};
use lazy_static::lazy_static;
use tracing::trace;
use zeroize::Zeroize;

use crate::constants::{FIELD_ORDER, FIELD_SIZE, GENERATOR, PRIMITIVE_POLYNOMIAL};

/// Logarithm and exponent tables for GF(2^8).
///
/// `exp[i]` is `GENERATOR^i` and `log[exp[i]] == i` for every non-zero element.
/// `log[0]` is unused since zero has no logarithm.
struct Tables {
    exp: [u8; FIELD_ORDER],
    log: [u8; FIELD_SIZE],
}

impl Tables {
    fn build() -> Self {
        let mut exp = [0u8; FIELD_ORDER];
        let mut log = [0u8; FIELD_SIZE];

        let mut x: u16 = 1;
        for (i, slot) in exp.iter_mut().enumerate() {
            *slot = x as u8;
            log[x as usize] = i as u8;

            x = mul_no_table(x as u8, GENERATOR) as u16;
        }

        trace!(
            "built GF(2^8) tables for polynomial {:#x}",
            PRIMITIVE_POLYNOMIAL
        );
        Tables { exp, log }
    }
}

/// Carry-less multiply reduced by the primitive polynomial. Only used to build the tables.
fn mul_no_table(a: u8, b: u8) -> u8 {
    let mut a = a as u16;
    let mut b = b;
    let mut product: u16 = 0;

    while b != 0 {
        if b & 1 != 0 {
            product ^= a;
        }
        a <<= 1;
        if a & 0x100 != 0 {
            a ^= PRIMITIVE_POLYNOMIAL;
        }
        b >>= 1;
    }

    product as u8
}

lazy_static! {
    static ref TABLES: Tables = Tables::build();
}

/// An element of the Galois field GF(2^8).
///
/// Addition and subtraction are both XOR. Multiplication and division go
/// through the shared log/exp tables, which are built on first use and never
/// mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Zeroize)]
pub struct FieldElement(u8);

impl FieldElement {
    pub const ZERO: FieldElement = FieldElement(0);
    pub const ONE: FieldElement = FieldElement(1);

    pub const fn new(value: u8) -> Self {
        FieldElement(value)
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Multiplicative inverse, or `None` for zero.
    pub fn checked_inverse(self) -> Option<Self> {
        if self.is_zero() {
            return None;
        }
        let tables = &*TABLES;
        let log = tables.log[self.0 as usize] as usize;
        Some(FieldElement(tables.exp[(FIELD_ORDER - log) % FIELD_ORDER]))
    }

    /// Multiplicative inverse.
    ///
    /// # Panics
    ///
    /// Panics if `self` is zero.
    pub fn inverse(self) -> Self {
        self.checked_inverse()
            .expect("zero has no multiplicative inverse in GF(2^8)")
    }

    /// Raises the element to `exponent` by way of the log table.
    pub fn pow(self, exponent: u32) -> Self {
        if exponent == 0 {
            return FieldElement::ONE;
        }
        if self.is_zero() {
            return FieldElement::ZERO;
        }
        let tables = &*TABLES;
        let log = tables.log[self.0 as usize] as u64;
        let index = (log * exponent as u64) % FIELD_ORDER as u64;
        FieldElement(tables.exp[index as usize])
    }
}

impl From<u8> for FieldElement {
    fn from(value: u8) -> Self {
        FieldElement(value)
    }
}

impl From<FieldElement> for u8 {
    fn from(value: FieldElement) -> Self {
        value.0
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}", self.0)
    }
}

impl Add for FieldElement {
    type Output = FieldElement;

    fn add(self, rhs: FieldElement) -> FieldElement {
        FieldElement(self.0 ^ rhs.0)
    }
}

impl AddAssign for FieldElement {
    fn add_assign(&mut self, rhs: FieldElement) {
        *self = *self + rhs;
    }
}

// Subtraction and addition coincide in characteristic 2.
impl Sub for FieldElement {
    type Output = FieldElement;

    fn sub(self, rhs: FieldElement) -> FieldElement {
        FieldElement(self.0 ^ rhs.0)
    }
}

impl SubAssign for FieldElement {
    fn sub_assign(&mut self, rhs: FieldElement) {
        *self = *self - rhs;
    }
}

impl Mul for FieldElement {
    type Output = FieldElement;

    fn mul(self, rhs: FieldElement) -> FieldElement {
        if self.is_zero() || rhs.is_zero() {
            return FieldElement::ZERO;
        }
        let tables = &*TABLES;
        let sum = tables.log[self.0 as usize] as usize + tables.log[rhs.0 as usize] as usize;
        FieldElement(tables.exp[sum % FIELD_ORDER])
    }
}

impl MulAssign for FieldElement {
    fn mul_assign(&mut self, rhs: FieldElement) {
        *self = *self * rhs;
    }
}

impl Div for FieldElement {
    type Output = FieldElement;

    /// # Panics
    ///
    /// Panics when dividing by zero.
    fn div(self, rhs: FieldElement) -> FieldElement {
        self * rhs.inverse()
    }
}

impl DivAssign for FieldElement {
    fn div_assign(&mut self, rhs: FieldElement) {
        *self = *self / rhs;
    }
}
