use core::fmt;
use rand::{CryptoRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::field::FieldElement;

/// Represents a polynomial over the Galois field GF(2^8).
///
/// Each polynomial is represented by its coefficients, lowest degree first.
/// The coefficients are wiped from memory when the polynomial is dropped, and
/// the `Debug` output only reveals the degree.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Polynomial {
    coefficients: Vec<FieldElement>,
}

impl Polynomial {
    /// Constructs a polynomial with `threshold - 1` random coefficients,
    /// where the constant term is the provided secret.
    ///
    /// # Arguments
    ///
    /// * `secret` - The secret (constant term) of the polynomial.
    /// * `threshold` - Number of points needed to recover the constant term.
    /// * `rng` - Cryptographically secure source for the remaining coefficients.
    ///
    /// # Errors
    ///
    /// Returns the random source's error if it cannot produce bytes. There is
    /// no fallback source.
    pub fn generate<R: RngCore + CryptoRng>(
        secret: FieldElement,
        threshold: usize,
        rng: &mut R,
    ) -> Result<Self, rand::Error> {
        let mut random = vec![0u8; threshold.saturating_sub(1)];
        let filled = rng.try_fill_bytes(&mut random);
        if let Err(err) = filled {
            random.zeroize();
            return Err(err);
        }

        let mut coefficients = Vec::with_capacity(random.len() + 1);
        coefficients.push(secret);
        coefficients.extend(random.iter().copied().map(FieldElement::new));
        random.zeroize();

        Ok(Polynomial { coefficients })
    }

    /// Builds a polynomial from explicit coefficients, lowest degree first.
    pub fn from_coefficients(coefficients: Vec<FieldElement>) -> Self {
        Polynomial { coefficients }
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    pub fn constant(&self) -> FieldElement {
        self.coefficients
            .first()
            .copied()
            .unwrap_or(FieldElement::ZERO)
    }

    /// Evaluates the polynomial at `x` using Horner's rule.
    ///
    /// # Returns
    ///
    /// The value of the polynomial at point `x`.
    pub fn evaluate(&self, x: FieldElement) -> FieldElement {
        self.coefficients
            .iter()
            .rev()
            .fold(FieldElement::ZERO, |acc, &coeff| acc * x + coeff)
    }
}

impl fmt::Debug for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Polynomial")
            .field("degree", &self.degree())
            .finish_non_exhaustive()
    }
}

/// Performs Lagrange interpolation on a set of points to find the value of the polynomial at `x`.
///
/// Interpolating at zero recovers the constant term. Interpolating at any other
/// point yields the evaluation a share with that id would carry.
///
/// The x-coordinates must be pairwise distinct. Callers validate that before
/// interpolating; a repeated x-coordinate divides by zero and panics.
///
/// # Examples
///
/// ```
/// use shamir::field::FieldElement;
/// use shamir::polynomial::{interpolate, Polynomial};
///
/// let poly = Polynomial::from_coefficients(vec![FieldElement::new(42), FieldElement::new(7)]);
/// let points = [
///     (FieldElement::new(1), poly.evaluate(FieldElement::new(1))),
///     (FieldElement::new(2), poly.evaluate(FieldElement::new(2))),
/// ];
/// assert_eq!(interpolate(&points, FieldElement::ZERO), FieldElement::new(42));
/// ```
pub fn interpolate(points: &[(FieldElement, FieldElement)], x: FieldElement) -> FieldElement {
    let mut value = FieldElement::ZERO;

    for (i, &(a_x, a_y)) in points.iter().enumerate() {
        let mut weight = FieldElement::ONE;

        for (j, &(b_x, _)) in points.iter().enumerate() {
            if i != j {
                weight *= (x - b_x) / (a_x - b_x);
            }
        }

        value += weight * a_y;
    }

    value
}
