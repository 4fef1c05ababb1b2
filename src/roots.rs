//! Polynomial roots via Laguerre's method.
//!
//! Reference: Numerical Recipes Ch. 9.5 (`laguer` / `zroots`).
//!
//! Laguerre's method converges cubically to simple roots from almost any
//! starting point, which makes it a good fit for LPC polynomials whose
//! roots cluster just inside the unit circle. The i-th search starts from
//! the i-th of n seeds evenly spaced on a circle of radius 0.9.
//!
//! # Deflation
//!
//! Between searches the polynomial is deflated according to a
//! [`RootDeflation`] policy:
//!
//! - `RealOnly`: only roots with a negligible imaginary part are divided
//!   out (real synthetic division). Complex roots leave the polynomial
//!   unchanged, so a later seed can converge onto an already found root
//!   and a close conjugate pair may be reported as one root twice.
//! - `Complex`: every root is divided out by complex Horner division; the
//!   degree drops by one per search and all n roots are distinct.
//!
//! Coefficients are given highest power first: `[1, a1, ..., ap]` is
//! z^p + a1 z^(p-1) + ... + ap.

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::config::RootDeflation;

/// Radius of the seed circle.
const SEED_RADIUS: f64 = 0.9;

/// Iterations between fractional steps that break limit cycles.
const STEPS_PER_CYCLE: usize = 10;

/// Iteration cap per root.
const MAX_ITER: usize = STEPS_PER_CYCLE * 8;

/// Fractional step sizes used every `STEPS_PER_CYCLE` iterations.
const FRACTIONS: [f64; 8] = [0.5, 0.25, 0.75, 0.13, 0.38, 0.62, 0.88, 1.0];

/// Relative round-off bound for the convergence test.
const EPS: f64 = 1e-15;

/// Denominators below this are treated as degenerate.
const DEGENERATE_DENOMINATOR: f64 = 1e-12;

/// Imaginary parts below this count as a real root for `RealOnly`.
const REAL_ROOT_TOL: f64 = 1e-6;

/// Evaluate a real polynomial (highest power first) at z.
pub fn eval_polynomial(coeffs: &[f64], z: Complex64) -> Complex64 {
    coeffs
        .iter()
        .fold(Complex64::new(0.0, 0.0), |acc, &c| acc * z + c)
}

/// Find one root of `poly` starting from `x` using Laguerre's method.
///
/// When the Laguerre denominator vanishes the iterate is nudged along a
/// rotating direction and the search goes on. After `MAX_ITER` iterations
/// the current iterate is returned as the best available root.
pub fn laguerre(poly: &[Complex64], mut x: Complex64) -> Complex64 {
    let degree = match poly.len() {
        0 | 1 => return x,
        len => len - 1,
    };
    let m = degree as f64;

    for iter in 1..=MAX_ITER {
        // Horner: b = P(x), d = P'(x), f = P''(x) / 2
        let mut b = poly[0];
        let mut d = Complex64::new(0.0, 0.0);
        let mut f = Complex64::new(0.0, 0.0);
        let mut err = b.norm();
        let abx = x.norm();
        for &c in &poly[1..] {
            f = x * f + d;
            d = x * d + b;
            b = x * b + c;
            err = b.norm() + abx * err;
        }

        if b.norm() <= err * EPS {
            return x;
        }

        let g = d / b;
        let g2 = g * g;
        let h = g2 - f * 2.0 / b;
        let sq = ((h * m - g2) * (m - 1.0)).sqrt();
        let mut gp = g + sq;
        let gm = g - sq;
        let abp = gp.norm();
        let abm = gm.norm();
        if abp < abm {
            gp = gm;
        }

        let dx = if abp.max(abm) > DEGENERATE_DENOMINATOR {
            Complex64::new(m, 0.0) / gp
        } else {
            // Degenerate denominator: nudge the iterate and keep going
            Complex64::from_polar(1.0 + abx, iter as f64)
        };

        let x1 = x - dx;
        if x1 == x {
            return x;
        }

        if iter % STEPS_PER_CYCLE != 0 {
            x = x1;
        } else {
            let frac = FRACTIONS[(iter / STEPS_PER_CYCLE - 1) % FRACTIONS.len()];
            x -= dx * frac;
        }
    }

    x
}

/// Synthetic division of `poly` by (z - root); the remainder is dropped.
fn deflate(poly: &[Complex64], root: Complex64) -> Vec<Complex64> {
    let mut quotient = Vec::with_capacity(poly.len() - 1);
    quotient.push(poly[0]);
    for &c in &poly[1..poly.len() - 1] {
        let last = quotient[quotient.len() - 1];
        quotient.push(c + root * last);
    }
    quotient
}

/// Find all roots of a real polynomial (highest power first).
///
/// # Arguments
///
/// * `coeffs` - Polynomial coefficients, leading coefficient first
/// * `deflation` - Deflation policy between searches
///
/// # Returns
///
/// One root per seed (n = degree). With `RealOnly` the list may contain
/// repeats; with `Complex` it contains every root exactly once.
pub fn find_roots(coeffs: &[f64], deflation: RootDeflation) -> Vec<Complex64> {
    if coeffs.len() < 2 {
        return Vec::new();
    }
    let n = coeffs.len() - 1;

    let mut poly: Vec<Complex64> = coeffs.iter().map(|&c| Complex64::new(c, 0.0)).collect();
    let mut roots = Vec::with_capacity(n);

    for i in 0..n {
        if poly.len() < 2 {
            break;
        }

        let seed = Complex64::from_polar(SEED_RADIUS, 2.0 * PI * i as f64 / n as f64);
        let root = laguerre(&poly, seed);
        roots.push(root);

        match deflation {
            RootDeflation::Complex => {
                poly = deflate(&poly, root);
            }
            RootDeflation::RealOnly => {
                if root.im.abs() < REAL_ROOT_TOL && poly.len() > 2 {
                    poly = deflate(&poly, Complex64::new(root.re, 0.0));
                }
            }
        }
    }

    roots
}
