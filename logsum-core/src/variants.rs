//! The five alternating-sign log-sum variants.
//!
//! Every variant computes `Σ sign(k) · ln(x[k])` with `sign(k) = +1` at odd
//! 1-based positions and `-1` at even ones, and every variant rejects empty
//! input and non-positive elements before doing any work.

use ndarray::{arr1, s, Array1};

use crate::error::{SumError, SumResult};
use crate::frames;
use crate::primitives::{fill, map_indexed, replicate};

/// Relative tolerance for cross-variant comparisons.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// Signature shared by all variants.
pub type VariantFn = fn(&[f64]) -> SumResult<f64>;

/// A named variant, as registered in [`VARIANTS`].
#[derive(Debug, Clone, Copy)]
pub struct Variant {
    /// Short identifier used on the command line and in reports.
    pub name: &'static str,
    /// How the variant builds its result, for report tables.
    pub expression: &'static str,
    pub func: VariantFn,
}

impl Variant {
    #[inline]
    pub fn call(&self, ind: &[f64]) -> SumResult<f64> {
        (self.func)(ind)
    }
}

/// All variants, in their canonical order.
pub static VARIANTS: [Variant; 5] = [
    Variant {
        name: "iterative",
        expression: "for k in 0..n: acc ± ln(x[k])",
        func: iterative,
    },
    Variant {
        name: "functional",
        expression: "sum(map_indexed(x, signed_ln))",
        func: functional,
    },
    Variant {
        name: "naive_sign",
        expression: "sum(replicate(n, 1.0)[even = -1] * ln(x))",
        func: naive_sign,
    },
    Variant {
        name: "recycled",
        expression: "sum(ln(x) * [1, -1])",
        func: recycled,
    },
    Variant {
        name: "filled_sign",
        expression: "sum(fill(n, 1.0)[even = -1] * ln(x))",
        func: filled_sign,
    },
];

/// Look up a registered variant by name.
pub fn find_variant(name: &str) -> Option<&'static Variant> {
    VARIANTS.iter().find(|v| v.name == name)
}

/// Reject empty input and any element that is not a strictly positive,
/// finite number.
///
/// NaN and `+inf` are rejected: `ln(inf) - ln(inf)` would turn the sum into
/// NaN.
pub fn validate(ind: &[f64]) -> SumResult<()> {
    if ind.is_empty() {
        return Err(SumError::EmptyInput);
    }
    match ind.iter().position(|&v| !v.is_finite() || v <= 0.0) {
        Some(index) => Err(SumError::Domain {
            index,
            value: ind[index],
        }),
        None => Ok(()),
    }
}

/// Relative comparison scaled by `max(1, |a|, |b|)`.
pub fn approx_eq(a: f64, b: f64, rel_tol: f64) -> bool {
    let scale = 1.0f64.max(a.abs()).max(b.abs());
    (a - b).abs() <= rel_tol * scale
}

/// Natural logarithm of every element.
pub fn log_array(ind: &[f64]) -> Array1<f64> {
    let _frame = frames::enter("log_array");
    ind.iter().map(|x| x.ln()).collect()
}

/// Single pass, scalar accumulator.
pub fn iterative(ind: &[f64]) -> SumResult<f64> {
    validate(ind)?;
    let _frame = frames::enter("iterative");
    let mut acc = 0.0;
    for (k, &x) in ind.iter().enumerate() {
        if k % 2 == 0 {
            acc += x.ln();
        } else {
            acc -= x.ln();
        }
    }
    Ok(acc)
}

fn signed_ln(k: usize, x: f64) -> f64 {
    if k % 2 == 0 {
        x.ln()
    } else {
        -x.ln()
    }
}

/// Per-element callable through [`map_indexed`], then a sum.
pub fn functional(ind: &[f64]) -> SumResult<f64> {
    validate(ind)?;
    let _frame = frames::enter("functional");
    let terms = {
        let _map = frames::enter("map_indexed");
        map_indexed(ind, &signed_ln)
    };
    let _sum = frames::enter("sum");
    Ok(terms.iter().sum())
}

/// Sign array from [`replicate`], then multiply and sum.
pub fn naive_sign(ind: &[f64]) -> SumResult<f64> {
    validate(ind)?;
    let _frame = frames::enter("naive_sign");
    let mut signs = {
        let _rep = frames::enter("replicate");
        replicate(ind.len(), &|| 1.0f64)
    };
    negate_even_positions(&mut signs);
    Ok(multiply_sum(&signs, &log_array(ind)))
}

/// Sign array from [`fill`], then multiply and sum.
pub fn filled_sign(ind: &[f64]) -> SumResult<f64> {
    validate(ind)?;
    let _frame = frames::enter("filled_sign");
    let mut signs = {
        let _fill = frames::enter("fill");
        fill(ind.len(), 1.0)
    };
    negate_even_positions(&mut signs);
    Ok(multiply_sum(&signs, &log_array(ind)))
}

/// `[+1, -1]` broadcast over the log array viewed as `(n / 2, 2)`.
///
/// An odd trailing element sits at an odd 1-based position and is added.
pub fn recycled(ind: &[f64]) -> SumResult<f64> {
    validate(ind)?;
    let _frame = frames::enter("recycled");
    let logs = log_array(ind);
    let pattern = arr1(&[1.0, -1.0]);
    let pairs = logs.len() / 2;

    let body = logs.slice(s![..pairs * 2]);
    let grid = body.to_shape((pairs, 2))?;
    let mut total = {
        let _mul = frames::enter("multiply");
        (&grid * &pattern).sum()
    };
    if logs.len() % 2 == 1 {
        total += logs[logs.len() - 1];
    }
    Ok(total)
}

/// Overwrite 1-based even positions (0-based odd indices) with -1.
fn negate_even_positions(signs: &mut Array1<f64>) {
    signs.slice_mut(s![1..;2]).fill(-1.0);
}

fn multiply_sum(signs: &Array1<f64>, logs: &Array1<f64>) -> f64 {
    let product = {
        let _mul = frames::enter("multiply");
        signs * logs
    };
    let _sum = frames::enter("sum");
    product.sum()
}
