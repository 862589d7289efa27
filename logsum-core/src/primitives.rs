//! Array-construction primitives with deliberately different cost profiles.
//!
//! [`replicate`] and [`map_indexed`] take the per-element work as a
//! `&dyn Fn` and are never inlined, so every element pays an indirect call
//! plus a boxed intermediate result. [`fill`] is a straight constant fill.

use ndarray::Array1;

/// Evaluate `expr` `n` times and gather the results into an array.
///
/// Each evaluation is an indirect call whose result is boxed into an
/// intermediate list, which is then simplified into a contiguous array.
/// That is the general "repeat an expression" path: correct for any
/// expression, but far more expensive than [`fill`] when the expression is a
/// constant.
#[inline(never)]
pub fn replicate<T>(n: usize, expr: &dyn Fn() -> T) -> Array1<T> {
    let mut evaluated: Vec<Box<T>> = Vec::with_capacity(n);
    for _ in 0..n {
        evaluated.push(Box::new(expr()));
    }
    simplify(evaluated)
}

#[inline(never)]
fn simplify<T>(list: Vec<Box<T>>) -> Array1<T> {
    list.into_iter().map(|boxed| *boxed).collect()
}

#[inline(never)]
fn unbox<T>(list: Vec<Box<T>>) -> Vec<T> {
    list.into_iter().map(|boxed| *boxed).collect()
}

/// Array of `n` copies of `value`.
#[inline]
pub fn fill(n: usize, value: f64) -> Array1<f64> {
    Array1::from_elem(n, value)
}

/// Apply `f(k, x[k])` to every element and collect the results.
///
/// `k` is the 0-based position. Like [`replicate`], each call's result is
/// boxed into an intermediate list before being unboxed into the output.
#[inline(never)]
pub fn map_indexed(values: &[f64], f: &dyn Fn(usize, f64) -> f64) -> Vec<f64> {
    let mut applied: Vec<Box<f64>> = Vec::with_capacity(values.len());
    for (k, &x) in values.iter().enumerate() {
        applied.push(Box::new(f(k, x)));
    }
    unbox(applied)
}
