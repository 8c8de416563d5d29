//! Separable linear resampling along arbitrary axes.

use ndarray::{Array, ArrayView, Axis, Dimension, RemoveAxis, Zip};

/// How destination sample positions map back onto the source grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// Pixel centers line up: `src = (dst + 0.5) * in / out - 0.5`.
    HalfPixel,
    /// First and last samples line up: `src = dst * (in - 1) / (out - 1)`.
    Corners,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Tap {
    lo: usize,
    hi: usize,
    frac: f32,
}

fn taps(src_len: usize, dst_len: usize, alignment: Alignment) -> Vec<Tap> {
    let last = src_len - 1;
    (0..dst_len)
        .map(|i| {
            let pos = match alignment {
                Alignment::HalfPixel => {
                    let scale = src_len as f64 / dst_len as f64;
                    ((i as f64 + 0.5) * scale - 0.5).clamp(0.0, last as f64)
                }
                Alignment::Corners if dst_len == 1 => 0.0,
                Alignment::Corners => i as f64 * last as f64 / (dst_len - 1) as f64,
            };
            let lo = (pos.floor() as usize).min(last);
            Tap {
                lo,
                hi: (lo + 1).min(last),
                frac: (pos - lo as f64) as f32,
            }
        })
        .collect()
}

/// Resamples `input` along one axis to `len` samples.
///
/// `input` must be non-empty along `axis`.
pub fn resample_axis<D: Dimension + RemoveAxis>(
    input: ArrayView<'_, f32, D>,
    axis: Axis,
    len: usize,
    alignment: Alignment,
) -> Array<f32, D> {
    let mut shape = input.raw_dim();
    shape[axis.index()] = len;
    let mut output = Array::<f32, D>::zeros(shape);
    for (i, tap) in taps(input.len_of(axis), len, alignment).into_iter().enumerate() {
        let lo = input.index_axis(axis, tap.lo);
        let hi = input.index_axis(axis, tap.hi);
        Zip::from(output.index_axis_mut(axis, i))
            .and(&lo)
            .and(&hi)
            .for_each(|out, &a, &b| *out = a + (b - a) * tap.frac);
    }
    output
}

/// Resamples each `(axis, len)` pair in turn. Axes not listed keep their size.
pub fn resample<D: Dimension + RemoveAxis>(
    input: Array<f32, D>,
    targets: &[(Axis, usize)],
    alignment: Alignment,
) -> Array<f32, D> {
    targets.iter().fold(input, |current, &(axis, len)| {
        if current.len_of(axis) == len {
            current
        } else {
            resample_axis(current.view(), axis, len, alignment)
        }
    })
}
