//! Cross-channel mixing matrix with live-adjustable coefficients.

use super::Effect;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[inline]
fn load(cell: &AtomicU64) -> f64 {
    f64::from_bits(cell.load(Ordering::Relaxed))
}

#[inline]
fn store(cell: &AtomicU64, value: f64) {
    cell.store(value.to_bits(), Ordering::Relaxed);
}

/// The four coefficients, stored as `f64` bit patterns for lock-free access.
#[derive(Debug)]
struct Matrix {
    l_to_l: AtomicU64,
    l_to_r: AtomicU64,
    r_to_l: AtomicU64,
    r_to_r: AtomicU64,
}

/// Handle for changing a [`ComplexFader`]'s coefficients while it plays.
///
/// Changes are picked up by the next frame the fader processes.
#[derive(Debug, Clone)]
pub struct MixControls {
    matrix: Arc<Matrix>,
}

impl MixControls {
    /// Replaces all four coefficients.
    pub fn set(&self, l_to_l: f64, l_to_r: f64, r_to_l: f64, r_to_r: f64) {
        store(&self.matrix.l_to_l, l_to_l);
        store(&self.matrix.l_to_r, l_to_r);
        store(&self.matrix.r_to_l, r_to_l);
        store(&self.matrix.r_to_r, r_to_r);
    }

    /// Current coefficients as `(l_to_l, l_to_r, r_to_l, r_to_r)`.
    pub fn get(&self) -> (f64, f64, f64, f64) {
        (
            load(&self.matrix.l_to_l),
            load(&self.matrix.l_to_r),
            load(&self.matrix.r_to_l),
            load(&self.matrix.r_to_r),
        )
    }
}

/// Mixes each channel into both outputs.
///
/// ```text
/// left'  = left * l_to_l + right * r_to_l
/// right' = left * l_to_r + right * r_to_r
/// ```
///
/// Both outputs are computed from the original pair.
///
/// # Examples
///
/// ```
/// use kaudio::effects::{ComplexFader, Effect};
///
/// // Swap channels
/// let mut swap = ComplexFader::new(0.0, 1.0, 1.0, 0.0);
/// let mut left = [10.0];
/// let mut right = [20.0];
/// swap.apply(0, &mut left, &mut right, 44_100);
/// assert_eq!((left[0], right[0]), (20.0, 10.0));
///
/// // Fold to mono from another thread
/// let controls = swap.controls();
/// controls.set(0.5, 0.5, 0.5, 0.5);
/// swap.apply(0, &mut left, &mut right, 44_100);
/// assert_eq!((left[0], right[0]), (15.0, 15.0));
/// ```
#[derive(Debug)]
pub struct ComplexFader {
    matrix: Arc<Matrix>,
}

impl ComplexFader {
    /// Creates a fader with the given matrix.
    ///
    /// # Arguments
    ///
    /// * `l_to_l` - Share of the left input in the left output
    /// * `l_to_r` - Share of the left input in the right output
    /// * `r_to_l` - Share of the right input in the left output
    /// * `r_to_r` - Share of the right input in the right output
    pub fn new(l_to_l: f64, l_to_r: f64, r_to_l: f64, r_to_r: f64) -> Self {
        let fader = Self {
            matrix: Arc::new(Matrix {
                l_to_l: AtomicU64::new(0),
                l_to_r: AtomicU64::new(0),
                r_to_l: AtomicU64::new(0),
                r_to_r: AtomicU64::new(0),
            }),
        };
        fader.controls().set(l_to_l, l_to_r, r_to_l, r_to_r);
        fader
    }

    /// Pass-through matrix.
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0)
    }

    /// A handle that adjusts this fader's coefficients.
    pub fn controls(&self) -> MixControls {
        MixControls {
            matrix: Arc::clone(&self.matrix),
        }
    }
}

impl Effect for ComplexFader {
    fn apply(&mut self, index: usize, left: &mut [f64], right: &mut [f64], _frame_rate: u32) {
        let l = left[index];
        let r = right[index];
        let m = &self.matrix;
        left[index] = l * load(&m.l_to_l) + r * load(&m.r_to_l);
        right[index] = l * load(&m.l_to_r) + r * load(&m.r_to_r);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_uses_original_pair() {
        let mut fader = ComplexFader::new(1.0, 1.0, 1.0, 0.0);
        let mut left = [3.0];
        let mut right = [5.0];
        fader.apply(0, &mut left, &mut right, 8000);
        // right' uses the old left (3), not the new one (8)
        assert_eq!((left[0], right[0]), (8.0, 3.0));
    }

    #[test]
    fn test_identity() {
        let mut fader = ComplexFader::identity();
        let mut left = [-7.0];
        let mut right = [11.0];
        fader.apply(0, &mut left, &mut right, 8000);
        assert_eq!((left[0], right[0]), (-7.0, 11.0));
    }

    #[test]
    fn test_controls_from_other_thread() {
        let mut fader = ComplexFader::identity();
        let controls = fader.controls();
        std::thread::spawn(move || controls.set(0.0, 0.0, 2.0, 0.0))
            .join()
            .unwrap();
        assert_eq!(fader.controls().get(), (0.0, 0.0, 2.0, 0.0));
        let mut left = [1.0];
        let mut right = [4.0];
        fader.apply(0, &mut left, &mut right, 8000);
        assert_eq!((left[0], right[0]), (8.0, 0.0));
    }
}
