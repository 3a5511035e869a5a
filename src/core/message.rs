use ndarray::Array1;
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use std::fmt::Debug;

/// A trait providing message's methods.
///
/// A factor graph stores any `Clone` message type on its edges,
/// this trait is only what an inference engine usually needs on top of that.
pub trait Message: Debug + Clone + 'static {
    /// Evaluates a distance between messages
    ///
    /// # Arguments
    ///
    /// * `other` - A second message
    ///
    /// # Notes
    ///
    /// Message passing uses it as a stopping criterion: when discrepancy
    /// is smaller than some threshold, message passing stops
    fn discrepancy(&self, other: &Self) -> f64;

    /// Copy message to dst
    ///
    /// # Arguments
    ///
    /// * `dst` - A destination where to copy a message
    #[inline(always)]
    fn memcpy(&self, dst: &mut Self) {
        *dst = self.clone();
    }
}

impl Message for f64 {
    #[inline(always)]
    fn discrepancy(&self, other: &Self) -> f64 {
        (self - other).abs()
    }
}

impl Message for Array1<f64> {
    /// Maximal absolute difference between entries,
    /// messages of different sizes are infinitely far apart
    #[inline]
    fn discrepancy(&self, other: &Self) -> f64 {
        if self.len() != other.len() {
            return f64::INFINITY;
        }
        self.iter()
            .zip(other)
            .fold(0f64, |acc, (x, y)| acc.max((x - y).abs()))
    }

    #[inline]
    fn memcpy(&self, dst: &mut Self) {
        if dst.len() == self.len() {
            dst.assign(self);
        } else {
            *dst = self.clone();
        }
    }
}

/// Crates a new random message initializer.
/// A created generator samples each entry from a uniform
/// distribution over [0, 1) and normalizes the message to sum to one.
///
/// # Arguments
///
/// * `rng` - A generator of random numbers
/// * `size` - A number of entries in a message (cardinality of a variable)
///
/// # Example
///
/// ```
/// use fgrs::core::random_message_initializer;
/// use rand::thread_rng;
///
/// let mut initializer = random_message_initializer(thread_rng(), 3);
/// let msg = initializer();
/// assert_eq!(msg.len(), 3);
/// assert!((msg.sum() - 1f64).abs() < 1e-12);
/// ```
pub fn random_message_initializer(
    mut rng: impl Rng,
    size: usize,
) -> impl FnMut() -> Array1<f64> {
    let distr = Uniform::new(f64::EPSILON, 1f64);
    move || {
        let mut msg = Array1::from_iter((0..size).map(|_| distr.sample(&mut rng)));
        let norm = msg.sum();
        if norm > 0f64 {
            msg /= norm;
        }
        msg
    }
}
