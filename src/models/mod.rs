pub mod ctw;
pub mod fctw;
pub mod reverter;
pub mod vom;

pub use self::{ctw::*, fctw::*, reverter::*, vom::*};

/// A probabilistic bit model driving the arithmetic coder.
pub trait Model {
    /// Probability in (0, 1) that the next bit is zero. Takes `&mut self`
    /// because the estimate runs as a speculative update reverted before
    /// returning; the model compares equal to its prior state.
    fn prob0(&mut self) -> f64;

    /// Commits one bit of history.
    fn observe(&mut self, bit: u8);
}
