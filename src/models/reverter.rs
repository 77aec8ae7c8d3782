use super::{Ctw, Model};
use crate::tree::Snapshot;

/// Look-ahead wrapper over a `Ctw`: every `observe` keeps its rollback
/// state so `unobserve` can pop observations in LIFO order and leave the
/// model bit-identical. Borrows the model exclusively for the whole
/// speculative run.
pub struct CtwReverter<'a> {
    model: &'a mut Ctw,
    frames: Vec<Frame>,
}

struct Frame {
    evicted: u8,
    traversed: Vec<Snapshot>,
}

impl<'a> CtwReverter<'a> {
    pub fn new(model: &'a mut Ctw) -> Self {
        Self { model, frames: Vec::new() }
    }

    /// Observations not yet unwound.
    pub fn pending(&self) -> usize {
        self.frames.len()
    }

    /// Undoes the most recent `observe`: reverts the tree, then shifts
    /// the context window back, restoring the bit `observe` evicted.
    pub fn unobserve(&mut self) {
        let frame = self
            .frames
            .pop()
            .expect("unobserve without a pending observe");
        self.model.tree.revert(&frame.traversed);
        self.model.window.unpush(frame.evicted);
    }
}

impl Model for CtwReverter<'_> {
    fn prob0(&mut self) -> f64 {
        self.model.prob0()
    }

    fn observe(&mut self, bit: u8) {
        let evicted = self.model.window.oldest();
        let traversed = self.model.tree.update(&self.model.window, bit);
        self.model.window.push(bit);
        self.frames.push(Frame { evicted, traversed });
    }
}
