use super::Model;
use crate::history::ContextWindow;
use crate::tree::SuffixTree;

/// Context tree weighting model: an online Bayesian mixture over every
/// suffix source no deeper than the context window.
#[derive(Clone, Debug, PartialEq)]
pub struct Ctw {
    pub(crate) tree: SuffixTree,
    pub(crate) window: ContextWindow,
}

impl Ctw {
    /// Tree depth is `bits.len()`; `bits` seeds the context, oldest
    /// first. All-zero seeds are the usual choice.
    pub fn new(bits: &[u8]) -> Self {
        Self {
            tree: SuffixTree::new(),
            window: ContextWindow::new(bits),
        }
    }

    pub fn depth(&self) -> usize {
        self.window.depth()
    }
}

impl Model for Ctw {
    /// Speculatively observes a zero and reads the change in the root's
    /// weighted log-probability, then reverts. `after <= before`, so the
    /// ratio never leaves (0, 1].
    fn prob0(&mut self) -> f64 {
        let before = self.tree.root_lw();
        let traversed = self.tree.update(&self.window, 0);
        let after = self.tree.root_lw();
        self.tree.revert(&traversed);
        (after - before).exp()
    }

    fn observe(&mut self, bit: u8) {
        self.tree.update(&self.window, bit);
        self.window.push(bit);
    }
}
