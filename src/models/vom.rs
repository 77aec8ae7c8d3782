use super::{Ctw, Model};
use crate::history::ContextWindow;
use crate::tree::{SuffixTree, ROOT};
use serde::{Deserialize, Serialize};

/// Node of the pruned predictor. Leaves carry the conditional P(0) of
/// their suffix; interior nodes only route on context bits (`child0`
/// for a 0 context bit, `child1` for a 1, same as the weighted tree).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VomNode {
    leaf: bool,
    cond_p0: f64,
    max_log_prob: f64,
    child0: Option<Box<VomNode>>,
    child1: Option<Box<VomNode>>,
}

impl VomNode {
    fn leaf(cond_p0: f64, max_log_prob: f64) -> Self {
        Self {
            leaf: true,
            cond_p0,
            max_log_prob,
            child0: None,
            child1: None,
        }
    }

    /// Stand-in for a suffix the source tree never visited.
    fn unseen() -> Self {
        Self::leaf(0.5, 0.0)
    }
}

/// Variable-order Markov model: the single most probable pruning of a
/// trained CTW tree, frozen. Produced by context-tree maximization and
/// cheap enough to serialize and ship.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vom {
    root: VomNode,
    window: ContextWindow,
}

impl Vom {
    /// Context-tree maximization over the trained model. At every node
    /// the more probable of "predict here" and "split into sub-suffixes"
    /// wins; the losing alternative is dropped for good.
    pub fn from_ctw(model: &Ctw) -> Self {
        Self {
            root: maximize(&model.tree, ROOT),
            window: model.window.clone(),
        }
    }
}

fn maximize(tree: &SuffixTree, ix: u32) -> VomNode {
    let node = tree.node(ix);
    let (a, b) = (f64::from(node.a), f64::from(node.b));
    let cond_p0 = (a + 0.5) / (a + b + 1.0);

    let [c0, c1] = node.children;
    if c0.is_none() && c1.is_none() {
        return VomNode::leaf(cond_p0, node.lkt);
    }

    let child0 = c0.map(|c| maximize(tree, c));
    let child1 = c1.map(|c| maximize(tree, c));
    let ml = child0.as_ref().map_or(0.0, |n| n.max_log_prob);
    let mr = child1.as_ref().map_or(0.0, |n| n.max_log_prob);

    if node.lkt >= ml + mr {
        VomNode::leaf(cond_p0, node.lkt)
    } else {
        VomNode {
            leaf: false,
            // routing never reads this; 0.5 keeps the field a probability
            cond_p0: 0.5,
            max_log_prob: ml + mr,
            child0: Some(Box::new(child0.unwrap_or_else(VomNode::unseen))),
            child1: Some(Box::new(child1.unwrap_or_else(VomNode::unseen))),
        }
    }
}

impl Model for Vom {
    /// Routes on the context, most recent bit first, and answers at the
    /// first leaf (or wherever the context runs out).
    fn prob0(&mut self) -> f64 {
        let mut node = &self.root;
        for d in 0..self.window.depth() {
            if node.leaf {
                return node.cond_p0;
            }
            let next = match self.window.newest(d) {
                0 => &node.child0,
                _ => &node.child1,
            };
            node = next.as_deref().expect("interior node lost a child");
        }
        node.cond_p0
    }

    /// The tree is frozen; observing only advances the context.
    fn observe(&mut self, bit: u8) {
        assert!(bit <= 1, "invalid bit {bit}");
        self.window.push(bit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_stream_collapses_to_the_root() {
        let mut model = Ctw::new(&[0, 0]);
        for _ in 0..16 {
            model.observe(0);
        }
        let mut vom = Vom::from_ctw(&model);
        assert!(vom.root.leaf);
        assert!(vom.root.cond_p0 > 0.9);
        assert!(vom.prob0() > 0.9);
    }

    #[test]
    fn max_log_prob_dominates() {
        fn best(tree: &SuffixTree, ix: u32) -> f64 {
            let node = tree.node(ix);
            if node.children == [None, None] {
                return node.lkt;
            }
            let ml = node.children[0].map_or(0.0, |c| best(tree, c));
            let mr = node.children[1].map_or(0.0, |c| best(tree, c));
            node.lkt.max(ml + mr)
        }

        fn check(tree: &SuffixTree, ix: u32, vnode: &VomNode) {
            let node = tree.node(ix);
            assert_eq!(vnode.max_log_prob, best(tree, ix));
            if !vnode.leaf {
                if let Some(c) = node.children[0] {
                    check(tree, c, vnode.child0.as_ref().unwrap());
                }
                if let Some(c) = node.children[1] {
                    check(tree, c, vnode.child1.as_ref().unwrap());
                }
            }
        }

        let mut model = Ctw::new(&[0, 0, 0]);
        for bit in [0, 1, 1, 0, 1, 0, 1, 1, 1, 0, 0, 1, 0, 1, 1, 0] {
            model.observe(bit);
        }
        let vom = Vom::from_ctw(&model);
        check(&model.tree, ROOT, &vom.root);
    }

    #[test]
    fn splits_learn_what_mixing_smears() {
        // bits following context suffix "10" depend on the bit before
        // it: ..010 -> 1, ..110 -> 0. Mixed at depth 1, separable at
        // depth 3, with suffix "00" never observed.
        let mut model = Ctw::new(&[1, 1, 0]);
        let following_010 = ContextWindow::new(&[0, 1, 0]);
        let following_110 = ContextWindow::new(&[1, 1, 0]);
        for _ in 0..8 {
            model.tree.update(&following_010, 1);
            model.tree.update(&following_110, 0);
        }

        let mut vom = Vom::from_ctw(&model);
        assert!(!vom.root.leaf);

        // window [1, 1, 0] routes to the pure-zero leaf
        let p0 = vom.prob0();
        assert!((p0 - 8.5 / 9.0).abs() < 1e-12, "p0 = {p0}");

        // walk the context to [0, 1, 0]: the pure-one leaf
        vom.observe(0);
        vom.observe(1);
        vom.observe(0);
        let p0 = vom.prob0();
        assert!((p0 - 0.5 / 9.0).abs() < 1e-12, "p0 = {p0}");

        // [1, 0, 0] ends in a suffix the training stream never had;
        // the substituted default leaf answers even odds
        vom.observe(0);
        assert_eq!(vom.prob0(), 0.5);
    }

    #[test]
    fn observe_only_moves_the_context() {
        let mut model = Ctw::new(&[0, 1]);
        for bit in [1, 0, 1, 1, 0] {
            model.observe(bit);
        }
        let mut vom = Vom::from_ctw(&model);
        let frozen = vom.root.clone();
        vom.observe(1);
        vom.observe(0);
        assert_eq!(vom.root, frozen);
    }

    #[test]
    fn json_round_trip_is_lossless() {
        let mut model = Ctw::new(&[0, 0, 0, 0]);
        for bit in [1, 1, 0, 1, 0, 0, 1, 1, 1, 0, 1, 0] {
            model.observe(bit);
        }
        let mut vom = Vom::from_ctw(&model);

        let json = serde_json::to_string(&vom).unwrap();
        let mut back: Vom = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vom);
        for bit in [0, 1, 1, 0, 1] {
            assert_eq!(back.prob0(), vom.prob0());
            back.observe(bit);
            vom.observe(bit);
        }
    }
}
