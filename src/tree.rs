use crate::helpers::logaddexp;
use crate::history::ContextWindow;
use crate::{u32, usize};
use debug_unreachable::debug_unreachable;

pub(crate) const ROOT: u32 = 0;

const LOG_HALF: f64 = -std::f64::consts::LN_2;

/// One suffix of the context. `children[c]` extends the suffix with
/// context bit `c`. The counts and KT estimate cover every stream bit
/// whose preceding context ended in this suffix.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct TreeNode {
    pub a: u32,   // zeros observed
    pub b: u32,   // ones observed
    pub lkt: f64, // log KT probability of the observed bits
    pub lw: f64,  // log weighted probability, mixed over sub-suffixes
    pub children: [Option<u32>; 2],
}

/// Rollback record for one node touched by an update.
#[derive(Clone, Debug)]
pub(crate) struct Snapshot {
    node: u32,
    a: u32,
    b: u32,
    lkt: f64,
    lw: f64,
    is_new: bool,
}

/// Sequential Krichevsky-Trofimov step. The log term uses the counts from
/// before the increment; exact reversal replays this order.
fn krichevsky_trofimov(node: &mut TreeNode, bit: u8) {
    let a = f64::from(node.a);
    let b = f64::from(node.b);
    match bit {
        0 => {
            node.lkt += (a + 0.5).ln() - (a + b + 1.0).ln();
            node.a += 1;
        }
        1 => {
            node.lkt += (b + 0.5).ln() - (a + b + 1.0).ln();
            node.b += 1;
        }
        // update() rejects anything else at the door
        _ => unsafe { debug_unreachable!("bit out of range") },
    }
}

/// Lazily grown suffix tree over an index arena. Slot 0 is the root (the
/// empty suffix); deeper suffixes get a slot the first time the context
/// reaches them.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SuffixTree {
    nodes: Vec<TreeNode>,
}

impl SuffixTree {
    pub fn new() -> Self {
        Self { nodes: vec![TreeNode::default()] }
    }

    pub fn root_lw(&self) -> f64 {
        self.nodes[usize!(ROOT)].lw
    }

    pub fn node(&self, ix: u32) -> &TreeNode {
        &self.nodes[usize!(ix)]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn alloc(&mut self) -> u32 {
        let ix = u32!(self.nodes.len());
        self.nodes.push(TreeNode::default());
        ix
    }

    fn snap(&self, ix: u32, is_new: bool) -> Snapshot {
        let node = &self.nodes[usize!(ix)];
        Snapshot {
            node: ix,
            a: node.a,
            b: node.b,
            lkt: node.lkt,
            lw: node.lw,
            is_new,
        }
    }

    /// Feeds `bit` to every node on the context path, then reweights the
    /// path bottom-up. Returns the root-to-leaf snapshots `revert` takes.
    ///
    /// An absent node weighs log 1 = 0, which is exactly what a fresh
    /// zero-initialized slot holds, so allocating on first touch changes
    /// no probabilities by itself.
    pub fn update(&mut self, window: &ContextWindow, bit: u8) -> Vec<Snapshot> {
        assert!(bit <= 1, "invalid bit {bit}");

        let mut traversed = Vec::with_capacity(window.depth() + 1);
        let mut ix = ROOT;
        traversed.push(self.snap(ix, false));
        krichevsky_trofimov(&mut self.nodes[usize!(ix)], bit);

        for d in 0..window.depth() {
            let c = usize::from(window.newest(d));
            let (next, is_new) = match self.nodes[usize!(ix)].children[c] {
                Some(child) => (child, false),
                None => {
                    let child = self.alloc();
                    self.nodes[usize!(ix)].children[c] = Some(child);
                    (child, true)
                }
            };
            ix = next;
            traversed.push(self.snap(ix, is_new));
            krichevsky_trofimov(&mut self.nodes[usize!(ix)], bit);
        }

        for ss in traversed.iter().rev() {
            let at = usize!(ss.node);
            let [c0, c1] = self.nodes[at].children;
            let lw = if c0.is_none() && c1.is_none() {
                self.nodes[at].lkt
            } else {
                let lp = c0.map_or(0.0, |c| self.nodes[usize!(c)].lw);
                let rp = c1.map_or(0.0, |c| self.nodes[usize!(c)].lw);
                logaddexp(LOG_HALF + self.nodes[at].lkt, LOG_HALF + lp + rp)
            };
            self.nodes[at].lw = lw;
        }

        traversed
    }

    /// Rolls back one `update`, bit-exact. Updates revert in LIFO order
    /// (Prob0 immediately, the reverter by stack), which keeps a reverted
    /// update's allocations at the arena tail.
    pub fn revert(&mut self, traversed: &[Snapshot]) {
        let mut keep = self.nodes.len();

        for (i, ss) in traversed.iter().enumerate() {
            let node = &mut self.nodes[usize!(ss.node)];
            node.a = ss.a;
            node.b = ss.b;
            node.lkt = ss.lkt;
            node.lw = ss.lw;

            if let Some(next) = traversed.get(i + 1) {
                if next.is_new {
                    // A fresh node only ever gains fresh children, so the
                    // remaining snapshots all live in the branch detached
                    // here.
                    debug_assert!(traversed[i + 1..].iter().all(|s| s.is_new));
                    let c = usize::from(node.children[0] != Some(next.node));
                    debug_assert_eq!(node.children[c], Some(next.node));
                    node.children[c] = None;
                    keep = usize!(next.node);
                    break;
                }
            }
        }

        self.nodes.truncate(keep);
    }
}
