//! Static branch skeleton
//!
//! Built once per surface size. Every random visual parameter (angles, length
//! multipliers, bloom thresholds, flower slots) is baked in here so the per-frame
//! renderer only has to read it.

use crate::config::TreeConfig;
use crate::entropy::Entropy;

const BASE_SPREAD: f32 = 0.628; // ~36 degrees
const SPREAD_JITTER: f32 = 0.15; // ~8.6 degrees
const LEN_MULT_MIN: f32 = 0.64;
const LEN_MULT_MAX: f32 = 0.80;
const THICKNESS_DECAY: f32 = 0.7;
const BLOOM_THRESHOLD_MIN: f32 = 0.05;
const BLOOM_THRESHOLD_MAX: f32 = 0.95;
const FLOWER_SLOT_CHANCE: f32 = 0.5;

/// Depth levels below the cap that carry foliage and shed particles
pub const FOLIAGE_LEVELS: u32 = 4;

/// One branch of the tree. Immutable once built.
#[derive(Clone, Debug)]
pub struct BranchNode {
    pub length: f32,
    pub thickness: f32,
    pub len_mult: f32,
    pub depth: u32,
    /// Static rotation relative to the parent frame, radians
    pub angle_offset: f32,
    pub bloom_threshold: f32,
    pub has_flower_slot: bool,
    pub children: Vec<BranchNode>,
}

impl BranchNode {
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(BranchNode::node_count).sum::<usize>()
    }

    pub fn max_depth(&self) -> u32 {
        self.children
            .iter()
            .map(BranchNode::max_depth)
            .max()
            .unwrap_or(self.depth)
    }

    /// Pre-order walk
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a BranchNode)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }
}

/// Whether a branch at `depth` sits in the foliage-bearing outer levels
pub fn in_canopy(depth: u32, max_depth: u32) -> bool {
    depth + FOLIAGE_LEVELS > max_depth
}

/// Trunk length and thickness for a surface, with a compact variant for narrow ones
pub fn trunk_dimensions(width: f32, height: f32, config: &TreeConfig) -> (f32, f32) {
    if width < config.narrow_breakpoint {
        (height * 0.30, (width * 0.035).clamp(2.0, 14.0))
    } else {
        (height * 0.34, (width * 0.022).clamp(6.0, 24.0))
    }
}

/// Build the full binary skeleton for a surface of the given size
pub fn build(width: f32, height: f32, config: &TreeConfig, entropy: &mut dyn Entropy) -> BranchNode {
    let (trunk_len, trunk_thickness) = trunk_dimensions(width, height, config);
    let len_mult = entropy.range(LEN_MULT_MIN, LEN_MULT_MAX);
    grow(
        trunk_len * len_mult,
        trunk_thickness,
        len_mult,
        0,
        0.0,
        config.max_depth,
        entropy,
    )
}

fn grow(
    length: f32,
    thickness: f32,
    len_mult: f32,
    depth: u32,
    angle_offset: f32,
    max_depth: u32,
    entropy: &mut dyn Entropy,
) -> BranchNode {
    let bloom_threshold = entropy.range(BLOOM_THRESHOLD_MIN, BLOOM_THRESHOLD_MAX);
    let has_flower_slot = in_canopy(depth, max_depth) && entropy.chance(FLOWER_SLOT_CHANCE);

    let mut children = Vec::new();
    if depth < max_depth {
        children.reserve(2);
        for side in [-1.0f32, 1.0] {
            let spread = BASE_SPREAD + entropy.range(-SPREAD_JITTER, SPREAD_JITTER);
            let mult = entropy.range(LEN_MULT_MIN, LEN_MULT_MAX);
            children.push(grow(
                length * mult,
                thickness * THICKNESS_DECAY,
                mult,
                depth + 1,
                side * spread,
                max_depth,
                entropy,
            ));
        }
    }

    BranchNode {
        length,
        thickness,
        len_mult,
        depth,
        angle_offset,
        bloom_threshold,
        has_flower_slot,
        children,
    }
}
