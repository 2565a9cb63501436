use bevy::math::Vec3;

const OCTREE_LEAF_CAPACITY: usize = 8;
const OCTREE_MAX_DEPTH: usize = 12;

#[derive(Debug, Clone, Copy)]
pub(super) struct OctBounds {
    pub(super) center: Vec3,
    pub(super) half_extent: f32,
}

impl OctBounds {
    fn from_points(points: &[Vec3]) -> Option<Self> {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for p in points {
            min = min.min(*p);
            max = max.max(*p);
        }
        if !min.is_finite() || !max.is_finite() {
            return None;
        }
        let span = (max - min).max(Vec3::ONE);
        Some(Self {
            center: (min + max) * 0.5,
            half_extent: span.max_element() * 0.5 + 1.0,
        })
    }

    fn octant_for(self, p: Vec3) -> usize {
        (usize::from(p.x >= self.center.x))
            | (usize::from(p.y >= self.center.y) << 1)
            | (usize::from(p.z >= self.center.z) << 2)
    }

    fn child(self, octant: usize) -> Self {
        let q = self.half_extent * 0.5;
        let sign = |bit: usize| if octant & bit != 0 { q } else { -q };
        Self {
            center: self.center + Vec3::new(sign(1), sign(2), sign(4)),
            half_extent: q,
        }
    }

    pub(super) fn contains(self, p: Vec3) -> bool {
        let d = (p - self.center).abs();
        d.max_element() <= self.half_extent
    }

    pub(super) fn side_length(self) -> f32 {
        self.half_extent * 2.0
    }
}

/// Barnes-Hut cell. `strength` is the summed charge of the points inside;
/// `center` is weighted by absolute charge.
pub(super) struct OctNode {
    pub(super) bounds: OctBounds,
    pub(super) center: Vec3,
    pub(super) strength: f32,
    pub(super) indices: Vec<usize>,
    pub(super) children: [Option<Box<OctNode>>; 8],
}

impl OctNode {
    pub(super) fn build(positions: &[Vec3], strengths: &[f32]) -> Option<Self> {
        let bounds = OctBounds::from_points(positions)?;
        let indices = (0..positions.len()).collect();
        Some(Self::build_node(bounds, indices, positions, strengths, 0))
    }

    fn build_node(
        bounds: OctBounds,
        indices: Vec<usize>,
        positions: &[Vec3],
        strengths: &[f32],
        depth: usize,
    ) -> Self {
        let mut weighted = Vec3::ZERO;
        let mut weight = 0.0;
        let mut strength = 0.0;
        for &i in &indices {
            let w = strengths[i].abs();
            weighted += positions[i] * w;
            weight += w;
            strength += strengths[i];
        }
        let center = if weight > 0.0 {
            weighted / weight
        } else {
            bounds.center
        };

        let mut node = Self {
            bounds,
            center,
            strength,
            indices,
            children: std::array::from_fn(|_| None),
        };

        if depth >= OCTREE_MAX_DEPTH || node.indices.len() <= OCTREE_LEAF_CAPACITY {
            return node;
        }

        let mut buckets: [Vec<usize>; 8] = std::array::from_fn(|_| Vec::new());
        for &i in &node.indices {
            buckets[bounds.octant_for(positions[i])].push(i);
        }
        if buckets.iter().filter(|b| !b.is_empty()).count() <= 1 {
            return node;
        }

        for (octant, bucket) in buckets.into_iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }
            node.children[octant] = Some(Box::new(Self::build_node(
                bounds.child(octant),
                bucket,
                positions,
                strengths,
                depth + 1,
            )));
        }
        node.indices.clear();
        node
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }
}
