#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LodLevel {
    High,
    Medium,
    Low,
}

impl LodLevel {
    pub const ALL: [LodLevel; 3] = [LodLevel::High, LodLevel::Medium, LodLevel::Low];

    /// (sectors, stacks) of the sphere mesh for this level.
    pub fn sphere_resolution(self) -> (usize, usize) {
        match self {
            LodLevel::High => (32, 16),
            LodLevel::Medium => (16, 8),
            LodLevel::Low => (8, 4),
        }
    }

    pub fn slot(self) -> usize {
        match self {
            LodLevel::High => 0,
            LodLevel::Medium => 1,
            LodLevel::Low => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LodThresholds {
    pub near: f32,
    pub far: f32,
}

impl Default for LodThresholds {
    fn default() -> Self {
        Self {
            near: 300.0,
            far: 500.0,
        }
    }
}

impl LodThresholds {
    pub fn level_for(&self, distance: f32) -> LodLevel {
        if distance <= self.near {
            LodLevel::High
        } else if distance <= self.far {
            LodLevel::Medium
        } else {
            LodLevel::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_follows_distance_bands() {
        let t = LodThresholds::default();
        assert_eq!(t.level_for(0.0), LodLevel::High);
        assert_eq!(t.level_for(300.0), LodLevel::High);
        assert_eq!(t.level_for(300.5), LodLevel::Medium);
        assert_eq!(t.level_for(500.0), LodLevel::Medium);
        assert_eq!(t.level_for(5000.0), LodLevel::Low);
    }

    #[test]
    fn coarser_levels_have_fewer_segments() {
        let res: Vec<usize> = LodLevel::ALL
            .iter()
            .map(|l| l.sphere_resolution().0)
            .collect();
        assert!(res.windows(2).all(|w| w[0] > w[1]));
    }
}
