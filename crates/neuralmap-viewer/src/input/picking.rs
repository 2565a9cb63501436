use bevy::math::{Vec2, Vec3};

/// A node projected into viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenNode {
    pub index: usize,
    pub screen: Vec2,
    /// Projected radius in pixels.
    pub radius: f32,
}

/// Nearest node to `cursor` whose pick disc (at least `min_radius` wide)
/// contains it.
pub fn pick_nearest(
    nodes: impl IntoIterator<Item = ScreenNode>,
    cursor: Vec2,
    min_radius: f32,
) -> Option<usize> {
    let mut best: Option<(f32, usize)> = None;
    for n in nodes {
        let d = n.screen.distance(cursor);
        if d > n.radius.max(min_radius) {
            continue;
        }
        if best.map(|(bd, _)| d < bd).unwrap_or(true) {
            best = Some((d, n.index));
        }
    }
    best.map(|(_, i)| i)
}

/// Intersection of a ray with a plane, or `None` when parallel or behind.
pub fn ray_plane(origin: Vec3, dir: Vec3, plane_point: Vec3, plane_normal: Vec3) -> Option<Vec3> {
    let denom = dir.dot(plane_normal);
    if denom.abs() < 1e-6 {
        return None;
    }
    let t = (plane_point - origin).dot(plane_normal) / denom;
    if t < 0.0 || !t.is_finite() {
        return None;
    }
    Some(origin + dir * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(index: usize, x: f32, y: f32) -> ScreenNode {
        ScreenNode {
            index,
            screen: Vec2::new(x, y),
            radius: 2.0,
        }
    }

    #[test]
    fn picks_the_closest_within_radius() {
        let nodes = [at(0, 100.0, 100.0), at(1, 108.0, 100.0), at(2, 300.0, 300.0)];
        assert_eq!(pick_nearest(nodes, Vec2::new(106.0, 100.0), 14.0), Some(1));
        assert_eq!(pick_nearest(nodes, Vec2::new(200.0, 200.0), 14.0), None);
    }

    #[test]
    fn large_projected_nodes_widen_their_pick_disc() {
        let mut big = at(0, 0.0, 0.0);
        big.radius = 40.0;
        assert_eq!(pick_nearest([big], Vec2::new(30.0, 0.0), 14.0), Some(0));
        assert_eq!(pick_nearest([at(0, 0.0, 0.0)], Vec2::new(30.0, 0.0), 14.0), None);
    }

    #[test]
    fn ray_hits_camera_facing_plane() {
        let hit = ray_plane(
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(3.0, 4.0, 0.0),
            Vec3::Z,
        );
        assert_eq!(hit, Some(Vec3::ZERO));
        assert_eq!(ray_plane(Vec3::ZERO, Vec3::X, Vec3::ZERO, Vec3::Z), None);
        assert_eq!(
            ray_plane(Vec3::new(0.0, 0.0, 10.0), Vec3::Z, Vec3::ZERO, Vec3::Z),
            None
        );
    }
}
