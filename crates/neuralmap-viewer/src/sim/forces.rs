use bevy::math::Vec3;
use rand::rngs::StdRng;
use rand::Rng;
use smallvec::SmallVec;
use std::collections::HashMap;

use super::octree::OctNode;

const DISTANCE_MIN_SQ: f32 = 1.0;

pub(super) fn jiggle(rng: &mut StdRng) -> f32 {
    (rng.gen::<f32>() - 0.5) * 1e-6
}

fn jiggle_vec(rng: &mut StdRng) -> Vec3 {
    Vec3::new(jiggle(rng), jiggle(rng), jiggle(rng))
}

#[derive(Debug, Clone, Copy)]
pub(super) struct LinkTerm {
    pub(super) source: usize,
    pub(super) target: usize,
    pub(super) rest: f32,
    pub(super) strength: f32,
    /// Share of the correction applied to the target.
    pub(super) bias: f32,
}

/// Spring toward `rest`, measured on predicted positions.
pub(super) fn apply_links(
    links: &[LinkTerm],
    pos: &[Vec3],
    vel: &[Vec3],
    alpha: f32,
    rng: &mut StdRng,
    dv: &mut [Vec3],
) {
    for link in links {
        let (s, t) = (link.source, link.target);
        let mut d = (pos[t] + vel[t]) - (pos[s] + vel[s]);
        if d.length_squared() == 0.0 {
            d = jiggle_vec(rng);
        }
        let l = d.length();
        let k = (l - link.rest) / l * alpha * link.strength;
        let delta = d * k;
        dv[t] -= delta * link.bias;
        dv[s] += delta * (1.0 - link.bias);
    }
}

#[inline]
fn charge_contribution(
    d: Vec3,
    strength: f32,
    alpha: f32,
    distance_max_sq: f32,
    rng: &mut StdRng,
) -> Vec3 {
    let mut d = d;
    let mut l = d.length_squared();
    if l >= distance_max_sq {
        return Vec3::ZERO;
    }
    if l == 0.0 {
        d = jiggle_vec(rng);
        l = d.length_squared();
    }
    if l < DISTANCE_MIN_SQ {
        l = (DISTANCE_MIN_SQ * l).sqrt();
    }
    d * (strength * alpha / l)
}

/// Pairwise many-body force. Negative strength repels.
pub(super) fn apply_charge_exact(
    pos: &[Vec3],
    strengths: &[f32],
    alpha: f32,
    distance_max: f32,
    rng: &mut StdRng,
    dv: &mut [Vec3],
) {
    let max_sq = distance_max * distance_max;
    for i in 0..pos.len() {
        let mut acc = Vec3::ZERO;
        for j in 0..pos.len() {
            if i == j {
                continue;
            }
            acc += charge_contribution(pos[j] - pos[i], strengths[j], alpha, max_sq, rng);
        }
        dv[i] += acc;
    }
}

pub(super) fn apply_charge_barnes_hut(
    pos: &[Vec3],
    strengths: &[f32],
    alpha: f32,
    theta: f32,
    distance_max: f32,
    rng: &mut StdRng,
    dv: &mut [Vec3],
) {
    let Some(root) = OctNode::build(pos, strengths) else {
        return;
    };
    let params = TreeWalk {
        alpha,
        theta_sq: theta * theta,
        distance_max_sq: distance_max * distance_max,
    };
    for i in 0..pos.len() {
        let mut acc = Vec3::ZERO;
        accumulate_charge(&root, i, pos, strengths, params, rng, &mut acc);
        dv[i] += acc;
    }
}

#[derive(Clone, Copy)]
struct TreeWalk {
    alpha: f32,
    theta_sq: f32,
    distance_max_sq: f32,
}

fn accumulate_charge(
    node: &OctNode,
    index: usize,
    pos: &[Vec3],
    strengths: &[f32],
    walk: TreeWalk,
    rng: &mut StdRng,
    acc: &mut Vec3,
) {
    if node.is_leaf() {
        for &j in &node.indices {
            if j == index {
                continue;
            }
            *acc += charge_contribution(
                pos[j] - pos[index],
                strengths[j],
                walk.alpha,
                walk.distance_max_sq,
                rng,
            );
        }
        return;
    }

    let d = node.center - pos[index];
    let l = d.length_squared();
    let w = node.bounds.side_length();
    if !node.bounds.contains(pos[index]) && w * w / walk.theta_sq < l {
        *acc += charge_contribution(d, node.strength, walk.alpha, walk.distance_max_sq, rng);
        return;
    }

    for child in node.children.iter().flatten() {
        accumulate_charge(child, index, pos, strengths, walk, rng, acc);
    }
}

/// Pulls each node toward a sphere of radius `radii[i]` around `center`.
/// Nodes with no radius are left alone.
pub(super) fn apply_radial(
    pos: &[Vec3],
    radii: &[Option<f32>],
    center: Vec3,
    strength: f32,
    alpha: f32,
    rng: &mut StdRng,
    dv: &mut [Vec3],
) {
    for (i, radius) in radii.iter().enumerate() {
        let Some(radius) = *radius else {
            continue;
        };
        let mut d = pos[i] - center;
        if d.length_squared() == 0.0 {
            d = jiggle_vec(rng);
        }
        let r = d.length();
        let k = (radius - r) * strength * alpha / r;
        dv[i] += d * k;
    }
}

/// Separates overlapping spheres. Candidates come from a uniform grid so the
/// cost stays near linear.
pub(super) fn apply_collision(
    pos: &[Vec3],
    vel: &[Vec3],
    radii: &[f32],
    strength: f32,
    rng: &mut StdRng,
    dv: &mut [Vec3],
) {
    let max_radius = radii.iter().copied().fold(0.0_f32, f32::max);
    if max_radius <= 0.0 {
        return;
    }
    let cell = max_radius * 2.0;
    let key = |p: Vec3| {
        (
            (p.x / cell).floor() as i32,
            (p.y / cell).floor() as i32,
            (p.z / cell).floor() as i32,
        )
    };

    let predicted: Vec<Vec3> = pos.iter().zip(vel).map(|(p, v)| *p + *v).collect();
    let mut grid: HashMap<(i32, i32, i32), SmallVec<[usize; 8]>> = HashMap::new();
    for (i, p) in predicted.iter().enumerate() {
        grid.entry(key(*p)).or_default().push(i);
    }

    for i in 0..predicted.len() {
        let (cx, cy, cz) = key(predicted[i]);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(bucket) = grid.get(&(cx + dx, cy + dy, cz + dz)) else {
                        continue;
                    };
                    for &j in bucket {
                        if j <= i {
                            continue;
                        }
                        let r = radii[i] + radii[j];
                        let mut d = predicted[i] - predicted[j];
                        let mut l = d.length_squared();
                        if l >= r * r {
                            continue;
                        }
                        if l == 0.0 {
                            d = jiggle_vec(rng);
                            l = d.length_squared();
                        }
                        let l = l.sqrt();
                        let push = d * ((r - l) / l * strength);
                        let ri2 = radii[i] * radii[i];
                        let rj2 = radii[j] * radii[j];
                        let share = rj2 / (ri2 + rj2);
                        dv[i] += push * share;
                        dv[j] -= push * (1.0 - share);
                    }
                }
            }
        }
    }
}

/// Offset that would move the mean of the free nodes back to the origin.
pub(super) fn centering_offset(pos: &[Vec3], pinned: &[bool], strength: f32) -> Vec3 {
    let mut sum = Vec3::ZERO;
    let mut count = 0usize;
    for (p, pin) in pos.iter().zip(pinned) {
        if !pin {
            sum += *p;
            count += 1;
        }
    }
    if count == 0 {
        return Vec3::ZERO;
    }
    -(sum / count as f32) * strength
}
