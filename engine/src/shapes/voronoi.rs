use std::f64::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::{blend_noise, require_count, require_positive};
use crate::api::{Point, Result};

pub const NOISE_BASE: f64 = 0.4;
pub const NOISE_RANGE: f64 = 0.6;

/// Share of non-nearest cluster glow added on top of the nearest cluster.
pub const OVERLAP_SHARE: f64 = 0.35;

pub const CLUSTER_SEED_SALT: u64 = 0x434c_5553_5445_5253;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoronoiParams {
    /// Radius in pixels within which cluster centers are placed.
    pub radius: f64,
    pub cluster_count: u32,
    /// Characteristic falloff distance of one cluster, in pixels.
    pub cluster_size: f64,
    /// Values above 1 pull clusters toward the galaxy center.
    pub concentration: f64,
}

impl Default for VoronoiParams {
    fn default() -> Self {
        Self { radius: 400.0, cluster_count: 6, cluster_size: 60.0, concentration: 1.5 }
    }
}

impl VoronoiParams {
    pub fn validate(&self) -> Result<()> {
        require_positive("voronoi.radius", self.radius)?;
        require_count("voronoi.cluster_count", self.cluster_count, 1, 12)?;
        require_positive("voronoi.cluster_size", self.cluster_size)?;
        require_positive("voronoi.concentration", self.concentration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cluster {
    /// Offset from the galaxy center.
    pub dx: f64,
    pub dy: f64,
    pub size: f64,
    pub brightness: f64,
}

/// Seed-derived cluster centers, fixed for the lifetime of a structure.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterLayout {
    clusters: Vec<Cluster>,
}

impl ClusterLayout {
    pub fn generate(p: &VoronoiParams, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed ^ CLUSTER_SEED_SALT);
        let clusters = (0..p.cluster_count)
            .map(|_| {
                let angle = rng.gen_range(0.0..TAU);
                let distance = p.radius * rng.gen::<f64>().powf(p.concentration);
                Cluster {
                    dx: distance * angle.cos(),
                    dy: distance * angle.sin(),
                    size: p.cluster_size * rng.gen_range(0.6..1.4),
                    brightness: rng.gen_range(0.7..1.0),
                }
            })
            .collect();
        Self { clusters }
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }
}

pub fn intensity(p: &VoronoiParams, layout: &ClusterLayout, px: f64, py: f64, center: Point, noise: f64) -> f64 {
    let mut nearest_distance = f64::INFINITY;
    let mut nearest_glow = 0.0;
    let mut total_glow = 0.0;
    for cluster in &layout.clusters {
        let distance = (px - center.x - cluster.dx).hypot(py - center.y - cluster.dy);
        let glow = cluster.brightness * (-distance / cluster.size).exp();
        total_glow += glow;
        if distance < nearest_distance {
            nearest_distance = distance;
            nearest_glow = glow;
        }
    }
    let mut structure = nearest_glow + OVERLAP_SHARE * (total_glow - nearest_glow);
    let overshoot = center.distance(px, py) - p.radius;
    if overshoot > 0.0 {
        structure *= (-overshoot / p.cluster_size).exp();
    }
    (structure.clamp(0.0, 1.0) * blend_noise(noise, NOISE_BASE, NOISE_RANGE)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_depends_on_seed_only() {
        let p = VoronoiParams::default();
        assert_eq!(ClusterLayout::generate(&p, 5), ClusterLayout::generate(&p, 5));
        assert_ne!(ClusterLayout::generate(&p, 5), ClusterLayout::generate(&p, 6));
        assert_eq!(ClusterLayout::generate(&p, 5).clusters().len(), 6);
    }

    #[test]
    fn clusters_stay_inside_radius() {
        let p = VoronoiParams { cluster_count: 12, ..VoronoiParams::default() };
        for c in ClusterLayout::generate(&p, 77).clusters() {
            assert!(c.dx.hypot(c.dy) <= p.radius + 1e-9);
        }
    }

    #[test]
    fn brightest_at_a_cluster_center() {
        let p = VoronoiParams { cluster_count: 1, ..VoronoiParams::default() };
        let layout = ClusterLayout::generate(&p, 3);
        let c = layout.clusters()[0];
        let center = Point::new(500.0, 500.0);
        let on = intensity(&p, &layout, 500.0 + c.dx, 500.0 + c.dy, center, 0.5);
        let off = intensity(&p, &layout, 500.0 + c.dx + 3.0 * c.size, 500.0 + c.dy, center, 0.5);
        assert!(on > off);
    }
}
