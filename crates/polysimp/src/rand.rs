//! Random jagged rings (radial jitter + replay tokens).
//!
//! Purpose
//! - Provide a small, deterministic sampler of star-shaped closed rings with
//!   many vertices, used by the simplifier/codec benches and property tests.
//!
//! Model
//! - Start from `n` equally spaced angles on [0, 2π), add angular jitter below
//!   half the spacing (so angles stay in order without sorting) and radial
//!   jitter, translate to `center`, then close the ring.
//! - Determinism uses a replay token `(seed, index)` mixed into a single RNG.
//!
//! Code cross-refs: `geom::Ring`, `simplify::simplify`

use nalgebra::Vector2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geom::{Point, Ring};

/// Vertex count distribution.
#[derive(Clone, Copy, Debug)]
pub enum VertexCount {
    Fixed(usize),
    Uniform { min: usize, max: usize },
}
impl VertexCount {
    fn sample<R: Rng>(&self, rng: &mut R) -> usize {
        match *self {
            VertexCount::Fixed(n) => n.max(3),
            VertexCount::Uniform { min, max } => {
                let lo = min.max(3);
                let hi = max.max(lo);
                rng.gen_range(lo..=hi)
            }
        }
    }
}

/// Radial-jitter sampler configuration.
#[derive(Clone, Copy, Debug)]
pub struct RadialCfg {
    pub vertex_count: VertexCount,
    /// Angular jitter as a fraction of the base spacing Δ=2π/n. Clamped to [0, 0.49].
    pub angle_jitter_frac: f64,
    /// Radial jitter (relative amplitude). Radii = `base_radius * (1 + u)`, with `u∈[-radial_jitter, radial_jitter]`.
    pub radial_jitter: f64,
    pub base_radius: f64,
    /// Translation applied after sampling (e.g. a lon/lat anchor).
    pub center: Point,
    /// Random global phase in [0, 2π)?
    pub random_phase: bool,
}
impl Default for RadialCfg {
    fn default() -> Self {
        Self {
            vertex_count: VertexCount::Fixed(400),
            angle_jitter_frac: 0.3,
            radial_jitter: 0.05,
            base_radius: 1.0,
            center: Vector2::zeros(),
            random_phase: true,
        }
    }
}

/// Replay token to make draws reproducible and indexable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayToken {
    pub seed: u64,
    pub index: u64,
}
impl ReplayToken {
    #[inline]
    fn to_std_rng(self) -> StdRng {
        // SplitMix64-style mixing.
        fn mix(mut x: u64) -> u64 {
            x ^= x >> 30;
            x = x.wrapping_mul(0xbf58476d1ce4e5b9);
            x ^= x >> 27;
            x = x.wrapping_mul(0x94d049bb133111eb);
            x ^ (x >> 31)
        }
        let k = mix(self.seed ^ mix(self.index.wrapping_add(0x9e3779b97f4a7c15)));
        StdRng::seed_from_u64(k)
    }
}

/// Draw a closed star-shaped ring.
///
/// Angles stay strictly increasing (jitter < Δ/2), so the ring never self-intersects
/// and always has at least 3 distinct vertices.
pub fn draw_ring_radial(cfg: RadialCfg, tok: ReplayToken) -> Ring {
    let mut rng = tok.to_std_rng();
    let n = cfg.vertex_count.sample(&mut rng);
    let aj = cfg.angle_jitter_frac.clamp(0.0, 0.49);
    let rj = cfg.radial_jitter.clamp(0.0, 0.9);
    let r0 = cfg.base_radius.max(1e-9);
    let delta = 2.0 * std::f64::consts::PI / (n as f64);
    let phase = if cfg.random_phase {
        rng.gen::<f64>() * 2.0 * std::f64::consts::PI
    } else {
        0.0
    };
    let mut pts: Vec<Point> = (0..n)
        .map(|k| {
            let base = phase + (k as f64) * delta;
            let th = base + (rng.gen::<f64>() * 2.0 - 1.0) * aj * delta;
            let u = (rng.gen::<f64>() * 2.0 - 1.0) * rj;
            let r = (1.0 + u) * r0;
            cfg.center + Vector2::new(th.cos() * r, th.sin() * r)
        })
        .collect();
    pts.push(pts[0]);
    Ring::from_vec_unchecked(pts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angles_stay_ordered_at_max_jitter() {
        let cfg = RadialCfg {
            vertex_count: VertexCount::Fixed(64),
            angle_jitter_frac: 1.0,
            random_phase: false,
            ..RadialCfg::default()
        };
        let ring = draw_ring_radial(cfg, ReplayToken { seed: 3, index: 0 });
        let pts = ring.points();
        let angles: Vec<f64> = pts[..pts.len() - 1]
            .iter()
            .map(|p| p.y.atan2(p.x).rem_euclid(2.0 * std::f64::consts::PI))
            .collect();
        // First vertex may jitter below 0 and wrap; compare the rest.
        assert!(angles[1..].windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn reproducible_draw() {
        let cfg = RadialCfg {
            vertex_count: VertexCount::Uniform { min: 10, max: 40 },
            ..RadialCfg::default()
        };
        let tok = ReplayToken { seed: 42, index: 7 };
        let a = draw_ring_radial(cfg, tok);
        let b = draw_ring_radial(cfg, tok);
        assert_eq!(a, b);
        let c = draw_ring_radial(cfg, ReplayToken { seed: 42, index: 8 });
        assert_ne!(a, c);
    }

    #[test]
    fn closed_and_centered() {
        let center = Vector2::new(-40.4, -3.6);
        let cfg = RadialCfg {
            vertex_count: VertexCount::Fixed(64),
            base_radius: 0.01,
            center,
            ..RadialCfg::default()
        };
        let ring = draw_ring_radial(cfg, ReplayToken { seed: 1, index: 0 });
        assert_eq!(ring.len(), 65);
        assert!(ring.is_closed());
        assert!(ring.bbox().contains(center));
        assert!(ring
            .points()
            .iter()
            .all(|p| (p - center).norm() <= 0.01 * 1.05 + 1e-12));
    }
}
