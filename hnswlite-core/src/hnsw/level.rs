//! Level generator: assigns each newly inserted node a maximum layer,
//! drawn from an exponential decay distribution so that exponentially fewer
//! nodes reach higher layers.
//!
//! Resolves what was previously a dangling `mod layer;` declaration with no
//! backing file: the level-selection logic lived inline in the builder as
//! `-ln(uniform) * ml`, which is mathematically equivalent to walking the
//! precomputed table below but doesn't give a reproducible, seedable source.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Precomputes `p(l) = e^(-l/mu) * (1 - e^(-1/mu))` for `l = 0, 1, ...` until
/// the tail becomes negligible, then samples from it.
pub struct LevelGenerator {
    /// `p(l)` for `l` in `0..table.len()`.
    table: Vec<f64>,
    rng: StdRng,
}

const TABLE_CUTOFF: f64 = 1e-9;

impl LevelGenerator {
    /// Builds a level generator for the given max-connections parameter `m`,
    /// seeded either from `seed` or from system entropy if `seed` is `None`.
    ///
    /// # Panics
    ///
    /// Panics if `m <= 1` (`mu = 1 / ln(m)` would be non-finite or negative).
    #[must_use]
    pub fn new(m: u16, seed: Option<u64>) -> Self {
        assert!(m > 1, "level generator requires m > 1, got {m}");
        let mu = 1.0 / f64::from(m).ln();

        let mut table = Vec::new();
        let mut level = 0_u32;
        loop {
            let p = (-f64::from(level) / mu).exp() * (1.0 - (-1.0 / mu).exp());
            if p < TABLE_CUTOFF && level > 0 {
                break;
            }
            table.push(p);
            level += 1;
            // Safety valve: mu grows slowly with m, so this is unreachable in
            // practice, but an infinite loop is worse than a generous cap.
            if level > 1000 {
                break;
            }
        }

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self { table, rng }
    }

    /// Draws a level by walking the precomputed table with one uniform
    /// sample, per the standard HNSW construction.
    pub fn sample_level(&mut self) -> usize {
        let mut u: f64 = self.rng.random();
        for (level, &p) in self.table.iter().enumerate() {
            if u < p {
                return level;
            }
            u -= p;
        }
        self.table.len() - 1
    }
}
