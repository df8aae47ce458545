use std::f64::consts::PI;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Private generator for one Monte Carlo trial.
pub fn trial_rng(base_seed: u64, trial_id: u32) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(derive_seed(base_seed, trial_id))
}

// The trial id fills both halves of the word before mixing.
fn derive_seed(base_seed: u64, trial_id: u32) -> u64 {
    mix_seed(base_seed ^ u64::from(trial_id).wrapping_mul(0x1_0000_0001))
}

/// SplitMix64 finalizer; neighbouring seeds land far apart.
fn mix_seed(seed: u64) -> u64 {
    const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut z = seed.wrapping_add(GOLDEN_GAMMA);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Box-Muller normal deviates over any uniform source.
pub trait Gaussian {
    fn standard_normal(&mut self) -> f64;

    fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        mean + std_dev * self.standard_normal()
    }
}

impl<R: Rng + ?Sized> Gaussian for R {
    fn standard_normal(&mut self) -> f64 {
        let u = nonzero_uniform(self);
        let v = nonzero_uniform(self);
        (-2.0 * u.ln()).sqrt() * (2.0 * PI * v).cos()
    }
}

// ln(0) is unbounded, so a zero draw is thrown away.
fn nonzero_uniform<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    loop {
        let u: f64 = rng.random();
        if u != 0.0 {
            return u;
        }
    }
}
