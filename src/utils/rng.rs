use crate::math::Vector3;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Hands out independent, reproducible RNG streams derived from one seed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngManager {
    master_seed: u64,
}

impl RngManager {
    pub fn new(seed: u64) -> Self {
        Self { master_seed: seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    // Get a new RNG for a stream by hashing its name with master seed
    pub fn get_rng(&self, name: &str) -> ChaCha8Rng {
        let mut hasher = DefaultHasher::new();
        self.master_seed.hash(&mut hasher);
        name.hash(&mut hasher);
        ChaCha8Rng::seed_from_u64(hasher.finish())
    }
}

/// Uniform point inside the box spanned by `min` and `max`.
pub fn random_point<R: Rng>(rng: &mut R, min: Vector3, max: Vector3) -> Vector3 {
    Vector3::new(
        rng.gen_range(min.x..=max.x),
        rng.gen_range(min.y..=max.y),
        rng.gen_range(min.z..=max.z),
    )
}
