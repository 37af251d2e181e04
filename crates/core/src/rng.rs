use rand::{rngs::StdRng, seq::SliceRandom, Rng, RngCore, SeedableRng};

#[derive(Debug, Clone)]
pub struct RngState {
    seed: u64,
    rng: StdRng,
}

impl RngState {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self::from_seed(rand::thread_rng().gen())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    /// One face of an n-sided die, uniform over [1, sides].
    pub fn die(&mut self, sides: u32) -> u32 {
        if sides == 0 {
            return 0;
        }
        1 + (self.rng.next_u64() % sides as u64) as u32
    }

    /// Uniform probability sample in [0, 1) with millesimal resolution.
    pub fn chance(&mut self) -> f64 {
        (self.rng.next_u64() % 1000) as f64 / 1000.0
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }
}
