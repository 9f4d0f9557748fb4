use rand::Rng;

/// Inclusive range a worker draws its batch sizes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchRange {
    min: u32,
    max: u32,
}

pub const VENDOR_BATCH: BatchRange = BatchRange::new(1, 20);
pub const CUSTOMER_BATCH: BatchRange = BatchRange::new(1, 5);

impl BatchRange {
    /// # Panics
    /// Panics if `min` is 0 or `min > max`.
    pub const fn new(min: u32, max: u32) -> Self {
        assert!(min > 0, "batch size must be positive");
        assert!(min <= max, "empty batch range");
        Self { min, max }
    }

    /// Always the same size.
    pub const fn fixed(size: u32) -> Self {
        Self::new(size, size)
    }

    #[inline]
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        rng.gen_range(self.min..=self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn samples_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..1_000 {
            let n = VENDOR_BATCH.sample(&mut rng);
            assert!((1..=20).contains(&n));
            let n = CUSTOMER_BATCH.sample(&mut rng);
            assert!((1..=5).contains(&n));
        }
    }

    #[test]
    fn fixed_range_is_constant() {
        let mut rng = StdRng::seed_from_u64(0);
        let range = BatchRange::fixed(5);
        assert!((0..50).all(|_| range.sample(&mut rng) == 5));
    }

    #[test]
    #[should_panic(expected = "empty batch range")]
    fn inverted_range_is_rejected() {
        let _ = BatchRange::new(4, 2);
    }
}
