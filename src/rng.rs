use std::ops::RangeInclusive;

/// Seeded mulberry32 generator. Every random decision in world generation and
/// encounter resolution goes through one of these so a seed replays exactly.
#[derive(Clone, Debug)]
pub struct Rng {
    seed: u32,
}

impl Rng {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    /// Child generator for an independent stream, e.g. one per town.
    pub fn fork(&mut self, salt: u32) -> Self {
        let base = self.next_u32();
        Self::new(base ^ salt.wrapping_mul(0x9e37_79b9))
    }

    pub fn next_u32(&mut self) -> u32 {
        self.seed = self.seed.wrapping_add(0x6d2b79f5);
        let mut t = self.seed;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() as f64 / 4_294_967_296.0) as f32
    }

    /// Uniform integer in `[min, max]`.
    pub fn int(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = (max as i64 - min as i64 + 1) as u64;
        min + (self.next_u32() as u64 % span) as i32
    }

    pub fn in_range(&mut self, range: &RangeInclusive<i32>) -> i32 {
        self.int(*range.start(), *range.end())
    }

    /// Uniform integer in `[0, bound)`; zero when `bound <= 0`.
    pub fn below(&mut self, bound: i32) -> i32 {
        if bound <= 0 {
            return 0;
        }
        self.int(0, bound - 1)
    }

    pub fn bool(&mut self, probability: f32) -> bool {
        self.next_f32() < probability
    }

    pub fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        (self.next_u32() as u64 % len as u64) as usize
    }

    pub fn pick<'a, T>(&mut self, values: &'a [T]) -> Option<&'a T> {
        if values.is_empty() {
            return None;
        }
        values.get(self.pick_index(values.len()))
    }
}
