//! Random draws and surface sampling used to propose candidate positions.
//!
//! All randomness in the crate flows through a caller-provided [`RngCore`], so a
//! seeded generator reproduces a placement pass exactly.
use std::f32::consts::TAU;

use glam::Vec2;
use rand::RngCore;

pub mod surface;

pub use surface::{MeshData, Surface, TriangleSampling};

/// Generate a random float in the range [0, 1).
///
/// Uses the top 24 bits of a `u32` draw so the result is exactly representable and
/// never rounds up to 1.0.
#[inline]
pub fn rand01(rng: &mut dyn RngCore) -> f32 {
    const SCALE: f32 = 1.0 / (1u32 << 24) as f32;
    (rng.next_u32() >> 8) as f32 * SCALE
}

/// Generate a random float in the range [min, max).
#[inline]
pub fn rand_range(rng: &mut dyn RngCore, min: f32, max: f32) -> f32 {
    min + rand01(rng) * (max - min)
}

/// Pick an index uniformly in `[0, len)`. `len` must be non-zero.
#[inline]
pub(crate) fn rand_index(rng: &mut dyn RngCore, len: usize) -> usize {
    debug_assert!(len > 0, "rand_index requires a non-empty range");
    ((u64::from(rng.next_u32()) * len as u64) >> 32) as usize
}

/// Uniform point inside the unit disc.
///
/// Radius is drawn with a square root so area density is constant.
#[inline]
pub fn point_in_unit_disc(rng: &mut dyn RngCore) -> Vec2 {
    let r = rand01(rng).sqrt();
    let theta = TAU * rand01(rng);
    Vec2::new(r * theta.cos(), r * theta.sin())
}

#[cfg(test)]
pub(crate) mod test_rng {
    use rand::RngCore;

    /// Returns the same `u32` for every draw.
    pub struct FixedRng {
        pub value: u32,
    }

    impl RngCore for FixedRng {
        fn next_u32(&mut self) -> u32 {
            self.value
        }

        fn next_u64(&mut self) -> u64 {
            self.value as u64
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            let bytes = self.value.to_le_bytes();
            for (i, b) in dest.iter_mut().enumerate() {
                *b = bytes[i % 4];
            }
        }
    }

    /// Replays a list of unit floats as `u32` draws, cycling when exhausted.
    pub struct SequenceRng {
        values: Vec<u32>,
        cursor: usize,
        pub draws: usize,
    }

    impl SequenceRng {
        pub fn from_unit(values: &[f32]) -> Self {
            let values = values
                .iter()
                .map(|v| ((v.clamp(0.0, 0.999_999) * (1u32 << 24) as f32) as u32) << 8)
                .collect();
            Self {
                values,
                cursor: 0,
                draws: 0,
            }
        }
    }

    impl RngCore for SequenceRng {
        fn next_u32(&mut self) -> u32 {
            let value = self.values[self.cursor % self.values.len()];
            self.cursor += 1;
            self.draws += 1;
            value
        }

        fn next_u64(&mut self) -> u64 {
            self.next_u32() as u64
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for chunk in dest.chunks_mut(4) {
                let bytes = self.next_u32().to_le_bytes();
                chunk.copy_from_slice(&bytes[..chunk.len()]);
            }
        }
    }
}
