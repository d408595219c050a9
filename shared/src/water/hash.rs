//! 128-bit content fingerprints for authored modifier data.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::Hasher;

use bevy::math::{Vec2, Vec3};

const SECOND_LANE_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ContentHash(pub u128);

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// Two independently salted SipHash lanes combined into one 128-bit value.
pub struct ContentHasher {
    low: DefaultHasher,
    high: DefaultHasher,
}

impl Default for ContentHasher {
    fn default() -> Self {
        let mut high = DefaultHasher::new();
        high.write_u64(SECOND_LANE_SALT);
        Self {
            low: DefaultHasher::new(),
            high,
        }
    }
}

impl ContentHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_f32(&mut self, value: f32) {
        // -0.0 and 0.0 describe the same authored value
        let bits = if value == 0.0 { 0 } else { value.to_bits() };
        self.write_u32(bits);
    }

    pub fn write_vec2(&mut self, value: Vec2) {
        self.write_f32(value.x);
        self.write_f32(value.y);
    }

    pub fn write_vec3(&mut self, value: Vec3) {
        self.write_f32(value.x);
        self.write_f32(value.y);
        self.write_f32(value.z);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(value as u8);
    }

    pub fn finish_content(&self) -> ContentHash {
        ContentHash(((self.high.finish() as u128) << 64) | self.low.finish() as u128)
    }
}

impl Hasher for ContentHasher {
    fn write(&mut self, bytes: &[u8]) {
        self.low.write(bytes);
        self.high.write(bytes);
    }

    fn finish(&self) -> u64 {
        self.low.finish()
    }
}

/// Authored data whose derived job data is cached by content.
pub trait ModifierData {
    fn hash_content(&self, hasher: &mut ContentHasher);

    fn content_hash(&self) -> ContentHash {
        let mut hasher = ContentHasher::new();
        self.hash_content(&mut hasher);
        hasher.finish_content()
    }
}
