use std::f32::consts::{FRAC_PI_3, PI, TAU};

use crate::scene::Transform;

/// Whether the subject animation runs.
///
/// `enabled` is the user's choice from the panel; `playing` is cleared while
/// a drag holds the subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationFlags {
    pub enabled: bool,
    pub playing: bool,
}

impl Default for AnimationFlags {
    fn default() -> Self {
        Self {
            enabled: false,
            playing: true,
        }
    }
}

impl AnimationFlags {
    pub fn is_active(&self) -> bool {
        self.enabled && self.playing
    }
}

/// Vertical bounce: `offset + amplitude * |sin(t * frequency * π)|`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BounceParams {
    pub frequency: f32,
    pub amplitude: f32,
    pub offset: f32,
}

impl Default for BounceParams {
    fn default() -> Self {
        Self {
            frequency: 1.0,
            amplitude: 0.5,
            offset: 0.5,
        }
    }
}

impl BounceParams {
    pub fn height(&self, elapsed: f32) -> f32 {
        self.offset + self.amplitude * (elapsed * self.frequency * PI).sin().abs()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Animator {
    elapsed: f32,
    pub rotation_speed: f32,
    pub bounce: BounceParams,
}

impl Default for Animator {
    fn default() -> Self {
        Self {
            elapsed: 0.0,
            rotation_speed: FRAC_PI_3,
            bounce: BounceParams::default(),
        }
    }
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Advances by `delta` seconds. Non-positive deltas leave `transform`
    /// untouched. Spin angles stay within `0..TAU`.
    pub fn advance(&mut self, transform: &mut Transform, delta: f32) {
        if delta.is_nan() || delta <= 0.0 {
            return;
        }
        self.elapsed += delta;
        let step = self.rotation_speed * delta;
        transform.rotation.x = (transform.rotation.x + step).rem_euclid(TAU);
        transform.rotation.y = (transform.rotation.y + step).rem_euclid(TAU);
        transform.position.y = self.bounce.height(self.elapsed);
    }
}
