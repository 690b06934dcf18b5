//! Keyframe tracks.
//!
//! A track is an ordered, timestamp-keyed sequence of samples. Node
//! transforms hold one track per component; a static transform is simply a
//! track with a single key.

use glam::{Quat, Vec3};

/// Interpolation between neighboring keys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Interp {
    Step,
    #[default]
    Linear,
}

impl Interp {
    /// Canonical name used in scene files.
    pub fn name(self) -> &'static str {
        match self {
            Interp::Step => "step",
            Interp::Linear => "linear",
        }
    }

    /// Look up an interpolation mode by its file name.
    pub fn from_name(name: &str) -> Option<Interp> {
        match name {
            "step" => Some(Interp::Step),
            "linear" => Some(Interp::Linear),
            _ => None,
        }
    }
}

/// Blending between two samples of the same type.
pub trait Interpolate: Copy {
    fn interpolate(a: Self, b: Self, t: f32) -> Self;
}

impl Interpolate for Vec3 {
    fn interpolate(a: Self, b: Self, t: f32) -> Self {
        a.lerp(b, t)
    }
}

impl Interpolate for Quat {
    fn interpolate(a: Self, b: Self, t: f32) -> Self {
        a.slerp(b, t)
    }
}

/// A single timestamped sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackKey<T> {
    /// Sample time in milliseconds.
    pub time: i64,
    pub value: T,
}

/// An ordered, timestamp-keyed sequence of samples.
#[derive(Clone, Debug, PartialEq)]
pub struct Track<T> {
    keys: Vec<TrackKey<T>>,
    pub interp: Interp,
}

impl<T> Default for Track<T> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            interp: Interp::default(),
        }
    }
}

impl<T: Interpolate> Track<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sample at `time` (milliseconds).
    ///
    /// Overwrites an existing key at exactly that timestamp, otherwise
    /// inserts keeping the track sorted by time.
    pub fn set_key(&mut self, value: T, time: i64) {
        match self.keys.binary_search_by_key(&time, |k| k.time) {
            Ok(i) => self.keys[i].value = value,
            Err(i) => self.keys.insert(i, TrackKey { time, value }),
        }
    }

    /// Sample the track at `time`, clamping outside the key range.
    ///
    /// Returns `None` for an empty track; the owner supplies its own
    /// default in that case.
    pub fn value_at(&self, time: i64) -> Option<T> {
        if self.keys.is_empty() {
            return None;
        }
        let i = match self.keys.binary_search_by_key(&time, |k| k.time) {
            Ok(i) => return Some(self.keys[i].value),
            Err(i) => i,
        };
        if i == 0 {
            return Some(self.keys[0].value);
        }
        if i == self.keys.len() {
            return Some(self.keys[i - 1].value);
        }

        let a = &self.keys[i - 1];
        let b = &self.keys[i];
        match self.interp {
            Interp::Step => Some(a.value),
            Interp::Linear => {
                let t = (time - a.time) as f32 / (b.time - a.time) as f32;
                Some(T::interpolate(a.value, b.value, t))
            }
        }
    }

    pub fn keys(&self) -> &[TrackKey<T>] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_stay_sorted() {
        let mut track = Track::new();
        track.set_key(Vec3::new(2.0, 0.0, 0.0), 200);
        track.set_key(Vec3::new(0.0, 0.0, 0.0), 0);
        track.set_key(Vec3::new(1.0, 0.0, 0.0), 100);

        let times: Vec<_> = track.keys().iter().map(|k| k.time).collect();
        assert_eq!(times, vec![0, 100, 200]);
    }

    #[test]
    fn test_set_key_overwrites_same_timestamp() {
        let mut track = Track::new();
        track.set_key(Vec3::ZERO, 50);
        track.set_key(Vec3::ONE, 50);

        assert_eq!(track.len(), 1);
        assert_eq!(track.value_at(50), Some(Vec3::ONE));
    }

    #[test]
    fn test_linear_sampling() {
        let mut track = Track::new();
        track.set_key(Vec3::ZERO, 0);
        track.set_key(Vec3::new(10.0, 0.0, 0.0), 100);

        assert_eq!(track.value_at(50), Some(Vec3::new(5.0, 0.0, 0.0)));
    }

    #[test]
    fn test_step_sampling() {
        let mut track = Track::new();
        track.interp = Interp::Step;
        track.set_key(Vec3::ZERO, 0);
        track.set_key(Vec3::new(10.0, 0.0, 0.0), 100);

        assert_eq!(track.value_at(99), Some(Vec3::ZERO));
        assert_eq!(track.value_at(100), Some(Vec3::new(10.0, 0.0, 0.0)));
    }

    #[test]
    fn test_clamped_outside_range() {
        let mut track = Track::new();
        track.set_key(Vec3::ONE, 100);
        track.set_key(Vec3::ZERO, 200);

        assert_eq!(track.value_at(-50), Some(Vec3::ONE));
        assert_eq!(track.value_at(500), Some(Vec3::ZERO));
    }

    #[test]
    fn test_empty_track() {
        let track: Track<Vec3> = Track::new();
        assert_eq!(track.value_at(0), None);
    }

    #[test]
    fn test_quat_sampling_normalized() {
        let mut track = Track::new();
        track.set_key(Quat::IDENTITY, 0);
        track.set_key(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2), 100);

        let q = track.value_at(50).unwrap();
        assert!((q.length() - 1.0).abs() < 1e-5);
    }
}
