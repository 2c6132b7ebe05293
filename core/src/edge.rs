use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::geom::{CubicSegment, Point};

pub const NECK_RATIO_DEFAULT: f64 = 0.22;
pub const HEAD_RATIO_DEFAULT: f64 = 0.35;
pub const HEIGHT_RATIO_DEFAULT: f64 = 0.28;
pub const JITTER_RATIO_DEFAULT: f64 = 0.04;
pub const SKEW_LIMIT_DEFAULT: f64 = 2.0;

const SALT_NECK: u32 = 0;
const SALT_HEAD: u32 = 1;
const SALT_HEIGHT: u32 = 2;
const SALT_SHOULDER: u32 = 3;
const SALT_SKEW: u32 = 4;

const NECK_Y_RATIO: f64 = 0.35;
const NECK_PINCH_RATIO: f64 = 0.25;
const NECK_BASE_RATIO: f64 = 0.1;
const HEAD_FLARE_RATIO: f64 = 1.25;
const HEAD_CROWN_RATIO: f64 = 0.6;
const HEAD_FLARE_Y_RATIO: f64 = 0.6;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeSettings {
    pub neck_ratio: f64,
    pub head_ratio: f64,
    pub height_ratio: f64,
    pub jitter_ratio: f64,
    pub skew_limit: f64,
}

impl Default for ShapeSettings {
    fn default() -> Self {
        Self {
            neck_ratio: NECK_RATIO_DEFAULT,
            head_ratio: HEAD_RATIO_DEFAULT,
            height_ratio: HEIGHT_RATIO_DEFAULT,
            jitter_ratio: JITTER_RATIO_DEFAULT,
            skew_limit: SKEW_LIMIT_DEFAULT,
        }
    }
}

/// Trigonometric hash of `(seed, salt)` into `[0, 1)`.
pub fn rand_unit(seed: u32, salt: u32) -> f64 {
    let raw = (seed as f64 * 12.9898 + salt as f64 * 78.233).sin() * 43_758.545_3;
    let fract = raw - raw.floor();
    if fract >= 1.0 {
        0.0
    } else {
        fract
    }
}

pub fn rand_signed(seed: u32, salt: u32) -> f64 {
    rand_unit(seed, salt) * 2.0 - 1.0
}

/// One protrusion profile from `(0, 0)` to `(length, 0)` bulging toward `+y`.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeProfile {
    seed: u32,
    length: f64,
    segments: [CubicSegment; 4],
}

impl EdgeProfile {
    pub fn generate(
        seed: u32,
        length: f64,
        settings: &ShapeSettings,
    ) -> Result<Self, GeometryError> {
        if seed == 0 {
            return Err(GeometryError::ReservedSeed);
        }
        if !length.is_finite() || length <= 0.0 {
            return Err(GeometryError::InvalidLength(length));
        }

        let jitter = settings.jitter_ratio * length;
        let neck = (settings.neck_ratio * length + jitter * rand_signed(seed, SALT_NECK)).max(0.0);
        let head = (settings.head_ratio * length + jitter * rand_signed(seed, SALT_HEAD)).max(neck);
        let height = settings.height_ratio * length + jitter * rand_signed(seed, SALT_HEIGHT);
        let shoulder = jitter * rand_signed(seed, SALT_SHOULDER);
        let skew = settings.skew_limit * rand_signed(seed, SALT_SKEW);

        let mid = length * 0.5;
        let head_mid = mid + skew;
        let half_head = head * 0.5;
        let neck_left = mid - neck * 0.5;
        let neck_right = mid + neck * 0.5;
        let neck_y = height * NECK_Y_RATIO;

        let p0 = Point::ORIGIN;
        let left_neck = Point::new(neck_left, neck_y);
        let crown = Point::new(head_mid, height);
        let right_neck = Point::new(neck_right, neck_y);
        let p_end = Point::new(length, 0.0);

        let segments = [
            CubicSegment::new(
                p0,
                Point::new(neck_left * 0.5, shoulder),
                Point::new(
                    neck_left + neck * NECK_PINCH_RATIO,
                    height * NECK_BASE_RATIO,
                ),
                left_neck,
            ),
            CubicSegment::new(
                left_neck,
                Point::new(
                    head_mid - half_head * HEAD_FLARE_RATIO,
                    height * HEAD_FLARE_Y_RATIO,
                ),
                Point::new(head_mid - half_head * HEAD_CROWN_RATIO, height),
                crown,
            ),
            CubicSegment::new(
                crown,
                Point::new(head_mid + half_head * HEAD_CROWN_RATIO, height),
                Point::new(
                    head_mid + half_head * HEAD_FLARE_RATIO,
                    height * HEAD_FLARE_Y_RATIO,
                ),
                right_neck,
            ),
            CubicSegment::new(
                right_neck,
                Point::new(
                    neck_right - neck * NECK_PINCH_RATIO,
                    height * NECK_BASE_RATIO,
                ),
                Point::new(neck_right + (length - neck_right) * 0.5, -shoulder),
                p_end,
            ),
        ];

        Ok(Self {
            seed,
            length,
            segments,
        })
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn segments(&self) -> &[CubicSegment; 4] {
        &self.segments
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct ProfileKey {
    seed: u32,
    length_bits: u64,
}

/// Memoizes profiles by `(seed, length)`. Entries are shared and never mutated.
#[derive(Debug, Default)]
pub struct ProfileCache {
    settings: ShapeSettings,
    entries: HashMap<ProfileKey, Rc<EdgeProfile>>,
}

impl ProfileCache {
    pub fn new(settings: ShapeSettings) -> Self {
        Self {
            settings,
            entries: HashMap::new(),
        }
    }

    pub fn settings(&self) -> &ShapeSettings {
        &self.settings
    }

    pub fn profile(&mut self, seed: u32, length: f64) -> Result<Rc<EdgeProfile>, GeometryError> {
        let key = ProfileKey {
            seed,
            length_bits: length.to_bits(),
        };
        if let Some(entry) = self.entries.get(&key) {
            return Ok(Rc::clone(entry));
        }
        let profile = Rc::new(EdgeProfile::generate(seed, length, &self.settings)?);
        tracing::trace!(seed, length, "edge profile generated");
        self.entries.insert(key, Rc::clone(&profile));
        Ok(profile)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(profile: &EdgeProfile) -> Vec<u64> {
        profile
            .segments()
            .iter()
            .flat_map(|seg| seg.points())
            .flat_map(|p| [p.x.to_bits(), p.y.to_bits()])
            .collect()
    }

    #[test]
    fn generation_is_bit_identical() {
        let settings = ShapeSettings::default();
        for seed in [1u32, 7, 4242, 1 << 23] {
            let a = EdgeProfile::generate(seed, 100.0, &settings).expect("profile");
            let b = EdgeProfile::generate(seed, 100.0, &settings).expect("profile");
            assert_eq!(bits(&a), bits(&b));
        }
    }

    #[test]
    fn rand_unit_stays_in_range() {
        for seed in 1..500u32 {
            for salt in 0..5 {
                let value = rand_unit(seed, salt);
                assert!((0.0..1.0).contains(&value), "seed {seed} salt {salt}: {value}");
            }
        }
    }

    #[test]
    fn profile_spans_length_and_bulges_up() {
        let profile = EdgeProfile::generate(17, 100.0, &ShapeSettings::default()).expect("profile");
        let segments = profile.segments();
        assert_eq!(segments[0].start, Point::ORIGIN);
        assert_eq!(segments[3].end, Point::new(100.0, 0.0));
        for pair in segments.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        let crown = segments[1].end;
        assert!(crown.y >= 24.0 - 1e-9 && crown.y <= 32.0 + 1e-9, "crown {crown:?}");
        assert!((crown.x - 50.0).abs() <= SKEW_LIMIT_DEFAULT + 1e-9);
    }

    #[test]
    fn seeds_produce_distinct_profiles() {
        let settings = ShapeSettings::default();
        let a = EdgeProfile::generate(3, 100.0, &settings).expect("profile");
        let b = EdgeProfile::generate(4, 100.0, &settings).expect("profile");
        assert_ne!(bits(&a), bits(&b));
    }

    #[test]
    fn reserved_seed_and_bad_length_rejected() {
        let settings = ShapeSettings::default();
        assert_eq!(
            EdgeProfile::generate(0, 100.0, &settings),
            Err(GeometryError::ReservedSeed)
        );
        assert!(matches!(
            EdgeProfile::generate(5, 0.0, &settings),
            Err(GeometryError::InvalidLength(_))
        ));
        assert!(matches!(
            EdgeProfile::generate(5, f64::NAN, &settings),
            Err(GeometryError::InvalidLength(_))
        ));
    }

    #[test]
    fn cache_returns_shared_entry_per_key() {
        let mut cache = ProfileCache::new(ShapeSettings::default());
        let a = cache.profile(9, 100.0).expect("profile");
        let b = cache.profile(9, 100.0).expect("profile");
        assert!(Rc::ptr_eq(&a, &b));
        let c = cache.profile(9, 80.0).expect("profile");
        assert!(!Rc::ptr_eq(&a, &c));
        assert_eq!(cache.len(), 2);
        assert!(cache.profile(0, 100.0).is_err());
        assert_eq!(cache.len(), 2);
    }
}
