use crate::error::{LottieError, Result};
use crate::version::{DocumentVersion, KeyframeLayout};
use glam::{Vec2, Vec4};
use lottie_data::model::{BezierPath, Keyframe, Property, Value};
use serde::de::DeserializeOwned;
use std::fmt;

pub trait Interpolatable: Sized + Clone {
    fn lerp(&self, other: &Self, t: f32) -> Self;

    fn lerp_spatial(&self, other: &Self, t: f32, _tangents: &SpatialTangents) -> Self {
        self.lerp(other, t)
    }
}

impl Interpolatable for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Interpolatable for Vec2 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Vec2::lerp(*self, *other, t)
    }

    fn lerp_spatial(&self, other: &Self, t: f32, tangents: &SpatialTangents) -> Self {
        let p0 = *self;
        let p3 = *other;
        let p1 = p0 + tangents.out;
        let p2 = p3 + tangents.in_;

        let one_minus_t = 1.0 - t;
        let one_minus_t_sq = one_minus_t * one_minus_t;
        let one_minus_t_cub = one_minus_t_sq * one_minus_t;

        let t_sq = t * t;
        let t_cub = t_sq * t;

        p0 * one_minus_t_cub
            + p1 * 3.0 * one_minus_t_sq * t
            + p2 * 3.0 * one_minus_t * t_sq
            + p3 * t_cub
    }
}

// Colours interpolate per channel in the stored representation.
impl Interpolatable for Vec4 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Vec4::lerp(*self, *other, t)
    }
}

impl Interpolatable for BezierPath {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        if t <= 0.0 {
            return self.clone();
        }
        if t >= 1.0 {
            return other.clone();
        }

        // Paths with different vertex counts morph over the shared prefix.
        let count = self.v.len().min(other.v.len());
        if count == 0 {
            return self.clone();
        }

        let mix = |a: [f32; 2], b: [f32; 2]| [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t];

        let mut v = Vec::with_capacity(count);
        let mut i = Vec::with_capacity(count);
        let mut o = Vec::with_capacity(count);
        for idx in 0..count {
            v.push(mix(self.v[idx], other.v[idx]));
            i.push(mix(
                self.i.get(idx).copied().unwrap_or_default(),
                other.i.get(idx).copied().unwrap_or_default(),
            ));
            o.push(mix(
                self.o.get(idx).copied().unwrap_or_default(),
                other.o.get(idx).copied().unwrap_or_default(),
            ));
        }

        BezierPath { c: self.c, i, o, v }
    }
}

/// Value types an [`AnimatedProperty`] can hold, with their on-disk form.
pub trait Animatable: Interpolatable + fmt::Debug {
    type Raw: DeserializeOwned;

    fn from_raw(raw: &Self::Raw) -> Self;

    /// Value used when the fragment is missing or unreadable.
    fn fallback() -> Self;
}

impl Animatable for f32 {
    type Raw = f32;

    fn from_raw(raw: &f32) -> Self {
        *raw
    }

    fn fallback() -> Self {
        0.0
    }
}

impl Animatable for Vec2 {
    type Raw = Vec<f32>;

    fn from_raw(raw: &Vec<f32>) -> Self {
        let at = |idx: usize| raw.get(idx).copied().unwrap_or(0.0);
        Vec2::new(at(0), at(1))
    }

    fn fallback() -> Self {
        Vec2::ZERO
    }
}

impl Animatable for Vec4 {
    type Raw = Vec<f32>;

    /// RGB-only colours get an opaque alpha channel.
    fn from_raw(raw: &Vec<f32>) -> Self {
        let at = |idx: usize| raw.get(idx).copied().unwrap_or(0.0);
        let alpha = if raw.len() == 3 { 1.0 } else { at(3) };
        Vec4::new(at(0), at(1), at(2), alpha)
    }

    fn fallback() -> Self {
        Vec4::ZERO
    }
}

impl Animatable for BezierPath {
    type Raw = BezierPath;

    fn from_raw(raw: &BezierPath) -> Self {
        raw.clone()
    }

    fn fallback() -> Self {
        BezierPath::default()
    }
}

// Cubic Bezier Easing
pub fn solve_cubic_bezier(p1: Vec2, p2: Vec2, x: f32) -> f32 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    // Newton-Raphson
    let mut t = x;
    for _ in 0..8 {
        let one_minus_t = 1.0 - t;
        let x_est = 3.0 * one_minus_t * one_minus_t * t * p1.x
            + 3.0 * one_minus_t * t * t * p2.x
            + t * t * t;

        let err = x_est - x;
        if err.abs() < 1e-4 {
            break;
        }

        let dx_dt = 3.0 * one_minus_t * one_minus_t * p1.x
            + 6.0 * one_minus_t * t * (p2.x - p1.x)
            + 3.0 * t * t * (1.0 - p2.x);

        if dx_dt.abs() < 1e-6 {
            break;
        }
        t -= err / dx_dt;
    }

    let one_minus_t = 1.0 - t;
    3.0 * one_minus_t * one_minus_t * t * p1.y + 3.0 * one_minus_t * t * t * p2.y + t * t * t
}

/// Shape of the segment leaving a keyframe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    Linear,
    /// Value stays at the keyframe until the next one.
    Hold,
    /// Cubic timing curve through `(0,0)`, `out`, `in_`, `(1,1)`.
    Bezier { out: Vec2, in_: Vec2 },
}

impl Easing {
    pub fn progress(&self, linear: f32) -> f32 {
        match self {
            Easing::Linear => linear,
            Easing::Hold => 0.0,
            Easing::Bezier { out, in_ } => solve_cubic_bezier(*out, *in_, linear),
        }
    }
}

/// Spatial tangents for motion paths, relative to the segment endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpatialTangents {
    pub out: Vec2,
    pub in_: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeSample<T> {
    pub frame: f32,
    pub value: T,
    pub easing: Easing,
    pub spatial: Option<SpatialTangents>,
    /// Explicit segment target. When `None` the segment ends at the next
    /// sample's `value`.
    pub end: Option<T>,
}

impl<T> KeyframeSample<T> {
    pub fn linear(frame: f32, value: T) -> Self {
        Self {
            frame,
            value,
            easing: Easing::Linear,
            spatial: None,
            end: None,
        }
    }

    pub fn with_end(mut self, end: T) -> Self {
        self.end = Some(end);
        self
    }

    pub fn hold(frame: f32, value: T) -> Self {
        Self {
            easing: Easing::Hold,
            ..Self::linear(frame, value)
        }
    }
}

/// Ordered keyframe samples with clamped evaluation outside their range.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeCurve<T> {
    samples: Vec<KeyframeSample<T>>,
}

impl<T> Default for KeyframeCurve<T> {
    fn default() -> Self {
        Self {
            samples: Vec::new(),
        }
    }
}

impl<T: Interpolatable> KeyframeCurve<T> {
    /// Validates ordering. Samples sharing a frame keep the first one.
    pub fn new(samples: Vec<KeyframeSample<T>>) -> Result<Self> {
        if samples.is_empty() {
            return Err(LottieError::malformed_curve("no keyframes"));
        }

        let mut kept: Vec<KeyframeSample<T>> = Vec::with_capacity(samples.len());
        for sample in samples {
            if sample.frame.is_nan() {
                return Err(LottieError::malformed_curve("keyframe at NaN frame"));
            }
            if let Some(prev) = kept.last() {
                if sample.frame < prev.frame {
                    return Err(LottieError::malformed_curve(format!(
                        "keyframe at frame {} follows frame {}",
                        sample.frame, prev.frame
                    )));
                }
                if sample.frame == prev.frame {
                    tracing::debug!(frame = sample.frame, "dropping duplicate keyframe");
                    continue;
                }
            }
            kept.push(sample);
        }

        Ok(Self { samples: kept })
    }

    pub fn evaluate(&self, frame: f32) -> Result<T> {
        let (first, last) = match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(LottieError::malformed_curve("no keyframes")),
        };

        if frame.is_nan() || frame <= first.frame {
            return Ok(first.value.clone());
        }
        if frame >= last.frame {
            return Ok(last.value.clone());
        }

        // first.frame < frame < last.frame, so 1 <= idx < len.
        let idx = self.samples.partition_point(|s| s.frame <= frame);
        let from = &self.samples[idx - 1];
        let to = &self.samples[idx];

        if from.easing == Easing::Hold {
            return Ok(from.value.clone());
        }

        let linear = (frame - from.frame) / (to.frame - from.frame);
        let t = from.easing.progress(linear);

        let target = from.end.as_ref().unwrap_or(&to.value);
        Ok(match &from.spatial {
            Some(tangents) => from.value.lerp_spatial(target, t, tangents),
            None => from.value.lerp(target, t),
        })
    }

    pub fn samples(&self) -> &[KeyframeSample<T>] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first_frame(&self) -> Option<f32> {
        self.samples.first().map(|s| s.frame)
    }

    pub fn last_frame(&self) -> Option<f32> {
        self.samples.last().map(|s| s.frame)
    }
}

impl<T: Animatable> KeyframeCurve<T> {
    /// Normalizes a document keyframe list into samples.
    pub fn from_keyframes(keyframes: &[Keyframe<T::Raw>], layout: KeyframeLayout) -> Result<Self> {
        let mut samples = Vec::with_capacity(keyframes.len());
        let mut previous_end: Option<&T::Raw> = None;

        for kf in keyframes {
            // A keyframe without `s` (the trailing legacy keyframe) starts
            // where the previous segment ended.
            let raw = kf.s.as_ref().or(previous_end);
            previous_end = kf.e.as_ref();
            let end = match layout {
                KeyframeLayout::StartEnd => kf.e.as_ref().map(T::from_raw),
                KeyframeLayout::StartOnly => None,
            };

            let Some(raw) = raw else {
                tracing::debug!(frame = kf.t, "keyframe without a value, skipped");
                continue;
            };

            let easing = if kf.is_hold() {
                Easing::Hold
            } else if kf.o.is_some() || kf.i.is_some() {
                let point = |tangent: Option<&lottie_data::BezierTangent>, default: f32| {
                    tangent
                        .and_then(|t| t.first())
                        .map(|(x, y)| Vec2::new(x, y))
                        .unwrap_or(Vec2::splat(default))
                };
                Easing::Bezier {
                    out: point(kf.o.as_ref(), 0.0),
                    in_: point(kf.i.as_ref(), 1.0),
                }
            } else {
                Easing::Linear
            };

            let spatial = if kf.to.is_some() || kf.ti.is_some() {
                let tangent = |raw: Option<&Vec<f32>>| {
                    raw.map(|v| Vec2::new(v.first().copied().unwrap_or(0.0), v.get(1).copied().unwrap_or(0.0)))
                        .unwrap_or(Vec2::ZERO)
                };
                Some(SpatialTangents {
                    out: tangent(kf.to.as_ref()),
                    in_: tangent(kf.ti.as_ref()),
                })
            } else {
                None
            };

            samples.push(KeyframeSample {
                frame: kf.t,
                value: T::from_raw(raw),
                easing,
                spatial,
                end,
            });
        }

        Self::new(samples)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertySource<T> {
    Static(T),
    Animated(KeyframeCurve<T>),
}

/// A static or keyframed attribute with the value of the last update cached.
///
/// Cloning copies the curve and the cache, so clones update independently.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatedProperty<T> {
    source: PropertySource<T>,
    current: Option<T>,
}

impl<T: Animatable> AnimatedProperty<T> {
    pub fn from_static(value: T) -> Self {
        Self {
            source: PropertySource::Static(value),
            current: None,
        }
    }

    pub fn from_curve(curve: KeyframeCurve<T>) -> Self {
        Self {
            source: PropertySource::Animated(curve),
            current: None,
        }
    }

    /// Builds the property from a `{"a", "k"}` fragment.
    ///
    /// Missing or mistyped fragments become a static fallback value. Only a
    /// keyframe list that cannot form a valid curve is an error.
    pub fn construct(fragment: &serde_json::Value, version: &DocumentVersion) -> Result<Self> {
        if fragment.is_null() {
            return Ok(Self::from_static(T::fallback()));
        }
        if !fragment.is_object() {
            let err = LottieError::schema_mismatch("property", "object");
            tracing::debug!("{err}, using fallback value");
            return Ok(Self::from_static(T::fallback()));
        }

        let prop: Property<T::Raw> = match serde_json::from_value(fragment.clone()) {
            Ok(prop) => prop,
            Err(e) => {
                tracing::debug!("unreadable property fragment ({e}), using fallback value");
                return Ok(Self::from_static(T::fallback()));
            }
        };

        Self::from_property(&prop, version)
    }

    pub fn from_property(prop: &Property<T::Raw>, version: &DocumentVersion) -> Result<Self> {
        match &prop.k {
            Value::Default => Ok(Self::from_static(T::fallback())),
            Value::Static(raw) => Ok(Self::from_static(T::from_raw(raw))),
            Value::Animated(keyframes) if keyframes.is_empty() && !prop.is_marked_animated() => {
                Ok(Self::from_static(T::fallback()))
            }
            Value::Animated(keyframes) => {
                let curve: KeyframeCurve<T> =
                    KeyframeCurve::from_keyframes(keyframes, version.keyframe_layout())?;
                if curve.len() == 1 {
                    let only = curve.samples[0].value.clone();
                    return Ok(Self::from_static(only));
                }
                Ok(Self::from_curve(curve))
            }
        }
    }

    pub fn is_animated(&self) -> bool {
        matches!(self.source, PropertySource::Animated(_))
    }

    pub fn source(&self) -> &PropertySource<T> {
        &self.source
    }

    /// Recomputes the cached value. Calling it again with the same frame
    /// leaves the cache as it was.
    pub fn update(&mut self, frame: f32) -> Result<()> {
        match &self.source {
            PropertySource::Static(value) => {
                if self.current.is_none() {
                    self.current = Some(value.clone());
                }
            }
            PropertySource::Animated(curve) => {
                self.current = Some(curve.evaluate(frame)?);
            }
        }
        Ok(())
    }

    pub fn value(&self) -> Result<T> {
        self.current.clone().ok_or(LottieError::NotInitialized)
    }

    pub fn value_ref(&self) -> Result<&T> {
        self.current.as_ref().ok_or(LottieError::NotInitialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MODERN: DocumentVersion = DocumentVersion::new(5, 7, 0);
    const LEGACY: DocumentVersion = DocumentVersion::new(4, 8, 0);

    fn linear_curve() -> KeyframeCurve<f32> {
        KeyframeCurve::new(vec![
            KeyframeSample::linear(0.0, 0.0),
            KeyframeSample::linear(10.0, 10.0),
            KeyframeSample::linear(20.0, 30.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_curve_binary_search() {
        let curve = linear_curve();

        assert_eq!(curve.evaluate(0.0).unwrap(), 0.0);
        assert_eq!(curve.evaluate(10.0).unwrap(), 10.0);
        assert_eq!(curve.evaluate(20.0).unwrap(), 30.0);
        assert_eq!(curve.evaluate(-5.0).unwrap(), 0.0);
        assert_eq!(curve.evaluate(25.0).unwrap(), 30.0);
        assert_eq!(curve.evaluate(5.0).unwrap(), 5.0);
        assert_eq!(curve.evaluate(15.0).unwrap(), 20.0);
    }

    #[test]
    fn test_hold_keyframe_steps() {
        let curve = KeyframeCurve::new(vec![
            KeyframeSample::hold(0.0, 1.0),
            KeyframeSample::linear(10.0, 5.0),
        ])
        .unwrap();

        assert_eq!(curve.evaluate(0.0).unwrap(), 1.0);
        assert_eq!(curve.evaluate(9.99).unwrap(), 1.0);
        assert_eq!(curve.evaluate(10.0).unwrap(), 5.0);
    }

    #[test]
    fn test_bezier_easing_keeps_endpoints() {
        let easing = Easing::Bezier {
            out: Vec2::new(0.42, 0.0),
            in_: Vec2::new(0.58, 1.0),
        };
        assert_eq!(easing.progress(0.0), 0.0);
        assert_eq!(easing.progress(1.0), 1.0);
        let mid = easing.progress(0.5);
        assert!((mid - 0.5).abs() < 0.01, "symmetric ease mid-point was {mid}");
        assert!(easing.progress(0.2) < 0.2);
    }

    #[test]
    fn test_malformed_curves_rejected() {
        assert!(matches!(
            KeyframeCurve::<f32>::new(vec![]),
            Err(LottieError::MalformedCurve(_))
        ));
        assert!(matches!(
            KeyframeCurve::new(vec![
                KeyframeSample::linear(10.0, 1.0),
                KeyframeSample::linear(5.0, 2.0),
            ]),
            Err(LottieError::MalformedCurve(_))
        ));
        assert!(matches!(
            KeyframeCurve::<f32>::default().evaluate(3.0),
            Err(LottieError::MalformedCurve(_))
        ));
    }

    #[test]
    fn test_duplicate_frames_first_wins() {
        let curve = KeyframeCurve::new(vec![
            KeyframeSample::linear(0.0, 1.0),
            KeyframeSample::linear(0.0, 99.0),
            KeyframeSample::linear(10.0, 2.0),
        ])
        .unwrap();
        assert_eq!(curve.len(), 2);
        assert_eq!(curve.evaluate(0.0).unwrap(), 1.0);
    }

    #[test]
    fn test_vec4_interpolates_per_channel() {
        let curve = KeyframeCurve::new(vec![
            KeyframeSample::linear(0.0, Vec4::new(0.0, 0.0, 1.0, 1.0)),
            KeyframeSample::linear(100.0, Vec4::new(1.0, 1.0, 1.0, 1.0)),
        ])
        .unwrap();
        let mid = curve.evaluate(50.0).unwrap();
        assert!((mid - Vec4::new(0.5, 0.5, 1.0, 1.0)).length() < 1e-6);
    }

    #[test]
    fn test_spatial_tangents_bend_the_path() {
        let mut from = KeyframeSample::linear(0.0, Vec2::ZERO);
        from.spatial = Some(SpatialTangents {
            out: Vec2::new(0.0, 40.0),
            in_: Vec2::new(0.0, 40.0),
        });
        let curve = KeyframeCurve::new(vec![from, KeyframeSample::linear(10.0, Vec2::new(100.0, 0.0))]).unwrap();

        let mid = curve.evaluate(5.0).unwrap();
        assert!((mid.x - 50.0).abs() < 1e-3);
        assert!(mid.y > 20.0, "expected curved motion, got {mid:?}");
    }

    #[test]
    fn test_legacy_and_modern_layouts_normalize_identically() {
        let legacy = json!({
            "a": 1,
            "k": [
                { "t": 0, "s": [5], "e": [1], "i": { "x": [0.833], "y": [0.833] }, "o": { "x": [0.167], "y": [0.167] } },
                { "t": 179 }
            ]
        });
        let modern = json!({
            "a": 1,
            "k": [
                { "t": 0, "s": [5], "i": { "x": [0.833], "y": [0.833] }, "o": { "x": [0.167], "y": [0.167] } },
                { "t": 179, "s": [1] }
            ]
        });

        let mut a = AnimatedProperty::<f32>::construct(&legacy, &LEGACY).unwrap();
        let mut b = AnimatedProperty::<f32>::construct(&modern, &MODERN).unwrap();
        for frame in [0.0, 30.0, 90.0, 150.0, 179.0] {
            a.update(frame).unwrap();
            b.update(frame).unwrap();
            assert_eq!(a.value().unwrap(), b.value().unwrap(), "frame {frame}");
        }
    }

    #[test]
    fn test_explicit_segment_end_overrides_next_value() {
        let curve = KeyframeCurve::new(vec![
            KeyframeSample::linear(0.0, 0.0).with_end(10.0),
            KeyframeSample::linear(10.0, 100.0),
        ])
        .unwrap();
        assert_eq!(curve.evaluate(5.0).unwrap(), 5.0);
        assert_eq!(curve.evaluate(10.0).unwrap(), 100.0);
    }

    #[test]
    fn test_legacy_segments_start_at_their_own_value() {
        let legacy = json!({
            "a": 1,
            "k": [
                { "t": 0, "s": [0], "e": [10] },
                { "t": 10, "s": [100], "e": [200] },
                { "t": 20 }
            ]
        });
        let mut prop = AnimatedProperty::<f32>::construct(&legacy, &LEGACY).unwrap();

        prop.update(5.0).unwrap();
        assert_eq!(prop.value().unwrap(), 5.0);
        prop.update(10.0).unwrap();
        assert_eq!(prop.value().unwrap(), 100.0);
        prop.update(15.0).unwrap();
        assert_eq!(prop.value().unwrap(), 150.0);
        prop.update(20.0).unwrap();
        assert_eq!(prop.value().unwrap(), 200.0);
    }

    #[test]
    fn test_static_property_is_frame_invariant() {
        let mut prop = AnimatedProperty::<f32>::construct(&json!({ "a": 0, "k": 2 }), &MODERN).unwrap();
        assert!(!prop.is_animated());
        assert_eq!(prop.value(), Err(LottieError::NotInitialized));

        prop.update(0.0).unwrap();
        let at_zero = prop.value().unwrap();
        prop.update(179.0).unwrap();
        assert_eq!(prop.value().unwrap().to_bits(), at_zero.to_bits());
    }

    #[test]
    fn test_update_is_idempotent() {
        let mut prop = AnimatedProperty::from_curve(linear_curve());
        prop.update(7.5).unwrap();
        let first = prop.value().unwrap();
        prop.update(7.5).unwrap();
        assert_eq!(prop.value().unwrap(), first);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut original = AnimatedProperty::from_curve(linear_curve());
        let mut copy = original.clone();

        original.update(0.0).unwrap();
        copy.update(20.0).unwrap();

        assert_eq!(original.value().unwrap(), 0.0);
        assert_eq!(copy.value().unwrap(), 30.0);
    }

    #[test]
    fn test_bad_fragments_fall_back() {
        let missing = AnimatedProperty::<f32>::construct(&serde_json::Value::Null, &MODERN).unwrap();
        assert_eq!(missing.source(), &PropertySource::Static(0.0));

        let wrong_type = AnimatedProperty::<Vec4>::construct(&json!("red"), &MODERN).unwrap();
        assert_eq!(wrong_type.source(), &PropertySource::Static(Vec4::ZERO));

        let empty_static = AnimatedProperty::<f32>::construct(&json!({ "a": 0, "k": [] }), &MODERN).unwrap();
        assert!(!empty_static.is_animated());
    }

    #[test]
    fn test_rgb_color_gets_opaque_alpha() {
        let mut prop = AnimatedProperty::<Vec4>::construct(&json!({ "k": [1, 0, 0] }), &MODERN).unwrap();
        prop.update(0.0).unwrap();
        assert_eq!(prop.value().unwrap(), Vec4::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_non_monotonic_keyframes_fail_construction() {
        let fragment = json!({
            "a": 1,
            "k": [ { "t": 10, "s": [1] }, { "t": 0, "s": [2] } ]
        });
        assert!(matches!(
            AnimatedProperty::<f32>::construct(&fragment, &MODERN),
            Err(LottieError::MalformedCurve(_))
        ));
    }
}
