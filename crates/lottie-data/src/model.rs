use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};

/// An animatable property fragment as stored in the document:
/// `{"a": 0|1, "k": <value or keyframes>, "x": <expression>}`. Other keys
/// such as `ix` are ignored.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct Property<T> {
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub a: u8,
    #[serde(default)]
    pub k: Value<T>,
    #[serde(default, deserialize_with = "deserialize_expression")]
    pub x: Option<String>,
}

impl<T> Property<T> {
    /// True when the document marks the property as keyframed.
    pub fn is_marked_animated(&self) -> bool {
        self.a != 0
    }
}

impl<T> Default for Property<T> {
    fn default() -> Self {
        Property {
            a: 0,
            k: Value::Default,
            x: None,
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub enum Value<T> {
    Default,
    Static(T),
    Animated(Vec<Keyframe<T>>),
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Value<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = serde_json::Value::deserialize(deserializer)?;

        if v.is_null() {
            return Ok(Value::Default);
        }

        // Keyframe lists are arrays of objects; plain numeric arrays are static vectors.
        if let serde_json::Value::Array(items) = &v {
            if items.first().map_or(false, |item| item.is_object()) {
                if let Ok(keyframes) = serde_json::from_value::<Vec<Keyframe<T>>>(v.clone()) {
                    return Ok(Value::Animated(keyframes));
                }
            }
        }

        if let Ok(val) = serde_json::from_value::<T>(v.clone()) {
            return Ok(Value::Static(val));
        }

        if let Ok(vec) = serde_json::from_value::<Vec<T>>(v) {
            if let Some(first) = vec.into_iter().next() {
                return Ok(Value::Static(first));
            }
        }

        Ok(Value::Default)
    }
}

impl<T> Default for Value<T> {
    fn default() -> Self {
        Value::Default
    }
}

/// One keyframe entry. Documents older than 5.5.0 carry the segment target in
/// `e`; newer ones leave it out and the target is the next keyframe's `s`.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct Keyframe<T> {
    pub t: f32,
    #[serde(default, deserialize_with = "deserialize_keyframe_value")]
    pub s: Option<T>,
    #[serde(default, deserialize_with = "deserialize_keyframe_value")]
    pub e: Option<T>,
    #[serde(default)]
    pub i: Option<BezierTangent>,
    #[serde(default)]
    pub o: Option<BezierTangent>,
    #[serde(default)]
    pub to: Option<Vec<f32>>,
    #[serde(default)]
    pub ti: Option<Vec<f32>>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub h: u8,
}

impl<T> Keyframe<T> {
    pub fn is_hold(&self) -> bool {
        self.h != 0
    }
}

fn deserialize_keyframe_value<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    if v.is_null() {
        return Ok(None);
    }

    if let Ok(val) = serde_json::from_value(v.clone()) {
        return Ok(Some(val));
    }

    if let Ok(vec) = serde_json::from_value::<Vec<T>>(v) {
        if let Some(first) = vec.into_iter().next() {
            return Ok(Some(first));
        }
    }

    Ok(None)
}

// Flags show up as 0/1, true/false, or occasionally as floats.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    Ok(match v {
        serde_json::Value::Bool(b) => b as u8,
        serde_json::Value::Number(n) => n.as_f64().map_or(0, |f| (f != 0.0) as u8),
        _ => 0,
    })
}

fn deserialize_expression<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    Ok(match v {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

fn deserialize_one_or_many<'de, D>(deserializer: D) -> Result<Vec<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    Ok(match v {
        serde_json::Value::Number(n) => n.as_f64().map(|f| vec![f as f32]).unwrap_or_default(),
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_f64())
            .map(|f| f as f32)
            .collect(),
        _ => Vec::new(),
    })
}

pub type Vec2 = [f32; 2];
pub type Vec4 = [f32; 4];

/// Bezier tangent control points for keyframe easing.
/// Matches the JSON format: `{"x": [0.48], "y": [1]}` or `{"x": 0.48, "y": 1}`.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct BezierTangent {
    #[serde(default, deserialize_with = "deserialize_one_or_many")]
    pub x: Vec<f32>,
    #[serde(default, deserialize_with = "deserialize_one_or_many")]
    pub y: Vec<f32>,
}

impl BezierTangent {
    /// First control point component pair, or `None` when either axis is empty.
    pub fn first(&self) -> Option<(f32, f32)> {
        Some((*self.x.first()?, *self.y.first()?))
    }
}

/// Path vertices with in/out tangents relative to each vertex.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct BezierPath {
    #[serde(default)]
    pub c: bool,
    #[serde(default)]
    pub i: Vec<Vec2>,
    #[serde(default)]
    pub o: Vec<Vec2>,
    #[serde(default)]
    pub v: Vec<Vec2>,
}
