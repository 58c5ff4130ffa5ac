//! Per-view design blob parsing.
//!
//! The storefront serializes each customized item as a JSON object keyed by
//! view name, each view optionally carrying `textData`, `logoData`/`logoUrl`
//! and `shapeData` layers. This module normalizes that blob into flat
//! [`PlacedFeature`] records ready for `order_item_design_features` rows.
//!
//! A blob that is not an object, a missing view, or a structurally broken
//! layer yields no features. A shape layer with an unrecognized `type` is the
//! one hard failure: it is rejected instead of silently dropped.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DesignError {
    #[error("Unknown shape type: {0}")]
    UnknownShape(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Front,
    Back,
    Left,
    Right,
}

impl View {
    pub const ALL: [View; 4] = [View::Front, View::Back, View::Left, View::Right];

    pub fn as_str(self) -> &'static str {
        match self {
            View::Front => "front",
            View::Back => "back",
            View::Left => "left",
            View::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Circle,
    Square,
    Rectangle,
    Triangle,
    Star,
    Heart,
}

impl ShapeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ShapeKind::Circle => "circle",
            ShapeKind::Square => "square",
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Triangle => "triangle",
            ShapeKind::Star => "star",
            ShapeKind::Heart => "heart",
        }
    }

    fn parse(raw: &str) -> Result<Self, DesignError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "circle" => Ok(ShapeKind::Circle),
            "square" => Ok(ShapeKind::Square),
            "rectangle" => Ok(ShapeKind::Rectangle),
            "triangle" => Ok(ShapeKind::Triangle),
            "star" => Ok(ShapeKind::Star),
            "heart" => Ok(ShapeKind::Heart),
            other => Err(DesignError::UnknownShape(other.to_string())),
        }
    }
}

/// Pixel placement shared by every feature kind.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Geometry {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub aspect_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DesignFeature {
    Text {
        content_html: String,
        content_plain: String,
        font_family: Option<String>,
        color: Option<String>,
        font_size: Option<i32>,
        geometry: Geometry,
    },
    Logo {
        url: String,
        geometry: Geometry,
    },
    Shape {
        shape_type: ShapeKind,
        is_filled: bool,
        color: Option<String>,
        geometry: Geometry,
    },
}

impl DesignFeature {
    pub fn kind(&self) -> &'static str {
        match self {
            DesignFeature::Text { .. } => "text",
            DesignFeature::Logo { .. } => "logo",
            DesignFeature::Shape { .. } => "shape",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedFeature {
    pub view: View,
    pub position: i32,
    pub feature: DesignFeature,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViewDesign {
    #[serde(default)]
    text_data: Option<TextLayer>,
    #[serde(default)]
    logo_data: Option<LogoLayer>,
    #[serde(default)]
    logo_url: Option<String>,
    #[serde(default)]
    shape_data: Option<ShapeLayer>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextLayer {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default, deserialize_with = "loose_f64")]
    font_size: Option<f64>,
    #[serde(default, deserialize_with = "loose_f64")]
    x: Option<f64>,
    #[serde(default, deserialize_with = "loose_f64")]
    y: Option<f64>,
    #[serde(default, deserialize_with = "loose_f64")]
    width: Option<f64>,
    #[serde(default, deserialize_with = "loose_f64")]
    height: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogoLayer {
    #[serde(default, deserialize_with = "loose_f64")]
    x: Option<f64>,
    #[serde(default, deserialize_with = "loose_f64")]
    y: Option<f64>,
    #[serde(default, deserialize_with = "loose_f64")]
    width: Option<f64>,
    #[serde(default, deserialize_with = "loose_f64")]
    height: Option<f64>,
    #[serde(default, deserialize_with = "loose_f64")]
    aspect_ratio: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShapeLayer {
    #[serde(default, rename = "type")]
    shape_type: Option<String>,
    #[serde(default, deserialize_with = "loose_bool")]
    is_filled: Option<bool>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default, deserialize_with = "loose_f64")]
    x: Option<f64>,
    #[serde(default, deserialize_with = "loose_f64")]
    y: Option<f64>,
    #[serde(default, deserialize_with = "loose_f64")]
    width: Option<f64>,
    #[serde(default, deserialize_with = "loose_f64")]
    height: Option<f64>,
    #[serde(default, deserialize_with = "loose_f64")]
    aspect_ratio: Option<f64>,
}

/// Flatten a designs blob into feature records, at most one per (view, kind).
pub fn parse_design_features(designs: &Value) -> Result<Vec<PlacedFeature>, DesignError> {
    let Some(_) = designs.as_object() else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();

    for view in View::ALL {
        let Some(raw) = designs.get(view.as_str()) else {
            continue;
        };
        // A broken view payload means no features for that view.
        let Ok(dv) = serde_json::from_value::<ViewDesign>(raw.clone()) else {
            continue;
        };

        if let Some(td) = &dv.text_data
            && let Some(feature) = text_feature(td)
        {
            out.push(PlacedFeature {
                view,
                position: 1,
                feature,
            });
        }

        if let Some(url) = norm(dv.logo_url.as_deref()) {
            let ld = dv.logo_data.unwrap_or_default();
            out.push(PlacedFeature {
                view,
                position: 1,
                feature: DesignFeature::Logo {
                    url,
                    geometry: Geometry {
                        x: as_int(ld.x),
                        y: as_int(ld.y),
                        width: as_int(ld.width),
                        height: as_int(ld.height),
                        aspect_ratio: aspect(ld.aspect_ratio, ld.width, ld.height),
                    },
                },
            });
        }

        if let Some(sd) = &dv.shape_data
            && let Some(raw_type) = norm(sd.shape_type.as_deref())
        {
            let shape_type = ShapeKind::parse(&raw_type)?;
            out.push(PlacedFeature {
                view,
                position: 1,
                feature: DesignFeature::Shape {
                    shape_type,
                    is_filled: sd.is_filled.unwrap_or(false),
                    color: norm(sd.color.as_deref()),
                    geometry: Geometry {
                        x: as_int(sd.x),
                        y: as_int(sd.y),
                        width: as_int(sd.width),
                        height: as_int(sd.height),
                        aspect_ratio: aspect(sd.aspect_ratio, sd.width, sd.height),
                    },
                },
            });
        }
    }

    Ok(out)
}

fn text_feature(td: &TextLayer) -> Option<DesignFeature> {
    let content_html = norm(td.text.as_deref())?;
    let content_plain = strip_tags(&content_html);
    if content_plain.is_empty() {
        return None;
    }

    let color = extract_attr(&content_html, &COLOR_ATTR).or_else(|| norm(td.color.as_deref()));

    Some(DesignFeature::Text {
        font_family: extract_attr(&content_html, &FACE_ATTR),
        color,
        font_size: as_int(td.font_size),
        geometry: Geometry {
            x: as_int(td.x),
            y: as_int(td.y),
            width: as_int(td.width),
            height: as_int(td.height),
            aspect_ratio: None,
        },
        content_html,
        content_plain,
    })
}

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static FACE_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)face\s*=\s*"([^"]+)""#).unwrap());
static COLOR_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)color\s*=\s*"([^"]+)""#).unwrap());

fn strip_tags(html: &str) -> String {
    TAG.replace_all(html, "").trim().to_string()
}

fn extract_attr(html: &str, re: &Regex) -> Option<String> {
    re.captures(html).map(|c| c[1].to_string())
}

/// Trim and treat empty / "null" / "undefined" strings as absent.
fn norm(s: Option<&str>) -> Option<String> {
    let t = s?.trim();
    if t.is_empty() || t.eq_ignore_ascii_case("null") || t.eq_ignore_ascii_case("undefined") {
        return None;
    }
    Some(t.to_string())
}

fn as_int(v: Option<f64>) -> Option<i32> {
    let v = v?;
    if v.is_finite() { Some(v.round() as i32) } else { None }
}

fn aspect(explicit: Option<f64>, width: Option<f64>, height: Option<f64>) -> Option<f64> {
    let ratio = explicit.or_else(|| match (width, height) {
        (Some(w), Some(h)) if h != 0.0 => Some(w / h),
        _ => None,
    })?;
    if !ratio.is_finite() {
        return None;
    }
    Some((ratio * 1e6).round() / 1e6)
}

/// Accept JSON numbers or numeric strings; anything else is treated as absent.
fn loose_f64<'de, D: Deserializer<'de>>(de: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(de)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// Accept booleans, numbers (JS truthiness) or "true"/"false" strings.
fn loose_bool<'de, D: Deserializer<'de>>(de: D) -> Result<Option<bool>, D::Error> {
    let value = Option::<Value>::deserialize(de)?;
    Ok(match value {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::Number(n)) => n.as_f64().map(|v| v != 0.0),
        Some(Value::String(s)) => match s.trim() {
            "true" | "1" => Some(true),
            "false" | "0" | "" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_object_blob_yields_no_features() {
        assert!(parse_design_features(&json!(null)).unwrap().is_empty());
        assert!(parse_design_features(&json!("garbage")).unwrap().is_empty());
        assert!(parse_design_features(&json!([1, 2, 3])).unwrap().is_empty());
    }

    #[test]
    fn view_without_layer_data_yields_no_rows() {
        let designs = json!({ "front": {}, "back": { "somethingElse": 1 } });
        assert!(parse_design_features(&designs).unwrap().is_empty());
    }

    #[test]
    fn text_layer_with_markup_extracts_font_and_color() {
        let designs = json!({
            "front": {
                "textData": {
                    "text": "<font face=\"Arial\" color=\"#ff0000\">Hello</font>",
                    "fontSize": 24.4,
                    "x": 10.6, "y": 20.2, "width": 100.0, "height": 50.0
                }
            }
        });
        let features = parse_design_features(&designs).unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].view, View::Front);
        match &features[0].feature {
            DesignFeature::Text {
                content_plain,
                font_family,
                color,
                font_size,
                geometry,
                ..
            } => {
                assert_eq!(content_plain, "Hello");
                assert_eq!(font_family.as_deref(), Some("Arial"));
                assert_eq!(color.as_deref(), Some("#ff0000"));
                assert_eq!(*font_size, Some(24));
                assert_eq!(geometry.x, Some(11));
                assert_eq!(geometry.y, Some(20));
            }
            other => panic!("expected text feature, got {other:?}"),
        }
    }

    #[test]
    fn markup_only_text_emits_nothing() {
        let designs = json!({
            "front": { "textData": { "text": "<font face=\"Arial\"> </font>" } },
            "back": { "textData": { "text": "null" } },
            "left": { "textData": { "text": "   " } }
        });
        assert!(parse_design_features(&designs).unwrap().is_empty());
    }

    #[test]
    fn logo_requires_a_real_url() {
        let designs = json!({
            "front": { "logoUrl": "  ", "logoData": { "width": 80, "height": 40 } },
            "back": { "logoUrl": "undefined" },
            "left": {
                "logoUrl": "https://cdn.example.com/logo.png",
                "logoData": { "x": 5, "y": 6, "width": 80, "height": 40 }
            }
        });
        let features = parse_design_features(&designs).unwrap();
        assert_eq!(features.len(), 1);
        match &features[0].feature {
            DesignFeature::Logo { url, geometry } => {
                assert_eq!(url, "https://cdn.example.com/logo.png");
                assert_eq!(geometry.aspect_ratio, Some(2.0));
            }
            other => panic!("expected logo feature, got {other:?}"),
        }
    }

    #[test]
    fn explicit_aspect_ratio_wins_and_is_rounded() {
        let designs = json!({
            "front": {
                "logoUrl": "https://cdn.example.com/logo.png",
                "logoData": { "width": 3, "height": 7, "aspectRatio": 0.123456789 }
            }
        });
        let features = parse_design_features(&designs).unwrap();
        match &features[0].feature {
            DesignFeature::Logo { geometry, .. } => {
                assert_eq!(geometry.aspect_ratio, Some(0.123457));
            }
            other => panic!("expected logo feature, got {other:?}"),
        }
    }

    #[test]
    fn shape_with_known_type_is_emitted() {
        let designs = json!({
            "right": {
                "shapeData": {
                    "type": "circle",
                    "isFilled": 1,
                    "color": "#0000ff",
                    "x": 1, "y": 2, "width": 30, "height": 30
                }
            }
        });
        let features = parse_design_features(&designs).unwrap();
        assert_eq!(features.len(), 1);
        match &features[0].feature {
            DesignFeature::Shape {
                shape_type,
                is_filled,
                color,
                geometry,
            } => {
                assert_eq!(*shape_type, ShapeKind::Circle);
                assert!(*is_filled);
                assert_eq!(color.as_deref(), Some("#0000ff"));
                assert_eq!(geometry.aspect_ratio, Some(1.0));
            }
            other => panic!("expected shape feature, got {other:?}"),
        }
    }

    #[test]
    fn unknown_shape_type_is_rejected() {
        let designs = json!({
            "front": { "shapeData": { "type": "dodecahedron" } }
        });
        let err = parse_design_features(&designs).unwrap_err();
        assert!(matches!(err, DesignError::UnknownShape(s) if s == "dodecahedron"));
    }

    #[test]
    fn at_most_one_row_per_kind_per_view() {
        let designs = json!({
            "front": {
                "textData": { "text": "Front text" },
                "logoUrl": "https://cdn.example.com/a.png",
                "shapeData": { "type": "star" }
            },
            "back": { "textData": { "text": "Back text" } }
        });
        let features = parse_design_features(&designs).unwrap();
        assert_eq!(features.len(), 4);
        let front: Vec<_> = features.iter().filter(|f| f.view == View::Front).collect();
        assert_eq!(front.len(), 3);
        let kinds: Vec<_> = front.iter().map(|f| f.feature.kind()).collect();
        assert_eq!(kinds, ["text", "logo", "shape"]);
    }

    #[test]
    fn numeric_strings_are_coerced() {
        let designs = json!({
            "front": {
                "textData": { "text": "Hi", "x": "12.7", "fontSize": "18" }
            }
        });
        let features = parse_design_features(&designs).unwrap();
        match &features[0].feature {
            DesignFeature::Text {
                geometry,
                font_size,
                ..
            } => {
                assert_eq!(geometry.x, Some(13));
                assert_eq!(*font_size, Some(18));
            }
            other => panic!("expected text feature, got {other:?}"),
        }
    }

    #[test]
    fn broken_view_payload_is_skipped_not_fatal() {
        let designs = json!({
            "front": "not an object",
            "back": { "textData": { "text": "Still works" } }
        });
        let features = parse_design_features(&designs).unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].view, View::Back);
    }
}
