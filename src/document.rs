//! The Lottie animation document.
//!
//! These types mirror the subset of the Lottie (Bodymovin) JSON format a
//! frame-by-frame image animation needs: a composition, one image asset per
//! frame, and one image layer per frame. Field names are the short keys
//! players expect (`fr`, `ip`, `op`, `refId`, ...).

use serde::Serialize;

use crate::configuration::EmbedMode;

/// Format version written to the `v` field.
pub const LOTTIE_VERSION: &str = "5.7.4";

/// Layer type code for image layers.
const IMAGE_LAYER: u8 = 2;

/// A complete frame-by-frame animation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimationDocument {
    #[serde(rename = "v")]
    pub version: String,
    #[serde(rename = "fr")]
    pub frame_rate: f64,
    #[serde(rename = "ip")]
    pub in_point: u64,
    /// Equal to the number of frames: each frame lasts one time unit.
    #[serde(rename = "op")]
    pub out_point: u64,
    #[serde(rename = "w")]
    pub width: u32,
    #[serde(rename = "h")]
    pub height: u32,
    #[serde(rename = "nm")]
    pub name: String,
    #[serde(rename = "ddd")]
    pub three_d: u8,
    pub assets: Vec<Asset>,
    pub layers: Vec<Layer>,
}

impl AnimationDocument {
    pub fn frame_count(&self) -> usize {
        self.layers.len()
    }

    /// Serialize to compact JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// One image, either inlined as a data URI or referenced by file name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Asset {
    pub id: String,
    #[serde(rename = "w")]
    pub width: u32,
    #[serde(rename = "h")]
    pub height: u32,
    /// Directory prefix for external files; always empty.
    #[serde(rename = "u")]
    pub base_path: String,
    /// Data URI when embedded, file name when external.
    #[serde(rename = "p")]
    pub payload: String,
    #[serde(rename = "e", serialize_with = "embed_flag")]
    pub embed_mode: EmbedMode,
}

impl Asset {
    /// Asset identifier for the frame at `output_index`.
    pub fn id_for(output_index: usize) -> String {
        format!("image_{output_index}")
    }
}

fn embed_flag<S: serde::Serializer>(mode: &EmbedMode, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(match mode {
        EmbedMode::External => 0,
        EmbedMode::Embedded => 1,
    })
}

/// An image layer showing one asset for exactly one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    #[serde(rename = "ddd")]
    pub three_d: u8,
    /// 1-based layer index.
    #[serde(rename = "ind")]
    pub index: usize,
    #[serde(rename = "ty")]
    pub layer_type: u8,
    #[serde(rename = "nm")]
    pub name: String,
    #[serde(rename = "refId")]
    pub asset_id: String,
    #[serde(rename = "sr")]
    pub stretch: u8,
    #[serde(rename = "ks")]
    pub transform: Transform,
    #[serde(rename = "ao")]
    pub auto_orient: u8,
    #[serde(rename = "ip")]
    pub in_point: u64,
    #[serde(rename = "op")]
    pub out_point: u64,
    #[serde(rename = "st")]
    pub start_time: u64,
    #[serde(rename = "bm")]
    pub blend_mode: u8,
}

impl Layer {
    /// Layer for the frame at `output_index`, spanning
    /// `[output_index, output_index + 1)`.
    pub fn for_frame(output_index: usize, asset_id: String, transform: Transform) -> Self {
        Self {
            three_d: 0,
            index: output_index + 1,
            layer_type: IMAGE_LAYER,
            name: format!("frame_{output_index}"),
            asset_id,
            stretch: 1,
            transform,
            auto_orient: 0,
            in_point: output_index as u64,
            out_point: output_index as u64 + 1,
            start_time: 0,
            blend_mode: 0,
        }
    }

    /// The layer's `[in, out)` time span in output frames.
    pub fn time_span(&self) -> (u64, u64) {
        (self.in_point, self.out_point)
    }
}

/// A non-animated property value (`{"a": 0, "k": ...}`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaticValue<T> {
    #[serde(rename = "a")]
    pub animated: u8,
    #[serde(rename = "k")]
    pub value: T,
}

impl<T> StaticValue<T> {
    pub fn new(value: T) -> Self {
        Self { animated: 0, value }
    }
}

/// Layer transform: opacity, rotation, position, anchor, scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transform {
    #[serde(rename = "o")]
    pub opacity: StaticValue<f64>,
    #[serde(rename = "r")]
    pub rotation: StaticValue<f64>,
    #[serde(rename = "p")]
    pub position: StaticValue<[f64; 3]>,
    #[serde(rename = "a")]
    pub anchor: StaticValue<[f64; 3]>,
    #[serde(rename = "s")]
    pub scale: StaticValue<[f64; 3]>,
}

impl Transform {
    /// Identity transform for a layer the size of the canvas: centered,
    /// unrotated, fully opaque, at 100% scale.
    pub fn centered(width: u32, height: u32) -> Self {
        let center = [f64::from(width) / 2.0, f64::from(height) / 2.0, 0.0];
        Self {
            opacity: StaticValue::new(100.0),
            rotation: StaticValue::new(0.0),
            position: StaticValue::new(center),
            anchor: StaticValue::new(center),
            scale: StaticValue::new([100.0, 100.0, 100.0]),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn layer_serializes_short_keys() {
        let layer = Layer::for_frame(3, Asset::id_for(3), Transform::centered(200, 100));
        let value = serde_json::to_value(&layer).unwrap();
        assert_eq!(
            value,
            json!({
                "ddd": 0,
                "ind": 4,
                "ty": 2,
                "nm": "frame_3",
                "refId": "image_3",
                "sr": 1,
                "ks": {
                    "o": {"a": 0, "k": 100.0},
                    "r": {"a": 0, "k": 0.0},
                    "p": {"a": 0, "k": [100.0, 50.0, 0.0]},
                    "a": {"a": 0, "k": [100.0, 50.0, 0.0]},
                    "s": {"a": 0, "k": [100.0, 100.0, 100.0]},
                },
                "ao": 0,
                "ip": 3,
                "op": 4,
                "st": 0,
                "bm": 0,
            })
        );
    }

    #[test]
    fn asset_embed_flag() {
        let mut asset = Asset {
            id: Asset::id_for(0),
            width: 10,
            height: 20,
            base_path: String::new(),
            payload: "frame_00000.png".to_string(),
            embed_mode: EmbedMode::External,
        };
        let value = serde_json::to_value(&asset).unwrap();
        assert_eq!(value["e"], 0);
        assert_eq!(value["u"], "");
        assert_eq!(value["p"], "frame_00000.png");

        asset.embed_mode = EmbedMode::Embedded;
        let value = serde_json::to_value(&asset).unwrap();
        assert_eq!(value["e"], 1);
    }
}
