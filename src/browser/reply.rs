//! Parsing of agent-browser `--json` replies
//!
//! agent-browser wraps command results in `{ success, data, error }`. Older
//! builds print the bare value, so both shapes are accepted.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::{PageCheckError, Result};

/// Envelope around every `--json` reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    /// Whether the operation succeeded
    #[serde(default)]
    pub success: bool,
    /// Command payload
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    /// Error text when `success` is false
    #[serde(default)]
    pub error: Option<String>,
}

/// Outcome of an in-page wait program
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WaitReport {
    pub ok: bool,
    #[serde(default)]
    pub elapsed: u64,
}

/// Bounding box of an element, page coordinates in CSS pixels
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ElementRect {
    pub count: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default = "default_dpr")]
    pub dpr: f64,
}

fn default_dpr() -> f64 {
    1.0
}

impl ElementRect {
    /// Crop box in device pixels, clamped to an image of `img_w` x `img_h`
    pub fn crop_box(&self, img_w: u32, img_h: u32) -> Option<(u32, u32, u32, u32)> {
        let scale = if self.dpr > 0.0 { self.dpr } else { 1.0 };
        let x = (self.x * scale).floor().max(0.0) as u32;
        let y = (self.y * scale).floor().max(0.0) as u32;
        if x >= img_w || y >= img_h {
            return None;
        }
        let w = ((self.width * scale).ceil() as u32).min(img_w - x);
        let h = ((self.height * scale).ceil() as u32).min(img_h - y);
        if w == 0 || h == 0 {
            return None;
        }
        Some((x, y, w, h))
    }
}

/// Extract the evaluated value from `eval --json` output
pub fn eval_value<T: DeserializeOwned>(stdout: &str) -> Result<T> {
    let raw: serde_json::Value = serde_json::from_str(stdout.trim())?;

    let value = match serde_json::from_value::<Reply>(raw.clone()) {
        Ok(reply) if raw.get("success").is_some() => {
            if !reply.success {
                return Err(PageCheckError::browser(
                    reply.error.unwrap_or_else(|| "eval failed".to_string()),
                ));
            }
            match reply.data {
                Some(serde_json::Value::Object(mut map)) if map.contains_key("result") => {
                    map.remove("result").unwrap_or(serde_json::Value::Null)
                }
                Some(other) => other,
                None => serde_json::Value::Null,
            }
        }
        _ => raw,
    };

    Ok(serde_json::from_value(value)?)
}
