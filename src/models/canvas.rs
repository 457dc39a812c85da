//! Canvas, frame, and per-user canvas models.

use super::Fields;
use serde::{Deserialize, Serialize};

/// Shared canvas, stored at `projects/{projectId}/canvas/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Canvas {
    pub id: String,
    pub project_id: String,
    #[serde(flatten)]
    pub extra: Fields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameType {
    Web,
}

/// Rectangular view within a canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub id: String,
    pub canvas_id: String,
    #[serde(rename = "type")]
    pub kind: FrameType,
    pub url: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(flatten)]
    pub extra: Fields,
}

/// A user's private view over a canvas, keyed by user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCanvas {
    pub user_id: String,
    pub canvas_id: String,
    pub scale: f64,
    pub x: f64,
    pub y: f64,
    #[serde(flatten)]
    pub extra: Fields,
}
