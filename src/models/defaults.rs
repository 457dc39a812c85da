//! Initial shapes for newly created entities.
//!
//! Pure constructors: same structure on every call, fresh UUID v4 ids.

use super::canvas::{Canvas, Frame, FrameType, UserCanvas};
use super::settings::{
    UserSettingsDocument, DEFAULT_AUTO_APPLY_CODE, DEFAULT_BUILD_FLAGS,
    DEFAULT_ENABLE_BUN_REPLACE, DEFAULT_EXPAND_CODE_BLOCKS, DEFAULT_SHOULD_WARN_DELETE,
    DEFAULT_SHOW_MINI_CHAT, DEFAULT_SHOW_SUGGESTIONS,
};
use super::Fields;
use uuid::Uuid;

pub const FRAME_X: f64 = 100.0;
pub const FRAME_Y: f64 = 100.0;
pub const FRAME_WIDTH: f64 = 1536.0;
pub const FRAME_HEIGHT: f64 = 960.0;

pub const CANVAS_SCALE: f64 = 0.7;
pub const CANVAS_PAN_X: f64 = 175.0;
pub const CANVAS_PAN_Y: f64 = 100.0;

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn create_default_canvas(project_id: &str) -> Canvas {
    Canvas {
        id: new_id(),
        project_id: project_id.to_string(),
        extra: Fields::new(),
    }
}

pub fn create_default_frame(canvas_id: &str, sandbox_url: &str) -> Frame {
    Frame {
        id: new_id(),
        canvas_id: canvas_id.to_string(),
        kind: FrameType::Web,
        url: sandbox_url.to_string(),
        x: FRAME_X,
        y: FRAME_Y,
        width: FRAME_WIDTH,
        height: FRAME_HEIGHT,
        extra: Fields::new(),
    }
}

/// User canvases are keyed by user id, so this is the one default without a fresh id.
pub fn create_default_user_canvas(user_id: &str, canvas_id: &str) -> UserCanvas {
    UserCanvas {
        user_id: user_id.to_string(),
        canvas_id: canvas_id.to_string(),
        scale: CANVAS_SCALE,
        x: CANVAS_PAN_X,
        y: CANVAS_PAN_Y,
        extra: Fields::new(),
    }
}

pub fn create_default_user_settings(user_id: &str) -> UserSettingsDocument {
    UserSettingsDocument {
        id: new_id(),
        user_id: user_id.to_string(),
        auto_apply_code: Some(DEFAULT_AUTO_APPLY_CODE),
        expand_code_blocks: Some(DEFAULT_EXPAND_CODE_BLOCKS),
        show_suggestions: Some(DEFAULT_SHOW_SUGGESTIONS),
        show_mini_chat: Some(DEFAULT_SHOW_MINI_CHAT),
        should_warn_delete: Some(DEFAULT_SHOULD_WARN_DELETE),
        enable_bun_replace: Some(DEFAULT_ENABLE_BUN_REPLACE),
        build_flags: Some(DEFAULT_BUILD_FLAGS.to_string()),
    }
}
