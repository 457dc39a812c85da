//! Per-user preferences.
//!
//! Stored flat at `userSettings/{userId}` with every preference optional;
//! served grouped and fully populated through [`to_user_settings`].

use serde::{Deserialize, Serialize};
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub const DEFAULT_AUTO_APPLY_CODE: bool = true;
pub const DEFAULT_EXPAND_CODE_BLOCKS: bool = true;
pub const DEFAULT_SHOW_SUGGESTIONS: bool = true;
pub const DEFAULT_SHOW_MINI_CHAT: bool = true;
pub const DEFAULT_SHOULD_WARN_DELETE: bool = true;
pub const DEFAULT_ENABLE_BUN_REPLACE: bool = true;
pub const DEFAULT_BUILD_FLAGS: &str = "--no-lint";

/// Stored settings document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettingsDocument {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_apply_code: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expand_code_blocks: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_suggestions: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_mini_chat: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_warn_delete: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_bun_replace: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_flags: Option<String>,
}

/// Partial settings update. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserSettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_apply_code: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expand_code_blocks: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_suggestions: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_mini_chat: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_warn_delete: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_bun_replace: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 1000))]
    pub build_flags: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct ChatSettings {
    pub auto_apply_code: bool,
    pub expand_code_blocks: bool,
    pub show_suggestions: bool,
    pub show_mini_chat: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct EditorSettings {
    pub should_warn_delete: bool,
    pub enable_bun_replace: bool,
    pub build_flags: String,
}

/// Normalized settings as served to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub id: String,
    pub user_id: String,
    pub chat: ChatSettings,
    pub editor: EditorSettings,
}

/// Normalize a stored document, filling gaps with defaults.
pub fn to_user_settings(doc: UserSettingsDocument) -> UserSettings {
    UserSettings {
        id: doc.id,
        user_id: doc.user_id,
        chat: ChatSettings {
            auto_apply_code: doc.auto_apply_code.unwrap_or(DEFAULT_AUTO_APPLY_CODE),
            expand_code_blocks: doc.expand_code_blocks.unwrap_or(DEFAULT_EXPAND_CODE_BLOCKS),
            show_suggestions: doc.show_suggestions.unwrap_or(DEFAULT_SHOW_SUGGESTIONS),
            show_mini_chat: doc.show_mini_chat.unwrap_or(DEFAULT_SHOW_MINI_CHAT),
        },
        editor: EditorSettings {
            should_warn_delete: doc.should_warn_delete.unwrap_or(DEFAULT_SHOULD_WARN_DELETE),
            enable_bun_replace: doc.enable_bun_replace.unwrap_or(DEFAULT_ENABLE_BUN_REPLACE),
            build_flags: doc
                .build_flags
                .unwrap_or_else(|| DEFAULT_BUILD_FLAGS.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sparse_document_is_filled_with_defaults() {
        let doc: UserSettingsDocument =
            serde_json::from_value(json!({"id": "s1", "userId": "u1", "showMiniChat": false}))
                .unwrap();
        let settings = to_user_settings(doc);

        assert!(!settings.chat.show_mini_chat);
        assert!(settings.chat.auto_apply_code);
        assert_eq!(settings.editor.build_flags, DEFAULT_BUILD_FLAGS);
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let patch = UserSettingsPatch {
            build_flags: Some("--verbose".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({"buildFlags": "--verbose"})
        );
    }

    #[test]
    fn patch_rejects_unknown_fields() {
        let result: Result<UserSettingsPatch, _> =
            serde_json::from_value(json!({"userId": "someone-else"}));
        assert!(result.is_err());
    }
}
