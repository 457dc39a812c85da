// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User records and preferences.

use crate::context::{Access, AuthContext};
use crate::db::{get_model, merge_value, paths, to_document, DocumentStore, WriteMode};
use crate::error::{AppError, Result};
use crate::models::settings::{to_user_settings, UserSettingsPatch};
use crate::models::{defaults, validate_doc_id, User, UserSettings, UserSettingsDocument};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct UserKey {
    #[validate(custom(function = "validate_doc_id"))]
    pub id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewUser {
    #[validate(custom(function = "validate_doc_id"))]
    pub id: String,
    #[serde(default)]
    #[validate(email)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedUser {
    pub id: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SettingsKey {
    #[validate(custom(function = "validate_doc_id"))]
    pub user_id: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpsert {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    #[validate(nested)]
    pub settings: UserSettingsPatch,
}

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn DocumentStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get_by_id(&self, ctx: &AuthContext, id: &str) -> Result<Option<User>> {
        ctx.authorize(Access::SelfOnly(id)).await?;
        get_model(self.store.as_ref(), &paths::user(id)).await
    }

    /// Record the caller's user document. Repeat calls keep other fields.
    pub async fn create(&self, ctx: &AuthContext, input: NewUser) -> Result<CreatedUser> {
        ctx.authorize(Access::SelfOnly(&input.id)).await?;

        let user = User {
            id: input.id,
            email: input.email,
        };
        self.store
            .set(&paths::user(&user.id), to_document(&user)?, WriteMode::Merge)
            .await?;

        tracing::info!(user_id = %user.id, "User record written");
        Ok(CreatedUser { id: user.id })
    }

    /// Stored settings, or the defaults when the user has none yet.
    pub async fn get_settings(&self, ctx: &AuthContext, user_id: &str) -> Result<UserSettings> {
        ctx.authorize(Access::SelfOnly(user_id)).await?;

        let stored =
            get_model::<UserSettingsDocument>(self.store.as_ref(), &paths::user_settings(user_id))
                .await?;

        Ok(to_user_settings(stored.unwrap_or_else(|| {
            defaults::create_default_user_settings(user_id)
        })))
    }

    /// Merge a partial update into the user's settings and return the result.
    pub async fn upsert_settings(
        &self,
        ctx: &AuthContext,
        input: SettingsUpsert,
    ) -> Result<UserSettings> {
        if input.user_id.is_empty() {
            return Err(AppError::BadRequest("userId is required".to_string()));
        }
        validate_doc_id(&input.user_id)
            .map_err(|_| AppError::BadRequest("Invalid userId".to_string()))?;
        ctx.authorize(Access::SelfOnly(&input.user_id)).await?;

        let path = paths::user_settings(&input.user_id);
        let patch = to_document(&input.settings)?;

        let mut write = match self.store.get(&path).await? {
            Some(_) => patch,
            None => {
                let mut initial =
                    to_document(&defaults::create_default_user_settings(&input.user_id))?;
                merge_value(&mut initial, patch);
                initial
            }
        };

        if let Value::Object(fields) = &mut write {
            fields.insert("userId".to_string(), Value::String(input.user_id.clone()));
        }
        self.store.set(&path, write, WriteMode::Merge).await?;

        let stored = get_model::<UserSettingsDocument>(self.store.as_ref(), &path)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Settings for user {}", input.user_id)))?;

        Ok(to_user_settings(stored))
    }
}
