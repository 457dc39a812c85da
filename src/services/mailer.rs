// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Transactional email through Resend.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::ProjectRole;
use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

const RESEND_API_URL: &str = "https://api.resend.com/emails";
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Invitation email contents.
#[derive(Debug, Clone, PartialEq)]
pub struct InvitationEmail {
    pub to: String,
    pub inviter: String,
    pub project_name: String,
    pub role: ProjectRole,
    /// Absolute acceptance link
    pub link: String,
}

impl InvitationEmail {
    pub fn subject(&self) -> String {
        format!("{} invited you to {}", self.inviter, self.project_name)
    }

    pub fn html(&self) -> String {
        let role = match self.role {
            ProjectRole::Owner => "an owner",
            ProjectRole::Admin => "an admin",
            ProjectRole::Member => "a member",
        };
        format!(
            "<p>{inviter} invited you to join <strong>{project}</strong> as {role}.</p>\
             <p><a href=\"{link}\">Accept invitation</a></p>\
             <p>This invitation expires in 7 days.</p>",
            inviter = escape_html(&self.inviter),
            project = escape_html(&self.project_name),
            link = escape_html(&self.link),
        )
    }
}

/// Outbound notification channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Fail fast when the channel cannot possibly deliver.
    fn ensure_configured(&self) -> Result<()> {
        Ok(())
    }

    async fn send_invitation(&self, email: &InvitationEmail) -> Result<()>;
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: String,
    html: String,
}

/// [`Notifier`] backed by the Resend HTTP API.
pub struct ResendMailer {
    http_client: reqwest::Client,
    api_key: Option<String>,
    from: String,
    /// Log instead of sending
    dry_run: bool,
}

impl ResendMailer {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("failed building Resend HTTP client")?;

        let dry_run = !config.app_env.is_production();
        if dry_run {
            tracing::info!("Email dry-run enabled, invitations will be logged only");
        }

        Ok(Self {
            http_client,
            api_key: config.resend_api_key.clone(),
            from: config.email_from.clone(),
            dry_run,
        })
    }
}

#[async_trait]
impl Notifier for ResendMailer {
    fn ensure_configured(&self) -> Result<()> {
        match self.api_key {
            Some(_) => Ok(()),
            None => Err(AppError::MissingConfig("RESEND_API_KEY")),
        }
    }

    async fn send_invitation(&self, email: &InvitationEmail) -> Result<()> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(AppError::MissingConfig("RESEND_API_KEY"))?;

        let request = SendEmailRequest {
            from: &self.from,
            to: [email.to.as_str()],
            subject: email.subject(),
            html: email.html(),
        };

        if self.dry_run {
            tracing::info!(
                to = %email.to,
                subject = %request.subject,
                link = %email.link,
                "Dry run: invitation email not sent"
            );
            return Ok(());
        }

        let response = self
            .http_client
            .post(RESEND_API_URL)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Notification(format!("Resend request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Resend rejected invitation email");
            return Err(AppError::Notification(format!(
                "Resend returned status {status}"
            )));
        }

        tracing::info!(to = %email.to, "Invitation email sent");
        Ok(())
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
