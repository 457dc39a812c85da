// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google-signed JWT verification.
//!
//! One verifier type serves two callers: browser sessions carrying Firebase
//! ID tokens, and Cloud Scheduler calls carrying service-account OIDC tokens.
//! Both are RS256 tokens whose keys are published as JWKS.

use crate::config::Config;
use anyhow::Context;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::{Mutex, RwLock};

const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const GOOGLE_ISSUERS: [&str; 2] = ["https://accounts.google.com", "accounts.google.com"];
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
const CLOCK_SKEW_SECS: u64 = 60;

/// Identity carried by a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub subject: String,
    /// Only present when the provider reports it as verified
    pub email: Option<String>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TokenError {
    /// The token is malformed, expired, or issued for someone else.
    #[error("token rejected: {0}")]
    Rejected(String),
    /// Keys could not be fetched; the token may well be valid.
    #[error("token verification unavailable: {0}")]
    Transient(String),
}

/// Which tokens a verifier accepts.
#[derive(Debug, Clone)]
enum Profile {
    FirebaseIdToken {
        project_id: String,
    },
    SchedulerOidc {
        audience: String,
        service_account: String,
    },
}

impl Profile {
    fn jwks_url(&self) -> &'static str {
        match self {
            Profile::FirebaseIdToken { .. } => FIREBASE_JWKS_URL,
            Profile::SchedulerOidc { .. } => GOOGLE_JWKS_URL,
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.leeway = CLOCK_SKEW_SECS;
        match self {
            Profile::FirebaseIdToken { project_id } => {
                validation.set_issuer(&[format!("https://securetoken.google.com/{project_id}")]);
                validation.set_audience(&[project_id.as_str()]);
            }
            Profile::SchedulerOidc { audience, .. } => {
                validation.set_issuer(&GOOGLE_ISSUERS[..]);
                validation.set_audience(&[audience.as_str()]);
                validation.validate_nbf = true;
            }
        }
        validation
    }

    fn principal(&self, claims: IdTokenClaims) -> Result<VerifiedToken, TokenError> {
        if claims.sub.trim().is_empty() {
            return Err(TokenError::Rejected("empty sub claim".to_string()));
        }

        match self {
            Profile::FirebaseIdToken { .. } => {
                let email = match claims.email_verified {
                    Some(false) => None,
                    _ => claims.email,
                };
                Ok(VerifiedToken {
                    subject: claims.sub,
                    email,
                })
            }
            Profile::SchedulerOidc {
                service_account, ..
            } => {
                let email = claims
                    .email
                    .ok_or_else(|| TokenError::Rejected("missing email claim".to_string()))?;
                if &email != service_account {
                    return Err(TokenError::Rejected(format!(
                        "unexpected service account email: {email}"
                    )));
                }
                if claims.email_verified != Some(true) {
                    return Err(TokenError::Rejected(
                        "email_verified claim is not true".to_string(),
                    ));
                }
                Ok(VerifiedToken {
                    subject: claims.sub,
                    email: Some(email),
                })
            }
        }
    }
}

enum KeySource {
    Jwks,
    Static {
        kid: String,
        decoding_key: Arc<DecodingKey>,
    },
}

struct JwksCacheEntry {
    keys_by_kid: HashMap<String, Arc<DecodingKey>>,
    expires_at: Instant,
}

/// RS256 token verifier backed by a cached JWKS.
pub struct TokenVerifier {
    http_client: reqwest::Client,
    profile: Profile,
    keys: KeySource,
    jwks_cache: RwLock<Option<JwksCacheEntry>>,
    refresh_lock: Mutex<()>,
}

impl TokenVerifier {
    /// Verifier for Firebase Authentication ID tokens of this project.
    pub fn firebase(config: &Config) -> anyhow::Result<Self> {
        let profile = Profile::FirebaseIdToken {
            project_id: config.gcp_project_id.clone(),
        };
        tracing::info!(project = %config.gcp_project_id, "Initialized Firebase ID token verifier");
        Self::with_profile(profile)
    }

    /// Verifier for Cloud Scheduler OIDC tokens minted for `/functions/*`.
    pub fn scheduler(config: &Config) -> anyhow::Result<Self> {
        let profile = Profile::SchedulerOidc {
            audience: canonicalize_audience(&config.api_url),
            service_account: config.scheduler_service_account.clone(),
        };
        tracing::info!(
            audience = %config.api_url,
            service_account = %config.scheduler_service_account,
            "Initialized scheduler OIDC verifier"
        );
        Self::with_profile(profile)
    }

    fn with_profile(profile: Profile) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .context("failed building JWKS HTTP client")?;

        Ok(Self {
            http_client,
            profile,
            keys: KeySource::Jwks,
            jwks_cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    /// Trust a single fixed RSA key instead of the published JWKS.
    ///
    /// Intended for tests that sign their own tokens.
    pub fn with_static_key(
        mut self,
        kid: impl Into<String>,
        decoding_key: DecodingKey,
    ) -> anyhow::Result<Self> {
        let kid = kid.into();
        if kid.trim().is_empty() {
            anyhow::bail!("static key id must not be empty");
        }
        self.keys = KeySource::Static {
            kid,
            decoding_key: Arc::new(decoding_key),
        };
        Ok(self)
    }

    /// Verify a raw JWT.
    pub async fn verify(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        let header = decode_header(token)
            .map_err(|e| TokenError::Rejected(format!("invalid JWT header: {e}")))?;

        if header.alg != Algorithm::RS256 {
            return Err(TokenError::Rejected(format!(
                "unexpected JWT alg: {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| TokenError::Rejected("missing JWT kid".to_string()))?;

        let decoding_key = self.decoding_key_for_kid(&kid).await?;

        let claims = decode::<IdTokenClaims>(token, &decoding_key, &self.profile.validation())
            .map_err(|e| TokenError::Rejected(format!("JWT validation failed: {e}")))?
            .claims;

        validate_iat(claims.iat)?;

        tracing::debug!(subject = %claims.sub, issuer = %claims.iss, "Token signature verified");

        self.profile.principal(claims)
    }

    async fn decoding_key_for_kid(&self, kid: &str) -> Result<Arc<DecodingKey>, TokenError> {
        if let KeySource::Static {
            kid: static_kid,
            decoding_key,
        } = &self.keys
        {
            return if kid == static_kid {
                Ok(decoding_key.clone())
            } else {
                Err(TokenError::Rejected(format!("unknown JWT kid: {kid}")))
            };
        }

        if let Some(key) = self.lookup_cached_key(kid).await {
            return Ok(key);
        }

        // Keys rotate; an unknown kid earns exactly one forced refresh.
        for force_refresh in [false, true] {
            self.refresh_jwks(force_refresh).await?;
            if let Some(key) = self.lookup_cached_key(kid).await {
                return Ok(key);
            }
        }

        Err(TokenError::Rejected(format!(
            "JWT kid not found in JWKS after refresh: {kid}"
        )))
    }

    async fn lookup_cached_key(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        let cache = self.jwks_cache.read().await;
        let now = Instant::now();
        cache
            .as_ref()
            .filter(|entry| entry.expires_at > now)
            .and_then(|entry| entry.keys_by_kid.get(kid))
            .cloned()
    }

    async fn refresh_jwks(&self, force_refresh: bool) -> Result<(), TokenError> {
        let _guard = self.refresh_lock.lock().await;

        if !force_refresh
            && self
                .jwks_cache
                .read()
                .await
                .as_ref()
                .is_some_and(|entry| entry.expires_at > Instant::now())
        {
            return Ok(());
        }

        let jwks_url = self.profile.jwks_url();
        tracing::debug!(jwks_url, "Refreshing JWKS cache");

        let response = self
            .http_client
            .get(jwks_url)
            .send()
            .await
            .map_err(|e| TokenError::Transient(format!("JWKS request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(TokenError::Transient(format!(
                "JWKS request returned status {}",
                response.status()
            )));
        }

        let ttl = cache_ttl_from_headers(response.headers(), DEFAULT_CACHE_TTL);

        let jwks: Jwks = response
            .json()
            .await
            .map_err(|e| TokenError::Transient(format!("invalid JWKS JSON: {e}")))?;

        let keys_by_kid = usable_keys(jwks);
        if keys_by_kid.is_empty() {
            return Err(TokenError::Transient(
                "JWKS response did not include any usable RSA keys".to_string(),
            ));
        }

        *self.jwks_cache.write().await = Some(JwksCacheEntry {
            keys_by_kid,
            expires_at: Instant::now() + ttl,
        });

        tracing::debug!(ttl_secs = ttl.as_secs(), "JWKS cache refreshed");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    alg: Option<String>,
    n: String,
    e: String,
    #[serde(rename = "use")]
    use_: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    iss: String,
    sub: String,
    iat: Option<usize>,
    email: Option<String>,
    email_verified: Option<bool>,
}

fn usable_keys(jwks: Jwks) -> HashMap<String, Arc<DecodingKey>> {
    jwks.keys
        .into_iter()
        .filter(|jwk| jwk.kty == "RSA" && !jwk.kid.trim().is_empty())
        .filter(|jwk| jwk.alg.as_deref().is_none_or(|alg| alg == "RS256"))
        .filter(|jwk| jwk.use_.as_deref().is_none_or(|use_| use_ == "sig"))
        .filter_map(|jwk| match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
            Ok(key) => Some((jwk.kid, Arc::new(key))),
            Err(e) => {
                tracing::warn!(error = %e, kid = %jwk.kid, "Skipping invalid RSA JWKS key");
                None
            }
        })
        .collect()
}

fn validate_iat(iat: Option<usize>) -> Result<(), TokenError> {
    let Some(iat) = iat else {
        return Err(TokenError::Rejected("missing iat claim".to_string()));
    };

    if iat as u64 > now_unix_secs() + CLOCK_SKEW_SECS {
        return Err(TokenError::Rejected(
            "iat claim is in the future".to_string(),
        ));
    }

    Ok(())
}

fn cache_ttl_from_headers(headers: &reqwest::header::HeaderMap, fallback: Duration) -> Duration {
    headers
        .get(CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_cache_control_max_age)
        .map(Duration::from_secs)
        .unwrap_or(fallback)
}

fn parse_cache_control_max_age(value: &str) -> Option<u64> {
    value
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|raw| raw.trim_matches('"').parse::<u64>().ok())
}

fn canonicalize_audience(audience: &str) -> String {
    audience.trim_end_matches('/').to_string()
}

/// Pull the token out of an `Authorization: Bearer` header value.
pub fn bearer_token(header_value: Option<&str>) -> Option<&str> {
    header_value
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(email: Option<&str>, email_verified: Option<bool>) -> IdTokenClaims {
        IdTokenClaims {
            iss: "https://securetoken.google.com/test-project".to_string(),
            sub: "uid-1".to_string(),
            iat: Some(0),
            email: email.map(str::to_string),
            email_verified,
        }
    }

    #[test]
    fn parse_cache_control_max_age_valid() {
        assert_eq!(
            parse_cache_control_max_age("public, max-age=3600"),
            Some(3600)
        );
        assert_eq!(parse_cache_control_max_age("max-age=\"120\""), Some(120));
    }

    #[test]
    fn parse_cache_control_max_age_invalid() {
        assert_eq!(parse_cache_control_max_age("public, immutable"), None);
        assert_eq!(parse_cache_control_max_age("max-age=abc"), None);
    }

    #[test]
    fn bearer_token_extraction() {
        assert_eq!(bearer_token(Some("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(Some("Basic abc")), None);
        assert_eq!(bearer_token(Some("Bearer ")), None);
        assert_eq!(bearer_token(None), None);
    }

    #[test]
    fn firebase_drops_unverified_email() {
        let profile = Profile::FirebaseIdToken {
            project_id: "test-project".to_string(),
        };

        let verified = profile
            .principal(claims(Some("a@example.com"), Some(true)))
            .unwrap();
        assert_eq!(verified.email.as_deref(), Some("a@example.com"));

        let unverified = profile
            .principal(claims(Some("a@example.com"), Some(false)))
            .unwrap();
        assert_eq!(unverified.subject, "uid-1");
        assert_eq!(unverified.email, None);
    }

    #[test]
    fn scheduler_requires_expected_service_account() {
        let profile = Profile::SchedulerOidc {
            audience: "http://localhost:8080".to_string(),
            service_account: "sched@test-project.iam.gserviceaccount.com".to_string(),
        };

        assert!(profile
            .principal(claims(
                Some("sched@test-project.iam.gserviceaccount.com"),
                Some(true)
            ))
            .is_ok());
        assert!(matches!(
            profile.principal(claims(Some("other@example.com"), Some(true))),
            Err(TokenError::Rejected(_))
        ));
        assert!(matches!(
            profile.principal(claims(
                Some("sched@test-project.iam.gserviceaccount.com"),
                None
            )),
            Err(TokenError::Rejected(_))
        ));
    }
}
