//! Managed snapshot store backed by a Supabase table.
//!
//! Talks to the project's PostgREST endpoint; the
//! `onlyfans_profiles_snapshots` table is provisioned by the operator
//! (PostgREST carries no DDL). A missing table surfaces as a `Remote` error
//! with the upstream status and body on the first insert.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use reqwest::StatusCode;
use serde::Deserialize;

use super::{SnapshotStore, StoredSnapshot, SNAPSHOTS_TABLE};
use crate::config::SupabaseCredentials;
use crate::error::StorageError;
use crate::profile::Profile;

/// Remote store speaking PostgREST.
pub struct SupabaseStore {
    client: reqwest::Client,
    endpoint: String,
    service_key: String,
}

/// Row shape PostgREST returns with `Prefer: return=representation`.
#[derive(Debug, Deserialize)]
struct InsertedRow {
    id: i64,
    username: String,
    created_at: String,
}

impl SupabaseStore {
    /// Build a store for the given credentials. Reachability is verified on
    /// the first insert, not here.
    pub fn new(creds: &SupabaseCredentials) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            endpoint: creds.rest_endpoint(),
            service_key: creds.service_key.clone(),
        })
    }

    fn insert_url(&self) -> String {
        format!("{}/{}", self.endpoint, SNAPSHOTS_TABLE)
    }
}

#[async_trait]
impl SnapshotStore for SupabaseStore {
    async fn persist(&self, profile: &Profile) -> Result<StoredSnapshot, StorageError> {
        // Client-assigned capture timestamp so both backends agree on where
        // created_at comes from.
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true);
        let rows = serde_json::json!([{
            "username": profile.username,
            "profile_data": serde_json::to_value(profile)?,
            "created_at": created_at,
        }]);

        let resp = self
            .client
            .post(self.insert_url())
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header("Prefer", "return=representation")
            .json(&rows)
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(StorageError::Auth {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StorageError::Remote {
                status: status.as_u16(),
                body,
            });
        }

        let mut inserted: Vec<InsertedRow> = resp.json().await?;
        let row = inserted.pop().ok_or_else(|| StorageError::Remote {
            status: status.as_u16(),
            body: "empty representation in insert response".into(),
        })?;

        Ok(StoredSnapshot {
            id: row.id,
            username: row.username,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileSource;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn creds_for(server: &MockServer) -> SupabaseCredentials {
        SupabaseCredentials {
            project_id: "testproject".into(),
            service_key: "service-key".into(),
            endpoint: Some(format!("{}/rest/v1", server.uri())),
        }
    }

    #[tokio::test]
    async fn persist_posts_one_row_and_returns_it() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/onlyfans_profiles_snapshots"))
            .and(header("apikey", "service-key"))
            .and(header("Prefer", "return=representation"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([
                {"id": 7, "username": "alice", "created_at": "2026-08-25T10:00:00Z"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let store = SupabaseStore::new(&creds_for(&server)).unwrap();
        let mut profile = Profile::new("alice", ProfileSource::Api);
        profile.posts_count = Some(3);

        let snapshot = store.persist(&profile).await.unwrap();
        assert_eq!(snapshot.id, 7);
        assert_eq!(snapshot.username, "alice");
        assert_eq!(snapshot.created_at, "2026-08-25T10:00:00Z");

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!(body.is_array());
        assert_eq!(body[0]["username"], "alice");
        assert_eq!(body[0]["profile_data"]["posts_count"], 3);
        assert!(body[0]["created_at"].is_string());
    }

    #[tokio::test]
    async fn unauthorized_maps_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let store = SupabaseStore::new(&creds_for(&server)).unwrap();
        let err = store
            .persist(&Profile::new("alice", ProfileSource::Api))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Auth { status: 401 }));
    }

    #[tokio::test]
    async fn missing_table_surfaces_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_string(r#"{"message":"relation does not exist"}"#),
            )
            .mount(&server)
            .await;

        let store = SupabaseStore::new(&creds_for(&server)).unwrap();
        let err = store
            .persist(&Profile::new("alice", ProfileSource::Api))
            .await
            .unwrap_err();
        match err {
            StorageError::Remote { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("does not exist"));
            }
            other => panic!("expected Remote error, got {other:?}"),
        }
    }
}
