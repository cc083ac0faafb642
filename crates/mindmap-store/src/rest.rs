//! PostgREST adapter for the hosted `mindmaps` table.
//!
//! Speaks the REST dialect of the backend-as-a-service the web client was
//! built against: `/rest/v1/{table}` with `apikey` + bearer headers, filters
//! as `column=eq.value`, and `Prefer: return=representation` to get the
//! affected rows back.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mindmap_shared::constants::MINDMAPS_TABLE;
use mindmap_shared::Project;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::models::MindmapRecord;
use crate::table::TableStore;

const PROJECT_COLUMNS: &str = "id,name,updated_at";
const RECORD_COLUMNS: &str = "id,name,encrypted_data,updated_at";

#[derive(Debug, Clone)]
pub struct RestTable {
    client: Client,
    table_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct DataUpdate<'a> {
    encrypted_data: &'a str,
    updated_at: DateTime<Utc>,
}

impl RestTable {
    /// `base_url` is the project URL (e.g. `https://xyz.supabase.co`).
    pub fn new(base_url: &str, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            table_url: format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), MINDMAPS_TABLE),
            api_key: api_key.into(),
        })
    }

    pub fn table_url(&self) -> &str {
        &self.table_url
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn list_request(&self) -> RequestBuilder {
        self.authed(self.client.get(&self.table_url)).query(&[
            ("select", PROJECT_COLUMNS),
            ("order", "updated_at.desc"),
        ])
    }

    fn get_request(&self, id: &str) -> RequestBuilder {
        self.authed(self.client.get(&self.table_url))
            .query(&[("select", RECORD_COLUMNS.to_string()), ("id", format!("eq.{id}"))])
    }

    fn insert_request(&self, record: &MindmapRecord) -> RequestBuilder {
        self.authed(self.client.post(&self.table_url))
            .header("Prefer", "return=representation")
            .query(&[("select", PROJECT_COLUMNS)])
            .json(&[record])
    }

    fn update_request(&self, id: &str, body: &DataUpdate<'_>) -> RequestBuilder {
        self.authed(self.client.patch(&self.table_url))
            .header("Prefer", "return=representation")
            .query(&[("select", "id".to_string()), ("id", format!("eq.{id}"))])
            .json(body)
    }

    fn delete_request(&self, id: &str) -> RequestBuilder {
        self.authed(self.client.delete(&self.table_url))
            .header("Prefer", "return=representation")
            .query(&[("select", "id".to_string()), ("id", format!("eq.{id}"))])
    }
}

async fn rows<T: DeserializeOwned>(request: RequestBuilder) -> Result<Vec<T>> {
    let resp = check(request.send().await?).await?;
    Ok(resp.json().await?)
}

async fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl TableStore for RestTable {
    async fn list(&self) -> Result<Vec<Project>> {
        rows(self.list_request()).await
    }

    async fn get(&self, id: &str) -> Result<Option<MindmapRecord>> {
        let found: Vec<MindmapRecord> = rows(self.get_request(id)).await?;
        Ok(found.into_iter().next())
    }

    async fn insert(&self, record: &MindmapRecord) -> Result<Project> {
        let inserted: Vec<Project> = rows(self.insert_request(record)).await?;
        debug!(id = %record.id, "inserted remote record");
        inserted.into_iter().next().ok_or(StoreError::NotFound)
    }

    async fn update_data(
        &self,
        id: &str,
        encrypted_data: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let body = DataUpdate {
            encrypted_data,
            updated_at,
        };
        let updated: Vec<IgnoredAny> = rows(self.update_request(id, &body)).await?;
        Ok(!updated.is_empty())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let deleted: Vec<IgnoredAny> = rows(self.delete_request(id)).await?;
        Ok(!deleted.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RestTable {
        RestTable::new("https://example.supabase.co/", "anon-key", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn table_url_strips_trailing_slash() {
        assert_eq!(
            table().table_url(),
            "https://example.supabase.co/rest/v1/mindmaps"
        );
    }

    #[test]
    fn list_request_projects_and_orders() {
        let req = table().list_request().build().unwrap();
        assert_eq!(req.method(), reqwest::Method::GET);
        assert_eq!(
            req.url().query(),
            Some("select=id%2Cname%2Cupdated_at&order=updated_at.desc")
        );
        assert_eq!(req.headers()["apikey"], "anon-key");
        assert_eq!(req.headers()["authorization"], "Bearer anon-key");
    }

    #[test]
    fn get_request_filters_by_id() {
        let req = table().get_request("default").build().unwrap();
        let pairs: Vec<(String, String)> = req.url().query_pairs().into_owned().collect();
        assert!(pairs.contains(&("id".into(), "eq.default".into())));
        assert!(pairs.contains(&("select".into(), RECORD_COLUMNS.into())));
    }

    #[test]
    fn update_request_sends_ciphertext_and_timestamp() {
        let body = DataUpdate {
            encrypted_data: "sealed",
            updated_at: Utc::now(),
        };
        let req = table().update_request("abc", &body).build().unwrap();
        assert_eq!(req.method(), reqwest::Method::PATCH);
        assert_eq!(req.headers()["prefer"], "return=representation");

        let sent: serde_json::Value =
            serde_json::from_slice(req.body().unwrap().as_bytes().unwrap()).unwrap();
        assert_eq!(sent["encrypted_data"], "sealed");
        assert!(sent["updated_at"].is_string());
    }

    #[test]
    fn insert_request_posts_array() {
        let record = MindmapRecord::empty("id-1", "Trip Plan");
        let req = table().insert_request(&record).build().unwrap();
        assert_eq!(req.method(), reqwest::Method::POST);

        let sent: serde_json::Value =
            serde_json::from_slice(req.body().unwrap().as_bytes().unwrap()).unwrap();
        assert_eq!(sent[0]["name"], "Trip Plan");
        assert_eq!(sent[0]["encrypted_data"], "");
    }
}
