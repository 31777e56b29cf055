use crate::{
    BlobStore, DocumentStore, EvaluationDoc, Listing, SessionDoc, StoreError,
};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

const FIRESTORE_BASE: &str = "https://firestore.googleapis.com/v1";
const STORAGE_BASE: &str = "https://firebasestorage.googleapis.com/v0";

pub const EVALUATIONS_COLLECTION: &str = "global-survey-evaluations";
pub const SESSIONS_COLLECTION: &str = "global-survey-responses";

/// Fields that carry timestamps on the wire. Firestore stores them as
/// `timestampValue`; everything else round-trips through plain JSON kinds.
const TIMESTAMP_FIELDS: &[&str] = &["timestamp", "startedAt", "completedAt"];

#[derive(Clone)]
pub struct FirebaseConfig {
    pub project_id: String,
    pub bucket: String,
    pub api_key: Option<String>,
}

#[derive(Clone)]
pub struct FirebaseStore {
    client: Client,
    cfg: FirebaseConfig,
}

impl FirebaseStore {
    pub fn new(cfg: FirebaseConfig) -> Self {
        Self {
            client: Client::new(),
            cfg,
        }
    }

    fn documents_url(&self, collection: &str) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{}",
            FIRESTORE_BASE, self.cfg.project_id, collection
        )
    }

    async fn list_collection(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        #[derive(Deserialize)]
        struct ListResponse {
            #[serde(default)]
            documents: Vec<FirestoreDocument>,
            #[serde(rename = "nextPageToken")]
            next_page_token: Option<String>,
        }
        #[derive(Deserialize)]
        struct FirestoreDocument {
            #[serde(default)]
            fields: Map<String, Value>,
        }

        let url = self.documents_url(collection);
        let mut docs = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut builder = self.client.get(&url).query(&[("pageSize", "300")]);
            if let Some(token) = &page_token {
                builder = builder.query(&[("pageToken", token.as_str())]);
            }
            if let Some(key) = &self.cfg.api_key {
                builder = builder.query(&[("key", key.as_str())]);
            }
            let resp = builder
                .send()
                .await
                .map_err(|e| StoreError::RequestFailed(e.to_string()))?;
            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                return Err(StoreError::RequestFailed(format!(
                    "status {} body {:?}",
                    status, body
                )));
            }
            let parsed: ListResponse = resp
                .json()
                .await
                .map_err(|e| StoreError::RequestFailed(e.to_string()))?;
            for doc in parsed.documents {
                docs.push(decode_fields(&doc.fields));
            }
            page_token = parsed.next_page_token;
            if page_token.is_none() {
                break;
            }
        }
        Ok(docs)
    }

    async fn create_document(&self, collection: &str, doc: &Value) -> Result<(), StoreError> {
        let fields = match doc {
            Value::Object(map) => encode_fields(map),
            other => {
                return Err(StoreError::MalformedDocument(format!(
                    "expected object document, got {}",
                    other
                )))
            }
        };
        let mut builder = self
            .client
            .post(self.documents_url(collection))
            .json(&json!({ "fields": fields }));
        if let Some(key) = &self.cfg.api_key {
            builder = builder.query(&[("key", key.as_str())]);
        }
        let resp = builder
            .send()
            .await
            .map_err(|e| StoreError::RequestFailed(e.to_string()))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::RequestFailed(format!(
                "status {} body {:?}",
                status, body
            )));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl DocumentStore for FirebaseStore {
    async fn list_evaluations(&self) -> Result<Vec<EvaluationDoc>, StoreError> {
        let raw = self.list_collection(EVALUATIONS_COLLECTION).await?;
        Ok(decode_lenient(raw))
    }

    async fn list_sessions(&self) -> Result<Vec<SessionDoc>, StoreError> {
        let raw = self.list_collection(SESSIONS_COLLECTION).await?;
        Ok(decode_lenient(raw))
    }

    async fn add_evaluation(&self, doc: &EvaluationDoc) -> Result<(), StoreError> {
        let value = serde_json::to_value(doc)
            .map_err(|e| StoreError::MalformedDocument(e.to_string()))?;
        self.create_document(EVALUATIONS_COLLECTION, &value).await
    }

    async fn add_session(&self, doc: &SessionDoc) -> Result<(), StoreError> {
        let value = serde_json::to_value(doc)
            .map_err(|e| StoreError::MalformedDocument(e.to_string()))?;
        self.create_document(SESSIONS_COLLECTION, &value).await
    }
}

#[async_trait::async_trait]
impl BlobStore for FirebaseStore {
    async fn list(&self, path: &str) -> Result<Listing, StoreError> {
        #[derive(Deserialize)]
        struct ObjectsResponse {
            #[serde(default)]
            prefixes: Vec<String>,
            #[serde(default)]
            items: Vec<ObjectItem>,
            #[serde(rename = "nextPageToken")]
            next_page_token: Option<String>,
        }
        #[derive(Deserialize)]
        struct ObjectItem {
            name: String,
        }

        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{}/", path.trim_end_matches('/'))
        };
        let url = format!("{}/b/{}/o", STORAGE_BASE, self.cfg.bucket);
        let mut listing = Listing::default();
        let mut page_token: Option<String> = None;
        loop {
            let mut builder = self
                .client
                .get(&url)
                .query(&[("delimiter", "/"), ("prefix", prefix.as_str())]);
            if let Some(token) = &page_token {
                builder = builder.query(&[("pageToken", token.as_str())]);
            }
            if let Some(key) = &self.cfg.api_key {
                builder = builder.query(&[("key", key.as_str())]);
            }
            let resp = builder
                .send()
                .await
                .map_err(|e| StoreError::RequestFailed(e.to_string()))?;
            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                return Err(StoreError::RequestFailed(format!(
                    "status {} body {:?}",
                    status, body
                )));
            }
            let parsed: ObjectsResponse = resp
                .json()
                .await
                .map_err(|e| StoreError::RequestFailed(e.to_string()))?;
            for child in parsed.prefixes {
                let name = child
                    .strip_prefix(&prefix)
                    .unwrap_or(child.as_str())
                    .trim_end_matches('/');
                if !name.is_empty() {
                    listing.prefixes.push(name.to_string());
                }
            }
            for item in parsed.items {
                let name = item.name.strip_prefix(&prefix).unwrap_or(&item.name);
                if !name.is_empty() {
                    listing.items.push(name.to_string());
                }
            }
            page_token = parsed.next_page_token;
            if page_token.is_none() {
                break;
            }
        }
        Ok(listing)
    }

    async fn download_url(&self, path: &str) -> Result<String, StoreError> {
        #[derive(Deserialize)]
        struct ObjectMetadata {
            #[serde(rename = "downloadTokens")]
            download_tokens: Option<String>,
        }

        let object_url = format!(
            "{}/b/{}/o/{}",
            STORAGE_BASE,
            self.cfg.bucket,
            encode_object_path(path)
        );
        let mut builder = self.client.get(&object_url);
        if let Some(key) = &self.cfg.api_key {
            builder = builder.query(&[("key", key.as_str())]);
        }
        let resp = builder
            .send()
            .await
            .map_err(|e| StoreError::RequestFailed(e.to_string()))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::RequestFailed(format!(
                "status {} body {:?}",
                status, body
            )));
        }
        let meta: ObjectMetadata = resp
            .json()
            .await
            .map_err(|e| StoreError::RequestFailed(e.to_string()))?;
        match meta.download_tokens.as_deref().and_then(|t| t.split(',').next()) {
            Some(token) if !token.is_empty() => {
                Ok(format!("{}?alt=media&token={}", object_url, token))
            }
            _ => Ok(format!("{}?alt=media", object_url)),
        }
    }
}

fn decode_lenient<T: serde::de::DeserializeOwned>(raw: Vec<Value>) -> Vec<T> {
    let mut out = Vec::with_capacity(raw.len());
    for value in raw {
        match serde_json::from_value(value) {
            Ok(doc) => out.push(doc),
            Err(e) => debug!("skipping undecodable document: {}", e),
        }
    }
    out
}

/// Percent-encode a storage object path for use as a single URL segment.
/// The `/` separators must be encoded too (`a/b/0.jpg` -> `a%2Fb%2F0.jpg`).
fn encode_object_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for byte in path.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

fn encode_fields(map: &Map<String, Value>) -> Value {
    let mut fields = Map::new();
    for (key, value) in map {
        fields.insert(key.clone(), encode_value(key, value));
    }
    Value::Object(fields)
}

fn encode_value(key: &str, value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if n.is_f64() {
                json!({ "doubleValue": n })
            } else {
                // Firestore integers travel as strings.
                json!({ "integerValue": n.to_string() })
            }
        }
        Value::String(s) => {
            if TIMESTAMP_FIELDS.contains(&key) {
                json!({ "timestampValue": s })
            } else {
                json!({ "stringValue": s })
            }
        }
        Value::Array(values) => {
            let encoded: Vec<Value> = values.iter().map(|v| encode_value("", v)).collect();
            json!({ "arrayValue": { "values": encoded } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

fn decode_fields(fields: &Map<String, Value>) -> Value {
    let mut out = Map::new();
    for (key, value) in fields {
        out.insert(key.clone(), decode_value(value));
    }
    Value::Object(out)
}

fn decode_value(value: &Value) -> Value {
    let Some(obj) = value.as_object() else {
        return Value::Null;
    };
    if let Some(s) = obj.get("stringValue").and_then(Value::as_str) {
        return Value::String(s.to_string());
    }
    if let Some(s) = obj.get("timestampValue").and_then(Value::as_str) {
        return Value::String(s.to_string());
    }
    if let Some(s) = obj.get("integerValue") {
        // Arrives as a string; fall back to the raw form if it is not.
        if let Some(n) = s.as_str().and_then(|s| s.parse::<i64>().ok()) {
            return json!(n);
        }
        return s.clone();
    }
    if let Some(n) = obj.get("doubleValue") {
        return n.clone();
    }
    if let Some(b) = obj.get("booleanValue") {
        return b.clone();
    }
    if obj.contains_key("nullValue") {
        return Value::Null;
    }
    if let Some(map) = obj
        .get("mapValue")
        .and_then(|m| m.get("fields"))
        .and_then(Value::as_object)
    {
        return decode_fields(map);
    }
    if let Some(values) = obj
        .get("arrayValue")
        .and_then(|a| a.get("values"))
        .and_then(Value::as_array)
    {
        return Value::Array(values.iter().map(decode_value).collect());
    }
    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn firestore_values_round_trip() {
        let doc = json!({
            "answer": "3",
            "timestamp": "2025-11-02T10:15:00Z",
            "image": { "dataset": "A", "folder": "f1" },
            "totalQuestions": 1,
            "answers": [ { "answer": "Unknown" } ],
        });
        let encoded = encode_fields(doc.as_object().unwrap());
        let decoded = decode_fields(encoded.as_object().unwrap());
        assert_eq!(decoded, doc);
    }

    #[test]
    fn timestamp_fields_use_timestamp_value() {
        let encoded = encode_value("completedAt", &json!("2025-11-02T10:15:00Z"));
        assert!(encoded.get("timestampValue").is_some());
        let encoded = encode_value("answer", &json!("5"));
        assert!(encoded.get("stringValue").is_some());
    }

    #[test]
    fn object_paths_encode_separators() {
        assert_eq!(encode_object_path("A/f 1/0.jpg"), "A%2Ff%201%2F0.jpg");
    }
}
