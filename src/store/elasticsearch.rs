//! Elasticsearch backend over its REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};

use super::{DocumentStore, SearchHits, StoredHit, StoreError};
use crate::config::USER_AGENT;
use crate::models::EnrichedDocument;

/// Talks to one index on one cluster.
pub struct ElasticsearchStore {
    client: Client,
    base_url: String,
    index: String,
}

impl ElasticsearchStore {
    pub fn new(base_url: &str, index: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .gzip(true)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            index: index.to_string(),
        })
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    fn index_url(&self) -> String {
        format!("{}/{}", self.base_url, self.index)
    }

    fn doc_url(&self, id: &str) -> String {
        format!("{}/_doc/{}", self.index_url(), urlencoding::encode(id))
    }

    async fn index_exists(&self) -> Result<bool, StoreError> {
        let response = self.client.head(self.index_url()).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            s if s.is_success() => Ok(true),
            _ => Err(status_error(response).await),
        }
    }
}

async fn status_error(response: Response) -> StoreError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    StoreError::Status { status, body }
}

async fn expect_success(response: Response) -> Result<Response, StoreError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(status_error(response).await)
    }
}

/// Settings and field mappings for a new index.
pub fn index_definition() -> Value {
    let folded_text = json!({ "type": "text", "analyzer": "portuguese_folded" });
    let keyword_and_text = json!({
        "type": "text",
        "analyzer": "portuguese_folded",
        "fields": { "keyword": { "type": "keyword" } }
    });

    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 0,
            "analysis": {
                "analyzer": {
                    "portuguese_folded": {
                        "type": "custom",
                        "tokenizer": "standard",
                        "filter": ["lowercase", "asciifolding", "portuguese_stop", "portuguese_stemmer"]
                    }
                },
                "filter": {
                    "portuguese_stop": { "type": "stop", "stopwords": "_portuguese_" },
                    "portuguese_stemmer": { "type": "stemmer", "language": "portuguese" }
                }
            }
        },
        "mappings": {
            "properties": {
                "id": { "type": "keyword" },
                "source_id": { "type": "keyword" },
                "filename": { "type": "keyword" },
                "title": keyword_and_text,
                "author": keyword_and_text,
                "year": { "type": "integer" },
                "region": { "type": "keyword" },
                "source_url": { "type": "keyword", "index": false },
                "pdf_location": { "type": "keyword", "index": false },
                "full_text": folded_text,
                "extraction_method": { "type": "keyword" },
                "processed_at": { "type": "date" },
                "entities": {
                    "properties": {
                        "dates": {
                            "type": "nested",
                            "properties": {
                                "kind": { "type": "keyword" },
                                "year": { "type": "integer" },
                                "year_end": { "type": "integer" },
                                "century": { "type": "keyword" },
                                "period_label": { "type": "keyword" },
                                "position": { "type": "integer" },
                                "confidence": { "type": "float" }
                            }
                        },
                        "names": {
                            "type": "nested",
                            "properties": {
                                "first_name": { "type": "keyword" },
                                "last_name": { "type": "keyword" },
                                "full_name": keyword_and_text,
                                "confidence": { "type": "float" }
                            }
                        },
                        "places": {
                            "type": "nested",
                            "properties": {
                                "location": { "type": "keyword" },
                                "region": { "type": "keyword" },
                                "match_kind": { "type": "keyword" },
                                "confidence": { "type": "float" }
                            }
                        },
                        "themes": {
                            "type": "nested",
                            "properties": {
                                "category": { "type": "keyword" },
                                "matched_keywords": { "type": "keyword" },
                                "occurrence_count": { "type": "integer" },
                                "relevance_score": { "type": "float" }
                            }
                        }
                    }
                },
                "summary": { "type": "object", "enabled": false },
                "text_statistics": { "type": "object", "enabled": false }
            }
        }
    })
}

/// Read `hits` from a search response. `hits.total` is an object in
/// current clusters and a bare number in old ones.
fn parse_hits(body: &Value) -> SearchHits {
    let hits = &body["hits"];
    let total = hits["total"]["value"]
        .as_u64()
        .or_else(|| hits["total"].as_u64())
        .unwrap_or(0);
    let hits = hits["hits"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|hit| StoredHit {
                    id: hit["_id"].as_str().unwrap_or_default().to_string(),
                    score: hit["_score"].as_f64(),
                    source: hit["_source"].clone(),
                })
                .collect()
        })
        .unwrap_or_default();
    SearchHits { total, hits }
}

#[async_trait]
impl DocumentStore for ElasticsearchStore {
    fn name(&self) -> &'static str {
        "elasticsearch"
    }

    async fn prepare(&self, force_recreate: bool) -> Result<(), StoreError> {
        if self.index_exists().await? {
            if !force_recreate {
                tracing::info!(index = %self.index, "Index already exists");
                return Ok(());
            }
            tracing::info!(index = %self.index, "Deleting existing index");
            expect_success(self.client.delete(self.index_url()).send().await?).await?;
        }

        expect_success(
            self.client
                .put(self.index_url())
                .json(&index_definition())
                .send()
                .await?,
        )
        .await?;
        tracing::info!(index = %self.index, "Created index");
        Ok(())
    }

    async fn put(&self, id: &str, document: &EnrichedDocument) -> Result<(), StoreError> {
        let response = self.client.put(self.doc_url(id)).json(document).send().await?;
        expect_success(response).await?;
        tracing::debug!(id, index = %self.index, "Indexed document");
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<EnrichedDocument>, StoreError> {
        let response = self.client.get(self.doc_url(id)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: Value = expect_success(response).await?.json().await?;
        Ok(Some(serde_json::from_value(body["_source"].clone())?))
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let response = self.client.delete(self.doc_url(id)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        expect_success(response).await?;
        Ok(true)
    }

    async fn search(&self, query: &Value) -> Result<SearchHits, StoreError> {
        let url = format!("{}/_search", self.index_url());
        let response = self.client.post(url).json(query).send().await?;
        let body: Value = expect_success(response).await?.json().await?;
        Ok(parse_hits(&body))
    }

    async fn health(&self) -> Result<String, StoreError> {
        let url = format!("{}/_cluster/health", self.base_url);
        let response = self.client.get(url).send().await?;
        let body: Value = expect_success(response).await?.json().await?;
        Ok(body["status"].as_str().unwrap_or("unknown").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::document;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answer one request with `status` and `body`, returning the raw request.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let length = text[..head_end]
                        .lines()
                        .find_map(|l| {
                            l.to_ascii_lowercase()
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap())
                        })
                        .unwrap_or(0);
                    if request.len() >= head_end + 4 + length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });
        (format!("http://{}", addr), handle)
    }

    fn store(url: &str) -> ElasticsearchStore {
        ElasticsearchStore::new(url, "historical_documents", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_put_uses_encoded_doc_url() {
        let (url, request) = serve_once("201 Created", r#"{"result":"created"}"#).await;
        store(&url)
            .put("carta 1532", &document("carta_1532", "Carta", "texto"))
            .await
            .unwrap();
        let request = request.await.unwrap();
        assert!(request.starts_with("PUT /historical_documents/_doc/carta%201532 HTTP/1.1"));
        assert!(request.contains("\"title\":\"Carta\""));
    }

    #[tokio::test]
    async fn test_put_error_status_is_store_error() {
        let (url, _request) = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#).await;
        let err = store(&url)
            .put("a", &document("a", "t", "x"))
            .await
            .unwrap_err();
        match err {
            StoreError::Status { status, body } => {
                assert_eq!(status, 500);
                assert!(body.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let (url, _request) = serve_once("404 Not Found", r#"{"found":false}"#).await;
        assert_eq!(store(&url).get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_health_reads_status() {
        let (url, request) = serve_once("200 OK", r#"{"status":"yellow"}"#).await;
        assert_eq!(store(&url).health().await.unwrap(), "yellow");
        assert!(request.await.unwrap().starts_with("GET /_cluster/health"));
    }

    #[test]
    fn test_parse_hits_both_total_shapes() {
        let body = json!({
            "hits": {
                "total": { "value": 2, "relation": "eq" },
                "hits": [
                    { "_id": "a", "_score": 1.5, "_source": { "title": "Carta" } },
                    { "_id": "b", "_score": null, "_source": {} }
                ]
            }
        });
        let hits = parse_hits(&body);
        assert_eq!(hits.total, 2);
        assert_eq!(hits.hits[0].score, Some(1.5));
        assert_eq!(hits.hits[1].score, None);
        assert_eq!(hits.hits[0].source["title"], "Carta");

        let legacy = json!({ "hits": { "total": 7, "hits": [] } });
        assert_eq!(parse_hits(&legacy).total, 7);
    }

    #[test]
    fn test_index_definition_maps_entities_as_nested() {
        let definition = index_definition();
        let entities = &definition["mappings"]["properties"]["entities"]["properties"];
        for kind in ["dates", "names", "places", "themes"] {
            assert_eq!(entities[kind]["type"], "nested");
        }
    }
}
