use reqwest::Client;

use crate::core::record::{TaskRecord, decode_records};
use crate::error::{Error, Result};

/// Somewhere a baseline set of task records can be fetched from.
#[allow(async_fn_in_trait)]
pub trait TaskSource {
    async fn fetch_records(&self) -> Result<Vec<TaskRecord>>;
}

/// Fetches the baseline task feed from a fixed URL with a plain GET.
///
/// No authentication, pagination, retry or timeout.
pub struct RemoteLoader {
    url: String,
    http: Client,
}

impl RemoteLoader {
    pub fn new(url: &str) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("tasklist/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(url, http))
    }

    pub fn with_client(url: &str, http: Client) -> Self {
        Self {
            url: url.trim().to_string(),
            http,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl TaskSource for RemoteLoader {
    async fn fetch_records(&self) -> Result<Vec<TaskRecord>> {
        log::info!("Fetching tasks from {}", self.url);
        let resp = self
            .http
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status(status));
        }

        let body = resp.text().await?;
        let records = decode_records(&body)?;
        log::info!("Fetched {} task records", records.len());
        Ok(records)
    }
}

/// A fixed in-memory feed.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    pub records: Vec<TaskRecord>,
}

impl StaticSource {
    pub fn new(records: Vec<TaskRecord>) -> Self {
        Self { records }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(decode_records(json)?))
    }
}

impl TaskSource for StaticSource {
    async fn fetch_records(&self) -> Result<Vec<TaskRecord>> {
        Ok(self.records.clone())
    }
}

/// A feed that always fails, as an unreachable endpoint would.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnreachableSource;

impl TaskSource for UnreachableSource {
    async fn fetch_records(&self) -> Result<Vec<TaskRecord>> {
        Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "remote unreachable",
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, TaskStorage};
    use crate::store::TaskStore;
    use chrono::{NaiveDate, NaiveDateTime};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answer a single request on a local port with `status` and `body`.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{}/tasks.json", addr)
    }

    fn local_loader(url: &str) -> RemoteLoader {
        let http = Client::builder().no_proxy().build().unwrap();
        RemoteLoader::with_client(url, http)
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn store_with_saved_tasks() -> TaskStore<MemoryStore> {
        let mut backend = MemoryStore::new();
        backend.insert(
            "tasks",
            r#"[{"id":2,"category":1,"content":"saved","user":"Dana"},{"id":9,"category":2}]"#,
        );
        TaskStore::new(TaskStorage::new(backend, "tasks"))
    }

    #[tokio::test]
    async fn static_source_yields_its_records() {
        let source =
            StaticSource::from_json(r#"[{"id":1,"category":1},{"id":2,"category":2}]"#).unwrap();
        assert_eq!(source.fetch_records().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unreachable_source_errors() {
        assert!(UnreachableSource.fetch_records().await.is_err());
    }

    #[test]
    fn loader_trims_url() {
        let loader = RemoteLoader::new("  https://example.com/tasks.json \n").unwrap();
        assert_eq!(loader.url(), "https://example.com/tasks.json");
    }

    #[tokio::test]
    async fn loader_decodes_a_successful_response() {
        let url = serve_once("200 OK", r#"[{"id":1,"category":1},{"id":"x","category":2}]"#).await;
        let records = local_loader(&url).fetch_records().await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn loader_reports_error_status() {
        let url = serve_once("500 Internal Server Error", "").await;
        let result = local_loader(&url).fetch_records().await;
        assert!(matches!(
            result,
            Err(Error::Status(status)) if status == reqwest::StatusCode::INTERNAL_SERVER_ERROR
        ));
    }

    #[tokio::test]
    async fn loader_rejects_a_body_that_is_not_json() {
        let url = serve_once("200 OK", "not json").await;
        let result = local_loader(&url).fetch_records().await;
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[tokio::test]
    async fn server_error_still_restores_saved_tasks() {
        let url = serve_once("500 Internal Server Error", "").await;
        let mut store = store_with_saved_tasks();
        store.load(&local_loader(&url), now()).await;
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(2u64).unwrap().content, "saved");
        assert_eq!(store.next_id(), Some(10));
    }

    #[tokio::test]
    async fn malformed_feed_still_restores_saved_tasks() {
        let url = serve_once("200 OK", "<html>oops</html>").await;
        let mut store = store_with_saved_tasks();
        store.load(&local_loader(&url), now()).await;
        assert_eq!(store.len(), 2);
        assert_eq!(store.next_id(), Some(10));
    }
}
