use crate::error::{Result, SnapshotError};
use crate::site::Locale;
use futures::future::join_all;
use std::time::Duration;

/// One unit of snapshot work: fetch the rendered page for a single
/// locale/controller pair from the locally-running application.
#[derive(Debug, Clone)]
pub struct PageTask {
    pub locale: Locale,
    pub controller: String,
    pub endpoint_url: String,
}

impl PageTask {
    pub fn new(locale: Locale, controller: String, endpoint_url: String) -> Self {
        Self {
            locale,
            controller,
            endpoint_url,
        }
    }

    /// Filename the page is exported under, e.g. `about.html` or `fr_about.html`.
    pub fn output_filename(&self) -> String {
        format!(
            "{}{}.html",
            self.locale.file_prefix(),
            self.controller.to_lowercase()
        )
    }
}

/// Outcome of one page fetch. Created once the request settles, never mutated
/// afterwards; a failed fetch carries its error and an empty body.
#[derive(Debug)]
pub struct FetchResult {
    pub task: PageTask,
    pub body: String,
    pub error: Option<SnapshotError>,
}

impl FetchResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Fetches batches of pages concurrently against the local application.
///
/// All tasks in a batch are issued at once and the call returns only after
/// every request has settled; a per-task failure (connection refused, non-2xx
/// status, timeout) is recorded in its `FetchResult` and never aborts sibling
/// requests. There is no retry.
pub struct SnapshotFetcher {
    client: reqwest::Client,
}

impl SnapshotFetcher {
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| SnapshotError::Config {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }

    /// Fetch every task concurrently, returning one result per task in task
    /// order. Blocks until the whole batch has settled.
    pub async fn fetch_all(&self, tasks: Vec<PageTask>, host_header: &str) -> Vec<FetchResult> {
        let fetches = tasks
            .into_iter()
            .map(|task| self.fetch_one(task, host_header));
        join_all(fetches).await
    }

    async fn fetch_one(&self, task: PageTask, host_header: &str) -> FetchResult {
        match self.request_page(&task.endpoint_url, host_header).await {
            Ok(body) => FetchResult {
                task,
                body,
                error: None,
            },
            Err(error) => FetchResult {
                task,
                body: String::new(),
                error: Some(error),
            },
        }
    }

    async fn request_page(&self, url: &str, host_header: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::HOST, host_header)
            .send()
            .await
            .map_err(|e| SnapshotError::Fetch {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SnapshotError::Fetch {
                url: url.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        response.text().await.map_err(|e| SnapshotError::Fetch {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Minimal HTTP stub: serves `200` with a body naming the path, except
    /// paths containing "missing", which get a `404`.
    async fn spawn_stub_server() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    let n = stream.read(&mut buf).await.unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..n]).into_owned();
                    let path = request
                        .split_whitespace()
                        .nth(1)
                        .unwrap_or("/")
                        .to_string();

                    let response = if path.contains("missing") {
                        "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                            .to_string()
                    } else {
                        let body = format!("<html>page {}</html>", path);
                        format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        )
                    };
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        addr
    }

    fn task_for(addr: SocketAddr, controller: &str) -> PageTask {
        PageTask::new(
            Locale::new("default", true),
            controller.to_string(),
            format!("http://{}/{}", addr, controller),
        )
    }

    #[tokio::test]
    async fn test_fetch_all_returns_one_result_per_task() {
        let addr = spawn_stub_server().await;
        let fetcher = SnapshotFetcher::new(Duration::from_secs(5)).unwrap();

        let tasks = vec![
            task_for(addr, "home"),
            task_for(addr, "missing"),
            task_for(addr, "about"),
        ];
        let results = fetcher.fetch_all(tasks, "example.com").await;

        assert_eq!(results.len(), 3);
        let failures: Vec<_> = results.iter().filter(|r| !r.is_ok()).collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].task.controller, "missing");
        assert!(failures[0].body.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_all_preserves_task_order() {
        let addr = spawn_stub_server().await;
        let fetcher = SnapshotFetcher::new(Duration::from_secs(5)).unwrap();

        let tasks = vec![task_for(addr, "home"), task_for(addr, "about")];
        let results = fetcher.fetch_all(tasks, "example.com").await;

        assert_eq!(results[0].task.controller, "home");
        assert_eq!(results[1].task.controller, "about");
        assert!(results[0].body.contains("/home"));
        assert!(results[1].body.contains("/about"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_per_task() {
        let fetcher = SnapshotFetcher::new(Duration::from_secs(1)).unwrap();

        // Bind then drop to get a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let results = fetcher
            .fetch_all(vec![task_for(addr, "home")], "example.com")
            .await;
        assert_eq!(results.len(), 1);
        assert!(matches!(
            results[0].error,
            Some(SnapshotError::Fetch { .. })
        ));
    }

    #[test]
    fn test_output_filename() {
        let default = PageTask::new(
            Locale::new("default", true),
            "Home".to_string(),
            String::new(),
        );
        assert_eq!(default.output_filename(), "home.html");

        let localized = PageTask::new(Locale::new("fr", false), "about".to_string(), String::new());
        assert_eq!(localized.output_filename(), "fr_about.html");
    }
}
