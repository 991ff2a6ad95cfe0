//! HTTP endpoint serving the exporter's view of the stick-tables
//!
//! `/metrics` is the Prometheus scrape target and `/tables` is a JSON dump of
//! the latest published generation. Neither fails because collection failed:
//! they serve stale data, or none yet.

use std::convert::Infallible;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::header::CONTENT_TYPE;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use log::{debug, error, info};
use tokio::net::TcpListener;

use crate::error::{ExporterError, Result};
use crate::metrics::MetricsSink;
use crate::storage::PublishedState;

/// Bind the listening socket
pub async fn bind(address: &str) -> Result<TcpListener> {
    TcpListener::bind(address)
        .await
        .map_err(|e| ExporterError::Server(format!("Failed to bind {}: {}", address, e)))
}

/// Request handler shared by every connection
pub struct MetricsServer {
    sink: Arc<MetricsSink>,
    state: Arc<PublishedState>,
}

impl MetricsServer {
    /// Create a new server over the sink and the published state
    pub fn new(sink: Arc<MetricsSink>, state: Arc<PublishedState>) -> Self {
        Self { sink, state }
    }

    /// Accept connections forever
    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> Result<()> {
        info!("Serving metrics on {}", listener.local_addr()?);

        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("Metrics accept error: {}", e);
                    continue;
                }
            };

            let server = Arc::clone(&self);
            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    let server = Arc::clone(&server);
                    async move { Ok::<_, Infallible>(server.handle(req.uri().path())) }
                });

                if let Err(e) = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await
                {
                    debug!("Metrics connection error from {}: {}", peer, e);
                }
            });
        }
    }

    /// Route a request path to its response
    pub fn handle(&self, path: &str) -> Response<Full<Bytes>> {
        match path {
            "/metrics" => self.metrics(),
            "/tables" => self.tables(),
            _ => respond(StatusCode::NOT_FOUND, "text/plain", Bytes::from_static(b"not found")),
        }
    }

    fn metrics(&self) -> Response<Full<Bytes>> {
        match self.sink.render() {
            Ok(body) => respond(StatusCode::OK, &self.sink.content_type(), Bytes::from(body)),
            Err(e) => {
                error!("Failed to encode metrics: {}", e);
                respond(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "text/plain",
                    Bytes::from_static(b"metrics unavailable"),
                )
            }
        }
    }

    fn tables(&self) -> Response<Full<Bytes>> {
        let generation = self.state.load();
        let body = serde_json::json!({ "generation": generation.as_deref() });

        match serde_json::to_vec(&body) {
            Ok(body) => respond(StatusCode::OK, "application/json", Bytes::from(body)),
            Err(e) => {
                error!("Failed to encode tables: {}", e);
                respond(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "text/plain",
                    Bytes::from_static(b"tables unavailable"),
                )
            }
        }
    }
}

fn respond(status: StatusCode, content_type: &str, body: Bytes) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, content_type)
        .body(Full::new(body.clone()))
        .unwrap_or_else(|_| Response::new(Full::new(body)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::GenerationSink;
    use crate::table::{parse_table_dump, Generation};
    use http_body_util::BodyExt;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn server() -> (Arc<MetricsServer>, Arc<MetricsSink>, Arc<PublishedState>) {
        let sink = Arc::new(MetricsSink::new("smveloso", "haproxy").unwrap());
        let state = Arc::new(PublishedState::new());
        let server = Arc::new(MetricsServer::new(Arc::clone(&sink), Arc::clone(&state)));
        (server, sink, state)
    }

    async fn body(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_no_data_yet() {
        let (server, _, _) = server();

        let metrics = server.handle("/metrics");
        assert_eq!(metrics.status(), StatusCode::OK);

        let tables = server.handle("/tables");
        assert_eq!(tables.status(), StatusCode::OK);
        assert_eq!(body(tables).await, r#"{"generation":null}"#);
    }

    #[tokio::test]
    async fn test_serves_published_generation() {
        let (server, sink, state) = server();
        let generation = Generation::new(vec![parse_table_dump(
            "fe_http",
            "# table: fe_http, type: ip, size:1048576, used:1\n\
             0x1: key=10.0.0.1 conn_rate(3000)=40 http_req_rate(10000)=19\n",
        )]);
        let generation = state.publish(generation);
        sink.record(&generation);

        let metrics = body(server.handle("/metrics")).await;
        assert!(metrics.contains("smveloso_haproxy_sticktable_curr_entries{table=\"fe_http\"} 1"));

        let tables: serde_json::Value = serde_json::from_str(&body(server.handle("/tables")).await).unwrap();
        let table = &tables["generation"]["tables"][0];
        assert_eq!(table["name"], "fe_http");
        assert_eq!(table["conn_rate_samples"][0], 40.0);
        assert_eq!(table["http_request_rate_interval"], "10000");
        assert_eq!(table["status"]["state"], "ok");
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let (server, _, _) = server();
        assert_eq!(server.handle("/").status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serves_over_http() {
        let (server, _, _) = server();
        let listener = bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(server.serve(listener));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /tables HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains("application/json"));
        assert!(response.ends_with(r#"{"generation":null}"#));
    }
}
