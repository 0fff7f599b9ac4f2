//! VisionProbe HTTP server
//!
//! Actix-web UI: a three-tab page (image analysis, text completion, model
//! pull) backed by JSON endpoints that always answer with display text.

pub mod render;
pub mod routes;
pub mod state;
pub mod types;

use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::sync::Arc;
use tracing::info;
use tracing_actix_web::TracingLogger;
use visionprobe_common::{AppConfig, Result};

pub use state::AppState;

/// Largest JSON body accepted (prompts can be long)
const JSON_LIMIT: usize = 1024 * 1024;

/// Register every route
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().limit(JSON_LIMIT))
        .service(routes::index::index)
        .service(routes::system::health)
        .service(routes::system::get_config)
        .service(routes::analyze::analyze)
        .service(routes::complete::complete)
        .service(routes::pull::pull);
}

/// Bind the UI server
///
/// The socket is listening when this returns; await the server to handle
/// requests until shutdown.
pub fn bind_server(config: AppConfig) -> Result<Server> {
    let bind_addr = config.server_bind_address();
    let state = Arc::new(AppState::new(config)?);

    info!("UI server listening on http://{}", bind_addr);
    info!(
        "Default Ollama server: {}, model: {}",
        state.config.ollama_base_url, state.config.model
    );

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(configure)
    })
    .bind(&bind_addr)?
    .run();

    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::CONTENT_TYPE;
    use actix_web::test;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use crate::types::{ConfigResponse, HealthResponse, ResultResponse};

    /// Fake Ollama answering each connection with the next canned response
    async fn fake_ollama(responses: Vec<(&'static str, &'static str)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            for (status_line, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                drain_request(&mut socket).await;
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
        });

        format!("http://{}", addr)
    }

    async fn drain_request(socket: &mut tokio::net::TcpStream) {
        let mut data = Vec::new();
        let mut buf = [0u8; 8192];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            data.extend_from_slice(&buf[..n]);

            let text = String::from_utf8_lossy(&data).to_string();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|l| {
                        l.to_ascii_lowercase()
                            .strip_prefix("content-length:")
                            .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                    })
                    .unwrap_or(0);
                if data.len() >= header_end + 4 + content_length {
                    return;
                }
            }
        }
    }

    fn test_state(config: AppConfig) -> web::Data<Arc<AppState>> {
        web::Data::new(Arc::new(AppState::new(config).unwrap()))
    }

    fn multipart_body(fields: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, filename, data) in fields {
            body.extend_from_slice(b"--XBOUNDARY\r\n");
            match filename {
                Some(filename) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                        name, filename
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                ),
            }
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(b"--XBOUNDARY--\r\n");
        body
    }

    #[actix_web::test]
    async fn test_index_page() {
        let app = test::init_service(
            App::new()
                .app_data(test_state(AppConfig::default()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/").to_request();
        let body = test::call_and_read_body(&app, req).await;
        let html = String::from_utf8_lossy(&body);
        assert!(html.contains("Image Analysis"));
        assert!(html.contains("Text Completion"));
        assert!(html.contains("Model Pull"));
    }

    #[actix_web::test]
    async fn test_health_and_config() {
        let config = AppConfig {
            tesseract_path: "/nonexistent/tesseract".to_string(),
            ..AppConfig::default()
        };
        let app = test::init_service(App::new().app_data(test_state(config)).configure(configure)).await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let health: HealthResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(health.status, "ok");

        let req = test::TestRequest::get().uri("/api/config").to_request();
        let config: ConfigResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(config.server_url, "http://localhost:11434");
        assert_eq!(config.default_runs, 2);
        assert_eq!(config.max_runs, 10);
        assert!(!config.ocr_available);
    }

    #[actix_web::test]
    async fn test_complete_returns_text() {
        let url = fake_ollama(vec![(
            "200 OK",
            "{\"response\":\"Hello\"}\n{\"response\":\" there\",\"done\":true}\n",
        )])
        .await;
        let app = test::init_service(
            App::new()
                .app_data(test_state(AppConfig::default()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/complete")
            .set_json(serde_json::json!({"prompt": "Say hello", "server_url": url, "model": "llama3.2"}))
            .to_request();
        let response: ResultResponse = test::call_and_read_body_json(&app, req).await;
        assert!(response.ok);
        assert_eq!(response.result, "Hello there");
    }

    #[actix_web::test]
    async fn test_complete_shows_status_error_as_result() {
        let url = fake_ollama(vec![("404 Not Found", "not found")]).await;
        let app = test::init_service(
            App::new()
                .app_data(test_state(AppConfig::default()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/complete")
            .set_json(serde_json::json!({"prompt": "hi", "server_url": url}))
            .to_request();
        let response: ResultResponse = test::call_and_read_body_json(&app, req).await;
        assert!(!response.ok);
        assert_eq!(
            response.result,
            "Error: Server returned status code 404. Response content: not found"
        );
    }

    #[actix_web::test]
    async fn test_pull_returns_status_log() {
        let url = fake_ollama(vec![(
            "200 OK",
            "{\"status\":\"downloading\"}\n{\"status\":\"verifying\"}\n",
        )])
        .await;
        let app = test::init_service(
            App::new()
                .app_data(test_state(AppConfig::default()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/pull")
            .set_json(serde_json::json!({"model": "llava", "server_url": url}))
            .to_request();
        let response: ResultResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(response.result, "downloading\nverifying\n");
    }

    #[actix_web::test]
    async fn test_pull_rejects_bad_url() {
        let app = test::init_service(
            App::new()
                .app_data(test_state(AppConfig::default()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/pull")
            .set_json(serde_json::json!({"model": "llava", "server_url": "ftp://nope"}))
            .to_request();
        let response: ResultResponse = test::call_and_read_body_json(&app, req).await;
        assert!(!response.ok);
        assert!(response.result.starts_with("Error: Configuration error"));
    }

    #[actix_web::test]
    async fn test_analyze_runs_and_ocr_error() {
        let url = fake_ollama(vec![
            ("200 OK", "{\"response\":\"first\"}\n"),
            ("200 OK", "{\"response\":\"second\"}\n"),
        ])
        .await;
        let config = AppConfig {
            tesseract_path: "/nonexistent/tesseract".to_string(),
            ..AppConfig::default()
        };
        let app = test::init_service(App::new().app_data(test_state(config)).configure(configure)).await;

        let body = multipart_body(&[
            ("image", Some("cat.png"), b"not-really-a-png"),
            ("runs", None, b"2"),
            ("ocr", None, b"true"),
            ("server_url", None, url.as_bytes()),
            ("model", None, b"llava"),
        ]);
        let req = test::TestRequest::post()
            .uri("/api/analyze")
            .insert_header((CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY"))
            .set_payload(body)
            .to_request();
        let response: ResultResponse = test::call_and_read_body_json(&app, req).await;

        assert!(response.ok, "{}", response.result);
        assert!(response.result.starts_with("## OCR Text\nOCR Error: Failed to run"));
        let run1 = response.result.find("### Run 1\nfirst").unwrap();
        let run2 = response.result.find("### Run 2\nsecond").unwrap();
        assert!(run1 < run2);
    }

    #[actix_web::test]
    async fn test_analyze_second_run_failure_discards_first() {
        let url = fake_ollama(vec![
            ("200 OK", "{\"response\":\"first\"}\n"),
            ("500 Internal Server Error", "out of memory"),
        ])
        .await;
        let app = test::init_service(
            App::new()
                .app_data(test_state(AppConfig::default()))
                .configure(configure),
        )
        .await;

        let body = multipart_body(&[
            ("image", Some("cat.png"), b"png"),
            ("runs", None, b"2"),
            ("server_url", None, url.as_bytes()),
        ]);
        let req = test::TestRequest::post()
            .uri("/api/analyze")
            .insert_header((CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY"))
            .set_payload(body)
            .to_request();
        let response: ResultResponse = test::call_and_read_body_json(&app, req).await;

        assert!(!response.ok);
        assert_eq!(
            response.result,
            "Error: Server returned status code 500. Response content: out of memory"
        );
    }

    #[actix_web::test]
    async fn test_analyze_rejects_run_count_out_of_range() {
        let app = test::init_service(
            App::new()
                .app_data(test_state(AppConfig::default()))
                .configure(configure),
        )
        .await;

        let body = multipart_body(&[("image", Some("cat.png"), b"png"), ("runs", None, b"11")]);
        let req = test::TestRequest::post()
            .uri("/api/analyze")
            .insert_header((CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY"))
            .set_payload(body)
            .to_request();
        let response: ResultResponse = test::call_and_read_body_json(&app, req).await;

        assert!(!response.ok);
        assert!(response.result.contains("Number of runs must be between 1 and 10"));
    }
}
