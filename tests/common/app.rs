//! Test application factory for integration tests.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tower::ServiceExt;

use umlserve::models::{AppConfig, RendererConfig};
use umlserve::server::{build_router, create_app_state, AppState};

/// Test application with router and its own temporary directories
pub struct TestApp {
    router: axum::Router,
    pub state: AppState,
    pub save_dir: PathBuf,
    pub work_dir: PathBuf,
    dir: TempDir,
}

impl TestApp {
    /// Create a test app whose renderer runs the given shell script body
    pub fn with_script(script: &str) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let script_path = dir.path().join("renderer.sh");
        std::fs::write(&script_path, format!("#!/bin/sh\n{script}\n"))
            .expect("Failed to write renderer script");

        let renderer = RendererConfig {
            command: "sh".to_string(),
            args: vec![script_path.display().to_string()],
            timeout_secs: 10,
        };
        Self::with_renderer(dir, renderer)
    }

    /// Create a test app whose renderer command cannot be started
    pub fn with_missing_renderer() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let renderer = RendererConfig {
            command: super::fixtures::MISSING_COMMAND.to_string(),
            args: vec![],
            timeout_secs: 10,
        };
        Self::with_renderer(dir, renderer)
    }

    /// Create a test app with a script renderer and a custom timeout
    pub fn with_script_and_timeout(script: &str, timeout_secs: u64) -> Self {
        let app = Self::with_script(script);
        let mut config = app.config();
        config.renderer.timeout_secs = timeout_secs;
        Self::from_config(app.dir, config)
    }

    fn with_renderer(dir: TempDir, renderer: RendererConfig) -> Self {
        let config = AppConfig {
            renderer,
            save_dir: dir.path().join("saved_diagrams"),
            work_dir: dir.path().join("work"),
        };
        Self::from_config(dir, config)
    }

    fn from_config(dir: TempDir, config: AppConfig) -> Self {
        let state = create_app_state(&config).expect("Failed to create app state");
        let router = build_router(state.clone());

        Self {
            router,
            state,
            save_dir: config.save_dir,
            work_dir: config.work_dir,
            dir,
        }
    }

    /// Configuration equivalent to the one this app was built from
    pub fn config(&self) -> AppConfig {
        AppConfig {
            renderer: self.state.renderer.config().clone(),
            save_dir: self.save_dir.clone(),
            work_dir: self.work_dir.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Router clone, e.g. for serving over a real socket
    pub fn router(&self) -> axum::Router {
        self.router.clone()
    }

    /// Make a GET request to the given path
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(Request::get(path).body(Body::empty()).unwrap())
            .await
    }

    /// Make a POST request with JSON body
    pub async fn post_json(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::post(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.request(request).await
    }

    /// POST `{"uml": text}` to the given path
    pub async fn post_uml(&self, path: &str, text: &str) -> TestResponse {
        let body = serde_json::json!({ "uml": text }).to_string();
        self.post_json(path, &body).await
    }

    /// Send a request to the router
    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Files currently in the save directory, sorted by name
    pub fn saved_files(&self) -> Vec<String> {
        list_dir(&self.save_dir)
    }

    /// Entries currently in the scratch work directory
    pub fn work_entries(&self) -> Vec<String> {
        list_dir(&self.work_dir)
    }
}

fn list_dir(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}

/// Test response with convenience methods
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Parse body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse JSON response")
    }

    /// Get body as string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Get raw body bytes
    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    /// Check if response starts with the PNG signature
    pub fn is_png(&self) -> bool {
        self.body.len() >= 8 && &self.body[0..8] == b"\x89PNG\r\n\x1a\n"
    }
}
