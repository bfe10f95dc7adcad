#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use pdfconv::accounts::{CredentialStore, ResetTokenStore};
use pdfconv::config::{
    Config, ConverterConfig, RegistrationMode, StorageBackend, StorageConfig,
};
use pdfconv::storage::MemoryStorage;

pub const PASSWORD: &str = "Passw0rd!";

/// Stand-in for the office binary. Writes a tiny PDF named after the input.
pub const CONVERTER_OK: &str = r#"#!/bin/sh
outdir=""
input=""
while [ $# -gt 0 ]; do
  case "$1" in
    --version) echo "LibreOffice 7.6.4.1 test-build"; exit 0 ;;
    --outdir) outdir="$2"; shift ;;
    --convert-to) shift ;;
    -*) ;;
    *) input="$1" ;;
  esac
  shift
done
name=$(basename "$input")
printf '%%PDF-1.4\n%% converted from %s\n' "$name" > "$outdir/${name%.*}.pdf"
"#;

/// Exits non-zero with a diagnostic on stderr.
pub const CONVERTER_FAILS: &str = r#"#!/bin/sh
echo "Error: source file could not be loaded" >&2
exit 77
"#;

/// Exits zero without writing anything.
pub const CONVERTER_NO_OUTPUT: &str = r#"#!/bin/sh
exit 0
"#;

/// A throwaway directory under the system temp dir, removed on drop.
pub struct TempDir(pub PathBuf);

impl TempDir {
    pub fn new(prefix: &str) -> Self {
        let path = std::env::temp_dir().join(format!("{prefix}-{}", Uuid::now_v7()));
        std::fs::create_dir_all(&path).expect("create temp dir");
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

/// Writes an executable shell script and returns its path.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, body).expect("write script");
    let mut perms = std::fs::metadata(&path).expect("script metadata").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("chmod script");
    path
}

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
    pub storage: Arc<MemoryStorage>,
    pub work_dir: TempDir,
    pub bin_dir: TempDir,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn credentials(&self) -> CredentialStore {
        CredentialStore::new(self.pool.clone())
    }

    pub fn reset_tokens(&self) -> ResetTokenStore {
        ResetTokenStore::new(self.pool.clone())
    }

    /// Submit the registration form, return (status, location header, body).
    pub async fn register(&self, username: &str, email: &str, password: &str) -> (StatusCode, Option<String>, String) {
        let resp = self
            .client
            .post(self.url("/register"))
            .form(&[("username", username), ("email", email), ("password", password)])
            .send()
            .await
            .expect("register request failed");
        split(resp).await
    }

    /// Submit the login form, return (status, location header, body).
    pub async fn login(&self, username: &str, password: &str) -> (StatusCode, Option<String>, String) {
        let resp = self
            .client
            .post(self.url("/login"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .expect("login request failed");
        split(resp).await
    }

    /// Register and log in, return the session cookie as a `Cookie` header value.
    pub async fn signed_in(&self, username: &str, email: &str) -> String {
        let (status, _, body) = self.register(username, email, PASSWORD).await;
        assert_eq!(status, StatusCode::SEE_OTHER, "register failed: {body}");

        let resp = self
            .client
            .post(self.url("/login"))
            .form(&[("username", username), ("password", PASSWORD)])
            .send()
            .await
            .expect("login request failed");
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "login did not redirect");
        session_cookie(&resp).expect("login did not set a session cookie")
    }

    /// Upload a file to /convert with the given session.
    pub async fn convert(&self, session: &str, filename: &str, data: &[u8]) -> (Value, StatusCode) {
        let part = reqwest::multipart::Part::bytes(data.to_vec()).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let resp = self
            .client
            .post(self.url("/convert"))
            .header("cookie", session)
            .multipart(form)
            .send()
            .await
            .expect("convert request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn get_with_session(&self, path: &str, session: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .header("cookie", session)
            .send()
            .await
            .expect("get request failed")
    }

    /// Waits for the background forgot-password task to store a token.
    pub async fn wait_for_token_rows(&self, email: &str, count: usize) -> Vec<pdfconv::models::PasswordResetToken> {
        for _ in 0..100 {
            let rows = pdfconv::db::password_reset_tokens::list_for_email(&self.pool, email)
                .await
                .expect("list tokens");
            if rows.len() >= count {
                return rows;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("timed out waiting for {count} reset token(s) for {email}");
    }
}

pub async fn split(resp: reqwest::Response) -> (StatusCode, Option<String>, String) {
    let status = resp.status();
    let location = resp
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let body = resp.text().await.unwrap_or_default();
    (status, location, body)
}

/// `session=<jwt>` from a response's Set-Cookie headers.
pub fn session_cookie(resp: &reqwest::Response) -> Option<String> {
    resp.headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .find(|pair| pair.starts_with("session=") && pair.len() > "session=".len())
        .map(|pair| pair.to_string())
}

pub fn test_config(database_url: String, converter_binary: PathBuf, work_dir: PathBuf) -> Config {
    Config {
        database_url,
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        base_url: "http://localhost:0".to_string(),
        registration: RegistrationMode::Open,
        max_upload_size: 1_048_576,
        reset_token_ttl_mins: 60,
        direct_reset: true,
        log_level: "warn".to_string(),
        converter: ConverterConfig {
            binary: converter_binary,
            timeout: Duration::from_secs(10),
            work_dir,
        },
        storage: StorageConfig {
            backend: StorageBackend::Memory,
            download_ttl: Duration::from_secs(300),
        },
        smtp: None,
    }
}

/// Spawn a test app with a fresh temporary database and a working converter.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(CONVERTER_OK, |_| {}).await
}

/// Spawn a test app whose converter runs `script`, letting the caller tweak
/// the config before the server starts.
pub async fn spawn_app_with(script: &str, customize: impl FnOnce(&mut Config)) -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let db_name = format!("pdfconv_test_{}", Uuid::now_v7().to_string().replace('-', ""));

    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let bin_dir = TempDir::new("pdfconv-bin");
    let work_dir = TempDir::new("pdfconv-work");
    let binary = write_script(bin_dir.path(), "soffice", script);

    let mut config = test_config(test_url, binary, work_dir.path().to_path_buf());
    customize(&mut config);

    let storage = Arc::new(MemoryStorage::new("test-bucket"));
    let app = pdfconv::build_app(pool.clone(), config, storage.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        pool,
        client,
        db_name,
        storage,
        work_dir,
        bin_dir,
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");
    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
