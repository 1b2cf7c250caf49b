#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};

use chrono::Utc;
use uuid::Uuid;

use devcamp_api::auth::hash_password;
use devcamp_api::config::AppConfig;
use devcamp_api::database::models::{Account, Role};
use devcamp_api::database::MemoryStore;
use devcamp_api::outbound::{Email, GeoPoint, GeocodeError, Geocoder, MailError, Mailer, PhotoStore, PhotoStoreError};
use devcamp_api::state::AppState;

/// Resolves a handful of fixed addresses; anything else is unknown
pub struct FakeGeocoder;

pub const BOSTON: (f64, f64) = (42.350846, -71.104028);
pub const CAMBRIDGE: (f64, f64) = (42.373611, -71.109733);
pub const PROVIDENCE: (f64, f64) = (41.824, -71.4128);

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<GeoPoint>, GeocodeError> {
        let (lat, lng, city, zipcode) = if address.contains("02215") || address.contains("Boston") {
            (BOSTON.0, BOSTON.1, "Boston", "02215")
        } else if address.contains("02139") || address.contains("Cambridge") {
            (CAMBRIDGE.0, CAMBRIDGE.1, "Cambridge", "02139")
        } else if address.contains("02903") || address.contains("Providence") {
            (PROVIDENCE.0, PROVIDENCE.1, "Providence", "02903")
        } else {
            return Ok(None);
        };
        Ok(Some(GeoPoint {
            lat,
            lng,
            formatted_address: format!("1 Main St, {}, MA {}, US", city, zipcode),
            street: "1 Main St".into(),
            city: city.into(),
            state: "MA".into(),
            zipcode: zipcode.into(),
            country: "US".into(),
        }))
    }
}

/// Keeps every message; fails every send when `failing` is set
#[derive(Default)]
pub struct RecordingMailer {
    pub failing: bool,
    pub sent: Mutex<Vec<Email>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        if self.failing {
            return Err(MailError::Transport("smtp unreachable".into()));
        }
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingPhotoStore {
    pub failing: bool,
    pub saved: Mutex<Vec<(String, usize)>>,
}

#[async_trait]
impl PhotoStore for RecordingPhotoStore {
    async fn save(&self, name: &str, bytes: &[u8]) -> Result<(), PhotoStoreError> {
        if self.failing {
            return Err(PhotoStoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")));
        }
        self.saved.lock().unwrap().push((name.to_string(), bytes.len()));
        Ok(())
    }
}

pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
    pub client: reqwest::Client,
    pub mailer: Arc<RecordingMailer>,
    pub photos: Arc<RecordingPhotoStore>,
}

#[derive(Default)]
pub struct Options {
    pub failing_mailer: bool,
    pub failing_photos: bool,
    pub reset_expiry_minutes: Option<i64>,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.session.jwt_secret = "integration-test-secret".into();
    config.session.bcrypt_cost = 4;
    config.uploads.max_bytes = 1024;
    config.filter.debug_logging = false;
    config
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(Options::default()).await
    }

    pub async fn spawn_with(options: Options) -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut config = test_config();
        if let Some(minutes) = options.reset_expiry_minutes {
            config.session.reset_token_expiry_minutes = minutes;
        }

        let mailer = Arc::new(RecordingMailer {
            failing: options.failing_mailer,
            ..Default::default()
        });
        let photos = Arc::new(RecordingPhotoStore {
            failing: options.failing_photos,
            ..Default::default()
        });
        let state = AppState::new(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(FakeGeocoder),
            mailer.clone(),
            photos.clone(),
        );

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
        let app = devcamp_api::app(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let server = Self {
            base_url,
            state,
            client: reqwest::Client::new(),
            mailer,
            photos,
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Registers an account and returns its session token
    pub async fn register(&self, name: &str, email: &str, role: &str) -> Result<String> {
        let res = self
            .client
            .post(self.url("/accounts/register"))
            .json(&json!({"name": name, "email": email, "password": "123456", "role": role}))
            .send()
            .await?;
        let status = res.status();
        let body: Value = res.json().await?;
        anyhow::ensure!(status == StatusCode::OK, "register failed: {} {}", status, body);
        body["token"].as_str().map(str::to_string).context("no token in register response")
    }

    /// Admins cannot self-register, so they are written straight to the store
    pub async fn admin_token(&self, email: &str) -> Result<String> {
        let admin = Account {
            id: Uuid::new_v4(),
            name: "Site Admin".into(),
            email: email.into(),
            role: Role::Admin,
            password: hash_password("123456", 4)?,
            reset_password_token: None,
            reset_password_expire: None,
            created_at: Utc::now(),
        };
        self.state.accounts().insert(&admin).await?;
        self.login(email, "123456").await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let res = self
            .client
            .post(self.url("/accounts/login"))
            .json(&json!({"email": email, "password": password}))
            .send()
            .await?;
        let status = res.status();
        let body: Value = res.json().await?;
        anyhow::ensure!(status == StatusCode::OK, "login failed: {} {}", status, body);
        body["token"].as_str().map(str::to_string).context("no token in login response")
    }

    pub async fn me(&self, token: &str) -> Result<Value> {
        let body: Value = self
            .client
            .get(self.url("/accounts/me"))
            .bearer_auth(token)
            .send()
            .await?
            .json()
            .await?;
        Ok(body["data"].clone())
    }

    /// POST /bootcamps with the given body; returns status and envelope
    pub async fn create_bootcamp(&self, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        let res = self
            .client
            .post(self.url("/bootcamps"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        Ok((res.status(), res.json().await?))
    }

    pub async fn create_course(&self, token: &str, bootcamp_id: &str, body: Value) -> Result<(StatusCode, Value)> {
        let res = self
            .client
            .post(self.url(&format!("/bootcamps/{}/courses", bootcamp_id)))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        Ok((res.status(), res.json().await?))
    }

    pub async fn create_review(&self, token: &str, bootcamp_id: &str, body: Value) -> Result<(StatusCode, Value)> {
        let res = self
            .client
            .post(self.url(&format!("/bootcamps/{}/reviews", bootcamp_id)))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        Ok((res.status(), res.json().await?))
    }

    pub async fn get_json(&self, path: &str) -> Result<(StatusCode, Value)> {
        let res = self.client.get(self.url(path)).send().await?;
        Ok((res.status(), res.json().await?))
    }
}

pub fn bootcamp_body(name: &str, address: &str) -> Value {
    json!({
        "name": name,
        "description": format!("{} teaches full stack web development", name),
        "website": "https://example.com",
        "email": "enroll@example.com",
        "address": address,
        "careers": ["Web Development", "UI/UX"],
        "housing": true,
        "jobAssistance": true
    })
}

pub fn course_body(title: &str, tuition: u64) -> Value {
    json!({
        "title": title,
        "description": "Learn by building",
        "weeks": 8,
        "tuition": tuition,
        "minimumSkill": "beginner",
        "scholarshipAvailable": false
    })
}
