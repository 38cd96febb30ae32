// API client module: a small blocking HTTP client for the registration
// backend. It uploads images and submits the two kinds of registration.

use crate::config::Config;
use crate::error::ApiError;
use crate::models::{CompanyRegistration, IndividualRegistration};
use crate::preview::ImageFile;
use reqwest::blocking::{multipart, Client};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

pub const UPLOAD_PATH: &str = "/images/upload-profile-pic";
pub const REGISTER_INDIVIDUAL_PATH: &str = "/auth/register";
pub const REGISTER_COMPANY_PATH: &str = "/auth/register-company";

/// The calls the registration form needs from a backend.
pub trait Backend {
    /// Upload an image and return the URL the backend stored it under.
    fn upload_profile_picture(&self, file: &ImageFile) -> Result<String, ApiError>;

    fn register_individual(&self, payload: &IndividualRegistration) -> Result<(), ApiError>;

    fn register_company(&self, payload: &CompanyRegistration) -> Result<(), ApiError>;
}

/// Blocking client holding a reqwest client and the backend base URL.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    upload_timeout: Duration,
}

#[derive(Deserialize)]
struct UploadResponse {
    profile_pic_url: Option<String>,
}

impl ApiClient {
    /// Create an ApiClient configured from the environment, see
    /// `Config::from_env`.
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Config::from_env()?;
        Ok(ApiClient::new(&config)?)
    }

    pub fn new(config: &Config) -> Result<Self, ApiError> {
        // The blocking client defaults to a 30s timeout on every request;
        // only uploads are meant to have one.
        let client = Client::builder().timeout(None::<Duration>).build()?;
        Ok(ApiClient {
            client,
            base_url: config.base_url.clone(),
            upload_timeout: config.upload_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn post_json<T: serde::Serialize>(&self, path: &str, body: &T) -> Result<(), ApiError> {
        let url = self.url(path);
        log::info!("POST {}", url);
        let res = self.client.post(&url).json(body).send()?;
        let status = res.status();
        if !status.is_success() {
            let txt = res.text().unwrap_or_default();
            log::warn!("POST {} rejected with {}", url, status);
            return Err(ApiError::rejected("Registration", status, &txt));
        }
        log::info!("POST {} -> {}", url, status);
        Ok(())
    }
}

/// Turn an upload response into the stored image URL.
pub fn interpret_upload_response(status: StatusCode, body: &str) -> Result<String, ApiError> {
    if !status.is_success() {
        return Err(ApiError::rejected("Upload", status, body));
    }
    let parsed: UploadResponse = serde_json::from_str(body)
        .map_err(|e| ApiError::MalformedResponse(format!("Upload response was not valid JSON: {}", e)))?;
    match parsed.profile_pic_url {
        Some(url) if !url.is_empty() => Ok(url),
        _ => Err(ApiError::MalformedResponse(
            "Upload succeeded but the server did not return profile_pic_url".into(),
        )),
    }
}

impl Backend for ApiClient {
    /// Upload using multipart/form-data with the file as the only part.
    fn upload_profile_picture(&self, file: &ImageFile) -> Result<String, ApiError> {
        let url = self.url(UPLOAD_PATH);

        let part = multipart::Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(file.mime)?;
        let form = multipart::Form::new().part("file", part);

        log::info!("uploading {} ({} bytes) to {}", file.file_name, file.bytes.len(), url);
        let res = self
            .client
            .post(&url)
            .timeout(self.upload_timeout)
            .multipart(form)
            .send()
            .map_err(|e| {
                log::error!("upload of {} failed: {}", file.file_name, e);
                ApiError::from(e)
            })?;

        let status = res.status();
        let txt = res.text()?;
        let result = interpret_upload_response(status, &txt);
        match &result {
            Ok(stored) => log::info!("uploaded {} -> {}", file.file_name, stored),
            Err(e) => log::warn!("upload of {} failed with {}: {}", file.file_name, status, e),
        }
        result
    }

    fn register_individual(&self, payload: &IndividualRegistration) -> Result<(), ApiError> {
        log::debug!("registering individual account {}", payload.username);
        self.post_json(REGISTER_INDIVIDUAL_PATH, payload)
    }

    fn register_company(&self, payload: &CompanyRegistration) -> Result<(), ApiError> {
        log::debug!("registering company {} with admin {}", payload.company_name, payload.admin_username);
        self.post_json(REGISTER_COMPANY_PATH, payload)
    }
}
