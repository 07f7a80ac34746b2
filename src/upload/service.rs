use async_trait::async_trait;
use log::error;
use serde::Deserialize;

use crate::integration::media;

#[async_trait]
pub trait MediaHost {
    /// Stores the image and returns its public URL.
    async fn upload(&self, data_uri: &str) -> super::Result<String>;
}

#[derive(Clone)]
pub struct CloudinaryHost {
    http: reqwest::Client,
    config: media::Config,
}

impl CloudinaryHost {
    pub fn new(http: reqwest::Client, config: media::Config) -> Self {
        Self { http, config }
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

#[async_trait]
impl MediaHost for CloudinaryHost {
    async fn upload(&self, data_uri: &str) -> super::Result<String> {
        let res = self
            .http
            .post(self.config.upload_url())
            .form(&[
                ("file", data_uri),
                ("upload_preset", self.config.upload_preset()),
            ])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            error!("media host responded with {status}: {body}");
            return Err(super::Error::Rejected(status));
        }

        res.json::<UploadResponse>()
            .await?
            .secure_url
            .ok_or(super::Error::MissingUrl)
    }
}
