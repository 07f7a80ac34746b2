use std::env;

use log::warn;

/// Unsigned upload endpoint of the third-party media host (Cloudinary compatible).
#[derive(Clone)]
pub struct Config {
    upload_url: String,
    upload_preset: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upload_url: String::from("http://127.0.0.1:9090/image/upload"),
            upload_preset: String::from("messenger"),
        }
    }
}

impl Config {
    pub fn env() -> Option<Self> {
        let cloud = env::var("CLOUDINARY_CLOUD_NAME").ok();
        let preset = env::var("CLOUDINARY_UPLOAD_PRESET").ok();

        if let (Some(cloud), Some(upload_preset)) = (cloud, preset) {
            Some(Self {
                upload_url: format!("https://api.cloudinary.com/v1_1/{cloud}/image/upload"),
                upload_preset,
            })
        } else {
            warn!("media host env is not configured");
            None
        }
    }

    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }

    pub fn upload_preset(&self) -> &str {
        &self.upload_preset
    }
}

#[cfg(test)]
impl Config {
    pub fn new(upload_url: impl Into<String>, upload_preset: impl Into<String>) -> Self {
        Self {
            upload_url: upload_url.into(),
            upload_preset: upload_preset.into(),
        }
    }
}
