use std::path::PathBuf;

use directories::ProjectDirs;

use crate::fetch::{FetchOptions, BASE_URL};

/// Runtime settings assembled from CLI flags and environment variables.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub proxy: Option<String>,
    pub timeout: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: None,
            data_dir: None,
            proxy: None,
            timeout: 30,
        }
    }
}

pub fn default_data_dir() -> PathBuf {
    ProjectDirs::from("com", "tripr", "tripr")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".tripr"))
}

impl Settings {
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            api_key: self.api_key.clone(),
            base_url: self
                .api_base
                .clone()
                .unwrap_or_else(|| BASE_URL.to_string()),
            proxy: self.proxy.clone(),
            timeout: self.timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_data_dir_wins() {
        let settings = Settings {
            data_dir: Some(PathBuf::from("/tmp/trips")),
            ..Settings::default()
        };
        assert_eq!(settings.data_dir(), PathBuf::from("/tmp/trips"));
    }

    #[test]
    fn fetch_options_default_to_provider_base() {
        let options = Settings::default().fetch_options();
        assert_eq!(options.base_url, BASE_URL);
        assert_eq!(options.timeout, 30);
        assert!(options.api_key.is_none());
    }
}
