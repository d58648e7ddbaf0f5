use serde::{Deserialize, Serialize};

/// RESTCONF endpoint of a controller running on the local machine.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8181";

/// Per-instance data source configuration, as stored by the host's config editor.
///
/// Unknown keys are ignored so the same `jsonData` blob can carry host-specific fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceSettings {
    /// Controller base URL; query URIs are appended to it.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for DataSourceSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl DataSourceSettings {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_keys_are_ignored() {
        let settings: DataSourceSettings =
            serde_json::from_str(r#"{"baseUrl": "http://192.168.230.136:8181", "user": "admin"}"#).expect("deserialize settings");
        assert_eq!(settings.base_url, "http://192.168.230.136:8181");
    }

    #[test]
    fn missing_base_url_uses_default() {
        let settings: DataSourceSettings = serde_json::from_str("{}").expect("deserialize settings");
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
    }
}
