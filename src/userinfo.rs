//! Best-effort client connection info for the report header.
//!
//! Display-only: a failed lookup leaves the header empty and never fails
//! a run. The connection type has no reliable source on a desktop host,
//! so it is taken from an environment hint when one is set.

use log::debug;
use serde::Deserialize;
use std::time::Duration;

static IP_INFO_URL: &str = "https://ipapi.co/json/";

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Environment hint naming the connection type (e.g. "wifi", "ethernet").
pub(crate) static CONNECTION_TYPE_ENV: &str = "NET_VITALS_CONNECTION_TYPE";

/// What the IP info service reports about this client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientInfo {
    pub ip: Option<String>,
    /// ISP / organization name
    pub org: Option<String>,
    pub city: Option<String>,
    pub country_name: Option<String>,
    /// Optional hint, not part of the lookup response
    #[serde(skip)]
    pub connection_type: Option<String>,
}

impl ClientInfo {
    /// "City, Country" when either part is known.
    pub fn location(&self) -> Option<String> {
        match (self.city.as_deref(), self.country_name.as_deref()) {
            (Some(city), Some(country)) => Some(format!("{}, {}", city, country)),
            (Some(city), None) => Some(city.to_string()),
            (None, Some(country)) => Some(country.to_string()),
            (None, None) => None,
        }
    }
}

/// Look up the client's public connection details. `None` when the
/// service is unreachable or answers with something unexpected.
pub async fn fetch_client_info() -> Option<ClientInfo> {
    let client = reqwest::Client::new();

    let response = client
        .get(IP_INFO_URL)
        .timeout(LOOKUP_TIMEOUT)
        .send()
        .await
        .and_then(|response| response.error_for_status());

    let mut info: ClientInfo = match response {
        Ok(response) => match response.json().await {
            Ok(info) => info,
            Err(err) => {
                debug!("ip info response unreadable: {}", err);
                return None;
            }
        },
        Err(err) => {
            debug!("ip info lookup failed: {}", err);
            return None;
        }
    };

    info.connection_type = std::env::var(CONNECTION_TYPE_ENV).ok();

    Some(info)
}
