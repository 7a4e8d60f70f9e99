use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::domain::provider::ProviderError;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client shared by every upstream provider.
pub fn build_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("skycast-weather/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Send `request` and decode a successful JSON body. 404 means the city is
/// unknown; any other failure makes the provider unavailable.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    provider: &'static str,
    city: &str,
    request: reqwest::RequestBuilder,
) -> Result<T, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::unavailable(provider, e))?;

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ProviderError::CityNotFound(city.to_owned()));
    }
    if !status.is_success() {
        return Err(ProviderError::unavailable(
            provider,
            anyhow::anyhow!("upstream returned {status}"),
        ));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::unavailable(provider, e))
}

pub(crate) fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_owned()
}
