use anyhow::Context as _;
use tonic::transport::Channel;

use skycast_proto::weather::{CityRequest, weather_service_client::WeatherServiceClient};

use crate::domain::repository::CityValidatorPort;
use crate::error::SubscriptionServiceError;

/// City validation backed by the weather service.
#[derive(Clone)]
pub struct GrpcCityValidator {
    client: WeatherServiceClient<Channel>,
}

impl GrpcCityValidator {
    pub fn new(channel: Channel) -> Self {
        Self {
            client: WeatherServiceClient::new(channel),
        }
    }

    /// Channel that connects on first use, so start-up does not wait for the
    /// weather service.
    pub fn lazy(url: &str) -> anyhow::Result<Self> {
        let channel = Channel::from_shared(url.to_owned())
            .with_context(|| format!("invalid WEATHER_GRPC_URL {url:?}"))?
            .connect_lazy();
        Ok(Self::new(channel))
    }
}

impl CityValidatorPort for GrpcCityValidator {
    async fn validate(&self, city: &str) -> Result<String, SubscriptionServiceError> {
        let response = self
            .client
            .clone()
            .validate_city(CityRequest {
                city: city.to_owned(),
            })
            .await;
        match response {
            Ok(resp) => Ok(resp.into_inner().city),
            Err(status) => Err(status_to_error(&status)),
        }
    }
}

fn status_to_error(status: &tonic::Status) -> SubscriptionServiceError {
    match status.code() {
        tonic::Code::NotFound | tonic::Code::InvalidArgument => {
            SubscriptionServiceError::InvalidCity
        }
        tonic::Code::Unavailable | tonic::Code::DeadlineExceeded => {
            tracing::warn!(code = ?status.code(), message = status.message(), "weather service unreachable");
            SubscriptionServiceError::Unavailable("weather service unavailable".into())
        }
        code => anyhow::anyhow!("gRPC validate_city failed: {code:?} {}", status.message()).into(),
    }
}
