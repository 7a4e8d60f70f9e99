use anyhow::Context as _;
use tonic::transport::Channel;

use skycast_core::error::AppError;
use skycast_domain::weather::{CurrentWeather, DailyForecast, HourlyForecast};
use skycast_proto::subscription::{
    SubscribeRequest as WireSubscribeRequest, TokenRequest,
    subscription_service_client::SubscriptionServiceClient,
};
use skycast_proto::weather::{CityRequest, weather_service_client::WeatherServiceClient};

use crate::domain::backend::{SubscribeRequest, SubscriptionBackend, WeatherBackend};

fn lazy_channel(url: &str, var: &str) -> anyhow::Result<Channel> {
    Ok(Channel::from_shared(url.to_owned())
        .with_context(|| format!("invalid {var} {url:?}"))?
        .connect_lazy())
}

fn backend_error(service: &'static str, status: tonic::Status) -> AppError {
    if matches!(
        status.code(),
        tonic::Code::Unavailable | tonic::Code::DeadlineExceeded
    ) {
        tracing::warn!(service, code = ?status.code(), message = status.message(), "back-end unreachable");
    }
    AppError::from_status(&status)
}

// ── Subscription ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct GrpcSubscriptionBackend {
    client: SubscriptionServiceClient<Channel>,
}

impl GrpcSubscriptionBackend {
    pub fn lazy(url: &str) -> anyhow::Result<Self> {
        Ok(Self {
            client: SubscriptionServiceClient::new(lazy_channel(url, "SUBSCRIPTION_GRPC_URL")?),
        })
    }
}

#[async_trait::async_trait]
impl SubscriptionBackend for GrpcSubscriptionBackend {
    async fn subscribe(&self, request: SubscribeRequest) -> Result<String, AppError> {
        let response = self
            .client
            .clone()
            .subscribe(WireSubscribeRequest {
                email: request.email,
                city: request.city,
                frequency: request.frequency,
            })
            .await
            .map_err(|status| backend_error("subscription", status))?;
        Ok(response.into_inner().message)
    }

    async fn confirm(&self, token: &str) -> Result<String, AppError> {
        let response = self
            .client
            .clone()
            .confirm(TokenRequest {
                token: token.to_owned(),
            })
            .await
            .map_err(|status| backend_error("subscription", status))?;
        Ok(response.into_inner().message)
    }

    async fn unsubscribe(&self, token: &str) -> Result<String, AppError> {
        let response = self
            .client
            .clone()
            .unsubscribe(TokenRequest {
                token: token.to_owned(),
            })
            .await
            .map_err(|status| backend_error("subscription", status))?;
        Ok(response.into_inner().message)
    }
}

// ── Weather ──────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct GrpcWeatherBackend {
    client: WeatherServiceClient<Channel>,
}

impl GrpcWeatherBackend {
    pub fn lazy(url: &str) -> anyhow::Result<Self> {
        Ok(Self {
            client: WeatherServiceClient::new(lazy_channel(url, "WEATHER_GRPC_URL")?),
        })
    }
}

fn city(city: &str) -> CityRequest {
    CityRequest {
        city: city.to_owned(),
    }
}

#[async_trait::async_trait]
impl WeatherBackend for GrpcWeatherBackend {
    async fn current(&self, name: &str) -> Result<CurrentWeather, AppError> {
        let response = self
            .client
            .clone()
            .get_current(city(name))
            .await
            .map_err(|status| backend_error("weather", status))?;
        Ok(response.into_inner().into())
    }

    async fn daily(&self, name: &str) -> Result<DailyForecast, AppError> {
        let response = self
            .client
            .clone()
            .get_daily(city(name))
            .await
            .map_err(|status| backend_error("weather", status))?;
        Ok(response.into_inner().into())
    }

    async fn hourly(&self, name: &str) -> Result<HourlyForecast, AppError> {
        let response = self
            .client
            .clone()
            .get_hourly(city(name))
            .await
            .map_err(|status| backend_error("weather", status))?;
        Ok(response.into_inner().into())
    }

    async fn validate_city(&self, name: &str) -> Result<String, AppError> {
        let response = self
            .client
            .clone()
            .validate_city(city(name))
            .await
            .map_err(|status| backend_error("weather", status))?;
        Ok(response.into_inner().city)
    }
}
