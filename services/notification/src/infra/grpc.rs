use anyhow::Context as _;
use tonic::transport::Channel;

use skycast_domain::subscription::Frequency;
use skycast_domain::weather::Forecast;
use skycast_proto::weather::{CityRequest, weather_service_client::WeatherServiceClient};

use crate::domain::ports::WeatherPort;
use crate::error::NotificationServiceError;

/// Forecasts served by the weather service.
#[derive(Clone)]
pub struct GrpcWeatherPort {
    client: WeatherServiceClient<Channel>,
}

impl GrpcWeatherPort {
    pub fn new(channel: Channel) -> Self {
        Self {
            client: WeatherServiceClient::new(channel),
        }
    }

    pub fn lazy(url: &str) -> anyhow::Result<Self> {
        let channel = Channel::from_shared(url.to_owned())
            .with_context(|| format!("invalid WEATHER_GRPC_URL {url:?}"))?
            .connect_lazy();
        Ok(Self::new(channel))
    }
}

#[async_trait::async_trait]
impl WeatherPort for GrpcWeatherPort {
    async fn forecast(
        &self,
        city: &str,
        frequency: Frequency,
    ) -> Result<Forecast, NotificationServiceError> {
        let request = CityRequest {
            city: city.to_owned(),
        };
        let mut client = self.client.clone();
        let forecast = match frequency {
            Frequency::Daily => client
                .get_daily(request)
                .await
                .map(|resp| Forecast::Daily(resp.into_inner().into())),
            Frequency::Hourly => client
                .get_hourly(request)
                .await
                .map(|resp| Forecast::Hourly(resp.into_inner().into())),
        };
        forecast.map_err(|status| status_to_error(&status))
    }
}

fn status_to_error(status: &tonic::Status) -> NotificationServiceError {
    match status.code() {
        tonic::Code::NotFound => NotificationServiceError::CityNotFound,
        tonic::Code::Unavailable | tonic::Code::DeadlineExceeded => {
            NotificationServiceError::Unavailable("weather service unavailable".into())
        }
        code => anyhow::anyhow!("gRPC forecast failed: {code:?} {}", status.message()).into(),
    }
}
