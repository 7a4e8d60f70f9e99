use tonic::{Request, Response, Status};

use skycast_proto::weather::{
    CityRequest, CurrentWeather, DailyForecast, HourlyForecast, ValidateCityResponse,
    weather_service_server::WeatherService,
};

use crate::state::AppState;
use crate::usecase::weather::{
    GetCurrentUseCase, GetDailyUseCase, GetHourlyUseCase, ValidateCityUseCase,
};

#[derive(Clone)]
pub struct WeatherGrpcServer {
    pub state: AppState,
}

#[tonic::async_trait]
impl WeatherService for WeatherGrpcServer {
    async fn get_current(
        &self,
        request: Request<CityRequest>,
    ) -> Result<Response<CurrentWeather>, Status> {
        let city = request.into_inner().city;
        let uc = GetCurrentUseCase {
            reader: self.state.reader(),
        };
        let current = uc.execute(&city).await?;
        Ok(Response::new(current.into()))
    }

    async fn get_daily(
        &self,
        request: Request<CityRequest>,
    ) -> Result<Response<DailyForecast>, Status> {
        let city = request.into_inner().city;
        let uc = GetDailyUseCase {
            reader: self.state.reader(),
        };
        let daily = uc.execute(&city).await?;
        Ok(Response::new(daily.into()))
    }

    async fn get_hourly(
        &self,
        request: Request<CityRequest>,
    ) -> Result<Response<HourlyForecast>, Status> {
        let city = request.into_inner().city;
        let uc = GetHourlyUseCase {
            reader: self.state.reader(),
        };
        let hourly = uc.execute(&city).await?;
        Ok(Response::new(hourly.into()))
    }

    async fn validate_city(
        &self,
        request: Request<CityRequest>,
    ) -> Result<Response<ValidateCityResponse>, Status> {
        let city = request.into_inner().city;
        let uc = ValidateCityUseCase {
            validator: self.state.city_validator(),
        };
        let city = uc.execute(&city).await?;
        Ok(Response::new(ValidateCityResponse { city }))
    }
}
