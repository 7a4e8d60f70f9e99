use tonic::{Request, Response, Status};

use skycast_proto::subscription::{
    MessageResponse, SubscribeRequest, TokenRequest,
    subscription_service_server::SubscriptionService,
};

use crate::domain::repository::{CityValidatorPort, UnitOfWork};
use crate::handlers::subscription::{CONFIRMED, SUBSCRIBED, UNSUBSCRIBED};
use crate::infra::db::DbUnitOfWork;
use crate::infra::grpc::GrpcCityValidator;
use crate::state::AppState;
use crate::usecase::subscription::SubscribeInput;

fn message(text: &str) -> Response<MessageResponse> {
    Response::new(MessageResponse {
        message: text.to_owned(),
    })
}

#[derive(Clone)]
pub struct SubscriptionGrpcServer<U = DbUnitOfWork, V = GrpcCityValidator> {
    pub state: AppState<U, V>,
}

#[tonic::async_trait]
impl<U, V> SubscriptionService for SubscriptionGrpcServer<U, V>
where
    U: UnitOfWork + Clone + 'static,
    V: CityValidatorPort + Clone + 'static,
{
    async fn subscribe(
        &self,
        request: Request<SubscribeRequest>,
    ) -> Result<Response<MessageResponse>, Status> {
        let req = request.into_inner();
        self.state
            .subscribe_usecase()
            .execute(SubscribeInput {
                email: req.email,
                city: req.city,
                frequency: req.frequency,
            })
            .await?;
        Ok(message(SUBSCRIBED))
    }

    async fn confirm(
        &self,
        request: Request<TokenRequest>,
    ) -> Result<Response<MessageResponse>, Status> {
        let token = request.into_inner().token;
        self.state.confirm_usecase().execute(&token).await?;
        Ok(message(CONFIRMED))
    }

    async fn unsubscribe(
        &self,
        request: Request<TokenRequest>,
    ) -> Result<Response<MessageResponse>, Status> {
        let token = request.into_inner().token;
        self.state.unsubscribe_usecase().execute(&token).await?;
        Ok(message(UNSUBSCRIBED))
    }
}
