use std::sync::Arc;

use crate::domain::repository::{CityValidatorPort, UnitOfWork};
use crate::events::WriterDispatcher;
use crate::infra::db::DbUnitOfWork;
use crate::infra::grpc::GrpcCityValidator;
use crate::usecase::subscription::{ConfirmUseCase, SubscribeUseCase, UnsubscribeUseCase};

/// Shared application state passed to every handler via axum `State` and to
/// the gRPC server.
#[derive(Clone)]
pub struct AppState<U = DbUnitOfWork, V = GrpcCityValidator> {
    pub uow: U,
    pub validator: V,
    pub dispatcher: Arc<WriterDispatcher>,
}

impl<U, V> AppState<U, V>
where
    U: UnitOfWork + Clone,
    V: CityValidatorPort + Clone,
{
    pub fn subscribe_usecase(&self) -> SubscribeUseCase<U, V> {
        SubscribeUseCase {
            uow: self.uow.clone(),
            validator: self.validator.clone(),
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }

    pub fn confirm_usecase(&self) -> ConfirmUseCase<U> {
        ConfirmUseCase {
            uow: self.uow.clone(),
        }
    }

    pub fn unsubscribe_usecase(&self) -> UnsubscribeUseCase<U> {
        UnsubscribeUseCase {
            uow: self.uow.clone(),
        }
    }
}
