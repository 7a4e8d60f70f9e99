//! Generated gRPC bindings shared by the Skycast services.

pub mod convert;

pub mod weather {
    tonic::include_proto!("skycast.weather");
}

pub mod subscription {
    tonic::include_proto!("skycast.subscription");
}
