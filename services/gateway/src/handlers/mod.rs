pub mod subscription;
pub mod weather;
