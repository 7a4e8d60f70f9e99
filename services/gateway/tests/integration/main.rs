mod helpers;
mod subscription_test;
mod weather_test;
