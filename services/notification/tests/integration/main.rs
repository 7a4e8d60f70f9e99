mod confirmation_test;
mod helpers;
mod http_test;
