mod confirm_test;
mod helpers;
mod http_test;
