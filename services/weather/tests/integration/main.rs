mod chain_test;
mod helpers;
mod http_test;
