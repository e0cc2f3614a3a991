//! Integration tests for the Sic Bo client.

mod activation;
mod loopback;
mod scenario;
