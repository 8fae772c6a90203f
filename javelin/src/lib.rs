//! Facade over the javelin client crates. Contract modules are expected to
//! `use javelin::*;` so the items referenced by `#[service_contract]`
//! expansions are in scope.

pub use javelin_client::*;
pub use javelin_derive::*;
pub use javelin_protocol::*;

pub use async_trait::async_trait;
