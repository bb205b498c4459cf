pub mod object_store;
pub mod registry;
pub mod share_service;
pub mod token_service;
