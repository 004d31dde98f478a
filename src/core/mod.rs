// src/core/mod.rs
//! Core services shared by the auth and scoring components

pub mod mock_transport;
pub mod service_client;
pub mod storage;
pub mod transport;

pub use mock_transport::MockTransport;
pub use service_client::ServiceClient;
pub use storage::{FileStorage, MemoryStorage, StorageBackend, StorageError};
pub use transport::{ApiRequest, ApiResponse, FormField, RequestBody, Transport};
