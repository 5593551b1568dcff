// showroom-api: async client for the showcase backend service.
//
// Four surfaces, all speaking to the same external deployment:
// documents (CRUD + queries), auth (sessions), blobs (upload/download),
// and the change feed (live document updates over WebSocket).

pub mod auth;
pub mod error;
pub mod feed;
pub mod storage;
pub mod store;
pub mod transport;

pub use auth::{AuthClient, AuthSession, AuthUser};
pub use error::Error;
pub use feed::{ChangeEvent, ChangeFeedHandle, ChangeOp, ReconnectConfig};
pub use storage::StorageClient;
pub use store::{DocumentQuery, RawDocument, SortDirection, StoreClient};
pub use transport::{TlsMode, TokenStore, TransportConfig};
