//! LogiVite client core
//!
//! Everything the admin console does that is not rendering: the HTTP layer
//! with its error normalization, the persisted session context store, the
//! branch / financial-year selection flow and the sidebar menu lookup.
//!
//! A host drives a [`ConsoleShell`] and observes results through the
//! [`SessionContext`] store, a [`Notifier`] and a [`Navigator`].

pub mod api;
pub mod config;
pub mod context;
pub mod endpoints;
pub mod error;
pub mod menu;
pub mod models;
pub mod services;
pub mod session;
pub mod shell;
pub mod storage;
pub mod store;
pub mod telemetry;
pub mod transport;
pub mod validation;

pub use api::{ApiClient, ApiOutcome, ApiRequest, Navigator, Notifier, TracingNotifier};
pub use config::ClientConfig;
pub use context::{ContextCommit, ContextSelectionFlow, RefreshOutcome, Selection};
pub use error::{ClientError, ErrorKind};
pub use menu::{MenuGroup, MenuIcon, MenuItem, MenuTree, SelectedMenu};
pub use session::AuthSession;
pub use shell::{BootstrapReport, ConsoleShell};
pub use storage::{ClientStorage, FileStorage, MemoryStorage, SharedStorage};
pub use store::{Action, SessionContext, Writer};
pub use transport::{ReqwestTransport, RequestBody, RequestDescriptor, Transport, TransportError};
