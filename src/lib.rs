//! # pedidos-probes
//!
//! Two diagnostic probes for the pedidos stack.
//!
//! - `subscriber-probe` connects to the realtime server over Socket.IO,
//!   subscribes to the `pedidos` channel once connected, and logs every
//!   `pedido:nuevo` notification.
//! - `db-smoke` reads the ten most recent customers from PostgreSQL,
//!   prints them as a table, and exits.
//!
//! ## Architecture
//!
//! ```text
//! subscriber-probe                 db-smoke
//!     │                                │
//!     ├── subscriber (wiring)          ├── smoke (acquire → query → release)
//!     │                                │
//!     ├── rust_socketio client         ├── customers::repository
//!     │                                ├── customers::table
//!     │                                │
//!     └── Socket.IO server             └── PostgreSQL
//! ```

pub mod config;
pub mod customers;
pub mod error;
pub mod smoke;
pub mod subscriber;
pub mod telemetry;
