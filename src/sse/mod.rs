//! Server-Sent Events support: thin re-export of axum's SSE primitives, used
//! by the streaming handler to emit `id:`/`data:` frames per consumed
//! message.

pub use axum::response::sse::{Event, KeepAlive, Sse};
