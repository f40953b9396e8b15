//! HTTP protocol implementation.
//!
//! This module implements a minimal HTTP/1.1 server side: one request per
//! connection, fixed-length bodies only.
//!
//! # Architecture
//!
//! - **`connection`**: Per-connection state machine (parse → dispatch → respond → close)
//! - **`parser`**: Frames a request from a buffered byte stream
//! - **`headers`**: Case-insensitive header map
//! - **`request`**: HTTP request representation
//! - **`response`**: Response accumulator and status codes
//! - **`writer`**: Serializes and writes the response exactly once
//! - **`handler`**: The async handler contract
//! - **`router`**: Method + exact path lookup
//! - **`middleware`**: Handler wrappers (recovery, request logging)
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Parsing   │ ← Read start line, headers, body
//!        └──────┬──────┘
//!               │ Request parsed          (parse error → 400)
//!               ▼
//!        ┌──────────────────┐
//!        │   Dispatching    │ ← Middleware → Router → handler
//!        └──────┬───────────┘
//!               │ Response ready          (handler error → 500)
//!               ▼
//!        ┌──────────────────┐
//!        │   Responding     │ ← Send response to client
//!        └──────┬───────────┘
//!               ▼
//!        ┌──────────────────┐
//!        │     Closed       │
//!        └──────────────────┘
//! ```

pub mod connection;
pub mod handler;
pub mod headers;
pub mod middleware;
pub mod parser;
pub mod request;
pub mod response;
pub mod router;
pub mod writer;
