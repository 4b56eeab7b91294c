//! HTTP front end: `POST /thumbnail` multipart upload, `GET /health`.
//!
//! Handlers only parse the upload and map errors to status codes. Decoding,
//! planning and compositing run on the blocking pool through
//! [`caption_bytes`](crate::imaging::caption_bytes). Caption errors become a
//! 400 with the error report as body; rasterizer failures become a 500.

mod form;
mod handlers;
mod state;

pub use handlers::{ServerError, router, run_server};
pub use state::ServerState;
