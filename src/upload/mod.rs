//! Inbound upload parsing.
//!
//! # Data Flow
//! ```text
//! Content-Type + body bytes (+ declared encoding)
//!     → content type check (multipart/form-data)
//!     → base64 decode when declared
//!     → boundary split (multer)
//!     → UploadRequest { image, file_name, username }
//! ```

pub mod parser;

pub use parser::{parse_upload, BodyEncoding, RawBody, UploadRequest, DEFAULT_FILE_NAME};
