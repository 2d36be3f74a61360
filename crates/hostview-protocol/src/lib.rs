//! Wire contract between the hostview client and the inventory server.
//!
//! One exchange per connection:
//!
//! 1. the client opens a TCP stream and writes the 8 ASCII bytes `GET_DATA`
//!    (no prefix, no terminator);
//! 2. the server answers with a UTF-8 JSON array of
//!    `{"ip", "name", "description"}` objects and closes the stream.
//!
//! ```rust
//! use hostview_protocol::{Progress, ResponseBuffer};
//!
//! let mut buffer = ResponseBuffer::new();
//! assert_eq!(buffer.push(b"[{\"ip\":"), Progress::Incomplete);
//! assert!(matches!(buffer.push(b"\"10.0.0.1\"}]"), Progress::Complete(Ok(_))));
//! ```

mod codec;
mod error;
mod framing;

pub use codec::{decode, encode};
pub use error::{DecodeError, DecodeResult, ProtocolError, ProtocolResult};
pub use framing::{Progress, ResponseBuffer};

/// The only request a client ever sends.
pub const REQUEST_TOKEN: &[u8] = b"GET_DATA";

/// Largest response a client accepts (4 MB).
pub const MAX_RESPONSE_SIZE: usize = 4 * 1024 * 1024;
