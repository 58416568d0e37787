//! A sans-io STUN binding engine: message and attribute codecs, transaction
//! correlation, and the client session and reflector built on them.
//!
//! Nothing here touches a socket or a clock. The caller sends the bytes the
//! engine produces and feeds back what it receives.

pub mod attrs;
pub mod constants;
pub mod error;
pub mod header;
pub mod message;
pub mod reflector;
pub mod session;
pub mod transaction;
pub mod util;

pub use error::{Error, Result};
pub use header::{MessageClass, MessageType, TransId};
pub use message::{decode_message, encode_message, encode_request, Message};
pub use session::{BindingResult, BindingSession, OutgoingRequest, SessionConfig};
pub use transaction::{TransactionState, TransactionTracker};
