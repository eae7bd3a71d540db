//! Request validation and command dispatch for the IR remote endpoint.
//!
//! A request flows through [`validate`] into a [`Command`], then through a
//! [`Dispatcher`] onto an [`IrBackend`]. [`Reply`] maps either outcome onto
//! the `{"erro", "mensagem"}` envelope.

pub mod backend;
pub mod command;
pub mod dispatch;
pub mod protocol;
pub mod response;
pub mod topics;
pub mod validate;

pub use backend::{BackendCall, BackendError, IrBackend, RecordingBackend};
pub use command::{Command, EncodedCommand, RawCommand};
pub use dispatch::{Ack, Dispatcher};
pub use protocol::{Protocol, ProtocolFamily};
pub use response::{ApiResponse, Reply};
pub use topics::*;
pub use validate::{check_request, validate, validate_body, ValidationError, APPLICATION_JSON};
