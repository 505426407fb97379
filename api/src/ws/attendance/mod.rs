//! Live attendance over a single socket route.
//!
//! Teachers mark students and finalize; students ask for their own status.
//! Everything a connection sends is routed through [`AttendanceHandler`].

pub mod error;
pub mod events;
pub mod finalize;
pub mod handler;
pub mod session;
pub mod store;

pub use error::ProtocolError;
pub use events::{ClientEvent, ClientFrame, ServerEvent};
pub use finalize::{FinalizeError, FinalizeOutcome, finalize};
pub use handler::AttendanceHandler;
pub use session::{AttendanceSession, AttendanceStatus, SessionError, SessionInfo, Summary};
pub use store::{AttendanceStore, DbAttendanceStore, StoreError};
