//! Transport-independent client machinery for Wirebolt: the correlation
//! table that matches responses to waiting callers, pending-call handles,
//! the deadline sweeper and the typed caller interface.

mod caller_interface;
pub use caller_interface::*;

mod correlation_table;
pub use correlation_table::*;

mod deadline_sweeper;
pub use deadline_sweeper::*;

pub mod error;
pub use error::RpcCallerError;

mod pending_call;
pub use pending_call::*;

mod transport_state;
pub use transport_state::*;
