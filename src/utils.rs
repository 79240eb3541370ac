mod generate_request_id;
mod now;

pub use generate_request_id::generate_request_id;
pub use now::{now, now_millis};
