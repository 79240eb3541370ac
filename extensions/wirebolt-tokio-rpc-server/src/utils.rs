mod bind_tcp_listener_on_random_port;
pub use bind_tcp_listener_on_random_port::*;

mod tcp_listener_to_address;
pub use tcp_listener_to_address::*;
