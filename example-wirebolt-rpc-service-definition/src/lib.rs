//! Method definitions shared by the example server, client, tests and
//! benchmarks.

mod add;
pub use add::Add;

mod echo;
pub use echo::Echo;

mod sleep;
pub use sleep::Sleep;
