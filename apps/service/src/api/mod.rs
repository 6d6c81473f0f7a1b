/// Thin HTTP glue over the store: report an address, read status, read
/// history. The only logic here is the static bearer-token gate and the
/// JSON shapes; everything else delegates to the core.
pub mod routes;

pub use routes::{AppState, router};
