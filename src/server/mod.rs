mod handlers;
mod models;
mod state;
mod util;

pub use handlers::{router, run_server};
pub use state::ServerState;
pub use util::{ServerError, build_download_filename};
