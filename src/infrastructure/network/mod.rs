//! Network session adapters.

mod reqwest_session;

pub use reqwest_session::{MAX_REDIRECTS, ReqwestSession};
