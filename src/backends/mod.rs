//! Terminal transport adapters.

pub mod reqwest;

pub use self::reqwest::{ReqwestBackend, ReqwestResponseHandle};
