mod builtin;
mod http;

pub use builtin::UtilModule;
pub use http::HttpModule;
