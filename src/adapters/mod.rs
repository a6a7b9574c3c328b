pub mod http;
pub mod kvm;

pub use http::{HttpTransport, ReqwestTransport};
pub use kvm::{PowerAction, PowerController};
