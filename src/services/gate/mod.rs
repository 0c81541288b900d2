pub mod core;
pub mod factory;
pub mod types;
pub mod verifier;

pub use self::core::TokenGate;
pub use factory::build_token_gate;
pub use types::{Claims, GateRejection, GateRequest, RequestInterceptor, Verdict};
