//! 인증 경계의 도메인 모델.

mod client;
mod device;
mod role;
mod session;

pub use client::*;
pub use device::*;
pub use role::*;
pub use session::*;
