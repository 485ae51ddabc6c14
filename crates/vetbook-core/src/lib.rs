//! # Vetbook Core
//!
//! 동물병원 예약 서비스의 인증 경계에서 공유하는 도메인 모델을 제공합니다.
//!
//! - 클라이언트 계정과 역할
//! - 세션 레코드 및 기기 메타데이터
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod logging;

pub use crate::config::*;
pub use domain::*;
pub use logging::*;
