//! 비밀번호 해싱 유틸리티.
//!
//! Argon2id 기반 비밀번호 해싱 및 검증. 비교는 argon2 내부의
//! 상수 시간 비교에 위임합니다.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::LazyLock;
use tracing::warn;

/// 계정이 없는 로그인 시도에 대신 검증할 해시. 실제 해시와 같은 파라미터로 한 번만 생성.
static UNKNOWN_ACCOUNT_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("vetbook-unknown-account").ok());

/// 비밀번호 처리 에러.
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("비밀번호 해싱 실패")]
    HashingFailed,
}

/// 비밀번호 해싱.
///
/// 호출마다 새 솔트를 생성하므로 같은 평문이라도 매번 다른 PHC 문자열이 나옵니다.
///
/// # Example
///
/// ```rust,ignore
/// let hash = hash_password("my_secure_password")?;
/// // "$argon2id$v=19$m=19456,t=2,p=1$..."
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| PasswordError::HashingFailed)?;

    Ok(hash.to_string())
}

/// 비밀번호 검증.
///
/// 불일치는 물론, 저장된 해시가 손상된 경우에도 패닉 없이 `false`를 반환합니다.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "Stored password hash is malformed");
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// 로그인용 검증. 저장된 해시가 없으면(계정 없음) 고정 해시로 같은 비용의
/// 검증을 수행한 뒤 `false`를 반환하여 응답 시간으로 계정 존재 여부가
/// 드러나지 않게 합니다.
pub fn verify_login(password: &str, stored_hash: Option<&str>) -> bool {
    match stored_hash {
        Some(hash) => verify_password(password, hash),
        None => {
            if let Some(hash) = UNKNOWN_ACCOUNT_HASH.as_deref() {
                let _ = verify_password(password, hash);
            }
            false
        }
    }
}

/// 비밀번호 강도 검증.
///
/// # 요구사항
///
/// - 최소 8자 이상
/// - 최소 1개의 숫자 포함
/// - 최소 1개의 영문자 포함
pub fn validate_password_strength(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < 8 {
        return Err("password must be at least 8 characters");
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("password must contain at least one digit");
    }

    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err("password must contain at least one letter");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hash_and_verify_password() {
        let password = "Hound-Vaccine-42";
        let hash = hash_password(password).unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password(password, &hash));
        assert!(!verify_password("Hound-Vaccine-43", &hash));
    }

    #[test]
    fn test_same_password_different_hashes() {
        let hash1 = hash_password("Password1").unwrap();
        let hash2 = hash_password("Password1").unwrap();

        // 솔트가 다르므로 해시가 다름
        assert_ne!(hash1, hash2);
        assert!(verify_password("Password1", &hash1));
        assert!(verify_password("Password1", &hash2));
    }

    #[test]
    fn test_malformed_hash_is_false() {
        assert!(!verify_password("password", "not-a-valid-hash"));
        assert!(!verify_password("password", ""));
    }

    #[test]
    fn test_unknown_account_hash_matches_real_parameters() {
        let dummy = UNKNOWN_ACCOUNT_HASH.as_deref().unwrap();
        let real = hash_password("Hound-Vaccine-42").unwrap();

        let dummy = PasswordHash::new(dummy).unwrap();
        let real = PasswordHash::new(&real).unwrap();
        assert_eq!(dummy.algorithm, real.algorithm);
        assert_eq!(dummy.params, real.params);
    }

    #[test]
    fn test_verify_login_without_account_is_false() {
        let hash = hash_password("Hound-Vaccine-42").unwrap();

        assert!(verify_login("Hound-Vaccine-42", Some(&hash)));
        assert!(!verify_login("Hound-Vaccine-43", Some(&hash)));
        assert!(!verify_login("Hound-Vaccine-42", None));
        assert!(!verify_login("vetbook-unknown-account", None));
    }

    #[test]
    fn test_verify_login_cost_does_not_reveal_account() {
        let hash = hash_password("Hound-Vaccine-42").unwrap();
        // 고정 해시 생성 비용을 측정에서 제외
        let _ = verify_login("warmup", None);

        let started = std::time::Instant::now();
        for _ in 0..3 {
            assert!(!verify_login("wrong-password-1", Some(&hash)));
        }
        let known = started.elapsed();

        let started = std::time::Instant::now();
        for _ in 0..3 {
            assert!(!verify_login("wrong-password-1", None));
        }
        let unknown = started.elapsed();

        assert!(
            unknown * 4 >= known,
            "unknown account took {:?}, known account {:?}",
            unknown,
            known
        );
    }

    #[test]
    fn test_password_strength_validation() {
        assert!(validate_password_strength("Password1").is_ok());
        assert!(validate_password_strength("abcd1234").is_ok());

        assert!(validate_password_strength("Pass1").is_err());
        assert!(validate_password_strength("Password").is_err());
        assert!(validate_password_strength("12345678").is_err());
        assert!(validate_password_strength("").is_err());
    }

    #[test]
    fn test_unicode_password() {
        let password = "강아지예방접종2024";
        let hash = hash_password(password).unwrap();
        assert!(verify_password(password, &hash));
    }

    proptest! {
        // argon2 비용 때문에 케이스 수 축소
        #![proptest_config(ProptestConfig::with_cases(6))]

        #[test]
        fn prop_hash_verifies_only_original(p1 in ".{1,32}", p2 in ".{1,32}") {
            let hash = hash_password(&p1).unwrap();
            prop_assert!(verify_password(&p1, &hash));
            if p1 != p2 {
                prop_assert!(!verify_password(&p2, &hash));
            }
        }
    }
}
