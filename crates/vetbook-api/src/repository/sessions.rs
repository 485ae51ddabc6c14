//! Session Repository
//!
//! `sessions` 테이블 연산을 담당합니다.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use vetbook_core::{NewSession, SessionRecord};

const SESSION_COLUMNS: &str = "id, client_id, token, device, browser, os, ip_address, country, city, last_active, created_at";

/// Session Repository
pub struct SessionRepository;

impl SessionRepository {
    /// 토큰으로 세션 조회
    pub async fn find_by_token(
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<SessionRecord>, sqlx::Error> {
        let record = sqlx::query_as::<_, SessionRecord>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE token = $1"
        ))
        .bind(token)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// ID로 세션 조회
    pub async fn find_by_id(
        pool: &PgPool,
        session_id: &str,
    ) -> Result<Option<SessionRecord>, sqlx::Error> {
        let record = sqlx::query_as::<_, SessionRecord>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1"
        ))
        .bind(session_id)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// 세션 생성
    pub async fn create(
        pool: &PgPool,
        id: &str,
        input: &NewSession,
    ) -> Result<SessionRecord, sqlx::Error> {
        let record = sqlx::query_as::<_, SessionRecord>(&format!(
            r#"
            INSERT INTO sessions (id, client_id, token, device, browser, os, ip_address, country, city)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&input.client_id)
        .bind(&input.token)
        .bind(&input.device.device)
        .bind(&input.device.browser)
        .bind(&input.device.os)
        .bind(&input.device.ip_address)
        .bind(&input.device.country)
        .bind(&input.device.city)
        .fetch_one(pool)
        .await?;

        Ok(record)
    }

    /// 마지막 활동 시각 갱신
    pub async fn touch(
        pool: &PgPool,
        session_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE sessions SET last_active = $2 WHERE id = $1")
            .bind(session_id)
            .bind(at)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// 세션 삭제
    pub async fn delete(pool: &PgPool, session_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(session_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 클라이언트 세션 목록 (최근 활동순)
    pub async fn list_for_client(
        pool: &PgPool,
        client_id: &str,
    ) -> Result<Vec<SessionRecord>, sqlx::Error> {
        let records = sqlx::query_as::<_, SessionRecord>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE client_id = $1 ORDER BY last_active DESC"
        ))
        .bind(client_id)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    /// 클라이언트 세션 일괄 삭제 (`except` 세션 제외)
    pub async fn delete_for_client(
        pool: &PgPool,
        client_id: &str,
        except: Option<&str>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM sessions WHERE client_id = $1 AND ($2::TEXT IS NULL OR id <> $2)",
        )
        .bind(client_id)
        .bind(except)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}
