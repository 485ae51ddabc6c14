//! Client Repository
//!
//! `clients` 테이블 연산을 담당합니다. 권한은 `TEXT[]` 컬럼에 저장됩니다.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::warn;
use vetbook_core::{Client, Role};

/// clients 테이블 행
#[derive(Debug, Clone, FromRow)]
struct ClientRow {
    id: String,
    email: String,
    #[sqlx(default)]
    name: Option<String>,
    password: String,
    permissions: Vec<String>,
    created_at: DateTime<Utc>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        let permissions = row
            .permissions
            .iter()
            .filter_map(|raw| {
                let role = Role::parse(raw);
                if role.is_none() {
                    warn!(client_id = %row.id, permission = %raw, "Ignoring unknown permission");
                }
                role
            })
            .collect();

        Client {
            id: row.id,
            email: row.email,
            name: row.name,
            password: row.password,
            permissions,
            created_at: row.created_at,
        }
    }
}

/// Client Repository
pub struct ClientRepository;

impl ClientRepository {
    /// ID로 조회
    pub async fn find_by_id(pool: &PgPool, client_id: &str) -> Result<Option<Client>, sqlx::Error> {
        let row = sqlx::query_as::<_, ClientRow>(
            "SELECT id, email, name, password, permissions, created_at FROM clients WHERE id = $1",
        )
        .bind(client_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Client::from))
    }

    /// 이메일로 조회 (대소문자 무시)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Client>, sqlx::Error> {
        let row = sqlx::query_as::<_, ClientRow>(
            r#"
            SELECT id, email, name, password, permissions, created_at
            FROM clients
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email.trim())
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Client::from))
    }

    /// 전체 목록 (가입순)
    pub async fn list(pool: &PgPool) -> Result<Vec<Client>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ClientRow>(
            "SELECT id, email, name, password, permissions, created_at FROM clients ORDER BY created_at",
        )
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(Client::from).collect())
    }

    /// 비밀번호 해시 교체
    pub async fn update_password(
        pool: &PgPool,
        client_id: &str,
        hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE clients SET password = $2 WHERE id = $1")
            .bind(client_id)
            .bind(hash)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 권한 집합 교체
    pub async fn set_permissions(
        pool: &PgPool,
        client_id: &str,
        roles: &[Role],
    ) -> Result<bool, sqlx::Error> {
        let values: Vec<String> = roles.iter().map(|r| r.as_str().to_string()).collect();

        let result = sqlx::query("UPDATE clients SET permissions = $2 WHERE id = $1")
            .bind(client_id)
            .bind(&values)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
