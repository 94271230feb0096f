//! Staff directory database operations

use sevs_common::db::{Role, Staff};
use sqlx::SqlitePool;

const STAFF_COLUMNS: &str = "id, staff_id, name, email, password_hash, role";

/// Find a staff member by email or staff code
pub async fn find_by_identifier(
    pool: &SqlitePool,
    identifier: &str,
) -> sqlx::Result<Option<Staff>> {
    let sql = format!(
        "SELECT {} FROM staff WHERE email = ?1 OR staff_id = ?1 LIMIT 1",
        STAFF_COLUMNS
    );
    sqlx::query_as::<_, Staff>(&sql)
        .bind(identifier)
        .fetch_optional(pool)
        .await
}

/// Create or update a staff member keyed by staff code
///
/// `new_id` is only used for a staff code not seen before.
#[allow(clippy::too_many_arguments)]
pub async fn upsert(
    pool: &SqlitePool,
    new_id: &str,
    staff_id: &str,
    name: &str,
    email: &str,
    password_hash: &str,
    role: Role,
    now_ms: i64,
) -> sqlx::Result<Staff> {
    let sql = format!(
        r#"
        INSERT INTO staff (id, staff_id, name, email, password_hash, role, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(staff_id) DO UPDATE SET
            name = excluded.name,
            email = excluded.email,
            password_hash = excluded.password_hash,
            role = excluded.role,
            updated_at = excluded.updated_at
        RETURNING {}
        "#,
        STAFF_COLUMNS
    );
    sqlx::query_as::<_, Staff>(&sql)
        .bind(new_id)
        .bind(staff_id)
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role.as_str())
        .bind(now_ms)
        .bind(now_ms)
        .fetch_one(pool)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use sevs_common::db::init_database_in_memory;

    #[tokio::test]
    async fn test_lookup_by_email_or_code() {
        let pool = init_database_in_memory().await.unwrap();
        upsert(&pool, "s1", "COORD001", "John Doe", "john@event.com", "hash", Role::Coordinator, 0)
            .await
            .unwrap();

        let by_email = find_by_identifier(&pool, "john@event.com").await.unwrap().unwrap();
        let by_code = find_by_identifier(&pool, "COORD001").await.unwrap().unwrap();
        assert_eq!(by_email.id, "s1");
        assert_eq!(by_code.id, "s1");
        assert_eq!(by_code.role, Role::Coordinator);

        assert!(find_by_identifier(&pool, "coord001").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_updates_existing_code() {
        let pool = init_database_in_memory().await.unwrap();
        upsert(&pool, "s1", "ADMIN001", "Admin", "admin@event.com", "h1", Role::Staff, 0)
            .await
            .unwrap();
        let updated =
            upsert(&pool, "s2", "ADMIN001", "Admin", "admin@event.com", "h2", Role::Admin, 1)
                .await
                .unwrap();

        assert_eq!(updated.id, "s1");
        assert_eq!(updated.password_hash, "h2");
        assert_eq!(updated.role, Role::Admin);
    }
}
