//! Participant database operations

use sevs_common::db::{Participant, PARTICIPANT_COLUMNS};
use sqlx::SqlitePool;

/// Participant fields as supplied by the import, before an id is assigned
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticipantRecord {
    pub reference_no: String,
    pub prefix: String,
    pub name: String,
    pub gender: String,
    pub designation: String,
    pub institution: String,
    pub institute_address: String,
    pub state: String,
    pub country: String,
    pub email: String,
    pub mobile_no: String,
    pub registered_category: String,
    pub paper_id: String,
    pub registration_date: String,
    pub transaction_id: String,
    pub invoice_no: String,
    pub amount_paid: Option<f64>,
}

/// Participant columns qualified with a table alias (`p.id, p.reference_no, ...`)
pub fn qualified_columns(alias: &str) -> String {
    PARTICIPANT_COLUMNS
        .split(',')
        .map(|column| format!("{}.{}", alias, column.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Look up the participant bound to a barcode (exact match)
pub async fn find_by_barcode(
    pool: &SqlitePool,
    barcode: &str,
) -> sqlx::Result<Option<Participant>> {
    let sql = format!("SELECT {} FROM participants WHERE barcode = ?", PARTICIPANT_COLUMNS);
    sqlx::query_as::<_, Participant>(&sql)
        .bind(barcode)
        .fetch_optional(pool)
        .await
}

/// Set (or clear, with `None`) the barcode of the participant with `email`
///
/// Single statement; the UNIQUE index on `barcode` decides concurrent races.
/// Returns `None` when no participant has that email.
pub async fn set_barcode(
    pool: &SqlitePool,
    email: &str,
    barcode: Option<&str>,
    updated_at_ms: i64,
) -> sqlx::Result<Option<Participant>> {
    let sql = format!(
        "UPDATE participants SET barcode = ?, updated_at = ? WHERE email = ? RETURNING {}",
        PARTICIPANT_COLUMNS
    );
    sqlx::query_as::<_, Participant>(&sql)
        .bind(barcode)
        .bind(updated_at_ms)
        .bind(email)
        .fetch_optional(pool)
        .await
}

/// Case-insensitive substring search over email, mobile, reference number
/// and name, newest first
pub async fn search(pool: &SqlitePool, term: &str, limit: i64) -> sqlx::Result<Vec<Participant>> {
    let pattern = format!("%{}%", escape_like(term));
    let sql = format!(
        r#"
        SELECT {}
        FROM participants
        WHERE email LIKE ?1 ESCAPE '\'
           OR mobile_no LIKE ?1 ESCAPE '\'
           OR reference_no LIKE ?1 ESCAPE '\'
           OR name LIKE ?1 ESCAPE '\'
        ORDER BY created_at DESC, rowid DESC
        LIMIT ?2
        "#,
        PARTICIPANT_COLUMNS
    );
    sqlx::query_as::<_, Participant>(&sql)
        .bind(pattern)
        .bind(limit)
        .fetch_all(pool)
        .await
}

/// Every participant, newest first
pub async fn list_all(pool: &SqlitePool) -> sqlx::Result<Vec<Participant>> {
    let sql = format!(
        "SELECT {} FROM participants ORDER BY created_at DESC, rowid DESC",
        PARTICIPANT_COLUMNS
    );
    sqlx::query_as::<_, Participant>(&sql).fetch_all(pool).await
}

/// Insert or refresh a participant keyed by reference number
///
/// An existing row keeps its id, barcode and created_at. `new_id` is only
/// used when the reference number is new.
pub async fn upsert(
    pool: &SqlitePool,
    new_id: &str,
    record: &ParticipantRecord,
    now_ms: i64,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO participants (
            id, reference_no, prefix, name, gender, designation, institution,
            institute_address, state, country, email, mobile_no, registered_category,
            paper_id, registration_date, transaction_id, invoice_no, amount_paid,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(reference_no) DO UPDATE SET
            prefix = excluded.prefix,
            name = excluded.name,
            gender = excluded.gender,
            designation = excluded.designation,
            institution = excluded.institution,
            institute_address = excluded.institute_address,
            state = excluded.state,
            country = excluded.country,
            email = excluded.email,
            mobile_no = excluded.mobile_no,
            registered_category = excluded.registered_category,
            paper_id = excluded.paper_id,
            registration_date = excluded.registration_date,
            transaction_id = excluded.transaction_id,
            invoice_no = excluded.invoice_no,
            amount_paid = excluded.amount_paid,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(new_id)
    .bind(&record.reference_no)
    .bind(&record.prefix)
    .bind(&record.name)
    .bind(&record.gender)
    .bind(&record.designation)
    .bind(&record.institution)
    .bind(&record.institute_address)
    .bind(&record.state)
    .bind(&record.country)
    .bind(&record.email)
    .bind(&record.mobile_no)
    .bind(&record.registered_category)
    .bind(&record.paper_id)
    .bind(&record.registration_date)
    .bind(&record.transaction_id)
    .bind(&record.invoice_no)
    .bind(record.amount_paid)
    .bind(now_ms)
    .bind(now_ms)
    .execute(pool)
    .await?;

    Ok(())
}

/// Escape LIKE wildcards so user input matches literally
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
