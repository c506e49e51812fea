//! Queries over the `clients` table.

use super::error::DbError;
use super::schema::{Client, NewClient, UpdateClientRequest};
use sqlx::{PgPool, Postgres, QueryBuilder};

/// Lists all clients, newest first.
///
/// # Errors
/// Returns [`DbError::Query`] if the query fails.
pub async fn list_clients(pool: &PgPool) -> Result<Vec<Client>, DbError> {
    let clients = sqlx::query_as("SELECT * FROM clients ORDER BY created_at DESC, id DESC")
        .fetch_all(pool)
        .await?;
    Ok(clients)
}

/// Counts all clients.
///
/// # Errors
/// Returns [`DbError::Query`] if the query fails.
pub async fn count_clients(pool: &PgPool) -> Result<i64, DbError> {
    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM clients")
        .fetch_one(pool)
        .await?;
    Ok(total)
}

/// Fetches one client by id.
///
/// # Errors
/// Returns [`DbError::Query`] if the query fails.
pub async fn find_client(pool: &PgPool, id: i64) -> Result<Option<Client>, DbError> {
    let client = sqlx::query_as("SELECT * FROM clients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(client)
}

/// Inserts a client and returns the stored row.
///
/// # Errors
/// Returns [`DbError::Query`] if the insert fails; a duplicate email is
/// reported through [`DbError::is_unique_violation`].
pub async fn insert_client(pool: &PgPool, client: &NewClient) -> Result<Client, DbError> {
    let client = sqlx::query_as(
        "INSERT INTO clients (full_name, email, phone, company) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(&client.full_name)
    .bind(&client.email)
    .bind(&client.phone)
    .bind(&client.company)
    .fetch_one(pool)
    .await?;
    Ok(client)
}

/// Applies the provided fields to a client and returns the updated row.
///
/// A field set to `Some(None)` is written as NULL. Returns `Ok(None)` when
/// no client has the id. The caller must reject empty updates beforehand.
///
/// # Errors
/// Returns [`DbError::Query`] if the update fails, including a NULL written
/// to a required column.
pub async fn update_client(
    pool: &PgPool,
    id: i64,
    update: &UpdateClientRequest,
) -> Result<Option<Client>, DbError> {
    let client = update_query(id, update)
        .build_query_as::<Client>()
        .fetch_optional(pool)
        .await?;
    Ok(client)
}

/// Builds the `UPDATE` statement for the provided fields.
fn update_query(id: i64, update: &UpdateClientRequest) -> QueryBuilder<'static, Postgres> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE clients SET ");
    let mut fields = builder.separated(", ");
    let columns = [
        ("full_name", &update.full_name),
        ("email", &update.email),
        ("phone", &update.phone),
        ("company", &update.company),
    ];
    for (column, value) in columns {
        if let Some(value) = value {
            fields.push(format!("{column} = "));
            fields.push_bind_unseparated(value.clone());
        }
    }
    fields.push("updated_at = NOW()");

    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" RETURNING *");
    builder
}

/// Deletes a client and returns the removed row.
///
/// # Errors
/// Returns [`DbError::Query`] if the delete fails.
pub async fn delete_client(pool: &PgPool, id: i64) -> Result<Option<Client>, DbError> {
    let client = sqlx::query_as("DELETE FROM clients WHERE id = $1 RETURNING *")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_query_sets_only_provided_fields() {
        let update = UpdateClientRequest {
            company: Some(Some("Engines".to_string())),
            ..UpdateClientRequest::default()
        };

        assert_eq!(
            update_query(7, &update).sql(),
            "UPDATE clients SET company = $1, updated_at = NOW() WHERE id = $2 RETURNING *"
        );
    }

    #[test]
    fn test_update_query_writes_explicit_null() {
        let update: UpdateClientRequest =
            serde_json::from_str(r#"{"phone": null, "full_name": "Ada"}"#).unwrap();

        assert_eq!(
            update_query(7, &update).sql(),
            "UPDATE clients SET full_name = $1, phone = $2, updated_at = NOW() \
             WHERE id = $3 RETURNING *"
        );
    }
}
