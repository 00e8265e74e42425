//! SurrealDB implementation of [`MemberRepository`].
//!
//! Pass-through CRUD. The hierarchy service only ever consumes the
//! [`MemberCensus`] head-count implementation.

use chrono::{DateTime, NaiveDate, Utc};
use rollbook_core::error::RollbookResult;
use rollbook_core::models::member::{CreateMember, Member, UpdateMember};
use rollbook_core::repository::{MemberCensus, MemberRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct MemberRow {
    organization_id: String,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    joined_date: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct MemberRowWithId {
    record_id: String,
    organization_id: String,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    joined_date: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn row_to_member(row: MemberRow, id: Uuid) -> Result<Member, DbError> {
    let organization_id = Uuid::parse_str(&row.organization_id)
        .map_err(|e| DbError::Migration(format!("invalid organization UUID: {e}")))?;
    let joined_date = row
        .joined_date
        .as_deref()
        .map(|d| {
            NaiveDate::parse_from_str(d, "%Y-%m-%d")
                .map_err(|e| DbError::Migration(format!("invalid date: {e}")))
        })
        .transpose()?;

    Ok(Member {
        id,
        organization_id,
        name: row.name,
        email: row.email,
        phone: row.phone,
        joined_date,
        is_active: row.is_active,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

impl MemberRowWithId {
    fn try_into_member(self) -> Result<Member, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        row_to_member(
            MemberRow {
                organization_id: self.organization_id,
                name: self.name,
                email: self.email,
                phone: self.phone,
                joined_date: self.joined_date,
                is_active: self.is_active,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            id,
        )
    }
}

/// SurrealDB implementation of the Member repository.
#[derive(Clone)]
pub struct SurrealMemberRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealMemberRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> MemberCensus for SurrealMemberRepository<C> {
    async fn count_by_organization(&self, organization_id: Uuid) -> RollbookResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM member \
                 WHERE organization_id = $organization_id GROUP ALL",
            )
            .bind(("organization_id", organization_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}

impl<C: Connection> MemberRepository for SurrealMemberRepository<C> {
    async fn create(&self, input: CreateMember) -> RollbookResult<Member> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('member', $id) SET \
                 organization_id = $organization_id, name = $name, \
                 email = $email, phone = $phone, \
                 joined_date = $joined_date",
            )
            .bind(("id", id_str.clone()))
            .bind(("organization_id", input.organization_id.to_string()))
            .bind(("name", input.name))
            .bind(("email", input.email))
            .bind(("phone", input.phone))
            .bind(("joined_date", input.joined_date.map(|d| d.to_string())))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<MemberRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "member".into(),
            id: id_str,
        })?;

        row_to_member(row, id).map_err(Into::into)
    }

    async fn get_by_id(&self, id: Uuid) -> RollbookResult<Member> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('member', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MemberRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "member".into(),
            id: id_str,
        })?;

        row_to_member(row, id).map_err(Into::into)
    }

    async fn update(&self, id: Uuid, input: UpdateMember) -> RollbookResult<Member> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.organization_id.is_some() {
            sets.push("organization_id = $organization_id");
        }
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.phone.is_some() {
            sets.push("phone = $phone");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        sets.push("updated_at = time::now()");

        let query = format!("UPDATE type::record('member', $id) SET {}", sets.join(", "));

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(organization_id) = input.organization_id {
            builder = builder.bind(("organization_id", organization_id.to_string()));
        }
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(phone) = input.phone {
            builder = builder.bind(("phone", phone));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<MemberRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "member".into(),
            id: id_str,
        })?;

        row_to_member(row, id).map_err(Into::into)
    }

    async fn delete(&self, id: Uuid) -> RollbookResult<()> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("DELETE type::record('member', $id) RETURN BEFORE")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MemberRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "member".into(),
                id: id_str,
            }
            .into());
        }

        Ok(())
    }

    async fn list_by_organization(
        &self,
        organization_id: Uuid,
        pagination: Pagination,
    ) -> RollbookResult<PaginatedResult<Member>> {
        let organization_id_str = organization_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM member \
                 WHERE organization_id = $organization_id GROUP ALL",
            )
            .bind(("organization_id", organization_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM member \
                 WHERE organization_id = $organization_id \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("organization_id", organization_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MemberRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_member())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
