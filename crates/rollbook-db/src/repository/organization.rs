//! SurrealDB implementation of [`OrganizationRepository`].
//!
//! The structural columns (`parent_id`, `level`) are written only
//! through [`OrganizationRepository::set_parent`] and
//! [`OrganizationRepository::set_level`]; the regular update path
//! cannot reach them.

use chrono::{DateTime, NaiveDate, Utc};
use rollbook_core::error::{RollbookError, RollbookResult};
use rollbook_core::models::organization::{
    CreateOrganization, Organization, OrganizationType, UpdateOrganization,
};
use rollbook_core::repository::{OrganizationRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct OrganizationRow {
    name: String,
    code: Option<String>,
    org_type: String,
    parent_id: Option<String>,
    level: u32,
    secretary_id: Option<String>,
    description: Option<String>,
    address: Option<String>,
    contact_phone: Option<String>,
    established_date: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct OrganizationRowWithId {
    record_id: String,
    name: String,
    code: Option<String>,
    org_type: String,
    parent_id: Option<String>,
    level: u32,
    secretary_id: Option<String>,
    description: Option<String>,
    address: Option<String>,
    contact_phone: Option<String>,
    established_date: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn parse_org_type(s: &str) -> Result<OrganizationType, DbError> {
    match s {
        "Committee" => Ok(OrganizationType::Committee),
        "GeneralBranch" => Ok(OrganizationType::GeneralBranch),
        "Branch" => Ok(OrganizationType::Branch),
        "WorkCommittee" => Ok(OrganizationType::WorkCommittee),
        other => Err(DbError::Migration(format!(
            "unknown organization type: {other}"
        ))),
    }
}

fn org_type_to_string(t: &OrganizationType) -> &'static str {
    match t {
        OrganizationType::Committee => "Committee",
        OrganizationType::GeneralBranch => "GeneralBranch",
        OrganizationType::Branch => "Branch",
        OrganizationType::WorkCommittee => "WorkCommittee",
    }
}

fn parse_uuid(field: &str, s: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(s).map_err(|e| DbError::Migration(format!("invalid {field} UUID: {e}")))
}

fn parse_date(s: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| DbError::Migration(format!("invalid date: {e}")))
}

fn row_to_organization(row: OrganizationRow, id: Uuid) -> Result<Organization, DbError> {
    let parent_id = row
        .parent_id
        .as_deref()
        .map(|p| parse_uuid("parent", p))
        .transpose()?;
    let secretary_id = row
        .secretary_id
        .as_deref()
        .map(|s| parse_uuid("secretary", s))
        .transpose()?;
    let established_date = row.established_date.as_deref().map(parse_date).transpose()?;

    Ok(Organization {
        id,
        name: row.name,
        code: row.code,
        org_type: parse_org_type(&row.org_type)?,
        parent_id,
        level: row.level,
        secretary_id,
        description: row.description,
        address: row.address,
        contact_phone: row.contact_phone,
        established_date,
        is_active: row.is_active,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

impl OrganizationRowWithId {
    fn try_into_organization(self) -> Result<Organization, DbError> {
        let id = parse_uuid("record", &self.record_id)?;
        row_to_organization(
            OrganizationRow {
                name: self.name,
                code: self.code,
                org_type: self.org_type,
                parent_id: self.parent_id,
                level: self.level,
                secretary_id: self.secretary_id,
                description: self.description,
                address: self.address,
                contact_phone: self.contact_phone,
                established_date: self.established_date,
                is_active: self.is_active,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            id,
        )
    }
}

/// SurrealDB implementation of the Organization repository.
#[derive(Clone)]
pub struct SurrealOrganizationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealOrganizationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> OrganizationRepository for SurrealOrganizationRepository<C> {
    async fn create(&self, input: CreateOrganization, level: u32) -> RollbookResult<Organization> {
        // Code uniqueness backstop; the hierarchy service also checks
        // before calling.
        if let Some(code) = &input.code {
            match self.get_by_code(code).await {
                Ok(_) => {
                    return Err(RollbookError::DuplicateCode { code: code.clone() });
                }
                Err(RollbookError::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('organization', $id) SET \
                 name = $name, code = $code, org_type = $org_type, \
                 parent_id = $parent_id, level = $level, \
                 secretary_id = $secretary_id, \
                 description = $description, address = $address, \
                 contact_phone = $contact_phone, \
                 established_date = $established_date, \
                 is_active = $is_active",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("code", input.code))
            .bind(("org_type", org_type_to_string(&input.org_type)))
            .bind(("parent_id", input.parent_id.map(|p| p.to_string())))
            .bind(("level", level))
            .bind(("secretary_id", input.secretary_id.map(|s| s.to_string())))
            .bind(("description", input.description))
            .bind(("address", input.address))
            .bind(("contact_phone", input.contact_phone))
            .bind((
                "established_date",
                input.established_date.map(|d| d.to_string()),
            ))
            .bind(("is_active", input.is_active.unwrap_or(true)))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<OrganizationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "organization".into(),
            id: id_str,
        })?;

        row_to_organization(row, id).map_err(Into::into)
    }

    async fn get_by_id(&self, id: Uuid) -> RollbookResult<Organization> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('organization', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "organization".into(),
            id: id_str,
        })?;

        row_to_organization(row, id).map_err(Into::into)
    }

    async fn get_by_code(&self, code: &str) -> RollbookResult<Organization> {
        let code_owned = code.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM organization WHERE code = $code",
            )
            .bind(("code", code_owned))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "organization".into(),
            id: format!("code={code}"),
        })?;

        Ok(row.try_into_organization()?)
    }

    async fn get_by_parent(&self, parent_id: Option<Uuid>) -> RollbookResult<Vec<Organization>> {
        let parent_id_str = parent_id.map(|p| p.to_string());

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM organization \
                 WHERE parent_id = $parent_id \
                 ORDER BY created_at ASC",
            )
            .bind(("parent_id", parent_id_str))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationRowWithId> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .map(|row| row.try_into_organization())
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }

    async fn get_all(&self) -> RollbookResult<Vec<Organization>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM organization \
                 ORDER BY created_at ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationRowWithId> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .map(|row| row.try_into_organization())
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }

    async fn list(&self, pagination: Pagination) -> RollbookResult<PaginatedResult<Organization>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM organization GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM organization \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_organization())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn update(&self, id: Uuid, input: UpdateOrganization) -> RollbookResult<Organization> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.code.is_some() {
            sets.push("code = $code");
        }
        if input.org_type.is_some() {
            sets.push("org_type = $org_type");
        }
        if input.secretary_id.is_some() {
            sets.push("secretary_id = $secretary_id");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.address.is_some() {
            sets.push("address = $address");
        }
        if input.contact_phone.is_some() {
            sets.push("contact_phone = $contact_phone");
        }
        if input.established_date.is_some() {
            sets.push("established_date = $established_date");
        }
        if input.is_active.is_some() {
            sets.push("is_active = $is_active");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('organization', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(code) = input.code {
            builder = builder.bind(("code", code));
        }
        if let Some(org_type) = input.org_type {
            builder = builder.bind(("org_type", org_type_to_string(&org_type)));
        }
        if let Some(secretary_id) = input.secretary_id {
            builder = builder.bind(("secretary_id", secretary_id.map(|s| s.to_string())));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(address) = input.address {
            builder = builder.bind(("address", address));
        }
        if let Some(contact_phone) = input.contact_phone {
            builder = builder.bind(("contact_phone", contact_phone));
        }
        if let Some(established_date) = input.established_date {
            builder = builder.bind((
                "established_date",
                established_date.map(|d| d.to_string()),
            ));
        }
        if let Some(is_active) = input.is_active {
            builder = builder.bind(("is_active", is_active));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<OrganizationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "organization".into(),
            id: id_str,
        })?;

        row_to_organization(row, id).map_err(Into::into)
    }

    async fn set_parent(
        &self,
        id: Uuid,
        parent_id: Option<Uuid>,
        level: u32,
    ) -> RollbookResult<()> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "UPDATE type::record('organization', $id) SET \
                 parent_id = $parent_id, level = $level, \
                 updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("parent_id", parent_id.map(|p| p.to_string())))
            .bind(("level", level))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "organization".into(),
                id: id_str,
            }
            .into());
        }

        Ok(())
    }

    async fn set_level(&self, id: Uuid, level: u32) -> RollbookResult<()> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "UPDATE type::record('organization', $id) SET \
                 level = $level, updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("level", level))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "organization".into(),
                id: id_str,
            }
            .into());
        }

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RollbookResult<()> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("DELETE type::record('organization', $id) RETURN BEFORE")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "organization".into(),
                id: id_str,
            }
            .into());
        }

        Ok(())
    }
}
