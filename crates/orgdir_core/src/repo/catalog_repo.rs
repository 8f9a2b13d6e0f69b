//! Catalog repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the read capability the search and activity services consume.
//! - Provide seeding writes for activities, buildings and organizations.
//! - Keep SQL details and result ordering inside the repository boundary.
//!
//! # Invariants
//! - Organization listings are ordered by ascending id.
//! - Read paths reject invalid persisted data instead of masking it.
//! - Write paths validate coordinates and names before SQL mutations.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::geo::{BoundingBox, Coordinate, GeoError};
use crate::model::activity::{Activity, ActivityId};
use crate::model::building::{Building, BuildingId, NewBuilding};
use crate::model::organization::{NewOrganization, Organization, OrganizationId};
use rusqlite::types::Value;
use log::error;
use rusqlite::{ffi, params, params_from_iter, Connection, ErrorCode, OptionalExtension, Row};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

const ORGANIZATION_SELECT_SQL: &str = "SELECT
    o.id AS id,
    o.name AS name,
    b.id AS building_id,
    b.address AS address,
    b.latitude AS latitude,
    b.longitude AS longitude
FROM organizations o
JOIN buildings b ON b.id = o.building_id";

const REQUIRED_TABLES: &[&str] = &[
    "activities",
    "buildings",
    "organizations",
    "organization_phones",
    "organization_activities",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from catalog persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Row addressed by id does not exist.
    NotFound { entity: &'static str, id: i64 },
    /// Write collides with a uniqueness constraint.
    Conflict(String),
    /// Write input violates a catalog rule.
    Validation(String),
    /// Building coordinates are out of range.
    InvalidCoordinate(GeoError),
    /// Persisted data cannot be converted into a valid read model.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Conflict(message) => write!(f, "catalog conflict: {message}"),
            Self::Validation(message) => write!(f, "invalid catalog input: {message}"),
            Self::InvalidCoordinate(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted catalog data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "catalog repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "catalog repository requires table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidCoordinate(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<GeoError> for RepoError {
    fn from(value: GeoError) -> Self {
        Self::InvalidCoordinate(value)
    }
}

/// Predicate pushed down to [`CatalogRepository::fetch_organizations`].
#[derive(Debug, Clone, PartialEq)]
pub enum OrganizationFilter {
    All,
    Id(OrganizationId),
    /// Exact, case-sensitive name.
    NameEquals(String),
    /// Case-insensitive substring of the organization name.
    NameContains(String),
    /// Case-sensitive substring of the building address.
    AddressContains(String),
    /// Linked to at least one of these activities.
    ActivityIn(BTreeSet<ActivityId>),
    /// Building inside the box, edges inclusive.
    WithinBounds(BoundingBox),
}

impl OrganizationFilter {
    /// Stable label used in log events.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Id(_) => "id",
            Self::NameEquals(_) => "name_equals",
            Self::NameContains(_) => "name_contains",
            Self::AddressContains(_) => "address_contains",
            Self::ActivityIn(_) => "activity_in",
            Self::WithinBounds(_) => "within_bounds",
        }
    }
}

/// Repository interface for catalog reads and seeding writes.
pub trait CatalogRepository {
    /// Inserts one activity under an optional parent.
    fn create_activity(&self, name: &str, parent_id: Option<ActivityId>)
        -> RepoResult<Activity>;
    /// Inserts one building.
    fn create_building(&self, building: &NewBuilding) -> RepoResult<Building>;
    /// Inserts one organization with its phones and activity links.
    fn create_organization(&self, organization: &NewOrganization) -> RepoResult<Organization>;
    /// Loads one activity by id.
    fn get_activity(&self, id: ActivityId) -> RepoResult<Option<Activity>>;
    /// Loads all activities with this exact name, ordered by id.
    fn fetch_activities_by_name(&self, name: &str) -> RepoResult<Vec<Activity>>;
    /// Loads the whole activity forest, ordered by id.
    fn list_activities(&self) -> RepoResult<Vec<Activity>>;
    /// Loads one building by id.
    fn fetch_building(&self, id: BuildingId) -> RepoResult<Option<Building>>;
    /// Loads organizations matching `filter`, ordered by id.
    fn fetch_organizations(&self, filter: &OrganizationFilter) -> RepoResult<Vec<Organization>>;
}

/// SQLite-backed catalog repository.
#[derive(Clone, Copy)]
pub struct SqliteCatalogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCatalogRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_catalog_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CatalogRepository for SqliteCatalogRepository<'_> {
    fn create_activity(
        &self,
        name: &str,
        parent_id: Option<ActivityId>,
    ) -> RepoResult<Activity> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RepoError::Validation(
                "activity name must not be blank".to_string(),
            ));
        }

        self.conn
            .execute(
                "INSERT INTO activities (name, parent_id) VALUES (?1, ?2);",
                params![name, parent_id],
            )
            .map_err(|err| map_write_error(err, format!("activity `{name}`")))?;

        Ok(Activity::new(self.conn.last_insert_rowid(), name, parent_id))
    }

    fn create_building(&self, building: &NewBuilding) -> RepoResult<Building> {
        let address = building.address.trim();
        if address.is_empty() {
            return Err(RepoError::Validation(
                "building address must not be blank".to_string(),
            ));
        }
        let location = building.location.validate()?;

        self.conn
            .execute(
                "INSERT INTO buildings (address, latitude, longitude) VALUES (?1, ?2, ?3);",
                params![address, location.latitude, location.longitude],
            )
            .map_err(|err| map_write_error(err, format!("building `{address}`")))?;

        Ok(Building {
            id: self.conn.last_insert_rowid(),
            address: address.to_string(),
            location,
        })
    }

    fn create_organization(&self, organization: &NewOrganization) -> RepoResult<Organization> {
        let name = organization.name.trim();
        if name.is_empty() {
            return Err(RepoError::Validation(
                "organization name must not be blank".to_string(),
            ));
        }

        // Nests inside a caller's transaction when one is open.
        self.conn.execute_batch("SAVEPOINT create_organization;")?;
        let id = match insert_organization_rows(self.conn, name, organization) {
            Ok(id) => {
                self.conn.execute_batch("RELEASE create_organization;")?;
                id
            }
            Err(err) => {
                if let Err(rollback_err) = self
                    .conn
                    .execute_batch("ROLLBACK TO create_organization; RELEASE create_organization;")
                {
                    error!(
                        "event=org_create module=repo status=error error_code=rollback_failed error={rollback_err}"
                    );
                }
                return Err(err);
            }
        };

        self.fetch_organizations(&OrganizationFilter::Id(id))?
            .into_iter()
            .next()
            .ok_or(RepoError::NotFound {
                entity: "organization",
                id,
            })
    }

    fn get_activity(&self, id: ActivityId) -> RepoResult<Option<Activity>> {
        self.conn
            .query_row(
                "SELECT id, name, parent_id FROM activities WHERE id = ?1;",
                [id],
                parse_activity_row,
            )
            .optional()
            .map_err(Into::into)
    }

    fn fetch_activities_by_name(&self, name: &str) -> RepoResult<Vec<Activity>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, parent_id
             FROM activities
             WHERE name = ?1
             ORDER BY id ASC;",
        )?;
        let rows = stmt.query_map([name], parse_activity_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn list_activities(&self) -> RepoResult<Vec<Activity>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, parent_id
             FROM activities
             ORDER BY id ASC;",
        )?;
        let rows = stmt.query_map([], parse_activity_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn fetch_building(&self, id: BuildingId) -> RepoResult<Option<Building>> {
        let mut stmt = self.conn.prepare(
            "SELECT id AS building_id, address, latitude, longitude
             FROM buildings
             WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_building_row(row)?));
        }
        Ok(None)
    }

    fn fetch_organizations(&self, filter: &OrganizationFilter) -> RepoResult<Vec<Organization>> {
        let mut sql = format!("{ORGANIZATION_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        match filter {
            OrganizationFilter::All | OrganizationFilter::NameContains(_) => {}
            OrganizationFilter::Id(id) => {
                sql.push_str(" AND o.id = ?");
                bind_values.push(Value::Integer(*id));
            }
            OrganizationFilter::NameEquals(name) => {
                sql.push_str(" AND o.name = ?");
                bind_values.push(Value::Text(name.clone()));
            }
            OrganizationFilter::AddressContains(fragment) => {
                sql.push_str(" AND instr(b.address, ?) > 0");
                bind_values.push(Value::Text(fragment.clone()));
            }
            OrganizationFilter::ActivityIn(activity_ids) => {
                if activity_ids.is_empty() {
                    return Ok(Vec::new());
                }
                let placeholders = vec!["?"; activity_ids.len()].join(", ");
                sql.push_str(&format!(
                    " AND EXISTS (
                        SELECT 1
                        FROM organization_activities oa
                        WHERE oa.organization_id = o.id
                          AND oa.activity_id IN ({placeholders})
                    )"
                ));
                bind_values.extend(activity_ids.iter().copied().map(Value::Integer));
            }
            OrganizationFilter::WithinBounds(bounds) => {
                sql.push_str(
                    " AND b.latitude BETWEEN ? AND ?
                      AND b.longitude BETWEEN ? AND ?",
                );
                bind_values.extend(
                    [bounds.min_lat, bounds.max_lat, bounds.min_lon, bounds.max_lon]
                        .into_iter()
                        .map(Value::Real),
                );
            }
        }

        sql.push_str(" ORDER BY o.id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut heads = Vec::new();
        while let Some(row) = rows.next()? {
            heads.push(parse_organization_head(row)?);
        }

        if let OrganizationFilter::NameContains(fragment) = filter {
            let needle = fragment.to_lowercase();
            heads.retain(|(_, name, _)| name.to_lowercase().contains(needle.as_str()));
        }

        let mut organizations = Vec::with_capacity(heads.len());
        for (id, name, building) in heads {
            organizations.push(Organization {
                id,
                name,
                phones: load_phones(self.conn, id)?,
                building,
                activity_ids: load_activity_ids(self.conn, id)?,
            });
        }
        Ok(organizations)
    }
}

fn insert_organization_rows(
    conn: &Connection,
    name: &str,
    organization: &NewOrganization,
) -> RepoResult<OrganizationId> {
    conn.execute(
        "INSERT INTO organizations (name, building_id) VALUES (?1, ?2);",
        params![name, organization.building_id],
    )
    .map_err(|err| map_write_error(err, format!("organization `{name}`")))?;
    let id = conn.last_insert_rowid();

    for (position, phone) in organization.phones.iter().enumerate() {
        conn.execute(
            "INSERT INTO organization_phones (organization_id, position, phone)
             VALUES (?1, ?2, ?3);",
            params![id, position as i64, phone.trim()],
        )?;
    }

    for activity_id in &organization.activity_ids {
        conn.execute(
            "INSERT OR IGNORE INTO organization_activities (organization_id, activity_id)
             VALUES (?1, ?2);",
            params![id, activity_id],
        )
        .map_err(|err| map_write_error(err, format!("activity link {activity_id}")))?;
    }
    Ok(id)
}

fn parse_activity_row(row: &Row<'_>) -> rusqlite::Result<Activity> {
    Ok(Activity {
        id: row.get("id")?,
        name: row.get("name")?,
        parent_id: row.get("parent_id")?,
    })
}

fn parse_building_row(row: &Row<'_>) -> RepoResult<Building> {
    let id: BuildingId = row.get("building_id")?;
    let location = Coordinate::new(row.get("latitude")?, row.get("longitude")?)
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("building {id}: {err}")))?;
    Ok(Building {
        id,
        address: row.get("address")?,
        location,
    })
}

fn parse_organization_head(row: &Row<'_>) -> RepoResult<(OrganizationId, String, Building)> {
    Ok((row.get("id")?, row.get("name")?, parse_building_row(row)?))
}

fn load_phones(conn: &Connection, organization_id: OrganizationId) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT phone
         FROM organization_phones
         WHERE organization_id = ?1
         ORDER BY position ASC;",
    )?;
    let rows = stmt.query_map([organization_id], |row| row.get(0))?;
    rows.collect::<Result<Vec<String>, _>>().map_err(Into::into)
}

fn load_activity_ids(
    conn: &Connection,
    organization_id: OrganizationId,
) -> RepoResult<Vec<ActivityId>> {
    let mut stmt = conn.prepare_cached(
        "SELECT activity_id
         FROM organization_activities
         WHERE organization_id = ?1
         ORDER BY activity_id ASC;",
    )?;
    let rows = stmt.query_map([organization_id], |row| row.get(0))?;
    rows.collect::<Result<Vec<ActivityId>, _>>()
        .map_err(Into::into)
}

fn map_write_error(err: rusqlite::Error, subject: String) -> RepoError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        if failure.code == ErrorCode::ConstraintViolation {
            return match failure.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    RepoError::Conflict(format!("{subject} already exists"))
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    RepoError::Validation(format!("{subject} references a missing row"))
                }
                _ => RepoError::Validation(format!("{subject} violates a constraint")),
            };
        }
    }
    err.into()
}

fn ensure_catalog_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &table in REQUIRED_TABLES {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
