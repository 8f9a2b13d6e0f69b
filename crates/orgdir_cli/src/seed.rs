//! Demo catalog used by `orgdir seed`.

use anyhow::{Context, Result};
use log::info;
use orgdir_core::{
    ActivityId, ActivityService, CatalogRepository, Coordinate, DepthPolicy, NewBuilding,
    NewOrganization, OrganizationFilter, SqliteCatalogRepository,
};
use rusqlite::Connection;
use std::sync::Arc;

const BUILDINGS: &[(&str, f64, f64)] = &[
    ("Moscow, Tverskaya st. 1", 55.757718, 37.612276),
    ("Moscow, Arbat st. 10", 55.752023, 37.591094),
    ("Moscow, Red Square 3", 55.753544, 37.621202),
    ("Moscow, Novy Arbat st. 15", 55.752675, 37.583894),
    ("Moscow, Leninsky prospekt 45", 55.703636, 37.587152),
    ("Saint Petersburg, Nevsky prospekt 28", 59.935241, 30.327894),
    ("Saint Petersburg, Bolshaya Morskaya st. 18", 59.933861, 30.309118),
    ("Novosibirsk, Lenina st. 1", 55.030199, 82.920430),
];

/// `(name, index of parent in this table)`; parents precede children.
const ACTIVITIES: &[(&str, Option<usize>)] = &[
    ("Food", None),
    ("Cars", None),
    ("Services", None),
    ("Medicine", None),
    ("Meat products", Some(0)),
    ("Dairy products", Some(0)),
    ("Bakery", Some(0)),
    ("Beverages", Some(0)),
    ("Trucks", Some(1)),
    ("Passenger cars", Some(1)),
    ("Parts", Some(9)),
    ("Accessories", Some(9)),
    ("Tires and wheels", Some(9)),
    ("Appliance repair", Some(2)),
    ("Cleaning", Some(2)),
    ("Dentistry", Some(3)),
    ("Therapy", Some(3)),
    ("Pharmacies", Some(3)),
    ("Sausages", Some(4)),
    ("Convenience foods", Some(4)),
];

/// `(name, phones, building index, activity index)`.
const ORGANIZATIONS: &[(&str, &[&str], usize, usize)] = &[
    ("Horns and Hooves LLC", &["8-495-123-45-67", "8-495-123-45-68"], 0, 4),
    ("Dairy Paradise LLC", &["8-495-222-33-44"], 0, 5),
    ("AutoWorld JSC", &["8-495-333-44-55", "8-800-100-200-300"], 1, 9),
    ("Petrov Tire Service", &["8-926-555-66-77"], 1, 12),
    ("Health Clinic", &["8-495-444-55-66", "8-495-444-55-67"], 2, 15),
    ("Bread House Bakery", &["8-495-666-77-88"], 3, 6),
    ("Clean Home LLC", &["8-495-777-88-99", "8-495-777-88-00"], 4, 14),
    ("Wellness Pharmacy", &["8-812-111-22-33"], 5, 17),
    ("Northwest Auto LLC", &["8-812-222-33-44", "8-812-222-33-45"], 6, 8),
    ("Siberian Plains Cafe", &["8-383-333-44-55"], 7, 0),
    ("Sausage Heaven Store", &["8-495-888-99-00"], 3, 18),
    ("Parts Lux LLC", &["8-495-999-00-11", "8-800-555-35-35"], 4, 10),
];

/// Counts of rows written by [`seed_catalog`].
#[derive(Debug, Default, serde::Serialize)]
pub struct SeedReport {
    pub buildings: usize,
    pub activities: usize,
    pub organizations: usize,
}

/// Writes the demo catalog in one transaction.
///
/// Does nothing when the catalog already holds activities or
/// organizations. Activities go through [`ActivityService`], so `policy`
/// must allow depth 2.
pub fn seed_catalog(conn: &mut Connection, policy: Arc<DepthPolicy>) -> Result<SeedReport> {
    let tx = conn.transaction()?;
    let repo = SqliteCatalogRepository::try_new(&tx)?;
    if !repo.list_activities()?.is_empty()
        || !repo.fetch_organizations(&OrganizationFilter::All)?.is_empty()
    {
        info!("event=catalog_seed module=cli status=skipped reason=not_empty");
        return Ok(SeedReport::default());
    }
    let activities = ActivityService::new(repo, policy);

    let mut building_ids = Vec::with_capacity(BUILDINGS.len());
    for &(address, latitude, longitude) in BUILDINGS {
        let building = repo
            .create_building(&NewBuilding {
                address: address.to_string(),
                location: Coordinate::new(latitude, longitude),
            })
            .with_context(|| format!("failed to create building `{address}`"))?;
        building_ids.push(building.id);
    }

    let mut activity_ids: Vec<ActivityId> = Vec::with_capacity(ACTIVITIES.len());
    for &(name, parent) in ACTIVITIES {
        let parent_id = parent.map(|index| activity_ids[index]);
        let activity = activities
            .create_activity(parent_id, name)
            .with_context(|| format!("failed to create activity `{name}`"))?;
        activity_ids.push(activity.id);
    }

    for &(name, phones, building, activity) in ORGANIZATIONS {
        repo.create_organization(&NewOrganization {
            name: name.to_string(),
            phones: phones.iter().map(|phone| phone.to_string()).collect(),
            building_id: building_ids[building],
            activity_ids: vec![activity_ids[activity]],
        })
        .with_context(|| format!("failed to create organization `{name}`"))?;
    }
    tx.commit()?;

    let report = SeedReport {
        buildings: BUILDINGS.len(),
        activities: ACTIVITIES.len(),
        organizations: ORGANIZATIONS.len(),
    };
    info!(
        "event=catalog_seed module=cli status=ok buildings={} activities={} organizations={}",
        report.buildings, report.activities, report.organizations
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::{seed_catalog, ACTIVITIES, ORGANIZATIONS};
    use orgdir_core::{
        open_db_in_memory, CatalogRepository, DepthPolicy, SearchService,
        SqliteCatalogRepository,
    };
    use std::sync::Arc;

    #[test]
    fn seed_is_idempotent_and_searchable() {
        let mut conn = open_db_in_memory().unwrap();
        let policy = Arc::new(DepthPolicy::default());

        let first = seed_catalog(&mut conn, Arc::clone(&policy)).unwrap();
        assert_eq!(first.organizations, ORGANIZATIONS.len());
        assert_eq!(first.activities, ACTIVITIES.len());

        let second = seed_catalog(&mut conn, Arc::clone(&policy)).unwrap();
        assert_eq!(second.organizations, 0);

        let repo = SqliteCatalogRepository::try_new(&conn).unwrap();
        let search = SearchService::new(repo, policy);
        let food: Vec<_> = search
            .search_by_activity("Food")
            .unwrap()
            .into_iter()
            .map(|org| org.name)
            .collect();
        assert_eq!(
            food,
            vec![
                "Horns and Hooves LLC",
                "Dairy Paradise LLC",
                "Bread House Bakery",
                "Siberian Plains Cafe",
                "Sausage Heaven Store",
            ]
        );
    }

    #[test]
    fn failed_seed_leaves_catalog_empty_and_can_be_retried() {
        let mut conn = open_db_in_memory().unwrap();

        // "Parts" sits two levels below "Cars".
        let err = seed_catalog(&mut conn, Arc::new(DepthPolicy::new(1))).unwrap_err();
        assert!(err.to_string().contains("Parts"), "{err:#}");

        {
            let repo = SqliteCatalogRepository::try_new(&conn).unwrap();
            assert!(repo.list_activities().unwrap().is_empty());
            let buildings: i64 = conn
                .query_row("SELECT COUNT(*) FROM buildings;", [], |row| row.get(0))
                .unwrap();
            assert_eq!(buildings, 0);
        }

        let report = seed_catalog(&mut conn, Arc::new(DepthPolicy::default())).unwrap();
        assert_eq!(report.organizations, ORGANIZATIONS.len());
    }
}
