use orgdir_core::db::open_db_in_memory;
use orgdir_core::geo::BoundingBox;
use orgdir_core::{
    CatalogRepository, Coordinate, NewBuilding, NewOrganization, OrganizationFilter, RepoError,
    SqliteCatalogRepository,
};
use std::collections::BTreeSet;

fn building(address: &str, latitude: f64, longitude: f64) -> NewBuilding {
    NewBuilding {
        address: address.to_string(),
        location: Coordinate::new(latitude, longitude),
    }
}

#[test]
fn create_organization_hydrates_phones_building_and_activities() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::try_new(&conn).unwrap();

    let food = repo.create_activity("Food", None).unwrap();
    let meat = repo.create_activity("Meat", Some(food.id)).unwrap();
    let office = repo
        .create_building(&building("Moscow, Lenina 1, office 3", 55.751244, 37.618423))
        .unwrap();

    let created = repo
        .create_organization(&NewOrganization {
            name: "Horns and Hooves LLC".to_string(),
            phones: vec!["2-222-222".to_string(), "8-923-666-13-13".to_string()],
            building_id: office.id,
            activity_ids: vec![meat.id, food.id, meat.id],
        })
        .unwrap();

    assert_eq!(created.name, "Horns and Hooves LLC");
    assert_eq!(created.phones, vec!["2-222-222", "8-923-666-13-13"]);
    assert_eq!(created.building, office);
    assert_eq!(created.activity_ids, vec![food.id, meat.id]);
}

#[test]
fn activities_keep_parent_links_and_id_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::try_new(&conn).unwrap();

    let food = repo.create_activity("Food", None).unwrap();
    let cars = repo.create_activity("Cars", None).unwrap();
    let parts = repo.create_activity("Parts", Some(cars.id)).unwrap();
    let food_parts = repo.create_activity("Parts", Some(food.id)).unwrap();

    let all = repo.list_activities().unwrap();
    let ids: Vec<_> = all.iter().map(|activity| activity.id).collect();
    assert_eq!(ids, vec![food.id, cars.id, parts.id, food_parts.id]);

    let by_name = repo.fetch_activities_by_name("Parts").unwrap();
    assert_eq!(by_name, vec![parts.clone(), food_parts]);
    assert_eq!(repo.get_activity(parts.id).unwrap(), Some(parts));
    assert_eq!(repo.get_activity(9_999).unwrap(), None);
}

#[test]
fn duplicate_sibling_name_is_conflict() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::try_new(&conn).unwrap();

    let food = repo.create_activity("Food", None).unwrap();
    repo.create_activity("Meat", Some(food.id)).unwrap();

    let err = repo.create_activity("Meat", Some(food.id)).unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)));

    let err = repo.create_activity("Food", None).unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)));
}

#[test]
fn missing_parent_and_blank_name_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::try_new(&conn).unwrap();

    let err = repo.create_activity("Orphan", Some(42)).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    let err = repo.create_activity("   ", None).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
}

#[test]
fn invalid_building_coordinates_are_rejected_before_insert() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::try_new(&conn).unwrap();

    let err = repo
        .create_building(&building("North of the pole", 90.5, 0.0))
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidCoordinate(_)));

    let err = repo
        .create_building(&building("Nowhere", f64::NAN, 10.0))
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidCoordinate(_)));
}

#[test]
fn duplicate_organization_name_is_conflict_and_rolls_back() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::try_new(&conn).unwrap();
    let office = repo
        .create_building(&building("Moscow, Lenina 1", 55.75, 37.62))
        .unwrap();

    let new_org = NewOrganization {
        name: "Milk Farm".to_string(),
        phones: vec!["3-333-333".to_string()],
        building_id: office.id,
        activity_ids: Vec::new(),
    };
    repo.create_organization(&new_org).unwrap();
    let err = repo.create_organization(&new_org).unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)));

    let phone_rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM organization_phones;", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(phone_rows, 1);
}

#[test]
fn organization_insert_joins_caller_transaction() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let tx = conn.transaction().unwrap();
        let repo = SqliteCatalogRepository::try_new(&tx).unwrap();
        let office = repo
            .create_building(&building("Moscow, Arbat st. 10", 55.752023, 37.591094))
            .unwrap();
        repo.create_organization(&NewOrganization {
            name: "AutoWorld JSC".to_string(),
            phones: vec!["8-495-333-44-55".to_string()],
            building_id: office.id,
            activity_ids: Vec::new(),
        })
        .unwrap();
        assert_eq!(
            repo.fetch_organizations(&OrganizationFilter::All)
                .unwrap()
                .len(),
            1
        );
    }

    let repo = SqliteCatalogRepository::try_new(&conn).unwrap();
    assert!(repo
        .fetch_organizations(&OrganizationFilter::All)
        .unwrap()
        .is_empty());
}

#[test]
fn organization_with_unknown_activity_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::try_new(&conn).unwrap();
    let office = repo
        .create_building(&building("Moscow, Lenina 1", 55.75, 37.62))
        .unwrap();

    let err = repo
        .create_organization(&NewOrganization {
            name: "Ghost Shop".to_string(),
            phones: Vec::new(),
            building_id: office.id,
            activity_ids: vec![77],
        })
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert!(repo
        .fetch_organizations(&OrganizationFilter::All)
        .unwrap()
        .is_empty());
}

#[test]
fn filters_push_down_and_order_by_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::try_new(&conn).unwrap();
    let food = repo.create_activity("Food", None).unwrap();
    let cars = repo.create_activity("Cars", None).unwrap();
    let moscow = repo
        .create_building(&building("Moscow, Lenina 1", 55.75, 37.62))
        .unwrap();
    let spb = repo
        .create_building(&building("Saint Petersburg, Nevsky 10", 59.93, 30.34))
        .unwrap();

    let mut ids = Vec::new();
    for (name, building_id, activity_id) in [
        ("Auto World", moscow.id, cars.id),
        ("Milk Farm", spb.id, food.id),
        ("Bakery No. 1", moscow.id, food.id),
    ] {
        let org = repo
            .create_organization(&NewOrganization {
                name: name.to_string(),
                phones: Vec::new(),
                building_id,
                activity_ids: vec![activity_id],
            })
            .unwrap();
        ids.push(org.id);
    }

    let names = |filter: OrganizationFilter| -> Vec<String> {
        repo.fetch_organizations(&filter)
            .unwrap()
            .into_iter()
            .map(|org| org.name)
            .collect()
    };

    assert_eq!(
        names(OrganizationFilter::All),
        vec!["Auto World", "Milk Farm", "Bakery No. 1"]
    );
    assert_eq!(names(OrganizationFilter::Id(ids[1])), vec!["Milk Farm"]);
    assert_eq!(
        names(OrganizationFilter::NameEquals("milk farm".to_string())),
        Vec::<String>::new()
    );
    assert_eq!(
        names(OrganizationFilter::NameContains("FARM".to_string())),
        vec!["Milk Farm"]
    );
    assert_eq!(
        names(OrganizationFilter::AddressContains("Lenina".to_string())),
        vec!["Auto World", "Bakery No. 1"]
    );
    assert_eq!(
        names(OrganizationFilter::ActivityIn(BTreeSet::from([food.id]))),
        vec!["Milk Farm", "Bakery No. 1"]
    );
    assert_eq!(
        names(OrganizationFilter::ActivityIn(BTreeSet::new())),
        Vec::<String>::new()
    );
    let bounds = BoundingBox::new(55.0, 37.0, 56.0, 38.0).unwrap();
    assert_eq!(
        names(OrganizationFilter::WithinBounds(bounds)),
        vec!["Auto World", "Bakery No. 1"]
    );
}

#[test]
fn fetch_building_returns_none_for_unknown_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::try_new(&conn).unwrap();
    let office = repo
        .create_building(&building("  Novosibirsk, Krasny 5  ", 55.03, 82.92))
        .unwrap();

    assert_eq!(office.address, "Novosibirsk, Krasny 5");
    assert_eq!(repo.fetch_building(office.id).unwrap(), Some(office));
    assert_eq!(repo.fetch_building(404).unwrap(), None);
}
