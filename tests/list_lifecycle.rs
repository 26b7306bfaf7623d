//! End-to-end behaviour of the list service over the SQLite store.

use std::sync::Arc;

use aviary::db;
use aviary::events::EventBus;
use aviary::services::ListService;
use aviary::store::SqliteListStore;
use aviary::{AppError, BirdRecord, User};
use rstest::{fixture, rstest};

#[fixture]
fn service() -> ListService {
    let conn = db::share(db::open_in_memory().expect("in-memory database"));
    ListService::new(Arc::new(SqliteListStore::new(conn)), EventBus::new())
}

#[fixture]
fn user() -> User {
    User {
        id: "user-1".into(),
        display_name: "Ada".into(),
    }
}

fn blue_jay() -> BirdRecord {
    BirdRecord {
        id: Some(42),
        name: "Blue Jay".into(),
        sci_name: "Cyanocitta cristata".into(),
        status: "Low Concern".into(),
        region: vec!["North America".into()],
        images: vec!["https://img.example/jay.jpg".into()],
        ..BirdRecord::default()
    }
}

fn entry_count(service: &ListService, user: &User, list_id: &str) -> usize {
    service
        .list_owned_lists(Some(user))
        .unwrap()
        .into_iter()
        .find(|list| list.id == list_id)
        .map(|list| list.entry_count())
        .expect("list should exist")
}

#[rstest]
#[case("Backyard Birds", "")]
#[case("Spring migration", "Warblers at the lake")]
#[case("  Padded  ", "  trimmed  ")]
fn created_list_appears_exactly_once(
    service: ListService,
    user: User,
    #[case] name: &str,
    #[case] description: &str,
) {
    let id = service.create_list(Some(&user), name, description).unwrap();

    let lists = service.list_owned_lists(Some(&user)).unwrap();
    let matching: Vec<_> = lists
        .iter()
        .filter(|list| list.name == name.trim())
        .collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].id, id);
    assert_eq!(matching[0].description, description.trim());
    assert_eq!(matching[0].owner_id, user.id);
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("\t")]
fn blank_names_are_rejected_without_writing(service: ListService, user: User, #[case] name: &str) {
    let err = service.create_list(Some(&user), name, "desc").unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(service.list_owned_lists(Some(&user)).unwrap().is_empty());
}

#[rstest]
fn duplicates_each_add_one_entry(service: ListService, user: User) {
    let list_id = service.create_list(Some(&user), "Feeder", "").unwrap();

    for expected in 1..=3 {
        service.add_bird_to_list(&list_id, &blue_jay()).unwrap();
        assert_eq!(entry_count(&service, &user, &list_id), expected);
    }
}

#[rstest]
fn removing_an_entry_decrements_the_count(service: ListService, user: User) {
    let list_id = service.create_list(Some(&user), "Feeder", "").unwrap();
    let keep = service.add_bird_to_list(&list_id, &blue_jay()).unwrap();
    let drop = service.add_bird_to_list(&list_id, &blue_jay()).unwrap();

    service.remove_bird_from_list(&list_id, &drop).unwrap();

    let lists = service.list_owned_lists(Some(&user)).unwrap();
    let entries = &lists[0].entries;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, keep);
    assert!(entries.iter().all(|entry| entry.id != drop));
}

#[rstest]
fn deleted_list_is_gone(service: ListService, user: User) {
    let doomed = service.create_list(Some(&user), "Doomed", "").unwrap();
    let kept = service.create_list(Some(&user), "Kept", "").unwrap();
    service.add_bird_to_list(&doomed, &blue_jay()).unwrap();

    service.delete_list(&doomed).unwrap();

    let ids: Vec<_> = service
        .list_owned_lists(Some(&user))
        .unwrap()
        .into_iter()
        .map(|list| list.id)
        .collect();
    assert_eq!(ids, vec![kept]);
}

#[rstest]
fn lists_are_private_to_their_owner(service: ListService, user: User) {
    let other = User {
        id: "user-2".into(),
        display_name: "Grace".into(),
    };
    service.create_list(Some(&user), "Mine", "").unwrap();
    service.create_list(Some(&other), "Theirs", "").unwrap();

    let mine = service.list_owned_lists(Some(&user)).unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].name, "Mine");
}

#[rstest]
fn snapshots_are_not_linked_to_the_source(service: ListService, user: User) {
    let list_id = service.create_list(Some(&user), "Feeder", "").unwrap();
    let mut bird = blue_jay();
    service.add_bird_to_list(&list_id, &bird).unwrap();

    bird.status = "Red Watch List".into();

    let lists = service.list_owned_lists(Some(&user)).unwrap();
    assert_eq!(lists[0].entries[0].bird.status, "Low Concern");
}

#[rstest]
fn backyard_birds_scenario(service: ListService, user: User) {
    assert!(service.list_owned_lists(Some(&user)).unwrap().is_empty());

    let list_id = service.create_list(Some(&user), "Backyard Birds", "").unwrap();
    assert_eq!(entry_count(&service, &user, &list_id), 0);

    let entry_id = service.add_bird_to_list(&list_id, &blue_jay()).unwrap();
    assert_eq!(entry_count(&service, &user, &list_id), 1);

    service.remove_bird_from_list(&list_id, &entry_id).unwrap();
    assert_eq!(entry_count(&service, &user, &list_id), 0);
}

#[rstest]
fn adding_to_a_missing_list_is_not_found(service: ListService) {
    let err = service.add_bird_to_list("missing", &blue_jay()).unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
