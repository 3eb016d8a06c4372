//! Integration tests for the organizer tree: container invariants
//! across folder/project deletion, persistence round-trips, and
//! filter behavior.

use tempfile::TempDir;
use threadbook::{Organizer, OrganizerState, StateStore};

fn empty_organizer() -> (TempDir, Organizer) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = StateStore::new(dir.path().join("organizer.json"));
    store
        .save(&OrganizerState::default())
        .expect("Failed to seed state file");
    (dir, Organizer::load(store))
}

/// Collect every thread id across all containers
fn container_ids(organizer: &Organizer) -> Vec<String> {
    let mut ids = organizer.state().uncategorized.clone();
    for project in &organizer.state().projects {
        for folder in &project.folders {
            ids.extend(folder.chats.iter().cloned());
        }
    }
    ids
}

#[test]
fn folder_churn_never_loses_or_duplicates_chats() {
    let (_dir, mut organizer) = empty_organizer();
    let project = organizer.create_project("Acme").unwrap();

    // Build and tear down folders repeatedly; every chat registered
    // along the way must survive in exactly one container
    let mut registered = Vec::new();
    for round in 0..4 {
        let folder = organizer
            .create_folder(project, &format!("Round {}", round))
            .unwrap();
        for i in 0..3 {
            let id = format!("thread-{}-{}", round, i);
            organizer
                .register_or_update_chat(&id, "subject", Some(folder))
                .unwrap();
            registered.push(id);
        }
        organizer.delete_folder(folder).unwrap();
    }

    let mut ids = container_ids(&organizer);
    ids.sort();
    let mut expected = registered.clone();
    expected.sort();
    assert_eq!(ids, expected);
    for id in &registered {
        assert!(organizer.chat(id).is_some());
    }
}

#[test]
fn delete_folder_with_two_chats_moves_both_to_uncategorized() {
    let (_dir, mut organizer) = empty_organizer();
    let project = organizer.create_project("Acme").unwrap();
    let leads = organizer.create_folder(project, "Leads").unwrap();
    organizer.register_or_update_chat("t1", "First", Some(leads)).unwrap();
    organizer.register_or_update_chat("t2", "Second", Some(leads)).unwrap();

    organizer.delete_folder(leads).unwrap();

    assert_eq!(organizer.state().uncategorized, vec!["t1", "t2"]);
    assert!(organizer.state().projects[0]
        .folders
        .iter()
        .all(|f| f.name != "Leads"));
}

#[test]
fn delete_project_leaves_no_dangling_folder_references() {
    let (_dir, mut organizer) = empty_organizer();
    let acme = organizer.create_project("Acme").unwrap();
    let other = organizer.create_project("Other").unwrap();
    let leads = organizer.create_folder(acme, "Leads").unwrap();
    let docs = organizer.create_folder(acme, "Docs").unwrap();
    let keep = organizer.create_folder(other, "Keep").unwrap();
    organizer.register_or_update_chat("t1", "One", Some(leads)).unwrap();
    organizer.register_or_update_chat("t2", "Two", Some(docs)).unwrap();
    organizer.register_or_update_chat("t3", "Three", Some(keep)).unwrap();

    organizer.delete_project(acme).unwrap();

    // No folder of the deleted project remains anywhere
    for project in &organizer.state().projects {
        for folder in &project.folders {
            assert!(folder.id != leads && folder.id != docs);
        }
    }
    // Its chats appear in uncategorized exactly once each
    assert_eq!(organizer.state().uncategorized, vec!["t1", "t2"]);
    // The untouched project kept its chat
    assert_eq!(organizer.container_of("t3"), Some(keep));
}

#[test]
fn tree_survives_a_reload() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("organizer.json");

    let (project, folder) = {
        let store = StateStore::new(path.clone());
        store.save(&OrganizerState::default()).unwrap();
        let mut organizer = Organizer::load(store);
        let project = organizer.create_project("Acme").unwrap();
        let folder = organizer.create_folder(project, "Leads").unwrap();
        organizer.register_or_update_chat("t1", "Kept chat", Some(folder)).unwrap();
        organizer.register_or_update_chat("t2", "Loose chat", None).unwrap();
        organizer.set_active(Some("t1"));
        organizer.set_folder_open(folder, false).unwrap();
        (project, folder)
    };

    // A second organizer over the same file sees the same tree
    let organizer = Organizer::load(StateStore::new(path));
    assert_eq!(organizer.state().projects[0].id, project);
    assert_eq!(organizer.state().projects[0].folders[0].id, folder);
    assert!(!organizer.state().projects[0].folders[0].open);
    assert_eq!(organizer.state().projects[0].folders[0].chats, vec!["t1"]);
    assert_eq!(organizer.state().uncategorized, vec!["t2"]);
    assert_eq!(organizer.chat("t1").unwrap().title, "Kept chat");
    assert_eq!(organizer.active_thread_id(), Some("t1"));
}

#[test]
fn register_twice_equals_register_once() {
    let (_dir, mut organizer) = empty_organizer();
    let project = organizer.create_project("Acme").unwrap();
    let folder = organizer.create_folder(project, "Leads").unwrap();

    organizer
        .register_or_update_chat("t1", "Subject", Some(folder))
        .unwrap();
    let once = serde_json::to_value(organizer.state()).unwrap();

    organizer
        .register_or_update_chat("t1", "Subject", Some(folder))
        .unwrap();
    let twice = serde_json::to_value(organizer.state()).unwrap();

    assert_eq!(once, twice);
}

#[test]
fn filter_matches_are_case_insensitive_and_scoped_to_chats() {
    let (_dir, mut organizer) = empty_organizer();
    let project = organizer.create_project("Pricing").unwrap();
    let folder = organizer.create_folder(project, "Pricing strategy").unwrap();
    organizer
        .register_or_update_chat("t1", "Objection handling", Some(folder))
        .unwrap();

    // Query matching only project/folder names prunes all chats but
    // keeps the containers navigable
    let view = organizer.filter("pricing");
    assert_eq!(view.projects.len(), 1);
    assert_eq!(view.projects[0].folders.len(), 1);
    assert!(view.projects[0].folders[0].chats.is_empty());

    let view = organizer.filter("OBJECTION");
    assert_eq!(view.projects[0].folders[0].chats.len(), 1);
}
