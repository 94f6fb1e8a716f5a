use rusqlite::{params, Connection};
use taskdist_core::db::open_db_in_memory;
use taskdist_core::{
    Agent, AgentRepository, NewAgent, RepoError, SqliteAgentRepository, SqliteTaskRepository,
    TaskRepository, TaskStatus, TaskUpdate, ValidatedContact,
};
use uuid::Uuid;

fn seed_agent(conn: &Connection, name: &str) -> Agent {
    let repo = SqliteAgentRepository::try_new(conn).unwrap();
    repo.create_agent(&NewAgent {
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        mobile: None,
    })
    .unwrap()
}

fn contact(name: &str, phone: &str) -> ValidatedContact {
    ValidatedContact {
        name: name.to_string(),
        phone: phone.to_string(),
        notes: String::new(),
    }
}

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let agent = seed_agent(&conn, "Ana");
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let mut input = contact("Jo", "555");
    input.notes = "prefers mornings".to_string();
    let created = repo.create_task(&input, agent.id).unwrap();

    assert_eq!(created.status, TaskStatus::Pending);
    assert_eq!(created.agent_id, agent.id);
    assert_eq!(created.created_at, created.updated_at);

    let loaded = repo.get_task(created.id).unwrap().unwrap();
    assert_eq!(loaded, created);
    assert_eq!(loaded.notes, "prefers mornings");
}

#[test]
fn get_missing_task_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    assert!(repo.get_task(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn create_for_unknown_agent_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let stranger = Uuid::new_v4();
    let err = repo.create_task(&contact("Jo", "555"), stranger).unwrap_err();
    assert!(matches!(err, RepoError::UnknownAgent(id) if id == stranger));
}

#[test]
fn create_rejects_empty_contact_fields() {
    let conn = open_db_in_memory().unwrap();
    let agent = seed_agent(&conn, "Ana");
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let err = repo.create_task(&contact("", "555"), agent.id).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[test]
fn list_by_agent_is_most_recent_first_and_scoped() {
    let conn = open_db_in_memory().unwrap();
    let ana = seed_agent(&conn, "Ana");
    let ben = seed_agent(&conn, "Ben");
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let first = repo.create_task(&contact("First", "1"), ana.id).unwrap();
    let second = repo.create_task(&contact("Second", "2"), ana.id).unwrap();
    repo.create_task(&contact("Other", "3"), ben.id).unwrap();
    let third = repo.create_task(&contact("Third", "4"), ana.id).unwrap();

    conn.execute(
        "UPDATE tasks SET created_at = 1000 WHERE id = ?1;",
        params![first.id.to_string()],
    )
    .unwrap();
    conn.execute(
        "UPDATE tasks SET created_at = 3000 WHERE id = ?1;",
        params![second.id.to_string()],
    )
    .unwrap();
    conn.execute(
        "UPDATE tasks SET created_at = 2000 WHERE id = ?1;",
        params![third.id.to_string()],
    )
    .unwrap();

    let listed: Vec<Uuid> = repo
        .list_tasks_by_agent(ana.id)
        .unwrap()
        .into_iter()
        .map(|task| task.id)
        .collect();
    assert_eq!(listed, vec![second.id, third.id, first.id]);
}

#[test]
fn same_timestamp_falls_back_to_reverse_insertion_order() {
    let conn = open_db_in_memory().unwrap();
    let ana = seed_agent(&conn, "Ana");
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let ids: Vec<Uuid> = (0..3)
        .map(|index| {
            repo.create_task(&contact(&format!("C{index}"), "555"), ana.id)
                .unwrap()
                .id
        })
        .collect();
    conn.execute("UPDATE tasks SET created_at = 42;", []).unwrap();

    let listed: Vec<Uuid> = repo
        .list_tasks_by_agent(ana.id)
        .unwrap()
        .into_iter()
        .map(|task| task.id)
        .collect();
    assert_eq!(listed, vec![ids[2], ids[1], ids[0]]);
}

#[test]
fn partial_update_only_changes_supplied_fields() {
    let conn = open_db_in_memory().unwrap();
    let ana = seed_agent(&conn, "Ana");
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let mut input = contact("Jo", "555");
    input.notes = "original".to_string();
    let created = repo.create_task(&input, ana.id).unwrap();

    let updated = repo
        .update_status_and_notes(created.id, &TaskUpdate::status(TaskStatus::InProgress))
        .unwrap();
    assert_eq!(updated.status, TaskStatus::InProgress);
    assert_eq!(updated.notes, "original");

    let updated = repo
        .update_status_and_notes(created.id, &TaskUpdate::notes("left voicemail"))
        .unwrap();
    assert_eq!(updated.status, TaskStatus::InProgress);
    assert_eq!(updated.notes, "left voicemail");
    assert_eq!(updated.contact_name, "Jo");
    assert_eq!(updated.contact_phone, "555");
    assert_eq!(updated.agent_id, ana.id);
    assert_eq!(updated.created_at, created.created_at);
}

#[test]
fn update_missing_task_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let missing = Uuid::new_v4();
    let err = repo
        .update_status_and_notes(missing, &TaskUpdate::status(TaskStatus::Completed))
        .unwrap_err();
    assert!(matches!(err, RepoError::TaskNotFound(id) if id == missing));
}

#[test]
fn aggregate_groups_tasks_with_agent_snapshot() {
    let conn = open_db_in_memory().unwrap();
    let ana = seed_agent(&conn, "Ana");
    let ben = seed_agent(&conn, "Ben");
    let idle = seed_agent(&conn, "Idle");
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    for index in 0..3 {
        repo.create_task(&contact(&format!("A{index}"), "555"), ana.id)
            .unwrap();
    }
    repo.create_task(&contact("B0", "556"), ben.id).unwrap();

    let groups = repo.aggregate_by_agent().unwrap();
    assert_eq!(groups.len(), 2);
    assert!(!groups.contains_key(&idle.id));

    let ana_group = &groups[&ana.id];
    assert_eq!(ana_group.count, 3);
    assert_eq!(ana_group.tasks.len(), 3);
    assert_eq!(ana_group.agent.name, "Ana");
    assert_eq!(ana_group.agent.email, "ana@example.com");
    assert_eq!(ana_group.tasks[0].contact_name, "A2");

    assert_eq!(groups[&ben.id].count, 1);
}

#[test]
fn aggregate_on_empty_store_is_empty() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    assert!(repo.aggregate_by_agent().unwrap().is_empty());
}
