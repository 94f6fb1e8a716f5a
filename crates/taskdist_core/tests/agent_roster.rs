use rusqlite::Connection;
use taskdist_core::db::open_db_in_memory;
use taskdist_core::{
    AgentProfileUpdate, AgentRepository, AgentRoster, AgentService, AgentServiceError,
    AgentStatus, Caller, NewAgent, SqliteAgentRepository, SqliteTaskRepository, TaskRepository,
    ValidatedContact,
};
use uuid::Uuid;

fn admin_service(conn: &Connection) -> AgentService<SqliteAgentRepository<'_>, Caller> {
    AgentService::new(
        SqliteAgentRepository::try_new(conn).unwrap(),
        Caller::admin(Uuid::new_v4()),
    )
}

fn new_agent(name: &str, email: &str) -> NewAgent {
    NewAgent {
        name: name.to_string(),
        email: email.to_string(),
        mobile: None,
    }
}

#[test]
fn register_normalizes_and_starts_active() {
    let conn = open_db_in_memory().unwrap();
    let service = admin_service(&conn);

    let agent = service
        .register_agent(NewAgent {
            name: "  Ana Lee ".to_string(),
            email: " ana@example.com ".to_string(),
            mobile: Some("   ".to_string()),
        })
        .unwrap();
    assert_eq!(agent.name, "Ana Lee");
    assert_eq!(agent.email, "ana@example.com");
    assert_eq!(agent.mobile, None);
    assert_eq!(agent.status, AgentStatus::Active);
    assert_eq!(service.get_agent(agent.id).unwrap(), agent);
}

#[test]
fn duplicate_email_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = admin_service(&conn);

    service
        .register_agent(new_agent("Ana", "ana@example.com"))
        .unwrap();
    let err = service
        .register_agent(new_agent("Other Ana", "ana@example.com"))
        .unwrap_err();
    assert!(matches!(err, AgentServiceError::DuplicateEmail(ref email) if email == "ana@example.com"));
    assert_eq!(service.list_agents().unwrap().len(), 1);
}

#[test]
fn invalid_profile_input_is_rejected_before_storage() {
    let conn = open_db_in_memory().unwrap();
    let service = admin_service(&conn);

    assert!(matches!(
        service.register_agent(new_agent("  ", "a@example.com")),
        Err(AgentServiceError::InvalidName)
    ));
    assert!(matches!(
        service.register_agent(new_agent("Ana", "not-an-email")),
        Err(AgentServiceError::InvalidEmail(_))
    ));
    assert!(service.list_agents().unwrap().is_empty());
}

#[test]
fn agents_cannot_administer_the_roster() {
    let conn = open_db_in_memory().unwrap();
    let existing = admin_service(&conn)
        .register_agent(new_agent("Ana", "ana@example.com"))
        .unwrap();

    let as_agent = AgentService::new(
        SqliteAgentRepository::try_new(&conn).unwrap(),
        Caller::agent(existing.id),
    );
    assert!(matches!(
        as_agent.register_agent(new_agent("Ben", "ben@example.com")),
        Err(AgentServiceError::NotAuthorized { action: "register_agent", .. })
    ));
    assert!(matches!(
        as_agent.deactivate_agent(existing.id),
        Err(AgentServiceError::NotAuthorized { .. })
    ));
    assert!(matches!(
        as_agent.list_agents(),
        Err(AgentServiceError::NotAuthorized { .. })
    ));
}

#[test]
fn list_is_newest_first_while_roster_is_registration_order() {
    let conn = open_db_in_memory().unwrap();
    let service = admin_service(&conn);

    let first = service
        .register_agent(new_agent("First", "first@example.com"))
        .unwrap();
    let second = service
        .register_agent(new_agent("Second", "second@example.com"))
        .unwrap();
    conn.execute("UPDATE agents SET created_at = 100;", [])
        .unwrap();

    let listed: Vec<Uuid> = service
        .list_agents()
        .unwrap()
        .into_iter()
        .map(|agent| agent.id)
        .collect();
    assert_eq!(listed, vec![second.id, first.id]);

    let roster: Vec<Uuid> = service
        .roster()
        .unwrap()
        .into_iter()
        .map(|agent| agent.id)
        .collect();
    assert_eq!(roster, vec![first.id, second.id]);
}

#[test]
fn deactivation_removes_agent_from_roster_but_keeps_tasks() {
    let conn = open_db_in_memory().unwrap();
    let service = admin_service(&conn);
    let ana = service
        .register_agent(new_agent("Ana", "ana@example.com"))
        .unwrap();
    let ben = service
        .register_agent(new_agent("Ben", "ben@example.com"))
        .unwrap();

    let tasks = SqliteTaskRepository::try_new(&conn).unwrap();
    tasks
        .create_task(
            &ValidatedContact {
                name: "Jo".to_string(),
                phone: "555".to_string(),
                notes: String::new(),
            },
            ana.id,
        )
        .unwrap();

    let deactivated = service.deactivate_agent(ana.id).unwrap();
    assert_eq!(deactivated.status, AgentStatus::Inactive);

    let roster = SqliteAgentRepository::try_new(&conn)
        .unwrap()
        .list_active_agents()
        .unwrap();
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].id, ben.id);
    assert_eq!(tasks.list_tasks_by_agent(ana.id).unwrap().len(), 1);

    let reactivated = service.activate_agent(ana.id).unwrap();
    assert!(reactivated.is_active());
    assert_eq!(service.roster().unwrap().len(), 2);
}

#[test]
fn profile_update_is_partial() {
    let conn = open_db_in_memory().unwrap();
    let service = admin_service(&conn);
    let ana = service
        .register_agent(NewAgent {
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            mobile: Some("555-0100".to_string()),
        })
        .unwrap();

    let updated = service
        .update_agent(
            ana.id,
            AgentProfileUpdate {
                name: Some("Ana Lee".to_string()),
                ..AgentProfileUpdate::default()
            },
        )
        .unwrap();
    assert_eq!(updated.name, "Ana Lee");
    assert_eq!(updated.email, "ana@example.com");
    assert_eq!(updated.mobile.as_deref(), Some("555-0100"));
    assert_eq!(updated.created_at, ana.created_at);
}

#[test]
fn profile_update_cannot_steal_an_email() {
    let conn = open_db_in_memory().unwrap();
    let service = admin_service(&conn);
    service
        .register_agent(new_agent("Ana", "ana@example.com"))
        .unwrap();
    let ben = service
        .register_agent(new_agent("Ben", "ben@example.com"))
        .unwrap();

    let err = service
        .update_agent(
            ben.id,
            AgentProfileUpdate {
                email: Some("ana@example.com".to_string()),
                ..AgentProfileUpdate::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, AgentServiceError::DuplicateEmail(_)));
}

#[test]
fn unknown_agent_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = admin_service(&conn);
    let missing = Uuid::new_v4();

    assert!(matches!(
        service.get_agent(missing),
        Err(AgentServiceError::NotFound(id)) if id == missing
    ));
    assert!(matches!(
        service.deactivate_agent(missing),
        Err(AgentServiceError::NotFound(_))
    ));
    assert!(matches!(
        service.update_agent(missing, AgentProfileUpdate::default()),
        Err(AgentServiceError::NotFound(_))
    ));
}

#[test]
fn repository_maps_unique_violation_directly() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAgentRepository::try_new(&conn).unwrap();
    repo.create_agent(&new_agent("Ana", "ana@example.com"))
        .unwrap();
    assert!(repo
        .create_agent(&new_agent("Ana", "ana@example.com"))
        .is_err());
}
