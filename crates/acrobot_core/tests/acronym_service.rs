use acrobot_core::db::open_db_in_memory;
use acrobot_core::{
    Acronym, AcronymRepository, AcronymService, AcronymServiceError, Explanation, RepoError,
    SqliteAcronymRepository,
};
use rusqlite::Connection;

const USER_A: &str = "USER_A";
const USER_B: &str = "USER_B";

fn pairs(explanations: &[Explanation]) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = explanations
        .iter()
        .map(|explanation| {
            (
                explanation.author_id().unwrap_or_default().to_string(),
                explanation.text().to_string(),
            )
        })
        .collect();
    pairs.sort();
    pairs
}

fn texts(explanations: &[Explanation]) -> Vec<&str> {
    explanations
        .iter()
        .map(|explanation| explanation.text())
        .collect()
}

#[test]
fn lol_scenario_reuses_acronym_and_keeps_both_explanations() {
    let conn = open_db_in_memory().unwrap();
    let service = AcronymService::new(SqliteAcronymRepository::new(&conn));

    let mut lol = service.find_or_create("lol").unwrap();
    assert_eq!(lol.text(), "lol");
    assert!(lol.explanations().is_empty());

    service
        .add_explanation(&mut lol, "user1", "laugh out loud")
        .unwrap();
    assert_eq!(
        pairs(lol.explanations()),
        vec![("user1".to_string(), "laugh out loud".to_string())]
    );

    let mut upper = service.find_or_create("LOL").unwrap();
    assert_eq!(upper, lol);
    assert_eq!(upper.id(), lol.id());
    assert_eq!(
        pairs(upper.explanations()),
        vec![("user1".to_string(), "laugh out loud".to_string())]
    );

    service
        .add_explanation(&mut upper, "user2", "lots of love")
        .unwrap();
    let expected = vec![
        ("user1".to_string(), "laugh out loud".to_string()),
        ("user2".to_string(), "lots of love".to_string()),
    ];
    assert_eq!(pairs(upper.explanations()), expected);

    let reloaded = service.find("LoL").unwrap().unwrap();
    assert_eq!(pairs(reloaded.explanations()), expected);
}

#[test]
fn added_explanations_are_owned_by_the_acronym() {
    let conn = open_db_in_memory().unwrap();
    let service = AcronymService::new(SqliteAcronymRepository::new(&conn));

    let mut acronym = service.find_or_create("afk").unwrap();
    let created = service
        .add_explanation(&mut acronym, USER_A, "away from keyboard")
        .unwrap();
    assert_eq!(created.acronym_id(), acronym.id());

    let reloaded = service.find("AFK").unwrap().unwrap();
    assert!(reloaded
        .explanations()
        .iter()
        .all(|explanation| explanation.acronym_id() == reloaded.id()));
}

#[test]
fn failed_insert_is_rolled_back_from_the_aggregate() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAcronymRepository::new(&conn);
    let mut acronym = repo.find_or_create("gone").unwrap();
    repo.delete_acronym(acronym.id()).unwrap();

    let service = AcronymService::new(repo);
    let err = service
        .add_explanation(&mut acronym, USER_A, "too late")
        .unwrap_err();

    assert!(matches!(
        err,
        AcronymServiceError::Repo(RepoError::AcronymNotFound(_))
    ));
    assert!(acronym.explanations().is_empty());
}

#[test]
fn explain_returns_none_for_unknown_acronym() {
    let conn = open_db_in_memory().unwrap();
    let service = AcronymService::new(SqliteAcronymRepository::new(&conn));

    assert!(service.explain("TEST").unwrap().is_none());
}

#[test]
fn explain_sorts_case_insensitively() {
    let conn = open_db_in_memory().unwrap();
    let service = AcronymService::new(SqliteAcronymRepository::new(&conn));

    let mut acronym = service.find_or_create("TEST").unwrap();
    for text in ["Z0", "a0", "z1", "A1"] {
        service.add_explanation(&mut acronym, USER_A, text).unwrap();
    }

    let explained = service.explain("Test").unwrap().unwrap();
    assert_eq!(texts(&explained), vec!["a0", "A1", "Z0", "z1"]);
}

#[test]
fn revise_replaces_text_for_the_author() {
    let conn = open_db_in_memory().unwrap();
    let service = AcronymService::new(SqliteAcronymRepository::new(&conn));

    let mut acronym = service.find_or_create("TEST").unwrap();
    let original = service
        .add_explanation(&mut acronym, USER_A, "Hello!")
        .unwrap();

    let revised = service
        .revise_explanation("test", USER_A, "Hello!", "Goodbye!")
        .unwrap();
    assert_ne!(revised.id(), original.id());
    assert_eq!(revised.acronym_id(), acronym.id());
    assert_eq!(revised.author_id(), Some(USER_A));

    let explained = service.explain("TEST").unwrap().unwrap();
    assert_eq!(explained, vec![revised]);
}

#[test]
fn revise_and_remove_require_authorship() {
    let conn = open_db_in_memory().unwrap();
    let service = AcronymService::new(SqliteAcronymRepository::new(&conn));

    let mut acronym = service.find_or_create("TEST").unwrap();
    service
        .add_explanation(&mut acronym, USER_A, "An explanation.")
        .unwrap();

    let err = service
        .revise_explanation("TEST", USER_B, "An explanation.", "Something else")
        .unwrap_err();
    assert!(matches!(err, AcronymServiceError::NotAuthor { author_id, .. } if author_id == USER_B));

    let err = service
        .remove_explanation("TEST", USER_B, "An explanation.")
        .unwrap_err();
    assert!(matches!(err, AcronymServiceError::NotAuthor { .. }));

    let explained = service.explain("TEST").unwrap().unwrap();
    assert_eq!(texts(&explained), vec!["An explanation."]);
}

#[test]
fn same_text_from_two_authors_targets_the_callers_record() {
    let conn = open_db_in_memory().unwrap();
    let service = AcronymService::new(SqliteAcronymRepository::new(&conn));

    let mut acronym = service.find_or_create("TEST").unwrap();
    service.add_explanation(&mut acronym, USER_A, "shared").unwrap();
    service.add_explanation(&mut acronym, USER_B, "shared").unwrap();

    service.remove_explanation("TEST", USER_B, "shared").unwrap();

    let remaining = service.find("TEST").unwrap().unwrap();
    assert_eq!(
        pairs(remaining.explanations()),
        vec![(USER_A.to_string(), "shared".to_string())]
    );
}

#[test]
fn revise_and_remove_report_missing_targets() {
    let conn = open_db_in_memory().unwrap();
    let service = AcronymService::new(SqliteAcronymRepository::new(&conn));

    let err = service
        .revise_explanation("FOO", USER_A, "An explanation.", "Something else")
        .unwrap_err();
    assert!(matches!(err, AcronymServiceError::AcronymNotFound(raw) if raw == "FOO"));

    let mut acronym = service.find_or_create("TEST").unwrap();
    service.add_explanation(&mut acronym, USER_A, "Hello!").unwrap();

    let err = service
        .remove_explanation("TEST", USER_A, "Goodbye")
        .unwrap_err();
    assert!(matches!(err, AcronymServiceError::ExplanationNotFound { .. }));

    let explained = service.explain("TEST").unwrap().unwrap();
    assert_eq!(texts(&explained), vec!["Hello!"]);
}

#[test]
fn removing_last_explanation_hides_acronym_from_explain_but_keeps_it_stored() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAcronymRepository::new(&conn);
    let service = AcronymService::new(SqliteAcronymRepository::new(&conn));

    let mut acronym = service.find_or_create("TEST").unwrap();
    service
        .add_explanation(&mut acronym, USER_A, "An explanation.")
        .unwrap();
    service
        .remove_explanation("test", USER_A, "An explanation.")
        .unwrap();

    assert!(service.explain("TEST").unwrap().is_none());
    let stored = service.find("TEST").unwrap().unwrap();
    assert_eq!(stored.id(), acronym.id());
    assert_eq!(repo.count_acronyms().unwrap(), 1);
}

fn authored(
    service: &AcronymService<SqliteAcronymRepository<'_>>,
    author_id: &str,
) -> Vec<(String, String)> {
    service
        .explanations_by_author(author_id)
        .unwrap()
        .into_iter()
        .map(|authored| (authored.acronym_text, authored.explanation.text().to_string()))
        .collect()
}

fn insert_unowned(conn: &Connection, acronym: &Acronym, text: &str) {
    conn.execute(
        "INSERT INTO explanations (uuid, acronym_uuid, author_id, explanation_text)
         VALUES (?1, ?2, NULL, ?3);",
        [
            uuid::Uuid::new_v4().to_string(),
            acronym.id().to_string(),
            text.to_string(),
        ],
    )
    .unwrap();
}

#[test]
fn explanations_by_author_is_empty_without_contributions() {
    let conn = open_db_in_memory().unwrap();
    let service = AcronymService::new(SqliteAcronymRepository::new(&conn));

    let mut acronym = service.find_or_create("TEST0").unwrap();
    service
        .add_explanation(&mut acronym, USER_B, "Another explanation")
        .unwrap();

    assert!(service.explanations_by_author(USER_A).unwrap().is_empty());
}

#[test]
fn explanations_by_author_lists_only_the_callers_entries() {
    let conn = open_db_in_memory().unwrap();
    let service = AcronymService::new(SqliteAcronymRepository::new(&conn));

    let mut test0 = service.find_or_create("TEST0").unwrap();
    let mut test1 = service.find_or_create("TEST1").unwrap();
    service
        .add_explanation(&mut test0, USER_A, "An explanation")
        .unwrap();
    service
        .add_explanation(&mut test0, USER_B, "Another explanation")
        .unwrap();
    service
        .add_explanation(&mut test1, USER_B, "An even better explanation")
        .unwrap();
    service
        .add_explanation(&mut test1, USER_A, "A good explanation")
        .unwrap();

    assert_eq!(
        authored(&service, USER_A),
        vec![
            ("TEST0".to_string(), "An explanation".to_string()),
            ("TEST1".to_string(), "A good explanation".to_string()),
        ]
    );
    assert_eq!(
        authored(&service, USER_B),
        vec![
            ("TEST0".to_string(), "Another explanation".to_string()),
            ("TEST1".to_string(), "An even better explanation".to_string()),
        ]
    );
}

#[test]
fn remove_all_by_author_leaves_other_authors_and_acronyms() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAcronymRepository::new(&conn);
    let service = AcronymService::new(SqliteAcronymRepository::new(&conn));

    let mut test0 = service.find_or_create("TEST0").unwrap();
    let mut test1 = service.find_or_create("TEST1").unwrap();
    service
        .add_explanation(&mut test0, USER_A, "An explanation.")
        .unwrap();
    service
        .add_explanation(&mut test0, USER_B, "Another explanation.")
        .unwrap();
    service
        .add_explanation(&mut test1, USER_A, "A good explanation.")
        .unwrap();

    assert_eq!(service.remove_all_by_author(USER_A).unwrap(), 2);

    assert!(service.explanations_by_author(USER_A).unwrap().is_empty());
    let explained = service.explain("test0").unwrap().unwrap();
    assert_eq!(texts(&explained), vec!["Another explanation."]);
    assert!(service.explain("TEST1").unwrap().is_none());
    assert_eq!(repo.count_acronyms().unwrap(), 2);

    assert_eq!(service.remove_all_by_author(USER_A).unwrap(), 0);
}

#[test]
fn revising_an_unowned_explanation_claims_it() {
    let conn = open_db_in_memory().unwrap();
    let service = AcronymService::new(SqliteAcronymRepository::new(&conn));

    let acronym = service.find_or_create("TEST").unwrap();
    insert_unowned(&conn, &acronym, "A");

    let revised = service.revise_explanation("test", USER_A, "A", "B").unwrap();
    assert_eq!(revised.author_id(), Some(USER_A));
    assert!(!revised.is_unowned());

    let err = service
        .revise_explanation("TEST", USER_A, "A", "C")
        .unwrap_err();
    assert!(matches!(err, AcronymServiceError::ExplanationNotFound { .. }));

    let err = service
        .revise_explanation("TEST", USER_B, "B", "C")
        .unwrap_err();
    assert!(matches!(err, AcronymServiceError::NotAuthor { author_id, .. } if author_id == USER_B));

    let explained = service.explain("TEST").unwrap().unwrap();
    assert_eq!(explained, vec![revised]);
    assert_eq!(
        authored(&service, USER_A),
        vec![("TEST".to_string(), "B".to_string())]
    );
}

#[test]
fn removing_an_unowned_explanation_is_allowed() {
    let conn = open_db_in_memory().unwrap();
    let service = AcronymService::new(SqliteAcronymRepository::new(&conn));

    let acronym = service.find_or_create("TEST").unwrap();
    insert_unowned(&conn, &acronym, "legacy");

    service.remove_explanation("TEST", USER_B, "legacy").unwrap();

    assert!(service.explain("TEST").unwrap().is_none());
}

#[test]
fn own_record_wins_over_unowned_record_with_same_text() {
    let conn = open_db_in_memory().unwrap();
    let service = AcronymService::new(SqliteAcronymRepository::new(&conn));

    let mut acronym = service.find_or_create("TEST").unwrap();
    insert_unowned(&conn, &acronym, "shared");
    service.add_explanation(&mut acronym, USER_A, "shared").unwrap();

    service.remove_explanation("TEST", USER_A, "shared").unwrap();

    let remaining = service.find("TEST").unwrap().unwrap();
    assert_eq!(remaining.explanations().len(), 1);
    assert!(remaining.explanations()[0].is_unowned());
}
