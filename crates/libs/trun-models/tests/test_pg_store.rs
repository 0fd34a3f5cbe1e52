use common::db_test_context::DBTestContext;
use diesel::prelude::*;
use serial_test::serial;
use trun_models::{
    db::{config::DbConfig, connection::DbConnection},
    run::{
        store::{PgTestRunStore, TestRunStore},
        testrun::TestRunCreate,
    },
};

mod common;

fn store_for(db: &DBTestContext) -> PgTestRunStore {
    let config = DbConfig {
        database_url: db.url.clone(),
    };
    let connection = DbConnection::new(&config)
        .expect("Couldn't create pool")
        .setup()
        .expect("Couldn't run migrations");
    PgTestRunStore::new(connection)
}

fn create(link: &str, success: bool) -> TestRunCreate {
    TestRunCreate {
        source_link: link.to_string(),
        success,
        output: format!("output of {link}"),
    }
}

#[test]
#[serial]
#[ignore = "needs a Postgres database in DATABASE_URL"]
fn test_empty_table_lists_nothing() {
    let db = DBTestContext::from_env();
    let store = store_for(&db);

    assert_eq!(store.backend_tag(), "postgres");
    assert!(store.list().expect("Couldn't list runs").is_empty());
}

#[test]
#[serial]
#[ignore = "needs a Postgres database in DATABASE_URL"]
fn test_appended_runs_are_listed_in_insertion_order() {
    let db = DBTestContext::from_env();
    let store = store_for(&db);

    let links: Vec<String> = (0..20)
        .map(|i| format!("https://example.com/org/repo-{i}.git"))
        .collect();
    let mut stored = Vec::new();
    for (i, link) in links.iter().enumerate() {
        stored.push(
            store
                .append(create(link, i % 3 != 0))
                .expect("Couldn't append run"),
        );
    }

    let listed = store.list().expect("Couldn't list runs");
    assert_eq!(listed, stored);
    let listed_links: Vec<&str> = listed.iter().map(|r| r.source_link.as_str()).collect();
    assert_eq!(listed_links, links);
    assert!(!listed[0].success);
    assert!(listed[1].success);
}

#[test]
#[serial]
#[ignore = "needs a Postgres database in DATABASE_URL"]
fn test_order_does_not_depend_on_timestamps() {
    let mut db = DBTestContext::from_env();

    // Rows inserted in one transaction share the same now()
    diesel::sql_query(
        "INSERT INTO testrun (source_link, success, output) VALUES \
         ('https://example.com/first.git', true, 'a'), \
         ('https://example.com/second.git', false, 'b'), \
         ('https://example.com/third.git', true, 'c')",
    )
    .execute(&mut db.conn)
    .expect("Couldn't insert values to database");

    let store = store_for(&db);
    let links: Vec<String> = store
        .list()
        .expect("Couldn't list runs")
        .into_iter()
        .map(|r| r.source_link)
        .collect();
    assert_eq!(
        links,
        [
            "https://example.com/first.git",
            "https://example.com/second.git",
            "https://example.com/third.git",
        ]
    );
}
