use feedbase_db::MemoryServer;
use feedbase_kernel::settings::DatabaseSettings;
use feedbase_kernel::{
    bootstrap, check, BootstrapError, CollectionSpec, Ensured, IndexSpec, SchemaPlan, SchemaStep,
    SortOrder, Stage,
};

fn feed_plan() -> SchemaPlan {
    let mut plan = SchemaPlan::new();
    plan.push(
        CollectionSpec::new("posts")
            .with_index(IndexSpec::on("compositeKey", SortOrder::Descending)),
    );
    plan.push(CollectionSpec::new("comments"));
    plan
}

#[tokio::test]
async fn test_fresh_database_gets_full_schema() {
    let server = MemoryServer::new();
    let report = bootstrap(&DatabaseSettings::named("blog"), &feed_plan(), &server)
        .await
        .unwrap();

    assert_eq!(report.stage, Stage::Done);
    assert_eq!(server.collection_names("blog"), ["comments", "posts"]);

    let indexes = server.indexes("blog", "posts");
    assert_eq!(indexes.len(), 1);
    assert_eq!(indexes[0].keys()[0].field, "compositeKey");
    assert_eq!(indexes[0].keys()[0].order, SortOrder::Descending);
    assert!(server.indexes("blog", "comments").is_empty());
}

#[tokio::test]
async fn test_second_run_is_a_noop() {
    let server = MemoryServer::new();
    let settings = DatabaseSettings::named("blog");

    let first = bootstrap(&settings, &feed_plan(), &server).await.unwrap();
    let writes = server.writes();
    let second = bootstrap(&settings, &feed_plan(), &server).await.unwrap();

    assert_eq!(first.created_count(), 3);
    assert!(second.is_noop());
    assert!(second
        .collections
        .iter()
        .all(|c| c.outcome == Ensured::AlreadyPresent));
    assert_eq!(server.writes(), writes);
    assert_eq!(server.collection_names("blog").len(), 2);
    assert_eq!(server.indexes("blog", "posts").len(), 1);
}

#[tokio::test]
async fn test_missing_name_mutates_nothing() {
    let server = MemoryServer::new();

    for name in [None, Some(String::new())] {
        let settings = DatabaseSettings {
            name,
            ..DatabaseSettings::default()
        };
        let err = bootstrap(&settings, &feed_plan(), &server)
            .await
            .unwrap_err();

        assert!(matches!(err, BootstrapError::Configuration { .. }));
        assert_ne!(err.exit_code(), 0);
    }

    assert!(server.database_names().is_empty());
    assert_eq!(server.writes(), 0);
}

#[tokio::test]
async fn test_databases_are_isolated() {
    let server = MemoryServer::new();
    bootstrap(&DatabaseSettings::named("blog_a"), &feed_plan(), &server)
        .await
        .unwrap();

    assert_eq!(server.database_names(), ["blog_a"]);
    assert!(server.collection_names("blog_b").is_empty());

    bootstrap(&DatabaseSettings::named("blog_b"), &feed_plan(), &server)
        .await
        .unwrap();
    assert_eq!(server.database_names(), ["blog_a", "blog_b"]);
    assert_eq!(server.indexes("blog_a", "posts").len(), 1);
}

#[tokio::test]
async fn test_refused_connection_is_fatal() {
    let server = MemoryServer::new();
    server.refuse_connections();

    let err = bootstrap(&DatabaseSettings::named("blog"), &feed_plan(), &server)
        .await
        .unwrap_err();

    assert!(matches!(err, BootstrapError::Connection { .. }));
    assert!(err.diagnostic().contains("connection refused by memory"));
    assert!(server.database_names().is_empty());
}

#[tokio::test]
async fn test_schema_failure_names_the_step() {
    let server = MemoryServer::new();
    server.deny_writes_to("comments");

    let err = bootstrap(&DatabaseSettings::named("blog"), &feed_plan(), &server)
        .await
        .unwrap_err();

    match &err {
        BootstrapError::Schema { step, .. } => assert_eq!(
            *step,
            SchemaStep::CreateCollection {
                collection: "comments".to_string()
            }
        ),
        other => panic!("expected schema error, got {other:?}"),
    }
    assert!(err
        .diagnostic()
        .contains("create collection 'comments' failed: not authorized"));
    assert!(server.indexes("blog", "posts").is_empty());
}

#[tokio::test]
async fn test_conflicting_existing_index_is_a_schema_error() {
    let server = MemoryServer::new();
    let mut squatter = SchemaPlan::new();
    squatter.push(CollectionSpec::new("posts").with_index(
        IndexSpec::on("compositeKey", SortOrder::Ascending).named("compositeKey_-1"),
    ));
    bootstrap(&DatabaseSettings::named("blog"), &squatter, &server)
        .await
        .unwrap();

    let err = bootstrap(&DatabaseSettings::named("blog"), &feed_plan(), &server)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BootstrapError::Schema {
            step: SchemaStep::CreateIndex { .. },
            ..
        }
    ));
    assert_eq!(err.reached_stage(), Stage::CollectionsEnsured);
}

#[tokio::test]
async fn test_check_tracks_completeness() {
    let server = MemoryServer::new();
    let settings = DatabaseSettings::named("blog");

    let before = check(&settings, &feed_plan(), &server).await.unwrap();
    assert!(!before.is_complete());
    assert_eq!(before.missing_collections, ["posts", "comments"]);
    assert_eq!(before.missing_indexes.len(), 1);
    assert!(server.database_names().is_empty());

    bootstrap(&settings, &feed_plan(), &server).await.unwrap();

    let after = check(&settings, &feed_plan(), &server).await.unwrap();
    assert!(after.is_complete());
}

#[tokio::test]
#[ignore = "requires a MongoDB server at MONGO_URL"]
async fn test_live_mongodb_bootstrap_is_idempotent() {
    let uri = std::env::var("MONGO_URL").unwrap_or_else(|_| "mongodb://127.0.0.1:27017".into());
    let settings = DatabaseSettings {
        uri,
        ..DatabaseSettings::named("feedbase_live_test")
    };
    let connector = feedbase_db::connector(&settings);

    bootstrap(&settings, &feed_plan(), &connector).await.unwrap();
    let second = bootstrap(&settings, &feed_plan(), &connector).await.unwrap();
    assert!(second.is_noop());

    let result = check(&settings, &feed_plan(), &connector).await.unwrap();
    assert!(result.is_complete());
}
