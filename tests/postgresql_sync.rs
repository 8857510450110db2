//! PostgreSQL synchronization E2E tests.
//!
//! These tests run against a live PostgreSQL instance
//! (`NESTEDSET_SINK_TEST_POSTGRES`, defaulting to localhost). Each test
//! creates its own uniquely named live/log/offset tables, drives the
//! synchronizer through one or more cycles and asserts the resulting table
//! state and committed offset.

use nestedset_sink::testing::{
    append_delete, append_upsert, create_nested_set_schema, drop_nested_set_schema,
    generate_test_id, postgres_connection_string, read_live_table, read_offset, sink_config_for,
};
use nestedset_sink::{new_postgresql_client, SinkConfig, SinkError, SyncOutcome, Synchronizer};
use tokio_postgres::Client;

async fn setup() -> Result<(Client, SinkConfig), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("nestedset_sink=debug")
        .try_init()
        .ok();

    let test_id = generate_test_id();
    let config = sink_config_for(
        &format!("category_{test_id}"),
        &format!("category_log_{test_id}"),
        &format!("sync_offset_{test_id}"),
    );
    let client = new_postgresql_client(&postgres_connection_string()).await?;
    create_nested_set_schema(&client, &config).await?;
    Ok((client, config))
}

async fn seed_live_row(
    client: &Client,
    config: &SinkConfig,
    id: i64,
    left: i32,
    right: i32,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let insert = format!(
        "INSERT INTO {} (id, lft, rgt, name) VALUES ($1, $2, $3, $4)",
        config.table_name
    );
    client
        .execute(&insert, &[&id, &left, &right, &name])
        .await?;
    Ok(())
}

#[tokio::test]
async fn simple_insert() -> Result<(), Box<dyn std::error::Error>> {
    let (mut client, config) = setup().await?;
    append_upsert(&client, &config, 10, 1, 2, "a").await?;

    let synchronizer = Synchronizer::new(config.clone());
    let outcome = synchronizer.synchronize(&mut client).await?;

    assert_eq!(
        outcome,
        SyncOutcome::Applied {
            inserted: 1,
            updated: 0,
            deleted: 0,
            offset: 1,
        }
    );
    assert_eq!(
        read_live_table(&client, &config).await?,
        vec![(10, 1, 2, Some("a".to_string()))]
    );
    assert_eq!(read_offset(&client, &config).await?, Some(1));

    drop_nested_set_schema(&client, &config).await?;
    Ok(())
}

#[tokio::test]
async fn dedup_applies_only_the_latest_entry() -> Result<(), Box<dyn std::error::Error>> {
    let (mut client, config) = setup().await?;
    append_upsert(&client, &config, 10, 1, 4, "x").await?;
    append_upsert(&client, &config, 10, 1, 2, "y").await?;

    let synchronizer = Synchronizer::new(config.clone());
    let outcome = synchronizer.synchronize(&mut client).await?;

    assert_eq!(
        outcome,
        SyncOutcome::Applied {
            inserted: 1,
            updated: 0,
            deleted: 0,
            offset: 2,
        }
    );
    assert_eq!(
        read_live_table(&client, &config).await?,
        vec![(10, 1, 2, Some("y".to_string()))]
    );
    assert_eq!(read_offset(&client, &config).await?, Some(2));

    drop_nested_set_schema(&client, &config).await?;
    Ok(())
}

#[tokio::test]
async fn invalid_intermediate_entry_is_superseded() -> Result<(), Box<dyn std::error::Error>> {
    let (mut client, config) = setup().await?;
    append_upsert(&client, &config, 10, 5, 3, "bad").await?;
    append_upsert(&client, &config, 10, 1, 2, "ok").await?;

    let synchronizer = Synchronizer::new(config.clone());
    let outcome = synchronizer.synchronize(&mut client).await?;

    assert!(matches!(outcome, SyncOutcome::Applied { offset: 2, .. }));
    assert_eq!(
        read_live_table(&client, &config).await?,
        vec![(10, 1, 2, Some("ok".to_string()))]
    );

    drop_nested_set_schema(&client, &config).await?;
    Ok(())
}

#[tokio::test]
async fn overlapping_projection_rejects_the_whole_cycle(
) -> Result<(), Box<dyn std::error::Error>> {
    let (mut client, config) = setup().await?;
    seed_live_row(&client, &config, 10, 1, 4, "root").await?;
    append_upsert(&client, &config, 20, 2, 5, "overlap").await?;

    let synchronizer = Synchronizer::new(config.clone());
    let outcome = synchronizer.synchronize(&mut client).await?;

    assert_eq!(outcome, SyncOutcome::SkippedInvalidForest);
    assert_eq!(
        read_live_table(&client, &config).await?,
        vec![(10, 1, 4, Some("root".to_string()))]
    );
    assert_eq!(read_offset(&client, &config).await?, None);

    drop_nested_set_schema(&client, &config).await?;
    Ok(())
}

#[tokio::test]
async fn mixed_upsert_and_delete_apply_deletes_last() -> Result<(), Box<dyn std::error::Error>> {
    let (mut client, config) = setup().await?;
    seed_live_row(&client, &config, 10, 1, 4, "root").await?;
    seed_live_row(&client, &config, 20, 2, 3, "child").await?;
    append_delete(&client, &config, 20).await?;
    append_upsert(&client, &config, 10, 1, 2, "root").await?;

    let synchronizer = Synchronizer::new(config.clone());
    let outcome = synchronizer.synchronize(&mut client).await?;

    assert_eq!(
        outcome,
        SyncOutcome::Applied {
            inserted: 0,
            updated: 1,
            deleted: 1,
            offset: 2,
        }
    );
    assert_eq!(
        read_live_table(&client, &config).await?,
        vec![(10, 1, 2, Some("root".to_string()))]
    );
    assert_eq!(read_offset(&client, &config).await?, Some(2));

    drop_nested_set_schema(&client, &config).await?;
    Ok(())
}

#[tokio::test]
async fn delete_of_absent_node_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let (mut client, config) = setup().await?;
    append_delete(&client, &config, 99).await?;

    let synchronizer = Synchronizer::new(config.clone());
    let outcome = synchronizer.synchronize(&mut client).await?;

    assert_eq!(
        outcome,
        SyncOutcome::Applied {
            inserted: 0,
            updated: 0,
            deleted: 1,
            offset: 1,
        }
    );
    assert!(read_live_table(&client, &config).await?.is_empty());

    drop_nested_set_schema(&client, &config).await?;
    Ok(())
}

#[tokio::test]
async fn empty_pending_is_a_no_op() -> Result<(), Box<dyn std::error::Error>> {
    let (mut client, config) = setup().await?;

    let synchronizer = Synchronizer::new(config.clone());
    let outcome = synchronizer.synchronize(&mut client).await?;

    assert_eq!(outcome, SyncOutcome::NoPending);
    assert_eq!(read_offset(&client, &config).await?, None);

    drop_nested_set_schema(&client, &config).await?;
    Ok(())
}

#[tokio::test]
async fn offset_advances_monotonically_across_cycles() -> Result<(), Box<dyn std::error::Error>> {
    let (mut client, config) = setup().await?;
    let synchronizer = Synchronizer::new(config.clone());

    append_upsert(&client, &config, 10, 1, 2, "a").await?;
    let first = synchronizer.synchronize(&mut client).await?;
    assert!(matches!(first, SyncOutcome::Applied { offset: 1, .. }));

    // Nothing new: the already-folded entry is never re-read.
    assert_eq!(
        synchronizer.synchronize(&mut client).await?,
        SyncOutcome::NoPending
    );
    assert_eq!(read_offset(&client, &config).await?, Some(1));

    append_upsert(&client, &config, 20, 3, 4, "b").await?;
    let second = synchronizer.synchronize(&mut client).await?;
    assert!(matches!(second, SyncOutcome::Applied { offset: 2, .. }));
    assert_eq!(read_offset(&client, &config).await?, Some(2));
    assert_eq!(read_live_table(&client, &config).await?.len(), 2);

    drop_nested_set_schema(&client, &config).await?;
    Ok(())
}

#[tokio::test]
async fn update_rewrites_coordinates_and_payload() -> Result<(), Box<dyn std::error::Error>> {
    let (mut client, config) = setup().await?;
    seed_live_row(&client, &config, 10, 1, 2, "before").await?;
    append_upsert(&client, &config, 10, 1, 4, "after").await?;
    append_upsert(&client, &config, 20, 2, 3, "child").await?;

    let synchronizer = Synchronizer::new(config.clone());
    let outcome = synchronizer.synchronize(&mut client).await?;

    assert_eq!(
        outcome,
        SyncOutcome::Applied {
            inserted: 1,
            updated: 1,
            deleted: 0,
            offset: 2,
        }
    );
    assert_eq!(
        read_live_table(&client, &config).await?,
        vec![
            (10, 1, 4, Some("after".to_string())),
            (20, 2, 3, Some("child".to_string())),
        ]
    );

    drop_nested_set_schema(&client, &config).await?;
    Ok(())
}

#[tokio::test]
async fn misconfigured_column_name_is_fatal() -> Result<(), Box<dyn std::error::Error>> {
    let (mut client, config) = setup().await?;
    append_upsert(&client, &config, 10, 1, 2, "a").await?;

    let mut broken = config.clone();
    broken.table_left_column = "does_not_exist".to_string();
    let synchronizer = Synchronizer::new(broken);
    let err = synchronizer.synchronize(&mut client).await.unwrap_err();

    assert!(matches!(err, SinkError::MissingColumn { .. }));
    assert!(read_live_table(&client, &config).await?.is_empty());

    drop_nested_set_schema(&client, &config).await?;
    Ok(())
}
