// tests/pg_tests.rs
//
// Runs compiled scripts against a real PostgreSQL server. Each test works in
// its own schema, dropped afterwards. Skipped when DATABASE_URL is unset.

use std::{collections::BTreeMap, str::FromStr};

use astrolabe::{ElementRow, EntityKind, PgStore, compile, executor, output::to_osm_xml};
use rust_decimal::Decimal;
use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
};

/// Box used throughout: south 10, west 10, north 20, east 20
const BOX: &str = "bbox(10, 10, 20, 20)";

/// Nodes 1, 2, 5 lie inside the box (2 on its north-east corner); 3 and 4
/// miss it by one unit in the seventh decimal place.
///
/// Way 100 has two nodes inside, 102 one, 101 none. Relation 200 reaches
/// the box through node 1 and way 100, 202 only through way 102, 203 only
/// through node 2; 201 does not reach it.
const FIXTURE: &str = "
INSERT INTO nodes (id, lat, lon, timestamp, uid, usr, visible, version, changeset)
    VALUES (1, 10, 10, '2024-01-02 03:04:05', 42, 'ann', TRUE, 3, 900);
INSERT INTO nodes (id, lat, lon) VALUES
    (2, 20, 20),
    (3, 9.9999999, 15),
    (4, 15, 20.0000001),
    (5, 15, 15);
INSERT INTO node_tags (node_id, key, value) VALUES
    (1, 'name', 'X'),
    (1, 'amenity', 'cafe');

INSERT INTO ways (id) VALUES (100), (101), (102);
INSERT INTO way_constituent_nodes (way_id, node_sequence, node_id) VALUES
    (100, 2, 5),
    (100, 1, 1),
    (101, 1, 3),
    (101, 2, 4),
    (102, 1, 3),
    (102, 2, 2);

INSERT INTO relations (id) VALUES (200), (201), (202), (203);
INSERT INTO relation_constituent_nodes (relation_id, member_sequence, node_id, role) VALUES
    (200, 2, 1, 'stop'),
    (200, 3, 3, NULL),
    (201, 1, 4, NULL),
    (203, 1, 2, 'label');
INSERT INTO relation_constituent_ways (relation_id, member_sequence, way_id, role) VALUES
    (200, 1, 100, 'outer'),
    (200, 4, 101, ''),
    (201, 2, 101, NULL),
    (202, 1, 102, 'inner');
";

struct TestDb {
    admin: PgPool,
    store: PgStore,
    schema: String,
}

impl TestDb {
    async fn finish(self) {
        self.store.close().await;
        let _ = sqlx::raw_sql(&format!("DROP SCHEMA \"{}\" CASCADE", self.schema))
            .execute(&self.admin)
            .await;
        self.admin.close().await;
    }
}

/// Fresh schema with the tables created and the fixture loaded
async fn test_db() -> Option<TestDb> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping");
        return None;
    };
    let options = PgConnectOptions::from_str(&url).expect("DATABASE_URL is a postgres URL");
    let admin = PgPoolOptions::new()
        .max_connections(1)
        .connect_with(options.clone())
        .await
        .expect("connect");

    let schema = format!("astro_{}", uuid::Uuid::new_v4().simple());
    sqlx::raw_sql(&format!("CREATE SCHEMA \"{}\"", schema))
        .execute(&admin)
        .await
        .expect("create schema");

    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect_with(options.options([("search_path", schema.as_str())]))
        .await
        .expect("connect to test schema");
    let store = PgStore::new(pool, 4);

    executor::create_schema(&store).await.expect("create tables");
    sqlx::raw_sql(FIXTURE).execute(store.pool()).await.expect("load fixture");

    Some(TestDb { admin, store, schema })
}

async fn run(db: &TestDb, program: &str, session: &str) -> Vec<ElementRow> {
    let script = compile(program, session).unwrap();
    executor::execute(&db.store, &script).await.unwrap()
}

/// Ids per kind, in ascending order, duplicates kept
fn ids_by_kind(rows: &[ElementRow]) -> BTreeMap<EntityKind, Vec<i64>> {
    let mut ids: BTreeMap<EntityKind, Vec<i64>> = BTreeMap::new();
    for row in rows {
        ids.entry(row.kind).or_default().push(row.id);
    }
    for list in ids.values_mut() {
        list.sort();
    }
    ids
}

// ============================================================================
// bbox selection
// ============================================================================

#[tokio::test]
async fn test_bbox_selects_inclusive_subset() {
    let Some(db) = test_db().await else { return };

    let rows = run(&db, &format!("{}.output()", BOX), "incl").await;
    let ids = ids_by_kind(&rows);

    assert_eq!(ids.get(&EntityKind::Node), Some(&vec![1, 2, 5]));
    // Way 100 has two nodes in the box and still appears once
    assert_eq!(ids.get(&EntityKind::Way), Some(&vec![100, 102]));
    // Relation 200 is reached through a node and a way and still appears once
    assert_eq!(ids.get(&EntityKind::Relation), Some(&vec![200, 202, 203]));

    db.finish().await;
}

#[tokio::test]
async fn test_bbox_narrows_current_sources() {
    let Some(db) = test_db().await else { return };

    let rows = run(&db, &format!("ways().{}.output()", BOX), "narrow").await;
    let ids = ids_by_kind(&rows);

    assert_eq!(ids.get(&EntityKind::Node), None);
    assert_eq!(ids.get(&EntityKind::Way), Some(&vec![100, 102]));
    assert_eq!(ids.get(&EntityKind::Relation), None);

    db.finish().await;
}

#[tokio::test]
async fn test_repeated_runs_use_separate_views() {
    let Some(db) = test_db().await else { return };

    let first = run(&db, "nodes().output()", "one").await;
    let second = run(&db, "nodes().output()", "two").await;
    assert_eq!(first.len(), 5);
    assert_eq!(ids_by_kind(&first), ids_by_kind(&second));

    db.finish().await;
}

// ============================================================================
// Row decoding and XML
// ============================================================================

#[tokio::test]
async fn test_rows_decode_every_column() {
    let Some(db) = test_db().await else { return };

    let rows = run(&db, &format!("nodes().{}.output()", BOX), "decode").await;
    let ann = rows.iter().find(|r| r.id == 1).expect("node 1");

    assert_eq!(ann.kind, EntityKind::Node);
    assert_eq!(ann.lat, Some(Decimal::from(10)));
    assert_eq!(ann.lon, Some(Decimal::from(10)));
    assert_eq!(ann.user.as_deref(), Some("ann"));
    assert_eq!(ann.uid, Some(42));
    assert_eq!(ann.visible, Some(true));
    assert_eq!(ann.version, Some(3));
    assert_eq!(ann.changeset, Some(900));
    assert!(ann.timestamp.is_some());

    let bare = rows.iter().find(|r| r.id == 5).expect("node 5");
    assert_eq!(bare.user, None);
    assert_eq!(bare.version, None);

    db.finish().await;
}

#[tokio::test]
async fn test_document_from_store() {
    let Some(db) = test_db().await else { return };

    let rows = run(&db, &format!("{}.output()", BOX), "xml").await;
    let xml = to_osm_xml(&db.store, &rows).await.unwrap();

    // Tags come back ordered by key
    assert!(xml.contains(
        r#"<node id="1" lat="10.0000000" lon="10.0000000" timestamp="2024-01-02T03:04:05Z" uid="42" user="ann" visible="true" version="3" changeset="900"><tag k="amenity" v="cafe"/><tag k="name" v="X"/></node>"#
    ), "{}", xml);
    assert!(xml.contains(r#"<node id="2" lat="20.0000000" lon="20.0000000"/>"#), "{}", xml);
    assert!(xml.contains(r#"<way id="100"><nd ref="1"/><nd ref="5"/></way>"#), "{}", xml);
    // Node and way members interleave by sequence; a NULL role is empty
    assert!(xml.contains(
        r#"<relation id="200"><member type="way" ref="100" role="outer"/><member type="node" ref="1" role="stop"/><member type="node" ref="3" role=""/><member type="way" ref="101" role=""/></relation>"#
    ), "{}", xml);
    assert!(xml.contains(r#"<relation id="202"><member type="way" ref="102" role="inner"/></relation>"#), "{}", xml);

    let first_way = xml.find("<way ").unwrap();
    let last_node = xml.rfind("<node ").unwrap();
    let first_relation = xml.find("<relation ").unwrap();
    assert!(last_node < first_way && first_way < first_relation);

    db.finish().await;
}
