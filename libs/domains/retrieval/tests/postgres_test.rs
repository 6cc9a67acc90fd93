//! Nearest-neighbor queries against a real pgvector instance.
//!
//! Needs Docker: `cargo test -p domain_retrieval --test postgres_test -- --ignored`

use domain_retrieval::{
    ChunkRepository, DistanceMetric, PgChunkRepository, RetrievalQuery, TableName,
};
use test_utils::assertions::assert_disjoint;
use test_utils::{TestDataBuilder, TestDatabase};

const DIM: usize = 8;

async fn seeded(db: &TestDatabase, builder: &TestDataBuilder, schema: &str, table: &str) {
    db.create_chunk_table(schema, table, DIM).await;
    for id in 1..=10 {
        db.insert_chunk(
            schema,
            table,
            id,
            &builder.chunk_content(id as usize),
            &builder.embedding(DIM, id as u64),
        )
        .await;
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_nearest_returns_closest_first_and_honors_exclusions() {
    let db = TestDatabase::new().await;
    let builder = TestDataBuilder::from_test_name("pg_nearest");
    seeded(&db, &builder, "public", "book_chunks3").await;

    let repo = PgChunkRepository::new(db.connection(), TableName::default());
    repo.ping().await.unwrap();

    // The query equals chunk 4's embedding, so chunk 4 is at distance 0.
    let target = builder.embedding(DIM, 4);
    let query = RetrievalQuery::new(target.clone(), vec![], 5, DistanceMetric::Cosine);
    let first = repo.nearest(&query).await.unwrap();
    assert_eq!(first.len(), 5);
    assert_eq!(first[0].id, 4);
    assert_eq!(first[0].content, builder.chunk_content(4));

    let used: Vec<i64> = first.iter().map(|c| c.id).collect();
    let query = RetrievalQuery::new(target.clone(), used.clone(), 5, DistanceMetric::Cosine);
    let second = repo.nearest(&query).await.unwrap();
    assert_eq!(second.len(), 5);
    let second_ids: Vec<i64> = second.iter().map(|c| c.id).collect();
    assert_disjoint(&second_ids, &used, "second page");

    let all: Vec<i64> = (1..=10).collect();
    let query = RetrievalQuery::new(target, all, 5, DistanceMetric::Cosine);
    assert!(repo.nearest(&query).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_custom_schema_and_metric() {
    let db = TestDatabase::new().await;
    let builder = TestDataBuilder::from_test_name("pg_schema");
    let table = builder.name("chunks", "l2");
    seeded(&db, &builder, "library", &table).await;

    let repo = PgChunkRepository::new(db.connection(), TableName::new("library", &table).unwrap());
    let query = RetrievalQuery::new(builder.embedding(DIM, 7), vec![1, 2], 3, DistanceMetric::L2);
    let result = repo.nearest(&query).await.unwrap();

    assert_eq!(result.len(), 3);
    assert_eq!(result[0].id, 7);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_missing_table_is_store_error() {
    let db = TestDatabase::new().await;
    let repo = PgChunkRepository::new(db.connection(), TableName::new("public", "absent").unwrap());

    let query = RetrievalQuery::new(vec![0.1; DIM], vec![], 5, DistanceMetric::Cosine);
    let err = repo.nearest(&query).await.unwrap_err();
    assert!(matches!(err, domain_retrieval::RetrievalError::Store(_)));
}
