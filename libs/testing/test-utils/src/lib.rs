//! Shared test utilities for domain testing
//!
//! This crate provides reusable test infrastructure for the domain crates:
//! - `TestDatabase`: pgvector-enabled PostgreSQL container with automatic cleanup (feature: "postgres")
//! - `TestDataBuilder`: Deterministic test data generation (always available)
//! - `assertions`: Custom assertion helpers (always available)
//!
//! # Features
//!
//! - `postgres` (default): Enables PostgreSQL test infrastructure
//!
//! # Usage
//!
//! ```rust,no_run
//! use test_utils::{TestDatabase, TestDataBuilder};
//!
//! #[tokio::test]
//! async fn my_postgres_test() {
//!     let db = TestDatabase::new().await;
//!     db.create_chunk_table("public", "book_chunks3", 8).await;
//!
//!     let builder = TestDataBuilder::from_test_name("my_test");
//!     let embedding = builder.embedding(8, 1);
//!     db.insert_chunk("public", "book_chunks3", 1, "Call me Ishmael.", &embedding).await;
//! }
//! ```

#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::TestDatabase;

/// Builder for test data with deterministic randomization
///
/// This ensures tests are reproducible by using seeded random data.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    /// Create a new builder with a seed (for deterministic tests)
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (generates seed from test name hash)
    ///
    /// This is the recommended way to create a builder for consistent test data.
    ///
    /// # Example
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_nearest_chunks");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Unit-length pseudo-random vector, stable per `(seed, salt)`.
    pub fn embedding(&self, dimension: usize, salt: u64) -> Vec<f32> {
        // xorshift64*; state must be non-zero
        let mut state = (self.seed ^ salt.wrapping_mul(0x9E37_79B9_7F4A_7C15)) | 1;
        let raw: Vec<f32> = (0..dimension)
            .map(|_| {
                state ^= state >> 12;
                state ^= state << 25;
                state ^= state >> 27;
                let next = state.wrapping_mul(0x2545_F491_4F6C_DD1D);
                (next >> 40) as f32 / (1u64 << 24) as f32 - 0.5
            })
            .collect();

        let norm = raw.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm == 0.0 {
            return raw;
        }
        raw.into_iter().map(|v| v / norm).collect()
    }

    /// Chunk text for position `index`, e.g. `"chunk-12345-3"`.
    pub fn chunk_content(&self, index: usize) -> String {
        format!("chunk-{}-{}", self.seed, index)
    }

    /// Generate a unique name for testing
    ///
    /// # Example
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("my_test");
    /// let name = builder.name("chunks", "main");
    /// // Returns: "test_chunks_12345_main"
    /// ```
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test_{}_{}_{}", prefix, self.seed, suffix)
    }
}

/// Test assertion helpers
pub mod assertions {
    use std::collections::HashSet;
    use std::fmt::Debug;
    use std::hash::Hash;

    /// Assert that no element of `returned` appears in `excluded`
    pub fn assert_disjoint<T: Eq + Hash + Debug>(returned: &[T], excluded: &[T], context: &str) {
        let excluded: HashSet<&T> = excluded.iter().collect();
        let overlap: Vec<&T> = returned.iter().filter(|id| excluded.contains(id)).collect();
        assert!(
            overlap.is_empty(),
            "{}: returned excluded items {:?}",
            context,
            overlap
        );
    }

    /// Assert that a slice has no duplicates
    pub fn assert_unique<T: Eq + Hash + Debug>(items: &[T], context: &str) {
        let mut seen = HashSet::new();
        for item in items {
            assert!(seen.insert(item), "{}: duplicate item {:?}", context, item);
        }
    }

    /// Assert that an optional value is Some
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }
}
