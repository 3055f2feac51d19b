//! Helpers for working with SQLite parameter limits.

/// Chunk size for batch statements.
///
/// SQLite caps the number of bound parameters per statement
/// (SQLITE_MAX_VARIABLE_NUMBER, typically 999). Batch upserts bind
/// several parameters per row, so 500 rows per statement stays safely
/// under the cap.
pub const SQLITE_MAX_PARAMS_CHUNK: usize = 500;

/// Splits a slice into chunks sized for batch SQLite statements.
pub fn chunk_for_sqlite<T>(items: &[T]) -> impl Iterator<Item = &[T]> {
    items.chunks(SQLITE_MAX_PARAMS_CHUNK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_for_sqlite_empty() {
        let items: Vec<i32> = vec![];
        assert!(chunk_for_sqlite(&items).next().is_none());
    }

    #[test]
    fn test_chunk_for_sqlite_over_limit() {
        let items: Vec<i32> = (0..(SQLITE_MAX_PARAMS_CHUNK as i32 + 1)).collect();
        let chunks: Vec<_> = chunk_for_sqlite(&items).collect();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), SQLITE_MAX_PARAMS_CHUNK);
        assert_eq!(chunks[1].len(), 1);
    }
}
