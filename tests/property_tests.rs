//! Property-based tests for result decoding
//!
//! These tests push arbitrary values through the embedded engine and check
//! that decoding is lossless:
//! - Binary payloads come back byte for byte, including zero bytes
//! - Every row has exactly one cell per column
//! - NULL and empty stay distinct

#[cfg(test)]
mod tests {
    use mysql_bridge::drivers::EmbeddedDriver;
    use mysql_bridge::{ConnectOptions, Connection};
    use proptest::prelude::*;

    fn memory() -> Connection<EmbeddedDriver> {
        let mut conn = Connection::<EmbeddedDriver>::new().unwrap();
        conn.connect(&ConnectOptions::new(":memory:", "root", "").database("prop"))
            .unwrap();
        conn
    }

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02X}", b)).collect()
    }

    proptest! {
        #[test]
        fn blobs_round_trip(payload in proptest::collection::vec(any::<u8>(), 0..512)) {
            let mut conn = memory();
            let sql = format!("SELECT X'{}' AS payload", hex(&payload));
            let set = conn.execute(&sql).unwrap().unwrap();

            prop_assert_eq!(set.len(), 1);
            prop_assert_eq!(set.rows()[0].get(0), Some(Some(payload.as_slice())));
        }

        #[test]
        fn rows_match_column_count(
            columns in 1usize..8,
            rows in proptest::collection::vec(proptest::option::of("[a-z]{0,6}"), 0..20),
        ) {
            let mut conn = memory();
            let names: Vec<String> = (0..columns).map(|i| format!("c{}", i)).collect();
            conn.execute(&format!("CREATE TABLE t ({})", names.join(", "))).unwrap();

            for value in &rows {
                let literal = match value {
                    Some(text) => format!("'{}'", text),
                    None => "NULL".to_string(),
                };
                let values = vec![literal; columns].join(", ");
                conn.execute(&format!("INSERT INTO t VALUES ({})", values)).unwrap();
            }

            let set = conn.execute("SELECT * FROM t ORDER BY rowid").unwrap().unwrap();
            prop_assert_eq!(set.len(), rows.len());
            prop_assert_eq!(set.columns().len(), columns);
            for (row, expected) in set.rows().iter().zip(&rows) {
                prop_assert_eq!(row.len(), columns);
                for index in 0..columns {
                    prop_assert_eq!(row.get(index), Some(expected.as_deref().map(str::as_bytes)));
                }
            }
        }
    }
}
