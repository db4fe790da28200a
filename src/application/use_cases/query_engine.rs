use std::borrow::Cow;

use tracing::debug;

use crate::domain::table::Table;

/// Free-text row filter.
///
/// Each row's cells are stringified and joined with a single space, then tested
/// for a case-insensitive substring match. A query can hit any column, and one
/// spanning two adjacent fields (`"korea 23"`) matches too.
///
/// An empty query returns the input table itself.
pub fn filter<'a>(table: &'a Table, query: &str) -> Cow<'a, Table> {
    if query.is_empty() {
        return Cow::Borrowed(table);
    }

    let needle = query.to_lowercase();
    let matches: Vec<usize> = table
        .rows()
        .filter(|row| row.joined_text().to_lowercase().contains(&needle))
        .map(|row| row.index())
        .collect();

    debug!(
        query_len = query.len(),
        matched = matches.len(),
        total = table.row_count(),
        "Filtered table"
    );

    Cow::Owned(table.select_rows(&matches))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::table::Column;

    fn ports() -> Table {
        Table::new(vec![
            Column::text(
                "Port Name",
                vec![Some("Shanghai"), Some("Busan"), Some("Chittagong"), Some("Atlantis")],
            ),
            Column::text(
                "Country",
                vec![Some("China"), Some("South Korea"), Some("Bangladesh"), None],
            ),
            Column::numeric("MillionTEU2023", vec![Some(49.2), Some(23.0), Some(3.1), None]),
        ])
        .unwrap()
    }

    #[test]
    fn test_empty_query_is_identity() {
        let table = ports();
        let result = filter(&table, "");
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(*result, table);
    }

    #[test]
    fn test_case_insensitive_match_any_column() {
        let table = ports();
        let result = filter(&table, "CHINA");
        assert_eq!(result.row_count(), 1);
        assert_eq!(
            result.column("Port Name").unwrap().values[0].as_str(),
            Some("Shanghai")
        );
    }

    #[test]
    fn test_numbers_are_searchable() {
        let table = ports();
        let result = filter(&table, "49.2");
        assert_eq!(result.row_count(), 1);
        let result = filter(&table, "23");
        assert_eq!(result.row_count(), 1);
    }

    #[test]
    fn test_match_spans_adjacent_fields() {
        let table = ports();
        let result = filter(&table, "korea 23");
        assert_eq!(result.row_count(), 1);
    }

    #[test]
    fn test_result_keeps_order_and_columns() {
        let table = ports();
        let result = filter(&table, "an");
        let names: Vec<_> = result
            .column("Port Name")
            .unwrap()
            .values
            .iter()
            .map(|v| v.to_text().into_owned())
            .collect();

        assert_eq!(names, vec!["Shanghai", "Busan", "Chittagong", "Atlantis"]);
        assert_eq!(result.column_names(), table.column_names());
    }

    #[test]
    fn test_retained_rows_match_and_others_do_not() {
        let table = ports();
        for query in ["a", "ch", "s", "South", "1", " ", "zzz"] {
            let result = filter(&table, query);
            let needle = query.to_lowercase();

            for row in result.rows() {
                assert!(row.joined_text().to_lowercase().contains(&needle));
            }

            let excluded = table
                .rows()
                .filter(|row| !row.joined_text().to_lowercase().contains(&needle))
                .count();
            assert_eq!(result.row_count() + excluded, table.row_count());
        }
    }

    #[test]
    fn test_no_match_keeps_schema() {
        let table = ports();
        let result = filter(&table, "rotterdam");
        assert_eq!(result.row_count(), 0);
        assert_eq!(result.column_count(), 3);
    }
}
