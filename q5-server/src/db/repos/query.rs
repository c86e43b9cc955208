//! Shared helpers for list queries

use std::future::Future;

use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::db::DbError;
use crate::models::Pagination;

/// Total for a page read with `COUNT(*) OVER() AS total`.
///
/// A page past the end has no rows to carry the window count, so
/// `recount` (a plain `COUNT(*)` over the same filter) runs instead.
/// It is never polled otherwise.
pub(crate) async fn window_total<F>(
    rows: &[PgRow],
    page: Pagination,
    recount: F,
) -> Result<i64, DbError>
where
    F: Future<Output = Result<(i64,), sqlx::Error>>,
{
    if let Some(row) = rows.first() {
        return Ok(row.try_get("total")?);
    }
    if page.offset() == 0 {
        return Ok(0);
    }
    let (total,) = recount.await?;
    Ok(total)
}

/// `ILIKE` pattern matching `needle` anywhere, with `%`, `_` and `\`
/// taken literally.
pub(crate) fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_search_is_wrapped() {
        assert_eq!(contains_pattern("qubit"), "%qubit%");
        assert_eq!(contains_pattern(""), "%%");
    }

    #[test]
    fn wildcards_are_literal() {
        assert_eq!(contains_pattern("100%"), "%100\\%%");
        assert_eq!(contains_pattern("t_1"), "%t\\_1%");
        assert_eq!(contains_pattern(r"a\b"), r"%a\\b%");
    }

    #[tokio::test]
    async fn empty_first_page_skips_recount() {
        let recount = async { Err::<(i64,), _>(sqlx::Error::PoolTimedOut) };
        let total = window_total(&[], Pagination::new(1, 20), recount)
            .await
            .unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn page_past_the_end_recounts() {
        let recount = async { Ok::<_, sqlx::Error>((25_i64,)) };
        let total = window_total(&[], Pagination::new(3, 20), recount)
            .await
            .unwrap();
        assert_eq!(total, 25);
    }
}
