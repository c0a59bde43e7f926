use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, IntoCondition, Order, SelectStatement};
use sea_orm::{
    Condition, DatabaseConnection, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, QueryTrait, Select,
};

use crate::PaginatedResponse;

/// Builds the listing query shared by every collection endpoint: AND-ed
/// equality filters, one OR group of case-insensitive substring matches,
/// a sort column resolved against a fixed allow-list, and limit/offset
/// pagination with full metadata.
///
/// All values travel as bound parameters. The only identifiers spliced into
/// the SQL are the allow-listed sort column and direction.
pub struct ListQueryBuilder<E: EntityTrait> {
    query: Select<E>,
    page: u64,
    limit: u64,
}

impl<E: EntityTrait> ListQueryBuilder<E> {
    pub fn new() -> Self {
        Self {
            query: E::find(),
            page: 1,
            limit: 10,
        }
    }

    /// Sets page/limit. Values flow through untouched: `limit = 0` becomes
    /// `LIMIT 0` and `page = 0` saturates to offset 0. The engine, not this
    /// layer, decides what out-of-range means.
    pub fn paginate(mut self, page: u64, limit: u64) -> Self {
        self.page = page;
        self.limit = limit;
        self
    }

    /// Appends one AND-ed predicate.
    pub fn filter<C: IntoCondition>(mut self, condition: C) -> Self {
        self.query = self.query.filter(condition);
        self
    }

    /// Adds the free-text search group: `term` is matched case-insensitively
    /// as a substring against each of `columns`, OR-ed inside one
    /// parenthesized group. Empty or absent terms add nothing.
    pub fn search(mut self, term: Option<&str>, columns: &[E::Column]) -> Self {
        let term = match term.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => t,
            None => return self,
        };
        let pattern = format!("%{}%", term);
        let mut group = Condition::any();
        for column in columns {
            group = group.add(Expr::col(*column).ilike(pattern.as_str()));
        }
        self.query = self.query.filter(group);
        self
    }

    /// Resolves `sort_by` against the allow-list; anything unrecognized
    /// silently falls back to `default`, never an error. `sort_order` is
    /// descending only for `desc` (any case), ascending otherwise.
    pub fn sort(
        mut self,
        sort_by: Option<&str>,
        sort_order: Option<&str>,
        allowed: &[(&str, E::Column)],
        default: E::Column,
    ) -> Self {
        let column = sort_by
            .and_then(|name| {
                allowed
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, column)| *column)
            })
            .unwrap_or(default);
        self.query = self.query.order_by(column, resolve_order(sort_order));
        self
    }

    fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// The final select with limit/offset applied; lets tests render and
    /// pin the generated SQL.
    pub fn into_query(self) -> SelectStatement {
        let offset = self.offset();
        self.query.limit(self.limit).offset(offset).into_query()
    }

    /// Runs the count and page queries and assembles pagination metadata.
    pub async fn fetch(
        self,
        db: &DatabaseConnection,
    ) -> Result<PaginatedResponse<E::Model>, sea_orm::DbErr>
    where
        E::Model: FromQueryResult + Send + Sync,
    {
        let total = self.query.clone().count(db).await?;
        let offset = self.offset();
        let items = self
            .query
            .limit(self.limit)
            .offset(offset)
            .all(db)
            .await?;

        Ok(PaginatedResponse::new(items, total, self.page, self.limit))
    }
}

impl<E: EntityTrait> Default for ListQueryBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_order(sort_order: Option<&str>) -> Order {
    match sort_order {
        Some(value) if value.eq_ignore_ascii_case("desc") => Order::Desc,
        _ => Order::Asc,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::product;
    use sea_orm::sea_query::{PostgresQueryBuilder, QueryStatementWriter};

    fn sql(builder: ListQueryBuilder<product::Entity>) -> String {
        builder.into_query().to_string(PostgresQueryBuilder)
    }

    #[test]
    fn sort_order_defaults_to_ascending() {
        assert!(matches!(resolve_order(None), Order::Asc));
        assert!(matches!(resolve_order(Some("ASC")), Order::Asc));
        assert!(matches!(resolve_order(Some("sideways")), Order::Asc));
        assert!(matches!(resolve_order(Some("desc")), Order::Desc));
        assert!(matches!(resolve_order(Some("DESC")), Order::Desc));
    }

    #[test]
    fn unknown_sort_column_falls_back_to_default() {
        let allowed = [
            ("stock_code", product::Column::StockCode),
            ("unit_price", product::Column::UnitPrice),
        ];
        let rendered = sql(ListQueryBuilder::new().sort(
            Some("product_id; DROP TABLE products"),
            None,
            &allowed,
            product::Column::ProductId,
        ));
        assert!(rendered.contains(r#""product_id" ASC"#), "{rendered}");
        assert!(!rendered.contains("DROP TABLE"), "{rendered}");
    }

    #[test]
    fn allow_listed_sort_column_is_used() {
        let allowed = [("unit_price", product::Column::UnitPrice)];
        let rendered = sql(ListQueryBuilder::new().sort(
            Some("unit_price"),
            Some("desc"),
            &allowed,
            product::Column::ProductId,
        ));
        assert!(rendered.contains(r#""unit_price" DESC"#), "{rendered}");
    }

    #[test]
    fn search_builds_one_or_group_of_ilike_matches() {
        let rendered = sql(ListQueryBuilder::new().search(
            Some("mug"),
            &[product::Column::Description, product::Column::StockCode],
        ));
        assert!(rendered.contains(r#""description" ILIKE '%mug%'"#), "{rendered}");
        assert!(rendered.contains(r#""stock_code" ILIKE '%mug%'"#), "{rendered}");
        assert!(rendered.contains(" OR "), "{rendered}");
    }

    #[test]
    fn blank_search_adds_no_predicate() {
        let rendered = sql(ListQueryBuilder::new().search(
            Some("   "),
            &[product::Column::Description],
        ));
        assert!(!rendered.contains("ILIKE"), "{rendered}");
    }

    #[test]
    fn pagination_renders_limit_and_offset() {
        let rendered = sql(ListQueryBuilder::new().paginate(3, 10));
        assert!(rendered.contains("LIMIT 10"), "{rendered}");
        assert!(rendered.contains("OFFSET 20"), "{rendered}");
    }

    #[test]
    fn zero_limit_passes_through() {
        let rendered = sql(ListQueryBuilder::new().paginate(1, 0));
        assert!(rendered.contains("LIMIT 0"), "{rendered}");
    }

    #[test]
    fn page_zero_saturates_to_first_offset() {
        let rendered = sql(ListQueryBuilder::new().paginate(0, 10));
        assert!(rendered.contains("OFFSET 0"), "{rendered}");
    }
}
