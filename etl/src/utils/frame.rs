use common::Result;
use datafusion::logical_expr::SortExpr;
use datafusion::prelude::*;

/// Reads a delimited text file with a header row.
pub async fn read_csv(ctx: &SessionContext, path: &str, delimiter: u8) -> Result<DataFrame> {
    let options = CsvReadOptions::new().has_header(true).delimiter(delimiter);
    Ok(ctx.read_csv(path, options).await?)
}

/// Projects every column under the name chosen by `rename`, keeping the
/// original name when it returns `None`.
///
/// Columns are addressed with their qualifier, so this is safe to apply
/// directly to the output of a join.
pub fn rename_with<F>(df: DataFrame, rename: F) -> Result<DataFrame>
where
    F: Fn(&str) -> Option<String>,
{
    let exprs: Vec<Expr> = df
        .schema()
        .columns()
        .into_iter()
        .map(|column| {
            let name = rename(&column.name).unwrap_or_else(|| column.name.clone());
            Expr::Column(column).alias(name)
        })
        .collect();

    Ok(df.select(exprs)?)
}

/// Renames the listed columns; names absent from the frame are ignored.
pub fn rename_columns(df: DataFrame, renames: &[(&str, &str)]) -> Result<DataFrame> {
    rename_with(df, |name| {
        renames
            .iter()
            .find(|(from, _)| *from == name)
            .map(|(_, to)| to.to_string())
    })
}

pub fn lowercase_columns(df: DataFrame) -> Result<DataFrame> {
    rename_with(df, |name| Some(name.to_lowercase()))
}

/// Keeps one row per distinct value of `keys`.
///
/// Among rows sharing a key the survivor is the smallest by the remaining
/// columns, so repeated runs keep the same row.
pub fn drop_duplicates(df: DataFrame, keys: &[&str]) -> Result<DataFrame> {
    let columns = df.schema().columns();

    let on_expr: Vec<Expr> = keys.iter().map(|key| ident(*key)).collect();
    let select_expr: Vec<Expr> = columns.iter().cloned().map(Expr::Column).collect();

    let mut sort_expr: Vec<SortExpr> = keys.iter().map(|key| ident(*key).sort(true, false)).collect();
    sort_expr.extend(
        columns
            .into_iter()
            .filter(|column| !keys.contains(&column.name.as_str()))
            .map(|column| Expr::Column(column).sort(true, false)),
    );

    Ok(df.distinct_on(on_expr, select_expr, Some(sort_expr))?)
}

/// Sorts ascending by `keys`, nulls last.
pub fn sort_by(df: DataFrame, keys: &[&str]) -> Result<DataFrame> {
    if keys.is_empty() {
        return Ok(df);
    }
    let sort_expr: Vec<SortExpr> = keys.iter().map(|key| ident(*key).sort(true, false)).collect();
    Ok(df.sort(sort_expr)?)
}
