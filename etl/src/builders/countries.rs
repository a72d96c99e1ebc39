use super::TableBuilder;
use crate::reference::{COUNTRIES_SECTION, extract_section};
use crate::utils::frame::{lowercase_columns, read_csv, rename_columns};
use async_trait::async_trait;
use common::Result;
use datafusion::functions::expr_fn::{starts_with, upper};
use datafusion::prelude::*;
use std::sync::Arc;

/// Lower-cased source headers of the world population table and their
/// normalised names.
const COUNTRY_COLUMNS: [(&str, &str); 11] = [
    ("country (or dependency)", "name"),
    ("population (2020)", "population"),
    ("yearly change", "yearly_change"),
    ("net change", "net_change"),
    ("density (p/km²)", "density"),
    ("land area (km²)", "land_area"),
    ("migrants (net)", "migrants_net"),
    ("fert. rate", "fert_rate"),
    ("med. age", "med_age"),
    ("urban pop %", "urban_pop_pct"),
    ("world share", "world_share"),
];

/// Country dimension: I-94 country codes joined to world population figures.
///
/// A code matches every demographic row whose upper-cased name is a prefix of
/// the code's label, so `MEXICO Air Sea, and Not Reported` picks up `MEXICO`.
/// A label can match several rows (`NIGERIA` matches `NIGER` and `NIGERIA`)
/// or none; all outcomes are kept.
pub struct CountriesBuilder {
    labels: Arc<str>,
    countries_path: String,
}

impl CountriesBuilder {
    pub fn new(labels: Arc<str>, countries_path: impl Into<String>) -> Self {
        Self {
            labels,
            countries_path: countries_path.into(),
        }
    }

    async fn world(&self, ctx: &SessionContext) -> Result<DataFrame> {
        let world = read_csv(ctx, &self.countries_path, b',').await?;
        let world = rename_columns(lowercase_columns(world)?, &COUNTRY_COLUMNS)?;
        Ok(world.with_column("name", upper(ident("name")))?)
    }
}

#[async_trait]
impl TableBuilder for CountriesBuilder {
    fn table_name(&self) -> &'static str {
        "countries"
    }

    fn sort_keys(&self) -> &'static [&'static str] {
        &["country_id", "name"]
    }

    async fn build(&self, ctx: &SessionContext) -> Result<DataFrame> {
        let codes = extract_section(&self.labels, COUNTRIES_SECTION)?.to_dataframe(ctx)?;
        let codes = rename_columns(codes, &[("name", "country")])?.alias("countries")?;
        let world = self.world(ctx).await?.alias("world")?;

        let countries = codes.join_on(
            world,
            JoinType::Left,
            [starts_with(upper(col("countries.country")), col("world.name"))],
        )?;

        rename_columns(countries, &[("code", "country_id")])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::frame::sort_by;
    use crate::utils::testing::{column_names, column_strings, row_count, write_fixture};

    const LABELS: &str = "/* I94CIT & I94RES - This format shows all the valid and invalid codes */\n\
value i94cntyl\n\
   582 =  'MEXICO Air Sea, and Not Reported (I-94, no land arrivals)'\n\
   236 =  'AFGHANISTAN'\n\
   375 =  'NIGERIA'\n\
   999 =  'Atlantis'\n\
;\n";

    const WORLD: &str = "Country (or dependency),Population (2020),Yearly Change,Net Change,Density (P/Km²),Land Area (Km²),Migrants (net),Fert. Rate,Med. Age,Urban Pop %,World Share\n\
Mexico,128932753,1.06 %,1357224,66,1943950,-60000,2.1,29,84 %,1.65 %\n\
Afghanistan,38928346,2.33 %,886592,60,652860,-62920,4.6,18,25 %,0.50 %\n\
Niger,24206644,3.84 %,895929,19,1266700,4000,7.0,15,17 %,0.31 %\n\
Nigeria,206139589,2.58 %,5175990,226,910770,-60000,5.4,18,52 %,2.64 %\n";

    async fn build_fixture() -> DataFrame {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), "population_by_country_2020.csv", WORLD);
        let ctx = SessionContext::new();

        let df = CountriesBuilder::new(Arc::from(LABELS), path)
            .build(&ctx)
            .await
            .unwrap();
        // materialise before the fixture directory goes away
        let batches = df.collect().await.unwrap();
        ctx.read_batches(batches).unwrap()
    }

    #[tokio::test]
    async fn test_renames_demographic_columns() {
        let df = build_fixture().await;
        assert_eq!(
            column_names(&df),
            vec![
                "country_id",
                "country",
                "name",
                "population",
                "yearly_change",
                "net_change",
                "density",
                "land_area",
                "migrants_net",
                "fert_rate",
                "med_age",
                "urban_pop_pct",
                "world_share"
            ]
        );
    }

    #[tokio::test]
    async fn test_prefix_match_fans_out_and_keeps_unmatched() {
        let df = build_fixture().await;
        let batches = sort_by(df, &["country_id", "name"]).unwrap().collect().await.unwrap();

        assert_eq!(row_count(&batches), 5);
        assert_eq!(
            column_strings(&batches, "country_id"),
            vec![
                Some("236".into()),
                Some("375".into()),
                Some("375".into()),
                Some("582".into()),
                Some("999".into())
            ]
        );
        assert_eq!(
            column_strings(&batches, "name"),
            vec![
                Some("AFGHANISTAN".into()),
                Some("NIGER".into()),
                Some("NIGERIA".into()),
                Some("MEXICO".into()),
                None
            ]
        );
        assert_eq!(column_strings(&batches, "population")[4], None);
    }
}
