pub mod admissions;
pub mod airports;
pub mod countries;
pub mod fact;
pub mod states;
pub mod time;

pub use admissions::AdmissionsBuilder;
pub use airports::AirportsBuilder;
pub use countries::CountriesBuilder;
pub use fact::FactBuilder;
pub use states::StatesBuilder;
pub use time::TimeBuilder;

use async_trait::async_trait;
use common::Result;
use datafusion::prelude::{DataFrame, SessionContext};

/// One output table of the star schema.
#[async_trait]
pub trait TableBuilder: Send + Sync {
    fn table_name(&self) -> &'static str;

    /// Columns the table is sorted by before it is written.
    fn sort_keys(&self) -> &'static [&'static str];

    /// Hive partition columns, outermost first.
    fn partition_by(&self) -> &'static [&'static str] {
        &[]
    }

    async fn build(&self, ctx: &SessionContext) -> Result<DataFrame>;
}
