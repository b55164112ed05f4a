mod curated;
mod dailymed;
mod labels;
mod openfda;
mod prices;
mod rxnav;

pub use curated::CuratedSource;
pub use dailymed::DailymedSource;
pub use labels::LabelStoreSource;
pub use openfda::OpenFdaSource;
pub use prices::{PriceDirectory, DETAIL_BATCH_CAP};
pub use rxnav::RxnavSource;
