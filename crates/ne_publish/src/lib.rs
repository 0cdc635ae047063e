pub mod digest;
pub mod email;
pub mod localization;
pub mod publishing;
pub mod seo;

pub use digest::{DailyDigest, DigestService};
pub use email::{EmailDigestService, LogEmailSender};
pub use localization::{LocalizationService, Location};
pub use publishing::{EventFilter, PublishingService};
pub use seo::{build_seo_metadata, SeoMetadata};
