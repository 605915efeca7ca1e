mod responses;

pub use responses::FreshnessReport;
