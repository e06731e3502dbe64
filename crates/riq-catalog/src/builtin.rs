//! Built-in reference data (UK ITL 2025 geography, v1 metric set)

use crate::level::Level;
use crate::metric::Metric;
use crate::region::Region;

/// Public code of the national region
pub const NATIONAL_CODE: &str = "UK";

/// Storage code of the national region
pub const NATIONAL_DB_CODE: &str = "K02000001";

/// Employment-jobs metric id
pub const JOBS_METRIC: &str = "emp_total_jobs";

/// Northern Ireland storage companion of the jobs metric
pub const JOBS_NI_METRIC: &str = "emp_total_jobs_ni";

/// Public code of Northern Ireland
pub const NI_CODE: &str = "UKN";

// (public code, storage code, name)
const ITL1: [(&str, &str, &str); 12] = [
    ("UKC", "E12000001", "North East"),
    ("UKD", "E12000002", "North West"),
    ("UKE", "E12000003", "Yorkshire and The Humber"),
    ("UKF", "E12000004", "East Midlands"),
    ("UKG", "E12000005", "West Midlands"),
    ("UKH", "E12000006", "East of England"),
    ("UKI", "E12000007", "London"),
    ("UKJ", "E12000008", "South East"),
    ("UKK", "E12000009", "South West"),
    ("UKL", "W92000004", "Wales"),
    ("UKM", "S92000003", "Scotland"),
    ("UKN", "N92000002", "Northern Ireland"),
];

// (code, name, parent)
const ITL2: [(&str, &str, &str); 9] = [
    ("TLC3", "Tees Valley", "UKC"),
    ("TLD3", "Greater Manchester", "UKD"),
    ("TLI3", "Inner London - West", "UKI"),
    ("TLI4", "Inner London - East", "UKI"),
    ("TLI5", "Outer London - East and North East", "UKI"),
    ("TLI6", "Outer London - South", "UKI"),
    ("TLI7", "Outer London - West and North West", "UKI"),
    ("TLL5", "East Wales", "UKL"),
    ("TLN0", "Northern Ireland", "UKN"),
];

const ITL3: [(&str, &str, &str); 6] = [
    ("TLD33", "Manchester", "TLD3"),
    ("TLD34", "Greater Manchester South West", "TLD3"),
    ("TLI31", "Camden and City of London", "TLI3"),
    ("TLI32", "Westminster", "TLI3"),
    ("TLL52", "Cardiff and Vale of Glamorgan", "TLL5"),
    ("TLN06", "Belfast", "TLN0"),
];

const LAD: [(&str, &str, &str); 8] = [
    ("E08000003", "Manchester", "TLD33"),
    ("E08000009", "Trafford", "TLD34"),
    ("E09000001", "City of London", "TLI31"),
    ("E09000007", "Camden", "TLI31"),
    ("E09000033", "Westminster", "TLI32"),
    ("W06000015", "Cardiff", "TLL52"),
    ("N09000003", "Belfast", "TLN06"),
    ("S12000036", "City of Edinburgh", "UKM"),
];

/// Built-in region list
#[must_use]
pub fn regions() -> Vec<Region> {
    let mut out = Vec::with_capacity(1 + ITL1.len() + ITL2.len() + ITL3.len() + LAD.len());
    out.push(Region::new(NATIONAL_CODE, Level::Uk, "United Kingdom").with_db_code(NATIONAL_DB_CODE));
    out.extend(ITL1.iter().map(|(code, db, name)| {
        Region::new(*code, Level::Itl1, *name)
            .with_db_code(*db)
            .with_parent(NATIONAL_CODE)
    }));
    for (level, table) in [(Level::Itl2, &ITL2[..]), (Level::Itl3, &ITL3[..]), (Level::Lad, &LAD[..])] {
        out.extend(
            table
                .iter()
                .map(|(code, name, parent)| Region::new(*code, level, *name).with_parent(*parent)),
        );
    }
    out
}

/// Built-in metric list
#[must_use]
pub fn metrics() -> Vec<Metric> {
    vec![
        Metric::new("population_total", "Total Population", "people").with_scale("count"),
        Metric::new("nominal_gva_mn_gbp", "Gross Value Added", "£m").with_scale("nominal"),
        Metric::new("gdhi_per_head_gbp", "Disposable Income (per head)", "£").with_scale("nominal"),
        Metric::new(JOBS_METRIC, "Total Employment", "jobs").with_scale("count"),
        Metric::new(JOBS_NI_METRIC, "Total Employment (Northern Ireland basis)", "jobs")
            .with_scale("count")
            .companion_of(JOBS_METRIC),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MetricCatalog, RegionCatalog};

    #[test]
    fn builtin_data_is_consistent() {
        let regions = RegionCatalog::new(regions()).unwrap();
        let metrics = MetricCatalog::new(metrics()).unwrap();

        assert_eq!(regions.regions_at_level(Level::Itl1).len(), 12);
        assert_eq!(regions.national().unwrap().db_code, NATIONAL_DB_CODE);
        assert_eq!(regions.by_code(NI_CODE).unwrap().db_code, "N92000002");
        assert_eq!(metrics.public().count(), 4);

        for region in regions.iter() {
            if let Some(parent) = &region.parent {
                assert!(regions.by_code(parent).is_some(), "dangling parent {parent}");
            }
        }
    }
}
