//! Service modules: catalog access, filesystem maintenance, reports

pub mod folder_cleaner;
pub mod reports;
pub mod stash_client;

pub use folder_cleaner::{delete_folders, find_empty_folders, CleanError, CleanSummary, EmptyFolder};
pub use reports::{
    load_performer_report, load_studio_report, PerformerReport, PerformerStats, StudioReport,
    StudioStats,
};
pub use stash_client::{ClientError, StashClient};
