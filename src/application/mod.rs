pub mod collector;
pub mod control;
pub mod exporter;
pub mod registry;

pub use collector::{CategoryOutcome, CategoryReport, CollectReport, HostCollector, ScrapeContext};
pub use control::{ControlError, ControlRequest, ControlService, HostRequest, Mutation};
pub use exporter::{should_watch, DiscoveryReport, Exporter, Scrape, ScrapeReport};
pub use registry::{Registry, RegistryError};
