pub mod identifier_discovery;
pub mod molecule_resolver;
pub mod report_writer;

pub use identifier_discovery::{DiscoveryOutcome, IdentifierDiscovery, IdentifierDiscoveryService};
pub use molecule_resolver::{MoleculeLookup, MoleculeResolver};
pub use report_writer::ReportWriter;
