pub mod enrichment;
pub mod filing;
pub mod identifier;
pub mod jurisdiction;
pub mod molecule;
pub mod patent;
pub mod report;

pub use enrichment::{DetailsResult, RegistryEvent, RegistryResult};
pub use filing::{
    EmptyReason, ExtractFailure, ExtractionDiagnostics, FilingApplication, FilingResult,
    PortalRecord,
};
pub use identifier::{extract_country_code, extract_identifiers, normalize, Identifier};
pub use molecule::MoleculeProfile;
pub use patent::{DataSource, PatentField, PatentRecord};
pub use report::{ExecutionReport, ExecutiveSummary, SearchReport};
