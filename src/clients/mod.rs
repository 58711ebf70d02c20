pub mod details_client;
pub mod json_fields;
pub mod key_rotation;
pub mod pubchem_client;
pub mod registry_client;
pub mod serpapi_client;

pub use details_client::{DetailsEnrichmentClient, DetailsSource};
pub use key_rotation::KeyRotation;
pub use pubchem_client::PubChemClient;
pub use registry_client::{RegionalRegistryClient, RegistrySource};
pub use serpapi_client::{OrganicResult, SerpApiClient};
