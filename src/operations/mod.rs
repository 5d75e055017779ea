pub mod growth;
pub mod query;

mod candidates;
mod resolve;
mod shells;

pub use candidates::HeightFieldCandidates;
pub use growth::{
    Candidate, Diagnostic, GrowFront, GrowthParams, Reconstruction, StopReason,
};
pub use resolve::{HostedGroup, MovedFan, Resolution, ResolveIncidence};
pub use shells::LabelShells;
