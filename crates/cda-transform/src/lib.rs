pub mod ids;
pub mod mappers;
pub mod pipeline;
pub mod resolver;
pub mod sampling;
pub mod vocab;

pub use ids::mint_id;
pub use mappers::{Mapped, SourceEntity, map_entity};
pub use pipeline::TransformationPipeline;
pub use resolver::{ResolutionReport, resolve};
