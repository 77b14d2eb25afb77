// Adapters layer: HTTP clients for the source and destination CMS and the
// port implementations built on them.

pub mod destination;
pub mod media;
pub mod resolver;
pub mod source;

pub use destination::DestinationClient;
pub use media::HttpMediaTransfer;
pub use resolver::HttpRelationResolver;
pub use source::SourceClient;
