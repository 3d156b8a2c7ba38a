//! Data models for histdoc.

mod document;
mod entity;
mod work_item;

pub use document::{DocumentMetadata, EnrichedDocument, TextStatistics};
pub use entity::{
    DateEntity, DateKind, Entity, ExtractedEntities, MatchKind, NameEntity, PlaceEntity,
    ThemeEntity,
};
pub use work_item::{PdfLocation, WorkItem};
