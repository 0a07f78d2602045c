pub mod action_kind;
pub mod action_payload;
pub mod collection_name;
pub mod entity_key;
pub mod field_mapper;
pub mod link_quality;
pub mod queued_action_id;

pub use action_kind::ActionKind;
pub use action_payload::ActionPayload;
pub use collection_name::CollectionName;
pub use entity_key::EntityKey;
pub use field_mapper::{FieldMapper, KeyStyle};
pub use link_quality::LinkQuality;
pub use queued_action_id::QueuedActionId;
