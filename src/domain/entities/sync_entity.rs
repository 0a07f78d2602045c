use crate::domain::value_objects::{EntityKey, FieldMapper};
use serde::{de::DeserializeOwned, Serialize};

/// A domain record mirrored between the local store and the remote service.
///
/// The serde shape of the type is the local representation. The remote
/// representation is derived from it through [`SyncEntity::field_mapper`].
pub trait SyncEntity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: &'static str;

    fn key(&self) -> Option<EntityKey>;

    fn set_key(&mut self, key: EntityKey);

    fn field_mapper() -> FieldMapper {
        FieldMapper::identity()
    }

    /// Records shown when nothing has ever been cached.
    fn demo_dataset() -> Vec<Self> {
        Vec::new()
    }
}
