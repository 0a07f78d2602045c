pub const SELECT_LOCAL_ENTITY: &str = r#"
    SELECT collection, entity_key, value, updated_at
    FROM local_entities
    WHERE collection = ?1 AND entity_key = ?2
"#;

pub const UPSERT_LOCAL_ENTITY: &str = r#"
    INSERT INTO local_entities (collection, entity_key, value, updated_at)
    VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT(collection, entity_key) DO UPDATE SET
        value = excluded.value,
        updated_at = excluded.updated_at
"#;

pub const DELETE_LOCAL_ENTITY: &str = r#"
    DELETE FROM local_entities
    WHERE collection = ?1 AND entity_key = ?2
"#;

pub const SELECT_LOCAL_COLLECTION: &str = r#"
    SELECT collection, entity_key, value, updated_at
    FROM local_entities
    WHERE collection = ?1
    ORDER BY entity_key ASC
"#;

pub const SELECT_LOCAL_COLLECTION_NAMES: &str = r#"
    SELECT DISTINCT collection
    FROM local_entities
    ORDER BY collection ASC
"#;

pub const INSERT_QUEUED_ACTION: &str = r#"
    INSERT INTO action_queue (
        kind, collection, payload, local_key, remote_key,
        is_synced, retry_count, enqueued_at, updated_at
    ) VALUES (?1, ?2, ?3, ?4, NULL, 0, 0, ?5, ?5)
"#;

pub const SELECT_QUEUED_ACTION_BY_ID: &str = r#"
    SELECT * FROM action_queue WHERE id = ?1
"#;

pub const SELECT_PENDING_ACTIONS: &str = r#"
    SELECT * FROM action_queue
    WHERE is_synced = 0 AND retry_count < ?1
    ORDER BY enqueued_at ASC, id ASC
    LIMIT ?2
"#;

pub const SELECT_ALL_ACTIONS: &str = r#"
    SELECT * FROM action_queue
    ORDER BY enqueued_at ASC, id ASC
"#;

pub const MARK_ACTION_SYNCED: &str = r#"
    UPDATE action_queue
    SET is_synced = 1,
        remote_key = COALESCE(?2, remote_key),
        last_error = NULL,
        synced_at = ?3,
        updated_at = ?3
    WHERE id = ?1 AND is_synced = 0
"#;

pub const INCREMENT_ACTION_RETRY: &str = r#"
    UPDATE action_queue
    SET retry_count = retry_count + 1,
        last_error = ?2,
        updated_at = ?3
    WHERE id = ?1 AND is_synced = 0
"#;

pub const MARK_ACTION_FAILED: &str = r#"
    UPDATE action_queue
    SET retry_count = MAX(retry_count, ?2),
        last_error = ?3,
        updated_at = ?4
    WHERE id = ?1 AND is_synced = 0
"#;

pub const ASSIGN_ACTION_REMOTE_KEY: &str = r#"
    UPDATE action_queue
    SET remote_key = ?3,
        updated_at = ?4
    WHERE collection = ?1 AND local_key = ?2 AND is_synced = 0
"#;

pub const RESET_FAILED_ACTIONS: &str = r#"
    UPDATE action_queue
    SET retry_count = 0,
        last_error = NULL,
        updated_at = ?2
    WHERE is_synced = 0 AND retry_count >= ?1
"#;

pub const PURGE_SYNCED_ACTIONS: &str = r#"
    DELETE FROM action_queue WHERE is_synced = 1
"#;

pub const SELECT_QUEUE_STATS: &str = r#"
    SELECT
        COUNT(*) AS total,
        COALESCE(SUM(CASE WHEN is_synced = 0 AND retry_count < ?1 THEN 1 ELSE 0 END), 0) AS pending,
        COALESCE(SUM(CASE WHEN is_synced = 0 AND retry_count >= ?1 THEN 1 ELSE 0 END), 0) AS failed,
        COALESCE(SUM(CASE WHEN is_synced = 1 THEN 1 ELSE 0 END), 0) AS synced
    FROM action_queue
"#;

pub const DISCARD_UNSYNCED_ENTITY_ACTIONS: &str = r#"
    DELETE FROM action_queue
    WHERE collection = ?1 AND local_key = ?2 AND is_synced = 0
      AND EXISTS (
          SELECT 1 FROM action_queue
          WHERE collection = ?1 AND local_key = ?2
            AND kind = 'CREATE' AND is_synced = 0
      )
"#;
