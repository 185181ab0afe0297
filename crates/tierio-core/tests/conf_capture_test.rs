//! Capturing a configured file io's conf for use in another process.

use std::sync::Arc;

use tierio_core::{
    Bytes, Conf, ConfSupplier, ConfigSource, Configurable, FileIo, FileIoError, MappingConfig,
    ObjectStoreFileIo, PathMappingFileIo, CACHE_BASE_URI, CANONICAL_BASE_URI, READ_THROUGH_CACHE,
};

fn memory_conf() -> Conf {
    let mut conf = Conf::new();
    conf.set(CACHE_BASE_URI, "memory://cache/")
        .set(CANONICAL_BASE_URI, "memory://canonical/,memory://archive/")
        .set_bool(READ_THROUGH_CACHE, true);
    conf
}

fn json_capture(conf: Conf) -> ConfSupplier {
    let json = serde_json::to_string(&conf).unwrap();
    Arc::new(move || serde_json::from_str::<Conf>(&json).unwrap())
}

#[test]
fn test_captured_conf_rebuilds_same_mapping() {
    let mut io: PathMappingFileIo = PathMappingFileIo::from_conf(memory_conf());
    io.serialize_conf_with(&json_capture);

    let shipped = serde_json::to_string(&io.conf().unwrap()).unwrap();
    let remote: PathMappingFileIo =
        PathMappingFileIo::from_conf(serde_json::from_str(&shipped).unwrap());

    assert_eq!(remote.mapping_config(), io.mapping_config());
    assert_eq!(
        remote.mapping_config().unwrap().canonical_base_prefixes(),
        ["memory://canonical/", "memory://archive/"]
    );
}

#[test]
fn test_conf_path_does_not_validate() {
    let io: PathMappingFileIo = PathMappingFileIo::from_conf(Conf::new());
    let config = io.mapping_config().unwrap();

    assert_eq!(config, &MappingConfig::new("", Vec::<String>::new(), true));
    assert_eq!(
        io.resolve_read_location("memory://canonical/x").effective_path(),
        "memory://canonical/x"
    );
}

#[test]
fn test_set_conf_replaces_mapping() {
    let mut io: PathMappingFileIo = PathMappingFileIo::from_conf(memory_conf());

    let mut next = memory_conf();
    next.set_bool(READ_THROUGH_CACHE, false);
    io.set_conf(next);

    assert!(!io.mapping_config().unwrap().read_through_cache());
    assert!(!io.conf().unwrap().get_bool(READ_THROUGH_CACHE, true));
}

#[tokio::test]
async fn test_conf_built_io_serves_reads_from_cache() {
    let mut io: PathMappingFileIo = PathMappingFileIo::from_conf(memory_conf());
    io.serialize_conf_with(&json_capture);

    let delegate: &ObjectStoreFileIo = io.delegate().unwrap();
    delegate
        .new_output_file("memory://cache/t/f")
        .unwrap()
        .create(Bytes::from("cached"))
        .await
        .unwrap();

    let input = io.new_input_file("memory://canonical/t/f").unwrap();
    assert_eq!(input.location(), "memory://canonical/t/f");
    assert_eq!(input.read().await.unwrap(), Bytes::from("cached"));

    let missing = io.new_input_file("memory://archive/t/other").unwrap();
    assert!(matches!(
        missing.read().await.unwrap_err(),
        FileIoError::NotFound { ref location } if location == "memory://cache/t/other"
    ));
}
