use data_logger::{DataLogger, FieldDefinition, FieldRegistry, LoggerConfig, LoggerError, FIELD_NAME_LEN};

#[test]
fn test_ids_are_dense() {
    let mut registry = FieldRegistry::new(16, 1024);
    for i in 0..10 {
        let id = registry.add_field(&format!("field_{}", i), 1).unwrap();
        assert_eq!(id.index(), i);
    }
    assert_eq!(registry.len(), 10);

    for (id, field) in registry.iter() {
        assert_eq!(field.name(), format!("field_{}", id.index()));
        assert_eq!(registry.get(id), Some(field));
    }
}

#[test]
fn test_offsets_are_prefix_sums() {
    let widths = [4u32, 6, 2, 1, 7];
    let mut registry = FieldRegistry::new(16, 1024);
    let ids: Vec<_> = widths
        .iter()
        .enumerate()
        .map(|(i, &w)| registry.add_field(&format!("f{}", i), w).unwrap())
        .collect();

    let mut expected = 0usize;
    for (id, &width) in ids.iter().zip(widths.iter()) {
        assert_eq!(registry.offset(*id), Some(expected));
        assert_eq!(registry.slot_range(*id), Some(expected..expected + width as usize));
        expected += width as usize;
    }
    assert_eq!(registry.packed_len(), 20);
}

#[test]
fn test_zero_width_rejected() {
    let mut registry = FieldRegistry::new(4, 64);
    assert!(matches!(registry.add_field("empty", 0), Err(LoggerError::InvalidWidth)));
    assert!(registry.is_empty());
}

#[test]
fn test_capacity_exceeded() {
    let mut registry = FieldRegistry::new(2, 64);
    registry.add_field("a", 1).unwrap();
    registry.add_field("b", 1).unwrap();

    let result = registry.add_field("c", 1);
    assert!(matches!(result, Err(LoggerError::RegistryFull { capacity: 2 })));
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.packed_len(), 2);
}

#[test]
fn test_buffer_capacity_exceeded() {
    // 40 bytes of timestep buffer hold 10 floats.
    let config = LoggerConfig::default().with_chunk_size(40);
    let mut logger = DataLogger::with_writer(Vec::new(), config).unwrap();

    logger.add_field("a", 6).unwrap();
    let result = logger.add_field("b", 5);
    assert!(matches!(
        result,
        Err(LoggerError::BufferCapacity { required: 44, capacity: 40 })
    ));

    // The failed registration left room for exactly four more.
    logger.add_field("c", 4).unwrap();
    assert_eq!(logger.timestep_size(), 40);
}

#[test]
fn test_long_names_truncated() {
    let long = "n".repeat(100);
    let field = FieldDefinition::new(&long, 3);
    assert_eq!(field.name_bytes().len(), FIELD_NAME_LEN);
    assert_eq!(field.name(), "n".repeat(FIELD_NAME_LEN));
    assert_eq!(field.width(), 3);
}

#[test]
fn test_truncation_respects_utf8() {
    // 63 ASCII bytes followed by a two-byte character straddling the limit.
    let name = format!("{}é", "a".repeat(63));
    assert_eq!(name.len(), 65);

    let field = FieldDefinition::new(&name, 1);
    assert_eq!(field.name_bytes().len(), 63);
    assert_eq!(field.name(), "a".repeat(63));
    assert_eq!(field.raw_name()[63], 0);
}

#[test]
fn test_short_names_zero_padded() {
    let field = FieldDefinition::new("pos", 4);
    let raw = field.raw_name();
    assert_eq!(&raw[..3], b"pos");
    assert!(raw[3..].iter().all(|&b| b == 0));
}

#[test]
fn test_find_by_name() {
    let mut registry = FieldRegistry::new(4, 64);
    registry.add_field("pos", 4).unwrap();
    let vel = registry.add_field("vel", 6).unwrap();

    assert_eq!(registry.find("vel"), Some(vel));
    assert_eq!(registry.find("missing"), None);
}

#[test]
fn test_frozen_registry_rejects_fields() {
    let mut logger = DataLogger::with_writer(Vec::new(), LoggerConfig::default()).unwrap();
    logger.add_field("pos", 4).unwrap();
    logger.begin_timestep().unwrap();

    assert!(logger.registry().is_frozen());
    assert!(matches!(logger.add_field("late", 1), Err(LoggerError::SchemaFrozen)));
    assert_eq!(logger.registry().len(), 1);
}

#[test]
fn test_rebuild_from_decoded_fields() {
    let fields = vec![FieldDefinition::new("pos", 4), FieldDefinition::new("vel", 6)];
    let registry = FieldRegistry::from_fields(fields, 16).unwrap();

    assert!(registry.is_frozen());
    assert_eq!(registry.find("vel").map(|id| id.index()), Some(1));
    assert_eq!(registry.slot_range(registry.find("vel").unwrap()), Some(4..10));

    let too_wide = vec![FieldDefinition::new("big", 17)];
    assert!(matches!(
        FieldRegistry::from_fields(too_wide, 16),
        Err(LoggerError::BufferCapacity { required: 68, capacity: 64 })
    ));
}
