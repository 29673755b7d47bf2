use sheetledger_core::{
    LedgerConfig, MemorySheetStore, QueryOutcome, RecordExtractor, RecordQueryService,
    SchemaDetector,
};

fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
    data.iter()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect()
}

fn tracking_sheet() -> Vec<Vec<String>> {
    rows(&[
        &["PLAN SEMANAL", "", "", ""],
        &["Semana 10", "", "", ""],
        &["Folio", "Concepto", "Fecha\nAlta", "Estatus"],
        &["A-1", "Pintura", "01/03/25", "EN PROCESO"],
        &["", "", "", ""],
        &["A-2", "Pisos", "02/03/25", "ASIGNADO"],
        &["", "TAREAS REALIZADAS", "", ""],
        &["A-0", "Limpieza", "20/02/25", "EN PROCESO"],
        &["FOLIO", "CONCEPTO", "FECHA ALTA", "ESTATUS"],
    ])
}

#[test]
fn detector_finds_header_below_title_rows() {
    assert_eq!(SchemaDetector::new().detect(&tracking_sheet()), Some(2));
}

#[test]
fn extraction_partitions_at_the_sentinel_and_drops_blank_rows() {
    let sheet = tracking_sheet();
    let extraction = RecordExtractor::default().extract(&sheet, 2);

    assert_eq!(extraction.headers, vec!["Folio", "Concepto", "Fecha\nAlta", "Estatus"]);
    let active = extraction
        .active
        .iter()
        .map(|record| (record.get("Folio").unwrap_or_default(), record.row_index))
        .collect::<Vec<_>>();
    assert_eq!(active, vec![("A-1", Some(4)), ("A-2", Some(6))]);

    // Looks active, but sits below the sentinel.
    assert_eq!(extraction.history.len(), 1);
    assert_eq!(extraction.history[0].get("Estatus"), Some("EN PROCESO"));
    assert_eq!(extraction.history[0].row_index, Some(8));
}

#[test]
fn records_serialize_as_flat_objects_with_row_index() {
    let sheet = tracking_sheet();
    let extraction = RecordExtractor::default().extract(&sheet, 2);

    let value = serde_json::to_value(&extraction.active[0]).unwrap();
    assert_eq!(value["Folio"], "A-1");
    assert_eq!(value["_rowIndex"], 4);
}

#[test]
fn unrecognized_table_yields_two_empty_partitions() {
    let store = MemorySheetStore::with_tables([(
        "NOTAS",
        rows(&[&["lunes", "martes"], &["x", "y"], &["z", "w"]]),
    )]);
    let service = RecordQueryService::new(&store, &LedgerConfig::default());

    let query = service.query_records("NOTAS").unwrap();
    assert_eq!(query.outcome, QueryOutcome::NoHeader);
    assert!(query.extraction.active.is_empty());
    assert!(query.extraction.history.is_empty());
}

#[test]
fn custom_sentinel_comes_from_config() {
    let store = MemorySheetStore::with_tables([(
        "T",
        rows(&[&["ID", "RESPONSABLE"], &["1", "Ana"], &["CERRADAS"], &["2", "Luis"]]),
    )]);
    let config = LedgerConfig {
        history_sentinel: "cerradas".to_string(),
        ..LedgerConfig::default()
    };

    let query = RecordQueryService::new(&store, &config)
        .query_records("T")
        .unwrap();
    assert_eq!(query.extraction.active.len(), 1);
    assert_eq!(query.extraction.history.len(), 1);
}
