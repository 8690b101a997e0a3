mod common;

use engine_core::error::EngineError;
use extraction_engine::adapters::BankRegistry;

#[test]
fn detects_bca_v2_before_generic_bca() {
    let registry = BankRegistry::standard();
    let adapter = registry
        .detect_bank(common::BCA_V2_FULL_TEXT)
        .expect("bank detected");
    assert_eq!(adapter.bank_code(), "bca_v2");
}

#[test]
fn detects_first_generation_bca() {
    let registry = BankRegistry::standard();
    let adapter = registry
        .detect_bank(common::BCA_V1_FULL_TEXT)
        .expect("bank detected");
    assert_eq!(adapter.bank_code(), "bca");
}

#[test]
fn detection_is_deterministic() {
    let registry = BankRegistry::standard();
    let first = registry
        .detect_bank(common::BCA_V2_FULL_TEXT)
        .expect("bank detected")
        .bank_code();
    for _ in 0..10 {
        let next = registry
            .detect_bank(common::BCA_V2_FULL_TEXT)
            .expect("bank detected")
            .bank_code();
        assert_eq!(first, next);
    }
}

#[test]
fn unknown_bank_lists_supported_banks() {
    let registry = BankRegistry::standard();
    let err = registry
        .detect_bank("LAPORAN KEUANGAN KOPERASI ANTAH BERANTAH")
        .expect_err("no adapter should match");
    match err {
        EngineError::UnknownBank { supported } => {
            assert!(!supported.is_empty());
            assert_eq!(supported.len(), registry.len());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn lookup_by_bank_code_for_manual_selection() {
    let registry = BankRegistry::standard();
    assert!(registry.get("mandiri").is_some());
    assert!(registry.get("bri").is_some());
    assert!(registry.get("unlisted_bank").is_none());
}

#[test]
fn registry_covers_all_supported_formats() {
    let registry = BankRegistry::standard();
    assert_eq!(registry.len(), 10);
    assert!(!registry.is_empty());
}
