use graft_core::listing::{parse_listing, read_listing};
use graft_core::result::Error;
use graft_core::{DispatchKind, Opcode};
use graft_tests::{entity_action, fixture_path};

#[test]
fn fixture_parses_with_header_and_labels() {
    let method = entity_action();
    assert_eq!(method.owner, "net/minecraft/network/play/ServerPlayNetHandler");
    assert_eq!(method.name, "func_147357_a");
    assert!(!method.is_static);
    assert_eq!(method.instructions.len(), 48);
    assert_eq!(method.signature().param_slots(), 1);

    let labels: Vec<&str> = method
        .instructions
        .instructions()
        .filter_map(|insn| insn.label_name())
        .collect();
    assert_eq!(labels, vec!["L_GLIDE", "L_STOP", "L_END"]);

    let (_, anchor) = method.instructions.at(36).unwrap();
    let call = anchor.method_ref().unwrap();
    assert_eq!(call.kind, DispatchKind::Static);
    assert_eq!(call.name, "func_185069_d");
}

#[test]
fn printed_fixture_reparses_identically() {
    let method = entity_action();
    let printed = method.to_string();
    let reparsed = parse_listing(&printed).unwrap();
    assert_eq!(reparsed.to_string(), printed);
    assert!(
        method
            .instructions
            .instructions()
            .zip(reparsed.instructions.instructions())
            .all(|(a, b)| a == b)
    );
}

#[test]
fn missing_file_reports_path() {
    let path = fixture_path("does_not_exist.asm");
    match read_listing(&path) {
        Err(Error::FileRead { path: reported, .. }) => {
            assert!(reported.ends_with("does_not_exist.asm"));
        }
        other => panic!("expected FileRead, got {other:?}"),
    }
}

#[test]
fn parse_errors_carry_line_and_text() {
    let text = ".method a/B run ()V\n  ALOAD 0\n  INVOKEVIRTUAL a/B.c (I\n";
    match parse_listing(text) {
        Err(Error::ParseError { line, raw, .. }) => {
            assert_eq!(line, 3);
            assert!(raw.contains("INVOKEVIRTUAL"));
        }
        other => panic!("expected ParseError, got {other:?}"),
    }
    assert!(matches!(
        parse_listing(".method a/B run ()V\n  FROB\n"),
        Err(Error::ParseError { line: 2, .. })
    ));
    assert_eq!("GOTO".parse::<Opcode>().unwrap(), Opcode::GOTO);
}
