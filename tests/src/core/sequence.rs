use super::init_tracing;
use graft_core::result::Error;
use graft_core::{Instruction, InstructionSequence, Opcode};
use graft_tests::entity_action;

#[test]
fn insertion_keeps_existing_records_in_order() {
    init_tracing();
    let mut method = entity_action();
    let before: Vec<Instruction> = method.instructions.instructions().cloned().collect();
    let ids = method.instructions.ids();

    let anchor = ids[29];
    let inserted = method
        .instructions
        .insert_before(anchor, [Instruction::aload(0), Instruction::aload(3)])
        .unwrap();
    assert_eq!(inserted.len(), 2);
    assert_eq!(method.instructions.len(), before.len() + 2);

    // every old id still resolves, to the same record, in the same relative order
    let mut last = None;
    for (id, expected) in ids.iter().zip(&before) {
        assert_eq!(method.instructions.get(*id), Some(expected));
        let pos = method.instructions.index_of(*id).unwrap();
        assert!(last.is_none_or(|prev| prev < pos));
        last = Some(pos);
    }
    assert_eq!(method.instructions.index_of(anchor).unwrap(), 31);
    assert_eq!(method.instructions.index_of(inserted[0]).unwrap(), 29);
}

#[test]
fn ids_from_a_clone_stay_valid_in_the_clone_only() {
    let method = entity_action();
    let mut copy = method.clone();
    let id = method.instructions.ids()[0];
    assert!(copy.instructions.contains(id));

    let fresh: InstructionSequence = [Instruction::simple(Opcode::NOP).unwrap()]
        .into_iter()
        .collect();
    let foreign = fresh.ids()[0];
    let err = copy
        .instructions
        .insert_after(foreign, [Instruction::aload(0)])
        .unwrap_err();
    assert!(matches!(err, Error::RecordNotMember(_)));
    assert_eq!(copy, method);
}

#[test]
fn serializes_as_listing_records() {
    let method = entity_action();
    let json = serde_json::to_value(&method.instructions).unwrap();
    let records = json.as_array().unwrap();
    assert_eq!(records.len(), method.instructions.len());
    assert_eq!(records[0]["op"], "ALOAD");
}

#[test]
fn diverging_clones_do_not_share_new_ids() {
    let mut method = entity_action();
    let mut copy = method.clone();
    let anchor = method.instructions.ids()[29];

    let in_copy = copy
        .instructions
        .insert_before(anchor, [Instruction::aload(0)])
        .unwrap();
    let in_original = method
        .instructions
        .insert_before(anchor, [Instruction::aload(3)])
        .unwrap();

    assert_ne!(in_copy, in_original);
    assert!(!method.instructions.contains(in_copy[0]));
    assert!(matches!(
        method.instructions.index_of(in_copy[0]),
        Err(Error::RecordNotMember(_))
    ));
    assert_eq!(method.instructions.index_of(in_original[0]).unwrap(), 29);
    assert_eq!(copy.instructions.index_of(in_copy[0]).unwrap(), 29);
}
