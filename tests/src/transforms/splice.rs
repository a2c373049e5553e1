use color_eyre::Result;
use color_eyre::eyre::eyre;
use graft_core::frame::LocalContext;
use graft_core::{Instruction, Opcode};
use graft_transform::matcher::find_first_call_before;
use graft_transform::presets::elytra_start_server_flight;
use graft_transform::splice::{InsertionPolicy, SpliceFragment, check_preconditions, splice};
use graft_tests::{Step, entity_action, method_from_steps};

fn ops(method: &graft_core::MethodBody, range: std::ops::Range<usize>) -> Vec<Opcode> {
    method
        .instructions
        .range(range)
        .map(|(_, _, insn)| insn.op())
        .collect()
}

/// `[.., getItem@3, .., isUsable@7]`: a `Before` splice at 3 moves the lookup to 6.
#[test]
fn before_policy_shifts_anchor_by_three() -> Result<()> {
    let mut method = method_from_steps(&[Step::GetItem, Step::Nop, Step::IsUsable]);
    let config = elytra_start_server_flight();
    let (anchor_id, anchor_insn) = method
        .instructions
        .at(3)
        .map(|(id, insn)| (id, insn.clone()))
        .ok_or_else(|| eyre!("no record at 3"))?;
    let check = method.instructions.at(7).and_then(|(_, insn)| insn.method_ref());
    assert_eq!(check.map(|c| c.name.as_str()), Some("isUsable"));

    let len = method.instructions.len();
    let fragment = SpliceFragment::build(&config.hook, &config.receiver_field)?;
    let inserted = splice(&mut method.instructions, anchor_id, fragment, InsertionPolicy::Before)?;

    assert_eq!(method.instructions.len(), len + 3);
    assert_eq!(method.instructions.index_of(anchor_id)?, 6);
    assert_eq!(method.instructions.get(anchor_id), Some(&anchor_insn));
    assert_eq!(
        ops(&method, 3..7),
        vec![Opcode::ALOAD, Opcode::GETFIELD, Opcode::INVOKESTATIC, Opcode::INVOKEVIRTUAL]
    );
    let positions: Vec<usize> = inserted
        .iter()
        .map(|id| method.instructions.index_of(*id))
        .collect::<std::result::Result<_, _>>()?;
    assert_eq!(positions, vec![3, 4, 5]);
    Ok(())
}

#[test]
fn after_policy_runs_fragment_on_returned_item() -> Result<()> {
    let mut method = entity_action();
    let config = elytra_start_server_flight();
    let found = find_first_call_before(&method, &config.preceding.call, 36)
        .ok_or_else(|| eyre!("no chest lookup"))?;
    let anchor_insn = method
        .instructions
        .get(found.id)
        .cloned()
        .ok_or_else(|| eyre!("anchor vanished"))?;

    check_preconditions(
        &method,
        &anchor_insn,
        &found.context,
        &config.hook,
        InsertionPolicy::After,
    )
    .map_err(|reason| eyre!(reason))?;

    let fragment = SpliceFragment::build(&config.hook, &config.receiver_field)?;
    splice(&mut method.instructions, found.id, fragment, InsertionPolicy::After)?;

    assert_eq!(
        ops(&method, 29..34),
        vec![
            Opcode::INVOKEVIRTUAL,
            Opcode::ALOAD,
            Opcode::GETFIELD,
            Opcode::INVOKESTATIC,
            Opcode::ASTORE,
        ]
    );
    let (_, hook_call) = method.instructions.at(32).ok_or_else(|| eyre!("no hook"))?;
    assert_eq!(
        hook_call.method_ref().map(|c| c.name.as_str()),
        Some("transformElytraItem")
    );
    // the hook leaves exactly the item where the lookup left it
    assert_eq!(LocalContext::at(&method, 33).stack_depth(), Some(1));
    Ok(())
}

#[test]
fn preconditions_reject_shallow_stack_and_wrong_return() {
    let method = entity_action();
    let config = elytra_start_server_flight();
    let lookup = method.instructions.at(29).map(|(_, i)| i.clone()).unwrap();

    let shallow = LocalContext::at(&method, 28);
    let err = check_preconditions(&method, &lookup, &shallow, &config.hook, InsertionPolicy::After)
        .unwrap_err();
    assert!(err.contains("anchor needs 2"), "{err}");

    let not_a_call = Instruction::aload(3);
    let ctx = LocalContext::at(&method, 29);
    assert!(
        check_preconditions(&method, &not_a_call, &ctx, &config.hook, InsertionPolicy::After)
            .is_err()
    );
    assert!(
        check_preconditions(&method, &not_a_call, &ctx, &config.hook, InsertionPolicy::Before)
            .is_ok()
    );

    let (_, anchor) = method.instructions.at(36).unwrap();
    let err = check_preconditions(
        &method,
        anchor,
        &LocalContext::at(&method, 36),
        &config.hook,
        InsertionPolicy::After,
    )
    .unwrap_err();
    assert!(err.contains("returns Z"), "{err}");
}
