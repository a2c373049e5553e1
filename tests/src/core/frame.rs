use graft_core::frame::LocalContext;
use graft_tests::{entity_action, method_from_steps, Step};

#[test]
fn chest_lookup_sees_handler_player_and_slot() {
    let method = entity_action();
    let ctx = LocalContext::at(&method, 29);
    assert_eq!(ctx.stack_depth(), Some(2));
    assert_eq!(ctx.stack_words(), Some(2));
    assert!(ctx.is_assigned(0));
    assert!(ctx.is_assigned(1));
    assert!(ctx.is_assigned(2));
    // slot 3 is stored on the sneak branch, which precedes in code order
    assert!(ctx.is_assigned(3));
}

#[test]
fn branch_target_after_return_is_recovered() {
    let method = entity_action();
    let contexts = LocalContext::all(&method);
    assert_eq!(contexts.len(), method.instructions.len());
    // after RETURN the stack is unknown until L_GLIDE
    assert_eq!(contexts[17].stack_depth(), None);
    assert_eq!(contexts[18].stack_depth(), Some(0));
    // L_END is reached by IF_ACMPNE, IFEQ and GOTO with an empty stack
    assert_eq!(contexts[47].stack_depth(), Some(0));
}

#[test]
fn generated_bodies_stay_balanced() {
    let method = method_from_steps(&[Step::GetItem, Step::Nop, Step::IsUsable]);
    let contexts = LocalContext::all(&method);
    // ALOAD 0, GETFIELD, ALOAD 1 then the call
    assert_eq!(contexts[3].stack_depth(), Some(2));
    assert_eq!(contexts.last().unwrap().stack_depth(), Some(0));
}
