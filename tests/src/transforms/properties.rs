use graft_core::DispatchKind;
use graft_core::FieldRef;
use graft_transform::hook_patch::{AnchorSpec, HookPatch, PatchConfig, PatchTarget};
use graft_transform::matcher::CallSiteDescriptor;
use graft_transform::resolver::IdentityResolver;
use graft_transform::splice::{HookDescriptor, InsertionPolicy};
use graft_tests::{GET_ITEM_DESC, IS_USABLE_DESC, OWNER, PLAYER, Step, method_from_steps};
use proptest::prelude::*;

fn patch(policy: InsertionPolicy) -> HookPatch {
    PatchConfig {
        name: "generated".into(),
        target: PatchTarget {
            class: OWNER.into(),
            method: "handle".into(),
            descriptor: "(La/Slot;)V".into(),
        },
        anchor: AnchorSpec {
            label: "isUsable".into(),
            call: CallSiteDescriptor::new(
                DispatchKind::Static,
                "a/Elytra",
                "isUsable",
                IS_USABLE_DESC,
            ),
        },
        preceding: AnchorSpec {
            label: "getItem".into(),
            call: CallSiteDescriptor::new(
                DispatchKind::Virtual,
                PLAYER,
                "getItem",
                GET_ITEM_DESC,
            ),
        },
        hook: HookDescriptor::new("mod/Hooks", "transform", "(La/Stack;La/Entity;)La/Stack;"),
        receiver_field: FieldRef::new(OWNER, "player", "La/Player;"),
        policy,
    }
    .resolve(&IdentityResolver)
    .expect("valid generated patch")
}

/// Positions of the call record of each step, plus the step itself.
fn call_positions(steps: &[Step]) -> Vec<(usize, Step)> {
    let mut pos = 0;
    let mut out = Vec::new();
    for step in steps {
        let (offset, len) = match step {
            Step::GetItem => (Some(3), 5),
            Step::GetItemOverload => (Some(4), 6),
            Step::IsUsable => (Some(1), 3),
            Step::Nop => (None, 1),
        };
        if let Some(offset) = offset {
            out.push((pos + offset, *step));
        }
        pos += len;
    }
    out
}

fn arb_steps() -> impl Strategy<Value = Vec<Step>> {
    prop::collection::vec(
        prop_oneof![
            Just(Step::GetItem),
            Just(Step::GetItemOverload),
            Just(Step::IsUsable),
            Just(Step::Nop),
        ],
        0..24,
    )
}

fn arb_policy() -> impl Strategy<Value = InsertionPolicy> {
    prop_oneof![Just(InsertionPolicy::After), Just(InsertionPolicy::Before)]
}

proptest! {
    #[test]
    fn prop_absent_anchor_leaves_method_untouched(
        steps in arb_steps().prop_map(|s| s.into_iter().filter(|s| *s != Step::IsUsable).collect::<Vec<_>>()),
        policy in arb_policy(),
    ) {
        let mut method = method_from_steps(&steps);
        let before = method.clone();
        let outcome = patch(policy).run(&mut method).unwrap();
        prop_assert!(!outcome.applied);
        prop_assert_eq!(method, before);
    }

    #[test]
    fn prop_splice_is_additive_and_nearest(steps in arb_steps(), policy in arb_policy()) {
        let mut method = method_from_steps(&steps);
        let original: Vec<_> = method.instructions.instructions().cloned().collect();
        let calls = call_positions(&steps);

        let anchor = calls.iter().find(|(_, s)| *s == Step::IsUsable).map(|(p, _)| *p);
        let nearest = anchor.and_then(|a| {
            calls
                .iter()
                .filter(|(p, s)| *s == Step::GetItem && *p < a)
                .map(|(p, _)| *p)
                .next_back()
        });

        let outcome = patch(policy).run(&mut method).unwrap();
        match nearest {
            Some(expected) => {
                prop_assert!(outcome.applied, "{}", outcome.message);
                let report = outcome.report.unwrap();
                prop_assert_eq!(Some(report.anchor_position), anchor);
                prop_assert_eq!(report.preceding_position, expected);
                prop_assert_eq!(method.instructions.len(), original.len() + 3);

                let remaining: Vec<_> = method
                    .instructions
                    .iter()
                    .filter(|(id, _)| !report.inserted.contains(id))
                    .map(|(_, insn)| insn.clone())
                    .collect();
                prop_assert_eq!(remaining, original);
            }
            None => {
                prop_assert!(!outcome.applied);
                prop_assert_eq!(method.instructions.len(), original.len());
            }
        }
    }

    #[test]
    fn prop_patching_is_deterministic(steps in arb_steps(), policy in arb_policy()) {
        let mut a = method_from_steps(&steps);
        let mut b = method_from_steps(&steps);
        let patch = patch(policy);
        let first = patch.run(&mut a).unwrap();
        let second = patch.run(&mut b).unwrap();
        prop_assert_eq!(first.applied, second.applied);
        prop_assert_eq!(a.to_string(), b.to_string());
    }
}
