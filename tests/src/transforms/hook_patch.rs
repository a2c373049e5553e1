use super::init_tracing;
use color_eyre::Result;
use graft_transform::hook_patch::{PatchConfig, PatchState};
use graft_transform::pass::{DefaultPass, Pass};
use graft_transform::presets::elytra_start_server_flight;
use graft_transform::resolver::{IdentityResolver, MappingTable};
use graft_transform::Transform;
use graft_tests::{entity_action, entity_action_drifted, fixture_path};

#[test]
fn elytra_preset_patches_chest_lookup() -> Result<()> {
    init_tracing();
    let patch = elytra_start_server_flight().resolve(&IdentityResolver)?;
    let mut method = entity_action();
    let original: Vec<_> = method.instructions.instructions().cloned().collect();

    let outcome = patch.run(&mut method)?;
    assert!(outcome.applied);
    assert_eq!(outcome.state, PatchState::Done);
    assert_eq!(
        outcome.message,
        "Added 'elytra_start_server_flight' patch!"
    );

    let report = outcome.report.as_ref().expect("report on success");
    assert_eq!(report.anchor_position, 36);
    assert_eq!(report.preceding_position, 29);
    assert_eq!(method.instructions.len(), original.len() + 3);

    // removing the inserted records gives back the original method
    let remaining: Vec<_> = method
        .instructions
        .iter()
        .filter(|(id, _)| !report.inserted.contains(id))
        .map(|(_, insn)| insn.clone())
        .collect();
    assert_eq!(remaining, original);

    let printed = method.to_string();
    assert!(printed.contains(
        "  INVOKESTATIC hellfirepvp/astralsorcery/common/util/ASMHookEndpoint.transformElytraItem"
    ));
    Ok(())
}

#[test]
fn drifted_method_is_left_alone() -> Result<()> {
    init_tracing();
    let patch = elytra_start_server_flight().resolve(&IdentityResolver)?;
    let mut method = entity_action_drifted();
    let before = method.clone();

    let outcome = patch.run(&mut method)?;
    assert!(!outcome.applied);
    assert_eq!(outcome.state, PatchState::Aborted);
    assert_eq!(outcome.failed_at, Some(PatchState::SearchingAnchor));
    assert!(outcome.message.contains("isElytraUsable"));
    assert!(outcome.report.is_none());
    assert_eq!(method, before);

    let json = serde_json::to_value(&outcome)?;
    assert_eq!(json["state"], "aborted");
    assert_eq!(json["failed_at"], "searching_anchor");
    assert!(json.get("report").is_none());
    Ok(())
}

#[test]
fn readable_names_through_mapping_table() -> Result<()> {
    let methods = "searge,name,side,desc\n\
                   func_185069_d,isUsable,0,\n\
                   func_184582_a,getItemStackFromSlot,2,\n\
                   func_147357_a,processEntityAction,2,\n";
    let fields = "searge,name,side,desc\nfield_147369_b,player,2,\n";
    let table = MappingTable::from_csv(methods, fields)?;
    let patch = elytra_start_server_flight().resolve(&table)?;
    assert_eq!(patch.target.method, "processEntityAction");

    let text = entity_action()
        .to_string()
        .replace("func_185069_d", "isUsable")
        .replace("func_184582_a", "getItemStackFromSlot")
        .replace("func_147357_a", "processEntityAction")
        .replace("field_147369_b", "player");
    let mut method = graft_core::listing::parse_listing(&text)?;
    assert!(patch.targets(&method));

    let outcome = patch.run(&mut method)?;
    assert!(outcome.applied);
    let (_, field_read) = method
        .instructions
        .at(31)
        .expect("record after this load");
    assert_eq!(field_read.field_ref().map(|f| f.name.as_str()), Some("player"));
    Ok(())
}

#[test]
fn json_config_drives_a_pass() -> Result<()> {
    init_tracing();
    let json = serde_json::to_string_pretty(&elytra_start_server_flight())?;
    let config = PatchConfig::from_json(&json)?;
    let patch = config.resolve(&IdentityResolver)?;
    assert_eq!(Transform::name(&patch), "elytra_start_server_flight");

    let passes: Vec<Box<dyn Transform>> = vec![Box::new(patch)];
    let mut method = entity_action();
    assert!(DefaultPass.run(&mut method, &passes)?);
    assert_eq!(method.instructions.len(), 51);

    let mut drifted = entity_action_drifted();
    assert!(!DefaultPass.run(&mut drifted, &passes)?);
    Ok(())
}

#[test]
fn fixture_path_points_into_fixtures() {
    assert!(fixture_path("process_entity_action.asm").is_file());
}
