//! Built-in patch definitions, written against searge names.

use crate::hook_patch::{AnchorSpec, PatchConfig, PatchTarget};
use crate::matcher::CallSiteDescriptor;
use crate::splice::{HookDescriptor, InsertionPolicy};
use crate::{Error, Result};
use graft_core::{DispatchKind, FieldRef};

/// Names accepted by [`by_name`].
pub const NAMES: &[&str] = &["elytra_start_server_flight"];

const NET_HANDLER: &str = "net/minecraft/network/play/ServerPlayNetHandler";
const ITEM_STACK: &str = "Lnet/minecraft/item/ItemStack;";

/// Lets the hook substitute the chest item the server checks when a player starts gliding.
///
/// The check in `ServerPlayNetHandler.processEntityAction` reads the chest slot and passes the
/// stack to `ElytraItem.isUsable`; the hook runs on the value read from the slot.
pub fn elytra_start_server_flight() -> PatchConfig {
    PatchConfig {
        name: "elytra_start_server_flight".into(),
        target: PatchTarget {
            class: NET_HANDLER.into(),
            method: "func_147357_a".into(),
            descriptor: "(Lnet/minecraft/network/play/client/CEntityActionPacket;)V".into(),
        },
        anchor: AnchorSpec {
            label: "isElytraUsable".into(),
            call: CallSiteDescriptor::new(
                DispatchKind::Static,
                "net/minecraft/item/ElytraItem",
                "func_185069_d",
                format!("({ITEM_STACK})Z"),
            ),
        },
        preceding: AnchorSpec {
            label: "getItemStackFromSlot".into(),
            call: CallSiteDescriptor::new(
                DispatchKind::Virtual,
                "net/minecraft/entity/player/ServerPlayerEntity",
                "func_184582_a",
                format!("(Lnet/minecraft/inventory/EquipmentSlotType;){ITEM_STACK}"),
            ),
        },
        hook: HookDescriptor::new(
            "hellfirepvp/astralsorcery/common/util/ASMHookEndpoint",
            "transformElytraItem",
            format!("({ITEM_STACK}Lnet/minecraft/entity/LivingEntity;){ITEM_STACK}"),
        ),
        receiver_field: FieldRef::new(
            NET_HANDLER,
            "field_147369_b",
            "Lnet/minecraft/entity/player/ServerPlayerEntity;",
        ),
        policy: InsertionPolicy::After,
    }
}

/// Looks up a preset by name.
pub fn by_name(name: &str) -> Result<PatchConfig> {
    match name {
        "elytra_start_server_flight" => Ok(elytra_start_server_flight()),
        other => Err(Error::UnknownPreset(other.to_string())),
    }
}

pub fn all() -> Vec<PatchConfig> {
    NAMES.iter().filter_map(|name| by_name(name).ok()).collect()
}
