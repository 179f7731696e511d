//! The standard stat table reported by the game-server plugin

use super::descriptor::{DefaultValue, Derivation, DisplayFormat, StatColumnDescriptor as C};

/// Every column tracked by the standard deployment, in storage order
pub const STANDARD_COLUMNS: &[C] = &[
    C::counter("kills", "kill", "Kills").weight(1).weapons(),
    C::counter("deaths", "death", "Deaths"),
    C::counter("headshots", "headshot", "Headshots"),
    C::counter("suicides", "suicide", "Suicides"),
    C::counter("wounded", "wounded", "Times Wounded"),
    C::counter("npc_kills", "npc_kill", "NPC Kills"),
    C::counter("animal_kills", "animal_kill", "Animal Kills"),
    C::counter("bullets_fired", "bullet_fired", "Bullets Fired"),
    C::counter("rockets_fired", "rocket_fired", "Rockets Fired"),
    C::counter("explosives_used", "explosive_used", "Explosives Used"),
    C::counter("tcs_destroyed", "tc_destroyed", "Tool Cupboards Destroyed").weight(5),
    C::counter("helis_destroyed", "heli_destroyed", "Helicopters Destroyed").weight(10),
    C::counter("bradleys_destroyed", "bradley_destroyed", "Bradleys Destroyed").weight(10),
    C::counter("barrels_destroyed", "barrel_destroyed", "Barrels Destroyed"),
    C::counter("resources_gathered", "resource_gathered", "Resources Gathered"),
    C::counter("playtime", "playtime", "Playtime").with_display(DisplayFormat::Duration),
    C::derived(
        "kdr",
        Derivation::Ratio {
            numerator: "kills",
            denominator: "deaths",
        },
        DefaultValue::Float(0.0),
        "K/D Ratio",
        DisplayFormat::Decimal,
    ),
    C::derived(
        "points",
        Derivation::Points,
        DefaultValue::UInt(0),
        "Points",
        DisplayFormat::Integer,
    ),
    C::derived(
        "weapon_kills",
        Derivation::WeaponTally,
        DefaultValue::Json("{}"),
        "Weapon Kills",
        DisplayFormat::Json,
    ),
];
