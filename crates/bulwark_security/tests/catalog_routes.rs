//! # Catalog Route Tests
//!
//! One or two scenarios per message family, through the public entry
//! points and a document with every check enabled.

mod common;

use bulwark_protocol::{
    AdminPowers, BodyPart, ChatEnvelope, DamageRequest, ExtraInfoRequest, MessageBuffer,
    MessageWriter, SquareObjectRef, TargetRef, TeleportRequest, WireFormat,
};
use bulwark_security::{
    AccessLevel, DeathReport, FieldValue, FireStart, SecurityError, Treatment, TreatmentKind,
    Vec3,
};
use common::{checker, checker_from, document, encode, player, with_template, MockHost, MockSession};

fn square(x: i32, y: i32, z: i32, object_index: i32) -> MessageBuffer {
    encode(&SquareObjectRef {
        x,
        y,
        z,
        object_index,
    })
}

fn treatment(target: Option<i16>, valid: bool) -> Treatment {
    Treatment {
        valid,
        wielder: Some(1),
        target,
        body_part: BodyPart::Head,
        alcohol: None,
    }
}

// ---------------------------------------------------------------------------
// Compound medical actions
// ---------------------------------------------------------------------------

/// Test: cleaning a burn from out of range fails, like every sibling
/// distance check.
#[test]
fn test_clean_burn_out_of_range_fails() {
    let dir = tempfile::tempdir().unwrap();
    let host = MockHost::new();
    host.add_player(player(1, "alice", 0.0, 0.0, 0.0));
    host.add_player(player(2, "bob", 30.0, 0.0, 0.0));
    *host.treatment.lock() = Some(treatment(Some(2), true));
    let checker = checker(&host, dir.path(), "IGNORE", 16.0);
    let session = MockSession::player("alice");

    let buffer = MessageBuffer::new(vec![0; 8]);
    assert!(!checker.check_clean_burn(&session, &buffer).unwrap());
    assert_eq!(
        host.staff_lines(),
        vec!["clean_burn.distance IGNORING alice".to_owned()]
    );
    assert_eq!(
        *host.decoded.lock(),
        vec![TreatmentKind::CleanBurn, TreatmentKind::CleanBurn]
    );
}

/// Test: cleaning a burn within range passes.
#[test]
fn test_clean_burn_in_range_passes() {
    let dir = tempfile::tempdir().unwrap();
    let host = MockHost::new();
    host.add_player(player(1, "alice", 0.0, 0.0, 0.0));
    host.add_player(player(2, "bob", 5.0, 0.0, 0.0));
    *host.treatment.lock() = Some(treatment(Some(2), true));
    let checker = checker(&host, dir.path(), "KICK", 16.0);
    let session = MockSession::player("alice");

    assert!(checker.check_clean_burn(&session, &MessageBuffer::new(vec![0; 8])).unwrap());
}

/// Test: an action the game itself rejects fails at the first check.
#[test]
fn test_inconsistent_treatment_fails_first_check() {
    let dir = tempfile::tempdir().unwrap();
    let host = MockHost::new();
    host.add_player(player(1, "alice", 0.0, 0.0, 0.0));
    host.add_player(player(2, "bob", 1.0, 0.0, 0.0));
    *host.treatment.lock() = Some(treatment(Some(2), false));
    let checker = checker(&host, dir.path(), "IGNORE", 16.0);
    let session = MockSession::player("alice");

    assert!(!checker.check_remove_bullet(&session, &MessageBuffer::new(vec![0; 8])).unwrap());
    assert_eq!(
        host.staff_lines(),
        vec!["remove_bullet.offline_player IGNORING alice".to_owned()]
    );
    assert_eq!(*host.decoded.lock(), vec![TreatmentKind::RemoveBullet]);
}

/// Test: disinfecting reports the alcohol added.
#[test]
fn test_disinfect_reports_alcohol() {
    let dir = tempfile::tempdir().unwrap();
    let host = MockHost::new();
    host.add_player(player(1, "alice", 0.0, 0.0, 0.0));
    host.add_player(player(2, "bob", 40.0, 0.0, 0.0));
    *host.treatment.lock() = Some(Treatment {
        alcohol: Some(2.5),
        ..treatment(Some(2), true)
    });
    let source = with_template(
        &document("IGNORE", 16.0),
        "disinfect.distance",
        "%body_part% %alcohol_level_to_add% %target_username%",
    );
    let checker = checker_from(&host, dir.path(), &source);
    let session = MockSession::player("alice");

    assert!(!checker.check_disinfect(&session, &MessageBuffer::new(vec![0; 8])).unwrap());
    assert_eq!(host.staff_lines(), vec!["Head 2.5 bob".to_owned()]);
}

// ---------------------------------------------------------------------------
// Squares and sledgehammers
// ---------------------------------------------------------------------------

/// Test: picking up from a missing cell fails before the index is checked.
#[test]
fn test_remove_item_missing_cell() {
    let dir = tempfile::tempdir().unwrap();
    let host = MockHost::new();
    host.add_player(player(1, "alice", 0.0, 0.0, 0.0));
    let checker = checker(&host, dir.path(), "IGNORE", 16.0);
    let session = MockSession::player("alice");

    assert!(!checker.check_remove_item_from_square(&session, &square(1, 1, 0, 0)).unwrap());
    assert_eq!(
        host.staff_lines(),
        vec!["remove_item_from_square.invalid_square IGNORING alice".to_owned()]
    );
}

/// Test: the object index must address an existing object.
#[test]
fn test_remove_item_object_index() {
    let dir = tempfile::tempdir().unwrap();
    let host = MockHost::new();
    host.add_player(player(1, "alice", 0.0, 0.0, 0.0));
    host.add_cell(1, 1, 0, 2);
    let source = with_template(
        &document("IGNORE", 16.0),
        "remove_item_from_square.object_index",
        "%object_index% at %x%,%y%,%z%",
    );
    let checker = checker_from(&host, dir.path(), &source);
    let session = MockSession::player("alice");

    assert!(!checker.check_remove_item_from_square(&session, &square(1, 1, 0, 2)).unwrap());
    assert!(!checker.check_remove_item_from_square(&session, &square(1, 1, 0, -1)).unwrap());
    assert!(checker.check_remove_item_from_square(&session, &square(1, 1, 0, 1)).unwrap());
    assert_eq!(
        host.staff_lines(),
        vec!["2 at 1,1,0".to_owned(), "-1 at 1,1,0".to_owned()]
    );
}

/// Test: picking up from too far away fails.
#[test]
fn test_remove_item_distance() {
    let dir = tempfile::tempdir().unwrap();
    let host = MockHost::new();
    host.add_player(player(1, "alice", 0.0, 0.0, 0.0));
    host.add_cell(20, 0, 0, 1);
    let checker = checker(&host, dir.path(), "KICK", 16.0);
    let session = MockSession::player("alice");

    assert!(!checker.check_remove_item_from_square(&session, &square(20, 0, 0, 0)).unwrap());
    assert_eq!(session.disconnect_count(), 1);
}

/// Test: the object-index check needs the cell; without the cell check it
/// reports a fault.
#[test]
fn test_object_index_without_cell_is_fault() {
    let dir = tempfile::tempdir().unwrap();
    let host = MockHost::new();
    host.add_player(player(1, "alice", 0.0, 0.0, 0.0));
    let source = document("KICK", 16.0).replace(
        "[security_checks.remove_item_from_square.invalid_square]\n",
        "[security_checks.remove_item_from_square.invalid_square]\nmode = \"OFF\"\n",
    );
    let checker = checker_from(&host, dir.path(), &source);
    let session = MockSession::player("alice");

    let result = checker.check_remove_item_from_square(&session, &square(4, 5, 6, 0));
    assert!(matches!(
        result,
        Err(SecurityError::UnknownCell { x: 4, y: 5, z: 6 })
    ));
}

/// Test: sledgehammer destruction obeys the server switch, then the
/// weapon in hand.
#[test]
fn test_sledgehammer() {
    let dir = tempfile::tempdir().unwrap();
    let host = MockHost::new();
    host.add_player(player(1, "alice", 0.0, 0.0, 0.0));
    let source = with_template(
        &document("IGNORE", 16.0),
        "sledgehammer_destroy.weapon",
        "%weapon% on %object_index%",
    );
    let checker = checker_from(&host, dir.path(), &source);
    let session = MockSession::player("alice");

    host.options.lock().allow_sledgehammer_destruction = false;
    assert!(!checker.check_sledgehammer_destroy(&session, &square(0, 0, 0, 3)).unwrap());
    host.options.lock().allow_sledgehammer_destruction = true;

    assert!(!checker.check_sledgehammer_destroy(&session, &square(0, 0, 0, 3)).unwrap());

    host.players.lock().get_mut(&1).unwrap().primary_hand_item = Some("Base.Axe".to_owned());
    assert!(!checker.check_sledgehammer_destroy(&session, &square(0, 0, 0, 3)).unwrap());

    host.players.lock().get_mut(&1).unwrap().primary_hand_item =
        Some("Base.Sledgehammer2".to_owned());
    assert!(checker.check_sledgehammer_destroy(&session, &square(0, 0, 0, 3)).unwrap());

    assert_eq!(
        host.staff_lines(),
        vec![
            "sledgehammer_destroy.disabled IGNORING alice".to_owned(),
            "bare hands on 3".to_owned(),
            "Base.Axe on 3".to_owned(),
        ]
    );
}

// ---------------------------------------------------------------------------
// Fire
// ---------------------------------------------------------------------------

/// Test: fire is checked against the server switch, the cell, then reach.
#[test]
fn test_start_fire_chain() {
    let dir = tempfile::tempdir().unwrap();
    let host = MockHost::new();
    host.add_player(player(1, "alice", 0.0, 0.0, 0.0));
    *host.fire.lock() = Some(FireStart {
        valid: true,
        position: Vec3::new(10.0, 0.0, 0.0),
        energy: 100,
        life: 5,
        smoke: false,
    });
    let checker = checker(&host, dir.path(), "IGNORE", 16.0);
    let session = MockSession::player("alice");
    let buffer = MessageBuffer::new(vec![0; 4]);

    host.options.lock().no_fire = true;
    assert!(!checker.check_start_fire(&session, &buffer).unwrap());
    host.options.lock().no_fire = false;

    assert!(!checker.check_start_fire(&session, &buffer).unwrap());

    host.add_cell(10, 0, 0, 0);
    assert!(checker.check_start_fire(&session, &buffer).unwrap());

    host.fire.lock().as_mut().unwrap().position = Vec3::new(10.0, 20.0, 0.0);
    host.add_cell(10, 20, 0, 0);
    assert!(!checker.check_start_fire(&session, &buffer).unwrap());

    assert_eq!(
        host.staff_lines(),
        vec![
            "start_fire.disabled IGNORING alice".to_owned(),
            "start_fire.grid_square IGNORING alice".to_owned(),
            "start_fire.distance IGNORING alice".to_owned(),
        ]
    );
}

// ---------------------------------------------------------------------------
// Privileges
// ---------------------------------------------------------------------------

/// Test: database reads need admin; moderators get no bypass.
#[test]
fn test_database_reads_need_admin() {
    let dir = tempfile::tempdir().unwrap();
    let host = MockHost::new();
    let checker = checker(&host, dir.path(), "IGNORE", 16.0);
    let empty = MessageBuffer::new(Vec::new());

    let moderator = MockSession::new("mod", AccessLevel::MODERATOR);
    assert!(!checker.check_get_db_schema(&moderator, &empty).unwrap());
    assert!(!checker.check_get_table_result(&moderator, &empty).unwrap());

    let admin = MockSession::new("root", AccessLevel::ADMIN);
    assert!(checker.check_get_db_schema(&admin, &empty).unwrap());
    assert!(checker.check_get_table_result(&admin, &empty).unwrap());
}

/// Test: a rejected query is logged with its arguments bound.
#[test]
fn test_execute_query_logs_bound_query() {
    let dir = tempfile::tempdir().unwrap();
    let host = MockHost::new();
    let source = with_template(&document("IGNORE", 16.0), "database.modify_not_admin", "%query%");
    let checker = checker_from(&host, dir.path(), &source);
    let session = MockSession::player("alice");

    let mut writer = MessageWriter::new();
    writer.put_string("UPDATE whitelist SET admin = ? WHERE name = ?").unwrap();
    let buffer = writer.finish();

    *host.query_args.lock() = Some(vec![FieldValue::Bool(true), FieldValue::Text("alice".into())]);
    assert!(!checker.check_execute_query(&session, &buffer).unwrap());

    *host.query_args.lock() = None;
    assert!(!checker.check_execute_query(&session, &buffer).unwrap());

    assert_eq!(
        host.staff_lines(),
        vec![
            "UPDATE whitelist SET admin = true WHERE name = 'alice'".to_owned(),
            "UPDATE whitelist SET admin = ? WHERE name = ? (Invalid Args)".to_owned(),
        ]
    );
}

/// Test: teleporting needs staff; the log names the requested target.
#[test]
fn test_teleport_needs_staff() {
    let dir = tempfile::tempdir().unwrap();
    let host = MockHost::new();
    let source = with_template(
        &document("KICK", 16.0),
        "teleport.not_staff",
        "%target_username% to %x%,%y%,%z%",
    );
    let checker = checker_from(&host, dir.path(), &source);
    let buffer = encode(&TeleportRequest {
        target_username: "bob".to_owned(),
        x: 1.5,
        y: 2.0,
        z: 0.0,
    });

    let gm = MockSession::new("gm", AccessLevel::GM);
    assert!(checker.check_teleport(&gm, &buffer).unwrap());

    let session = MockSession::player("alice");
    assert!(!checker.check_teleport(&session, &buffer).unwrap());
    assert_eq!(host.staff_lines(), vec!["bob to 1.5,2.0,0.0".to_owned()]);
    assert_eq!(session.disconnect_count(), 1);
}

/// Test: staff-only inventory access names the online target.
#[test]
fn test_request_inventory_not_staff() {
    let dir = tempfile::tempdir().unwrap();
    let host = MockHost::new();
    host.add_player(player(2, "bob", 0.0, 0.0, 0.0));
    let source = with_template(
        &document("IGNORE", 16.0),
        "request_inventory.not_staff",
        "%player_username% -> %target_username%",
    );
    let checker = checker_from(&host, dir.path(), &source);
    let session = MockSession::player("alice");

    assert!(!checker.check_request_inventory(&session, &encode(&TargetRef { target: 2 })).unwrap());
    assert_eq!(host.staff_lines(), vec!["alice -> bob".to_owned()]);
}

/// Test: claimed powers must not exceed what the server granted.
#[test]
fn test_extra_info_powers() {
    let dir = tempfile::tempdir().unwrap();
    let host = MockHost::new();
    let mut bob = player(2, "bob", 0.0, 0.0, 0.0);
    bob.powers.invisible = true;
    host.add_player(bob);
    let source = with_template(
        &document("IGNORE", 16.0),
        "extra_info.check_vars",
        "%target_username% god %packet_is_god_mod_enabled%/%player_is_god_mod_enabled% invisible %packet_is_invisible_enabled%/%player_is_invisible_enabled%",
    );
    let checker = checker_from(&host, dir.path(), &source);
    let session = MockSession::player("alice");

    let honest = ExtraInfoRequest {
        player: 2,
        powers: AdminPowers {
            invisible: true,
            ..AdminPowers::default()
        },
    };
    assert!(checker.check_extra_info(&session, &encode(&honest)).unwrap());

    let forged = ExtraInfoRequest {
        player: 2,
        powers: AdminPowers {
            god_mode: true,
            invisible: true,
            ..AdminPowers::default()
        },
    };
    assert!(!checker.check_extra_info(&session, &encode(&forged)).unwrap());
    assert_eq!(
        host.staff_lines(),
        vec!["bob god true/false invisible true/true".to_owned()]
    );
}

// ---------------------------------------------------------------------------
// Identity and combat
// ---------------------------------------------------------------------------

/// Test: chat authorship compares usernames without case.
#[test]
fn test_chat_author_must_be_sender() {
    let dir = tempfile::tempdir().unwrap();
    let host = MockHost::new();
    let checker = checker(&host, dir.path(), "KICK", 16.0);
    let session = MockSession::player("alice");

    let own = encode(&ChatEnvelope {
        chat_id: 1,
        author: "ALICE".to_owned(),
    });
    assert!(checker.check_chat_message_from_player(&session, &own).unwrap());

    let forged = encode(&ChatEnvelope {
        chat_id: 1,
        author: "bob".to_owned(),
    });
    assert!(!checker.check_chat_message_from_player(&session, &forged).unwrap());
    assert_eq!(session.disconnect_count(), 1);
}

/// Test: players may only report their own death.
#[test]
fn test_player_death_self() {
    let dir = tempfile::tempdir().unwrap();
    let host = MockHost::new();
    host.add_player(player(1, "alice", 0.0, 0.0, 0.0));
    host.add_player(player(2, "bob", 0.0, 0.0, 0.0));
    let checker = checker(&host, dir.path(), "IGNORE", 16.0);
    let session = MockSession::player("alice");
    let buffer = MessageBuffer::new(vec![0; 2]);

    *host.death.lock() = Some(DeathReport { player: Some(1) });
    assert!(checker.check_player_death(&session, &buffer).unwrap());

    *host.death.lock() = Some(DeathReport { player: Some(2) });
    assert!(!checker.check_player_death(&session, &buffer).unwrap());

    *host.death.lock() = Some(DeathReport { player: None });
    assert!(!checker.check_player_death(&session, &buffer).unwrap());

    assert_eq!(
        host.staff_lines(),
        vec![
            "player_death.self IGNORING alice".to_owned(),
            "player_death.offline_player IGNORING alice".to_owned(),
        ]
    );
}

/// Test: player-on-player hits are dropped while PvP is off.
#[test]
fn test_hit_character_pvp() {
    let dir = tempfile::tempdir().unwrap();
    let host = MockHost::new();
    let checker = checker(&host, dir.path(), "KICK", 16.0);
    let session = MockSession::player("alice");
    let player_hit = MessageBuffer::new(vec![4]);
    let zombie_hit = MessageBuffer::new(vec![2]);

    assert!(checker.check_hit_character(&session, &player_hit).unwrap());

    host.options.lock().pvp = false;
    assert!(checker.check_hit_character(&session, &zombie_hit).unwrap());
    assert!(!checker.check_hit_character(&session, &player_hit).unwrap());

    let admin = MockSession::new("root", AccessLevel::ADMIN);
    assert!(checker.check_hit_character(&admin, &player_hit).unwrap());
}

// ---------------------------------------------------------------------------
// Modes
// ---------------------------------------------------------------------------

/// Test: with every check OFF nothing is read, even garbage passes.
#[test]
fn test_all_off_passes_everything() {
    let dir = tempfile::tempdir().unwrap();
    let host = MockHost::new();
    let checker = checker(&host, dir.path(), "OFF", 16.0);
    let session = MockSession::player("alice");
    let garbage = MessageBuffer::new(vec![0xff]);

    assert_eq!(checker.catalog().unwrap().active_count(), 0);
    assert!(checker.check_bandage(&session, &garbage).unwrap());
    assert!(checker.check_start_fire(&session, &garbage).unwrap());
    assert!(checker.check_execute_query(&session, &garbage).unwrap());
    assert!(host.staff_lines().is_empty());
}

/// Test: a malformed message under an active check is a fault.
#[test]
fn test_malformed_message_is_fault() {
    let dir = tempfile::tempdir().unwrap();
    let host = MockHost::new();
    let checker = checker(&host, dir.path(), "KICK", 16.0);
    let session = MockSession::player("alice");

    let result = checker.check_player_damage(&session, &MessageBuffer::new(vec![0]));
    assert!(matches!(result, Err(SecurityError::Protocol(_))));
    assert_eq!(session.disconnect_count(), 0);
}

/// Test: an unrecognized mode string falls back to IGNORE.
#[test]
fn test_unknown_mode_means_ignore() {
    let dir = tempfile::tempdir().unwrap();
    let host = MockHost::new();
    let source = document("KICK", 16.0).replace(
        "[security_checks.sandbox_options.not_staff]\n",
        "[security_checks.sandbox_options.not_staff]\nmode = \"BAN\"\n",
    );
    let checker = checker_from(&host, dir.path(), &source);
    let session = MockSession::player("alice");

    assert!(!checker.check_sandbox_options(&session, &MessageBuffer::new(Vec::new())).unwrap());
    assert_eq!(session.disconnect_count(), 0);
    assert_eq!(
        host.staff_lines(),
        vec!["sandbox_options.not_staff IGNORING alice".to_owned()]
    );
}

/// Test: a message encoded with trailing bytes still reads only its own
/// layout.
#[test]
fn test_trailing_bytes_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let host = MockHost::new();
    host.add_player(player(1, "alice", 0.0, 0.0, 0.0));
    host.add_player(player(2, "bob", 3.0, 0.0, 0.0));
    let checker = checker(&host, dir.path(), "KICK", 16.0);
    let session = MockSession::player("alice");

    let mut writer = MessageWriter::new();
    DamageRequest {
        target: 2,
        damage: 12.5,
    }
    .encode(&mut writer)
    .unwrap();
    writer.put_i32(12345);
    assert!(checker.check_player_damage(&session, &writer.finish()).unwrap());
    assert_eq!(session.disconnect_count(), 0);
}
