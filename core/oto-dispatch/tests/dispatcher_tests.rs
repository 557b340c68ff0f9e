mod common;

use chrono::Duration;
use common::{
    fixed_now, harness, harness_with, only_text, scripted_harness, FlakyStore, ADMIN, USER,
};
use oto_dispatch::{DispatchConfig, Inbound, Outbound, PendingInteraction};
use oto_license::{
    device_digest, verify_master_code, CredentialKind, DateComponent, MasterCode, SharedSecret,
    UseType,
};
use oto_registry::CredentialRegistry;
use oto_types::{ActorId, ScriptedRandom};
use pretty_assertions::assert_eq;
use std::sync::Arc;

const MASTER_TOKENS: &[&str] = &[
    "create_master",
    "master_unlimited",
    "master_30",
    "master_90",
    "master_180",
    "master_365",
    "master_custom",
    "unlimited_single",
    "unlimited_multi",
    "days_30_single",
    "days_90_multi",
    "days_1234_single",
    "admin",
];

// ── Main menu ────────────────────────────────────────────────────

#[test]
fn start_shows_main_menu_with_admin_entry_for_admins() {
    let h = harness();
    let admin = h.command(ADMIN, "/start");
    let user = h.command(USER, "start");

    assert_eq!(
        admin[0].tokens(),
        vec!["create_master", "get_normal", "my_licenses", "help", "admin"]
    );
    assert_eq!(
        user[0].tokens(),
        vec!["create_master", "get_normal", "my_licenses", "help"]
    );
    assert!(user[0].text().contains("Hello tester!"));
}

#[test]
fn start_registers_actor_and_refreshes_name() {
    let h = harness();
    h.send(oto_dispatch::Inbound::command(USER, "old", "/start"));
    h.clock.advance(Duration::hours(1));
    h.send(oto_dispatch::Inbound::command(USER, "new", "/start"));

    let actor = h.registry().actor(USER).unwrap();
    assert_eq!(actor.display_name, "new");
    assert_eq!(actor.first_seen, fixed_now());
    assert_eq!(h.registry().stats().total_users, 1);
}

#[test]
fn back_to_main_shows_main_menu() {
    let h = harness();
    let replies = h.select(USER, "back_to_main");
    assert!(matches!(replies[0], Outbound::Menu { .. }));
    assert!(replies[0].tokens().contains(&"get_normal"));
}

#[test]
fn help_via_command_and_selection() {
    let h = harness();
    let by_command = h.command(USER, "/help");
    let by_selection = h.select(USER, "help");
    assert_eq!(by_command, by_selection);
    assert!(only_text(&by_command).contains("Normal license"));
}

#[test]
fn unknown_command_gets_hint() {
    let h = harness();
    let replies = h.command(USER, "/frobnicate");
    assert!(only_text(&replies).contains("Unknown command /frobnicate"));
}

#[test]
fn idle_free_text_gets_hint() {
    let h = harness();
    let replies = h.text(USER, "hello?");
    let text = only_text(&replies);
    assert!(text.contains("/start"));
    assert!(text.contains("/help"));
    assert!(h.registry().is_empty());
}

// ── Role gating ──────────────────────────────────────────────────

#[test]
fn non_admin_rejected_at_every_master_step() {
    let h = harness();
    h.select(USER, "get_normal");

    for token in MASTER_TOKENS {
        let replies = h.select(USER, token);
        let text = only_text(&replies);
        assert!(text.contains("admins"), "{token}: {text}");
        assert_eq!(
            h.dispatcher.pending(USER),
            Some(PendingInteraction::AwaitingDeviceAndDuration),
            "{token} changed pending state"
        );
    }
    for command in ["/master", "/stats"] {
        let replies = h.send(Inbound::command(USER, "renamed", command));
        assert!(only_text(&replies).contains("admins"));
    }
    assert!(h.registry().is_empty());
    assert_eq!(h.registry().stats().total_users, 1);
    assert_eq!(h.registry().actor(USER).unwrap().display_name, "");
}

#[test]
fn rejected_first_contact_registers_nobody() {
    let h = harness();
    let stranger = ActorId::new(3003);

    assert!(only_text(&h.select(USER, "create_master")).contains("Only admins"));
    assert!(only_text(&h.command(stranger, "/master")).contains("Only admins"));
    assert!(only_text(&h.command(stranger, "/stats")).contains("admins only"));

    assert_eq!(h.registry().stats().total_users, 0);
    assert!(h.registry().actor(USER).is_none());
    assert!(h.registry().actor(stranger).is_none());
}

#[test]
fn rejections_never_touch_the_store() {
    let store = Arc::new(FlakyStore::default());
    let registry = Arc::new(CredentialRegistry::open(store.clone()).unwrap());
    let h = harness_with(registry, Arc::new(oto_types::ThreadRandom), DispatchConfig::default());
    store.set_failing(true);

    // A save attempt would surface as a storage error instead.
    for token in MASTER_TOKENS {
        assert!(only_text(&h.select(USER, token)).contains("admins"), "{token}");
    }
    assert!(only_text(&h.command(USER, "/master")).contains("Only admins"));
    assert_eq!(h.registry().stats().total_users, 0);
}

#[test]
fn rejection_messages_name_the_feature() {
    let h = harness();
    assert!(only_text(&h.select(USER, "create_master")).contains("/normal"));
    assert_eq!(
        only_text(&h.select(USER, "admin")),
        "This feature is for admins only."
    );
}

#[test]
fn admin_master_duration_menu() {
    let h = harness();
    let replies = h.command(ADMIN, "/master");
    assert_eq!(
        replies[0].tokens(),
        vec![
            "master_unlimited",
            "master_30",
            "master_90",
            "master_180",
            "master_365",
            "master_custom",
            "back_to_main"
        ]
    );
}

#[test]
fn duration_selection_offers_use_types() {
    let h = harness();
    assert_eq!(
        h.select(ADMIN, "master_90")[0].tokens(),
        vec!["days_90_single", "days_90_multi", "create_master"]
    );
    assert_eq!(
        h.select(ADMIN, "master_unlimited")[0].tokens(),
        vec!["unlimited_single", "unlimited_multi", "create_master"]
    );
    assert!(h.registry().is_empty());
}

// ── Master issuance ──────────────────────────────────────────────

#[test]
fn end_to_end_master_30_days_single_use() {
    let h = harness();
    h.command(ADMIN, "/start");
    h.select(ADMIN, "create_master");
    h.select(ADMIN, "master_30");
    let replies = h.select(ADMIN, "days_30_single");

    let issued = h.registry().list_by_owner(ADMIN);
    assert_eq!(issued.len(), 1);
    let credential = &issued[0];
    assert_eq!(credential.kind(), CredentialKind::Master);
    assert!(credential.is_single_use());
    assert_eq!(credential.expires_at(), Some(fixed_now() + Duration::days(30)));

    let code = MasterCode::parse(credential.code()).unwrap();
    assert!(credential.code().starts_with("MASTER-20261118-5D6A9CC4-SINGLE-"));
    assert_eq!(code.use_type(), UseType::Single);
    assert_eq!(
        code.date(),
        DateComponent::from_expiry(Some(fixed_now() + Duration::days(30)))
    );
    verify_master_code(credential.code(), &SharedSecret::default(), fixed_now()).unwrap();

    let text = only_text(&replies);
    assert!(text.contains(credential.code()));
    assert!(text.contains("single-use"));
    assert!(text.contains("Duration: 30 days (expires 18.11.2026)"));
}

#[test]
fn unlimited_multi_use_master() {
    let h = harness();
    let replies = h.select(ADMIN, "unlimited_multi");

    let credential = &h.registry().list_by_owner(ADMIN)[0];
    assert!(credential.code().starts_with("MASTER-UNLIMITED-14733438-MULTI-"));
    assert_eq!(credential.expires_at(), None);
    assert!(!credential.is_single_use());
    assert!(only_text(&replies).contains("Duration: unlimited"));
}

#[test]
fn collision_is_retried_with_fresh_code() {
    let h = scripted_harness(
        &["SAMECODE", "SAMECODE", "FRESH001"],
        DispatchConfig::default(),
    );
    h.select(ADMIN, "unlimited_multi");
    let replies = h.select(ADMIN, "unlimited_multi");

    let codes: Vec<String> = h
        .registry()
        .list_by_owner(ADMIN)
        .iter()
        .map(|c| c.code().to_string())
        .collect();
    assert_eq!(codes.len(), 2);
    assert!(codes[0].ends_with("-SAMECODE"));
    assert!(codes[1].ends_with("-FRESH001"));
    assert!(only_text(&replies).contains("FRESH001"));
}

#[test]
fn exhausted_retries_are_reported() {
    let config = DispatchConfig {
        max_issue_attempts: 3,
        ..DispatchConfig::default()
    };
    // An empty script yields the same filler segment every time.
    let h = scripted_harness(&[], config);
    h.select(ADMIN, "unlimited_single");
    let replies = h.select(ADMIN, "unlimited_single");

    assert!(only_text(&replies).contains("Could not create a license"));
    assert_eq!(h.registry().len(), 1);
}

#[test]
fn out_of_range_day_tokens_are_validation_errors() {
    let h = harness();
    h.select(ADMIN, "master_custom");

    for token in ["days_0_single", "days_3651_multi", "days_x_single", "master_0", "bogus"] {
        let replies = h.select(ADMIN, token);
        assert!(only_text(&replies).starts_with("Invalid request"), "{token}");
        assert_eq!(
            h.dispatcher.pending(ADMIN),
            Some(PendingInteraction::AwaitingCustomDuration)
        );
    }
    assert!(h.registry().is_empty());
}

// ── Custom duration ──────────────────────────────────────────────

#[test]
fn custom_duration_rejects_out_of_range_input() {
    let h = harness();
    let prompt = h.select(ADMIN, "master_custom");
    assert!(only_text(&prompt).contains("How many days"));

    for input in ["0", "4000", "abc", "-5", ""] {
        let replies = h.text(ADMIN, input);
        assert!(only_text(&replies).contains("between 1 and 3650"), "{input:?}");
        assert_eq!(
            h.dispatcher.pending(ADMIN),
            Some(PendingInteraction::AwaitingCustomDuration)
        );
    }
    assert!(h.registry().is_empty());
}

#[test]
fn custom_duration_offers_matching_use_types() {
    let h = harness();
    h.select(ADMIN, "master_custom");
    let replies = h.text(ADMIN, " 90 ");

    assert_eq!(h.dispatcher.pending(ADMIN), None);
    assert_eq!(replies[0].tokens(), vec!["days_90_single", "days_90_multi"]);
    assert!(replies[0].text().contains("90 days"));
    assert!(h.registry().is_empty());

    h.select(ADMIN, "days_90_multi");
    let credential = &h.registry().list_by_owner(ADMIN)[0];
    assert_eq!(credential.expires_at(), Some(fixed_now() + Duration::days(90)));
}

// ── Normal issuance ──────────────────────────────────────────────

#[test]
fn end_to_end_normal() {
    let h = harness();
    h.command(USER, "/normal");
    assert_eq!(
        h.dispatcher.pending(USER),
        Some(PendingInteraction::AwaitingDeviceAndDuration)
    );
    let replies = h.text(USER, "device-42\n10");

    let issued = h.registry().list_by_owner(USER);
    assert_eq!(issued.len(), 1);
    let credential = &issued[0];
    assert_eq!(credential.kind(), CredentialKind::Normal);
    assert_eq!(credential.device_id(), Some("device-42"));
    assert_eq!(credential.expires_at(), Some(fixed_now() + Duration::days(10)));
    assert!(credential.code().starts_with(&format!("{}-", device_digest("device-42"))));
    assert!(credential.code().starts_with("A7D3D8DD-"));
    assert_eq!(h.dispatcher.pending(USER), None);

    let text = only_text(&replies);
    assert!(text.contains(credential.code()));
    assert!(text.contains("Device: device-42"));
    assert!(text.contains("Duration: 10 days (expires 29.10.2026)"));
}

#[test]
fn normal_input_tolerates_windows_line_endings() {
    let h = harness();
    h.select(USER, "get_normal");
    h.text(USER, "  abc123def456 \r\n 30 \r\n");

    let credential = &h.registry().list_by_owner(USER)[0];
    assert_eq!(credential.device_id(), Some("abc123def456"));
    assert!(credential.code().starts_with("30CB7327-"));
}

#[test]
fn malformed_normal_input_reprompts() {
    let h = harness();
    h.select(USER, "get_normal");

    for input in ["device-42", "\n10", "device-42\n0", "device-42\n366", "device-42\nten"] {
        let replies = h.text(USER, input);
        assert_eq!(replies.len(), 1, "{input:?}");
        assert_eq!(
            h.dispatcher.pending(USER),
            Some(PendingInteraction::AwaitingDeviceAndDuration),
            "{input:?}"
        );
    }
    assert!(h.registry().is_empty());
    assert!(only_text(&h.text(USER, "device-42")).starts_with("Missing information"));
    assert!(only_text(&h.text(USER, "device-42\n400")).contains("between 1 and 365"));
}

#[test]
fn normal_creation_open_to_admins_too() {
    let h = harness();
    h.select(ADMIN, "get_normal");
    h.text(ADMIN, "tablet\n365");
    assert_eq!(h.registry().list_by_owner(ADMIN).len(), 1);
}

// ── Pending state ────────────────────────────────────────────────

#[test]
fn last_selection_wins() {
    let h = harness();
    h.select(ADMIN, "master_custom");
    h.select(ADMIN, "get_normal");
    assert_eq!(
        h.dispatcher.pending(ADMIN),
        Some(PendingInteraction::AwaitingDeviceAndDuration)
    );

    // "90" is now read as device input, not a duration.
    let replies = h.text(ADMIN, "90");
    assert!(only_text(&replies).starts_with("Missing information"));

    h.command(ADMIN, "/start");
    assert_eq!(h.dispatcher.pending(ADMIN), None);
    assert!(only_text(&h.text(ADMIN, "90")).contains("/start"));
}

#[test]
fn pending_state_is_per_actor() {
    let h = harness();
    h.select(USER, "get_normal");
    assert_eq!(h.dispatcher.pending(ActorId::new(3)), None);
    assert!(only_text(&h.text(ActorId::new(3), "device\n10")).contains("/start"));
    assert!(h.registry().is_empty());
}

// ── Listing and stats ────────────────────────────────────────────

#[test]
fn listing_shows_only_own_credentials() {
    let h = harness();
    h.select(ADMIN, "days_30_single");
    h.select(USER, "get_normal");
    h.text(USER, "device-42\n10");

    let admin_code = h.registry().list_by_owner(ADMIN)[0].code().to_string();
    let user_code = h.registry().list_by_owner(USER)[0].code().to_string();

    let replies = h.command(USER, "/licenses");
    let text = only_text(&replies);
    assert!(text.contains(&user_code));
    assert!(!text.contains(&admin_code));
    assert!(text.contains("[valid]"));
    assert!(text.contains("NORMAL"));
    assert!(text.contains("Created 19.10.2026"));
}

#[test]
fn listing_marks_expired_and_consumed() {
    let h = harness();
    h.select(ADMIN, "days_1_single");
    h.select(ADMIN, "unlimited_single");
    let codes: Vec<String> = h
        .registry()
        .list_by_owner(ADMIN)
        .iter()
        .map(|c| c.code().to_string())
        .collect();
    h.registry().mark_consumed(&codes[1]).unwrap();
    h.clock.advance(Duration::days(2));

    let replies = h.select(ADMIN, "my_licenses");
    let text = only_text(&replies);
    assert!(text.contains(&format!("[invalid] {}", codes[0])));
    assert!(text.contains(&format!("[invalid] {}", codes[1])));
    assert!(text.contains("not used yet"));
    assert!(text.contains("\nused\n"));
}

#[test]
fn empty_listing() {
    let h = harness();
    assert_eq!(
        only_text(&h.select(USER, "my_licenses")),
        "You have no licenses yet."
    );
}

#[test]
fn admin_panel_shows_counts_without_codes() {
    let h = harness();
    h.command(USER, "/start");
    h.select(ADMIN, "unlimited_single");
    h.select(USER, "get_normal");
    h.text(USER, "device-42\n10");

    let replies = h.command(ADMIN, "/stats");
    let text = only_text(&replies);
    assert!(text.contains("Users: 2"));
    assert!(text.contains("Licenses: 2"));
    assert!(text.contains("- Master: 1"));
    assert!(text.contains("- Normal: 1"));
    for credential in h.registry().list_by_owner(USER) {
        assert!(!text.contains(credential.code()));
    }
    assert_eq!(h.select(ADMIN, "admin"), replies);
}

// ── Storage failures ─────────────────────────────────────────────

#[test]
fn failed_save_is_rendered_and_nothing_is_issued() {
    let store = Arc::new(FlakyStore::default());
    let registry = Arc::new(CredentialRegistry::open(store.clone()).unwrap());
    let h = harness_with(
        registry,
        Arc::new(ScriptedRandom::new(["LOSTCODE"])),
        DispatchConfig::default(),
    );
    h.command(ADMIN, "/start");
    store.set_failing(true);

    let replies = h.select(ADMIN, "unlimited_single");
    assert!(only_text(&replies).contains("storage error: disk full"));
    assert!(h.registry().is_empty());
}

#[test]
fn failed_normal_save_keeps_device_prompt() {
    let store = Arc::new(FlakyStore::default());
    let registry = Arc::new(CredentialRegistry::open(store.clone()).unwrap());
    let h = harness_with(
        registry,
        Arc::new(oto_types::ThreadRandom),
        DispatchConfig::default(),
    );
    h.select(USER, "get_normal");
    store.set_failing(true);

    h.text(USER, "device-42\n10");
    assert!(h.registry().is_empty());
    assert_eq!(
        h.dispatcher.pending(USER),
        Some(PendingInteraction::AwaitingDeviceAndDuration)
    );

    store.set_failing(false);
    h.text(USER, "device-42\n10");
    assert_eq!(h.registry().len(), 1);
    assert_eq!(h.dispatcher.pending(USER), None);
}
