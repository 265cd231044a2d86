use menu_core::{
    AdminCredential, AdminGate, AuthError, LocalCache, MemoryRemote, MemorySlots, MenuSession,
    MenuTree, Reconciled, RemoteSyncChannel, Tag,
};
use menu_core::defaults::builtin_menu;
use menu_proto::RecordKey;
use std::sync::Arc;

const PASSWORD: &str = "atiab-test";

fn key() -> RecordKey {
    RecordKey::parse("atyab_menu_data_v11").unwrap()
}

fn new_session(remote: &MemoryRemote, slots: Arc<MemorySlots>) -> MenuSession {
    MenuSession::new(
        Arc::new(remote.clone()),
        LocalCache::new(slots, key()),
        AdminGate::new(AdminCredential::from_setting(Some(PASSWORD))),
        builtin_menu(),
    )
}

fn login(session: &mut MenuSession) {
    let mut input = PASSWORD.to_string();
    session.attempt_login(&mut input).unwrap();
    assert!(input.is_empty());
}

/// Opens a session and drains the initial delivery, including the echo of its own
/// seed write when the remote started empty.
async fn open_and_settle(session: &mut MenuSession) -> Reconciled {
    session.open().await.unwrap();
    let first = session.next_update().await.unwrap();
    if first == Reconciled::Seeded {
        let echo = session.next_update().await.unwrap();
        assert!(matches!(echo, Reconciled::Replaced { .. }));
    }
    first
}

#[tokio::test]
async fn spicy_toggle_survives_into_a_fresh_session() {
    let remote = MemoryRemote::new();
    let mut admin = new_session(&remote, Arc::new(MemorySlots::new()));
    open_and_settle(&mut admin).await;

    login(&mut admin);
    let was_spicy = admin.tree().section("grills").unwrap().items[2].is_spicy();
    admin.toggle_tag("grills", 2, Tag::Spicy).unwrap();
    admin.save().await.unwrap();
    assert!(!admin.is_admin());

    let mut fresh = new_session(&remote, Arc::new(MemorySlots::new()));
    let first = open_and_settle(&mut fresh).await;
    assert!(matches!(first, Reconciled::Replaced { .. }));
    assert_eq!(
        fresh.tree().section("grills").unwrap().items[2].is_spicy(),
        !was_spicy
    );
}

#[tokio::test]
async fn three_wrong_passwords_leave_everything_untouched() {
    let remote = MemoryRemote::new();
    let mut session = new_session(&remote, Arc::new(MemorySlots::new()));
    open_and_settle(&mut session).await;
    let before = session.tree().clone();
    let writes = remote.write_count();

    for attempt in ["", "ATIAB-TEST", "atiab-test "] {
        let mut input = attempt.to_string();
        assert_eq!(
            session.attempt_login(&mut input),
            Err(AuthError::InvalidCredential)
        );
        assert_eq!(input, attempt);
    }

    assert!(!session.is_admin());
    assert!(session.delete_item("drinks", 0).is_err());
    assert_eq!(session.tree(), &before);
    assert_eq!(remote.write_count(), writes);
}

#[tokio::test]
async fn last_save_wins_over_another_admins_unsaved_edits() {
    let remote = MemoryRemote::new();
    let mut a = new_session(&remote, Arc::new(MemorySlots::new()));
    let mut b = new_session(&remote, Arc::new(MemorySlots::new()));
    open_and_settle(&mut a).await;
    open_and_settle(&mut b).await;

    login(&mut a);
    login(&mut b);
    b.update_price("sweets", 0, 1, "999").unwrap();
    b.toggle_tag("feteer", 1, Tag::Popular).unwrap();
    assert!(b.has_unsaved_edits());

    let drinks_before = a.tree().section("drinks").unwrap().items.clone();
    a.delete_item("drinks", 0).unwrap();
    a.save().await.unwrap();
    let saved = a.tree().clone();

    // A's own echo, then B receives the same tree.
    assert!(matches!(a.next_update().await, Some(Reconciled::Replaced { .. })));
    let r = b.next_update().await.unwrap();
    assert_eq!(
        r,
        Reconciled::Replaced {
            sections: saved.len(),
            discarded_edits: true
        }
    );

    assert_eq!(b.tree(), &saved);
    assert_eq!(a.tree(), &saved);
    assert_eq!(
        saved.section("drinks").unwrap().items[..],
        drinks_before[1..]
    );
    assert!(b.is_admin());
    assert!(!b.has_unsaved_edits());
}

#[tokio::test]
async fn remote_push_is_written_through_to_the_cache() {
    let remote = MemoryRemote::new();
    let slots = Arc::new(MemorySlots::new());
    let mut session = new_session(&remote, slots.clone());
    open_and_settle(&mut session).await;

    let pushed = menu_core::ops::delete_item(&builtin_menu(), "grills", 3).unwrap();
    remote.write(&pushed).await.unwrap();
    session.next_update().await.unwrap();

    let cache = LocalCache::new(slots, key());
    assert_eq!(cache.load().unwrap(), pushed);
    assert_eq!(session.tree(), &pushed);
}

#[tokio::test]
async fn cached_tree_is_shown_before_the_remote_answers() {
    let remote = MemoryRemote::new();
    let slots = Arc::new(MemorySlots::new());
    let cached = menu_core::ops::delete_item(&builtin_menu(), "sweets", 2).unwrap();
    LocalCache::new(slots.clone(), key()).store(&cached);

    let session = new_session(&remote, slots);
    assert_eq!(session.tree(), &cached);
}

#[tokio::test]
async fn absent_remote_is_seeded_exactly_once() {
    let remote = MemoryRemote::new();
    let mut session = new_session(&remote, Arc::new(MemorySlots::new()));

    assert_eq!(open_and_settle(&mut session).await, Reconciled::Seeded);
    assert_eq!(remote.write_count(), 1);
    assert_eq!(remote.current_tree().unwrap(), builtin_menu());

    // Someone clears the record: this session does not seed again.
    remote.put_raw(None);
    assert_eq!(session.next_update().await, Some(Reconciled::SeedSkipped));
    assert_eq!(remote.write_count(), 1);

    // A second session seeing the populated remote does not seed at all.
    remote.write(&builtin_menu()).await.unwrap();
    let mut other = new_session(&remote, Arc::new(MemorySlots::new()));
    assert!(matches!(
        open_and_settle(&mut other).await,
        Reconciled::Replaced { .. }
    ));
    assert_eq!(remote.write_count(), 2);
}

#[tokio::test]
async fn malformed_remote_value_keeps_last_known_good() {
    let remote = MemoryRemote::new();
    let mut session = new_session(&remote, Arc::new(MemorySlots::new()));
    open_and_settle(&mut session).await;
    let good = session.tree().clone();

    remote.put_raw(Some(bytes::Bytes::from_static(b"{\"oops\": true}")));
    assert!(matches!(
        session.next_update().await,
        Some(Reconciled::Rejected(_))
    ));
    assert_eq!(session.tree(), &good);
}

#[tokio::test]
async fn failed_save_against_offline_remote_keeps_admin_open() {
    let remote = MemoryRemote::new();
    let mut session = new_session(&remote, Arc::new(MemorySlots::new()));
    open_and_settle(&mut session).await;
    login(&mut session);
    session.update_price("drinks", 1, 0, "25").unwrap();

    remote.set_offline(true);
    let err = session.save().await.unwrap_err();
    assert!(err.to_string().contains("offline"));
    assert!(session.is_admin());
    assert!(session.has_unsaved_edits());

    remote.set_offline(false);
    session.save().await.unwrap();
    let stored: MenuTree = remote.current_tree().unwrap();
    assert_eq!(stored.section("drinks").unwrap().items[1].prices[0], "25");
}

#[tokio::test]
async fn closed_session_stops_receiving() {
    let remote = MemoryRemote::new();
    let mut session = new_session(&remote, Arc::new(MemorySlots::new()));
    open_and_settle(&mut session).await;

    session.close();
    assert!(!session.is_open());
    remote.write(&MenuTree::default()).await.unwrap();
    assert!(session.next_update().await.is_none());
    assert_eq!(session.tree(), &builtin_menu());
}
