use menu_core::defaults::builtin_menu;
use menu_core::{
    AdminCredential, AdminGate, LocalCache, MemorySlots, MenuSession, Reconciled,
    RemoteSyncChannel, Tag,
};
use menu_proto::{ProtoError, RecordKey};
use menu_sync_client::{Client, SocketChannel};
use menu_sync_server::config::Config;
use menu_sync_server::server::{serve, Context};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::UnixListener;

const KEY: &str = "atyab_menu_data_v11";

async fn start() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("menusync.sock");
    let listener = UnixListener::bind(&path).unwrap();
    let ctx = Arc::new(Context::new(Config::default()));
    tokio::spawn(async move {
        let _ = serve(listener, ctx).await;
    });
    (dir, path)
}

fn channel(path: &Path) -> SocketChannel {
    SocketChannel::new(path, RecordKey::parse(KEY).unwrap())
}

#[tokio::test]
async fn client_set_get_del_stats() {
    let (_dir, path) = start().await;
    let mut client = Client::connect(&path).await.unwrap();

    client.ping().await.unwrap();
    assert!(client.get(KEY).await.unwrap().is_none());

    client.set(KEY, b"[]").await.unwrap();
    let stored = client.get(KEY).await.unwrap().unwrap();
    assert_eq!(&stored.value[..], b"[]");

    assert!(client.del(KEY).await.unwrap());
    assert!(!client.del(KEY).await.unwrap());

    let stats = client.stats().await.unwrap();
    assert_eq!(stats.writes_total, 2);
    assert_eq!(stats.records_count, 0);
}

#[tokio::test]
async fn client_rejects_bad_key() {
    let (_dir, path) = start().await;
    let client = Client::connect(&path).await.unwrap();
    let err = client.subscribe("bad key").await.err().unwrap();
    assert!(matches!(err, ProtoError::InvalidKeyFormat));
}

#[tokio::test]
async fn push_stream_sees_current_then_writes() {
    let (_dir, path) = start().await;
    let mut writer = Client::connect(&path).await.unwrap();
    let mut push = Client::connect(&path)
        .await
        .unwrap()
        .subscribe(KEY)
        .await
        .unwrap();

    let first = push.next_event().await.unwrap().unwrap();
    assert!(first.value.is_none());

    writer.set(KEY, b"[1]").await.unwrap();
    writer.del(KEY).await.unwrap();

    let ev = push.next_event().await.unwrap().unwrap();
    assert_eq!(ev.value.as_deref(), Some(&b"[1]"[..]));
    let ev = push.next_event().await.unwrap().unwrap();
    assert!(ev.value.is_none());

    push.unsubscribe().await.unwrap();
}

#[tokio::test]
async fn socket_channel_write_reaches_subscriber() {
    let (_dir, path) = start().await;
    let remote = channel(&path);

    let mut sub = remote.subscribe().await.unwrap();
    assert_eq!(sub.next().await.unwrap().value, None);

    remote.write(&builtin_menu()).await.unwrap();
    let bytes = sub.next().await.unwrap().value.unwrap();
    assert_eq!(
        menu_core::MenuTree::from_json_slice(&bytes).unwrap(),
        builtin_menu()
    );
}

#[tokio::test]
async fn socket_channel_unavailable_without_server() {
    let dir = tempfile::tempdir().unwrap();
    let remote = channel(&dir.path().join("missing.sock"));
    let err = remote.write(&builtin_menu()).await.unwrap_err();
    assert!(err.to_string().contains("missing.sock"));
    assert!(remote.subscribe().await.is_err());
}

#[tokio::test]
async fn two_sessions_over_the_socket() {
    let (_dir, path) = start().await;
    let new_session = || {
        MenuSession::new(
            Arc::new(channel(&path)),
            LocalCache::new(Arc::new(MemorySlots::new()), RecordKey::parse(KEY).unwrap()),
            AdminGate::new(AdminCredential::from_setting(Some("pw"))),
            builtin_menu(),
        )
    };

    let mut a = new_session();
    a.open().await.unwrap();
    assert_eq!(a.next_update().await, Some(Reconciled::Seeded));
    assert!(matches!(a.next_update().await, Some(Reconciled::Replaced { .. })));

    let mut b = new_session();
    b.open().await.unwrap();
    assert!(matches!(b.next_update().await, Some(Reconciled::Replaced { .. })));

    let mut pw = "pw".to_string();
    a.attempt_login(&mut pw).unwrap();
    a.toggle_tag("grills", 2, Tag::Spicy).unwrap();
    a.save().await.unwrap();

    assert!(matches!(b.next_update().await, Some(Reconciled::Replaced { .. })));
    assert_eq!(b.tree(), a.tree());
    assert!(b.tree().section("grills").unwrap().items[2].is_spicy());
}
