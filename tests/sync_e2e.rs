//! End-to-end share flows between two real instances on loopback.
//!
//! Multicast is not exercised here; each test seeds the sender's registry
//! with the receiver's bound address directly.

use notesync_rs::prelude::*;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

const TEST_DEADLINE: Duration = Duration::from_secs(30);

async fn start_instance(alias: &str) -> (SyncService, Arc<MemoryNoteStore>) {
    let store = Arc::new(MemoryNoteStore::new());
    let config = SyncConfig {
        alias: Some(alias.to_string()),
        http_port: 0,
        enable_discovery: false,
        ack_timeout: Duration::from_secs(10),
        ..SyncConfig::default()
    };
    let service = SyncService::start(config, store.clone())
        .await
        .expect("service should start on an ephemeral port");
    (service, store)
}

fn register_as_peer(sender: &SyncService, receiver: &SyncService) -> String {
    let peer = PeerDevice {
        id: receiver.device().id.clone(),
        name: receiver.device().name.clone(),
        ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: receiver.port(),
    };
    let peer_id = peer.id.clone();
    sender.registry().upsert(peer);
    peer_id
}

async fn next_pending(events: &mut broadcast::Receiver<SyncEvent>) -> SyncNotification {
    loop {
        match events.recv().await {
            Ok(SyncEvent::SyncNotification { notification })
                if notification.status == SyncStatus::Pending =>
            {
                return notification;
            }
            Ok(_) => continue,
            Err(err) => panic!("event stream closed while waiting: {err}"),
        }
    }
}

async fn next_sync_response(events: &mut broadcast::Receiver<SyncEvent>) -> (String, bool) {
    loop {
        match events.recv().await {
            Ok(SyncEvent::SyncResponse {
                note_id, accepted, ..
            }) => return (note_id, accepted),
            Ok(_) => continue,
            Err(err) => panic!("event stream closed while waiting: {err}"),
        }
    }
}

#[tokio::test]
async fn accepted_share_lands_in_the_receiver_store() {
    tokio::time::timeout(TEST_DEADLINE, async {
        let (mut sender, _sender_store) = start_instance("sender").await;
        let (mut receiver, receiver_store) = start_instance("receiver").await;
        let peer_id = register_as_peer(&sender, &receiver);

        let mut note = Note::new("Groceries", "milk, eggs");
        note.id = "n1".to_string();
        sender.save_note(&note).await.unwrap();

        let mut receiver_events = receiver.subscribe();
        let mut sender_events = sender.subscribe();

        let (report, _) = tokio::join!(sender.share_note("n1", &peer_id), async {
            let notification = next_pending(&mut receiver_events).await;
            assert_eq!(notification.note_title, "Groceries");
            assert_eq!(notification.from_peer.id, sender.device().id);

            receiver
                .respond_to_sync(&notification.id, true)
                .await
                .unwrap();
        });

        assert!(
            matches!(report.outcome, ShareOutcome::Accepted),
            "share should be accepted, got {:?}",
            report.outcome
        );

        // The receiver now owns a copy of the note.
        let received = receiver_store.notes();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].title, "Groceries");
        assert_eq!(received[0].content, "milk, eggs");

        // The sender's UI learns about the decision.
        let (note_id, accepted) = next_sync_response(&mut sender_events).await;
        assert_eq!(note_id, "n1");
        assert!(accepted);

        // The notification reached its terminal state, exactly once.
        let notifications = receiver.get_sync_notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].status, SyncStatus::Accepted);
        assert!(matches!(
            receiver
                .respond_to_sync(&notifications[0].id, false)
                .await
                .unwrap_err(),
            SyncError::AlreadyResolved { .. }
        ));

        sender.shutdown();
        receiver.shutdown();
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn rejected_share_leaves_the_receiver_store_unchanged() {
    tokio::time::timeout(TEST_DEADLINE, async {
        let (mut sender, _sender_store) = start_instance("sender").await;
        let (mut receiver, receiver_store) = start_instance("receiver").await;
        let peer_id = register_as_peer(&sender, &receiver);

        let mut note = Note::new("Groceries", "milk, eggs");
        note.id = "n1".to_string();
        sender.save_note(&note).await.unwrap();

        let mut receiver_events = receiver.subscribe();
        let mut sender_events = sender.subscribe();

        let (report, _) = tokio::join!(sender.share_note("n1", &peer_id), async {
            let notification = next_pending(&mut receiver_events).await;
            receiver
                .respond_to_sync(&notification.id, false)
                .await
                .unwrap();
        });

        assert!(matches!(report.outcome, ShareOutcome::Rejected));
        assert!(receiver_store.notes().is_empty());

        let (_, accepted) = next_sync_response(&mut sender_events).await;
        assert!(!accepted);

        let notifications = receiver.get_sync_notifications();
        assert_eq!(notifications[0].status, SyncStatus::Rejected);

        sender.shutdown();
        receiver.shutdown();
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn attachments_travel_with_their_note() {
    tokio::time::timeout(TEST_DEADLINE, async {
        let (mut sender, sender_store) = start_instance("sender").await;
        let (mut receiver, receiver_store) = start_instance("receiver").await;
        let peer_id = register_as_peer(&sender, &receiver);

        let mut note = Note::new("Trip", "photos attached");
        note.id = "n2".to_string();
        note.attachments = vec!["map.png".to_string()];
        sender.save_note(&note).await.unwrap();
        sender_store
            .save_attachment("n2", "map.png", &[1, 2, 3, 4])
            .await
            .unwrap();

        let mut receiver_events = receiver.subscribe();

        let (report, _) = tokio::join!(sender.share_note("n2", &peer_id), async {
            let notification = next_pending(&mut receiver_events).await;
            receiver
                .respond_to_sync(&notification.id, true)
                .await
                .unwrap();
        });

        assert!(matches!(report.outcome, ShareOutcome::Accepted));
        assert_eq!(
            receiver_store.attachment("n2", "map.png"),
            Some(vec![1, 2, 3, 4])
        );

        sender.shutdown();
        receiver.shutdown();
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unreachable_peer_fails_without_a_notification() {
    tokio::time::timeout(TEST_DEADLINE, async {
        let (mut sender, _store) = start_instance("sender").await;

        // Bind and drop a listener so the port is very likely closed.
        let closed_port = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let note = Note::new("Lonely", "nobody to read this");
        let note_id = note.id.clone();
        sender.save_note(&note).await.unwrap();

        sender.registry().upsert(PeerDevice {
            id: "gone".to_string(),
            name: "gone".to_string(),
            ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: closed_port,
        });

        let report = sender.share_note(&note_id, "gone").await;
        assert!(matches!(
            report.outcome,
            ShareOutcome::Failed(SyncError::PeerUnreachable { .. })
        ));

        sender.shutdown();
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn second_share_of_same_pair_is_rejected_while_first_is_pending() {
    tokio::time::timeout(TEST_DEADLINE, async {
        let (mut sender, _sender_store) = start_instance("sender").await;
        let (mut receiver, _receiver_store) = start_instance("receiver").await;
        let peer_id = register_as_peer(&sender, &receiver);

        let mut note = Note::new("Popular", "shared twice");
        note.id = "n3".to_string();
        sender.save_note(&note).await.unwrap();

        let mut receiver_events = receiver.subscribe();

        let (first_report, _) = tokio::join!(sender.share_note("n3", &peer_id), async {
            let notification = next_pending(&mut receiver_events).await;

            // While the first request is parked on the receiver, a second
            // attempt for the same (note, peer) pair must be refused.
            let second = sender.share_note("n3", &peer_id).await;
            assert!(matches!(
                second.outcome,
                ShareOutcome::Failed(SyncError::ShareAlreadyInFlight { .. })
            ));

            // Exactly one notification was created.
            assert_eq!(receiver.get_sync_notifications().len(), 1);

            receiver
                .respond_to_sync(&notification.id, true)
                .await
                .unwrap();
        });

        assert!(matches!(first_report.outcome, ShareOutcome::Accepted));
        assert_eq!(receiver.get_sync_notifications().len(), 1);

        sender.shutdown();
        receiver.shutdown();
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn malformed_request_creates_no_notification() {
    tokio::time::timeout(TEST_DEADLINE, async {
        let (mut receiver, receiver_store) = start_instance("receiver").await;
        let url = format!(
            "http://127.0.0.1:{}/api/notesync/v1/share",
            receiver.port()
        );
        let client = reqwest::Client::new();

        // Not JSON at all.
        let response = client
            .post(&url)
            .body("definitely not json")
            .header("content-type", "application/json")
            .send()
            .await
            .unwrap();
        assert!(response.status().is_client_error());

        // Valid JSON, but the note lists an attachment that was not sent.
        let mut note = Note::new("Broken", "missing attachment");
        note.attachments = vec!["gone.png".to_string()];
        let message = ShareRequestMessage {
            request_id: "req-broken".to_string(),
            sender: SenderInfo {
                id: "stranger".to_string(),
                name: "Stranger".to_string(),
                port: 1234,
            },
            note,
            attachments: vec![],
        };
        let response = client.post(&url).json(&message).send().await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

        assert!(receiver.get_sync_notifications().is_empty());
        assert!(receiver_store.notes().is_empty());

        receiver.shutdown();
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn batch_share_reports_outcomes_independently() {
    tokio::time::timeout(TEST_DEADLINE, async {
        let (mut sender, _sender_store) = start_instance("sender").await;
        let (mut receiver, receiver_store) = start_instance("receiver").await;
        let peer_id = register_as_peer(&sender, &receiver);

        let mut kept = Note::new("Kept", "stays");
        kept.id = "keep".to_string();
        sender.save_note(&kept).await.unwrap();
        // "missing" is never saved on the sender.

        let mut receiver_events = receiver.subscribe();

        let ids = vec!["keep".to_string(), "missing".to_string()];
        let (reports, _) = tokio::join!(sender.share_notes(&ids, &peer_id), async {
            let notification = next_pending(&mut receiver_events).await;
            receiver
                .respond_to_sync(&notification.id, true)
                .await
                .unwrap();
        });

        assert_eq!(reports.len(), 2);
        assert!(matches!(reports[0].outcome, ShareOutcome::Accepted));
        assert!(matches!(
            reports[1].outcome,
            ShareOutcome::Failed(SyncError::NoteNotFound { .. })
        ));

        // The failed sibling did not block the successful one.
        assert_eq!(receiver_store.notes().len(), 1);
        assert_eq!(receiver_store.notes()[0].title, "Kept");

        sender.shutdown();
        receiver.shutdown();
    })
    .await
    .expect("test timed out");
}
