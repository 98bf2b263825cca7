use std::time::Duration;

use lunamesh_delivery::{
    ChatKey, DeliveryEvent, DeliveryState, DeliveryTracker, FailureCause, TransportError,
};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn no_lost_updates_under_parallel_settlement() {
    let tracker = DeliveryTracker::new();
    let mut events = tracker.subscribe();
    let total = 24u32;

    let mut ids = Vec::new();
    for n in 0..total {
        let chat = ChatKey::direct(n % 3);
        let id = tracker.track(chat, async move {
            tokio::time::sleep(Duration::from_millis(u64::from(n % 5))).await;
            if n % 2 == 0 {
                Ok(Some(1000 + n))
            } else {
                Err(TransportError::new("nak").with_message_id(2000 + n))
            }
        })
        .expect("runtime");
        ids.push((n, id));
    }

    let mut settled = 0;
    while settled < total {
        match events.recv().await {
            Ok(DeliveryEvent::Settled { .. }) => settled += 1,
            Ok(DeliveryEvent::Created { .. }) => {}
            Err(err) => panic!("event stream broke: {err}"),
        }
    }

    assert_eq!(tracker.len(), total as usize);
    for (n, id) in ids {
        let record = tracker.get(id).expect("record");
        if n % 2 == 0 {
            assert_eq!(record.state, DeliveryState::Acknowledged);
            assert_eq!(record.message_id, Some(1000 + n));
        } else {
            assert_eq!(record.state, DeliveryState::Failed);
            assert_eq!(record.message_id, Some(2000 + n));
            assert_eq!(record.failure, Some(FailureCause::Rejected { reason: "nak".into() }));
        }
        assert_eq!(record.chat, ChatKey::direct(n % 3));
    }
}

#[tokio::test]
async fn clearing_mid_flight_drops_the_settlement() {
    let tracker = DeliveryTracker::new();
    let (tx, rx) = tokio::sync::oneshot::channel::<u32>();
    let id = tracker.track(ChatKey::broadcast(0), async move {
        rx.await.map(Some).map_err(|_| TransportError::new("dropped"))
    })
    .expect("runtime");
    assert_eq!(tracker.clear(), 1);
    tx.send(9).expect("send");
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;
    assert!(tracker.get(id).is_none());
    assert!(tracker.is_empty());
}
