mod utils;

use std::{collections::BTreeMap, time::Duration};

use futures::future::join_all;
use spb_client::{channel::OutboundMessage, ClientError, Event};
use spb_node::{LifecycleState, PublishError, RetryPolicy, StartError, StateError};
use spb_types::{
    payload::{Message, Payload},
    topic::{NodeMessage, QoS},
    Value,
};
use tokio::time::timeout;
use utils::tester::{
    assert_no_message, bdseq_of, builder, expect_node_message, online_node, recv, spawn_node,
    test_graceful_shutdown, test_node_online, verify_nbirth_payload, GROUP_ID, NODE_ID,
};

#[tokio::test]
async fn node_session_establishment() {
    let (builder, mut broker) = builder();
    let (node, handle) = builder.build().unwrap();
    assert_eq!(handle.state().await, LifecycleState::Offline);
    spawn_node(node);

    test_node_online(&mut broker, 0, 0).await;
    assert_eq!(handle.state().await, LifecycleState::Online);

    let will = broker.last_will().unwrap();
    assert_eq!(will.topic, format!("spBv1.0/{GROUP_ID}/NDEATH/{NODE_ID}"));
    assert!(will.retain);
    assert_eq!(will.qos, QoS::AtLeastOnce);
    let will_payload = Payload::decode(will.payload.as_slice()).unwrap();
    assert_eq!(bdseq_of(&will_payload), 0);
    assert_eq!(will_payload.seq, None);
}

#[tokio::test]
async fn reconnect_advances_bdseq_and_continues_seq() {
    let (_handle, mut broker, _task) = online_node().await;

    broker.tx_event.send(Event::Offline).unwrap();

    test_node_online(&mut broker, 1, 1).await;
    let will = broker.last_will().unwrap();
    let will_payload = Payload::decode(will.payload.as_slice()).unwrap();
    assert_eq!(bdseq_of(&will_payload), 1);
    assert_eq!(broker.connect_attempts(), 2);
}

#[tokio::test]
async fn reset_seq_on_birth() {
    let (builder, mut broker) = builder();
    let (node, handle) = builder.reset_seq_on_birth(true).build().unwrap();
    spawn_node(node);
    test_node_online(&mut broker, 0, 0).await;

    handle.publish_node_data([("x", 1i32)]).await.unwrap();
    expect_node_message(&mut broker, NodeMessage::NData).await;

    broker.tx_event.send(Event::Offline).unwrap();
    test_node_online(&mut broker, 1, 0).await;
}

#[tokio::test]
async fn data_before_birth_is_rejected() {
    let (builder, mut broker) = builder();
    let (_node, handle) = builder.build().unwrap();

    assert_eq!(
        handle.publish_node_data([("x", 1i32)]).await,
        Err(PublishError::State(StateError::Offline))
    );
    assert_eq!(
        handle.rebirth().await,
        Err(PublishError::State(StateError::Offline))
    );
    assert_no_message(&mut broker).await;
}

#[tokio::test]
async fn seq_increments_and_wraps() {
    let (handle, mut broker, _task) = online_node().await;

    for i in 1..=300u64 {
        handle.publish_node_data([("count", i)]).await.unwrap();
        let payload = expect_node_message(&mut broker, NodeMessage::NData).await;
        assert_eq!(payload.seq, Some(i % 256));
    }
}

#[tokio::test]
async fn data_without_encodable_metrics_is_rejected() {
    let (handle, mut broker, _task) = online_node().await;

    assert_eq!(
        handle
            .publish_node_data(Vec::<(String, Value)>::new())
            .await,
        Err(PublishError::NoMetrics)
    );
    assert_eq!(
        handle
            .publish_node_data([("a", Value::Null), ("b", Value::List(vec![]))])
            .await,
        Err(PublishError::NoMetrics)
    );
    assert_no_message(&mut broker).await;

    /* no seq was consumed by the rejected messages, unsupported values are dropped */
    handle
        .publish_node_data([("ok", Value::Boolean(true)), ("bad", Value::Null)])
        .await
        .unwrap();
    let payload = expect_node_message(&mut broker, NodeMessage::NData).await;
    assert_eq!(payload.seq, Some(1));
    assert_eq!(payload.metrics.len(), 1);
    assert!(payload.metric("ok").is_some());
}

#[tokio::test]
async fn data_metrics_are_unique_and_ordered_by_name() {
    let (handle, mut broker, _task) = online_node().await;

    handle
        .publish_node_data([("b", 1i32), ("a", 2i32), ("b", 3i32)])
        .await
        .unwrap();
    let payload = expect_node_message(&mut broker, NodeMessage::NData).await;
    let names: Vec<_> = payload
        .metrics
        .iter()
        .map(|m| m.name.clone().unwrap())
        .collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(
        Value::try_from_metric(payload.metric("b").unwrap()),
        Ok(Value::Int32(3))
    );
}

#[tokio::test]
async fn stop_publishes_death_and_disconnects() {
    let (handle, mut broker, task) = online_node().await;

    handle.publish_node_data([("x", 1i32)]).await.unwrap();
    expect_node_message(&mut broker, NodeMessage::NData).await;

    test_graceful_shutdown(&mut broker, &handle, 0, 2).await;
    assert_eq!(
        timeout(Duration::from_secs(1), task).await.unwrap().unwrap(),
        Ok(())
    );
    assert_eq!(handle.state().await, LifecycleState::Offline);
    assert_eq!(
        handle.publish_node_data([("x", 1i32)]).await,
        Err(PublishError::State(StateError::Offline))
    );
}

#[tokio::test]
async fn death_bdseq_matches_birth_across_connections() {
    let (handle, mut broker, _task) = online_node().await;
    broker.tx_event.send(Event::Offline).unwrap();
    test_node_online(&mut broker, 1, 1).await;
    test_graceful_shutdown(&mut broker, &handle, 1, 2).await;
}

#[tokio::test]
async fn node_birth_includes_node_metrics() {
    let mut metrics = BTreeMap::new();
    metrics.insert("Properties/Hardware".to_string(), Value::from("x86"));
    metrics.insert("bdSeq".to_string(), Value::Int64(42));

    let (builder, mut broker) = builder();
    let (node, _handle) = builder.with_node_metrics(metrics).build().unwrap();
    spawn_node(node);

    assert!(matches!(recv(&mut broker).await, OutboundMessage::Subscribe(_)));
    let payload = expect_node_message(&mut broker, NodeMessage::NBirth).await;
    verify_nbirth_payload(&payload, 0, 0);
    assert_eq!(payload.metrics.len(), 4);
    assert_eq!(
        Value::try_from_metric(payload.metric("Properties/Hardware").unwrap()),
        Ok(Value::String("x86".into()))
    );
}

#[tokio::test]
async fn manual_rebirth() {
    let (handle, mut broker, _task) = online_node().await;

    handle.rebirth().await.unwrap();
    let payload = expect_node_message(&mut broker, NodeMessage::NBirth).await;
    verify_nbirth_payload(&payload, 1, 1);
}

#[tokio::test]
async fn rebirth_leaves_last_will_on_previous_bdseq() {
    let (handle, mut broker, _task) = online_node().await;

    handle.rebirth().await.unwrap();
    let payload = expect_node_message(&mut broker, NodeMessage::NBirth).await;
    verify_nbirth_payload(&payload, 1, 1);

    let will = broker.last_will().unwrap();
    let will_payload = Payload::decode(will.payload.as_slice()).unwrap();
    assert_eq!(bdseq_of(&will_payload), 0);
}

#[tokio::test]
async fn rebirth_keeps_bdseq_when_configured() {
    let (builder, mut broker) = builder();
    let (node, handle) = builder.advance_bdseq_on_rebirth(false).build().unwrap();
    spawn_node(node);
    test_node_online(&mut broker, 0, 0).await;

    handle.rebirth().await.unwrap();
    let payload = expect_node_message(&mut broker, NodeMessage::NBirth).await;
    verify_nbirth_payload(&payload, 0, 1);
}

#[tokio::test]
async fn concurrent_publishers_get_unique_ordered_seq() {
    let (handle, mut broker, _task) = online_node().await;

    let publishers = (0..50).map(|i| {
        let handle = handle.clone();
        tokio::spawn(async move { handle.publish_node_data([("i", i as i32)]).await })
    });
    for result in join_all(publishers).await {
        result.unwrap().unwrap();
    }

    let mut seqs = Vec::new();
    for _ in 0..50 {
        let payload = expect_node_message(&mut broker, NodeMessage::NData).await;
        seqs.push(payload.seq.unwrap());
    }
    assert_eq!(seqs, (1..=50).collect::<Vec<u64>>());
}

#[tokio::test]
async fn connect_retries_until_success() {
    let (builder, mut broker) = builder();
    let (node, _handle) = builder
        .with_retry_policy(RetryPolicy {
            interval: Duration::from_millis(10),
            max_attempts: None,
        })
        .build()
        .unwrap();
    broker.fail_next_connects(2);
    spawn_node(node);

    test_node_online(&mut broker, 0, 0).await;
    assert_eq!(broker.connect_attempts(), 3);
}

#[tokio::test]
async fn connect_retries_exhausted() {
    let (builder, mut broker) = builder();
    let (node, handle) = builder
        .with_retry_policy(RetryPolicy {
            interval: Duration::from_millis(10),
            max_attempts: Some(3),
        })
        .build()
        .unwrap();
    broker.fail_next_connects(5);
    let task = spawn_node(node);

    let result = timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
    assert!(matches!(
        result,
        Err(StartError::RetriesExhausted { attempts: 3, .. })
    ));
    assert_eq!(broker.connect_attempts(), 3);
    assert_eq!(handle.state().await, LifecycleState::Offline);
    assert_no_message(&mut broker).await;
}

#[tokio::test]
async fn stop_cancels_connect_retries() {
    let (builder, mut broker) = builder();
    let (node, handle) = builder
        .with_retry_policy(RetryPolicy {
            interval: Duration::from_secs(10),
            max_attempts: None,
        })
        .build()
        .unwrap();
    broker.fail_next_connects(100);
    let task = spawn_node(node);

    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.stop().await;

    assert_eq!(
        timeout(Duration::from_secs(1), task).await.unwrap().unwrap(),
        Ok(())
    );
    assert_eq!(broker.connect_attempts(), 1);
    /* never birthed, so no death certificate */
    assert_eq!(recv(&mut broker).await, OutboundMessage::Disconnect);
}

#[tokio::test]
async fn rejected_publish_does_not_consume_seq() {
    let (handle, mut broker, _task) = online_node().await;

    broker.fail_next_publishes(1);
    assert_eq!(
        handle.publish_node_data([("x", 1i32)]).await,
        Err(PublishError::Transport(ClientError::Request(
            "publish rejected".into()
        )))
    );
    assert_no_message(&mut broker).await;

    handle.publish_node_data([("x", 2i32)]).await.unwrap();
    handle.publish_node_data([("x", 3i32)]).await.unwrap();
    let first = expect_node_message(&mut broker, NodeMessage::NData).await;
    let second = expect_node_message(&mut broker, NodeMessage::NData).await;
    assert_eq!(
        vec![first.seq.unwrap(), second.seq.unwrap()],
        vec![1, 2]
    );
}

#[tokio::test]
async fn rejected_rebirth_is_retried_with_same_seq() {
    let (handle, mut broker, _task) = online_node().await;

    broker.fail_next_publishes(1);
    assert!(matches!(
        handle.rebirth().await,
        Err(PublishError::Transport(_))
    ));
    assert_no_message(&mut broker).await;
    assert_eq!(handle.state().await, LifecycleState::Online);

    /* the failed rebirth still advanced bdSeq */
    handle.rebirth().await.unwrap();
    let payload = expect_node_message(&mut broker, NodeMessage::NBirth).await;
    verify_nbirth_payload(&payload, 2, 1);
}

#[tokio::test]
async fn rejected_birth_reconnects() {
    let (builder, mut broker) = builder();
    let (node, _handle) = builder
        .with_retry_policy(RetryPolicy {
            interval: Duration::from_millis(10),
            max_attempts: None,
        })
        .build()
        .unwrap();
    broker.fail_next_publishes(1);
    spawn_node(node);

    assert!(matches!(recv(&mut broker).await, OutboundMessage::Subscribe(_)));
    test_node_online(&mut broker, 1, 0).await;
    assert_eq!(broker.connect_attempts(), 2);
}
