use spb::{
    client::channel::{ChannelEventLoop, OutboundMessage},
    node::{EdgeNodeBuilder, LifecycleState},
    types::topic::{NodeMessage, NodeTopic},
};
use std::time::Duration;
use tokio::time::timeout;

#[tokio::test]
async fn node_births_and_stops_through_facade() {
    let (eventloop, client, mut broker) = ChannelEventLoop::new();
    let (node, handle) = EdgeNodeBuilder::new(eventloop, client)
        .with_group_id("foo")
        .with_node_id("bar")
        .build()
        .unwrap();
    let task = tokio::spawn(node.run());

    let subscribe = timeout(Duration::from_secs(1), broker.rx_outbound.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(subscribe, OutboundMessage::Subscribe(_)));

    match timeout(Duration::from_secs(1), broker.rx_outbound.recv())
        .await
        .unwrap()
        .unwrap()
    {
        OutboundMessage::NodeMessage { topic, payload } => {
            assert_eq!(topic, NodeTopic::new("foo", NodeMessage::NBirth, "bar"));
            assert_eq!(payload.seq, Some(0));
        }
        message => panic!("unexpected message {message:?}"),
    }
    assert_eq!(handle.state().await, LifecycleState::Online);

    handle.stop().await;
    assert_eq!(
        timeout(Duration::from_secs(2), task).await.unwrap().unwrap(),
        Ok(())
    );
}
