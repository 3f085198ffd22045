//! Broadcast discovery and broadcast ping: reply collection for the
//! window, duplicate suppression, and indifference to error replies.
mod helpers;

use canio_gw::gateway::{
    client::{DeviceClient, Timeouts},
    interface_manager::InterfaceManager,
};
use canio_gw::protocol::device::{addresses, frame::CommControl};
use canio_gw::protocol::transport::iface_name::IfaceName;
use helpers::{recv_request, reply_to, test_timeouts, MockHost, MockTimer};

#[tokio::test]
async fn test_discover_collects_three_devices() {
    let (host, mut sent_rx) = MockHost::new(&["can0"]);
    let manager: InterfaceManager<MockHost> = InterfaceManager::new(host);
    manager.reconcile();
    let can0 = IfaceName::new("can0");
    let mut client = DeviceClient::new(&manager, MockTimer::new()).with_timeouts(test_timeouts());

    let mut found = [0u8; 8];
    tokio::select! {
        result = client.discover(&can0, &mut found) => {
            let count = result.expect("discovery window should close normally");
            assert_eq!(count, 3, "should discover 3 devices");
            // Replies are collected in arrival order.
            assert_eq!(&found[..count], &[0x21, 0x42, 0x63]);
        }
        _ = async {
            let (_iface, request) = recv_request(&mut sent_rx).await;
            assert!(request.comm.is_discovery());
            assert_eq!(request.id.responder(), addresses::BROADCAST);

            for device in [0x21, 0x42, 0x63] {
                manager.ingress(&can0, reply_to(&request, device).encode());
            }
            // A duplicate and an error reply must not be counted.
            manager.ingress(&can0, reply_to(&request, 0x21).encode());
            let mut faulty = reply_to(&request, 0x77);
            faulty.comm = faulty.comm.with(CommControl::ERROR);
            manager.ingress(&can0, faulty.encode());

            std::future::pending::<()>().await;
        } => panic!("simulator finished before the operation"),
    }
    assert_eq!(manager.listener_count(), 0, "the listener must be released");
}

#[tokio::test]
async fn test_discover_empty_bus_resolves_after_the_window() {
    let (host, mut sent_rx) = MockHost::new(&["can0"]);
    let manager: InterfaceManager<MockHost> = InterfaceManager::new(host);
    manager.reconcile();
    let can0 = IfaceName::new("can0");
    let mut client = DeviceClient::new(&manager, MockTimer::new()).with_timeouts(test_timeouts());

    let started = std::time::Instant::now();
    let mut found = [0u8; 8];
    let count = client.discover(&can0, &mut found).await.unwrap();
    assert_eq!(count, 0);
    assert!(
        started.elapsed().as_millis() >= 80,
        "an empty result must wait out the whole window"
    );

    // The request still went out.
    let (_iface, request) = recv_request(&mut sent_rx).await;
    assert!(request.comm.is_discovery());
}

#[tokio::test]
async fn test_quiet_grace_window_closes_the_collection_early() {
    let (host, _sent_rx) = MockHost::new(&["can0"]);
    let manager: InterfaceManager<MockHost> = InterfaceManager::new(host);
    manager.reconcile();
    let can0 = IfaceName::new("can0");
    let timeouts = Timeouts {
        grace_ms: 10,
        discover_ms: 300,
        ..test_timeouts()
    };
    let mut client = DeviceClient::new(&manager, MockTimer::new()).with_timeouts(timeouts);

    let started = std::time::Instant::now();
    let mut found = [0u8; 8];
    let count = client.discover(&can0, &mut found).await.unwrap();
    assert_eq!(count, 0);
    assert!(
        started.elapsed().as_millis() < 150,
        "a quiet bus must close on the grace window, not the discovery deadline"
    );
}

#[tokio::test]
async fn test_discovery_deadline_bounds_the_collection() {
    let (host, _sent_rx) = MockHost::new(&["can0"]);
    let manager: InterfaceManager<MockHost> = InterfaceManager::new(host);
    manager.reconcile();
    let can0 = IfaceName::new("can0");
    let timeouts = Timeouts {
        grace_ms: 300,
        discover_ms: 40,
        ..test_timeouts()
    };
    let mut client = DeviceClient::new(&manager, MockTimer::new()).with_timeouts(timeouts);

    let started = std::time::Instant::now();
    let mut found = [0u8; 8];
    let count = client.discover(&can0, &mut found).await.unwrap();
    assert_eq!(count, 0);
    let elapsed = started.elapsed().as_millis();
    assert!(
        (40..150u128).contains(&elapsed),
        "the discovery deadline must cap a longer grace window, took {elapsed} ms"
    );
}

#[tokio::test]
async fn test_ping_all_collects_like_discover() {
    let (host, mut sent_rx) = MockHost::new(&["can0"]);
    let manager: InterfaceManager<MockHost> = InterfaceManager::new(host);
    manager.reconcile();
    let can0 = IfaceName::new("can0");
    let mut client = DeviceClient::new(&manager, MockTimer::new()).with_timeouts(test_timeouts());

    let mut found = [0u8; 4];
    tokio::select! {
        result = client.ping_all(&can0, &mut found) => {
            assert_eq!(result.unwrap(), 2);
            assert_eq!(&found[..2], &[0x10, 0x11]);
        }
        _ = async {
            let (_iface, request) = recv_request(&mut sent_rx).await;
            assert!(request.comm.is_ping());
            assert_eq!(request.id.responder(), addresses::BROADCAST);
            manager.ingress(&can0, reply_to(&request, 0x10).encode());
            manager.ingress(&can0, reply_to(&request, 0x11).encode());
            std::future::pending::<()>().await;
        } => panic!("simulator finished before the operation"),
    }
}

#[tokio::test]
async fn test_discover_stops_when_buffer_is_full() {
    let (host, mut sent_rx) = MockHost::new(&["can0"]);
    let manager: InterfaceManager<MockHost> = InterfaceManager::new(host);
    manager.reconcile();
    let can0 = IfaceName::new("can0");
    let mut client = DeviceClient::new(&manager, MockTimer::new()).with_timeouts(test_timeouts());

    let mut found = [0u8; 2];
    tokio::select! {
        result = client.discover(&can0, &mut found) => {
            // Early return, well before the window closes.
            assert_eq!(result.unwrap(), 2);
            assert_eq!(found, [0x01, 0x02]);
        }
        _ = async {
            let (_iface, request) = recv_request(&mut sent_rx).await;
            for device in [0x01, 0x02, 0x03] {
                manager.ingress(&can0, reply_to(&request, device).encode());
            }
            std::future::pending::<()>().await;
        } => panic!("simulator finished before the operation"),
    }
}
