// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Consolidated data routing and event distribution engine
//!
//! This module combines the packet routing, topic demultiplexing, subscriber management,
//! and event hub into a unified engine for efficient data delivery.
//!
//! # Architecture
//!
//! ```text
//! MulticastListener -> RxRing.push()
//!       v
//! Router.pop() -> parse topic name / GUID
//!       v
//! TopicRegistry.get_topic()
//!       v
//! Topic.deliver() -> Subscriber.on_data()
//!       v
//! Hub.publish(Event) -> NxSPSC rings
//! ```
//!
//! # Components
//!
//! ## Router
//! - **Router**: Background thread routing RTPS packets from RxRing to subscribers
//! - **RouterMetrics**: Telemetry counters (packets routed, orphaned, errors, bytes)
//! - **route_data_packet()**: HOT PATH function for DATA packet routing
//!
//! ## Demux
//! - **TopicRegistry**: Thread-safe topic -> subscribers mapping with GUID routing
//! - **Topic**: Topic metadata and subscriber fanout with panic isolation
//! - **HeartbeatHandler/NackHandler**: Traits for reliability protocol callbacks
//!
//! ## Subscriber
//! - **Subscriber**: Trait for receiving topic data (callback pattern)
//! - **CallbackSubscriber**: Closure-based subscriber implementation
//!
//! ## Hub
//! - **Hub**: MPSC producer -> NxSPSC subscribers for system events
//! - **Event**: Discovery, matcher, QoS event types
//!
//! # Performance Notes
//!
//! - All HOT PATH functions marked with `#[inline]`
//! - Lock-free atomics for metrics (relaxed ordering)
//! - RwLock for topic registry (readers don't block each other)
//! - Panic isolation in delivery paths (one subscriber panic doesn't affect others)
//!
//! # Examples
//!
//! ```no_run
//! use hdds::engine::{Router, TopicRegistry, CallbackSubscriber};
//! use std::sync::Arc;
//!
//! // Create registry and register subscriber
//! let registry = Arc::new(TopicRegistry::new());
//! let subscriber = Arc::new(CallbackSubscriber::new(
//!     "sensor/temperature".to_string(),
//!     |topic, seq, data| {
//!         println!("Received seq {} on {}: {} bytes", seq, topic, data.len());
//!     },
//! ));
//! registry.register_subscriber(subscriber).unwrap();
//!
//! // Start router (requires RxRing and RxPool from multicast listener)
//! // let router = Router::start(ring, pool, registry)?;
//! ```

/// Packet demultiplexing and topic registry.
pub mod demux;
/// Event hub for routing notifications.
pub mod hub;
/// Core multicast router loop.
pub mod router;
/// Subscriber trait and callback adapter.
pub mod subscriber;
/// Unicast RTPS router entry points.
pub mod unicast_router;
/// Wake notifier primitives for engine threads.
pub mod wake;

// Re-export main types for convenience
pub use demux::{
    HeartbeatHandler, NackFragHandler, NackHandler, RegistryError, Topic, TopicRegistry,
};
pub use hub::{Event, Hub};
pub use router::{route_data_packet, RouteStatus, Router, RouterMetrics};
pub use subscriber::{CallbackSubscriber, Subscriber};
pub use unicast_router::{route_raw_rtps_message, UnicastRouteOutcome};
pub use wake::WakeNotifier;
