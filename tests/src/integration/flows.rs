//! # End-to-End Flows
//!
//! A context emitting to itself through the in-memory transport, the same
//! round trip a page makes when it posts to its own window.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use postit::{InMemoryTransport, Listener, WILDCARD};
    use serde::Serialize;
    use serde_json::{json, Value};

    use crate::harness::{recorder, settle, Context};

    const ORIGIN: &str = "http://localhost";

    // =========================================================================
    // LISTENER LIFECYCLE
    // =========================================================================

    #[tokio::test]
    async fn test_emit_reaches_listener_with_metadata() {
        let hub = InMemoryTransport::new();
        let ctx = Context::connect(&hub, ORIGIN);
        let (listener, calls) = recorder();

        ctx.registry.add("foo");
        ctx.registry.on("foo", "foo.bar", listener);
        ctx.registry
            .emit("foo", "foo.bar", &ctx.handle(), &json!({ "foo": "bar" }), "*");
        settle().await;

        let calls = calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            Value::Object(calls[0].data.clone()),
            json!({
                "foo": "bar",
                "__postit": "postit",
                "__event": "foo.bar",
                "__id": "foo",
                "__origin": ORIGIN
            })
        );
        assert_eq!(calls[0].origin, ORIGIN);
        assert_eq!(calls[0].source, Some(ctx.handle()));
    }

    #[tokio::test]
    async fn test_off_then_emit_is_silent() {
        let hub = InMemoryTransport::new();
        let ctx = Context::connect(&hub, ORIGIN);
        let (listener, calls) = recorder();

        ctx.registry.add("foo");
        ctx.registry
            .on("foo", "foo.bar", listener)
            .off("foo", "foo.bar", None);
        ctx.registry
            .emit("foo", "foo.bar", &ctx.handle(), &json!({ "foo": "bar" }), "*");
        settle().await;

        assert!(calls.lock().is_empty());
        assert_eq!(ctx.registry.metrics().snapshot().received, 1);
    }

    #[tokio::test]
    async fn test_off_single_listener_keeps_the_rest() {
        let hub = InMemoryTransport::new();
        let ctx = Context::connect(&hub, ORIGIN);
        let (kept, kept_calls) = recorder();
        let (removed, removed_calls) = recorder();

        ctx.registry.add("foo");
        ctx.registry
            .on("foo", "foo.bar", kept)
            .on("foo", "foo.bar", removed.clone())
            .off("foo", "foo.bar", Some(&removed));
        ctx.registry.emit("foo", "foo.bar", &ctx.handle(), "ping", "*");
        settle().await;

        assert_eq!(kept_calls.lock().len(), 1);
        assert!(removed_calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_remove_before_delivery_drops() {
        let hub = InMemoryTransport::new();
        let ctx = Context::connect(&hub, ORIGIN);
        let (listener, calls) = recorder();

        ctx.registry.add("foo");
        ctx.registry.on("foo", "foo.bar", listener);
        ctx.registry.emit("foo", "foo.bar", &ctx.handle(), "late", "*");
        // Delivery is asynchronous; the instance is gone by the time it lands
        ctx.registry.remove("foo");
        settle().await;

        assert!(calls.lock().is_empty());
        assert_eq!(ctx.registry.metrics().snapshot().dropped, 1);
    }

    #[tokio::test]
    async fn test_emit_unknown_id_sends_nothing() {
        let hub = InMemoryTransport::new();
        let ctx = Context::connect(&hub, ORIGIN);

        ctx.registry.emit("foobar", "foo.bar", &ctx.handle(), "x", "*");
        settle().await;

        let snapshot = ctx.registry.metrics().snapshot();
        assert_eq!(snapshot.emit_rejected, 1);
        assert_eq!(snapshot.received, 0);
    }

    // =========================================================================
    // WILDCARD FAN-OUT
    // =========================================================================

    #[tokio::test]
    async fn test_wildcard_sees_every_event_after_exact() {
        let hub = InMemoryTransport::new();
        let ctx = Context::connect(&hub, ORIGIN);
        let order = Arc::new(Mutex::new(Vec::new()));
        let tagged = |tag: &'static str| {
            let order = order.clone();
            Listener::new(move |e| order.lock().push(format!("{tag}:{}", e.event())))
        };

        ctx.registry.add("foo");
        ctx.registry
            .on("foo", WILDCARD, tagged("any"))
            .on("foo", "foo.bar", tagged("bar"))
            .on("foo", "foo.baz", tagged("baz"));

        ctx.registry.emit("foo", "foo.bar", &ctx.handle(), "1", "*");
        settle().await;
        ctx.registry.emit("foo", "foo.qux", &ctx.handle(), "2", "*");
        settle().await;

        assert_eq!(
            *order.lock(),
            vec!["bar:foo.bar", "any:foo.bar", "any:foo.qux"]
        );
    }

    #[tokio::test]
    async fn test_event_named_wildcard_runs_once() {
        let hub = InMemoryTransport::new();
        let ctx = Context::connect(&hub, ORIGIN);
        let (listener, calls) = recorder();

        ctx.registry.add("foo");
        ctx.registry.on("foo", WILDCARD, listener);
        ctx.registry.emit("foo", WILDCARD, &ctx.handle(), "star", "*");
        settle().await;

        assert_eq!(calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_instances_are_isolated() {
        let hub = InMemoryTransport::new();
        let ctx = Context::connect(&hub, ORIGIN);
        let (foo_listener, foo_calls) = recorder();
        let (bar_listener, bar_calls) = recorder();

        ctx.registry.add("foo");
        ctx.registry.add("bar");
        ctx.registry
            .on("foo", "ping", foo_listener)
            .on("bar", "ping", bar_listener);
        ctx.registry.emit("bar", "ping", &ctx.handle(), "hello", "*");
        settle().await;

        assert!(foo_calls.lock().is_empty());
        assert_eq!(bar_calls.lock()[0].id(), "bar");
    }

    // =========================================================================
    // PAYLOAD SHAPES
    // =========================================================================

    #[tokio::test]
    async fn test_scalar_and_array_payloads_are_wrapped() {
        let hub = InMemoryTransport::new();
        let ctx = Context::connect(&hub, ORIGIN);
        let (listener, calls) = recorder();

        ctx.registry.add("foo");
        ctx.registry.on("foo", WILDCARD, listener);
        ctx.registry.emit("foo", "s", &ctx.handle(), "foobar", "*");
        settle().await;
        ctx.registry
            .emit("foo", "a", &ctx.handle(), &["foo", "bar"], "*");
        settle().await;
        ctx.registry.emit("foo", "n", &ctx.handle(), &42, "*");
        settle().await;
        ctx.registry.emit("foo", "z", &ctx.handle(), &Value::Null, "*");
        settle().await;

        let calls = calls.lock();
        let values: Vec<_> = calls.iter().map(|e| e.value().cloned()).collect();
        assert_eq!(
            values,
            vec![
                Some(json!("foobar")),
                Some(json!(["foo", "bar"])),
                Some(json!(42)),
                Some(Value::Null),
            ]
        );
    }

    #[tokio::test]
    async fn test_struct_payload_is_flattened() {
        #[derive(Serialize)]
        struct Move {
            x: i32,
            y: i32,
        }

        let hub = InMemoryTransport::new();
        let ctx = Context::connect(&hub, ORIGIN);
        let (listener, calls) = recorder();

        ctx.registry.add("board");
        ctx.registry.on("board", "move", listener);
        ctx.registry
            .emit("board", "move", &ctx.handle(), &Move { x: 3, y: -1 }, "*");
        settle().await;

        let calls = calls.lock();
        assert_eq!(calls[0].get("x"), Some(&json!(3)));
        assert_eq!(calls[0].get("y"), Some(&json!(-1)));
        assert!(calls[0].value().is_none());
    }

    #[tokio::test]
    async fn test_unserializable_payload_is_dropped() {
        struct Callback;
        impl Serialize for Callback {
            fn serialize<S: serde::Serializer>(&self, _s: S) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("callbacks cannot cross contexts"))
            }
        }

        let hub = InMemoryTransport::new();
        let ctx = Context::connect(&hub, ORIGIN);
        let (listener, calls) = recorder();

        ctx.registry.add("foo");
        ctx.registry.on("foo", "foo.bar", listener);
        ctx.registry
            .emit("foo", "foo.bar", &ctx.handle(), &Callback, "*");
        settle().await;

        assert!(calls.lock().is_empty());
        let snapshot = ctx.registry.metrics().snapshot();
        assert_eq!(snapshot.emit_rejected, 1);
        assert_eq!(snapshot.emitted, 0);
    }
}
