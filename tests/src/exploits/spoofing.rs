//! # Spoofing and Foreign Traffic
//!
//! A context on the same transport does not need a registry to send: it can
//! put arbitrary strings on the wire. These tests post raw payloads through
//! a bare endpoint and check what reaches the victim's listeners.
//!
//! ## Attack Vectors
//!
//! 1. **Noise**: non-JSON and non-object payloads from unrelated code
//! 2. **Foreign protocol**: well-formed envelopes with another tag
//! 3. **Malformed metadata**: non-string or empty identifiers
//! 4. **Metadata injection**: payload keys named like protocol fields
//! 5. **Origin forgery**: a lying `__origin` field

#[cfg(test)]
mod tests {
    use postit::{InMemoryTransport, Transport, WILDCARD};
    use serde_json::json;

    use crate::harness::{recorder, settle, Context};

    const VICTIM: &str = "http://bank.test";
    const ATTACKER: &str = "http://evil.test";

    #[tokio::test]
    async fn test_noise_is_ignored() {
        let hub = InMemoryTransport::new();
        let victim = Context::connect(&hub, VICTIM);
        let attacker = hub.connect(ATTACKER).unwrap();
        let (listener, calls) = recorder();

        victim.registry.add("foo");
        victim.registry.on("foo", WILDCARD, listener);

        for noise in ["", "foo", "42", "null", "[1,2]", "{", r#""__postit""#] {
            attacker.send_message(noise.to_string(), &victim.handle(), "*");
        }
        settle().await;

        assert!(calls.lock().is_empty());
        assert!(victim.is_listening());
        let snapshot = victim.registry.metrics().snapshot();
        assert_eq!(snapshot.received, 7);
        assert_eq!(snapshot.dropped, 7);
    }

    #[tokio::test]
    async fn test_foreign_tag_is_ignored() {
        let hub = InMemoryTransport::new();
        let victim = Context::connect(&hub, VICTIM);
        let attacker = hub.connect(ATTACKER).unwrap();
        let (listener, calls) = recorder();

        victim.registry.add("foo");
        victim.registry.on("foo", "foo.bar", listener);

        let forged = json!({
            "__postit": "not-postit",
            "__event": "foo.bar",
            "__id": "foo",
            "__origin": VICTIM,
            "foo": "bar"
        });
        attacker.send_message(forged.to_string(), &victim.handle(), "*");
        settle().await;

        assert!(calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_identifier_is_ignored() {
        let hub = InMemoryTransport::new();
        let victim = Context::connect(&hub, VICTIM);
        let attacker = hub.connect(ATTACKER).unwrap();
        let (listener, calls) = recorder();

        victim.registry.add("foo");
        victim.registry.on("foo", WILDCARD, listener);

        for id in [json!(["foo"]), json!({ "foo": "bar" }), json!(7), json!("")] {
            let forged = json!({
                "__postit": "postit",
                "__event": "foo.bar",
                "__id": id,
                "__origin": ATTACKER
            });
            attacker.send_message(forged.to_string(), &victim.handle(), "*");
        }
        settle().await;

        assert!(calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_payload_cannot_override_metadata() {
        let hub = InMemoryTransport::new();
        let ctx = Context::connect(&hub, VICTIM);
        let (admin, admin_calls) = recorder();
        let (user, user_calls) = recorder();

        ctx.registry.add("admin");
        ctx.registry.add("user");
        ctx.registry.on("admin", WILDCARD, admin);
        ctx.registry.on("user", "profile", user);

        let hostile = json!({
            "name": "mallory",
            "__id": "admin",
            "__event": "grant",
            "__origin": "http://trusted.test",
            "__postit": "other"
        });
        ctx.registry
            .emit("user", "profile", &ctx.handle(), &hostile, "*");
        settle().await;

        assert!(admin_calls.lock().is_empty());
        let calls = user_calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id(), "user");
        assert_eq!(calls[0].event(), "profile");
        assert_eq!(calls[0].tag(), "postit");
        assert_eq!(calls[0].sender_origin(), VICTIM);
        assert_eq!(calls[0].get("name"), Some(&json!("mallory")));
    }

    #[tokio::test]
    async fn test_forged_origin_is_visible_to_listener() {
        let hub = InMemoryTransport::new();
        let victim = Context::connect(&hub, VICTIM);
        let attacker = hub.connect(ATTACKER).unwrap();
        let (listener, calls) = recorder();

        victim.registry.add("foo");
        victim.registry.on("foo", "foo.bar", listener);

        // Knows the tag and the identifier, lies about where it comes from
        let forged = json!({
            "__postit": "postit",
            "__event": "foo.bar",
            "__id": "foo",
            "__origin": VICTIM,
            "amount": 1_000_000
        });
        attacker.send_message(forged.to_string(), &victim.handle(), VICTIM);
        settle().await;

        // Delivered, but the transport origin tells the truth
        let calls = calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].sender_origin(), VICTIM);
        assert_eq!(calls[0].origin, ATTACKER);
        assert_eq!(calls[0].source, Some(attacker.handle()));
    }

    #[tokio::test]
    async fn test_attacker_cannot_read_with_wrong_target_origin() {
        let hub = InMemoryTransport::new();
        let victim = Context::connect(&hub, VICTIM);
        let attacker = Context::connect(&hub, ATTACKER);
        let (listener, calls) = recorder();

        attacker.registry.add("secret");
        attacker.registry.on("secret", WILDCARD, listener);

        // The victim addresses the attacker's handle but pins its own peer origin
        victim.registry.add("secret");
        victim.registry.emit(
            "secret",
            "token",
            &attacker.handle(),
            &json!({ "token": "s3cr3t" }),
            "http://partner.test",
        );
        settle().await;

        assert!(calls.lock().is_empty());
    }
}
