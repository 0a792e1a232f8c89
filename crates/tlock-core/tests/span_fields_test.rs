//! Encrypt and decrypt spans carry the round and chain hash.

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::Subscriber;
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

use tlock_core::{timelock_decrypt, timelock_encrypt, SchemeId};
use tlock_harness::MockChainClient;

/// `(span name, field, value)` for every field a span was given.
#[derive(Clone, Default)]
struct SpanFields(Arc<Mutex<Vec<(String, String, String)>>>);

impl SpanFields {
    fn get(&self, span: &str, field: &str) -> Option<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(s, f, _)| s == span && f == field)
            .map(|(_, _, v)| v.clone())
    }
}

struct Collect<'a> {
    span: &'static str,
    out: &'a mut Vec<(String, String, String)>,
}

impl Visit for Collect<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.out
            .push((self.span.to_string(), field.name().to_string(), value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.out
            .push((self.span.to_string(), field.name().to_string(), format!("{value:?}")));
    }
}

impl<S> Layer<S> for SpanFields
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
        let mut out = self.0.lock().unwrap();
        attrs.record(&mut Collect {
            span: attrs.metadata().name(),
            out: &mut out,
        });
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id) {
            let mut out = self.0.lock().unwrap();
            values.record(&mut Collect {
                span: span.name(),
                out: &mut out,
            });
        }
    }
}

#[tokio::test]
async fn spans_record_round_and_chain() {
    let fields = SpanFields::default();
    let _guard = tracing_subscriber::registry()
        .with(fields.clone())
        .set_default();

    let client = MockChainClient::new(SchemeId::BlsUnchainedG1Rfc9380).unwrap();
    let chain = client.chain_info().hash_hex();

    let armored = timelock_encrypt(77, b"ballot", &client).await.unwrap();
    assert_eq!(fields.get("tlock::encrypt", "round").as_deref(), Some("77"));
    assert_eq!(fields.get("tlock::encrypt", "chain"), Some(chain.clone()));

    timelock_decrypt(armored.as_bytes(), &client).await.unwrap();
    assert_eq!(fields.get("tlock::decrypt", "round").as_deref(), Some("77"));
    assert_eq!(fields.get("tlock::decrypt", "chain"), Some(chain));
}
