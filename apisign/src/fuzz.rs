//! Deterministic replacement of nested objects by their bare id.
//!
//! Some endpoints accept either a full object or only its id for a field.
//! Whether a payload is rewritten depends only on its content, so the same
//! payload always produces the same request.

use log::warn;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// SHA-256 over the content of `data`, independent of key insertion order.
///
/// Mapping keys are visited sorted, each key hashed before its value.
/// Sequence elements are hashed by their canonical string form in sorted
/// order. Scalars hash their string form, strings without quotes.
pub fn content_digest(data: &Map<String, Value>) -> [u8; 32] {
    let mut h = Sha256::new();
    update_map(data, &mut h);
    h.finalize().into()
}

fn update_map(map: &Map<String, Value>, h: &mut Sha256) {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    for (k, v) in entries {
        h.update(k.as_bytes());
        update_value(v, h);
    }
}

fn update_value(v: &Value, h: &mut Sha256) {
    match v {
        Value::Object(map) => update_map(map, h),
        Value::Array(items) => {
            let mut items: Vec<String> = items.iter().map(scalar_string).collect();
            items.sort();
            for item in items {
                h.update(item.as_bytes());
            }
        }
        _ => h.update(scalar_string(v).as_bytes()),
    }
}

fn scalar_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => canonical_json(other),
    }
}

/// JSON text with object keys sorted at every level.
fn canonical_json(v: &Value) -> String {
    match v {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let fields: Vec<String> = entries
                .into_iter()
                .map(|(k, v)| format!("{}:{}", Value::String(k.clone()), canonical_json(v)))
                .collect();
            format!("{{{}}}", fields.join(","))
        }
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        other => other.to_string(),
    }
}

/// Replace top level objects carrying an `id` by that id, each with
/// `probability`.
///
/// The generator is ChaCha8 seeded from [`content_digest`], so decisions
/// stay the same across releases. It draws once per candidate, in sorted
/// key order. Values without an `id` are never touched and consume no draw.
pub fn fuzz_ids(mut data: Map<String, Value>, probability: f64) -> Map<String, Value> {
    if probability <= 0.0 {
        return data;
    }

    let mut rng = ChaCha8Rng::from_seed(content_digest(&data));

    let mut keys: Vec<String> = data
        .iter()
        .filter(|(_, v)| v.get("id").is_some() && v.is_object())
        .map(|(k, _)| k.clone())
        .collect();
    keys.sort();

    for key in keys {
        if rng.gen::<f64>() >= probability {
            continue;
        }
        let Some(id) = data.get(&key).and_then(|v| v.get("id")).cloned() else {
            continue;
        };
        warn!("using bare ID for `{key}` (ID: `{id}`)");
        data.insert(key, id);
    }

    data
}
