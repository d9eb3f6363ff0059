//! Entity extraction and co-occurrence relationships.
//!
//! Two entities are related when their start offsets are closer than
//! [`CO_OCCURRENCE_WINDOW`]; confidence falls off linearly with distance and
//! never drops below [`MIN_CONFIDENCE`].

use tracing::{debug, error, instrument, warn};

use madforge_shared::{Entity, EntityMap, EntityTagger, RelationKind, Relationship, RelationshipMap};

pub const CO_OCCURRENCE_WINDOW: usize = 50;
pub const MIN_CONFIDENCE: f64 = 0.1;

pub fn entity_id(start: usize, end: usize) -> String {
    format!("entity_{start}_{end}")
}

pub fn relationship_id(from: &str, to: &str) -> String {
    format!("rel_{from}_{to}")
}

/// Confidence for two entities `distance` apart, or `None` outside the window.
pub fn co_occurrence_confidence(distance: usize) -> Option<f64> {
    (distance < CO_OCCURRENCE_WINDOW)
        .then(|| (1.0 - distance as f64 / CO_OCCURRENCE_WINDOW as f64).max(MIN_CONFIDENCE))
}

/// Tag `full_text` and derive the co-occurrence graph.
///
/// Without a tagger, or when the tagger fails, both maps are empty.
#[instrument(skip_all, fields(chars = full_text.len()))]
pub fn derive(full_text: &str, tagger: Option<&dyn EntityTagger>) -> (EntityMap, RelationshipMap) {
    let Some(tagger) = tagger else {
        debug!("no entity tagger configured");
        return Default::default();
    };

    let spans = match tagger.tag(full_text) {
        Ok(spans) => spans,
        Err(e) => {
            error!(tagger = tagger.name(), error = %e, "entity tagging failed");
            return Default::default();
        }
    };

    // Enumeration order is the tagger's discovery order.
    let mut ordered: Vec<Entity> = Vec::with_capacity(spans.len());
    let mut entities = EntityMap::new();

    for span in spans {
        let id = entity_id(span.start, span.end);
        if entities.contains_key(&id) {
            warn!(%id, text = %span.text, "duplicate entity span, keeping the first");
            continue;
        }

        let confidence = span
            .confidence
            .filter(|c| c.is_finite())
            .unwrap_or(1.0)
            .clamp(0.0, 1.0);

        let entity = Entity {
            id: id.clone(),
            description: tagger.describe_label(&span.label),
            text: span.text,
            label: span.label,
            start: span.start,
            end: span.end,
            confidence,
        };
        ordered.push(entity.clone());
        entities.insert(id, entity);
    }

    let mut relationships = RelationshipMap::new();
    for (i, a) in ordered.iter().enumerate() {
        for b in &ordered[i + 1..] {
            let distance = a.start.abs_diff(b.start);
            let Some(confidence) = co_occurrence_confidence(distance) else {
                continue;
            };
            let id = relationship_id(&a.id, &b.id);
            relationships.insert(
                id.clone(),
                Relationship {
                    id,
                    from: a.id.clone(),
                    to: b.id.clone(),
                    kind: RelationKind::CoOccurs,
                    distance,
                    confidence,
                },
            );
        }
    }

    debug!(
        entities = entities.len(),
        relationships = relationships.len(),
        "entity graph derived"
    );

    (entities, relationships)
}
