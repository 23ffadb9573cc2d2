//! Annotation emitter
//!
//! Writes confirmed entities and relations into an output view, each with
//! a fresh identifier from the run's generator.

use spotlink_core::{vocabulary, Annotation, IdentifierGenerator, View};

use crate::{LinkedEntity, Relation};

pub const ENTITY_PREFIX: &str = "ne";
pub const RELATION_PREFIX: &str = "rel";

pub struct AnnotationEmitter<'a> {
    view: &'a mut View,
    ids: &'a mut IdentifierGenerator,
    /// Nested sub-document the annotations belong to
    document: Option<&'a str>,
}

impl<'a> AnnotationEmitter<'a> {
    pub fn new(
        view: &'a mut View,
        ids: &'a mut IdentifierGenerator,
        document: Option<&'a str>,
    ) -> Self {
        Self {
            view,
            ids,
            document,
        }
    }

    /// Emit a named-entity annotation; returns its identifier
    pub fn emit_entity(&mut self, entity: &LinkedEntity) -> String {
        let id = self.ids.next(ENTITY_PREFIX);
        let annotation = self.view.new_annotation(vocabulary::NAMED_ENTITY, id.clone());
        anchor(annotation, self.document);

        annotation.add_property("start", entity.span.start);
        annotation.add_property("end", entity.span.end);
        annotation.add_property("text", entity.text.as_str());
        annotation.add_property("kb_category", entity.kb_category.as_str());
        annotation.add_property("kb_id", entity.kb_id.as_str());
        if let Some(category) = &entity.upstream_category {
            annotation.add_property("category", category.as_str());
        }
        id
    }

    /// Emit a relation annotation; returns its identifier
    pub fn emit_relation(&mut self, relation: &Relation) -> String {
        let id = self.ids.next(RELATION_PREFIX);
        let annotation = self.view.new_annotation(vocabulary::RELATION, id.clone());
        anchor(annotation, self.document);

        annotation.add_property("rel_text", relation.governor_text.as_str());
        annotation.add_property("rel_lemma", relation.governor_lemma.as_str());
        annotation.add_property("rel_start", relation.governor.start);
        annotation.add_property("rel_end", relation.governor.end);
        for (prefix, entity, dep) in [
            ("e1", &relation.first, &relation.first_dep),
            ("e2", &relation.second, &relation.second_dep),
        ] {
            annotation.add_property(&format!("{prefix}_text"), entity.text.as_str());
            annotation.add_property(&format!("{prefix}_kb_id"), entity.kb_id.as_str());
            annotation.add_property(&format!("{prefix}_dep"), dep.as_str());
            annotation.add_property(&format!("{prefix}_start"), entity.span.start);
            annotation.add_property(&format!("{prefix}_end"), entity.span.end);
        }
        id
    }
}

fn anchor(annotation: &mut Annotation, document: Option<&str>) {
    if let Some(doc_id) = document {
        annotation.add_property("document", doc_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KbCategory;
    use serde_json::json;
    use spotlink_core::Span;

    fn bob() -> LinkedEntity {
        LinkedEntity {
            span: Span::new(0, 3),
            text: "Bob".to_string(),
            kb_category: KbCategory::Person,
            kb_id: "http://dbpedia.org/resource/Bob".to_string(),
            upstream_category: Some("PERSON".to_string()),
        }
    }

    #[test]
    fn test_entity_properties() {
        let mut view = View::new("v_1");
        let mut ids = IdentifierGenerator::new();
        let id = AnnotationEmitter::new(&mut view, &mut ids, None).emit_entity(&bob());

        assert_eq!(id, "ne1");
        let annotation = &view.annotations[0];
        assert_eq!(annotation.at_type, vocabulary::NAMED_ENTITY);
        assert_eq!(annotation.id(), Some("ne1"));
        assert_eq!(annotation.span(), Some(Span::new(0, 3)));
        assert_eq!(annotation.get_str("kb_category"), Some("Person"));
        assert_eq!(annotation.get_str("category"), Some("PERSON"));
        assert_eq!(annotation.document(), None);
    }

    #[test]
    fn test_relation_properties_with_document() {
        let guitar = LinkedEntity {
            span: Span::new(10, 16),
            text: "guitar".to_string(),
            kb_category: KbCategory::Device,
            kb_id: "http://dbpedia.org/resource/Guitar".to_string(),
            upstream_category: None,
        };
        let relation = Relation {
            governor: Span::new(4, 9),
            governor_text: "plays".to_string(),
            governor_lemma: "play".to_string(),
            first: bob(),
            first_dep: "nsubj".to_string(),
            second: guitar,
            second_dep: "dobj".to_string(),
        };

        let mut view = View::new("v_1");
        let mut ids = IdentifierGenerator::new();
        let mut emitter = AnnotationEmitter::new(&mut view, &mut ids, Some("v_2:td1"));
        emitter.emit_entity(&bob());
        let id = emitter.emit_relation(&relation);

        assert_eq!(id, "rel1");
        let annotation = &view.annotations[1];
        assert_eq!(annotation.at_type, vocabulary::RELATION);
        assert_eq!(annotation.document(), Some("v_2:td1"));
        assert_eq!(annotation.get("rel_start"), Some(&json!(4)));
        assert_eq!(annotation.get_str("e1_dep"), Some("nsubj"));
        assert_eq!(annotation.get_str("e2_text"), Some("guitar"));
        assert_eq!(annotation.get("e2_end"), Some(&json!(16)));
    }
}
