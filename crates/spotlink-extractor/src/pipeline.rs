//! Annotation pipeline
//!
//! Runs the whole confirmation and relation pass over an MMIF container:
//! every top-level text document gets its own output view, and every
//! pre-existing view holding nested text documents gets one output view
//! shared by those documents. Documents are processed one at a time, in
//! container order.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use spotlink_core::{
    vocabulary, Annotation, AnnotationConfig, AppConfig, Document, IdentifierGenerator, Mmif,
    SpotlinkError, View,
};
use spotlink_linker::{link_with_retry, EntityLinker, RetryPolicy, SpotlightClient};
use tokio_util::sync::CancellationToken;

use crate::aligner::EntityAligner;
use crate::casing::semi_truecase;
use crate::emitter::AnnotationEmitter;
use crate::index::SpanIndex;
use crate::offsets::TokenOffsets;
use crate::relation::DependencyRelationExtractor;
use crate::text::TextAccessor;
use crate::DependencyEdge;

pub const MMIF_VERSION: &str = "0.4.0";

// ============================================================================
// App metadata
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeSpec {
    #[serde(rename = "@type")]
    pub at_type: String,
}

impl TypeSpec {
    fn new(at_type: &str) -> Self {
        Self {
            at_type: at_type.to_string(),
        }
    }
}

/// Self-description served to clients of the annotation service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppMetadata {
    pub identifier: String,
    pub url: String,
    pub name: String,
    pub description: String,
    pub app_version: String,
    pub app_license: String,
    pub analyzer: String,
    pub mmif_version: String,
    pub input: Vec<TypeSpec>,
    pub output: Vec<TypeSpec>,
}

// ============================================================================
// Pipeline
// ============================================================================

/// Counts for one processed document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentSummary {
    pub entities: usize,
    pub relations: usize,
}

pub struct AnnotationPipeline {
    linker: Arc<dyn EntityLinker>,
    retry: RetryPolicy,
    options: AnnotationConfig,
    accessor: TextAccessor,
}

impl AnnotationPipeline {
    pub fn new(linker: Arc<dyn EntityLinker>, options: AnnotationConfig) -> Self {
        Self {
            linker,
            retry: RetryPolicy::default(),
            options,
            accessor: TextAccessor::new(),
        }
    }

    /// Pipeline backed by DBpedia Spotlight, configured from `config`
    pub fn from_config(config: &AppConfig) -> spotlink_core::Result<Self> {
        let linker = SpotlightClient::from_config(&config.linker)?;
        // remote documents share the linker's timeout
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.linker.timeout_secs))
            .build()
            .map_err(|e| SpotlinkError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self::new(Arc::new(linker), config.annotation.clone())
            .with_retry(RetryPolicy::from_config(&config.retry))
            .with_accessor(TextAccessor::with_client(client)))
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_accessor(mut self, accessor: TextAccessor) -> Self {
        self.accessor = accessor;
        self
    }

    pub fn options(&self) -> &AnnotationConfig {
        &self.options
    }

    pub fn app_metadata(&self) -> AppMetadata {
        let mut input = vec![TypeSpec::new(vocabulary::TEXT_DOCUMENT)];
        let mut output = vec![TypeSpec::new(vocabulary::NAMED_ENTITY)];
        if self.options.semi_truecase {
            input.push(TypeSpec::new(vocabulary::NAMED_ENTITY));
        }
        if self.options.extract_relations {
            input.push(TypeSpec::new(vocabulary::DEPENDENCY));
            output.push(TypeSpec::new(vocabulary::RELATION));
        }

        AppMetadata {
            identifier: self.options.app_identifier.clone(),
            url: "https://github.com/hephaex/spotlink".to_string(),
            name: "Spotlink DBpedia entity linker".to_string(),
            description: "Link named entities in an MMIF file with their DBpedia information."
                .to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            app_license: "Apache-2.0".to_string(),
            analyzer: "DBpedia Spotlight".to_string(),
            mmif_version: MMIF_VERSION.to_string(),
            input,
            output,
        }
    }

    /// Parse, annotate and re-serialize an MMIF JSON string
    pub async fn annotate_json(
        &self,
        json: &str,
        pretty: bool,
        cancel: &CancellationToken,
    ) -> spotlink_core::Result<String> {
        let mmif = Mmif::from_json(json)?;
        let annotated = self.annotate(mmif, cancel).await?;
        Ok(annotated.to_json(pretty)?)
    }

    /// Add output views for every text document in `mmif`
    pub async fn annotate(
        &self,
        mut mmif: Mmif,
        cancel: &CancellationToken,
    ) -> spotlink_core::Result<Mmif> {
        // identifiers are unique across the whole run, not per document
        let mut ids = IdentifierGenerator::new();
        let mut total = DocumentSummary::default();
        let mut documents = 0;

        let top_level: Vec<Document> = mmif.text_documents().into_iter().cloned().collect();
        for doc in &top_level {
            let upstream = self.upstream_layers(&mmif, doc.id());
            let view_index = self.open_view(&mut mmif, Some(doc.id()));
            let view = &mut mmif.views[view_index];
            let summary = self
                .process_document(doc, None, upstream, view, &mut ids, cancel)
                .await?;
            total.entities += summary.entities;
            total.relations += summary.relations;
            documents += 1;
        }

        let containers: Vec<(String, Vec<Document>)> = mmif
            .views
            .iter()
            .map(|v| (v.id.clone(), mmif.documents_in_view(&v.id)))
            .filter(|(_, docs)| !docs.is_empty())
            .collect();

        for (view_id, docs) in containers {
            let view_index = self.open_view(&mut mmif, None);
            for doc in &docs {
                let doc_id = format!("{view_id}:{}", doc.id());
                let upstream = self.upstream_layers(&mmif, &doc_id);
                let view = &mut mmif.views[view_index];
                let summary = self
                    .process_document(doc, Some(&doc_id), upstream, view, &mut ids, cancel)
                    .await?;
                total.entities += summary.entities;
                total.relations += summary.relations;
                documents += 1;
            }
        }

        tracing::info!(
            documents,
            entities = total.entities,
            relations = total.relations,
            "Annotation run complete"
        );
        Ok(mmif)
    }

    async fn process_document(
        &self,
        doc: &Document,
        doc_id: Option<&str>,
        upstream: UpstreamLayers,
        view: &mut View,
        ids: &mut IdentifierGenerator,
        cancel: &CancellationToken,
    ) -> spotlink_core::Result<DocumentSummary> {
        let text = self.accessor.read_text(doc).await?;
        let document = doc_id.unwrap_or(doc.id());

        let index = if self.options.semi_truecase {
            Some(match &upstream.entities {
                Some(annotations) => SpanIndex::build(annotations, doc_id),
                None => {
                    tracing::warn!(document, "No upstream named-entity layer; nothing can be confirmed");
                    SpanIndex::new()
                }
            })
        } else {
            None
        };

        let input_text = match &index {
            Some(index) => semi_truecase(&text, index),
            None => text.clone(),
        };

        let output = link_with_retry(self.linker.as_ref(), &input_text, &self.retry, cancel).await?;
        let offsets = TokenOffsets::from_tokens(&output.tokens);

        let chars: Vec<char> = text.chars().collect();
        let entities = EntityAligner::new(&chars, index.as_ref()).align(&output, &offsets);

        let mut emitter = AnnotationEmitter::new(view, ids, doc_id);
        for entity in &entities {
            emitter.emit_entity(entity);
        }

        let mut summary = DocumentSummary {
            entities: entities.len(),
            relations: 0,
        };

        if self.options.extract_relations && !entities.is_empty() {
            match &upstream.dependencies {
                Some(annotations) => {
                    let edges: Vec<DependencyEdge> = annotations
                        .iter()
                        .filter(|a| doc_id.map_or(true, |id| a.document() == Some(id)))
                        .filter_map(DependencyEdge::from_annotation)
                        .collect();
                    let relations = DependencyRelationExtractor::new(&entities).extract(&edges);
                    for relation in &relations {
                        emitter.emit_relation(relation);
                    }
                    summary.relations = relations.len();
                }
                None => tracing::debug!(document, "No dependency layer; relations skipped"),
            }
        }

        tracing::debug!(
            document,
            linker_entities = output.entities.len(),
            entities = summary.entities,
            relations = summary.relations,
            "Document annotated"
        );
        Ok(summary)
    }

    /// Append a signed output view declaring what this run produces
    fn open_view(&self, mmif: &mut Mmif, doc_id: Option<&str>) -> usize {
        let view = mmif.new_view();
        view.sign(&self.options.app_identifier);
        view.new_contain(vocabulary::NAMED_ENTITY, doc_id);
        if self.options.extract_relations {
            view.new_contain(vocabulary::RELATION, doc_id);
        }
        mmif.views.len() - 1
    }

    fn upstream_layers(&self, mmif: &Mmif, doc_id: &str) -> UpstreamLayers {
        let views = mmif.views_for_document(doc_id);
        UpstreamLayers {
            entities: self
                .options
                .semi_truecase
                .then(|| self.latest_layer(&views, vocabulary::NAMED_ENTITY))
                .flatten(),
            dependencies: self
                .options
                .extract_relations
                .then(|| self.latest_layer(&views, vocabulary::DEPENDENCY))
                .flatten(),
        }
    }

    /// Annotations of `at_type` from the most recent foreign view declaring it
    fn latest_layer(&self, views: &[&View], at_type: &str) -> Option<Vec<Annotation>> {
        views
            .iter()
            .rev()
            .find(|v| v.contains_type(at_type) && v.metadata.app != self.options.app_identifier)
            .map(|v| v.annotations_of_type(at_type).cloned().collect())
    }
}

/// Upstream annotations a document is processed against
#[derive(Debug, Default)]
struct UpstreamLayers {
    entities: Option<Vec<Annotation>>,
    dependencies: Option<Vec<Annotation>>,
}
