use std::{collections::HashMap, sync::Arc};

use qdrant_client::{
	client::Payload,
	qdrant::{
		Condition, DeletePointsBuilder, DenseVector, Filter, PointId, PointStruct, PointsIdsList,
		Query, QueryPointsBuilder, ScoredPoint, UpsertPointsBuilder, Value as QdrantValue, Vector,
		VectorsOutput, point_id::PointIdOptions, value::Kind, vector_output::Vector as VectorData,
		vectors_output::VectorsOptions,
	},
};
use serde_json::{Map, Number, Value};
use uuid::Uuid;

use crate::{
	BoxFuture, Candidate, EmbeddingProvider, Error, IndexFilter, IndexPoint, OWNER_KEY, Result,
	TYPE_KEY, VectorIndex,
};
use recall_config::EmbeddingProviderConfig;
use recall_storage::qdrant::{DENSE_VECTOR_NAME, QdrantStore};

/// Payload key holding the indexed text.
pub const TEXT_KEY: &str = "text";

/// Qdrant-backed vector index. Text is embedded through the configured provider.
pub struct QdrantIndex {
	qdrant: QdrantStore,
	embedding_cfg: EmbeddingProviderConfig,
	embedding: Arc<dyn EmbeddingProvider>,
}
impl QdrantIndex {
	pub fn new(
		qdrant: QdrantStore,
		embedding_cfg: EmbeddingProviderConfig,
		embedding: Arc<dyn EmbeddingProvider>,
	) -> Self {
		Self { qdrant, embedding_cfg, embedding }
	}

	async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
		let texts = [text.to_string()];
		let mut vectors = self.embedding.embed(&self.embedding_cfg, &texts).await?;

		vectors.pop().ok_or_else(|| Error::Provider {
			message: "Embedding provider returned no vector for the query.".to_string(),
		})
	}

	async fn run_query(
		&self,
		text: &str,
		top_k: u32,
		filter: IndexFilter<'_>,
		include_vectors: bool,
	) -> Result<Vec<Candidate>> {
		if top_k == 0 {
			return Ok(Vec::new());
		}

		let vector = self.embed_one(text).await?;
		let mut conditions = vec![Condition::matches(OWNER_KEY, filter.owner_id.to_string())];

		if let Some(kind) = filter.kind {
			conditions.push(Condition::matches(TYPE_KEY, kind.to_string()));
		}

		let search = QueryPointsBuilder::new(self.qdrant.collection.clone())
			.query(Query::new_nearest(vector))
			.using(DENSE_VECTOR_NAME)
			.filter(Filter::must(conditions))
			.with_payload(true)
			.with_vectors(include_vectors)
			.limit(u64::from(top_k));
		let response = self.qdrant.client.query(search).await?;
		let mut candidates = Vec::with_capacity(response.result.len());

		for (rank, point) in response.result.into_iter().enumerate() {
			match candidate_from_point(point, rank as u32) {
				Ok(candidate) => candidates.push(candidate),
				Err(err) => tracing::warn!(error = %err, rank, "Skipping index point."),
			}
		}

		Ok(candidates)
	}

	async fn run_upsert(&self, points: &[IndexPoint]) -> Result<()> {
		if points.is_empty() {
			return Ok(());
		}

		let texts = points.iter().map(|point| point.text.clone()).collect::<Vec<_>>();
		let vectors = self.embedding.embed(&self.embedding_cfg, &texts).await?;

		if vectors.len() != points.len() {
			return Err(Error::Provider {
				message: format!(
					"Embedding provider returned {} vectors for {} points.",
					vectors.len(),
					points.len()
				),
			});
		}

		let mut structs = Vec::with_capacity(points.len());

		for (point, vec) in points.iter().zip(vectors) {
			let mut payload_map = HashMap::with_capacity(point.metadata.len() + 1);

			for (key, value) in &point.metadata {
				payload_map.insert(key.clone(), QdrantValue::from(value.clone()));
			}

			payload_map.insert(TEXT_KEY.to_string(), QdrantValue::from(point.text.clone()));

			let mut named = HashMap::new();

			named.insert(DENSE_VECTOR_NAME.to_string(), Vector::from(vec));
			structs.push(PointStruct::new(point.id.to_string(), named, Payload::from(payload_map)));
		}

		self.qdrant
			.client
			.upsert_points(
				UpsertPointsBuilder::new(self.qdrant.collection.clone(), structs).wait(true),
			)
			.await?;

		Ok(())
	}

	async fn run_delete(&self, ids: &[Uuid]) -> Result<()> {
		if ids.is_empty() {
			return Ok(());
		}

		let ids = ids.iter().map(|id| PointId::from(id.to_string())).collect();
		let delete = DeletePointsBuilder::new(self.qdrant.collection.clone())
			.points(PointsIdsList { ids })
			.wait(true);

		self.qdrant.client.delete_points(delete).await?;

		Ok(())
	}
}
impl VectorIndex for QdrantIndex {
	fn query<'a>(
		&'a self,
		text: &'a str,
		top_k: u32,
		filter: IndexFilter<'a>,
		include_vectors: bool,
	) -> BoxFuture<'a, Result<Vec<Candidate>>> {
		Box::pin(self.run_query(text, top_k, filter, include_vectors))
	}

	fn upsert<'a>(&'a self, points: &'a [IndexPoint]) -> BoxFuture<'a, Result<()>> {
		Box::pin(self.run_upsert(points))
	}

	fn delete<'a>(&'a self, ids: &'a [Uuid]) -> BoxFuture<'a, Result<()>> {
		Box::pin(self.run_delete(ids))
	}
}

fn candidate_from_point(point: ScoredPoint, rank: u32) -> Result<Candidate> {
	let id = point.id.as_ref().and_then(point_id_to_string).ok_or_else(|| {
		Error::MalformedCandidate { message: "Index point has no id.".to_string() }
	})?;
	let mut metadata = Map::new();
	let mut raw_text = None;

	for (key, value) in point.payload {
		if key == TEXT_KEY {
			if let Some(Kind::StringValue(text)) = value.kind {
				raw_text = Some(text);
			}

			continue;
		}

		metadata.insert(key, qdrant_to_json(value));
	}

	let raw_text = raw_text.ok_or_else(|| Error::MalformedCandidate {
		message: format!("Index point {id} has no text."),
	})?;

	Ok(Candidate {
		id,
		raw_text,
		base_relevance: clamp_similarity(point.score),
		metadata,
		embedding: point.vectors.and_then(dense_vector),
		retrieval_rank: rank,
	})
}

/// Cosine similarity from the index, folded into `[0, 1]`.
pub fn clamp_similarity(score: f32) -> f32 {
	if score.is_finite() { score.clamp(0.0, 1.0) } else { 0.0 }
}

fn point_id_to_string(point_id: &PointId) -> Option<String> {
	match point_id.point_id_options.as_ref()? {
		PointIdOptions::Uuid(id) => Some(id.clone()),
		PointIdOptions::Num(id) => Some(id.to_string()),
	}
}

fn dense_vector(vectors: VectorsOutput) -> Option<Vec<f32>> {
	let output = match vectors.vectors_options? {
		VectorsOptions::Vector(vector) => vector,
		VectorsOptions::Vectors(mut named) => named.vectors.remove(DENSE_VECTOR_NAME)?,
	};
	let VectorData::Dense(DenseVector { data }) = output.into_vector() else {
		return None;
	};

	(!data.is_empty()).then_some(data)
}

fn qdrant_to_json(value: QdrantValue) -> Value {
	match value.kind {
		None | Some(Kind::NullValue(_)) => Value::Null,
		Some(Kind::BoolValue(flag)) => Value::Bool(flag),
		Some(Kind::IntegerValue(number)) => Value::from(number),
		Some(Kind::DoubleValue(number)) =>
			Number::from_f64(number).map_or(Value::Null, Value::Number),
		Some(Kind::StringValue(text)) => Value::String(text),
		Some(Kind::ListValue(list)) =>
			Value::Array(list.values.into_iter().map(qdrant_to_json).collect()),
		Some(Kind::StructValue(object)) => Value::Object(
			object.fields.into_iter().map(|(key, value)| (key, qdrant_to_json(value))).collect(),
		),
	}
}
