use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Copy, Debug)]
pub struct Bm25Params {
	pub k1: f32,
	pub b: f32,
	/// Fraction of the mean idf used for terms whose raw idf is negative.
	pub epsilon: f32,
}
impl Default for Bm25Params {
	fn default() -> Self {
		Self { k1: 1.5, b: 0.75, epsilon: 0.25 }
	}
}

/// Okapi BM25 over pre-tokenized documents.
#[derive(Clone, Debug)]
pub struct Bm25Index {
	params: Bm25Params,
	term_freqs: Vec<HashMap<String, u32>>,
	doc_lens: Vec<f32>,
	avg_doc_len: f32,
	idf: HashMap<String, f32>,
}
impl Bm25Index {
	pub fn new(docs: &[Vec<String>], params: Bm25Params) -> Self {
		let mut term_freqs = Vec::with_capacity(docs.len());
		let mut doc_lens = Vec::with_capacity(docs.len());
		let mut doc_freqs: BTreeMap<String, u32> = BTreeMap::new();
		let mut total_len = 0_usize;

		for doc in docs {
			let mut freqs: HashMap<String, u32> = HashMap::new();

			for term in doc {
				*freqs.entry(term.clone()).or_insert(0) += 1;
			}
			for term in freqs.keys() {
				*doc_freqs.entry(term.clone()).or_insert(0) += 1;
			}

			total_len += doc.len();

			doc_lens.push(doc.len() as f32);
			term_freqs.push(freqs);
		}

		let avg_doc_len = if docs.is_empty() { 0.0 } else { total_len as f32 / docs.len() as f32 };
		let idf = compute_idf(&doc_freqs, docs.len(), params.epsilon);

		Self { params, term_freqs, doc_lens, avg_doc_len, idf }
	}

	pub fn len(&self) -> usize {
		self.term_freqs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.term_freqs.is_empty()
	}

	pub fn idf(&self, term: &str) -> Option<f32> {
		self.idf.get(term).copied()
	}

	/// One score per document, in document order.
	pub fn scores(&self, query_terms: &[String]) -> Vec<f32> {
		let mut scores = vec![0.0_f32; self.len()];

		if query_terms.is_empty() || self.avg_doc_len <= 0.0 {
			return scores;
		}

		let Bm25Params { k1, b, .. } = self.params;

		for term in query_terms {
			let Some(idf) = self.idf.get(term).copied() else { continue };

			for (doc, score) in scores.iter_mut().enumerate() {
				let Some(tf) = self.term_freqs[doc].get(term).copied() else { continue };
				let tf = tf as f32;
				let length_norm = 1.0 - b + b * self.doc_lens[doc] / self.avg_doc_len;

				*score += idf * tf * (k1 + 1.0) / (tf + k1 * length_norm);
			}
		}

		scores
	}
}

fn compute_idf(
	doc_freqs: &BTreeMap<String, u32>,
	doc_count: usize,
	epsilon: f32,
) -> HashMap<String, f32> {
	let n = doc_count as f32;
	let mut idf = HashMap::with_capacity(doc_freqs.len());
	let mut idf_sum = 0.0_f32;
	let mut negative = Vec::new();

	// Sorted iteration keeps the idf sum identical across runs.
	for (term, freq) in doc_freqs {
		let freq = *freq as f32;
		let value = ((n - freq + 0.5) / (freq + 0.5)).ln();

		idf_sum += value;

		if value < 0.0 {
			negative.push(term.as_str());
		}

		idf.insert(term.clone(), value);
	}

	if idf.is_empty() {
		return idf;
	}

	// Matching a very common term never lowers a document's score.
	let floor = (epsilon * idf_sum / idf.len() as f32).max(0.0);

	for term in negative {
		idf.insert(term.to_string(), floor);
	}

	idf
}
