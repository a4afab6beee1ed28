/// BM25 scoring implementation
///
/// Formula:
/// BM25 = Σ(t∈q) ln((N - f_t + 0.5) / (f_t + 0.5) + 1) * TF_BM25
///
/// where TF_BM25 = (f_t,d * (k1 + 1)) / (f_t,d + k1 * ((1 - b) + (b * ℓ_d / ℓ_avg)))

/// BM25 parameters
pub struct BM25Params {
    pub k1: f32, // Term frequency saturation parameter (typical: 1.2)
    pub b: f32,  // Length normalization parameter (typical: 0.75)
}

impl Default for BM25Params {
    fn default() -> Self {
        BM25Params { k1: 1.2, b: 0.75 }
    }
}

/// Compute IDF component for a term
/// IDF = ln((N - f_t + 0.5) / (f_t + 0.5) + 1)
///
/// # Arguments
/// * `n` - Total number of documents (N)
/// * `f_t` - Number of documents containing term t (document frequency)
pub fn compute_idf(n: u64, f_t: u64) -> f32 {
    let n = n as f32;
    let f_t = f_t as f32;

    (((n - f_t + 0.5) / (f_t + 0.5)) + 1.0).ln()
}

/// Compute TF component for BM25
/// TF_BM25 = (f_t,d * (k1 + 1)) / (f_t,d + k1 * ((1 - b) + (b * ℓ_d / ℓ_avg)))
///
/// # Arguments
/// * `f_td` - Term frequency in document (f_t,d)
/// * `doc_len` - Document length (ℓ_d)
/// * `avg_doc_len` - Average document length (ℓ_avg)
/// * `params` - BM25 parameters (k1, b)
pub fn compute_tf_bm25(f_td: u32, doc_len: u32, avg_doc_len: f32, params: &BM25Params) -> f32 {
    let f_td = f_td as f32;
    let doc_len = doc_len as f32;
    let k1 = params.k1;
    let b = params.b;

    let numerator = f_td * (k1 + 1.0);
    let denominator = f_td + k1 * ((1.0 - b) + (b * doc_len / avg_doc_len));
    if denominator == 0.0 {
        return 0.0;
    }

    numerator / denominator
}
