use crate::StorageError;
use serde::{Deserialize, Serialize};

/// Vector blobs are packed little-endian `f32`s.
pub const VECTOR_FORMAT_F32_LE: i64 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CodeRow {
    pub id: i64,
    pub classifier_type: String,
    pub code: String,
    pub description: String,
    pub category: String,
    pub description_hash: String,
    pub vector: Option<Vec<u8>>,
    pub vector_dim: Option<i64>,
    pub vector_format: i64,
    pub model_id: Option<String>,
    pub embedded_at: Option<i64>,
}

impl CodeRow {
    /// Decodes the stored vector, `None` when the row has not been embedded.
    pub fn decode_vector(&self) -> Result<Option<Vec<f32>>, StorageError> {
        let Some(blob) = &self.vector else {
            return Ok(None);
        };
        if self.vector_format != VECTOR_FORMAT_F32_LE {
            return Err(StorageError::UnsupportedVectorFormat {
                classifier_type: self.classifier_type.clone(),
                code: self.code.clone(),
                format: self.vector_format,
            });
        }
        let vector = decode_vector(blob).map_err(|reason| StorageError::CorruptVector {
            classifier_type: self.classifier_type.clone(),
            code: self.code.clone(),
            reason,
        })?;
        if let Some(dim) = self.vector_dim {
            if dim as usize != vector.len() {
                return Err(StorageError::CorruptVector {
                    classifier_type: self.classifier_type.clone(),
                    code: self.code.clone(),
                    reason: format!("header says {} components, blob has {}", dim, vector.len()),
                });
            }
        }
        Ok(Some(vector))
    }
}

pub fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|x| x.to_le_bytes()).collect()
}

pub fn decode_vector(blob: &[u8]) -> Result<Vec<f32>, String> {
    if blob.len() % 4 != 0 {
        return Err(format!("blob length {} is not a multiple of 4", blob.len()));
    }
    Ok(blob
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}
