//! Exhaustive squared-L2 index over fixed-dimension `f32` vectors
//!
//! Reads and writes the flat-L2 index file format produced by the
//! ingestion batch job (`IxF2` fourcc, little-endian header, raw floats).

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::errors::{Result, TutorError};
use crate::index::{Neighbor, VectorIndex};

const FLAT_L2_FOURCC: &[u8; 4] = b"IxF2";

/// Reserved header words written by the index builder
const RESERVED_HEADER_WORD: i64 = 1 << 20;

/// Metric tag for L2
const METRIC_L2: i32 = 1;

const FLOAT_BYTES: usize = std::mem::size_of::<f32>();

/// Flat (brute force) L2 index; rows are stored contiguously
#[derive(Debug, Clone, PartialEq)]
pub struct FlatL2Index {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatL2Index {
    /// Build from rows; the first row fixes the dimension
    pub fn from_vectors<I, V>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: AsRef<[f32]>,
    {
        let mut dimension = None;
        let mut data = Vec::new();

        for row in rows {
            let row = row.as_ref();
            let expected = *dimension.get_or_insert(row.len());
            if row.len() != expected {
                return Err(TutorError::DimensionMismatch {
                    expected,
                    actual: row.len(),
                });
            }
            data.extend_from_slice(row);
        }

        match dimension {
            Some(0) | None => Err(TutorError::IndexFormat(
                "cannot build an index without vectors".to_string(),
            )),
            Some(dimension) => Ok(Self { dimension, data }),
        }
    }

    /// Row `position` as a slice
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dimension)?;
        self.data.get(start..start + self.dimension)
    }

    /// Load an index file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TutorError::MissingResource(path.display().to_string()));
        }
        let mut reader = BufReader::new(File::open(path)?);
        Self::read_from(&mut reader)
    }

    /// Save to an index file
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut fourcc = [0u8; 4];
        reader.read_exact(&mut fourcc)?;
        if &fourcc != FLAT_L2_FOURCC {
            return Err(TutorError::IndexFormat(format!(
                "unsupported index type {:?}",
                String::from_utf8_lossy(&fourcc)
            )));
        }

        let dimension = reader.read_i32::<LittleEndian>()?;
        let total = reader.read_i64::<LittleEndian>()?;
        let _reserved = reader.read_i64::<LittleEndian>()?;
        let _reserved = reader.read_i64::<LittleEndian>()?;
        let _is_trained = reader.read_u8()?;
        let metric = reader.read_i32::<LittleEndian>()?;

        if dimension <= 0 || total < 0 {
            return Err(TutorError::IndexFormat(format!(
                "bad header: d={} ntotal={}",
                dimension, total
            )));
        }
        if metric != METRIC_L2 {
            return Err(TutorError::IndexFormat(format!(
                "expected L2 metric, found {}",
                metric
            )));
        }

        let dimension = dimension as usize;
        let float_count = reader.read_u64::<LittleEndian>()?;
        let expected = usize::try_from(total)
            .ok()
            .and_then(|total| total.checked_mul(dimension))
            .ok_or_else(|| {
                TutorError::IndexFormat(format!(
                    "header overflows: d={} ntotal={}",
                    dimension, total
                ))
            })?;
        if usize::try_from(float_count).ok() != Some(expected) {
            return Err(TutorError::IndexFormat(format!(
                "payload holds {} floats, header implies {}",
                float_count, expected
            )));
        }
        let byte_len = expected
            .checked_mul(FLOAT_BYTES)
            .ok_or_else(|| TutorError::IndexFormat(format!("payload of {} floats is too large", expected)))?;

        // Grows with the bytes actually present, never with the header's claim.
        let mut bytes = Vec::new();
        reader.by_ref().take(byte_len as u64).read_to_end(&mut bytes)?;
        if bytes.len() != byte_len {
            return Err(TutorError::IndexFormat(format!(
                "payload truncated: {} of {} bytes",
                bytes.len(),
                byte_len
            )));
        }

        let mut data = vec![0f32; expected];
        LittleEndian::read_f32_into(&bytes, &mut data);

        Ok(Self { dimension, data })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(FLAT_L2_FOURCC)?;
        writer.write_i32::<LittleEndian>(self.dimension as i32)?;
        writer.write_i64::<LittleEndian>(self.len() as i64)?;
        writer.write_i64::<LittleEndian>(RESERVED_HEADER_WORD)?;
        writer.write_i64::<LittleEndian>(RESERVED_HEADER_WORD)?;
        writer.write_u8(1)?;
        writer.write_i32::<LittleEndian>(METRIC_L2)?;
        writer.write_u64::<LittleEndian>(self.data.len() as u64)?;
        for value in &self.data {
            writer.write_f32::<LittleEndian>(*value)?;
        }
        Ok(())
    }
}

/// Squared Euclidean distance
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}

impl VectorIndex for FlatL2Index {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.data.len() / self.dimension
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dimension {
            return Err(TutorError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut neighbors: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, row)| Neighbor {
                position,
                distance: squared_l2(row, query),
            })
            .collect();

        // Ties resolve by position so results are deterministic.
        neighbors.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(Ordering::Equal)
                .then(a.position.cmp(&b.position))
        });
        neighbors.truncate(k);
        Ok(neighbors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;
    use std::collections::HashSet;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn sample_index() -> FlatL2Index {
        FlatL2Index::from_vectors(vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 2.0],
            vec![3.0, 3.0],
            vec![-1.0, -1.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_build_fixes_dimension() {
        let index = sample_index();
        assert_eq!(index.dimension(), 2);
        assert_eq!(index.len(), 5);
        assert_eq!(index.vector(2), Some(&[0.0, 2.0][..]));
        assert_eq!(index.vector(5), None);
    }

    #[test]
    fn test_build_rejects_mismatched_row() {
        let result = FlatL2Index::from_vectors(vec![vec![0.0, 1.0], vec![1.0, 2.0, 3.0]]);
        assert!(matches!(
            result,
            Err(TutorError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_build_rejects_empty() {
        let rows: Vec<Vec<f32>> = Vec::new();
        assert!(FlatL2Index::from_vectors(rows).is_err());
    }

    #[test]
    fn test_search_orders_by_distance() {
        let index = sample_index();
        let results = index.search(&[0.9, 0.1], 3).unwrap();

        let positions: Vec<usize> = results.iter().map(|n| n.position).collect();
        assert_eq!(positions, vec![1, 0, 2]);
        assert!((results[0].distance - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_search_k_larger_than_index() {
        let index = sample_index();
        assert_eq!(index.search(&[0.0, 0.0], 50).unwrap().len(), 5);
        assert!(index.search(&[0.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_search_rejects_wrong_dimension() {
        let index = sample_index();
        assert!(matches!(
            index.search(&[0.0, 0.0, 0.0], 1),
            Err(TutorError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_ties_break_by_position() {
        let index = FlatL2Index::from_vectors(vec![vec![1.0], vec![-1.0], vec![1.0]]).unwrap();
        let positions: Vec<usize> = index
            .search(&[0.0], 3)
            .unwrap()
            .into_iter()
            .map(|n| n.position)
            .collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_binary_roundtrip_preserves_search() {
        let index = sample_index();
        let mut buffer = Vec::new();
        index.write_to(&mut buffer).unwrap();

        assert_eq!(&buffer[..4], b"IxF2");
        let restored = FlatL2Index::read_from(&mut Cursor::new(buffer)).unwrap();
        assert_eq!(restored, index);
    }

    #[test]
    fn test_read_rejects_other_index_types() {
        let mut bytes = b"IxHF".to_vec();
        bytes.extend_from_slice(&[0u8; 40]);
        let result = FlatL2Index::read_from(&mut Cursor::new(bytes));
        assert!(matches!(result, Err(TutorError::IndexFormat(_))));
    }

    #[test]
    fn test_read_rejects_truncated_payload() {
        let mut buffer = Vec::new();
        sample_index().write_to(&mut buffer).unwrap();
        buffer.truncate(buffer.len() - 4);

        assert!(FlatL2Index::read_from(&mut Cursor::new(buffer)).is_err());
    }

    fn header(dimension: i32, total: i64, float_count: u64) -> Vec<u8> {
        let mut bytes = b"IxF2".to_vec();
        bytes.write_i32::<LittleEndian>(dimension).unwrap();
        bytes.write_i64::<LittleEndian>(total).unwrap();
        bytes.write_i64::<LittleEndian>(RESERVED_HEADER_WORD).unwrap();
        bytes.write_i64::<LittleEndian>(RESERVED_HEADER_WORD).unwrap();
        bytes.write_u8(1).unwrap();
        bytes.write_i32::<LittleEndian>(METRIC_L2).unwrap();
        bytes.write_u64::<LittleEndian>(float_count).unwrap();
        bytes
    }

    #[test]
    fn test_read_rejects_overflowing_header() {
        let bytes = header(i32::MAX, i64::MAX, 0);
        let result = FlatL2Index::read_from(&mut Cursor::new(bytes));
        assert!(matches!(result, Err(TutorError::IndexFormat(ref msg)) if msg.contains("overflows")));

        let bytes = header(4, 1 << 62, 0);
        let result = FlatL2Index::read_from(&mut Cursor::new(bytes));
        assert!(matches!(result, Err(TutorError::IndexFormat(_))));
    }

    #[test]
    fn test_read_rejects_oversized_header() {
        // Consistent header claiming far more rows than the file holds.
        let total: i64 = 10_000_000_000;
        let mut bytes = header(384, total, 384 * total as u64);
        bytes.extend_from_slice(&[0u8; 64]);

        let result = FlatL2Index::read_from(&mut Cursor::new(bytes));
        assert!(matches!(result, Err(TutorError::IndexFormat(ref msg)) if msg.contains("truncated")));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("faiss_index.bin");

        sample_index().save(&path).unwrap();
        let loaded = FlatL2Index::load(&path).unwrap();
        assert_eq!(loaded.len(), 5);
    }

    #[test]
    fn test_load_missing_file() {
        let result = FlatL2Index::load(Path::new("/nonexistent/faiss_index.bin"));
        assert!(matches!(result, Err(TutorError::MissingResource(_))));
    }

    fn finite(values: Vec<i16>) -> Vec<f32> {
        values.into_iter().map(|v| v as f32 / 8.0).collect()
    }

    #[quickcheck]
    fn prop_search_bounded_sorted_unique(rows: Vec<(i16, i16, i16)>, query: (i16, i16, i16), k: u8) -> bool {
        if rows.is_empty() {
            return true;
        }
        let vectors: Vec<Vec<f32>> = rows
            .into_iter()
            .map(|(a, b, c)| finite(vec![a, b, c]))
            .collect();
        let index = FlatL2Index::from_vectors(&vectors).unwrap();
        let k = (k as usize % 12) + 1;

        let results = index
            .search(&finite(vec![query.0, query.1, query.2]), k)
            .unwrap();

        let unique: HashSet<usize> = results.iter().map(|n| n.position).collect();
        results.len() <= k
            && results.len() <= index.len()
            && unique.len() == results.len()
            && results.iter().all(|n| n.position < index.len())
            && results.windows(2).all(|w| w[0].distance <= w[1].distance)
    }

    #[quickcheck]
    fn prop_len_matches_rows(rows: Vec<(i16, i16)>) -> bool {
        if rows.is_empty() {
            return true;
        }
        let count = rows.len();
        let vectors: Vec<Vec<f32>> = rows.into_iter().map(|(a, b)| finite(vec![a, b])).collect();
        FlatL2Index::from_vectors(vectors).unwrap().len() == count
    }
}
