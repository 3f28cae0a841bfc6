// ============================================================
// Layer 4 — Corpus Windowing Pipeline
// ============================================================
// Turns an ordered list of token files into an endless stream
// of fixed-shape (x, y) batches for truncated BPTT.
//
// Per file, in list order, cycling forever:
//
//   1. parse the ids                         n_words tokens
//   2. batch_len = n_words / batch_size      tail is dropped
//   3. reshape row-major to [batch_size, batch_len]
//        row b = ids[b*batch_len .. (b+1)*batch_len]
//   4. slide a num_steps-wide window, stride num_steps,
//      while i + num_steps < batch_len:
//        x = embed(data[:, i .. i+num_steps])
//        y =       data[:, i+1 .. i+1+num_steps]
//
// Example: ids 1..=10, batch_size = 2, num_steps = 2
//
//   data = [[1, 2, 3, 4,  5],
//           [6, 7, 8, 9, 10]]
//
//   i = 0: x_ids [[1,2],[6,7]]  y [[2,3],[7,8]]
//   i = 2: x_ids [[3,4],[8,9]]  y [[4,5],[9,10]]
//   i = 4: 4 + 2 < 5 is false → next file
//
// Files are re-read on every cycle; output depends only on file
// order and content.

use std::path::PathBuf;

use crate::data::{corpus::read_token_ids, embeddings::EmbeddingTable};
use crate::domain::{
    batch::Batch,
    error::{DataError, TokenId},
};

/// Number of windows a file with `batch_len` columns yields.
pub fn window_count(batch_len: usize, num_steps: usize) -> usize {
    if num_steps == 0 || batch_len <= num_steps {
        0
    } else {
        (batch_len - num_steps - 1) / num_steps + 1
    }
}

// ─── ReshapedFile ─────────────────────────────────────────────────────────────
/// One file's ids truncated and laid out as [batch_size, batch_len].
#[derive(Debug)]
struct ReshapedFile {
    path:      PathBuf,
    data:      Vec<TokenId>,
    batch_len: usize,
    cursor:    usize,
}

impl ReshapedFile {
    fn new(path: PathBuf, mut ids: Vec<TokenId>, batch_size: usize) -> Self {
        let batch_len = ids.len() / batch_size;
        ids.truncate(batch_size * batch_len);
        Self { path, data: ids, batch_len, cursor: 0 }
    }

    /// Start column of the next window, advancing by `num_steps`.
    fn next_window(&mut self, num_steps: usize) -> Option<usize> {
        let start = self.cursor;
        // Both x[.., start..start+num_steps] and the shifted y must be full width.
        if start + num_steps >= self.batch_len {
            return None;
        }
        self.cursor += num_steps;
        Some(start)
    }

    fn id(&self, row: usize, column: usize) -> TokenId {
        self.data[row * self.batch_len + column]
    }
}

// ─── WindowStream ─────────────────────────────────────────────────────────────
/// Endless, restartable batch producer over one role's files.
///
/// `next()` never returns `None`. Errors are yielded in place of
/// a batch; pulling again continues with the following window or
/// file.
pub struct WindowStream<'a> {
    name:       String,
    files:      Vec<PathBuf>,
    embeddings: &'a EmbeddingTable,
    batch_size: usize,
    num_steps:  usize,
    next_file:  usize,
    current:    Option<ReshapedFile>,
    // Consecutive files that contributed no batch.
    idle_files: usize,
}

impl<'a> WindowStream<'a> {
    pub fn new(
        name:       impl Into<String>,
        files:      Vec<PathBuf>,
        embeddings: &'a EmbeddingTable,
        batch_size: usize,
        num_steps:  usize,
    ) -> Result<Self, DataError> {
        let name = name.into();
        if files.is_empty() {
            return Err(DataError::InvalidShape(format!("{name}: file list is empty")));
        }
        if batch_size == 0 || num_steps == 0 {
            return Err(DataError::InvalidShape(format!(
                "{name}: batch_size ({batch_size}) and num_steps ({num_steps}) must be at least 1"
            )));
        }

        Ok(Self {
            name,
            files,
            embeddings,
            batch_size,
            num_steps,
            next_file: 0,
            current: None,
            idle_files: 0,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Parse and reshape the next file in the cycle.
    fn open_next_file(&mut self) -> Result<ReshapedFile, DataError> {
        let path = self.files[self.next_file].clone();
        self.next_file = (self.next_file + 1) % self.files.len();

        let ids  = read_token_ids(&path)?;
        let file = ReshapedFile::new(path, ids, self.batch_size);
        tracing::debug!(
            "{}: '{}' reshaped to [{}, {}] ({} windows)",
            self.name,
            file.path.display(),
            self.batch_size,
            file.batch_len,
            window_count(file.batch_len, self.num_steps),
        );
        Ok(file)
    }

    fn build_batch(&self, file: &ReshapedFile, start: usize) -> Result<Batch, DataError> {
        let steps          = self.num_steps;
        let embedding_size = self.embeddings.embedding_size();

        let mut input_ids = Vec::with_capacity(self.batch_size * steps);
        let mut x         = Vec::with_capacity(self.batch_size * steps * embedding_size);
        let mut y         = Vec::with_capacity(self.batch_size * steps);

        for row in 0..self.batch_size {
            for column in start..start + steps {
                let id = file.id(row, column);
                x.extend_from_slice(self.embeddings.lookup(id)?);
                input_ids.push(id);
                y.push(file.id(row, column + 1));
            }
        }

        Ok(Batch {
            batch_size: self.batch_size,
            num_steps: steps,
            embedding_size,
            input_ids,
            x,
            y,
        })
    }
}

impl Iterator for WindowStream<'_> {
    type Item = Result<Batch, DataError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(mut file) = self.current.take() {
                if let Some(start) = file.next_window(self.num_steps) {
                    self.idle_files = 0;
                    let batch = self.build_batch(&file, start);
                    self.current = Some(file);
                    return Some(batch);
                }
                // File finished; fall through to the next one.
            }

            if self.idle_files >= self.files.len() {
                self.idle_files = 0;
                return Some(Err(DataError::Exhausted));
            }

            match self.open_next_file() {
                Ok(file) if window_count(file.batch_len, self.num_steps) == 0 => {
                    tracing::debug!(
                        "{}: '{}' too short for one window, skipping",
                        self.name,
                        file.path.display()
                    );
                    self.idle_files += 1;
                }
                Ok(file) => self.current = Some(file),
                Err(e) => {
                    self.idle_files += 1;
                    return Some(Err(e));
                }
            }
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::HashMap, fs};
    use tempfile::{tempdir, TempDir};

    /// Embedding of id n is [n, -n] so lookups are easy to check.
    fn table(max_id: TokenId) -> EmbeddingTable {
        let vectors = (0..=max_id)
            .map(|id| (id, vec![id as f32, -(id as f32)]))
            .collect::<HashMap<_, _>>();
        EmbeddingTable::from_vectors(2, vectors).unwrap()
    }

    fn corpus(files: &[&str]) -> (TempDir, Vec<PathBuf>) {
        let dir   = tempdir().unwrap();
        let paths = files
            .iter()
            .enumerate()
            .map(|(i, contents)| {
                let path = dir.path().join(format!("part_{i}.txt"));
                fs::write(&path, contents).unwrap();
                path
            })
            .collect();
        (dir, paths)
    }

    #[test]
    fn test_window_count() {
        assert_eq!(window_count(5, 2), 2);
        assert_eq!(window_count(1, 1), 0);
        assert_eq!(window_count(2, 1), 1);
        assert_eq!(window_count(0, 3), 0);
        assert_eq!(window_count(7, 3), 2);
        assert_eq!(window_count(8, 3), 2);
        assert_eq!(window_count(10, 3), 3);
    }

    #[test]
    fn test_ten_token_scenario() {
        let (_dir, files) = corpus(&["1 2 3 4 5 6 7 8 9 10"]);
        let embeddings    = table(10);
        let mut stream    = WindowStream::new("train", files, &embeddings, 2, 2).unwrap();

        let first = stream.next().unwrap().unwrap();
        assert_eq!(first.input_ids, vec![1, 2, 6, 7]);
        assert_eq!(first.y, vec![2, 3, 7, 8]);

        let second = stream.next().unwrap().unwrap();
        assert_eq!(second.input_ids, vec![3, 4, 8, 9]);
        assert_eq!(second.y, vec![4, 5, 9, 10]);

        // Only two windows fit; the stream wraps to the start of the file.
        let third = stream.next().unwrap().unwrap();
        assert_eq!(third, first);
    }

    #[test]
    fn test_batch_shapes_and_embeddings() {
        let (_dir, files) = corpus(&["1 2 3 4 5 6 7 8 9 10"]);
        let embeddings    = table(10);
        let batch = WindowStream::new("train", files, &embeddings, 2, 2)
            .unwrap()
            .next()
            .unwrap()
            .unwrap();

        assert_eq!(batch.x.len(), 2 * 2 * 2);
        assert_eq!(batch.y.len(), 2 * 2);
        for row in 0..2 {
            for step in 0..2 {
                let id = batch.input_id(row, step);
                assert_eq!(batch.embedding(row, step), embeddings.lookup(id).unwrap());
            }
        }
    }

    #[test]
    fn test_targets_are_inputs_shifted_one_column() {
        let text          = (0..97).map(|n| n.to_string()).collect::<Vec<_>>().join(" ");
        let (_dir, files) = corpus(&[&text]);
        let embeddings    = table(100);
        let stream        = WindowStream::new("train", files, &embeddings, 4, 5).unwrap();

        // batch_len = 24, windows at 0, 5, 10, 15
        for batch in stream.take(4) {
            let batch = batch.unwrap();
            for row in 0..4 {
                for step in 0..5 {
                    // ids are consecutive integers, so the next column is id + 1
                    assert_eq!(batch.target(row, step), batch.input_id(row, step) + 1);
                }
            }
        }
    }

    #[test]
    fn test_windows_are_disjoint_and_consecutive() {
        let text          = (0..60).map(|n| n.to_string()).collect::<Vec<_>>().join(" ");
        let (_dir, files) = corpus(&[&text]);
        let embeddings    = table(60);
        let stream        = WindowStream::new("train", files, &embeddings, 3, 4).unwrap();

        // batch_len = 20 → windows at columns 0, 4, 8, 12 (16 + 4 < 20 is false)
        let batches: Vec<Batch> = stream.take(4).map(Result::unwrap).collect();
        for (k, batch) in batches.iter().enumerate() {
            for row in 0..3 {
                let expected: Vec<TokenId> =
                    (0..4).map(|t| (row * 20 + k * 4 + t) as TokenId).collect();
                assert_eq!(batch.input_row(row), expected.as_slice());
            }
        }
    }

    #[test]
    fn test_remainder_tokens_never_emitted() {
        // 23 tokens, batch_size 4 → batch_len 5, tokens 20..=22 dropped
        let text          = (0..23).map(|n| n.to_string()).collect::<Vec<_>>().join(" ");
        let (_dir, files) = corpus(&[&text]);
        let embeddings    = table(30);
        let stream        = WindowStream::new("train", files, &embeddings, 4, 2).unwrap();

        // two windows per cycle; look at several cycles
        for batch in stream.take(6) {
            let batch = batch.unwrap();
            assert!(batch.input_ids.iter().chain(&batch.y).all(|&id| id < 20));
        }
    }

    #[test]
    fn test_undersized_file_contributes_nothing() {
        // n_words = 3, batch_size = 2 → batch_len = 1 → zero windows
        let (_dir, files) = corpus(&["7 8 9", "1 2 3 4 5 6 7 8 9 10"]);
        let embeddings    = table(10);
        let mut stream    = WindowStream::new("train", files, &embeddings, 2, 1).unwrap();

        let batch = stream.next().unwrap().unwrap();
        assert_eq!(batch.input_ids, vec![1, 6]);
    }

    #[test]
    fn test_empty_file_is_skipped() {
        let (_dir, files) = corpus(&["", "1 2 3 4 5 6 7 8 9 10", "   "]);
        let embeddings    = table(10);
        let stream        = WindowStream::new("train", files, &embeddings, 2, 2).unwrap();

        let firsts: Vec<Vec<TokenId>> = stream
            .take(4)
            .map(|b| b.unwrap().input_ids)
            .collect();
        assert_eq!(firsts[0], vec![1, 2, 6, 7]);
        assert_eq!(firsts[2], vec![1, 2, 6, 7]);
    }

    #[test]
    fn test_cycles_through_files_in_order() {
        let (_dir, files) = corpus(&["1 2 3 4 5 6", "11 12 13 14 15 16"]);
        let embeddings    = table(20);
        let stream        = WindowStream::new("train", files, &embeddings, 2, 1).unwrap();

        // batch_len = 3 → windows at 0 and 1 per file
        let batches: Vec<Vec<TokenId>> = stream.take(6).map(|b| b.unwrap().input_ids).collect();
        assert_eq!(
            batches,
            vec![
                vec![1, 4],
                vec![2, 5],
                vec![11, 14],
                vec![12, 15],
                vec![1, 4],
                vec![2, 5],
            ]
        );
    }

    #[test]
    fn test_deterministic_across_instances() {
        let (_dir, files) = corpus(&["4 8 15 16 23 42 4 8 15 16 23 42", "1 1 2 3 5 8 13 21"]);
        let embeddings    = table(42);

        let a: Vec<Batch> = WindowStream::new("a", files.clone(), &embeddings, 2, 2)
            .unwrap()
            .take(5)
            .map(Result::unwrap)
            .collect();
        let b: Vec<Batch> = WindowStream::new("b", files, &embeddings, 2, 2)
            .unwrap()
            .take(5)
            .map(Result::unwrap)
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rereads_file_each_cycle() {
        let (_dir, files) = corpus(&["1 2 3 4"]);
        let embeddings    = table(10);
        let mut stream    = WindowStream::new("train", files.clone(), &embeddings, 1, 3).unwrap();

        assert_eq!(stream.next().unwrap().unwrap().input_ids, vec![1, 2, 3]);
        fs::write(&files[0], "5 6 7 8").unwrap();
        assert_eq!(stream.next().unwrap().unwrap().input_ids, vec![5, 6, 7]);
    }

    #[test]
    fn test_missing_embedding_is_fatal_data_error() {
        let (_dir, files) = corpus(&["1 2 3 99 5 6"]);
        let embeddings    = table(10);
        let mut stream    = WindowStream::new("train", files, &embeddings, 1, 5).unwrap();

        let err = stream.next().unwrap().unwrap_err();
        assert!(matches!(err, DataError::MissingEmbedding { id: 99 }));
    }

    #[test]
    fn test_target_outside_table_is_not_looked_up() {
        // Targets are ids, not embeddings: 99 only appears as a target here.
        let (_dir, files) = corpus(&["1 2 99"]);
        let embeddings    = table(10);
        let mut stream    = WindowStream::new("train", files, &embeddings, 1, 2).unwrap();

        let batch = stream.next().unwrap().unwrap();
        assert_eq!(batch.y, vec![2, 99]);
    }

    #[test]
    fn test_unreadable_file_yields_io_error_then_continues() {
        let (dir, mut files) = corpus(&["1 2 3 4 5 6 7 8 9 10"]);
        files.insert(0, dir.path().join("missing.txt"));
        let embeddings = table(10);
        let mut stream = WindowStream::new("train", files, &embeddings, 2, 2).unwrap();

        assert!(matches!(stream.next().unwrap(), Err(DataError::Io { .. })));
        assert_eq!(stream.next().unwrap().unwrap().input_ids, vec![1, 2, 6, 7]);
    }

    #[test]
    fn test_all_files_too_short_reports_exhausted() {
        let (_dir, files) = corpus(&["1 2", "3"]);
        let embeddings    = table(10);
        let mut stream    = WindowStream::new("train", files, &embeddings, 2, 2).unwrap();

        assert!(matches!(stream.next().unwrap(), Err(DataError::Exhausted)));
    }

    #[test]
    fn test_rejects_degenerate_shapes() {
        let embeddings = table(1);
        assert!(matches!(
            WindowStream::new("x", Vec::new(), &embeddings, 2, 2),
            Err(DataError::InvalidShape(_))
        ));
        assert!(matches!(
            WindowStream::new("x", vec![PathBuf::from("a")], &embeddings, 0, 2),
            Err(DataError::InvalidShape(_))
        ));
        assert!(matches!(
            WindowStream::new("x", vec![PathBuf::from("a")], &embeddings, 2, 0),
            Err(DataError::InvalidShape(_))
        ));
    }
}
